//! The upstream site this gateway fronts. Every scraper and resolver talks
//! to this one host; it's a constant rather than a config key because the
//! distilled spec only recognises `HOST`/`PORT`/`HTTP_PROXY` (spec section
//! 6, "Environment") and the original (`original_source/src/main.py`)
//! likewise hard-codes it.

pub const SITE_HOST: &str = "www.instagram.com";

pub fn site_url(path: &str) -> String {
    format!("https://{SITE_HOST}{path}")
}
