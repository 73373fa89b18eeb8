//! Fetches the public embed page and recovers a Post from it, preferring
//! the inline JSON blob a `<script>` tag carries and falling back to raw
//! HTML parsing (spec section 4.6).
//!
//! Grounded on `original_source/src/scrapers/embed.py`: same selectors
//! (`span.UsernameText`, `div.Caption`, `.EmbeddedMediaImage`), same
//! `"shortcode_media"` substring probe over script tags, same
//! `"WatchOnInstagram"` substring check for `blocked`.

use scraper::{Html, Selector};
use serde_json::Value;

use crate::http_fetcher::{CallOptions, HttpFetcher};
use crate::json_tree::JsonTreeExt;
use crate::jslex;
use crate::model::{Media, MediaType, Post, User};
use crate::scrapers::{extract_medias, TypeSource};
use crate::site::site_url;

pub struct EmbedScraper<'a> {
    fetcher: &'a HttpFetcher,
}

impl<'a> EmbedScraper<'a> {
    pub fn new(fetcher: &'a HttpFetcher) -> Self {
        EmbedScraper { fetcher }
    }

    /// Returns `Ok(None)` on any network failure or when nothing parseable
    /// was found — absent, not an error (spec section 4.6, "Failure
    /// semantics").
    pub async fn scrape(&self, short_code: &str) -> Option<Post> {
        let url = site_url(&format!("/p/{short_code}/embed/captioned/"));
        let html = match self.fetcher.get(&url, CallOptions::default()).await {
            Ok(body) => body,
            Err(err) => {
                tracing::warn!(%short_code, %err, "embed fetch failed");
                return None;
            }
        };

        parse_embed_html(short_code, &html)
    }
}

/// `username` and `profile_pic` are required (spec section 4.6 step 4); a
/// post whose embed page doesn't render them, or that yields no media at
/// all, is absent.
fn parse_embed_html(short_code: &str, html: &str) -> Option<Post> {
    let document = Html::parse_document(html);

    let (username, profile_pic) = html_user(&document);
    let username = username.filter(|s| !s.is_empty())?;
    let profile_pic = profile_pic?;
    let caption = html_caption(&document);

    let mut medias = extract_medias_from_scripts(&document).unwrap_or_default();
    if medias.is_empty() {
        medias = html_single_image(&document).into_iter().collect();
    }
    if medias.is_empty() {
        return None;
    }

    Some(Post {
        post_id: short_code.to_string(),
        timestamp: now_unix(),
        user: User { username, full_name: None, profile_pic: Some(profile_pic) },
        caption,
        medias,
        blocked: html.contains("WatchOnInstagram"),
    })
}

fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn extract_medias_from_scripts(document: &Html) -> Option<Vec<Media>> {
    let script_sel = Selector::parse("script").ok()?;
    for script in document.select(&script_sel) {
        let text = script.text().collect::<String>();
        if !text.contains("shortcode_media") {
            continue;
        }
        for literal in jslex::extract_string_literals(&text) {
            if !literal.contains("shortcode_media") {
                continue;
            }
            let Some(shortcode_media) = double_parse(literal) else { continue };
            if shortcode_media.is_null() {
                continue;
            }
            let medias = extract_medias(&shortcode_media, TypeSource::UrlPresence);
            if !medias.is_empty() {
                return Some(medias);
            }
        }
    }
    None
}

/// The embedded literal is a JSON string whose *contents* are themselves
/// JSON text (spec section 4.4: "downstream code double-decodes"). The
/// outer decode unescapes it to a plain string; the inner decode parses
/// that string as the actual object.
fn double_parse(literal: &str) -> Option<Value> {
    let unescaped: String = serde_json::from_str(literal).ok()?;
    let outer: Value = serde_json::from_str(&unescaped).ok()?;
    let shortcode_media = outer.get_path("gql_data").get_path("shortcode_media");
    if shortcode_media.is_null() {
        None
    } else {
        Some(shortcode_media.clone())
    }
}

fn html_user(document: &Html) -> (Option<String>, Option<String>) {
    let username = Selector::parse("span.UsernameText")
        .ok()
        .and_then(|sel| document.select(&sel).next())
        .map(|el| el.text().collect::<String>());

    let profile_pic = Selector::parse("a.Avatar > img")
        .ok()
        .and_then(|sel| document.select(&sel).next())
        .and_then(|el| el.value().attr("src"))
        .map(str::to_string);

    (username, profile_pic)
}

fn html_caption(document: &Html) -> String {
    let Ok(sel) = Selector::parse("div.Caption") else { return String::new() };
    let Some(el) = document.select(&sel).next() else { return String::new() };

    // "Shallow text" — only this element's direct text-node children, not
    // descendants' text, joined on newlines (original's
    // `text(deep=False, separator="\n")`).
    let lines: Vec<String> = el
        .children()
        .filter_map(|child| child.value().as_text().map(|t| t.to_string()))
        .collect();
    lines.join("\n").trim().to_string()
}

fn html_single_image(document: &Html) -> Option<Media> {
    let sel = Selector::parse(".EmbeddedMediaImage").ok()?;
    let el = document.select(&sel).next()?;
    let src = el.value().attr("src")?;
    Some(Media {
        url: src.to_string(),
        media_type: MediaType::Image,
        width: 0,
        height: 0,
        duration: 0,
        preview_url: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT_HTML: &str = r#"
    <html><body>
    <span class="UsernameText">alice</span>
    <a class="Avatar"><img src="https://x/pfp.jpg"></a>
    <div class="Caption">hello<span>(nested, ignored)</span>world</div>
    <script>
    window.__additionalData = "{\"gql_data\":{\"shortcode_media\":{\"display_url\":\"https://x/img.jpg\",\"dimensions\":{\"width\":100,\"height\":200},\"__typename\":\"GraphImage\"}}}";
    if (window.shortcode_media) {}
    </script>
    </body></html>
    "#;

    #[test]
    fn parses_media_from_inline_script_json() {
        let post = parse_embed_html("ABC123", SCRIPT_HTML).unwrap();
        assert_eq!(post.medias.len(), 1);
        assert_eq!(post.medias[0].url, "https://x/img.jpg");
        assert_eq!(post.medias[0].media_type, MediaType::Image);
        assert_eq!(post.user.username, "alice");
        assert_eq!(post.user.profile_pic.as_deref(), Some("https://x/pfp.jpg"));
    }

    #[test]
    fn falls_back_to_single_embedded_image_when_json_absent() {
        let html = r#"<html><body>
            <span class="UsernameText">bob</span>
            <a class="Avatar"><img src="https://x/pfp2.jpg"></a>
            <div class="Caption">plain caption</div>
            <img class="EmbeddedMediaImage" src="https://x/fallback.jpg">
        </body></html>"#;
        let post = parse_embed_html("XYZ", html).unwrap();
        assert_eq!(post.medias.len(), 1);
        assert_eq!(post.medias[0].url, "https://x/fallback.jpg");
        assert_eq!(post.caption, "plain caption");
    }

    #[test]
    fn blocked_flag_set_from_watch_on_instagram_marker() {
        let html = format!("{SCRIPT_HTML}WatchOnInstagram");
        let post = parse_embed_html("ABC123", &html).unwrap();
        assert!(post.blocked);
    }

    #[test]
    fn no_media_anywhere_yields_absent() {
        let html = r#"<html><body><span class="UsernameText">bob</span><a class="Avatar"><img src="https://x/p.jpg"></a></body></html>"#;
        assert!(parse_embed_html("NOPE", html).is_none());
    }

    #[test]
    fn missing_username_yields_absent_even_with_media() {
        let html = r#"<html><body><a class="Avatar"><img src="https://x/p.jpg"></a><img class="EmbeddedMediaImage" src="https://x/i.jpg"></body></html>"#;
        assert!(parse_embed_html("NOPE", html).is_none());
    }

    #[test]
    fn missing_profile_pic_yields_absent() {
        let html = r#"<html><body><span class="UsernameText">bob</span><img class="EmbeddedMediaImage" src="https://x/i.jpg"></body></html>"#;
        assert!(parse_embed_html("NOPE", html).is_none());
    }
}
