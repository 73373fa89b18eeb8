//! HTTP dispatch glue (spec section 2 component 10): thin handlers that
//! parse path/query parameters, delegate to the core resolvers, and
//! translate the three-kind error model into status codes (spec sections
//! 6-7).

pub mod activitypub;
pub mod api;
pub mod embed;
pub mod grid;
pub mod health;
pub mod media;
pub mod oembed;

use crate::site::SITE_HOST;

/// Rebuilds the equivalent upstream URL for a request against this
/// gateway, preserving path and query (grounded on
/// `original_source/src/main.py`'s
/// `request.url.with_host("www.instagram.com")...`).
pub fn upstream_url(path_and_query: &str) -> String {
    format!("https://{SITE_HOST}{path_and_query}")
}

/// The lowercased User-Agent substrings that mark a request as a crawler
/// or chat-app preview agent worth serving rich metadata to (spec section
/// 6, "User-agent gating"). A plain substring check replaces the
/// original's single alternation regex — there's no capture-group or
/// anchoring behavior being relied on, just "does any of these appear".
const CRAWLER_USER_AGENTS: &[&str] = &[
    "discordbot",
    "telegrambot",
    "facebook",
    "whatsapp",
    "firefox/92",
    "vkshare",
    "revoltchat",
    "preview",
    "iframely",
];

pub fn is_crawler_user_agent(user_agent: &str) -> bool {
    let lower = user_agent.to_lowercase();
    CRAWLER_USER_AGENTS.iter().any(|needle| lower.contains(needle))
}

/// A purely-digit `post_id` is a numeric story id and must be re-encoded
/// into the short-code alphabet before resolution (spec section 6,
/// "Numeric story IDs").
pub fn normalize_post_id(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    if raw.chars().all(|c| c.is_ascii_digit() || c == '_') && raw.chars().any(|c| c.is_ascii_digit()) {
        crate::shortcode::numeric_story_id_to_shortcode(raw)
    } else {
        Some(raw.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crawler_gate_matches_known_agents_case_insensitively() {
        assert!(is_crawler_user_agent("Mozilla/5.0 (compatible; Discordbot/2.0)"));
        assert!(is_crawler_user_agent("TelegramBot (like TwitterBot)"));
        assert!(!is_crawler_user_agent("Mozilla/5.0 (Windows NT 10.0)"));
    }

    #[test]
    fn numeric_post_id_is_reencoded() {
        assert_eq!(normalize_post_id("64"), Some("BA".to_string()));
    }

    #[test]
    fn alpha_post_id_passes_through() {
        assert_eq!(normalize_post_id("ABC123"), Some("ABC123".to_string()));
    }
}
