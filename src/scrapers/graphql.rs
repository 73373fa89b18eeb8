//! Fetches the site's internal GraphQL endpoint and recovers a Post from
//! its JSON response, falling back to a ruling lookup when the upstream
//! explicitly withholds the post (spec section 4.7).
//!
//! Grounded on `original_source/src/scrapers/api.py`'s `get_query_api`:
//! same form fields, same `doc_id`, same 5-attempt retry loop — broadened
//! here to retry any transient [`FetchError`] rather than one narrow
//! transport-error class (spec section 9's recommended broadening, and
//! SPEC_FULL.md's resolution of that Open Question).

use serde_json::{json, Value};

use crate::error::Restricted;
use crate::http_fetcher::{CallOptions, HttpFetcher};
use crate::json_tree::JsonTreeExt;
use crate::model::{Post, User};
use crate::scrapers::{extract_caption, extract_medias, TypeSource};
use crate::site::site_url;

const MAX_RETRIES: usize = 5;
const DOC_ID: &str = "9510064595728286";

/// A GET endpoint that returns why the upstream refuses to serve a post
/// (spec section 4.7 step 3). Not named in `original_source/` — its
/// response shape (`description`/`message`) is as spec.md describes it.
fn ruling_url(short_code: &str) -> String {
    site_url(&format!("/api/v1/web/get_ruling_for_content/?shortcode={short_code}"))
}

pub struct GraphqlScraper<'a> {
    fetcher: &'a HttpFetcher,
}

impl<'a> GraphqlScraper<'a> {
    pub fn new(fetcher: &'a HttpFetcher) -> Self {
        GraphqlScraper { fetcher }
    }

    /// `Ok(None)` is absent; `Err(Restricted(..))` carries the upstream's
    /// human-readable refusal reason.
    pub async fn scrape(&self, short_code: &str) -> Result<Option<Post>, Restricted> {
        let body = match self.fetch_with_retry(short_code).await {
            Some(body) => body,
            None => return Ok(None),
        };

        let parsed: Value = match serde_json::from_str(&body) {
            Ok(v) => v,
            Err(err) => {
                tracing::warn!(%short_code, %err, "graphql response was not valid json");
                return Ok(None);
            }
        };

        let shortcode_media = parsed.get_path("data").get_path("xdt_shortcode_media");
        if shortcode_media.is_null() {
            return Err(self.ruling(short_code).await);
        }

        let medias = extract_medias(shortcode_media, TypeSource::Typename);
        if medias.is_empty() {
            return Ok(None);
        }

        let user = User {
            username: shortcode_media.get_path("owner").get_path("username").as_string_or_default(""),
            full_name: shortcode_media
                .get_path("owner")
                .get("full_name")
                .and_then(Value::as_str)
                .map(str::to_string),
            profile_pic: shortcode_media
                .get_path("owner")
                .get("profile_pic_url")
                .and_then(Value::as_str)
                .map(str::to_string),
        };

        Ok(Some(Post {
            post_id: short_code.to_string(),
            timestamp: now_unix(),
            user,
            caption: extract_caption(shortcode_media),
            medias,
            blocked: false,
        }))
    }

    async fn fetch_with_retry(&self, short_code: &str) -> Option<String> {
        let variables = json!({
            "shortcode": short_code,
            "fetch_tagged_user_count": null,
            "hoisted_comment_id": null,
            "hoisted_reply_id": null,
        })
        .to_string();

        let form = [
            ("fb_api_caller_class", "RelayModern"),
            ("fb_api_req_friendly_name", "PolarisPostActionLoadPostQueryQuery"),
            ("server_timestamps", "true"),
            ("doc_id", DOC_ID),
            ("variables", variables.as_str()),
        ];
        let headers = [("x-csrftoken", "-")];
        let url = site_url("/graphql/query");

        let mut last_err = None;
        for attempt in 0..MAX_RETRIES {
            match self.fetcher.post(&url, &form, &headers, CallOptions::default()).await {
                Ok(body) => return Some(body),
                Err(err) => {
                    let transient = err.is_transient();
                    last_err = Some(err);
                    if !transient {
                        break;
                    }
                    tracing::debug!(%short_code, attempt, "graphql request failed, retrying");
                }
            }
        }
        if let Some(err) = last_err {
            tracing::error!(%short_code, %err, "graphql request exhausted retries");
        }
        None
    }

    async fn ruling(&self, short_code: &str) -> Restricted {
        let url = ruling_url(short_code);
        match self.fetcher.get(&url, CallOptions { ignore_status: true, ..Default::default() }).await {
            Ok(body) => {
                let parsed: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
                let reason = parsed
                    .get("description")
                    .or_else(|| parsed.get("message"))
                    .and_then(Value::as_str)
                    .unwrap_or("Post unavailable");
                Restricted(reason.to_string())
            }
            Err(err) => {
                tracing::warn!(%short_code, %err, "ruling lookup failed");
                Restricted("Post unavailable".to_string())
            }
        }
    }
}

fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
