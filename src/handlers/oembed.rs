//! `/oembed?url=...` (spec section 6). Not present in
//! `original_source/`; the oEmbed JSON shape below follows the
//! standard oEmbed 1.0 "photo"/"video" response fields, populated from
//! whatever [`crate::model::Post`] the resolved short-code yields.

use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::handlers::normalize_post_id;
use crate::model::MediaType;
use crate::state::AppState;

#[derive(Serialize)]
struct OembedResponse {
    version: &'static str,
    #[serde(rename = "type")]
    media_type: &'static str,
    provider_name: &'static str,
    provider_url: &'static str,
    author_name: String,
    title: String,
    width: u32,
    height: u32,
}

pub async fn oembed(State(state): State<AppState>, Query(query): Query<HashMap<String, String>>) -> Response {
    let Some(url) = query.get("url") else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let Some(post_id) = last_path_segment(url).and_then(|s| normalize_post_id(&s)) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let post = match state.post_resolver.resolve(&post_id).await {
        Ok(Some(post)) => post,
        _ => return StatusCode::NOT_FOUND.into_response(),
    };

    let Some(media) = post.medias.first() else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let response = OembedResponse {
        version: "1.0",
        media_type: if media.media_type == MediaType::Video { "video" } else { "photo" },
        provider_name: "InstaFix",
        provider_url: "https://www.instagram.com",
        author_name: post.user.username,
        title: post.caption,
        width: media.width,
        height: media.height,
    };
    Json(response).into_response()
}

fn last_path_segment(url: &str) -> Option<String> {
    let path = url::Url::parse(url).ok().map(|u| u.path().to_string()).unwrap_or_else(|| url.to_string());
    let segment = path.trim_matches('/').split('/').next_back()?;
    if segment.is_empty() {
        None
    } else {
        Some(segment.to_string())
    }
}
