//! `/api/v1/statuses/{int_id}`: ActivityPub-style status JSON (spec
//! section 6). Not present in `original_source/`; modeled on Mastodon's
//! `/api/v1/statuses/:id` response shape, populated from the resolved
//! post, since that's the numeric id space spec.md's "Mastodon status
//! ID" note ties this route to.

use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::shortcode::status_id_to_shortcode;
use crate::state::AppState;

#[derive(Serialize)]
struct StatusAccount {
    username: String,
    display_name: String,
}

#[derive(Serialize)]
struct StatusMediaAttachment {
    #[serde(rename = "type")]
    media_type: &'static str,
    url: String,
    preview_url: String,
}

#[derive(Serialize)]
struct StatusResponse {
    id: String,
    created_at: String,
    content: String,
    account: StatusAccount,
    media_attachments: Vec<StatusMediaAttachment>,
}

pub async fn status(State(state): State<AppState>, Path(params): Path<HashMap<String, String>>) -> Response {
    let Some(int_id) = params.get("int_id").and_then(|s| s.parse::<u128>().ok()) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let Some(short_code) = status_id_to_shortcode(int_id) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let post = match state.post_resolver.resolve(&short_code).await {
        Ok(Some(post)) => post,
        _ => return StatusCode::NOT_FOUND.into_response(),
    };

    let media_attachments = post
        .medias
        .iter()
        .map(|m| StatusMediaAttachment {
            media_type: if m.media_type == crate::model::MediaType::Video { "video" } else { "image" },
            url: m.url.clone(),
            preview_url: m.preview_url.clone().unwrap_or_else(|| m.url.clone()),
        })
        .collect();

    let response = StatusResponse {
        id: int_id.to_string(),
        created_at: chrono::DateTime::from_timestamp(post.timestamp, 0)
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_default(),
        content: post.caption,
        account: StatusAccount { username: post.user.username.clone(), display_name: post.user.full_name.unwrap_or(post.user.username) },
        media_attachments,
    };

    Json(response).into_response()
}
