//! `/images/{id}/{k}` and `/videos/{id}/{k}[?preview=1]` (spec section 6).
//! Grounded on `original_source/src/main.py::media_redirect`.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Redirect, Response};

use crate::handlers::{normalize_post_id, upstream_url};
use crate::state::AppState;

pub async fn media_redirect(
    State(state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let raw_post_id = params.get("post_id").cloned().unwrap_or_default();
    let Some(post_id) = normalize_post_id(&raw_post_id) else {
        return upstream_fallback(&raw_post_id);
    };

    let post = match state.post_resolver.resolve(&post_id).await {
        Ok(Some(post)) => post,
        _ => return upstream_fallback(&post_id),
    };

    let Some(media_id) = params.get("media_id").and_then(|s| s.parse::<usize>().ok()).filter(|n| *n >= 1) else {
        return upstream_fallback(&post_id);
    };

    let Some(media) = post.medias.get(media_id - 1) else {
        return upstream_fallback(&post_id);
    };

    let wants_preview = query.get("preview").is_some_and(|v| v == "1");
    let target = if wants_preview {
        media.preview_url.clone().unwrap_or_else(|| media.url.clone())
    } else {
        media.url.clone()
    };

    Redirect::temporary(&target).into_response()
}

fn upstream_fallback(post_id: &str) -> Response {
    Redirect::temporary(&upstream_url(&format!("/p/{post_id}"))).into_response()
}
