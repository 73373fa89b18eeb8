//! `/grid/{id}` (spec section 6). Grounded on
//! `original_source/src/main.py::grid`.

use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};

use crate::handlers::{normalize_post_id, upstream_url};
use crate::state::AppState;

pub async fn grid(State(state): State<AppState>, Path(params): Path<HashMap<String, String>>) -> Response {
    let raw_post_id = params.get("post_id").cloned().unwrap_or_default();
    let Some(post_id) = normalize_post_id(&raw_post_id) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let existing = state.grid_composer.path_for(&post_id);
    if existing.exists() {
        return serve_jpeg(&existing).await.unwrap_or_else(|| StatusCode::NOT_FOUND.into_response());
    }

    let post = match state.post_resolver.resolve(&post_id).await {
        Ok(Some(post)) => post,
        _ => return Redirect::temporary(&upstream_url(&format!("/p/{post_id}"))).into_response(),
    };

    match state.grid_composer.get_or_compose(&post).await {
        Some(path) => serve_jpeg(&path).await.unwrap_or_else(|| StatusCode::NOT_FOUND.into_response()),
        // Composition failed: fall back to the first single image rather
        // than surfacing an error (spec section 4.9, "Failure semantics").
        None => Redirect::temporary(&format!("/images/{post_id}/1")).into_response(),
    }
}

async fn serve_jpeg(path: &std::path::Path) -> Option<Response> {
    let bytes = tokio::fs::read(path).await.ok()?;
    Some(([(header::CONTENT_TYPE, "image/jpeg")], bytes).into_response())
}
