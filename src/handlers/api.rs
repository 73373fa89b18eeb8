//! `/api/p/{id}`: internal post JSON (spec section 6). Serialises the
//! resolved [`crate::model::Post`] directly — this route exists for
//! internal tooling/debugging, not for public API stability.

use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::handlers::normalize_post_id;
use crate::state::AppState;
use crate::templates::render_error;

pub async fn post_json(State(state): State<AppState>, Path(params): Path<HashMap<String, String>>) -> Response {
    let raw_post_id = params.get("post_id").cloned().unwrap_or_default();
    let Some(post_id) = normalize_post_id(&raw_post_id) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match state.post_resolver.resolve(&post_id).await {
        Ok(Some(post)) => Json(post).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(restricted) => {
            let html = render_error("#0084ff", "", &restricted.0);
            (StatusCode::FORBIDDEN, axum::response::Html(html)).into_response()
        }
    }
}
