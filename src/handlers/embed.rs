//! The embed handler (spec section 6): the route nearly every entry in
//! the route table maps to. Grounded on
//! `original_source/src/main.py::embed`.

use std::collections::HashMap;

use axum::extract::{OriginalUri, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};

use crate::handlers::{is_crawler_user_agent, normalize_post_id, upstream_url};
use crate::model::MediaType;
use crate::shortcode::shortcode_to_status_id;
use crate::state::AppState;
use crate::templates::{render_embed, render_error, EmbedContext};

pub async fn embed(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    axum::extract::Path(params): axum::extract::Path<HashMap<String, String>>,
) -> Response {
    let ig_url = upstream_url(&uri.path_and_query().map(|p| p.to_string()).unwrap_or_default());

    let user_agent = headers.get("user-agent").and_then(|v| v.to_str().ok()).unwrap_or("");
    if !is_crawler_user_agent(user_agent) {
        return Redirect::temporary(&ig_url).into_response();
    }

    let raw_post_id = params.get("post_id").cloned().unwrap_or_default();
    let Some(mut post_id) = normalize_post_id(&raw_post_id) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let media_num: i64 = match params.get("media_num") {
        Some(raw) => match raw.parse() {
            Ok(n) => n,
            Err(_) => return StatusCode::NOT_FOUND.into_response(),
        },
        None => 0,
    };

    if post_id.starts_with('B') || post_id.starts_with('_') {
        match state.share_resolver.resolve(&post_id).await {
            Some(resolved) => post_id = resolved,
            None => {
                tracing::warn!(%post_id, "failed to resolve share id");
                return Redirect::temporary(&ig_url).into_response();
            }
        }
    }

    let post = match state.post_resolver.resolve(&post_id).await {
        Ok(Some(post)) => post,
        Ok(None) => {
            tracing::warn!(%post_id, "post resolution returned absent");
            return Redirect::temporary(&ig_url).into_response();
        }
        Err(restricted) => {
            let html = render_error("#0084ff", &ig_url, &restricted.0);
            return (StatusCode::FORBIDDEN, axum::response::Html(html)).into_response();
        }
    };

    let media_index = (media_num.max(1) - 1).max(0) as usize;
    let Some(selected) = post.medias.get(media_index).or_else(|| post.medias.first()) else {
        return Redirect::temporary(&ig_url).into_response();
    };

    let mut ctx = EmbedContext {
        theme_color: "#0084ff",
        post_url: ig_url.clone(),
        username: post.user.username.clone(),
        full_name: post.user.full_name.clone(),
        og_site_name: "InstaFix",
        og_description: Some(post.caption.clone()),
        media_width: selected.width,
        media_height: selected.height,
        oembed_url: Some(format!("/oembed/?url={}", urlencoding::encode(&ig_url))),
        mastodon_statuses_url: shortcode_to_status_id(&post.post_id)
            .map(|id| format!("/api/v1/statuses/{id}")),
        ..Default::default()
    };

    let is_single_image_in_sidecar =
        media_num == 0 && post.medias.first().is_some_and(|m| m.media_type == MediaType::Image) && post.medias.len() > 1;

    if is_single_image_in_sidecar {
        ctx.image_url = Some(format!("/grid/{}/", post.post_id));
        ctx.media_width = 0;
        ctx.media_height = 0;
    } else if selected.media_type == MediaType::Image {
        ctx.image_url = Some(format!("/images/{}/{}", post.post_id, media_num.max(1)));
    } else {
        ctx.video_url = Some(format!("/videos/{}/{}", post.post_id, media_num.max(1)));
    }

    if query.contains_key("direct") {
        let target = ctx.image_url.clone().or_else(|| ctx.video_url.clone()).unwrap_or_default();
        return Redirect::temporary(&target).into_response();
    }

    if query.contains_key("gallery") {
        ctx.og_description = None;
    }

    axum::response::Html(render_embed(&ctx)).into_response()
}
