//! Route table wiring (spec section 6). Grounded on
//! `rsform-weaver/crates/weaver-index/src/server.rs::router`, which builds
//! an axum `Router` the same way: flat `.route(...)` chain, a `TraceLayer`,
//! and a single `.with_state(...)` at the end. Every route below is
//! registered without a trailing slash; the caller wraps the returned
//! `Router` in a `NormalizePathLayer` (see `main.rs`) so a request with a
//! trailing slash still matches instead of 404ing.

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::{activitypub, api, embed, grid, health, media, oembed};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::health))
        // direct post routes
        .route("/p/{post_id}", get(embed::embed))
        .route("/p/{post_id}/{media_num}", get(embed::embed))
        .route("/tv/{post_id}", get(embed::embed))
        .route("/reel/{post_id}", get(embed::embed))
        .route("/reels/{post_id}", get(embed::embed))
        // user-scoped post routes
        .route("/{user}/p/{post_id}", get(embed::embed))
        .route("/{user}/p/{post_id}/{media_num}", get(embed::embed))
        .route("/{user}/reel/{post_id}", get(embed::embed))
        // stories
        .route("/stories/{user}/{post_id}", get(embed::embed))
        // share links
        .route("/share/{post_id}", get(embed::embed))
        .route("/share/{post_id}/{media_num}", get(embed::embed))
        .route("/share/p/{post_id}", get(embed::embed))
        .route("/share/p/{post_id}/{media_num}", get(embed::embed))
        .route("/share/reel/{post_id}", get(embed::embed))
        .route("/share/reel/{post_id}/{media_num}", get(embed::embed))
        // media redirects
        .route("/images/{post_id}/{media_id}", get(media::media_redirect))
        .route("/videos/{post_id}/{media_id}", get(media::media_redirect))
        // grid composition
        .route("/grid/{post_id}", get(grid::grid))
        // metadata endpoints
        .route("/oembed", get(oembed::oembed))
        .route("/api/v1/statuses/{int_id}", get(activitypub::status))
        .route("/api/p/{post_id}", get(api::post_json))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
