//! Crate-wide error taxonomy.
//!
//! The gateway recognizes exactly three kinds of failure (spec section 7):
//! transient (retried where specified, otherwise treated as absent),
//! absent (a lookup legitimately produced nothing — not an error), and
//! restricted (the upstream explicitly refuses the post). Everything else
//! that can happen in handler code collapses to a 307 redirect so callers
//! never see a 500. Handlers match on `Result<Option<Post>, Restricted>`
//! directly rather than through a shared top-level error enum — there's
//! only one place (spec section 6's route table) where this distinction
//! turns into an HTTP status, and each handler already has the post_url
//! and theme color it needs in scope to render that response itself.

use thiserror::Error;

/// Transport/backing-store failures that are retried where the spec
/// says so, otherwise swallowed and treated as absent.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream returned status {0}")]
    Status(reqwest::StatusCode),
}

impl FetchError {
    /// Errors worth retrying in the GraphQL scraper's retry loop
    /// (spec section 9: broaden retry to all transient errors, not one
    /// narrow transport-error class).
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Timeout(_) => true,
            FetchError::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            FetchError::Status(code) => code.is_server_error() || code.as_u16() == 429,
        }
    }
}

/// The upstream explicitly refused to serve a post to an unauthenticated
/// viewer (spec section 4.7 step 3 / GLOSSARY "Restricted"). A scraper's
/// outcome is `Ok(Some(post))` on success, `Ok(None)` when the lookup
/// legitimately produced nothing (absent), or `Err(Restricted(..))` when
/// the upstream explicitly refuses the post — handlers match on that
/// `Result<Option<Post>, Restricted>` directly (spec section 6/7: redirect,
/// 403, or 404) rather than through a shared top-level error enum.
#[derive(Debug, Clone, Error)]
#[error("restricted: {0}")]
pub struct Restricted(pub String);
