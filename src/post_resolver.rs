//! Orchestrates cache -> singleflight -> embed-then-graphql-fallback
//! resolution of a short-code into a [`Post`] (spec section 4.8).
//!
//! Grounded on `original_source/src/scrapers/__init__.py`'s `get_post`/
//! `_get_post`: cache check, a singleflight keyed by short-code, embed
//! scraper first, GraphQL fallback when the embed scraper came back
//! absent or blocked, write-through to the cache on success.

use std::sync::Arc;

use crate::cache::PostCache;
use crate::error::Restricted;
use crate::http_fetcher::HttpFetcher;
use crate::model::Post;
use crate::scrapers::embed::EmbedScraper;
use crate::scrapers::graphql::GraphqlScraper;
use crate::singleflight::{Singleflight, SingleflightError};

pub struct PostResolver {
    cache: Arc<PostCache>,
    fetcher: Arc<HttpFetcher>,
    inflight: Singleflight<String, Option<Post>, Restricted>,
}

impl PostResolver {
    pub fn new(cache: Arc<PostCache>, fetcher: Arc<HttpFetcher>) -> Self {
        PostResolver { cache, fetcher, inflight: Singleflight::new() }
    }

    /// `Ok(None)` is absent; `Err(Restricted)` propagates the upstream's
    /// refusal reason (spec section 4.8 step 3, "Restricted errors
    /// propagate").
    pub async fn resolve(&self, short_code: &str) -> Result<Option<Post>, Restricted> {
        if let Some(post) = self.cache.get(short_code).await {
            return Ok(Some(post));
        }

        let cache = self.cache.clone();
        let fetcher = self.fetcher.clone();
        let key = short_code.to_string();
        let result = self
            .inflight
            .run(key.clone(), move || resolve_uncached(key, fetcher, cache))
            .await;

        match result {
            Ok(outcome) => Ok(outcome),
            Err(SingleflightError::Cancelled) => Ok(None),
            Err(SingleflightError::Inner(restricted)) => Err(restricted),
        }
    }
}

async fn resolve_uncached(
    short_code: String,
    fetcher: Arc<HttpFetcher>,
    cache: Arc<PostCache>,
) -> Result<Option<Post>, Restricted> {
    let embed = EmbedScraper::new(&fetcher).scrape(&short_code).await;

    let post = match embed {
        Some(post) if !post.blocked => Some(post),
        _ => GraphqlScraper::new(&fetcher).scrape(&short_code).await?,
    };

    if let Some(post) = &post {
        cache.set(post).await;
    }
    Ok(post)
}
