//! Shared state handed to every axum handler (dispatch glue, spec
//! section 2 component 10 / SPEC_FULL.md component 14).

use std::sync::Arc;

use crate::cache::{PostCache, ShareIdCache};
use crate::config::Config;
use crate::grid::GridComposer;
use crate::http_fetcher::HttpFetcher;
use crate::post_resolver::PostResolver;
use crate::share_resolver::ShareResolver;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub fetcher: Arc<HttpFetcher>,
    pub post_resolver: Arc<PostResolver>,
    pub share_resolver: Arc<ShareResolver>,
    pub grid_composer: Arc<GridComposer>,
}

impl AppState {
    pub async fn build(config: Config) -> anyhow::Result<Self> {
        let fetcher = Arc::new(HttpFetcher::new(config.http_proxy.as_deref(), config.dns_cache_rewrite)?);
        let post_cache = Arc::new(PostCache::open(&config.post_cache_path()).await?);
        let share_cache = Arc::new(ShareIdCache::open(&config.shareid_cache_path()).await?);

        let post_resolver = Arc::new(PostResolver::new(post_cache, fetcher.clone()));
        let share_resolver = Arc::new(ShareResolver::new(fetcher.clone(), share_cache));
        let grid_composer = Arc::new(GridComposer::new(fetcher.clone(), config.grid_dir())?);

        Ok(AppState {
            config: Arc::new(config),
            fetcher,
            post_resolver,
            share_resolver,
            grid_composer,
        })
    }
}
