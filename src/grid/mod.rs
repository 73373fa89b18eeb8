//! Grid image composition: layout optimisation, download/composite, and
//! the on-disk cache guarding it (spec section 4.9, "Coalescing and
//! caching").

pub mod compose;
pub mod layout;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use moka::sync::Cache;

use crate::http_fetcher::HttpFetcher;
use crate::model::{MediaType, Post};
use crate::singleflight::Singleflight;

/// Capacity in the low 10^4, per spec section 3's "Grid cache entry".
const GRID_CACHE_CAPACITY: u64 = 10_000;

/// Tracks which post-ids have a composed grid JPEG on disk, with an
/// eviction listener that deletes the backing file — so capacity and
/// disk usage stay in lockstep (spec section 4.9, "Coalescing and
/// caching").
pub struct GridComposer {
    fetcher: Arc<HttpFetcher>,
    grid_dir: PathBuf,
    on_disk: Cache<String, ()>,
    inflight: Singleflight<String, (), String>,
}

impl GridComposer {
    /// Populates the LFU cache with whatever grid files already exist in
    /// `grid_dir` (spec section 4.9: "On startup, populate the LFU with
    /// the set of files already present on disk").
    pub fn new(fetcher: Arc<HttpFetcher>, grid_dir: PathBuf) -> std::io::Result<Self> {
        std::fs::create_dir_all(&grid_dir)?;

        let evict_dir = grid_dir.clone();
        let on_disk = Cache::builder()
            .max_capacity(GRID_CACHE_CAPACITY)
            .eviction_listener(move |post_id: Arc<String>, _value, _cause| {
                let path = evict_dir.join(format!("{post_id}.jpeg"));
                if let Err(err) = std::fs::remove_file(&path) {
                    if err.kind() != std::io::ErrorKind::NotFound {
                        tracing::warn!(path = %path.display(), %err, "failed to evict grid file");
                    }
                }
            })
            .build();

        for entry in std::fs::read_dir(&grid_dir)? {
            let entry = entry?;
            if let Some(post_id) = entry
                .path()
                .file_stem()
                .and_then(|s| s.to_str())
                .filter(|_| entry.path().extension().is_some_and(|e| e == "jpeg"))
            {
                on_disk.insert(post_id.to_string(), ());
            }
        }

        Ok(GridComposer { fetcher, grid_dir, inflight: Singleflight::new(), on_disk })
    }

    pub fn path_for(&self, post_id: &str) -> PathBuf {
        self.grid_dir.join(format!("{post_id}.jpeg"))
    }

    /// Returns the path to a composed grid JPEG for `post`, generating it
    /// (under a singleflight keyed by post-id) if it isn't already on
    /// disk. `None` on any composition failure — callers fall back to a
    /// single-image URL (spec section 4.9, "Failure semantics").
    pub async fn get_or_compose(&self, post: &Post) -> Option<PathBuf> {
        let path = self.path_for(&post.post_id);
        if self.on_disk.contains_key(&post.post_id) && path.exists() {
            return Some(path);
        }

        let image_urls: Vec<String> = post
            .medias
            .iter()
            .filter(|m| m.media_type == MediaType::Image)
            .map(|m| m.url.clone())
            .collect();
        if image_urls.is_empty() {
            return None;
        }

        let fetcher = self.fetcher.clone();
        let post_id = post.post_id.clone();
        let target = path.clone();
        let result = self
            .inflight
            .run(post_id.clone(), move || compose_and_write(fetcher, image_urls, target))
            .await;

        match result {
            Ok(()) => {
                self.on_disk.insert(post_id, ());
                Some(path)
            }
            Err(err) => {
                tracing::warn!(post_id = %post.post_id, %err, "grid composition failed");
                None
            }
        }
    }
}

async fn compose_and_write(
    fetcher: Arc<HttpFetcher>,
    image_urls: Vec<String>,
    target: PathBuf,
) -> Result<(), String> {
    let images = compose::download_images(&fetcher, &image_urls).await.map_err(|e| e.to_string())?;
    tokio::task::spawn_blocking(move || compose::compose_grid(&images, &target))
        .await
        .map_err(|e| e.to_string())?
        .map_err(|e| e.to_string())
}
