//! The two persistent cache instances the gateway keeps (spec section 4.1):
//! resolved posts, and resolved share-id -> shortcode mappings. Both are
//! the same [`kv::KvCache`] underneath, just with different TTLs and typed
//! wrappers around the raw bytes.

pub mod kv;

use std::path::Path;
use std::time::Duration;

use anyhow::Result;

use crate::model::Post;
use kv::KvCache;

/// Resolved posts expire after a day (spec section 4.1: "post cache, 24h
/// TTL") — long enough to absorb crawler retry storms, short enough that a
/// post later made private or deleted falls out of circulation quickly.
const POST_TTL: Duration = Duration::from_secs(86_400);

/// Share-id -> shortcode resolutions are effectively permanent (spec
/// section 4.1: "share-id cache, 1y TTL") since a given share link always
/// resolves to the same post.
const SHARE_ID_TTL: Duration = Duration::from_secs(365 * 86_400);

pub struct PostCache {
    inner: KvCache,
}

impl PostCache {
    pub async fn open(path: &Path) -> Result<Self> {
        Ok(PostCache { inner: KvCache::open(path, POST_TTL).await? })
    }

    pub async fn get(&self, post_id: &str) -> Option<Post> {
        let bytes = self.inner.get(post_id).await?;
        match Post::from_cache_bytes(&bytes) {
            Ok(post) => Some(post),
            Err(err) => {
                tracing::warn!(%post_id, %err, "discarding unparsable cached post");
                None
            }
        }
    }

    pub async fn set(&self, post: &Post) {
        match post.to_cache_bytes() {
            Ok(bytes) => self.inner.set(&post.post_id, &bytes).await,
            Err(err) => tracing::error!(post_id = %post.post_id, %err, "failed to serialize post for caching"),
        }
    }
}

pub struct ShareIdCache {
    inner: KvCache,
}

impl ShareIdCache {
    pub async fn open(path: &Path) -> Result<Self> {
        Ok(ShareIdCache { inner: KvCache::open(path, SHARE_ID_TTL).await? })
    }

    pub async fn get(&self, share_id: &str) -> Option<String> {
        let bytes = self.inner.get(share_id).await?;
        String::from_utf8(bytes).ok()
    }

    pub async fn set(&self, share_id: &str, shortcode: &str) {
        self.inner.set(share_id, shortcode.as_bytes()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Media, MediaType, User};

    fn sample_post(id: &str) -> Post {
        Post {
            post_id: id.to_string(),
            timestamp: 0,
            user: User { username: "u".to_string(), full_name: None, profile_pic: None },
            caption: "hi".to_string(),
            medias: vec![Media {
                url: "https://example.com/x.jpg".to_string(),
                media_type: MediaType::Image,
                width: 0,
                height: 0,
                duration: 0,
                preview_url: None,
            }],
            blocked: false,
        }
    }

    #[tokio::test]
    async fn post_cache_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PostCache::open(&dir.path().join("posts.sqlite")).await.unwrap();
        let post = sample_post("abc123");
        cache.set(&post).await;
        let fetched = cache.get("abc123").await.unwrap();
        assert_eq!(fetched.post_id, "abc123");
        assert_eq!(fetched.user.username, "u");
    }

    #[tokio::test]
    async fn share_id_cache_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ShareIdCache::open(&dir.path().join("shares.sqlite")).await.unwrap();
        cache.set("CxYz", "BA").await;
        assert_eq!(cache.get("CxYz").await, Some("BA".to_string()));
        assert_eq!(cache.get("missing").await, None);
    }
}
