//! The normalised record a scraper produces (spec section 3).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaType {
    Image,
    Video,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Media {
    pub url: String,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub preview_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub profile_pic: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub post_id: String,
    pub timestamp: i64,
    pub user: User,
    pub caption: String,
    pub medias: Vec<Media>,
    pub blocked: bool,
}

impl Post {
    /// Invariant from spec section 3: any `Post` the resolver returns has
    /// at least one medium.
    pub fn is_valid(&self) -> bool {
        !self.medias.is_empty()
    }

    pub fn to_cache_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    pub fn from_cache_bytes(bytes: &[u8]) -> serde_json::Result<Post> {
        serde_json::from_slice(bytes)
    }
}
