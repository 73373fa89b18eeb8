//! The two post scrapers (spec sections 4.6, 4.7) share an identical
//! media-extraction shape over `shortcode_media`-like JSON; this module
//! holds that shared logic plus the things each scraper's own file needs
//! privately.

pub mod embed;
pub mod graphql;

use serde_json::Value;

use crate::json_tree::JsonTreeExt;
use crate::model::{Media, MediaType};

/// How a `shortcode_media`-shaped JSON node spells out each item's media
/// type. The embed page's inline JSON never carries `__typename` on sidecar
/// nodes, so it infers type from which URL field is present; the GraphQL
/// response always carries `__typename` (spec sections 4.6 step 3 / 4.7
/// step 4).
pub enum TypeSource {
    UrlPresence,
    Typename,
}

/// Extract the ordered media list from a `shortcode_media` JSON node:
/// a sidecar's `edge_sidecar_to_children.edges[*].node`, or the node
/// itself for a single-media post.
pub fn extract_medias(shortcode_media: &Value, type_source: TypeSource) -> Vec<Media> {
    let edges = shortcode_media.get_path("edge_sidecar_to_children").get_path("edges");
    let nodes: Vec<&Value> = match edges.as_array() {
        Some(edges) if !edges.is_empty() => {
            edges.iter().map(|e| e.get_path("node")).collect()
        }
        _ => vec![shortcode_media],
    };

    nodes
        .into_iter()
        .map(|node| media_from_node(node, &type_source))
        .collect()
}

fn media_from_node(node: &Value, type_source: &TypeSource) -> Media {
    let video_url = node.get("video_url").and_then(Value::as_str);
    let display_url = node.get_path("display_url").as_string_or_default("");

    let media_type = match type_source {
        TypeSource::UrlPresence => {
            if video_url.is_some() {
                MediaType::Video
            } else {
                MediaType::Image
            }
        }
        TypeSource::Typename => {
            match node.get_path("__typename").as_string_or_default("").as_str() {
                "XDTGraphVideo" | "GraphVideo" => MediaType::Video,
                _ => MediaType::Image,
            }
        }
    };

    let url = video_url.map(str::to_string).unwrap_or_else(|| display_url.clone());
    let preview_url = if media_type == MediaType::Video && !display_url.is_empty() {
        Some(display_url)
    } else {
        None
    };

    Media {
        url,
        media_type,
        width: node.get_path("dimensions").get_path("width").as_u32_or_default(0),
        height: node.get_path("dimensions").get_path("height").as_u32_or_default(0),
        duration: 0,
        preview_url,
    }
}

/// Extracts `edge_media_to_caption.edges[0].node.text`, the shape both
/// scrapers' upstream JSON uses for the caption.
pub fn extract_caption(shortcode_media: &Value) -> String {
    shortcode_media
        .get_path("edge_media_to_caption")
        .get_path("edges")
        .as_array()
        .and_then(|edges| edges.first())
        .map(|edge| edge.get_path("node").get_path("text").as_string_or_default(""))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn single_media_node_without_sidecar() {
        let media = json!({
            "display_url": "https://x/img.jpg",
            "dimensions": {"width": 100, "height": 200},
        });
        let out = extract_medias(&media, TypeSource::UrlPresence);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].media_type, MediaType::Image);
        assert_eq!(out[0].url, "https://x/img.jpg");
    }

    #[test]
    fn video_prefers_video_url_and_sets_preview() {
        let media = json!({
            "video_url": "https://x/vid.mp4",
            "display_url": "https://x/poster.jpg",
            "dimensions": {"width": 10, "height": 20},
        });
        let out = extract_medias(&media, TypeSource::UrlPresence);
        assert_eq!(out[0].media_type, MediaType::Video);
        assert_eq!(out[0].url, "https://x/vid.mp4");
        assert_eq!(out[0].preview_url.as_deref(), Some("https://x/poster.jpg"));
    }

    #[test]
    fn sidecar_extracts_each_child_node() {
        let media = json!({
            "edge_sidecar_to_children": {
                "edges": [
                    {"node": {"display_url": "https://x/1.jpg", "dimensions": {"width": 1, "height": 1}}},
                    {"node": {"video_url": "https://x/2.mp4", "display_url": "https://x/2.jpg", "dimensions": {"width": 2, "height": 2}}},
                ]
            }
        });
        let out = extract_medias(&media, TypeSource::UrlPresence);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].media_type, MediaType::Image);
        assert_eq!(out[1].media_type, MediaType::Video);
    }

    #[test]
    fn typename_normalizes_xdt_prefix() {
        let media = json!({"__typename": "XDTGraphVideo", "video_url": "https://x/v.mp4", "dimensions": {"width": 1, "height": 1}});
        let out = extract_medias(&media, TypeSource::Typename);
        assert_eq!(out[0].media_type, MediaType::Video);
    }

    #[test]
    fn caption_pulled_from_first_edge() {
        let media = json!({
            "edge_media_to_caption": {"edges": [{"node": {"text": "hello"}}]}
        });
        assert_eq!(extract_caption(&media), "hello");
    }

    #[test]
    fn missing_caption_is_empty() {
        assert_eq!(extract_caption(&json!({})), "");
    }
}
