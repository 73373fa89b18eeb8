//! Plain `format!`-string HTML rendering, mirroring
//! `original_source/src/templates/embed.py` / `error.py` — both hand-built
//! f-string templates, not a templating engine (SPEC_FULL.md section 6).

/// Matches the original's `templates/__init__.py::escape_html`.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&#34;")
        .replace('\'', "&#39;")
}

#[derive(Default)]
pub struct EmbedContext {
    pub theme_color: &'static str,
    pub post_url: String,
    pub username: String,
    pub full_name: Option<String>,
    pub og_site_name: &'static str,
    pub og_description: Option<String>,
    pub media_width: u32,
    pub media_height: u32,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub oembed_url: Option<String>,
    pub mastodon_statuses_url: Option<String>,
}

pub fn render_embed(ctx: &EmbedContext) -> String {
    let shown_name = match &ctx.full_name {
        Some(full_name) if !full_name.is_empty() => format!("{} (@{})", full_name, ctx.username),
        _ => format!("{0} (@{0})", ctx.username),
    };
    let media_height = if ctx.media_height == 0 { String::new() } else { ctx.media_height.to_string() };

    let mut html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <link rel="canonical" href="{post_url}"/>
    <meta property="og:url" content="{post_url}"/>
    <meta property="twitter:site" content="@{username}" />
    <meta property="twitter:creator" content="@{username}" />
    <meta property="theme-color" content="{theme_color}" />
    <meta property="twitter:title" content="{shown_name}" />
    <meta http-equiv="refresh" content="0;url={post_url}"/>

    <meta property="og:title" content="{shown_name}" />
    <meta property="og:description" content="{description}"/>
    <meta property="og:site_name" content="{site_name}" />
    <meta property="twitter:card" content="summary_large_image"/>
"#,
        post_url = ctx.post_url,
        username = ctx.username,
        theme_color = ctx.theme_color,
        shown_name = escape_html(&shown_name),
        description = escape_html(ctx.og_description.as_deref().unwrap_or("")),
        site_name = ctx.og_site_name,
    );

    if let Some(image_url) = &ctx.image_url {
        html.push_str(&format!(
            r#"    <meta property="og:image" content="{image_url}"/>
    <meta property="twitter:card" content="summary_large_image"/>
    <meta property="twitter:image" content="{image_url}"/>
"#,
        ));
    }

    if let Some(video_url) = &ctx.video_url {
        html.push_str(&format!(
            r#"    <meta property="og:video" content="{video_url}"/>
    <meta property="og:video:secure_url" content="{video_url}"/>
    <meta property="og:video:type" content="video/mp4"/>
    <meta property="og:video:width" content="{media_width}"/>
    <meta property="og:video:height" content="{media_height}"/>

    <meta property="twitter:card" content="player"/>
    <meta property="twitter:player:stream" content="{video_url}"/>
    <meta property="twitter:player:stream:content_type" content="video/mp4"/>
    <meta property="twitter:player:width" content="{media_width}"/>
    <meta property="twitter:player:height" content="{media_height}"/>
"#,
            media_width = ctx.media_width,
        ));
    }

    if let Some(oembed_url) = &ctx.oembed_url {
        html.push_str(&format!(r#"    <link rel="alternate" href="{oembed_url}" type="application/json+oembed">
"#));
    }

    if let Some(mastodon_url) = &ctx.mastodon_statuses_url {
        html.push_str(&format!(
            r#"    <link href="{mastodon_url}" rel="alternate" type="application/activity+json">
"#
        ));
    }

    html.push_str(&format!(
        r#"</head>
<body>
    Redirecting you to the post in a moment.
    <a href="{post_url}">Or click here.</a>
</body>
</html>
"#,
        post_url = ctx.post_url,
    ));

    html
}

pub fn render_error(theme_color: &str, post_url: &str, error_message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <link rel="canonical" href="{post_url}"/>
    <meta property="og:url" content="{post_url}"/>
    <meta property="twitter:site" content="InstaFix" />
    <meta property="twitter:creator" content="InstaFix" />
    <meta property="theme-color" content="{theme_color}" />
    <meta property="twitter:title" content="InstaFix" />
    <meta http-equiv="refresh" content="0;url={post_url}"/>

    <meta property="og:title" content="InstaFix" />
    <meta property="og:description" content="Post might be blocked. Reason: '{message}'"/>
    <meta property="og:site_name" content="InstaFix" />
    <meta property="twitter:card" content="summary"/>
</head>
<body>
    Redirecting you to the post in a moment.
    <a href="{post_url}">Or click here.</a>
</body>
</html>
"#,
        message = escape_html(error_message),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_the_five_html_special_characters() {
        assert_eq!(escape_html(r#"<a href="x">&'</a>"#), "&lt;a href=&#34;x&#34;&gt;&amp;&#39;&lt;/a&gt;");
    }

    #[test]
    fn embed_html_carries_og_image_when_set() {
        let ctx = EmbedContext {
            theme_color: "#0084ff",
            post_url: "https://x/p/ABC/".to_string(),
            username: "alice".to_string(),
            og_site_name: "InstaFix",
            image_url: Some("/images/ABC/1".to_string()),
            ..Default::default()
        };
        let html = render_embed(&ctx);
        assert!(html.contains(r#"og:image" content="/images/ABC/1""#));
        assert!(html.contains("alice (@alice)"));
    }

    #[test]
    fn embed_html_escapes_description() {
        let ctx = EmbedContext {
            og_description: Some("<script>".to_string()),
            ..Default::default()
        };
        let html = render_embed(&ctx);
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn error_html_contains_reason() {
        let html = render_error("#0084ff", "https://x/p/ABC/", "Sensitive content");
        assert!(html.contains("Sensitive content"));
        assert!(html.contains(r#"content="0;url=https://x/p/ABC/""#));
    }
}
