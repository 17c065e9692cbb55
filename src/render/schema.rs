use super::html::escape_html;
use crate::config::Config;
use crate::models::Story;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};

const DEFAULT_OG_IMAGE: &str = "assets/images/og-image.jpg";
const LOGO: &str = "assets/images/logo.png";

fn site_asset(config: &Config, path: &str) -> String {
    format!("{}/{}", config.site_url.trim_end_matches('/'), path)
}

fn story_url(story: &Story, config: &Config) -> String {
    site_asset(config, &format!("story.html?id={}", story.id))
}

fn timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Stored excerpt, else the head of the first paragraph. Not ellipsized.
pub fn story_description(story: &Story, max_chars: usize) -> String {
    if let Some(excerpt) = story.excerpt.as_deref().filter(|e| !e.is_empty()) {
        return excerpt.to_string();
    }
    story
        .first_paragraph()
        .map(|text| text.chars().take(max_chars).collect())
        .unwrap_or_default()
}

/// schema.org `Article` for a story page.
pub fn article_schema(story: &Story, config: &Config) -> Value {
    let organization = json!({
        "@type": "Organization",
        "name": config.site_name,
        "alternateName": config.site_alternate_name,
    });
    let mut publisher = organization.clone();
    publisher["logo"] = json!({
        "@type": "ImageObject",
        "url": site_asset(config, LOGO),
    });

    let image = story
        .cover_image_url
        .clone()
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| site_asset(config, DEFAULT_OG_IMAGE));
    let modified = story
        .updated_at
        .or(story.published_at)
        .unwrap_or(story.created_at);

    let mut schema = json!({
        "@context": "https://schema.org",
        "@type": "Article",
        "headline": story.title,
        "description": story_description(story, config.description_length),
        "image": image,
        "datePublished": timestamp(story.display_date()),
        "dateModified": timestamp(modified),
        "author": organization,
        "publisher": publisher,
        "mainEntityOfPage": {
            "@type": "WebPage",
            "@id": story_url(story, config),
        },
    });

    if let Some(title_zh) = story.title_zh.as_deref().filter(|t| !t.is_empty()) {
        schema["alternativeHeadline"] = json!(title_zh);
    }
    if !story.tags.is_empty() {
        schema["keywords"] = json!(story.tags.join(", "));
    }

    schema
}

/// `<script type="application/ld+json">` carrying `schema`.
pub fn render_schema_script(schema: &Value) -> String {
    let body = schema.to_string().replace("</", "<\\/");
    format!(
        "<script type=\"application/ld+json\" id=\"article-schema\">{}</script>",
        body
    )
}

/// Document head values for a story page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageMeta {
    pub title: String,
    pub description: String,
    pub canonical_url: String,
    pub image: Option<String>,
    pub og_title: String,
}

impl PageMeta {
    pub fn for_story(story: &Story, config: &Config) -> Self {
        PageMeta {
            title: format!(
                "{} | {} | {}",
                story.title, config.site_name, config.site_alternate_name
            ),
            description: story_description(story, config.description_length),
            canonical_url: story_url(story, config),
            image: story.cover_image_url.clone().filter(|c| !c.is_empty()),
            og_title: story.title.clone(),
        }
    }

    /// Title, Open Graph, Twitter card and canonical link tags. Empty values
    /// are left out.
    pub fn render_head(&self) -> String {
        let mut tags = vec![format!("<title>{}</title>", escape_html(&self.title))];
        let mut meta = |attr: &str, key: &str, value: &str| {
            if !value.is_empty() {
                tags.push(format!(
                    "<meta {}=\"{}\" content=\"{}\" />",
                    attr,
                    key,
                    escape_html(value)
                ));
            }
        };

        meta("property", "og:title", &self.og_title);
        meta("property", "og:description", &self.description);
        meta("property", "og:url", &self.canonical_url);
        if let Some(image) = &self.image {
            meta("property", "og:image", image);
        }
        meta("name", "twitter:title", &self.og_title);
        meta("name", "twitter:description", &self.description);
        if let Some(image) = &self.image {
            meta("name", "twitter:image", image);
        }

        tags.push(format!(
            "<link rel=\"canonical\" href=\"{}\" />",
            escape_html(&self.canonical_url)
        ));
        tags.join("")
    }
}
