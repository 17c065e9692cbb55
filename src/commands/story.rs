use crate::backend::{ClientAccessor, PostQuery};
use crate::error::{Result, StoryError};
use crate::models::Story;
use crate::render::{article_schema, blocking_message, render_schema_script, render_story_detail, PageMeta};
use reqwest::Url;
use tracing::error;

pub const NO_STORY_ID: &str = "No story ID provided.";
pub const NOT_FOUND: &str = "Story not found or not available.";
pub const LOAD_FAILED: &str = "Unable to load story. Please try again later.";

/// Everything the story page fills in.
#[derive(Debug, Clone, PartialEq)]
pub struct StoryPage {
    pub body: String,
    /// Present only when a story was rendered.
    pub schema_script: Option<String>,
    pub meta: Option<PageMeta>,
}

impl StoryPage {
    fn blocked(message: &str) -> Self {
        StoryPage {
            body: blocking_message(message),
            schema_script: None,
            meta: None,
        }
    }
}

/// Reads the `id` query parameter of a page URL, absolute or relative to
/// `site_url`.
pub fn story_id_from_url(site_url: &str, page_url: &str) -> Option<String> {
    let url = match Url::parse(page_url) {
        Ok(url) => url,
        Err(_) => Url::parse(site_url).ok()?.join(page_url).ok()?,
    };
    url.query_pairs()
        .find(|(key, _)| key == "id")
        .map(|(_, value)| value.trim().to_string())
        .filter(|id| !id.is_empty())
}

async fn fetch_public_story(accessor: &ClientAccessor, id: &str) -> Result<Option<Story>> {
    let client = accessor.get_client().ok_or_else(|| {
        StoryError::Configuration("Backend client not initialized".to_string())
    })?;
    let query = PostQuery::approved().with_id(id).with_images().with_limit(1);
    Ok(client.list_posts(&query).await?.into_iter().next())
}

pub async fn load_story(accessor: &ClientAccessor, page_url: &str) -> StoryPage {
    let config = accessor.config();
    let Some(id) = story_id_from_url(&config.site_url, page_url) else {
        return StoryPage::blocked(NO_STORY_ID);
    };

    match fetch_public_story(accessor, &id).await {
        Ok(Some(story)) => StoryPage {
            body: render_story_detail(&story),
            schema_script: Some(render_schema_script(&article_schema(&story, config))),
            meta: Some(PageMeta::for_story(&story, config)),
        },
        Ok(None) => StoryPage::blocked(NOT_FOUND),
        Err(e) => {
            error!("Error loading story: {}", e);
            StoryPage::blocked(LOAD_FAILED)
        }
    }
}
