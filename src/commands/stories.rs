use crate::backend::{ClientAccessor, PostQuery};
use crate::render::{render_cards, render_message, CardOptions};
use tracing::error;

pub const NOT_CONFIGURED: &str =
    "Stories feature requires configuration. Please check your Supabase setup.";
pub const NO_STORIES: &str = "No stories available at this time.";
pub const LOAD_FAILED: &str = "Unable to load stories. Please try again later.";

/// The full stories grid: every approved story, newest first.
pub async fn load_stories(accessor: &ClientAccessor) -> String {
    let Some(client) = accessor.get_client() else {
        return render_message(NOT_CONFIGURED);
    };

    match client.list_posts(&PostQuery::approved()).await {
        Ok(stories) if stories.is_empty() => render_message(NO_STORIES),
        Ok(stories) => render_cards(
            &stories,
            accessor.config().excerpt_length,
            &CardOptions::full_listing(),
        ),
        Err(e) => {
            error!("Error loading stories: {}", e);
            render_message(LOAD_FAILED)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Backend;
    use crate::config::Config;
    use crate::models::{ContentBlock, NewStory, StatusUpdate, StoryStatus};
    use crate::testing::FaultyBackend;
    use chrono::Utc;
    use std::sync::Arc;

    async fn seed(backend: &FaultyBackend, title: &str, status: StoryStatus) {
        let story = backend
            .insert_post(&NewStory {
                title: title.to_string(),
                slug: crate::slug::generate_slug(title),
                content: vec![ContentBlock::paragraph(format!("About {}", title))],
                status: StoryStatus::Pending,
                project_district: "Shilin".to_string(),
                cover_image_url: None,
                author_name: None,
                author_email: None,
            })
            .await
            .unwrap();
        if status != StoryStatus::Pending {
            let update = StatusUpdate {
                status,
                updated_at: Utc::now(),
                published_at: Some(Utc::now()),
            };
            backend.update_post_status(&story.id, &update).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_unconfigured_shows_message() {
        let accessor = ClientAccessor::new(Config::default());
        let html = load_stories(&accessor).await;
        assert!(html.contains(NOT_CONFIGURED));
    }

    #[tokio::test]
    async fn test_only_approved_stories_rendered() {
        let backend = FaultyBackend::new();
        seed(&backend, "Visible", StoryStatus::Approved).await;
        seed(&backend, "Waiting", StoryStatus::Pending).await;
        seed(&backend, "Refused", StoryStatus::Rejected).await;
        let accessor = ClientAccessor::with_backend(Config::default(), Arc::new(backend));

        let html = load_stories(&accessor).await;
        assert!(html.contains("Visible"));
        assert!(!html.contains("Waiting"));
        assert!(!html.contains("Refused"));
    }

    #[tokio::test]
    async fn test_empty_and_failed_listings() {
        let accessor = ClientAccessor::with_backend(Config::default(), Arc::new(FaultyBackend::new()));
        assert!(load_stories(&accessor).await.contains(NO_STORIES));

        let failing = FaultyBackend::new().failing_listing();
        let accessor = ClientAccessor::with_backend(Config::default(), Arc::new(failing));
        assert!(load_stories(&accessor).await.contains(LOAD_FAILED));
    }
}
