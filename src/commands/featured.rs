use crate::backend::{ClientAccessor, PostQuery};
use crate::render::{render_cards, render_message, CardOptions};
use tracing::error;

pub const COMING_SOON: &str = "Stories coming soon.";
pub const LOAD_FAILED: &str = "Unable to load stories. Please try again later.";

fn empty_message(district: &str) -> String {
    format!(
        "<p style=\"text-align: center; color: var(--color-text-light);\">No {} stories available yet. \
         <a href=\"submit.html\">Submit a story</a> to get started!</p>",
        crate::render::escape_html(district)
    )
}

/// The handful of newest approved stories from the featured district.
pub async fn load_featured_stories(accessor: &ClientAccessor) -> String {
    let Some(client) = accessor.get_client() else {
        return render_message(COMING_SOON);
    };
    let config = accessor.config();

    let query = PostQuery::approved()
        .with_district(&config.featured_district)
        .with_limit(config.featured_limit);

    match client.list_posts(&query).await {
        Ok(stories) if stories.is_empty() => empty_message(&config.featured_district),
        Ok(stories) => render_cards(
            &stories,
            config.excerpt_length,
            &CardOptions::compact(config.card_tag_limit),
        ),
        Err(e) => {
            error!("Error loading {} stories: {}", config.featured_district, e);
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

    async fn approved(backend: &FaultyBackend, title: &str, district: &str) {
        let story = backend
            .insert_post(&NewStory {
                title: title.to_string(),
                slug: crate::slug::generate_slug(title),
                content: vec![ContentBlock::paragraph("Body")],
                status: StoryStatus::Pending,
                project_district: district.to_string(),
                cover_image_url: None,
                author_name: None,
                author_email: None,
            })
            .await
            .unwrap();
        let update = StatusUpdate {
            status: StoryStatus::Approved,
            updated_at: Utc::now(),
            published_at: Some(Utc::now()),
        };
        backend.update_post_status(&story.id, &update).await.unwrap();
    }

    #[tokio::test]
    async fn test_unconfigured() {
        let accessor = ClientAccessor::new(Config::default());
        assert!(load_featured_stories(&accessor).await.contains(COMING_SOON));
    }

    #[tokio::test]
    async fn test_district_filter_and_limit() {
        let backend = FaultyBackend::new();
        for title in ["One", "Two", "Three", "Four"] {
            approved(&backend, title, "shilin district").await;
        }
        approved(&backend, "Elsewhere", "Beitou").await;
        let accessor = ClientAccessor::with_backend(Config::default(), Arc::new(backend));

        let html = load_featured_stories(&accessor).await;
        assert_eq!(html.matches("class=\"card story-card").count(), 3);
        assert!(html.contains("Four"));
        assert!(!html.contains(">One<"));
        assert!(!html.contains("Elsewhere"));
    }

    #[tokio::test]
    async fn test_empty_invites_submission() {
        let accessor = ClientAccessor::with_backend(Config::default(), Arc::new(FaultyBackend::new()));
        let html = load_featured_stories(&accessor).await;
        assert!(html.contains("No Shilin stories available yet."));
        assert!(html.contains("<a href=\"submit.html\">Submit a story</a>"));
    }
}
