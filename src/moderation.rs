use crate::backend::{Backend, PostQuery};
use crate::error::{Result, StoryError};
use crate::models::{StatusUpdate, Story, StoryStatus};
use chrono::{DateTime, Utc};
use tracing::{error, info};

/// Reads the review queue and applies approve/reject decisions.
pub struct ModerationPipeline<'a> {
    backend: &'a dyn Backend,
}

impl<'a> ModerationPipeline<'a> {
    pub fn new(backend: &'a dyn Backend) -> Self {
        ModerationPipeline { backend }
    }

    /// Every reviewable story, newest first, with tags.
    pub async fn list_reviewable(&self) -> Result<Vec<Story>> {
        self.backend
            .list_posts(&PostQuery::reviewable())
            .await
            .map_err(|e| {
                error!("Error loading posts: {}", e);
                e
            })
    }

    pub async fn set_status(&self, id: &str, status: StoryStatus) -> Result<()> {
        self.set_status_at(id, status, Utc::now()).await
    }

    /// Applies a decision as of `now`.
    ///
    /// `published_at` is stamped on the first approval only.
    pub async fn set_status_at(&self, id: &str, status: StoryStatus, now: DateTime<Utc>) -> Result<()> {
        if status == StoryStatus::Pending {
            return Err(StoryError::Validation(
                "Stories can only be approved or rejected.".to_string(),
            ));
        }

        let current = self
            .backend
            .list_posts(&PostQuery::default().with_id(id).with_limit(1))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoryError::NotFound(format!("post {}", id)))?;

        let published_at = match (status, current.published_at) {
            (StoryStatus::Approved, None) => Some(now),
            _ => None,
        };
        let update = StatusUpdate {
            status,
            updated_at: now,
            published_at,
        };

        self.backend.update_post_status(id, &update).await.map_err(|e| {
            error!("Error updating post status: {}", e);
            e
        })?;
        info!("Post {} {}", id, status);
        Ok(())
    }
}
