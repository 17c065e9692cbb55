use super::{ContentBlock, StoryImage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type StoryId = String;

/// Moderation state of a story. Only `Approved` stories are public.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoryStatus {
    Pending,
    Approved,
    Rejected,
}

impl StoryStatus {
    /// Every status the moderation queue shows.
    pub const REVIEWABLE: [StoryStatus; 3] = [
        StoryStatus::Pending,
        StoryStatus::Approved,
        StoryStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StoryStatus::Pending => "pending",
            StoryStatus::Approved => "approved",
            StoryStatus::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(StoryStatus::Pending),
            "approved" => Some(StoryStatus::Approved),
            "rejected" => Some(StoryStatus::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for StoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A story as read back from the backend, with tag names and image records
/// already resolved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Story {
    pub id: StoryId,
    pub title: String,
    pub title_zh: Option<String>,
    pub slug: String,
    pub content: Vec<ContentBlock>,
    pub excerpt: Option<String>,
    pub excerpt_zh: Option<String>,
    pub status: StoryStatus,
    pub project_district: Option<String>,
    pub cover_image_url: Option<String>,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub images: Vec<StoryImage>,
}

impl Story {
    /// Publication time when set, otherwise submission time.
    pub fn display_date(&self) -> DateTime<Utc> {
        self.published_at.unwrap_or(self.created_at)
    }

    /// Text of the first paragraph block, even when that text is empty.
    pub fn first_paragraph(&self) -> Option<&str> {
        self.content.iter().find_map(|block| match block {
            ContentBlock::Paragraph { text } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn is_public(&self) -> bool {
        self.status == StoryStatus::Approved
    }
}

/// A story about to be inserted
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewStory {
    pub title: String,
    pub slug: String,
    pub content: Vec<ContentBlock>,
    pub status: StoryStatus,
    pub project_district: String,
    pub cover_image_url: Option<String>,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
}

/// Column changes applied by a moderation decision.
///
/// `published_at` is only written when present.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StatusUpdate {
    pub status: StoryStatus,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}
