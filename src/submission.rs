use crate::backend::{Backend, UploadOptions};
use crate::config::Config;
use crate::error::{Result, StoryError};
use crate::models::{NewStory, NewStoryImage, StoryId, StoryStatus, Tag};
use crate::parsers::{clean_optional, parse_tag_input, split_paragraph_blocks};
use crate::slug::slug_or_fallback;
use chrono::Utc;
use serde::Deserialize;
use std::fmt;
use tracing::{error, info, warn};

pub const MISSING_FIELDS: &str = "Title and story content are required.";
pub const RIGHTS_NOT_CONFIRMED: &str =
    "You must confirm that you own the rights to the content you upload.";

/// A file picked in the photo input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Photo {
    pub file_name: String,
    #[serde(default)]
    pub bytes: Vec<u8>,
}

/// The public submission form as posted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmissionForm {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub project_district: Option<String>,
    /// Comma separated.
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub author_email: Option<String>,
    #[serde(default)]
    pub rights_owned: bool,
    #[serde(default)]
    pub photos: Vec<Photo>,
}

impl SubmissionForm {
    /// Checks required fields. The first violation wins.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() || self.content.trim().is_empty() {
            return Err(StoryError::Validation(MISSING_FIELDS.to_string()));
        }
        if !self.rights_owned {
            return Err(StoryError::Validation(RIGHTS_NOT_CONFIRMED.to_string()));
        }
        Ok(())
    }
}

/// What to do when a secondary write fails after the story row exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log, record in the receipt and carry on.
    #[default]
    BestEffort,
    /// Abort with the underlying error.
    Strict,
}

/// A secondary write that failed but was tolerated.
#[derive(Debug, Clone, PartialEq)]
pub enum PartialFailure {
    Upload { file_name: String, message: String },
    Tag { name: String, message: String },
    ImageRecords { count: usize, message: String },
}

impl fmt::Display for PartialFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartialFailure::Upload { file_name, message } => {
                write!(f, "upload of {} failed: {}", file_name, message)
            }
            PartialFailure::Tag { name, message } => {
                write!(f, "tag {} not attached: {}", name, message)
            }
            PartialFailure::ImageRecords { count, message } => {
                write!(f, "{} image record(s) not stored: {}", count, message)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionReceipt {
    pub story_id: StoryId,
    pub skipped: Vec<PartialFailure>,
}

impl SubmissionReceipt {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Object name for the `index`-th submitted photo.
///
/// The extension keeps only ASCII letters and digits of whatever follows the
/// last `.`.
pub fn upload_name(slug: &str, unix_millis: i64, index: usize, file_name: &str) -> String {
    let ext: String = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.chars().filter(char::is_ascii_alphanumeric).collect())
        .unwrap_or_default();
    if ext.is_empty() {
        format!("{}-{}-{}", slug, unix_millis, index)
    } else {
        format!("{}-{}-{}.{}", slug, unix_millis, index, ext)
    }
}

/// Turns a submitted form into a pending story with its uploads, tags and
/// image records.
pub struct SubmissionPipeline<'a> {
    backend: &'a dyn Backend,
    config: &'a Config,
    policy: FailurePolicy,
}

impl<'a> SubmissionPipeline<'a> {
    pub fn new(backend: &'a dyn Backend, config: &'a Config) -> Self {
        SubmissionPipeline {
            backend,
            config,
            policy: FailurePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub async fn submit(&self, form: &SubmissionForm) -> Result<SubmissionReceipt> {
        form.validate()?;

        let title = form.title.trim();
        let slug = slug_or_fallback(title);
        let mut skipped = Vec::new();

        let urls = self.upload_photos(&slug, &form.photos, &mut skipped).await?;

        let district = form
            .project_district
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or(self.config.default_district.as_str())
            .to_string();

        let new_story = NewStory {
            title: title.to_string(),
            slug,
            content: split_paragraph_blocks(&form.content),
            status: StoryStatus::Pending,
            project_district: district,
            cover_image_url: urls.first().cloned(),
            author_name: clean_optional(form.author_name.as_deref()),
            author_email: clean_optional(form.author_email.as_deref()),
        };

        let story = self.backend.insert_post(&new_story).await.map_err(|e| {
            error!("Failed to insert story: {}", e);
            e
        })?;
        info!("Story {} submitted as {}", story.id, story.slug);

        for name in parse_tag_input(&form.tags) {
            if let Err(e) = self.attach_tag(&story.id, &name).await {
                let failure = PartialFailure::Tag {
                    name: name.clone(),
                    message: e.to_string(),
                };
                self.tolerate(e, failure, &mut skipped)?;
            }
        }

        if !urls.is_empty() {
            let records = NewStoryImage::from_urls(&story.id, &urls);
            if let Err(e) = self.backend.insert_post_images(&records).await {
                let failure = PartialFailure::ImageRecords {
                    count: records.len(),
                    message: e.to_string(),
                };
                self.tolerate(e, failure, &mut skipped)?;
            }
        }

        Ok(SubmissionReceipt {
            story_id: story.id,
            skipped,
        })
    }

    async fn upload_photos(
        &self,
        slug: &str,
        photos: &[Photo],
        skipped: &mut Vec<PartialFailure>,
    ) -> Result<Vec<String>> {
        let mut urls = Vec::new();
        for (index, photo) in photos.iter().enumerate() {
            if photo.bytes.is_empty() {
                continue;
            }

            let path = upload_name(slug, Utc::now().timestamp_millis(), index, &photo.file_name);
            let options = UploadOptions::for_file(&path, &self.config.upload_cache_control);
            match self.backend.upload_object(&path, &photo.bytes, &options).await {
                Ok(()) => urls.push(self.backend.public_url(&path)),
                Err(e) => {
                    let failure = PartialFailure::Upload {
                        file_name: photo.file_name.clone(),
                        message: e.to_string(),
                    };
                    self.tolerate(e, failure, skipped)?;
                }
            }
        }
        Ok(urls)
    }

    /// Get-or-create, then associate. A conflict on create means another
    /// submission created the tag first, so the existing row is read back.
    async fn attach_tag(&self, story_id: &str, name: &str) -> Result<()> {
        let tag = self.resolve_tag(name).await?;
        self.backend.insert_post_tag(story_id, &tag.id).await
    }

    async fn resolve_tag(&self, name: &str) -> Result<Tag> {
        if let Some(tag) = self.backend.find_tag(name).await? {
            return Ok(tag);
        }
        match self.backend.insert_tag(name).await {
            Ok(tag) => Ok(tag),
            Err(StoryError::Conflict(_)) => self
                .backend
                .find_tag(name)
                .await?
                .ok_or_else(|| StoryError::NotFound(format!("tag {}", name))),
            Err(e) => Err(e),
        }
    }

    fn tolerate(
        &self,
        err: StoryError,
        failure: PartialFailure,
        skipped: &mut Vec<PartialFailure>,
    ) -> Result<()> {
        if self.policy == FailurePolicy::Strict {
            error!("Submission aborted, {}", failure);
            return Err(err);
        }
        warn!("Continuing submission: {}", failure);
        skipped.push(failure);
        Ok(())
    }
}
