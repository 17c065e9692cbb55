use crate::error::Result;
use crate::models::{NewStory, NewStoryImage, Session, StatusUpdate, Story, StoryStatus, Tag};
use async_trait::async_trait;

/// Row filter for reading stories.
///
/// Results are always ordered newest `created_at` first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostQuery {
    /// Empty means any status.
    pub statuses: Vec<StoryStatus>,
    /// Case-insensitive substring match on the district column.
    pub district_contains: Option<String>,
    pub id: Option<String>,
    pub limit: Option<usize>,
    pub include_images: bool,
}

impl PostQuery {
    pub fn approved() -> Self {
        PostQuery {
            statuses: vec![StoryStatus::Approved],
            ..PostQuery::default()
        }
    }

    pub fn reviewable() -> Self {
        PostQuery {
            statuses: StoryStatus::REVIEWABLE.to_vec(),
            ..PostQuery::default()
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_district(mut self, district: &str) -> Self {
        self.district_contains = Some(district.to_string());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_images(mut self) -> Self {
        self.include_images = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadOptions {
    /// Cache lifetime in seconds, sent as `max-age`.
    pub cache_control: String,
    pub upsert: bool,
    pub content_type: String,
}

impl UploadOptions {
    pub fn for_file(path: &str, cache_control: &str) -> Self {
        UploadOptions {
            cache_control: cache_control.to_string(),
            upsert: false,
            content_type: content_type_for(path).to_string(),
        }
    }
}

fn content_type_for(path: &str) -> &'static str {
    let ext = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "avif" => "image/avif",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// The managed service behind the site: auth, rows and object storage.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn get_session(&self) -> Result<Option<Session>>;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session>;

    async fn sign_out(&self) -> Result<()>;

    /// `profiles.role` for the given user, if the profile exists.
    async fn fetch_role(&self, user_id: &str) -> Result<Option<String>>;

    async fn list_posts(&self, query: &PostQuery) -> Result<Vec<Story>>;

    async fn insert_post(&self, post: &NewStory) -> Result<Story>;

    async fn update_post_status(&self, id: &str, update: &StatusUpdate) -> Result<()>;

    async fn find_tag(&self, name: &str) -> Result<Option<Tag>>;

    /// Fails with `StoryError::Conflict` when the name already exists.
    async fn insert_tag(&self, name: &str) -> Result<Tag>;

    async fn insert_post_tag(&self, post_id: &str, tag_id: &str) -> Result<()>;

    async fn insert_post_images(&self, images: &[NewStoryImage]) -> Result<()>;

    /// Fails with `StoryError::Conflict` when the object exists and
    /// `options.upsert` is false.
    async fn upload_object(&self, path: &str, bytes: &[u8], options: &UploadOptions) -> Result<()>;

    fn public_url(&self, path: &str) -> String;
}
