//! Test doubles shared by the pipeline and page tests.

use crate::backend::{Backend, PostQuery, UploadOptions};
use crate::database::SqliteBackend;
use crate::error::{Result, StoryError};
use crate::models::{NewStory, NewStoryImage, Session, StatusUpdate, Story, Tag};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub const PUBLIC_BASE: &str = "http://localhost:8000/storage/post-images";

/// Wraps the in-memory backend, counting every call and failing the ones it
/// was told to.
pub struct FaultyBackend {
    pub inner: SqliteBackend,
    calls: AtomicUsize,
    uploads: AtomicUsize,
    failing_uploads: HashSet<usize>,
    failing_tags: HashSet<String>,
    fail_listing: bool,
    fail_status_updates: bool,
    fail_image_records: bool,
    fail_sign_out: bool,
    fail_roles: bool,
    /// Tag names whose insert reports a conflict after a concurrent writer
    /// created them.
    racing_tags: Mutex<HashSet<String>>,
    uploaded_paths: Mutex<Vec<String>>,
}

impl FaultyBackend {
    pub fn new() -> Self {
        FaultyBackend {
            inner: SqliteBackend::open_in_memory(PUBLIC_BASE).unwrap(),
            calls: AtomicUsize::new(0),
            uploads: AtomicUsize::new(0),
            failing_uploads: HashSet::new(),
            failing_tags: HashSet::new(),
            fail_listing: false,
            fail_status_updates: false,
            fail_image_records: false,
            fail_sign_out: false,
            fail_roles: false,
            racing_tags: Mutex::new(HashSet::new()),
            uploaded_paths: Mutex::new(Vec::new()),
        }
    }

    /// Fails the n-th upload attempt (zero based).
    pub fn failing_upload(mut self, attempt: usize) -> Self {
        self.failing_uploads.insert(attempt);
        self
    }

    pub fn failing_tag(mut self, name: &str) -> Self {
        self.failing_tags.insert(name.to_string());
        self
    }

    pub fn racing_tag(self, name: &str) -> Self {
        self.racing_tags.lock().unwrap().insert(name.to_string());
        self
    }

    pub fn failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    pub fn failing_status_updates(mut self) -> Self {
        self.fail_status_updates = true;
        self
    }

    pub fn failing_image_records(mut self) -> Self {
        self.fail_image_records = true;
        self
    }

    /// Sign-out reports an error after the local session is dropped.
    pub fn failing_sign_out(mut self) -> Self {
        self.fail_sign_out = true;
        self
    }

    pub fn failing_roles(mut self) -> Self {
        self.fail_roles = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn uploaded_paths(&self) -> Vec<String> {
        self.uploaded_paths.lock().unwrap().clone()
    }

    fn record(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Backend for FaultyBackend {
    async fn get_session(&self) -> Result<Option<Session>> {
        self.record();
        self.inner.get_session().await
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        self.record();
        self.inner.sign_in_with_password(email, password).await
    }

    async fn sign_out(&self) -> Result<()> {
        self.record();
        self.inner.sign_out().await?;
        if self.fail_sign_out {
            return Err(StoryError::Backend("logout request timed out".to_string()));
        }
        Ok(())
    }

    async fn fetch_role(&self, user_id: &str) -> Result<Option<String>> {
        self.record();
        if self.fail_roles {
            return Err(StoryError::Backend("profiles lookup failed".to_string()));
        }
        self.inner.fetch_role(user_id).await
    }

    async fn list_posts(&self, query: &PostQuery) -> Result<Vec<Story>> {
        self.record();
        if self.fail_listing {
            return Err(StoryError::Backend("connection reset".to_string()));
        }
        self.inner.list_posts(query).await
    }

    async fn insert_post(&self, post: &NewStory) -> Result<Story> {
        self.record();
        self.inner.insert_post(post).await
    }

    async fn update_post_status(&self, id: &str, update: &StatusUpdate) -> Result<()> {
        self.record();
        if self.fail_status_updates {
            return Err(StoryError::Backend("permission denied for table posts".to_string()));
        }
        self.inner.update_post_status(id, update).await
    }

    async fn find_tag(&self, name: &str) -> Result<Option<Tag>> {
        self.record();
        if self.failing_tags.contains(name) {
            return Err(StoryError::Backend(format!("tag lookup failed: {}", name)));
        }
        if self.racing_tags.lock().unwrap().contains(name) {
            // The concurrent writer has not committed yet.
            return Ok(None);
        }
        self.inner.find_tag(name).await
    }

    async fn insert_tag(&self, name: &str) -> Result<Tag> {
        self.record();
        let raced = self.racing_tags.lock().unwrap().remove(name);
        if raced {
            self.inner.insert_tag(name).await?;
            return Err(StoryError::Conflict(format!("tag {} already exists", name)));
        }
        self.inner.insert_tag(name).await
    }

    async fn insert_post_tag(&self, post_id: &str, tag_id: &str) -> Result<()> {
        self.record();
        self.inner.insert_post_tag(post_id, tag_id).await
    }

    async fn insert_post_images(&self, images: &[NewStoryImage]) -> Result<()> {
        self.record();
        if self.fail_image_records {
            return Err(StoryError::Backend("post_images insert failed".to_string()));
        }
        self.inner.insert_post_images(images).await
    }

    async fn upload_object(&self, path: &str, bytes: &[u8], options: &UploadOptions) -> Result<()> {
        self.record();
        let attempt = self.uploads.fetch_add(1, Ordering::SeqCst);
        if self.failing_uploads.contains(&attempt) {
            return Err(StoryError::Backend("The object exceeded the maximum allowed size".to_string()));
        }
        self.inner.upload_object(path, bytes, options).await?;
        self.uploaded_paths.lock().unwrap().push(path.to_string());
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        self.inner.public_url(path)
    }
}
