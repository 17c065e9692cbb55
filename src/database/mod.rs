pub mod accounts;
pub mod images;
pub mod objects;
pub mod posts;
mod schema;
pub mod tags;

use crate::backend::{Backend, PostQuery, UploadOptions};
use crate::error::Result;
use crate::models::{NewStory, NewStoryImage, Session, StatusUpdate, Story, Tag, User};
use crate::StoryError;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::Connection;
use std::sync::{Mutex, MutexGuard};
use tracing::{error, info, warn};
use uuid::Uuid;

pub use accounts::AccountError;
pub use images::ImageError;
pub use objects::{ObjectError, StoredObject};
pub use posts::PostError;
pub use schema::create_tables;
pub use tags::TagError;

impl From<PostError> for StoryError {
    fn from(err: PostError) -> Self {
        match err {
            PostError::NotFound => StoryError::NotFound("Post not found".to_string()),
            PostError::DatabaseError(e) => StoryError::Database(e),
            other => StoryError::Internal(other.to_string()),
        }
    }
}

impl From<TagError> for StoryError {
    fn from(err: TagError) -> Self {
        match err {
            TagError::Duplicate(name) => StoryError::Conflict(format!("Tag {} already exists", name)),
            TagError::DatabaseError(e) => StoryError::Database(e),
        }
    }
}

impl From<ImageError> for StoryError {
    fn from(err: ImageError) -> Self {
        match err {
            ImageError::DatabaseError(e) => StoryError::Database(e),
        }
    }
}

impl From<ObjectError> for StoryError {
    fn from(err: ObjectError) -> Self {
        match err {
            ObjectError::Exists(path) => {
                StoryError::Conflict(format!("The resource already exists: {}", path))
            }
            ObjectError::DatabaseError(e) => StoryError::Database(e),
        }
    }
}

impl From<AccountError> for StoryError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Duplicate(email) => {
                StoryError::Conflict(format!("Account {} already exists", email))
            }
            AccountError::DatabaseError(e) => StoryError::Database(e),
            AccountError::HashError(msg) => StoryError::Internal(msg),
        }
    }
}

/// Timestamps are stored as RFC 3339 text with microsecond precision, which
/// keeps lexical and chronological order the same.
pub(crate) fn to_db_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn from_db_time(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

/// The backend contract served from a local SQLite database.
///
/// Rows, password accounts and uploaded objects all live in one file (or in
/// memory); the signed-in session is held by the instance.
pub struct SqliteBackend {
    conn: Mutex<Connection>,
    public_base_url: String,
    session: Mutex<Option<Session>>,
}

impl SqliteBackend {
    /// Opens (creating if needed) the database file at `path`
    ///
    /// Enables WAL mode and a 5 second busy timeout.
    pub fn open(path: &str, public_base_url: &str) -> Result<Self> {
        info!("Opening database connection: {}", path);
        let conn = Connection::open(path)?;

        let _journal_mode = conn.query_row("PRAGMA journal_mode = WAL", [], |row| {
            row.get::<_, String>(0)
        })?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;

        Self::from_connection(conn, public_base_url)
    }

    pub fn open_in_memory(public_base_url: &str) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn, public_base_url)
    }

    fn from_connection(conn: Connection, public_base_url: &str) -> Result<Self> {
        create_tables(&conn).map_err(|e| {
            error!("Failed to create database tables: {}", e);
            e
        })?;

        info!("Database initialized successfully");
        Ok(SqliteBackend {
            conn: Mutex::new(conn),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            session: Mutex::new(None),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoryError::Internal("Database lock poisoned".to_string()))
    }

    fn session_slot(&self) -> Result<MutexGuard<'_, Option<Session>>> {
        self.session
            .lock()
            .map_err(|_| StoryError::Internal("Session lock poisoned".to_string()))
    }

    /// Creates a password account with the given profile role.
    pub fn create_account(&self, email: &str, password: &str, role: &str) -> Result<User> {
        let conn = self.conn()?;
        Ok(accounts::create(&conn, email, password, role)?)
    }

    /// Sets the localized title and the excerpts, which only editors write.
    pub fn set_translations(
        &self,
        id: &str,
        title_zh: Option<&str>,
        excerpt: Option<&str>,
        excerpt_zh: Option<&str>,
    ) -> Result<()> {
        let conn = self.conn()?;
        Ok(posts::set_translations(&conn, id, title_zh, excerpt, excerpt_zh)?)
    }

    pub fn set_image_caption(&self, post_id: &str, display_order: i32, caption: Option<&str>) -> Result<()> {
        let conn = self.conn()?;
        Ok(images::set_caption(&conn, post_id, display_order, caption)?)
    }

    /// A post by id regardless of status, with tags and images.
    pub fn get_post(&self, id: &str) -> Result<Option<Story>> {
        let conn = self.conn()?;
        Ok(posts::get(&conn, id)?)
    }

    pub fn read_object(&self, path: &str) -> Result<Option<StoredObject>> {
        let conn = self.conn()?;
        Ok(objects::get(&conn, path)?)
    }
}

#[async_trait]
impl Backend for SqliteBackend {
    async fn get_session(&self) -> Result<Option<Session>> {
        Ok(self.session_slot()?.clone())
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        let user = {
            let conn = self.conn()?;
            accounts::verify(&conn, email, password)?
        };

        let user = user.ok_or_else(|| {
            warn!("Rejected sign in for {}", email);
            StoryError::Backend("Invalid login credentials".to_string())
        })?;

        let session = Session {
            access_token: Uuid::new_v4().to_string(),
            user,
        };
        *self.session_slot()? = Some(session.clone());
        info!("Signed in as user {}", session.user.id);
        Ok(session)
    }

    async fn sign_out(&self) -> Result<()> {
        *self.session_slot()? = None;
        Ok(())
    }

    async fn fetch_role(&self, user_id: &str) -> Result<Option<String>> {
        let conn = self.conn()?;
        Ok(accounts::role_for(&conn, user_id)?)
    }

    async fn list_posts(&self, query: &PostQuery) -> Result<Vec<Story>> {
        let conn = self.conn()?;
        Ok(posts::list(&conn, query)?)
    }

    async fn insert_post(&self, post: &NewStory) -> Result<Story> {
        let conn = self.conn()?;
        Ok(posts::insert(&conn, post, Utc::now())?)
    }

    async fn update_post_status(&self, id: &str, update: &StatusUpdate) -> Result<()> {
        let conn = self.conn()?;
        Ok(posts::update_status(&conn, id, update)?)
    }

    async fn find_tag(&self, name: &str) -> Result<Option<Tag>> {
        let conn = self.conn()?;
        Ok(tags::find_by_name(&conn, name)?)
    }

    async fn insert_tag(&self, name: &str) -> Result<Tag> {
        let conn = self.conn()?;
        Ok(tags::insert(&conn, name)?)
    }

    async fn insert_post_tag(&self, post_id: &str, tag_id: &str) -> Result<()> {
        let conn = self.conn()?;
        Ok(tags::attach(&conn, post_id, tag_id)?)
    }

    async fn insert_post_images(&self, images: &[NewStoryImage]) -> Result<()> {
        let conn = self.conn()?;
        Ok(images::insert_batch(&conn, images)?)
    }

    async fn upload_object(&self, path: &str, bytes: &[u8], options: &UploadOptions) -> Result<()> {
        let conn = self.conn()?;
        objects::put(&conn, path, bytes, options)?;
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.public_base_url, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContentBlock, StoryStatus};
    use chrono::Duration;

    fn backend() -> SqliteBackend {
        SqliteBackend::open_in_memory("http://localhost/storage").unwrap()
    }

    fn new_story(title: &str, district: &str) -> NewStory {
        NewStory {
            title: title.to_string(),
            slug: crate::slug::generate_slug(title),
            content: vec![ContentBlock::paragraph("Body")],
            status: StoryStatus::Pending,
            project_district: district.to_string(),
            cover_image_url: None,
            author_name: None,
            author_email: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_list_newest_first() {
        let db = backend();
        let first = db.insert_post(&new_story("First", "Shilin")).await.unwrap();
        let second = db.insert_post(&new_story("Second", "Beitou")).await.unwrap();

        let all = db.list_posts(&PostQuery::reviewable()).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, second.id);
        assert_eq!(all[1].id, first.id);
        assert_eq!(all[1].content, vec![ContentBlock::paragraph("Body")]);
    }

    #[tokio::test]
    async fn test_status_and_district_filters() {
        let db = backend();
        let shilin = db.insert_post(&new_story("A", "Shilin District")).await.unwrap();
        db.insert_post(&new_story("B", "Beitou")).await.unwrap();

        let update = StatusUpdate {
            status: StoryStatus::Approved,
            updated_at: Utc::now(),
            published_at: Some(Utc::now()),
        };
        db.update_post_status(&shilin.id, &update).await.unwrap();

        let approved = db.list_posts(&PostQuery::approved()).await.unwrap();
        assert_eq!(approved.len(), 1);

        let featured = db
            .list_posts(&PostQuery::approved().with_district("shilin"))
            .await
            .unwrap();
        assert_eq!(featured.len(), 1);
        assert_eq!(featured[0].id, shilin.id);
    }

    #[tokio::test]
    async fn test_district_wildcards_match_literally() {
        let db = backend();
        db.insert_post(&new_story("A", "500 off")).await.unwrap();
        let literal = db.insert_post(&new_story("B", "Zone 50%_off")).await.unwrap();

        let found = db
            .list_posts(&PostQuery::reviewable().with_district("50%_off"))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, literal.id);

        let underscore = db
            .list_posts(&PostQuery::reviewable().with_district("_"))
            .await
            .unwrap();
        assert_eq!(underscore.len(), 1);
    }

    #[tokio::test]
    async fn test_update_keeps_publication_when_absent() {
        let db = backend();
        let post = db.insert_post(&new_story("A", "Shilin")).await.unwrap();
        let published = Utc::now() - Duration::days(1);

        db.update_post_status(
            &post.id,
            &StatusUpdate {
                status: StoryStatus::Approved,
                updated_at: published,
                published_at: Some(published),
            },
        )
        .await
        .unwrap();
        db.update_post_status(
            &post.id,
            &StatusUpdate {
                status: StoryStatus::Rejected,
                updated_at: Utc::now(),
                published_at: None,
            },
        )
        .await
        .unwrap();

        let stored = db.get_post(&post.id).unwrap().unwrap();
        assert_eq!(stored.status, StoryStatus::Rejected);
        assert_eq!(stored.published_at.map(to_db_time), Some(to_db_time(published)));
    }

    #[tokio::test]
    async fn test_update_unknown_post() {
        let db = backend();
        let update = StatusUpdate {
            status: StoryStatus::Approved,
            updated_at: Utc::now(),
            published_at: None,
        };
        let err = db.update_post_status("missing", &update).await.unwrap_err();
        assert!(matches!(err, StoryError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_tag_names_are_case_sensitive() {
        let db = backend();
        db.insert_tag("Food").await.unwrap();
        db.insert_tag("food").await.unwrap();

        let err = db.insert_tag("food").await.unwrap_err();
        assert!(matches!(err, StoryError::Conflict(_)));
        assert!(db.find_tag("FOOD").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_objects_do_not_overwrite() {
        let db = backend();
        let options = UploadOptions::for_file("a.png", "3600");
        db.upload_object("a.png", b"one", &options).await.unwrap();

        let err = db.upload_object("a.png", b"two", &options).await.unwrap_err();
        assert!(matches!(err, StoryError::Conflict(_)));

        let stored = db.read_object("a.png").unwrap().unwrap();
        assert_eq!(stored.bytes, b"one".to_vec());
        assert_eq!(stored.content_type, "image/png");
        assert_eq!(stored.checksum, objects::checksum(b"one"));
        assert_eq!(db.public_url("a.png"), "http://localhost/storage/a.png");
    }

    #[tokio::test]
    async fn test_password_sign_in() {
        let db = backend();
        let user = db.create_account("admin@example.com", "hunter2", "admin").unwrap();

        assert!(db.sign_in_with_password("admin@example.com", "wrong").await.is_err());
        let session = db
            .sign_in_with_password("admin@example.com", "hunter2")
            .await
            .unwrap();
        assert_eq!(session.user.id, user.id);
        assert_eq!(db.fetch_role(&user.id).await.unwrap().as_deref(), Some("admin"));

        db.sign_out().await.unwrap();
        assert!(db.get_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_images_listed_in_display_order() {
        let db = backend();
        let post = db.insert_post(&new_story("A", "Shilin")).await.unwrap();
        let urls = vec!["http://x/0.jpg".to_string(), "http://x/1.jpg".to_string()];
        let mut records = NewStoryImage::from_urls(&post.id, &urls);
        records.reverse();
        db.insert_post_images(&records).await.unwrap();
        db.set_image_caption(&post.id, 1, Some("Second")).unwrap();

        let stored = db.get_post(&post.id).unwrap().unwrap();
        assert_eq!(stored.images.len(), 2);
        assert_eq!(stored.images[0].image_url, "http://x/0.jpg");
        assert_eq!(stored.images[1].caption.as_deref(), Some("Second"));
    }
}
