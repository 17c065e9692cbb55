use crate::backend::provider::{Backend, PostQuery, UploadOptions};
use crate::error::Result;
use crate::models::{
    ContentBlock, NewStory, NewStoryImage, Session, StatusUpdate, Story, StoryImage, StoryStatus,
    Tag, User,
};
use crate::StoryError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

const POST_SELECT: &str = "*,post_tags(tags(name))";
const POST_SELECT_WITH_IMAGES: &str =
    "*,post_tags(tags(name)),post_images(image_url,caption,display_order)";
const UNIQUE_VIOLATION: &str = "23505";

fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!("invalid id: {}", other))),
    }
}

#[derive(Debug, Deserialize)]
struct TagName {
    name: String,
}

#[derive(Debug, Deserialize)]
struct PostTagRow {
    tags: Option<TagName>,
}

#[derive(Debug, Deserialize)]
struct PostRow {
    #[serde(deserialize_with = "deserialize_id")]
    id: String,
    title: String,
    #[serde(default)]
    title_zh: Option<String>,
    #[serde(default)]
    slug: Option<String>,
    #[serde(default)]
    content: Value,
    #[serde(default)]
    excerpt: Option<String>,
    #[serde(default)]
    excerpt_zh: Option<String>,
    status: StoryStatus,
    #[serde(default)]
    project_district: Option<String>,
    #[serde(default)]
    cover_image_url: Option<String>,
    #[serde(default)]
    author_name: Option<String>,
    #[serde(default)]
    author_email: Option<String>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    post_tags: Vec<PostTagRow>,
    #[serde(default)]
    post_images: Vec<StoryImage>,
}

impl From<PostRow> for Story {
    fn from(row: PostRow) -> Self {
        Story {
            id: row.id,
            title: row.title,
            title_zh: row.title_zh,
            slug: row.slug.unwrap_or_default(),
            content: ContentBlock::list_from_value(row.content),
            excerpt: row.excerpt,
            excerpt_zh: row.excerpt_zh,
            status: row.status,
            project_district: row.project_district,
            cover_image_url: row.cover_image_url,
            author_name: row.author_name,
            author_email: row.author_email,
            created_at: row.created_at,
            updated_at: row.updated_at,
            published_at: row.published_at,
            tags: row
                .post_tags
                .into_iter()
                .filter_map(|pt| pt.tags.map(|t| t.name))
                .collect(),
            images: row.post_images,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TagRow {
    #[serde(deserialize_with = "deserialize_id")]
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct RoleRow {
    role: Option<String>,
}

#[derive(Debug, Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: AuthUser,
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    #[serde(deserialize_with = "deserialize_id")]
    id: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Serialize)]
struct NewTagRow<'a> {
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct NewPostTagRow<'a> {
    post_id: &'a str,
    tag_id: &'a str,
}

/// HTTP client for a Supabase project: PostgREST rows, GoTrue auth and
/// Storage objects.
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
    bucket: String,
    session: RwLock<Option<Session>>,
}

impl SupabaseClient {
    pub fn new(base_url: &str, anon_key: &str, bucket: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoryError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(SupabaseClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            bucket: bucket.to_string(),
            session: RwLock::new(None),
        })
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn object_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, path)
    }

    /// Request with the project key and the current bearer token: the session
    /// token when signed in, otherwise the anon key.
    async fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let token = self
            .session
            .read()
            .await
            .as_ref()
            .map(|s| s.access_token.clone())
            .unwrap_or_else(|| self.anon_key.clone());

        self.client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", token))
    }

    async fn send(&self, builder: RequestBuilder, what: &str) -> Result<Response> {
        let response = builder.send().await.map_err(|e| {
            error!("{} request failed: {}", what, e);
            StoryError::Backend(format!("Failed to send request: {}", e))
        })?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        let err = error_from_body(status, &body);
        error!("{} failed ({}): {}", what, status, err);
        Err(err)
    }
}

/// Maps an error response to `StoryError`, keeping the service's own message.
fn error_from_body(status: StatusCode, body: &str) -> StoryError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let field = |key: &str| {
        parsed
            .as_ref()
            .and_then(|v| v.get(key))
            .and_then(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
    };

    let message = ["message", "msg", "error_description", "error"]
        .iter()
        .find_map(|key| field(key))
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("Request failed with status {}", status)
            } else {
                body.trim().to_string()
            }
        });

    let code = field("code");
    let storage_status = field("statusCode");
    if status == StatusCode::CONFLICT
        || code.as_deref() == Some(UNIQUE_VIOLATION)
        || storage_status.as_deref() == Some("409")
    {
        return StoryError::Conflict(message);
    }

    StoryError::Backend(message)
}

fn status_filter(statuses: &[StoryStatus]) -> Option<String> {
    match statuses {
        [] => None,
        [single] => Some(format!("eq.{}", single)),
        many => Some(format!(
            "in.({})",
            many.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(",")
        )),
    }
}

/// Escapes `ilike` wildcards in a contains filter. PostgREST reads `*` as `%`
/// and has no escape for it, so `*` is dropped.
fn ilike_literal(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '*' => {}
            '\\' | '%' | '_' => {
                escaped.push('\\');
                escaped.push(c);
            }
            _ => escaped.push(c),
        }
    }
    escaped
}

/// PostgREST query pairs for a story read.
fn post_query_params(query: &PostQuery) -> Vec<(String, String)> {
    let select = if query.include_images {
        POST_SELECT_WITH_IMAGES
    } else {
        POST_SELECT
    };
    let mut params = vec![("select".to_string(), select.to_string())];

    if let Some(id) = &query.id {
        params.push(("id".to_string(), format!("eq.{}", id)));
    }
    if let Some(filter) = status_filter(&query.statuses) {
        params.push(("status".to_string(), filter));
    }
    if let Some(district) = &query.district_contains {
        params.push((
            "project_district".to_string(),
            format!("ilike.*{}*", ilike_literal(district)),
        ));
    }
    params.push(("order".to_string(), "created_at.desc".to_string()));
    if let Some(limit) = query.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }
    params
}

#[async_trait]
impl Backend for SupabaseClient {
    async fn get_session(&self) -> Result<Option<Session>> {
        Ok(self.session.read().await.clone())
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        let url = format!("{}/auth/v1/token", self.base_url);
        let builder = self
            .client
            .post(&url)
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&PasswordGrant { email, password });

        let response = self.send(builder, "Sign in").await?;
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| StoryError::Backend(format!("Failed to parse response: {}", e)))?;

        let session = Session {
            access_token: token.access_token,
            user: User {
                id: token.user.id,
                email: token.user.email,
            },
        };
        info!("Signed in as user {}", session.user.id);
        *self.session.write().await = Some(session.clone());
        Ok(session)
    }

    async fn sign_out(&self) -> Result<()> {
        if self.session.read().await.is_none() {
            return Ok(());
        }

        let url = format!("{}/auth/v1/logout", self.base_url);
        let builder = self.request(Method::POST, &url).await;
        let result = self.send(builder, "Sign out").await;

        // The local session is dropped even when the revoke call fails.
        *self.session.write().await = None;
        result.map(|_| ())
    }

    async fn fetch_role(&self, user_id: &str) -> Result<Option<String>> {
        let url = self.rest_url("profiles");
        let builder = self.request(Method::GET, &url).await.query(&[
            ("select", "role".to_string()),
            ("id", format!("eq.{}", user_id)),
            ("limit", "1".to_string()),
        ]);

        let rows: Vec<RoleRow> = self
            .send(builder, "Profile lookup")
            .await?
            .json()
            .await
            .map_err(|e| StoryError::Backend(format!("Failed to parse response: {}", e)))?;

        Ok(rows.into_iter().next().and_then(|row| row.role))
    }

    async fn list_posts(&self, query: &PostQuery) -> Result<Vec<Story>> {
        let url = self.rest_url("posts");
        let builder = self
            .request(Method::GET, &url)
            .await
            .query(&post_query_params(query));

        let rows: Vec<PostRow> = self
            .send(builder, "Post listing")
            .await?
            .json()
            .await
            .map_err(|e| StoryError::Backend(format!("Failed to parse response: {}", e)))?;

        debug!("Fetched {} posts", rows.len());
        Ok(rows.into_iter().map(Story::from).collect())
    }

    async fn insert_post(&self, post: &NewStory) -> Result<Story> {
        let url = self.rest_url("posts");
        let builder = self
            .request(Method::POST, &url)
            .await
            .header("Prefer", "return=representation")
            .json(post);

        let rows: Vec<PostRow> = self
            .send(builder, "Post insert")
            .await?
            .json()
            .await
            .map_err(|e| StoryError::Backend(format!("Failed to parse response: {}", e)))?;

        rows.into_iter()
            .next()
            .map(Story::from)
            .ok_or_else(|| StoryError::Backend("Insert returned no rows".to_string()))
    }

    async fn update_post_status(&self, id: &str, update: &StatusUpdate) -> Result<()> {
        let url = self.rest_url("posts");
        let builder = self
            .request(Method::PATCH, &url)
            .await
            .query(&[("id", format!("eq.{}", id)), ("select", "id".to_string())])
            .header("Prefer", "return=representation")
            .json(update);

        let rows: Vec<Value> = self
            .send(builder, "Post status update")
            .await?
            .json()
            .await
            .map_err(|e| StoryError::Backend(format!("Failed to parse response: {}", e)))?;

        if rows.is_empty() {
            return Err(StoryError::NotFound(format!("Post {} not found", id)));
        }
        Ok(())
    }

    async fn find_tag(&self, name: &str) -> Result<Option<Tag>> {
        let url = self.rest_url("tags");
        let builder = self.request(Method::GET, &url).await.query(&[
            ("select", "id,name".to_string()),
            ("name", format!("eq.{}", name)),
            ("limit", "1".to_string()),
        ]);

        let rows: Vec<TagRow> = self
            .send(builder, "Tag lookup")
            .await?
            .json()
            .await
            .map_err(|e| StoryError::Backend(format!("Failed to parse response: {}", e)))?;

        Ok(rows.into_iter().next().map(|row| Tag {
            id: row.id,
            name: row.name,
        }))
    }

    async fn insert_tag(&self, name: &str) -> Result<Tag> {
        let url = self.rest_url("tags");
        let builder = self
            .request(Method::POST, &url)
            .await
            .header("Prefer", "return=representation")
            .json(&NewTagRow { name });

        let rows: Vec<TagRow> = self
            .send(builder, "Tag insert")
            .await?
            .json()
            .await
            .map_err(|e| StoryError::Backend(format!("Failed to parse response: {}", e)))?;

        rows.into_iter()
            .next()
            .map(|row| Tag {
                id: row.id,
                name: row.name,
            })
            .ok_or_else(|| StoryError::Backend("Insert returned no rows".to_string()))
    }

    async fn insert_post_tag(&self, post_id: &str, tag_id: &str) -> Result<()> {
        let url = self.rest_url("post_tags");
        let builder = self
            .request(Method::POST, &url)
            .await
            .header("Prefer", "return=minimal")
            .json(&NewPostTagRow { post_id, tag_id });

        self.send(builder, "Post tag insert").await?;
        Ok(())
    }

    async fn insert_post_images(&self, images: &[NewStoryImage]) -> Result<()> {
        if images.is_empty() {
            return Ok(());
        }

        let url = self.rest_url("post_images");
        let builder = self
            .request(Method::POST, &url)
            .await
            .header("Prefer", "return=minimal")
            .json(images);

        self.send(builder, "Post images insert").await?;
        Ok(())
    }

    async fn upload_object(&self, path: &str, bytes: &[u8], options: &UploadOptions) -> Result<()> {
        let url = self.object_url(path);
        let builder = self
            .request(Method::POST, &url)
            .await
            .header("cache-control", format!("max-age={}", options.cache_control))
            .header("x-upsert", if options.upsert { "true" } else { "false" })
            .header("content-type", &options.content_type)
            .body(bytes.to_vec());

        self.send(builder, "Object upload").await?;
        info!("Uploaded {} ({} bytes)", path, bytes.len());
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, path
        )
    }
}
