use super::{from_db_time, to_db_time};
use crate::backend::PostQuery;
use crate::database::{images, tags};
use crate::models::{ContentBlock, NewStory, StatusUpdate, Story, StoryStatus};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row, ToSql};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum PostError {
    #[error("Post not found")]
    NotFound,
    #[error("Invalid content: {0}")]
    InvalidContent(#[from] serde_json::Error),
    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),
}

const POST_COLUMNS: &str = "id, title, title_zh, slug, content, excerpt, excerpt_zh, status,
     project_district, cover_image_url, author_name, author_email,
     created_at, updated_at, published_at";

fn optional_time(row: &Row, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let value: Option<String> = row.get(idx)?;
    value.map(|v| from_db_time(idx, &v)).transpose()
}

fn row_to_story(row: &Row) -> rusqlite::Result<Story> {
    let content: String = row.get(4)?;
    let content = serde_json::from_str(&content)
        .map(ContentBlock::list_from_value)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;

    let status: String = row.get(7)?;
    let status = StoryStatus::parse(&status).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            7,
            Type::Text,
            format!("unknown status {}", status).into(),
        )
    })?;

    let created_at: String = row.get(12)?;

    Ok(Story {
        id: row.get(0)?,
        title: row.get(1)?,
        title_zh: row.get(2)?,
        slug: row.get(3)?,
        content,
        excerpt: row.get(5)?,
        excerpt_zh: row.get(6)?,
        status,
        project_district: row.get(8)?,
        cover_image_url: row.get(9)?,
        author_name: row.get(10)?,
        author_email: row.get(11)?,
        created_at: from_db_time(12, &created_at)?,
        updated_at: optional_time(row, 13)?,
        published_at: optional_time(row, 14)?,
        tags: Vec::new(),
        images: Vec::new(),
    })
}

/// Inserts a new post
///
/// Generates a UUID v4 for the post ID and stamps created_at and updated_at
/// with `now`.
pub fn insert(conn: &Connection, post: &NewStory, now: DateTime<Utc>) -> Result<Story, PostError> {
    let id = Uuid::new_v4().to_string();
    let content = serde_json::to_string(&post.content)?;
    let stamp = to_db_time(now);

    conn.execute(
        "INSERT INTO posts (id, title, slug, content, status, project_district, cover_image_url,
                            author_name, author_email, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            &id,
            &post.title,
            &post.slug,
            &content,
            post.status.as_str(),
            &post.project_district,
            &post.cover_image_url,
            &post.author_name,
            &post.author_email,
            &stamp,
            &stamp,
        ],
    )?;

    Ok(Story {
        id,
        title: post.title.clone(),
        title_zh: None,
        slug: post.slug.clone(),
        content: post.content.clone(),
        excerpt: None,
        excerpt_zh: None,
        status: post.status,
        project_district: Some(post.project_district.clone()),
        cover_image_url: post.cover_image_url.clone(),
        author_name: post.author_name.clone(),
        author_email: post.author_email.clone(),
        created_at: from_db_time(0, &stamp)?,
        updated_at: Some(from_db_time(0, &stamp)?),
        published_at: None,
        tags: Vec::new(),
        images: Vec::new(),
    })
}

/// Escapes LIKE wildcards so user input matches literally under `ESCAPE '\'`.
pub(crate) fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Lists posts matching the query
///
/// Returns posts ordered by created_at in descending order (newest first),
/// with tag names and, when asked for, image records attached.
pub fn list(conn: &Connection, query: &PostQuery) -> Result<Vec<Story>, PostError> {
    let mut clauses: Vec<String> = Vec::new();
    let mut values: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(id) = &query.id {
        values.push(Box::new(id.clone()));
        clauses.push(format!("id = ?{}", values.len()));
    }
    if !query.statuses.is_empty() {
        let mut placeholders = Vec::new();
        for status in &query.statuses {
            values.push(Box::new(status.as_str()));
            placeholders.push(format!("?{}", values.len()));
        }
        clauses.push(format!("status IN ({})", placeholders.join(", ")));
    }
    if let Some(district) = &query.district_contains {
        values.push(Box::new(escape_like(district)));
        clauses.push(format!(
            "LOWER(COALESCE(project_district, '')) LIKE '%' || LOWER(?{}) || '%' ESCAPE '\\'",
            values.len()
        ));
    }

    let mut sql = format!("SELECT {} FROM posts", POST_COLUMNS);
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY created_at DESC, rowid DESC");
    if let Some(limit) = query.limit {
        sql.push_str(&format!(" LIMIT {}", limit));
    }

    let mut stmt = conn.prepare(&sql)?;
    let mut stories = stmt
        .query_map(
            values
                .iter()
                .map(|v| v.as_ref())
                .collect::<Vec<_>>()
                .as_slice(),
            row_to_story,
        )?
        .collect::<Result<Vec<_>, _>>()?;

    for story in &mut stories {
        story.tags = tags::names_for_post(conn, &story.id)?;
        if query.include_images {
            story.images = images::list_for_post(conn, &story.id)?;
        }
    }

    Ok(stories)
}

/// Gets a post by ID, regardless of status
///
/// Returns None if the post doesn't exist.
pub fn get(conn: &Connection, id: &str) -> Result<Option<Story>, PostError> {
    let query = PostQuery::default().with_id(id).with_images();
    Ok(list(conn, &query)?.into_iter().next())
}

/// Applies a moderation decision
///
/// `published_at` is only overwritten when the update carries one. Returns
/// NotFound error if no row matched.
pub fn update_status(conn: &Connection, id: &str, update: &StatusUpdate) -> Result<(), PostError> {
    let published_at = update.published_at.map(to_db_time);

    let rows_affected = conn.execute(
        "UPDATE posts
         SET status = ?1, updated_at = ?2, published_at = COALESCE(?3, published_at)
         WHERE id = ?4",
        params![
            update.status.as_str(),
            to_db_time(update.updated_at),
            published_at,
            id
        ],
    )?;

    if rows_affected == 0 {
        return Err(PostError::NotFound);
    }

    Ok(())
}

/// Sets the optional editorial columns the submission form never fills.
pub fn set_translations(
    conn: &Connection,
    id: &str,
    title_zh: Option<&str>,
    excerpt: Option<&str>,
    excerpt_zh: Option<&str>,
) -> Result<(), PostError> {
    let rows_affected = conn.execute(
        "UPDATE posts SET title_zh = ?1, excerpt = ?2, excerpt_zh = ?3 WHERE id = ?4",
        params![title_zh, excerpt, excerpt_zh, id],
    )?;

    if rows_affected == 0 {
        return Err(PostError::NotFound);
    }

    Ok(())
}
