use super::{is_constraint_violation, to_db_time};
use crate::models::Tag;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum TagError {
    #[error("Tag already exists: {0}")]
    Duplicate(String),
    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),
}

/// Gets a tag by exact (case-sensitive) name
pub fn find_by_name(conn: &Connection, name: &str) -> Result<Option<Tag>, TagError> {
    let tag = conn
        .query_row(
            "SELECT id, name FROM tags WHERE name = ?1",
            params![name],
            |row| {
                Ok(Tag {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            },
        )
        .optional()?;
    Ok(tag)
}

/// Inserts a new tag
///
/// Returns Duplicate error when the name is already taken.
pub fn insert(conn: &Connection, name: &str) -> Result<Tag, TagError> {
    let id = Uuid::new_v4().to_string();

    conn.execute(
        "INSERT INTO tags (id, name, created_at) VALUES (?1, ?2, ?3)",
        params![&id, name, to_db_time(Utc::now())],
    )
    .map_err(|e| {
        if is_constraint_violation(&e) {
            TagError::Duplicate(name.to_string())
        } else {
            TagError::DatabaseError(e)
        }
    })?;

    Ok(Tag {
        id,
        name: name.to_string(),
    })
}

/// Links a tag to a post
pub fn attach(conn: &Connection, post_id: &str, tag_id: &str) -> Result<(), TagError> {
    conn.execute(
        "INSERT INTO post_tags (post_id, tag_id) VALUES (?1, ?2)",
        params![post_id, tag_id],
    )?;
    Ok(())
}

/// Tag names for a post, in the order they were attached
pub fn names_for_post(conn: &Connection, post_id: &str) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT t.name
         FROM post_tags pt
         JOIN tags t ON t.id = pt.tag_id
         WHERE pt.post_id = ?1
         ORDER BY pt.rowid",
    )?;

    let names = stmt
        .query_map(params![post_id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(names)
}
