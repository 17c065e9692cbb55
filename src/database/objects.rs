use super::{is_constraint_violation, to_db_time};
use crate::backend::UploadOptions;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ObjectError {
    #[error("The resource already exists: {0}")]
    Exists(String),
    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),
}

/// A stored upload
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub path: String,
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub cache_control: String,
    pub checksum: String,
}

pub fn checksum(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Stores an object under `path`
///
/// Without `upsert` an existing path is an Exists error; with it the object
/// is replaced.
pub fn put(
    conn: &Connection,
    path: &str,
    bytes: &[u8],
    options: &UploadOptions,
) -> Result<StoredObject, ObjectError> {
    let sum = checksum(bytes);
    let sql = if options.upsert {
        "INSERT OR REPLACE INTO objects (path, bytes, content_type, cache_control, checksum, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
    } else {
        "INSERT INTO objects (path, bytes, content_type, cache_control, checksum, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
    };

    conn.execute(
        sql,
        params![
            path,
            bytes,
            &options.content_type,
            &options.cache_control,
            &sum,
            to_db_time(Utc::now()),
        ],
    )
    .map_err(|e| {
        if is_constraint_violation(&e) {
            ObjectError::Exists(path.to_string())
        } else {
            ObjectError::DatabaseError(e)
        }
    })?;

    Ok(StoredObject {
        path: path.to_string(),
        bytes: bytes.to_vec(),
        content_type: options.content_type.clone(),
        cache_control: options.cache_control.clone(),
        checksum: sum,
    })
}

/// Gets an object by path
///
/// Returns None if nothing is stored there.
pub fn get(conn: &Connection, path: &str) -> Result<Option<StoredObject>, ObjectError> {
    let object = conn
        .query_row(
            "SELECT path, bytes, content_type, cache_control, checksum FROM objects WHERE path = ?1",
            params![path],
            |row| {
                Ok(StoredObject {
                    path: row.get(0)?,
                    bytes: row.get(1)?,
                    content_type: row.get(2)?,
                    cache_control: row.get(3)?,
                    checksum: row.get(4)?,
                })
            },
        )
        .optional()?;
    Ok(object)
}
