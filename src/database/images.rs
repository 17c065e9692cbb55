use crate::models::{NewStoryImage, StoryImage};
use rusqlite::{params, Connection};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),
}

/// Inserts image records in one transaction
///
/// Either every record lands or none does.
pub fn insert_batch(conn: &Connection, images: &[NewStoryImage]) -> Result<(), ImageError> {
    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO post_images (id, post_id, image_url, storage_path, display_order)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for image in images {
            stmt.execute(params![
                Uuid::new_v4().to_string(),
                &image.post_id,
                &image.image_url,
                &image.storage_path,
                image.display_order,
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

/// Lists image records for a post
///
/// Returns images ordered by display_order in ascending order.
pub fn list_for_post(conn: &Connection, post_id: &str) -> rusqlite::Result<Vec<StoryImage>> {
    let mut stmt = conn.prepare(
        "SELECT image_url, caption, display_order
         FROM post_images
         WHERE post_id = ?1
         ORDER BY display_order",
    )?;

    let images = stmt
        .query_map(params![post_id], |row| {
            Ok(StoryImage {
                image_url: row.get(0)?,
                caption: row.get(1)?,
                display_order: row.get(2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(images)
}

/// Sets the caption of one image record
pub fn set_caption(
    conn: &Connection,
    post_id: &str,
    display_order: i32,
    caption: Option<&str>,
) -> Result<(), ImageError> {
    conn.execute(
        "UPDATE post_images SET caption = ?1 WHERE post_id = ?2 AND display_order = ?3",
        params![caption, post_id, display_order],
    )?;
    Ok(())
}
