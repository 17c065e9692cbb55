use rusqlite::{Connection, Result};
use tracing::info;

/// Creates all tables and indexes for the local backend
///
/// Mirrors the hosted project: posts, tags, post_tags, post_images and
/// profiles, plus the users and objects tables that stand in for the auth
/// and storage services.
pub fn create_tables(conn: &Connection) -> Result<()> {
    info!("Creating database schema");

    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS posts (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            title_zh TEXT,
            slug TEXT NOT NULL,
            content TEXT NOT NULL DEFAULT '[]',
            excerpt TEXT,
            excerpt_zh TEXT,
            status TEXT NOT NULL DEFAULT 'pending'
                CHECK (status IN ('pending', 'approved', 'rejected')),
            project_district TEXT,
            cover_image_url TEXT,
            author_name TEXT,
            author_email TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT,
            published_at TEXT
        )",
        [],
    )?;

    // Tag names are unique under the default BINARY collation, so the
    // comparison is case-sensitive.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS tags (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS post_tags (
            post_id TEXT NOT NULL,
            tag_id TEXT NOT NULL,
            PRIMARY KEY (post_id, tag_id),
            FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE,
            FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS post_images (
            id TEXT PRIMARY KEY,
            post_id TEXT NOT NULL,
            image_url TEXT NOT NULL,
            storage_path TEXT NOT NULL,
            caption TEXT,
            display_order INTEGER NOT NULL DEFAULT 0,
            UNIQUE (post_id, display_order),
            FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS profiles (
            id TEXT PRIMARY KEY,
            role TEXT NOT NULL DEFAULT 'member',
            FOREIGN KEY (id) REFERENCES users(id) ON DELETE CASCADE
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS objects (
            path TEXT PRIMARY KEY,
            bytes BLOB NOT NULL,
            content_type TEXT NOT NULL,
            cache_control TEXT NOT NULL,
            checksum TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_posts_status_created ON posts(status, created_at DESC)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_post_images_post ON post_images(post_id, display_order)",
        [],
    )?;

    info!("Database schema created successfully");
    Ok(())
}
