use super::{is_constraint_violation, to_db_time};
use crate::models::User;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum AccountError {
    #[error("Account already exists: {0}")]
    Duplicate(String),
    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),
    #[error("Password hash error: {0}")]
    HashError(String),
}

impl From<argon2::password_hash::Error> for AccountError {
    fn from(err: argon2::password_hash::Error) -> Self {
        AccountError::HashError(err.to_string())
    }
}

/// Argon2id PHC string for `password` with a random salt
fn hash_password(password: &str) -> Result<String, AccountError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, stored: &str) -> Result<bool, AccountError> {
    let parsed = PasswordHash::new(stored)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Creates a user with a profile row carrying `role`
pub fn create(
    conn: &Connection,
    email: &str,
    password: &str,
    role: &str,
) -> Result<User, AccountError> {
    let id = Uuid::new_v4().to_string();
    let password_hash = hash_password(password)?;
    let tx = conn.unchecked_transaction()?;

    tx.execute(
        "INSERT INTO users (id, email, password_hash, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![&id, email, &password_hash, to_db_time(Utc::now())],
    )
    .map_err(|e| {
        if is_constraint_violation(&e) {
            AccountError::Duplicate(email.to_string())
        } else {
            AccountError::DatabaseError(e)
        }
    })?;
    tx.execute(
        "INSERT INTO profiles (id, role) VALUES (?1, ?2)",
        params![&id, role],
    )?;
    tx.commit()?;

    Ok(User {
        id,
        email: Some(email.to_string()),
    })
}

/// Checks an email/password pair
///
/// Returns None when the email is unknown or the password does not match.
pub fn verify(conn: &Connection, email: &str, password: &str) -> Result<Option<User>, AccountError> {
    let row: Option<(String, String)> = conn
        .query_row(
            "SELECT id, password_hash FROM users WHERE email = ?1",
            params![email],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    match row {
        Some((id, stored)) if verify_password(password, &stored)? => Ok(Some(User {
            id,
            email: Some(email.to_string()),
        })),
        _ => Ok(None),
    }
}

/// The profile role of a user
pub fn role_for(conn: &Connection, user_id: &str) -> Result<Option<String>, AccountError> {
    let role = conn
        .query_row(
            "SELECT role FROM profiles WHERE id = ?1",
            params![user_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(role)
}
