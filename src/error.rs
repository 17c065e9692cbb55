use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoryError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("{0}")]
    Validation(String),

    #[error("Access denied: {0}")]
    Authorization(String),

    #[error("{0}")]
    Backend(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, StoryError>;

impl StoryError {
    /// Text safe to put in front of a visitor.
    ///
    /// Validation and backend errors carry their own message; everything else
    /// collapses to a generic retry hint.
    pub fn user_message(&self) -> String {
        match self {
            StoryError::Validation(msg) | StoryError::Backend(msg) => msg.clone(),
            StoryError::Authorization(_) => "Access denied. Admin privileges required.".to_string(),
            StoryError::Configuration(_) => {
                "Backend client not initialized. Please check your configuration.".to_string()
            }
            StoryError::NotFound(_) => "Story not found or not available.".to_string(),
            _ => "An error occurred. Please try again.".to_string(),
        }
    }
}

impl From<serde_json::Error> for StoryError {
    fn from(err: serde_json::Error) -> Self {
        StoryError::Internal(format!("JSON error: {}", err))
    }
}

impl From<reqwest::Error> for StoryError {
    fn from(err: reqwest::Error) -> Self {
        StoryError::Backend(format!("Request failed: {}", err))
    }
}
