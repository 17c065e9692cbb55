pub mod auth;
pub mod backend;
pub mod commands;
pub mod config;
pub mod database;
mod error;
pub mod logger;
pub mod models;
pub mod moderation;
pub mod parsers;
pub mod render;
pub mod slug;
pub mod submission;

#[cfg(test)]
mod testing;

pub use error::{Result, StoryError};
