use crate::{error::Result, StoryError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const PLACEHOLDER_URL: &str = "YOUR_SUPABASE_URL";
pub const PLACEHOLDER_ANON_KEY: &str = "YOUR_SUPABASE_ANON_KEY";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum BackendProvider {
    Supabase,
    Sqlite,
}

impl Default for BackendProvider {
    fn default() -> Self {
        BackendProvider::Supabase
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub provider: BackendProvider,
    #[serde(default)]
    pub supabase_url: String,
    #[serde(default)]
    pub supabase_anon_key: String,
    #[serde(default = "default_storage_bucket")]
    pub storage_bucket: String,
    #[serde(default = "default_upload_cache_control")]
    pub upload_cache_control: String,
    /// SQLite database file for the local backend; in-memory when unset.
    #[serde(default)]
    pub sqlite_path: Option<String>,
    #[serde(default = "default_local_public_base_url")]
    pub local_public_base_url: String,
    #[serde(default = "default_site_url")]
    pub site_url: String,
    #[serde(default = "default_site_name")]
    pub site_name: String,
    #[serde(default = "default_site_alternate_name")]
    pub site_alternate_name: String,
    #[serde(default = "default_district")]
    pub default_district: String,
    #[serde(default = "default_district")]
    pub featured_district: String,
    #[serde(default = "default_featured_limit")]
    pub featured_limit: usize,
    #[serde(default = "default_card_tag_limit")]
    pub card_tag_limit: usize,
    #[serde(default = "default_excerpt_length")]
    pub excerpt_length: usize,
    #[serde(default = "default_description_length")]
    pub description_length: usize,
    #[serde(default = "default_banner_dismiss_secs")]
    pub banner_dismiss_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_storage_bucket() -> String {
    "post-images".to_string()
}

fn default_upload_cache_control() -> String {
    "3600".to_string()
}

fn default_local_public_base_url() -> String {
    "http://localhost:8000/storage/post-images".to_string()
}

fn default_site_url() -> String {
    "https://storymakers.tw".to_string()
}

fn default_site_name() -> String {
    "StoryMakers Taiwan".to_string()
}

fn default_site_alternate_name() -> String {
    "故事造城".to_string()
}

fn default_district() -> String {
    "Shilin".to_string()
}

fn default_featured_limit() -> usize {
    3
}

fn default_card_tag_limit() -> usize {
    3
}

fn default_excerpt_length() -> usize {
    150
}

fn default_description_length() -> usize {
    200
}

fn default_banner_dismiss_secs() -> u64 {
    5
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Config {
            provider: BackendProvider::Supabase,
            supabase_url: PLACEHOLDER_URL.to_string(),
            supabase_anon_key: PLACEHOLDER_ANON_KEY.to_string(),
            storage_bucket: default_storage_bucket(),
            upload_cache_control: default_upload_cache_control(),
            sqlite_path: None,
            local_public_base_url: default_local_public_base_url(),
            site_url: default_site_url(),
            site_name: default_site_name(),
            site_alternate_name: default_site_alternate_name(),
            default_district: default_district(),
            featured_district: default_district(),
            featured_limit: default_featured_limit(),
            card_tag_limit: default_card_tag_limit(),
            excerpt_length: default_excerpt_length(),
            description_length: default_description_length(),
            banner_dismiss_secs: default_banner_dismiss_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Config {
    /// Checks that the remote endpoint and public key are present and are not
    /// the placeholders shipped in the default config.
    pub fn validate_remote(&self) -> Result<()> {
        let url = self.supabase_url.trim();
        let key = self.supabase_anon_key.trim();

        if url.is_empty() || key.is_empty() {
            return Err(StoryError::Configuration(
                "Supabase configuration not found. Please check config.json".to_string(),
            ));
        }
        if url == PLACEHOLDER_URL || key == PLACEHOLDER_ANON_KEY {
            return Err(StoryError::Configuration(
                "Please configure your Supabase credentials in config.json".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn get_config_path() -> Result<PathBuf> {
    let mut path = dirs::config_dir()
        .ok_or_else(|| StoryError::Internal("Failed to get config directory".to_string()))?;

    path.push("storymakers");
    fs::create_dir_all(&path)?;

    path.push("config.json");
    Ok(path)
}

pub fn load_config() -> Result<Config> {
    let config_path = get_config_path()?;
    load_config_from(&config_path)
}

/// Reads the config at `path`, writing the defaults there first when the file
/// does not exist yet.
pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        let default_config = Config::default();
        save_config_to(path, &default_config)?;
        return Ok(default_config);
    }

    let content = fs::read_to_string(path)?;
    let mut config: Config = serde_json::from_str(&content)
        .map_err(|e| StoryError::Configuration(format!("Failed to parse config: {}", e)))?;

    if config.default_district.trim().is_empty() {
        config.default_district = default_district();
    }
    if config.excerpt_length == 0 {
        config.excerpt_length = default_excerpt_length();
    }

    Ok(config)
}

pub fn save_config(config: &Config) -> Result<()> {
    let config_path = get_config_path()?;
    save_config_to(&config_path, config)
}

pub fn save_config_to(path: &Path, config: &Config) -> Result<()> {
    let content = serde_json::to_string_pretty(config)
        .map_err(|e| StoryError::Internal(format!("Failed to serialize config: {}", e)))?;

    fs::write(path, content)?;

    Ok(())
}
