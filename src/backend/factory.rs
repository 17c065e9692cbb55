use crate::backend::{Backend, SupabaseClient};
use crate::config::{BackendProvider, Config};
use crate::database::SqliteBackend;
use crate::error::Result;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::{error, info};

pub fn create_client(config: &Config) -> Result<Arc<dyn Backend>> {
    match config.provider {
        BackendProvider::Supabase => {
            config.validate_remote()?;
            let client = SupabaseClient::new(
                config.supabase_url.trim(),
                config.supabase_anon_key.trim(),
                &config.storage_bucket,
                Duration::from_secs(config.request_timeout_secs),
            )?;
            Ok(Arc::new(client))
        }
        BackendProvider::Sqlite => {
            let backend = match &config.sqlite_path {
                Some(path) => SqliteBackend::open(path, &config.local_public_base_url)?,
                None => SqliteBackend::open_in_memory(&config.local_public_base_url)?,
            };
            Ok(Arc::new(backend))
        }
    }
}

/// Owns the one backend handle a page uses.
///
/// The handle is built on first use. A failed build is logged and retried on
/// the next call; once built it never changes.
pub struct ClientAccessor {
    config: Config,
    client: OnceLock<Arc<dyn Backend>>,
}

impl ClientAccessor {
    pub fn new(config: Config) -> Self {
        ClientAccessor {
            config,
            client: OnceLock::new(),
        }
    }

    /// Wraps an already constructed backend.
    pub fn with_backend(config: Config, backend: Arc<dyn Backend>) -> Self {
        let client = OnceLock::new();
        let _ = client.set(backend);
        ClientAccessor { config, client }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The shared handle, or `None` when the backend is unavailable.
    pub fn get_client(&self) -> Option<Arc<dyn Backend>> {
        if let Some(client) = self.client.get() {
            return Some(client.clone());
        }

        match create_client(&self.config) {
            Ok(client) => {
                info!("Backend client initialized ({:?})", self.config.provider);
                // A concurrent first call may have won; either handle is fine
                // but only the stored one is handed out.
                let _ = self.client.set(client);
                self.client.get().cloned()
            }
            Err(e) => {
                error!("Error initializing backend client: {}", e);
                None
            }
        }
    }
}
