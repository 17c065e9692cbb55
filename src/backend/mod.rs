pub mod factory;
pub mod provider;
pub mod supabase;

pub use factory::{create_client, ClientAccessor};
pub use provider::{Backend, PostQuery, UploadOptions};
pub use supabase::SupabaseClient;
