//! Persisted config store (Firestore in production, in-memory otherwise).

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::InMemoryConfigStore;

use crate::error::Result;
use crate::models::StravaConfigDoc;
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    pub const AUTH: &str = "auth";
}

/// Document ID of the single Strava link config inside `auth`.
pub const STRAVA_CONFIG_DOCUMENT: &str = "strava_config";

/// Key-value store holding the durable Strava link state.
///
/// Passed explicitly to whoever needs it; there is no global handle.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Load the config document. A missing document is `AppError::Config`.
    async fn load(&self) -> Result<StravaConfigDoc>;

    /// Overwrite a single field of the config document by name.
    async fn update_field(&self, field: &str, value: &str) -> Result<()>;
}
