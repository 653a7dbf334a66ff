//! Resolve a connection string into a store

use crate::error::StoreError;
use crate::file::FileStore;
use crate::memory::MemoryStore;
use crate::store::CatalogStore;
use std::sync::Arc;

/// Environment variable holding the store connection string
pub const STORE_URL_ENV: &str = "CATALOG_STORE_URL";

/// Open the store a connection string names and check it is reachable
///
/// Schemes:
/// - `memory://` - empty process-local store
/// - `file:///abs/dir` - directory-backed store (directory must exist)
///
/// # Errors
/// - `InvalidUrl` for an unknown scheme or an empty path
/// - `Connection` if the store cannot be reached
pub async fn connect(url: &str) -> Result<Arc<dyn CatalogStore>, StoreError> {
    let url = url.trim();
    let store: Arc<dyn CatalogStore> = if let Some(rest) = url.strip_prefix("memory://") {
        if !rest.is_empty() {
            return Err(StoreError::InvalidUrl(url.to_string()));
        }
        Arc::new(MemoryStore::new())
    } else if let Some(path) = url.strip_prefix("file://") {
        if path.is_empty() {
            return Err(StoreError::InvalidUrl(url.to_string()));
        }
        Arc::new(FileStore::open(path).await?)
    } else {
        return Err(StoreError::InvalidUrl(url.to_string()));
    };

    store.ping().await?;
    tracing::info!("Connected to {}", store.describe());
    Ok(store)
}

/// Open the store named by [`STORE_URL_ENV`]
///
/// # Errors
/// `InvalidUrl` if the variable is unset, otherwise as [`connect`]
pub async fn connect_from_env() -> Result<Arc<dyn CatalogStore>, StoreError> {
    let url = std::env::var(STORE_URL_ENV)
        .map_err(|_| StoreError::InvalidUrl(format!("{STORE_URL_ENV} is not set")))?;
    connect(&url).await
}
