//! Shape-agnostic read/write contract for catalog consumers
//!
//! Reads always go through [`ItemView`], so callers see the same fields
//! whether the stored document has been migrated yet or not. Writes always
//! store the migrated shape.

use crate::error::ApiError;
use catalog_model::{normalize, CatalogItem, Document, ItemId, ItemView, ID_FIELD};
use catalog_store::CatalogStore;
use futures::StreamExt;
use serde_json::Value;
use std::sync::Arc;

/// Catalog reads and writes
#[derive(Debug, Clone)]
pub struct CatalogApi {
    store: Arc<dyn CatalogStore>,
}

impl CatalogApi {
    #[must_use]
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// Validate, normalize to the migrated shape, and store a new item
    ///
    /// Accepts a flat or nested title and price, in any combination. A ULID
    /// identifier is assigned when `_id` is absent.
    ///
    /// # Errors
    /// - `Validation` for missing or inconsistent fields
    /// - `Store` if the insert fails, including a duplicate `_id`
    pub async fn create_item(&self, mut input: Document) -> Result<ItemView, ApiError> {
        if !input.contains_key(ID_FIELD) {
            let id = ItemId::generate();
            input.insert(ID_FIELD.to_string(), Value::String(id.as_str().to_string()));
        }

        let item = normalize(input)?;
        let view = ItemView::of(&CatalogItem::Migrated(item.clone()));
        let id = self.store.insert(item.into_document()).await?;
        tracing::debug!("Created catalog item {}", id);
        Ok(view)
    }

    /// Fetch one item
    ///
    /// # Errors
    /// - `Store` if the read fails
    /// - `Validation` if the stored document is in neither shape
    pub async fn get_item(&self, id: &ItemId) -> Result<Option<ItemView>, ApiError> {
        match self.store.get(id).await? {
            Some(doc) => Ok(Some(ItemView::from_document(doc)?)),
            None => Ok(None),
        }
    }

    /// First `limit` readable items in cursor order
    ///
    /// Documents in neither shape are logged and left out.
    ///
    /// # Errors
    /// `Store` if the cursor fails
    pub async fn list_items(&self, limit: usize) -> Result<Vec<ItemView>, ApiError> {
        let mut views = Vec::with_capacity(limit.min(1024));
        let mut cursor = self.store.scan();
        while views.len() < limit {
            let Some(next) = cursor.next().await else {
                break;
            };
            match ItemView::from_document(next?) {
                Ok(view) => views.push(view),
                Err(e) => tracing::warn!("Leaving unreadable item out of listing: {}", e),
            }
        }
        Ok(views)
    }
}
