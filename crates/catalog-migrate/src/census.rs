//! Count documents per shape

use crate::error::MigrationError;
use catalog_model::{detect, Shape};
use catalog_store::CatalogStore;
use futures::StreamExt;
use serde::Serialize;

/// Documents per shape in the collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Census {
    pub legacy: u64,
    pub migrated: u64,
    /// Unclassifiable or unreadable documents
    pub malformed: u64,
}

impl Census {
    /// Collection holds both shapes
    #[inline]
    #[must_use]
    pub fn is_mixed(&self) -> bool {
        self.legacy > 0 && self.migrated > 0
    }

    #[inline]
    #[must_use]
    pub fn total(&self) -> u64 {
        self.legacy + self.migrated + self.malformed
    }
}

/// Scan the collection once and count shapes
///
/// # Errors
/// `FatalConnection` if the store is unreachable
pub async fn census(store: &dyn CatalogStore) -> Result<Census, MigrationError> {
    let mut counts = Census::default();
    let mut cursor = store.scan();
    while let Some(next) = cursor.next().await {
        match next {
            Ok(doc) => match detect(&doc) {
                Shape::Legacy => counts.legacy += 1,
                Shape::Migrated => counts.migrated += 1,
                Shape::Malformed => counts.malformed += 1,
            },
            Err(e) if e.is_fatal() => return Err(MigrationError::FatalConnection(e)),
            Err(e) => {
                tracing::warn!("Census could not read a document: {}", e);
                counts.malformed += 1;
            }
        }
    }
    tracing::debug!(?counts, "Census complete");
    Ok(counts)
}
