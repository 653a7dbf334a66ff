//! Index reconciliation for the migrated document shape
//!
//! Drops the indexes built over the flat fields and creates the ones the
//! nested shape needs. Every operation tolerates the state a previous,
//! possibly interrupted, run left behind: dropping an absent index and
//! creating an identical existing one both succeed.
//!
//! The full-text index is created with no per-document language override.
//! Stock text settings read a document's `language` field as its stemming
//! language, and `language` holds catalog data here.

use crate::error::MigrationError;
use catalog_store::{CatalogStore, IndexOutcome, IndexSpec, StoreError, TextOptions};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Full-text index over the flat title
pub const LEGACY_TEXT_INDEX: &str = "title_text_author_text_description_text";
/// Ordered index over the flat price
pub const LEGACY_PRICE_INDEX: &str = "price_1";
/// Full-text index over the display title
pub const CATALOG_TEXT_INDEX: &str = "catalog_text";

/// Indexes of the legacy shape
#[must_use]
pub fn legacy_indexes() -> Vec<IndexSpec> {
    vec![
        IndexSpec::text(
            LEGACY_TEXT_INDEX,
            ["title", "author", "description"],
            TextOptions::default(),
        ),
        IndexSpec::ascending(LEGACY_PRICE_INDEX, "price"),
    ]
}

/// Indexes of the migrated shape
#[must_use]
pub fn migrated_indexes() -> Vec<IndexSpec> {
    vec![
        IndexSpec::text(
            CATALOG_TEXT_INDEX,
            ["title.display", "author", "description"],
            TextOptions::without_language_override(),
        ),
        IndexSpec::ascending("title.english_1", "title.english").sparse(),
        IndexSpec::ascending("title.odia_1", "title.odia").sparse(),
        IndexSpec::ascending("tags_1", "tags"),
        IndexSpec::ascending("language_1", "language"),
        IndexSpec::ascending("price.discounted_1", "price.discounted"),
    ]
}

/// One index operation that failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexFailure {
    pub name: String,
    pub message: String,
}

/// Outcome of a reconcile or restore pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexReport {
    /// Dropped indexes
    pub dropped: Vec<String>,
    /// Indexes to drop that were already gone
    pub absent: Vec<String>,
    /// Newly created indexes
    pub created: Vec<String>,
    /// Indexes to create that already existed identically
    pub existing: Vec<String>,
    /// Names held by an index with a different definition
    pub conflicts: Vec<String>,
    /// Other failed operations
    pub failed: Vec<IndexFailure>,
}

impl IndexReport {
    /// Every operation succeeded
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty() && self.failed.is_empty()
    }
}

/// Index catalogue compared against the migrated shape
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexCheck {
    /// Expected indexes that do not exist
    pub missing: Vec<String>,
    /// Legacy indexes still present
    pub stale: Vec<String>,
    /// Expected names whose definition differs
    pub mismatched: Vec<String>,
}

impl IndexCheck {
    #[inline]
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.missing.is_empty() && self.stale.is_empty() && self.mismatched.is_empty()
    }
}

/// Reshapes a collection's secondary indexes
#[derive(Debug, Clone)]
pub struct IndexManager {
    store: Arc<dyn CatalogStore>,
}

impl IndexManager {
    /// Create manager
    #[must_use]
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// Drop the legacy indexes, then create the migrated ones
    ///
    /// # Errors
    /// `FatalConnection` if the store is lost; per-index failures are
    /// reported and do not stop the remaining operations
    pub async fn reconcile(&self) -> Result<IndexReport, MigrationError> {
        let drop: Vec<String> = legacy_indexes().into_iter().map(|s| s.name).collect();
        self.apply(&drop, migrated_indexes()).await
    }

    /// Drop the migrated indexes, then recreate the legacy ones
    ///
    /// # Errors
    /// As for [`IndexManager::reconcile`]
    pub async fn restore_legacy(&self) -> Result<IndexReport, MigrationError> {
        let drop: Vec<String> = migrated_indexes().into_iter().map(|s| s.name).collect();
        self.apply(&drop, legacy_indexes()).await
    }

    /// Compare the current catalogue with the migrated index set
    ///
    /// # Errors
    /// `FatalConnection` or `Store` if the catalogue cannot be listed
    pub async fn verify(&self) -> Result<IndexCheck, MigrationError> {
        let current: BTreeMap<String, IndexSpec> = self
            .store
            .list_indexes()
            .await?
            .into_iter()
            .map(|spec| (spec.name.clone(), spec))
            .collect();

        let mut check = IndexCheck::default();
        for expected in migrated_indexes() {
            match current.get(&expected.name) {
                None => check.missing.push(expected.name),
                Some(spec) if *spec != expected => check.mismatched.push(expected.name),
                Some(_) => {}
            }
        }
        check.stale = legacy_indexes()
            .into_iter()
            .map(|spec| spec.name)
            .filter(|name| current.contains_key(name))
            .collect();
        Ok(check)
    }

    async fn apply(
        &self,
        drop: &[String],
        create: Vec<IndexSpec>,
    ) -> Result<IndexReport, MigrationError> {
        let mut report = IndexReport::default();

        for name in drop {
            match self.store.drop_index(name).await {
                Ok(IndexOutcome::NotFound) => {
                    tracing::debug!("Index {} already absent", name);
                    report.absent.push(name.clone());
                }
                Ok(_) => {
                    tracing::info!("Dropped index {}", name);
                    report.dropped.push(name.clone());
                }
                Err(e) => record(&mut report, name, e)?,
            }
        }

        for spec in create {
            let name = spec.name.clone();
            match self.store.create_index(spec).await {
                Ok(IndexOutcome::AlreadyExists) => {
                    tracing::debug!("Index {} already exists", name);
                    report.existing.push(name);
                }
                Ok(_) => {
                    tracing::info!("Created index {}", name);
                    report.created.push(name);
                }
                Err(e) => record(&mut report, &name, e)?,
            }
        }

        Ok(report)
    }
}

/// Note a failed index operation, or abort if the store is gone
fn record(report: &mut IndexReport, name: &str, err: StoreError) -> Result<(), MigrationError> {
    match err {
        e if e.is_fatal() => Err(MigrationError::FatalConnection(e)),
        StoreError::IndexConflict { name } => {
            tracing::warn!("Index {} exists with a different definition", name);
            report.conflicts.push(name);
            Ok(())
        }
        e => {
            tracing::warn!("Index operation on {} failed: {}", name, e);
            report.failed.push(IndexFailure {
                name: name.to_string(),
                message: e.to_string(),
            });
            Ok(())
        }
    }
}
