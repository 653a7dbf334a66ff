//! Inverse migration: migrated documents back to the legacy shape
//!
//! The display title and the effective (discounted) price survive; the
//! per-language variants, the separate original price, `language`,
//! `academicGrade` and `tags` are dropped.
//!
//! Refuses to start on a collection holding both shapes unless forced. A
//! rollback that crashed halfway leaves exactly that state, so resuming one
//! needs `force`.

use crate::config::MigrateConfig;
use crate::census::census;
use crate::error::MigrationError;
use crate::pass::{run_pass, Plan};
use crate::summary::{RunMode, RunSummary};
use catalog_model::{detect, rollback, CatalogItem, Document, ItemId, Shape};
use catalog_store::{CatalogStore, ReplaceOp};
use std::sync::Arc;

/// Rewrites every migrated document back to the legacy shape
#[derive(Debug, Clone)]
pub struct RollbackDriver {
    store: Arc<dyn CatalogStore>,
    config: MigrateConfig,
}

impl RollbackDriver {
    /// Create driver
    #[must_use]
    pub fn new(store: Arc<dyn CatalogStore>, config: MigrateConfig) -> Self {
        Self { store, config }
    }

    /// Run one rollback pass
    ///
    /// # Errors
    /// - `FatalConnection` if the store is unreachable
    /// - `Interrupted` if it is lost mid-run
    /// - `MixedState` if both shapes are present and `force` is off
    pub async fn run(&self) -> Result<RunSummary, MigrationError> {
        self.store
            .ping()
            .await
            .map_err(MigrationError::FatalConnection)?;

        let counts = census(&*self.store).await?;
        if counts.is_mixed() {
            if !self.config.force {
                return Err(MigrationError::MixedState {
                    legacy: counts.legacy,
                    migrated: counts.migrated,
                });
            }
            tracing::warn!(
                "Rolling back a mixed collection ({} legacy, {} migrated) because force is set",
                counts.legacy,
                counts.migrated
            );
        }

        run_pass(&*self.store, &self.config, RunMode::Rollback, plan_rollback).await
    }
}

/// Decide what the rollback pass does with one document
pub(crate) fn plan_rollback(doc: Document) -> Plan {
    if detect(&doc) == Shape::Legacy {
        return Plan::Skip;
    }

    let id = ItemId::of(&doc);
    let expected = doc.clone();
    match CatalogItem::from_document(doc) {
        Ok(CatalogItem::Migrated(item)) => {
            let legacy = rollback(item);
            Plan::Rewrite(ReplaceOp::new(legacy.id.clone(), expected, legacy.into_document()))
        }
        Ok(CatalogItem::Legacy(_)) => Plan::Skip,
        Err(e) => Plan::failed(id, &e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn migrated_becomes_flat_with_effective_price() {
        let doc = json!({
            "_id": "a",
            "title": {"display": "Gita", "english": "Gita"},
            "price": {"original": 100, "discounted": 80, "discountPercent": 20},
            "language": "English",
            "academicGrade": "10",
            "tags": ["classic"],
            "author": "Vyasa",
        })
        .as_object()
        .cloned()
        .unwrap();

        let Plan::Rewrite(op) = plan_rollback(doc) else {
            panic!("expected rewrite");
        };
        assert_eq!(op.replacement["title"], json!("Gita"));
        assert_eq!(op.replacement["price"], json!(80));
        assert_eq!(op.replacement["author"], json!("Vyasa"));
        assert!(!op.replacement.contains_key("language"));
        assert!(!op.replacement.contains_key("tags"));
    }

    #[test]
    fn legacy_is_skipped() {
        let doc = json!({"_id": "b", "title": "Old", "price": 5})
            .as_object()
            .cloned()
            .unwrap();
        assert_eq!(plan_rollback(doc), Plan::Skip);
    }
}
