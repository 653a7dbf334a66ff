//! Forward migration: legacy documents to the migrated shape

use crate::config::MigrateConfig;
use crate::error::MigrationError;
use crate::pass::{run_pass, Plan};
use crate::summary::{RunMode, RunSummary};
use catalog_model::{detect, migrate, CatalogItem, Document, ItemId, Shape};
use catalog_store::{CatalogStore, ReplaceOp};
use std::sync::Arc;

/// Rewrites every legacy document in the collection once
///
/// Safe to rerun: migrated documents are skipped, so a second run over a
/// fully migrated collection writes nothing.
#[derive(Debug, Clone)]
pub struct MigrationDriver {
    store: Arc<dyn CatalogStore>,
    config: MigrateConfig,
}

impl MigrationDriver {
    /// Create driver
    #[must_use]
    pub fn new(store: Arc<dyn CatalogStore>, config: MigrateConfig) -> Self {
        Self { store, config }
    }

    /// Run configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &MigrateConfig {
        &self.config
    }

    /// Run one migration pass
    ///
    /// # Errors
    /// `FatalConnection` if the store is unreachable at start, `Interrupted`
    /// with the counts so far if it is lost mid-run. Per-document failures
    /// are reported in the summary instead.
    pub async fn run(&self) -> Result<RunSummary, MigrationError> {
        run_pass(&*self.store, &self.config, RunMode::Migrate, plan_migrate).await
    }
}

/// Decide what the forward pass does with one document
pub(crate) fn plan_migrate(doc: Document) -> Plan {
    if detect(&doc) == Shape::Migrated {
        return Plan::Skip;
    }

    let id = ItemId::of(&doc);
    let expected = doc.clone();
    let migrated = match CatalogItem::from_document(doc) {
        Ok(CatalogItem::Legacy(legacy)) => migrate(legacy),
        Ok(CatalogItem::Migrated(_)) => return Plan::Skip,
        Err(e) => Err(e),
    };

    match migrated {
        Ok(item) => Plan::Rewrite(ReplaceOp::new(item.id.clone(), expected, item.into_document())),
        Err(e) => Plan::failed(id, &e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::FailureKind;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn legacy_is_rewritten_conditionally() {
        let legacy = doc(json!({"_id": "a", "title": "Physics", "price": 250}));
        let Plan::Rewrite(op) = plan_migrate(legacy.clone()) else {
            panic!("expected rewrite");
        };
        assert_eq!(op.id, ItemId::new("a"));
        assert_eq!(op.expected, legacy);
        assert_eq!(op.replacement["title"]["display"], json!("Physics"));
        assert_eq!(op.replacement["price"]["original"], json!(250));
        assert_eq!(op.replacement["language"], json!("English"));
    }

    #[test]
    fn migrated_is_skipped() {
        let migrated = doc(json!({
            "_id": "b",
            "title": {"display": "Maths", "english": "Maths"},
            "price": {"original": 100, "discounted": 100, "discountPercent": 0},
            "language": "English",
        }));
        assert_eq!(plan_migrate(migrated), Plan::Skip);
    }

    #[test]
    fn malformed_fails_with_id() {
        let broken = doc(json!({"_id": "c", "title": ["x"], "price": 1}));
        match plan_migrate(broken) {
            Plan::Fail { id, kind, .. } => {
                assert_eq!(id, Some(ItemId::new("c")));
                assert_eq!(kind, FailureKind::MalformedDocument);
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn negative_price_fails_validation() {
        let bad = doc(json!({"_id": "d", "title": "Bad", "price": -5}));
        assert!(matches!(
            plan_migrate(bad),
            Plan::Fail {
                kind: FailureKind::InvalidField,
                ..
            }
        ));
    }
}
