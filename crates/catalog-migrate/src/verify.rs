//! Post-run verification of the migrated invariants

use crate::error::MigrationError;
use catalog_model::{check_migrated, detect, ItemId, Shape, Violation};
use catalog_store::CatalogStore;
use futures::StreamExt;
use serde::Serialize;
use std::sync::Arc;

/// Broken invariants of one document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentViolations {
    pub id: Option<ItemId>,
    pub violations: Vec<Violation>,
}

/// Verification outcome
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    /// Documents examined
    pub checked: u64,
    /// Migrated documents with no violation
    pub migrated_ok: u64,
    /// Documents still in the legacy shape
    pub legacy_remaining: u64,
    /// Documents in neither shape, or unreadable
    pub malformed: u64,
    /// Migrated documents with violations
    pub violations: Vec<DocumentViolations>,
}

impl VerificationReport {
    /// Every checked document is migrated and sound
    #[inline]
    #[must_use]
    pub fn passed(&self) -> bool {
        self.legacy_remaining == 0 && self.malformed == 0 && self.violations.is_empty()
    }
}

/// Checks stored documents against the migrated invariants
#[derive(Debug, Clone)]
pub struct Verifier {
    store: Arc<dyn CatalogStore>,
}

impl Verifier {
    #[must_use]
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// Check up to `sample` documents from the start of the cursor, or all
    /// of them when `None`
    ///
    /// # Errors
    /// `FatalConnection` if the store is lost
    pub async fn verify(&self, sample: Option<usize>) -> Result<VerificationReport, MigrationError> {
        let mut report = VerificationReport::default();
        let cursor = self.store.scan();
        let mut cursor = match sample {
            Some(n) => cursor.take(n).boxed(),
            None => cursor,
        };

        while let Some(next) = cursor.next().await {
            report.checked += 1;
            let doc = match next {
                Ok(doc) => doc,
                Err(e) if e.is_fatal() => return Err(MigrationError::FatalConnection(e)),
                Err(e) => {
                    tracing::warn!("Verification could not read a document: {}", e);
                    report.malformed += 1;
                    continue;
                }
            };
            match detect(&doc) {
                Shape::Legacy => report.legacy_remaining += 1,
                Shape::Malformed => report.malformed += 1,
                Shape::Migrated => {
                    let violations = check_migrated(&doc);
                    if violations.is_empty() {
                        report.migrated_ok += 1;
                    } else {
                        let id = ItemId::of(&doc);
                        tracing::warn!(
                            "Document {} violates {} invariant(s)",
                            id.as_ref().map_or("<no id>", ItemId::as_str),
                            violations.len()
                        );
                        report.violations.push(DocumentViolations { id, violations });
                    }
                }
            }
        }

        tracing::info!(
            "Verified {} document(s): {} ok, {} legacy, {} malformed, {} with violations",
            report.checked,
            report.migrated_ok,
            report.legacy_remaining,
            report.malformed,
            report.violations.len()
        );
        Ok(report)
    }
}
