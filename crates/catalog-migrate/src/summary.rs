//! Run counters and the final summary

use catalog_model::{ItemId, ModelError};
use catalog_store::StoreError;
use serde::Serialize;
use std::time::Duration;

/// Direction of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RunMode {
    /// Legacy to migrated
    Migrate,
    /// Migrated to legacy
    Rollback,
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunMode::Migrate => f.write_str("migrate"),
            RunMode::Rollback => f.write_str("rollback"),
        }
    }
}

/// Why a document needs manual attention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    /// Shape detector could not classify it
    MalformedDocument,
    /// A mandatory sub-field was missing
    MissingRequiredField,
    /// A field value cannot satisfy the target shape
    InvalidField,
    /// Document has no usable identifier
    MissingId,
    /// Write kept failing transiently until attempts ran out
    TransientStoreError,
    /// Non-retryable store failure
    StoreError,
}

impl From<&ModelError> for FailureKind {
    fn from(err: &ModelError) -> Self {
        match err {
            ModelError::Malformed { .. } => FailureKind::MalformedDocument,
            ModelError::MissingRequiredField { .. } => FailureKind::MissingRequiredField,
            ModelError::InvalidField { .. } => FailureKind::InvalidField,
            ModelError::MissingId => FailureKind::MissingId,
        }
    }
}

impl From<&StoreError> for FailureKind {
    fn from(err: &StoreError) -> Self {
        if err.is_retryable() {
            FailureKind::TransientStoreError
        } else {
            FailureKind::StoreError
        }
    }
}

/// One document that failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureRecord {
    /// Identifier, when known
    pub id: Option<ItemId>,
    /// Failure class
    pub kind: FailureKind,
    /// Error message
    pub message: String,
}

/// Running counts, updated as the cursor advances
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    /// Documents read from the cursor
    pub scanned: u64,
    /// Documents rewritten (or that would be, in dry-run)
    pub migrated: u64,
    /// Documents already in the target shape, or changed concurrently
    pub skipped: u64,
    /// Of `skipped`: documents a live writer changed after they were read
    pub conflicts: u64,
    /// Documents needing manual attention
    pub failed: u64,
    /// Failure details
    pub failures: Vec<FailureRecord>,
}

impl Tally {
    /// Record a failed document
    pub fn fail(&mut self, id: Option<ItemId>, kind: FailureKind, message: impl Into<String>) {
        self.failed += 1;
        self.failures.push(FailureRecord {
            id,
            kind,
            message: message.into(),
        });
    }

    /// Finish into a summary
    #[must_use]
    pub fn finish(self, mode: RunMode, dry_run: bool, elapsed: Duration) -> RunSummary {
        RunSummary {
            mode,
            dry_run,
            scanned: self.scanned,
            migrated: self.migrated,
            skipped: self.skipped,
            conflicts: self.conflicts,
            failed: self.failed,
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            failures: self.failures,
        }
    }
}

/// Final summary of a run, printed as JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    /// Direction of the run
    pub mode: RunMode,
    /// Nothing was written
    pub dry_run: bool,
    /// Documents read
    pub scanned: u64,
    /// Documents rewritten to the target shape
    pub migrated: u64,
    /// Documents already in the target shape, or changed concurrently
    pub skipped: u64,
    /// Of `skipped`: documents changed by a live writer mid-run
    pub conflicts: u64,
    /// Documents needing manual attention
    pub failed: u64,
    /// Wall-clock duration
    pub elapsed_ms: u64,
    /// Failure details
    pub failures: Vec<FailureRecord>,
}

impl RunSummary {
    /// No document failed
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }

    /// Human-readable closing line
    #[must_use]
    pub fn attention_line(&self) -> String {
        match self.failed {
            0 => format!("{}: no documents require manual attention", self.mode),
            1 => format!("{}: 1 document requires manual attention", self.mode),
            n => format!("{}: {n} documents require manual attention", self.mode),
        }
    }

    /// Summary as a JSON string
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}
