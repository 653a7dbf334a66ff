//! Error types for migration runs
//!
//! Only structural failures live here. Per-document problems never abort a
//! run; they are counted in the run summary as [`FailureKind`]s.
//!
//! [`FailureKind`]: crate::summary::FailureKind

use crate::summary::RunSummary;
use catalog_model::ModelError;
use catalog_store::StoreError;

/// Run-level errors that abort a migration, rollback, index or verify pass
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// Store unreachable at start or lost mid-run
    #[error("fatal connection error: {0}")]
    FatalConnection(#[source] StoreError),

    /// Connection lost part-way through a pass, after some documents were
    /// already handled
    #[error("pass interrupted after {} documents: {source}", .partial.scanned)]
    Interrupted {
        /// Counts up to the point of failure
        partial: Box<RunSummary>,
        #[source]
        source: StoreError,
    },

    /// Rollback refused because the collection holds both shapes
    #[error(
        "collection is mid-migration ({legacy} legacy, {migrated} migrated); \
         refusing to roll back without --force"
    )]
    MixedState {
        /// Documents still in the legacy shape
        legacy: u64,
        /// Documents in the migrated shape
        migrated: u64,
    },

    /// Store error outside per-document handling
    #[error("store error: {0}")]
    Store(#[source] StoreError),
}

impl From<StoreError> for MigrationError {
    fn from(err: StoreError) -> Self {
        if err.is_fatal() {
            Self::FatalConnection(err)
        } else {
            Self::Store(err)
        }
    }
}

impl MigrationError {
    /// Check if the store itself is unreachable
    #[inline]
    #[must_use]
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::FatalConnection(_) | Self::Interrupted { .. })
    }

    /// Counts of a pass that was cut short
    #[must_use]
    pub fn partial_summary(&self) -> Option<&RunSummary> {
        match self {
            Self::Interrupted { partial, .. } => Some(partial.as_ref()),
            _ => None,
        }
    }
}

/// Errors from the catalog read/write contract
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Input or stored document failed validation
    #[error("validation failed: {0}")]
    Validation(#[from] ModelError),

    /// Store operation failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl ApiError {
    /// Check if the caller sent bad input
    #[inline]
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(e) if e.is_validation())
    }
}
