//! The catalog store contract

use crate::error::StoreError;
use crate::index::{IndexOutcome, IndexSpec};
use async_trait::async_trait;
use catalog_model::{Document, ItemId};
use futures::stream::BoxStream;

/// Forward-only cursor over the collection
///
/// Documents are yielded one at a time; the collection is never
/// materialized. Documents inserted behind the cursor's position while it is
/// open are not seen by it.
pub type DocumentStream<'a> = BoxStream<'a, Result<Document, StoreError>>;

/// Conditional replace of one document
///
/// Applied only if the stored document still equals `expected`, so a
/// concurrent writer is never overwritten with a stale transform.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplaceOp {
    /// Document identifier
    pub id: ItemId,
    /// Version the caller read
    pub expected: Document,
    /// Full replacement document
    pub replacement: Document,
}

impl ReplaceOp {
    /// Create replace operation
    #[inline]
    #[must_use]
    pub fn new(id: ItemId, expected: Document, replacement: Document) -> Self {
        Self {
            id,
            expected,
            replacement,
        }
    }
}

/// Document store holding the catalog collection
///
/// Every single-document write is atomic: readers observe either the old or
/// the new version, never a mix.
#[async_trait]
pub trait CatalogStore: Send + Sync + std::fmt::Debug {
    /// Human-readable description (backend and location)
    fn describe(&self) -> String;

    /// Check the store is reachable
    ///
    /// # Errors
    /// `StoreError::Connection` when it is not
    async fn ping(&self) -> Result<(), StoreError>;

    /// Open a forward-only cursor over every document
    fn scan(&self) -> DocumentStream<'_>;

    /// Fetch one document
    async fn get(&self, id: &ItemId) -> Result<Option<Document>, StoreError>;

    /// Insert a new document, keyed by its `_id`
    ///
    /// # Errors
    /// `MissingId` without a usable `_id`; `DuplicateId` if it exists
    async fn insert(&self, doc: Document) -> Result<ItemId, StoreError>;

    /// Conditionally replace one document
    ///
    /// # Errors
    /// - `Conflict` if the stored document differs from `op.expected`
    /// - `NotFound` if it was deleted
    /// - `Transient` for retryable failures
    async fn replace(&self, op: &ReplaceOp) -> Result<(), StoreError>;

    /// Apply a batch of conditional replaces
    ///
    /// Results line up with `ops`; each document succeeds or fails on its own.
    async fn replace_batch(&self, ops: &[ReplaceOp]) -> Vec<Result<(), StoreError>> {
        let mut results = Vec::with_capacity(ops.len());
        for op in ops {
            results.push(self.replace(op).await);
        }
        results
    }

    /// Number of documents in the collection
    async fn count(&self) -> Result<u64, StoreError>;

    /// Current index catalogue
    async fn list_indexes(&self) -> Result<Vec<IndexSpec>, StoreError>;

    /// Create an index
    ///
    /// # Errors
    /// `IndexConflict` if the name exists with a different definition
    async fn create_index(&self, spec: IndexSpec) -> Result<IndexOutcome, StoreError>;

    /// Drop an index by name; a missing index is `NotFound`, not an error
    async fn drop_index(&self, name: &str) -> Result<IndexOutcome, StoreError>;
}

/// Resolve the index outcome for `spec` against an existing definition
pub(crate) fn index_outcome(
    existing: Option<&IndexSpec>,
    spec: &IndexSpec,
) -> Result<Option<IndexOutcome>, StoreError> {
    match existing {
        None => Ok(None),
        Some(current) if current == spec => Ok(Some(IndexOutcome::AlreadyExists)),
        Some(_) => Err(StoreError::IndexConflict {
            name: spec.name.clone(),
        }),
    }
}
