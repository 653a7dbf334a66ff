//! In-process catalog store
//!
//! Documents are kept ordered by identifier; the cursor re-seeks past the
//! last identifier it returned on every step, so concurrent inserts ahead of
//! it are seen and inserts behind it are not.
//!
//! Supports fault injection (transient read or write failures per document,
//! an unreachable mode) to exercise retry and fatal-connection paths.

use crate::error::StoreError;
use crate::index::{IndexOutcome, IndexSpec};
use crate::store::{index_outcome, CatalogStore, DocumentStream, ReplaceOp};
use async_trait::async_trait;
use catalog_model::{Document, ItemId};
use futures::stream::{self, StreamExt};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Process-local store
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Documents ordered by identifier
    docs: RwLock<BTreeMap<ItemId, Document>>,
    /// Index catalogue by name
    indexes: RwLock<BTreeMap<String, IndexSpec>>,
    /// Remaining injected write failures per document
    write_faults: Mutex<HashMap<ItemId, u32>>,
    /// Remaining injected read failures per document
    read_faults: Mutex<HashMap<ItemId, u32>>,
    /// Every operation fails with a connection error while set
    unreachable: AtomicBool,
    /// Successful replaces, for observing how many documents a run touched
    replaces: AtomicU64,
}

impl MemoryStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create store holding `docs`
    ///
    /// # Errors
    /// `MissingId` / `DuplicateId` as for [`CatalogStore::insert`]
    pub fn with_documents(docs: impl IntoIterator<Item = Document>) -> Result<Self, StoreError> {
        let store = Self::new();
        {
            let mut map = store.docs.write();
            for doc in docs {
                let id = ItemId::of(&doc).ok_or(StoreError::MissingId)?;
                if map.contains_key(&id) {
                    return Err(StoreError::DuplicateId { id });
                }
                map.insert(id, doc);
            }
        }
        Ok(store)
    }

    /// Fail the next `times` writes to `id` with a transient error
    pub fn fail_writes(&self, id: &ItemId, times: u32) {
        self.write_faults.lock().insert(id.clone(), times);
    }

    /// Fail the next `times` reads of `id`, through the cursor or `get`,
    /// with a transient error
    pub fn fail_reads(&self, id: &ItemId, times: u32) {
        self.read_faults.lock().insert(id.clone(), times);
    }

    /// Make every operation fail as if the store were unreachable
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Number of successful replaces so far
    #[inline]
    #[must_use]
    pub fn replace_count(&self) -> u64 {
        self.replaces.load(Ordering::SeqCst)
    }

    /// Copy of every document, ordered by identifier
    #[must_use]
    pub fn snapshot(&self) -> Vec<Document> {
        self.docs.read().values().cloned().collect()
    }

    fn check_reachable(&self) -> Result<(), StoreError> {
        if self.unreachable.load(Ordering::SeqCst) {
            Err(StoreError::Connection("memory store marked unreachable".to_string()))
        } else {
            Ok(())
        }
    }

    fn take_fault(faults: &Mutex<HashMap<ItemId, u32>>, id: &ItemId) -> bool {
        let mut faults = faults.lock();
        match faults.get_mut(id) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    fn describe(&self) -> String {
        "memory://".to_string()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_reachable()
    }

    fn scan(&self) -> DocumentStream<'_> {
        stream::unfold(Some(Bound::Unbounded), move |cursor| async move {
            let lower: Bound<ItemId> = cursor?;
            if let Err(e) = self.check_reachable() {
                return Some((Err(e), None));
            }
            let next = self
                .docs
                .read()
                .range::<ItemId, _>((lower, Bound::Unbounded))
                .next()
                .map(|(id, doc)| (id.clone(), doc.clone()));
            next.map(|(id, doc)| {
                let item = if Self::take_fault(&self.read_faults, &id) {
                    Err(StoreError::read(
                        id.clone(),
                        StoreError::Transient(format!("injected read failure for {id}")),
                    ))
                } else {
                    Ok(doc)
                };
                (item, Some(Bound::Excluded(id)))
            })
        })
        .boxed()
    }

    async fn get(&self, id: &ItemId) -> Result<Option<Document>, StoreError> {
        self.check_reachable()?;
        if Self::take_fault(&self.read_faults, id) {
            return Err(StoreError::Transient(format!("injected read failure for {id}")));
        }
        Ok(self.docs.read().get(id).cloned())
    }

    async fn insert(&self, doc: Document) -> Result<ItemId, StoreError> {
        self.check_reachable()?;
        let id = ItemId::of(&doc).ok_or(StoreError::MissingId)?;
        let mut docs = self.docs.write();
        if docs.contains_key(&id) {
            return Err(StoreError::DuplicateId { id });
        }
        docs.insert(id.clone(), doc);
        Ok(id)
    }

    async fn replace(&self, op: &ReplaceOp) -> Result<(), StoreError> {
        self.check_reachable()?;
        if Self::take_fault(&self.write_faults, &op.id) {
            return Err(StoreError::Transient(format!(
                "injected write failure for {}",
                op.id
            )));
        }
        let mut docs = self.docs.write();
        let current = docs
            .get_mut(&op.id)
            .ok_or_else(|| StoreError::NotFound { id: op.id.clone() })?;
        if *current != op.expected {
            return Err(StoreError::Conflict { id: op.id.clone() });
        }
        *current = op.replacement.clone();
        self.replaces.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        self.check_reachable()?;
        Ok(self.docs.read().len() as u64)
    }

    async fn list_indexes(&self) -> Result<Vec<IndexSpec>, StoreError> {
        self.check_reachable()?;
        Ok(self.indexes.read().values().cloned().collect())
    }

    async fn create_index(&self, spec: IndexSpec) -> Result<IndexOutcome, StoreError> {
        self.check_reachable()?;
        let mut indexes = self.indexes.write();
        if let Some(outcome) = index_outcome(indexes.get(&spec.name), &spec)? {
            return Ok(outcome);
        }
        indexes.insert(spec.name.clone(), spec);
        Ok(IndexOutcome::Created)
    }

    async fn drop_index(&self, name: &str) -> Result<IndexOutcome, StoreError> {
        self.check_reachable()?;
        Ok(match self.indexes.write().remove(name) {
            Some(_) => IndexOutcome::Dropped,
            None => IndexOutcome::NotFound,
        })
    }
}
