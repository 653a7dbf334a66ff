//! Directory-backed catalog store
//!
//! Layout under the root directory:
//!
//! ```text
//! <root>/items/<hex(id)>.json   one document per file
//! <root>/indexes.json           index catalogue
//! ```
//!
//! Writes go to a temporary sibling and are renamed into place, so a reader
//! sees either the old or the new document. Writers within one process are
//! serialized; the store does not coordinate between processes.

use crate::error::StoreError;
use crate::index::{IndexOutcome, IndexSpec};
use crate::store::{index_outcome, CatalogStore, DocumentStream, ReplaceOp};
use async_trait::async_trait;
use catalog_model::{Document, ItemId};
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

const ITEMS_DIR: &str = "items";
const INDEX_FILE: &str = "indexes.json";

/// File-backed store
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

enum ScanState {
    Pending,
    Open(fs::ReadDir),
    Done,
}

impl FileStore {
    /// Open the store rooted at an existing directory
    ///
    /// # Errors
    /// `Connection` if `root` is not an accessible directory
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        match fs::metadata(&root).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(StoreError::Connection(format!(
                    "{} is not a directory",
                    root.display()
                )))
            }
            Err(e) => {
                return Err(StoreError::Connection(format!(
                    "{}: {e}",
                    root.display()
                )))
            }
        }

        let items = root.join(ITEMS_DIR);
        fs::create_dir_all(&items)
            .await
            .map_err(|e| StoreError::io(&items, e))?;

        tracing::debug!("Opened file store at {}", root.display());
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    /// Root directory
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn items_dir(&self) -> PathBuf {
        self.root.join(ITEMS_DIR)
    }

    fn doc_path(&self, id: &ItemId) -> PathBuf {
        self.items_dir()
            .join(format!("{}.json", hex::encode(id.as_str())))
    }

    fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }

    async fn read_indexes(&self) -> Result<Vec<IndexSpec>, StoreError> {
        let path = self.index_path();
        match fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
                path,
                source,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    async fn write_indexes(&self, indexes: &[IndexSpec]) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(indexes)?;
        write_atomic(&self.index_path(), &bytes).await
    }
}

/// Read one document file; `None` if it vanished
async fn read_document(path: &Path) -> Result<Option<Document>, StoreError> {
    match fs::read(path).await {
        Ok(bytes) => serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StoreError::Corrupt {
                path: path.to_path_buf(),
                source,
            }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StoreError::io(path, e)),
    }
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, bytes)
        .await
        .map_err(|e| StoreError::io(&tmp, e))?;
    fs::rename(&tmp, path)
        .await
        .map_err(|e| StoreError::io(path, e))
}

fn is_document_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

/// Identifier encoded in a document file name, if it is one of ours
fn id_from_path(path: &Path) -> Option<ItemId> {
    let stem = path.file_stem()?.to_str()?;
    let bytes = hex::decode(stem).ok()?;
    String::from_utf8(bytes).ok().map(ItemId::new)
}

#[async_trait]
impl CatalogStore for FileStore {
    fn describe(&self) -> String {
        format!("file://{}", self.root.display())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        match fs::metadata(self.items_dir()).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(StoreError::Connection(format!(
                "{} is not a directory",
                self.items_dir().display()
            ))),
            Err(e) => Err(StoreError::Connection(format!(
                "{}: {e}",
                self.items_dir().display()
            ))),
        }
    }

    fn scan(&self) -> DocumentStream<'_> {
        stream::unfold(ScanState::Pending, move |state| async move {
            let mut dir = match state {
                ScanState::Done => return None,
                ScanState::Open(dir) => dir,
                ScanState::Pending => match fs::read_dir(self.items_dir()).await {
                    Ok(dir) => dir,
                    Err(e) => {
                        let err = StoreError::Connection(format!(
                            "{}: {e}",
                            self.items_dir().display()
                        ));
                        return Some((Err(err), ScanState::Done));
                    }
                },
            };
            loop {
                match dir.next_entry().await {
                    Ok(Some(entry)) => {
                        let path = entry.path();
                        if !is_document_file(&path) {
                            continue;
                        }
                        match read_document(&path).await {
                            Ok(Some(doc)) => return Some((Ok(doc), ScanState::Open(dir))),
                            Ok(None) => continue,
                            Err(e) => {
                                let err = match id_from_path(&path) {
                                    Some(id) => StoreError::read(id, e),
                                    None => e,
                                };
                                return Some((Err(err), ScanState::Open(dir)));
                            }
                        }
                    }
                    Ok(None) => return None,
                    Err(e) => {
                        return Some((
                            Err(StoreError::io(self.items_dir(), e)),
                            ScanState::Done,
                        ))
                    }
                }
            }
        })
        .boxed()
    }

    async fn get(&self, id: &ItemId) -> Result<Option<Document>, StoreError> {
        read_document(&self.doc_path(id)).await
    }

    async fn insert(&self, doc: Document) -> Result<ItemId, StoreError> {
        let id = ItemId::of(&doc).ok_or(StoreError::MissingId)?;
        let path = self.doc_path(&id);
        let bytes = serde_json::to_vec(&doc)?;

        let _guard = self.write_lock.lock().await;
        if fs::try_exists(&path)
            .await
            .map_err(|e| StoreError::io(&path, e))?
        {
            return Err(StoreError::DuplicateId { id });
        }
        write_atomic(&path, &bytes).await?;
        Ok(id)
    }

    async fn replace(&self, op: &ReplaceOp) -> Result<(), StoreError> {
        let path = self.doc_path(&op.id);
        let bytes = serde_json::to_vec(&op.replacement)?;

        let _guard = self.write_lock.lock().await;
        let current = read_document(&path)
            .await?
            .ok_or_else(|| StoreError::NotFound { id: op.id.clone() })?;
        if current != op.expected {
            return Err(StoreError::Conflict { id: op.id.clone() });
        }
        write_atomic(&path, &bytes).await
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let dir_path = self.items_dir();
        let mut dir = fs::read_dir(&dir_path)
            .await
            .map_err(|e| StoreError::io(&dir_path, e))?;
        let mut count = 0;
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| StoreError::io(&dir_path, e))?
        {
            if is_document_file(&entry.path()) {
                count += 1;
            }
        }
        Ok(count)
    }

    async fn list_indexes(&self) -> Result<Vec<IndexSpec>, StoreError> {
        self.read_indexes().await
    }

    async fn create_index(&self, spec: IndexSpec) -> Result<IndexOutcome, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut indexes = self.read_indexes().await?;
        let existing = indexes.iter().find(|i| i.name == spec.name);
        if let Some(outcome) = index_outcome(existing, &spec)? {
            return Ok(outcome);
        }
        indexes.push(spec);
        self.write_indexes(&indexes).await?;
        Ok(IndexOutcome::Created)
    }

    async fn drop_index(&self, name: &str) -> Result<IndexOutcome, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut indexes = self.read_indexes().await?;
        let before = indexes.len();
        indexes.retain(|i| i.name != name);
        if indexes.len() == before {
            return Ok(IndexOutcome::NotFound);
        }
        self.write_indexes(&indexes).await?;
        Ok(IndexOutcome::Dropped)
    }
}
