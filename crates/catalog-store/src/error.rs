//! Error types for the catalog store
//!
//! Distinguishes:
//! - Fatal errors that abort a run (cannot connect, bad connection string)
//! - Transient errors that are worth retrying for a single document
//! - Per-document outcomes (conflict, missing, duplicate)
//! - Index catalogue conflicts

use catalog_model::ItemId;
use std::path::PathBuf;

/// Catalog store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Store cannot be reached at all
    #[error("cannot connect to store: {0}")]
    Connection(String),

    /// Connection string not understood
    #[error("invalid connection string '{0}'")]
    InvalidUrl(String),

    /// Network, timeout or similar failure on one operation
    #[error("transient store error: {0}")]
    Transient(String),

    /// Stored document no longer matches the version that was read
    #[error("document {id} changed since it was read")]
    Conflict {
        /// Document identifier
        id: ItemId,
    },

    /// No document with this identifier
    #[error("document {id} not found")]
    NotFound {
        /// Document identifier
        id: ItemId,
    },

    /// A document with this identifier already exists
    #[error("document {id} already exists")]
    DuplicateId {
        /// Document identifier
        id: ItemId,
    },

    /// Document carries no usable `_id`
    #[error("document has no usable _id")]
    MissingId,

    /// Same index name already exists with a different definition
    #[error("index '{name}' already exists with a different definition")]
    IndexConflict {
        /// Index name
        name: String,
    },

    /// The cursor reached a document it could not read
    #[error("cannot read document {id}: {source}")]
    Read {
        /// Document identifier
        id: ItemId,
        #[source]
        source: Box<StoreError>,
    },

    /// IO error on a file-backed store
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stored bytes are not a JSON document
    #[error("corrupt document at {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Serialization failure
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl StoreError {
    /// Create IO error for path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap a failure to read one document found by a cursor
    pub fn read(id: ItemId, source: StoreError) -> Self {
        Self::Read {
            id,
            source: Box::new(source),
        }
    }

    /// Identifier of the single document the error concerns, if any
    #[must_use]
    pub fn document_id(&self) -> Option<&ItemId> {
        match self {
            Self::Read { id, .. }
            | Self::Conflict { id }
            | Self::NotFound { id }
            | Self::DuplicateId { id } => Some(id),
            _ => None,
        }
    }

    /// Check if the operation may succeed when repeated
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transient(_) => true,
            Self::Read { source, .. } => source.is_retryable(),
            Self::Io { source, .. } => matches!(
                source.kind(),
                std::io::ErrorKind::Interrupted
                    | std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::WouldBlock
            ),
            _ => false,
        }
    }

    /// Check if the error must abort a whole run
    #[inline]
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Connection(_) | Self::InvalidUrl(_) => true,
            Self::Read { source, .. } => source.is_fatal(),
            _ => false,
        }
    }

    /// Check if a concurrent writer got there first
    #[inline]
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. } | Self::NotFound { .. })
    }
}
