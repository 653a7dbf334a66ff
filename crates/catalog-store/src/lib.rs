//! Catalog Store - where catalog documents live
//!
//! Provides:
//! - [`CatalogStore`]: the async store contract used by the migration
//!   drivers and the catalog API (forward-only cursor, conditional
//!   per-document replace, index catalogue)
//! - [`MemoryStore`]: process-local backend, with fault injection for tests
//! - [`FileStore`]: directory-backed backend, one JSON file per document
//! - [`connect`]: resolve a connection string into a store
//!
//! # Example
//!
//! ```rust,ignore
//! use catalog_store::{connect, CatalogStore};
//! use futures::StreamExt;
//!
//! let store = connect("file:///var/lib/catalog").await?;
//! let mut cursor = store.scan();
//! while let Some(doc) = cursor.next().await {
//!     println!("{:?}", doc?);
//! }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod connect;
pub mod error;
pub mod file;
pub mod index;
pub mod memory;
pub mod store;

pub use connect::{connect, connect_from_env, STORE_URL_ENV};
pub use error::StoreError;
pub use file::FileStore;
pub use index::{IndexKey, IndexKind, IndexOutcome, IndexSpec, TextOptions};
pub use memory::MemoryStore;
pub use store::{CatalogStore, DocumentStream, ReplaceOp};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
