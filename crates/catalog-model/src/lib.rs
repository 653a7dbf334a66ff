//! Catalog Model - shapes of a catalog item during a schema migration
//!
//! A catalog collection holds two document shapes at once while it is being
//! migrated:
//! - **Legacy**: flat `title` string and numeric `price`
//! - **Migrated**: nested `title` / `price` records plus `language`,
//!   `academicGrade` and `tags`
//!
//! This crate is pure: it classifies raw documents, converts between the two
//! shapes, projects either shape into a single read view, and checks the
//! invariants of migrated documents. It performs no I/O.
//!
//! # Example
//!
//! ```rust
//! use catalog_model::{CatalogItem, ItemView};
//! use serde_json::json;
//!
//! let doc = json!({"_id": "b1", "title": "Test", "price": 100})
//!     .as_object()
//!     .cloned()
//!     .unwrap();
//!
//! let item = CatalogItem::from_document(doc).unwrap();
//! let view = ItemView::of(&item);
//! assert_eq!(view.title_display, "Test");
//! assert!(!view.has_discount);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod document;
pub mod error;
pub mod invariants;
pub mod item;
pub mod language;
pub mod shape;
pub mod transform;
pub mod view;

pub use document::{Document, ItemId, ID_FIELD};
pub use error::ModelError;
pub use invariants::{check_migrated, Violation};
pub use item::{CatalogItem, LegacyItem, MigratedItem, Price, Title};
pub use language::{classify, Language, ScriptProfile};
pub use shape::{detect, Shape};
pub use transform::{migrate, normalize, rollback};
pub use view::ItemView;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with catalog documents
    pub use crate::{
        detect, CatalogItem, Document, ItemId, ItemView, Language, LegacyItem, MigratedItem,
        ModelError, Shape,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
