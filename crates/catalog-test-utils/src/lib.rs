//! Testing utilities for the catalog workspace
//!
//! Document builders for both shapes and pre-seeded stores.

#![allow(missing_docs)]

use catalog_model::{Document, ItemId};
use catalog_store::MemoryStore;
use serde_json::{json, Value};
use std::sync::Arc;

/// Turn a JSON object literal into a document
///
/// # Panics
/// If `value` is not an object
#[must_use]
pub fn doc(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        other => panic!("fixture is not an object: {other}"),
    }
}

/// Flat legacy document
#[must_use]
pub fn legacy_doc(id: &str, title: &str, price: f64) -> Document {
    doc(json!({"_id": id, "title": title, "price": price}))
}

/// Nested migrated document with a single English title variant
#[must_use]
pub fn migrated_doc(id: &str, title: &str, original: f64, discounted: f64) -> Document {
    let percent = if original > 0.0 && discounted < original {
        ((original - discounted) / original * 10_000.0).round() / 100.0
    } else {
        0.0
    };
    doc(json!({
        "_id": id,
        "title": {"display": title, "english": title},
        "price": {"original": original, "discounted": discounted, "discountPercent": percent},
        "language": "English",
        "academicGrade": null,
        "tags": [],
    }))
}

/// Document in neither shape
#[must_use]
pub fn malformed_doc(id: &str) -> Document {
    doc(json!({"_id": id, "title": ["not", "a", "title"], "price": "free"}))
}

/// Memory store with no documents
#[must_use]
pub fn empty_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new())
}

/// Memory store holding `docs`
///
/// # Panics
/// On duplicate or missing identifiers
#[must_use]
pub fn seeded_store(docs: impl IntoIterator<Item = Document>) -> Arc<MemoryStore> {
    Arc::new(MemoryStore::with_documents(docs).expect("fixture documents have unique ids"))
}

/// Legacy English item, legacy Odia item, and an already migrated item
#[must_use]
pub fn three_doc_store() -> Arc<MemoryStore> {
    seeded_store([
        legacy_doc("a", "Test", 100.0),
        legacy_doc("b", "ଓଡ଼ିଆ ବହି", 80.0),
        migrated_doc("c", "Done", 100.0, 80.0),
    ])
}

/// Stored document by id
///
/// # Panics
/// If no document has that id
#[must_use]
pub fn stored(store: &MemoryStore, id: &str) -> Document {
    let id = ItemId::new(id);
    store
        .snapshot()
        .into_iter()
        .find(|d| ItemId::of(d).as_ref() == Some(&id))
        .unwrap_or_else(|| panic!("no stored document {id}"))
}
