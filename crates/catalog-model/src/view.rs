//! Compatibility view: one read contract for both stored shapes
//!
//! Computed on every read from the stored document alone. Nothing here is
//! persisted or cached, and projecting a resolved [`CatalogItem`] cannot fail.

use crate::document::{Document, ItemId};
use crate::error::ModelError;
use crate::item::{read_academic_grade, read_language, read_tags, CatalogItem, Price, Title};
use crate::language::{Language, ScriptProfile};
use crate::shape::Shape;
use crate::transform::split_title;
use indexmap::IndexSet;
use serde::Serialize;

/// Consumer-facing projection of a catalog item
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemView {
    /// Document identifier
    pub id: ItemId,
    /// Displayable title regardless of shape
    pub title_display: String,
    /// Discounted price if set, else original, else the flat legacy price
    pub final_price: f64,
    /// Whether a discount applies
    pub has_discount: bool,
    /// Original minus final, floored at zero
    pub savings: f64,
    /// Nested title, synthesized for legacy documents
    pub title: Title,
    /// Nested price, synthesized for legacy documents
    pub price: Price,
    /// Stored language, or classified on read for legacy documents
    pub language: Language,
    /// Academic grade when known
    pub academic_grade: Option<String>,
    /// Ordered tags
    pub tags: IndexSet<String>,
    /// Shape the document is stored in
    pub stored_shape: Shape,
}

impl ItemView {
    /// Project a resolved item
    #[must_use]
    pub fn of(item: &CatalogItem) -> Self {
        match item {
            CatalogItem::Legacy(legacy) => {
                let profile = ScriptProfile::of(&legacy.title);
                Self {
                    id: legacy.id.clone(),
                    title_display: legacy.title.clone(),
                    final_price: legacy.price,
                    has_discount: false,
                    savings: 0.0,
                    title: split_title(legacy.title.clone(), profile),
                    price: Price::flat(legacy.price),
                    language: read_language(&legacy.extra)
                        .ok()
                        .flatten()
                        .unwrap_or_else(|| profile.language()),
                    academic_grade: read_academic_grade(&legacy.extra).ok().flatten(),
                    tags: read_tags(&legacy.extra).ok().flatten().unwrap_or_default(),
                    stored_shape: Shape::Legacy,
                }
            }
            CatalogItem::Migrated(migrated) => {
                let final_price = migrated.price.effective();
                Self {
                    id: migrated.id.clone(),
                    title_display: migrated.title.display.clone(),
                    final_price,
                    has_discount: migrated.price.has_discount(),
                    savings: (migrated.price.original - final_price).max(0.0),
                    title: migrated.title.clone(),
                    price: migrated.price,
                    language: migrated.language,
                    academic_grade: migrated.academic_grade.clone(),
                    tags: migrated.tags.clone(),
                    stored_shape: Shape::Migrated,
                }
            }
        }
    }

    /// Resolve and project a raw stored document
    ///
    /// # Errors
    /// Whatever [`CatalogItem::from_document`] rejects; a well-formed
    /// document of either shape always projects.
    pub fn from_document(doc: Document) -> Result<Self, ModelError> {
        CatalogItem::from_document(doc).map(|item| Self::of(&item))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::{json, Value};

    fn view(value: Value) -> ItemView {
        ItemView::from_document(value.as_object().cloned().unwrap()).unwrap()
    }

    #[test]
    fn legacy_and_migrated_project_alike() {
        let legacy = view(json!({"_id": "l", "title": "Test", "price": 100}));
        assert_eq!(legacy.title_display, "Test");
        assert_eq!(legacy.final_price, 100.0);
        assert!(!legacy.has_discount);
        assert_eq!(legacy.savings, 0.0);

        let migrated = view(json!({
            "_id": "m",
            "title": {"display": "Test"},
            "price": {"original": 100, "discounted": 80, "discountPercent": 20}
        }));
        assert_eq!(migrated.title_display, "Test");
        assert_eq!(migrated.final_price, 80.0);
        assert!(migrated.has_discount);
        assert_eq!(migrated.savings, 20.0);
    }

    #[test]
    fn view_serializes_camel_case() {
        let value = serde_json::to_value(view(json!({"_id": "l", "title": "Test", "price": 100})))
            .unwrap();
        assert_eq!(value["titleDisplay"], json!("Test"));
        assert_eq!(value["finalPrice"], json!(100.0));
        assert_eq!(value["hasDiscount"], json!(false));
        assert_eq!(value["savings"], json!(0.0));
        assert_eq!(value["storedShape"], json!("legacy"));
    }

    #[test]
    fn legacy_language_is_classified_on_read() {
        let v = view(json!({"_id": "o", "title": "ଭୂଗୋଳ", "price": 30}));
        assert_eq!(v.language, Language::Odia);
        assert_eq!(v.title.odia.as_deref(), Some("ଭୂଗୋଳ"));
    }

    #[test]
    fn legacy_view_matches_its_migrated_form() {
        let stored = json!({
            "_id": "k",
            "title": "Algebra",
            "price": 10,
            "tags": ["math"],
            "academicGrade": "9"
        });
        let before = view(stored.clone());
        let CatalogItem::Legacy(legacy) =
            CatalogItem::from_document(stored.as_object().cloned().unwrap()).unwrap()
        else {
            panic!("expected legacy");
        };
        let after = view(Value::Object(
            crate::transform::migrate(legacy).unwrap().into_document(),
        ));

        assert_eq!(before.tags, after.tags);
        assert_eq!(before.academic_grade.as_deref(), Some("9"));
        assert_eq!(before.academic_grade, after.academic_grade);
        assert_eq!(before.title, after.title);
        assert_eq!(before.price, after.price);
        assert_eq!(before.language, after.language);
        assert_eq!(after.stored_shape, Shape::Migrated);
    }

    #[test]
    fn legacy_with_unusable_optional_field_is_rejected() {
        let err = ItemView::from_document(
            json!({"_id": "t", "title": "Algebra", "price": 10, "tags": "math"})
                .as_object()
                .cloned()
                .unwrap(),
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::InvalidField { field: "tags", .. }));
    }

    #[test]
    fn inverted_stored_price_never_reports_negative_savings() {
        let v = view(json!({
            "_id": "bad",
            "title": {"display": "X"},
            "price": {"original": 50, "discounted": 70, "discountPercent": 0}
        }));
        assert!(!v.has_discount);
        assert_eq!(v.final_price, 50.0);
        assert_eq!(v.savings, 0.0);
    }

    #[test]
    fn malformed_document_is_an_error_not_a_panic() {
        let err = ItemView::from_document(
            json!({"_id": "x", "title": 5, "price": 5}).as_object().cloned().unwrap(),
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::Malformed { .. }));
    }

    proptest! {
        #[test]
        fn prop_view_is_consistent(original in 0u32..10_000u32, off in 0u32..10_000u32) {
            let discounted = original.saturating_sub(off);
            let v = view(json!({
                "_id": "p",
                "title": {"display": "Item"},
                "price": {"original": original, "discounted": discounted}
            }));
            prop_assert!(v.savings >= 0.0);
            prop_assert_eq!(v.final_price + v.savings, f64::from(original));
            prop_assert_eq!(v.has_discount, discounted < original);
        }
    }
}
