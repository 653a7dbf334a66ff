//! Shape detector: total classification of a raw catalog document
//!
//! The detector is the idempotency gate for both drivers: a document that
//! already has the target shape is never rewritten.

use crate::document::{kind_of, Document};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// On-disk shape of a catalog document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Shape {
    /// `title` is a string and `price` is a number
    Legacy,
    /// `title` is a record with `display` and `price` is a record with `original`
    Migrated,
    /// Any other combination; reported and skipped, never coerced
    Malformed,
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Shape::Legacy => f.write_str("legacy"),
            Shape::Migrated => f.write_str("migrated"),
            Shape::Malformed => f.write_str("malformed"),
        }
    }
}

/// Classify a raw document
#[must_use]
pub fn detect(doc: &Document) -> Shape {
    match (doc.get("title"), doc.get("price")) {
        (Some(Value::String(_)), Some(Value::Number(_))) => Shape::Legacy,
        (Some(Value::Object(title)), Some(Value::Object(price)))
            if title.contains_key("display") && price.contains_key("original") =>
        {
            Shape::Migrated
        }
        _ => Shape::Malformed,
    }
}

/// Describe why a document has the shape it has, for failure reports
#[must_use]
pub fn describe(doc: &Document) -> String {
    let title = doc.get("title");
    let price = doc.get("price");
    let mut reason = format!("title is {}, price is {}", kind_of(title), kind_of(price));
    if let Some(Value::Object(map)) = title {
        if !map.contains_key("display") {
            reason.push_str("; title record lacks display");
        }
    }
    if let Some(Value::Object(map)) = price {
        if !map.contains_key("original") {
            reason.push_str("; price record lacks original");
        }
    }
    reason
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn detects_legacy() {
        assert_eq!(detect(&doc(json!({"title": "Test", "price": 100}))), Shape::Legacy);
        assert_eq!(detect(&doc(json!({"title": "", "price": 0.5}))), Shape::Legacy);
    }

    #[test]
    fn detects_migrated() {
        let d = doc(json!({
            "title": {"display": "Test"},
            "price": {"original": 100, "discounted": 80, "discountPercent": 20}
        }));
        assert_eq!(detect(&d), Shape::Migrated);
    }

    #[test]
    fn hybrids_are_malformed() {
        for value in [
            json!({"title": "Test", "price": {"original": 100}}),
            json!({"title": {"display": "Test"}, "price": 100}),
            json!({"title": {"english": "Test"}, "price": {"original": 100}}),
            json!({"title": {"display": "Test"}, "price": {"discounted": 100}}),
            json!({"title": "Test"}),
            json!({"price": 5}),
            json!({"title": null, "price": null}),
            json!({"title": "Test", "price": "100"}),
            json!({}),
        ] {
            assert_eq!(detect(&doc(value.clone())), Shape::Malformed, "{value}");
        }
    }

    #[test]
    fn describe_names_missing_subfields() {
        let d = doc(json!({"title": {"english": "x"}, "price": {"discounted": 1}}));
        let reason = describe(&d);
        assert!(reason.contains("title is object"));
        assert!(reason.contains("lacks display"));
        assert!(reason.contains("lacks original"));
    }
}
