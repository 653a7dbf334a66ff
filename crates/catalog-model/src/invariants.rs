//! Invariants every migrated document must satisfy
//!
//! Checked against the raw stored JSON, not the typed item, so that broken
//! documents are reported instead of being repaired by parsing defaults.

use crate::document::Document;
use crate::item::{discount_percent, DISCOUNT_PERCENT_TOLERANCE};
use crate::language::{Language, ScriptProfile};
use serde::Serialize;
use serde_json::Value;

/// A broken migrated-shape invariant
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "rule", rename_all = "camelCase")]
pub enum Violation {
    /// Document is not in the migrated shape at all
    #[error("document is not in the migrated shape")]
    NotMigrated,

    /// `title.display` missing, not a string, or blank
    #[error("title.display must be a non-empty string")]
    EmptyDisplay,

    /// A price amount is missing or not a number
    #[error("{field} must be a number")]
    PriceNotNumeric {
        /// Offending field
        field: &'static str,
    },

    /// `original >= discounted >= 0` does not hold
    #[error("price ordering broken: original {original}, discounted {discounted}")]
    PriceOrdering {
        /// Stored original amount
        original: f64,
        /// Stored discounted amount
        discounted: f64,
    },

    /// `discountPercent` disagrees with the amounts
    #[error("discountPercent {stored} inconsistent with expected {expected}")]
    DiscountPercent {
        /// Stored percent
        stored: f64,
        /// Percent implied by the amounts
        expected: f64,
    },

    /// `language` unset or not a known language
    #[error("language unset or unknown")]
    LanguageUnset,

    /// Neither `title.english` nor `title.odia` is set
    #[error("no title variant set")]
    NoTitleVariant,

    /// A title variant is present as an empty string instead of being absent
    #[error("title.{variant} is an empty string")]
    EmptyTitleVariant {
        /// Variant name
        variant: &'static str,
    },

    /// Both variants set although the display text is not mixed-script
    #[error("both title variants set for single-script text")]
    BothTitleVariants,
}

/// Check one stored document against the migrated invariants
#[must_use]
pub fn check_migrated(doc: &Document) -> Vec<Violation> {
    let mut violations = Vec::new();

    let (Some(Value::Object(title)), Some(Value::Object(price))) =
        (doc.get("title"), doc.get("price"))
    else {
        violations.push(Violation::NotMigrated);
        return violations;
    };

    let display = match title.get("display") {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.as_str()),
        _ => {
            violations.push(Violation::EmptyDisplay);
            None
        }
    };

    let original = amount(price, "original", "price.original", &mut violations);
    let discounted = match price.get("discounted") {
        None => original,
        Some(_) => amount(price, "discounted", "price.discounted", &mut violations),
    };
    if let (Some(original), Some(discounted)) = (original, discounted) {
        if !(original >= discounted && discounted >= 0.0) {
            violations.push(Violation::PriceOrdering {
                original,
                discounted,
            });
        }
        let expected = discount_percent(original, discounted);
        let stored = price
            .get("discountPercent")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        if (stored - expected).abs() > DISCOUNT_PERCENT_TOLERANCE {
            violations.push(Violation::DiscountPercent { stored, expected });
        }
    }

    let language = doc
        .get("language")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<Language>().ok());
    if language.is_none() {
        violations.push(Violation::LanguageUnset);
    }

    let mut variants = 0;
    for variant in ["english", "odia"] {
        match title.get(variant) {
            Some(Value::String(s)) if s.is_empty() => {
                violations.push(Violation::EmptyTitleVariant { variant });
            }
            Some(Value::String(_)) => variants += 1,
            _ => {}
        }
    }
    match variants {
        0 => violations.push(Violation::NoTitleVariant),
        2 if display.is_some_and(|d| !ScriptProfile::of(d).is_mixed()) => {
            violations.push(Violation::BothTitleVariants);
        }
        _ => {}
    }

    violations
}

fn amount(
    price: &serde_json::Map<String, Value>,
    key: &str,
    field: &'static str,
    violations: &mut Vec<Violation>,
) -> Option<f64> {
    let value = price.get(key).and_then(Value::as_f64);
    if value.is_none() {
        violations.push(Violation::PriceNotNumeric { field });
    }
    value
}
