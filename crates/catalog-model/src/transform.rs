//! Document transformer between the legacy and migrated shapes
//!
//! - [`migrate`]: legacy item to migrated item (forward, used by the driver)
//! - [`normalize`]: write-path input in either shape, or mixed per field, to a
//!   validated migrated item
//! - [`rollback`]: migrated item to legacy item (inverse, lossy)

use crate::document::{Document, ItemId};
use crate::error::ModelError;
use crate::item::{
    read_academic_grade, read_language, read_tags, strip_shape_fields, LegacyItem, MigratedItem,
    Price, Title,
};
use crate::language::{Language, ScriptProfile};
use serde_json::Value;

/// Forward transform of a legacy item
///
/// The title is classified once; the result picks both the `language` field
/// (unless the document already carries one) and which title variant is set.
///
/// # Errors
/// `InvalidField` if the title is blank, the price is negative or not finite,
/// or a stored `language`, `academicGrade` or `tags` has an unusable value.
/// Such a document cannot satisfy the migrated invariants and is left as is.
pub fn migrate(legacy: LegacyItem) -> Result<MigratedItem, ModelError> {
    let LegacyItem {
        id,
        title,
        price,
        mut extra,
    } = legacy;

    if title.trim().is_empty() {
        return Err(ModelError::invalid("title", "must not be empty"));
    }
    let price = Price::flat(price);
    price.validate()?;

    let profile = ScriptProfile::of(&title);
    let language = read_language(&extra)?.unwrap_or_else(|| profile.language());
    let academic_grade = read_academic_grade(&extra)?;
    let tags = read_tags(&extra)?.unwrap_or_default();
    strip_shape_fields(&mut extra);

    Ok(MigratedItem {
        id,
        title: split_title(title, profile),
        price,
        language,
        academic_grade,
        tags,
        extra,
    })
}

/// Validate and complete a write-path document into the migrated shape
///
/// `title` and `price` are handled independently: each may be flat or a
/// nested record. A nested record missing its mandatory sub-field is
/// rejected rather than completed with invented data.
///
/// # Errors
/// - `MissingId` without a usable `_id`
/// - `MissingRequiredField` for a missing `title`, `price`, `title.display`
///   or `price.original`
/// - `InvalidField` for wrongly typed values or broken price invariants
pub fn normalize(mut doc: Document) -> Result<MigratedItem, ModelError> {
    let id = ItemId::of(&doc).ok_or(ModelError::MissingId)?;

    let (title, profile) = match doc.get("title") {
        None | Some(Value::Null) => {
            return Err(ModelError::MissingRequiredField { field: "title" })
        }
        Some(Value::String(text)) => {
            if text.trim().is_empty() {
                return Err(ModelError::invalid("title", "must not be empty"));
            }
            let profile = ScriptProfile::of(text);
            (split_title(text.clone(), profile), profile)
        }
        Some(Value::Object(map)) => {
            let title = Title::from_nested(map)?;
            let profile = ScriptProfile::of(&title.display);
            if title.english.is_none() && title.odia.is_none() {
                (split_title(title.display, profile), profile)
            } else {
                (title, profile)
            }
        }
        Some(_) => {
            return Err(ModelError::invalid(
                "title",
                "must be a string or a title record",
            ))
        }
    };

    let price = match doc.get("price") {
        None | Some(Value::Null) => {
            return Err(ModelError::MissingRequiredField { field: "price" })
        }
        Some(Value::Number(n)) => Price::flat(n.as_f64().unwrap_or(f64::NAN)),
        Some(Value::Object(map)) => Price::from_nested(map)?,
        Some(_) => {
            return Err(ModelError::invalid(
                "price",
                "must be a number or a price record",
            ))
        }
    };
    price.validate()?;

    let language = read_language(&doc)?.unwrap_or_else(|| profile.language());
    let academic_grade = read_academic_grade(&doc)?;
    let tags = read_tags(&doc)?.unwrap_or_default();
    strip_shape_fields(&mut doc);

    Ok(MigratedItem {
        id,
        title,
        price,
        language,
        academic_grade,
        tags,
        extra: doc,
    })
}

/// Inverse transform of a migrated item
///
/// Lossy: `language`, `tags`, `academicGrade`, the title variants and the
/// discount bookkeeping are dropped. The flat price is the discounted price
/// when a discount is present, otherwise the original.
#[must_use]
pub fn rollback(item: MigratedItem) -> LegacyItem {
    LegacyItem {
        id: item.id,
        title: item.title.display,
        price: item.price.effective(),
        extra: item.extra,
    }
}

/// Build a title record from flat text; the unset variant stays absent
pub(crate) fn split_title(text: String, profile: ScriptProfile) -> Title {
    let language = profile.language();
    let english = (language == Language::English || profile.is_mixed()).then(|| text.clone());
    let odia = (language == Language::Odia).then(|| text.clone());
    Title {
        display: text,
        english,
        odia,
    }
}
