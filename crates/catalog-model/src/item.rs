//! Typed catalog items, resolved once from a raw document
//!
//! A stored document is turned into a [`CatalogItem`] at the boundary and the
//! rest of the system matches on the variant instead of re-inspecting JSON.

use crate::document::{Document, ItemId, ID_FIELD};
use crate::error::ModelError;
use crate::language::{classify, Language};
use crate::shape::{detect, describe, Shape};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fields owned by the migrated shape; everything else, `_id` included, is
/// carried through untouched so the stored identifier keeps its JSON type
pub(crate) const SHAPE_FIELDS: &[&str] = &["title", "price", "language", "academicGrade", "tags"];

/// Multilingual title record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Title {
    /// Human-displayable title, always set and non-empty
    pub display: String,
    /// Latin-script variant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub english: Option<String>,
    /// Oriya-script variant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub odia: Option<String>,
}

impl Title {
    /// Read a nested title record
    ///
    /// # Errors
    /// - `MissingRequiredField` if `display` is absent or null
    /// - `InvalidField` if `display` is not a non-empty string
    pub fn from_nested(map: &Map<String, Value>) -> Result<Self, ModelError> {
        let display = match map.get("display") {
            None | Some(Value::Null) => {
                return Err(ModelError::MissingRequiredField {
                    field: "title.display",
                })
            }
            Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
            Some(Value::String(_)) => {
                return Err(ModelError::invalid("title.display", "must not be empty"))
            }
            Some(_) => return Err(ModelError::invalid("title.display", "must be a string")),
        };

        Ok(Self {
            display,
            english: non_empty_string(map.get("english")),
            odia: non_empty_string(map.get("odia")),
        })
    }

    /// Variant subfield that would be populated for `language`
    #[inline]
    #[must_use]
    pub fn variant(&self, language: Language) -> Option<&str> {
        match language {
            Language::English => self.english.as_deref(),
            Language::Odia => self.odia.as_deref(),
        }
    }
}

/// Structured price record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    /// List price
    pub original: f64,
    /// Selling price, equal to `original` when there is no discount
    pub discounted: f64,
    /// Percentage off `original`, 0 when there is no discount
    pub discount_percent: f64,
}

impl Price {
    /// Undiscounted price
    #[inline]
    #[must_use]
    pub fn flat(amount: f64) -> Self {
        Self {
            original: amount,
            discounted: amount,
            discount_percent: 0.0,
        }
    }

    /// Price with a discount, percent derived from the two amounts
    #[inline]
    #[must_use]
    pub fn discounted(original: f64, discounted: f64) -> Self {
        Self {
            original,
            discounted,
            discount_percent: discount_percent(original, discounted),
        }
    }

    /// Read a nested price record
    ///
    /// `discounted` defaults to `original`; `discountPercent` defaults to the
    /// value implied by the two amounts.
    ///
    /// # Errors
    /// - `MissingRequiredField` if `original` is absent or null
    /// - `InvalidField` if any amount is not a number
    pub fn from_nested(map: &Map<String, Value>) -> Result<Self, ModelError> {
        let original = match map.get("original") {
            None | Some(Value::Null) => {
                return Err(ModelError::MissingRequiredField {
                    field: "price.original",
                })
            }
            Some(v) => number(v, "price.original")?,
        };
        let discounted = match map.get("discounted") {
            None | Some(Value::Null) => original,
            Some(v) => number(v, "price.discounted")?,
        };
        let discount_percent = match map.get("discountPercent") {
            None | Some(Value::Null) => discount_percent(original, discounted),
            Some(v) => number(v, "price.discountPercent")?,
        };

        Ok(Self {
            original,
            discounted,
            discount_percent,
        })
    }

    /// Price a buyer pays
    #[inline]
    #[must_use]
    pub fn effective(&self) -> f64 {
        if self.has_discount() {
            self.discounted
        } else {
            self.original
        }
    }

    /// Discounted below the list price
    #[inline]
    #[must_use]
    pub fn has_discount(&self) -> bool {
        self.discounted < self.original
    }

    /// Check `original >= discounted >= 0` and the percent within tolerance
    ///
    /// # Errors
    /// `InvalidField` naming the first broken rule
    pub fn validate(&self) -> Result<(), ModelError> {
        for (field, value) in [
            ("price.original", self.original),
            ("price.discounted", self.discounted),
            ("price.discountPercent", self.discount_percent),
        ] {
            if !value.is_finite() {
                return Err(ModelError::invalid(field, "must be finite"));
            }
        }
        if self.original < 0.0 {
            return Err(ModelError::invalid("price.original", "must not be negative"));
        }
        if self.discounted < 0.0 {
            return Err(ModelError::invalid("price.discounted", "must not be negative"));
        }
        if self.original < self.discounted {
            return Err(ModelError::invalid(
                "price.discounted",
                format!(
                    "{} exceeds original price {}",
                    self.discounted, self.original
                ),
            ));
        }
        let expected = discount_percent(self.original, self.discounted);
        if (self.discount_percent - expected).abs() > DISCOUNT_PERCENT_TOLERANCE {
            return Err(ModelError::invalid(
                "price.discountPercent",
                format!("{} is inconsistent with expected {expected}", self.discount_percent),
            ));
        }
        Ok(())
    }
}

/// Allowed drift, in percentage points, between a stored `discountPercent`
/// and the one implied by the amounts
pub const DISCOUNT_PERCENT_TOLERANCE: f64 = 1.0;

/// Percentage off `original`, rounded to two decimals; 0 without a discount
#[must_use]
pub fn discount_percent(original: f64, discounted: f64) -> f64 {
    if original <= 0.0 || discounted >= original {
        return 0.0;
    }
    let percent = (original - discounted) / original * 100.0;
    (percent * 100.0).round() / 100.0
}

/// Catalog item in the flat legacy shape
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyItem {
    /// Document identifier
    pub id: ItemId,
    /// Flat title
    pub title: String,
    /// Flat price
    pub price: f64,
    /// Fields outside the flat title/price pair, `_id` included
    pub extra: Document,
}

impl LegacyItem {
    /// Serialize back into a stored document
    #[must_use]
    pub fn into_document(self) -> Document {
        let mut doc = self.extra;
        doc.entry(ID_FIELD)
            .or_insert_with(|| Value::String(self.id.as_str().to_string()));
        doc.insert("title".to_string(), Value::String(self.title));
        doc.insert("price".to_string(), json_number(self.price));
        doc
    }
}

/// Catalog item in the nested migrated shape
#[derive(Debug, Clone, PartialEq)]
pub struct MigratedItem {
    /// Document identifier
    pub id: ItemId,
    /// Multilingual title
    pub title: Title,
    /// Structured price
    pub price: Price,
    /// Content language
    pub language: Language,
    /// Academic grade, `null` when unknown
    pub academic_grade: Option<String>,
    /// Ordered tag set
    pub tags: IndexSet<String>,
    /// Fields outside the shape, `_id` included
    pub extra: Document,
}

impl MigratedItem {
    /// Serialize back into a stored document
    #[must_use]
    pub fn into_document(self) -> Document {
        let mut doc = self.extra;
        doc.entry(ID_FIELD)
            .or_insert_with(|| Value::String(self.id.as_str().to_string()));
        doc.insert("title".to_string(), title_value(&self.title));
        doc.insert("price".to_string(), price_value(&self.price));
        doc.insert(
            "language".to_string(),
            Value::String(self.language.as_str().to_string()),
        );
        doc.insert(
            "academicGrade".to_string(),
            self.academic_grade.map_or(Value::Null, Value::String),
        );
        doc.insert(
            "tags".to_string(),
            Value::Array(self.tags.into_iter().map(Value::String).collect()),
        );
        doc
    }
}

/// A catalog document resolved to exactly one shape
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogItem {
    /// Flat legacy shape
    Legacy(LegacyItem),
    /// Nested migrated shape
    Migrated(MigratedItem),
}

impl CatalogItem {
    /// Resolve a raw document into its shape variant
    ///
    /// # Errors
    /// - `Malformed` when the shape detector cannot classify the document
    /// - `MissingId` when the document has no usable `_id`
    /// - `MissingRequiredField` / `InvalidField` when a migrated record is broken
    /// - `InvalidField` when `language`, `academicGrade` or `tags` is present
    ///   with an unusable value, in either shape
    pub fn from_document(mut doc: Document) -> Result<Self, ModelError> {
        let id = ItemId::of(&doc);
        match detect(&doc) {
            Shape::Malformed => Err(ModelError::malformed(id, describe(&doc))),
            Shape::Legacy => {
                let id = id.ok_or(ModelError::MissingId)?;
                // migrated-only fields already present must be usable
                read_language(&doc)?;
                read_academic_grade(&doc)?;
                read_tags(&doc)?;
                let title = take_string(&mut doc, "title").unwrap_or_default();
                let price = doc.remove("price").and_then(|v| v.as_f64()).unwrap_or_default();
                Ok(CatalogItem::Legacy(LegacyItem {
                    id,
                    title,
                    price,
                    extra: doc,
                }))
            }
            Shape::Migrated => {
                let id = id.ok_or(ModelError::MissingId)?;
                let (Some(Value::Object(title)), Some(Value::Object(price))) =
                    (doc.get("title"), doc.get("price"))
                else {
                    return Err(ModelError::malformed(Some(id), describe(&doc)));
                };
                let title = Title::from_nested(title)?;
                let price = Price::from_nested(price)?;
                let language = read_language(&doc)?.unwrap_or_else(|| classify(&title.display));
                let academic_grade = read_academic_grade(&doc)?;
                let tags = read_tags(&doc)?.unwrap_or_default();
                strip_shape_fields(&mut doc);
                Ok(CatalogItem::Migrated(MigratedItem {
                    id,
                    title,
                    price,
                    language,
                    academic_grade,
                    tags,
                    extra: doc,
                }))
            }
        }
    }

    /// Shape of this item
    #[inline]
    #[must_use]
    pub fn shape(&self) -> Shape {
        match self {
            CatalogItem::Legacy(_) => Shape::Legacy,
            CatalogItem::Migrated(_) => Shape::Migrated,
        }
    }

    /// Document identifier
    #[inline]
    #[must_use]
    pub fn id(&self) -> &ItemId {
        match self {
            CatalogItem::Legacy(item) => &item.id,
            CatalogItem::Migrated(item) => &item.id,
        }
    }

    /// Serialize back into a stored document
    #[must_use]
    pub fn into_document(self) -> Document {
        match self {
            CatalogItem::Legacy(item) => item.into_document(),
            CatalogItem::Migrated(item) => item.into_document(),
        }
    }
}

pub(crate) fn title_value(title: &Title) -> Value {
    serde_json::to_value(title).unwrap_or(Value::Null)
}

pub(crate) fn price_value(price: &Price) -> Value {
    let mut map = Map::new();
    map.insert("original".to_string(), json_number(price.original));
    map.insert("discounted".to_string(), json_number(price.discounted));
    map.insert(
        "discountPercent".to_string(),
        json_number(price.discount_percent),
    );
    Value::Object(map)
}

/// Whole amounts are stored as integers so a legacy `100` stays `100`
pub(crate) fn json_number(amount: f64) -> Value {
    if amount.fract() == 0.0 && amount.abs() < 9.0e15 {
        Value::from(amount as i64)
    } else {
        serde_json::Number::from_f64(amount).map_or(Value::Null, Value::Number)
    }
}

pub(crate) fn number(value: &Value, field: &'static str) -> Result<f64, ModelError> {
    value
        .as_f64()
        .ok_or_else(|| ModelError::invalid(field, "must be a number"))
}

fn non_empty_string(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn take_string(doc: &mut Document, field: &str) -> Option<String> {
    match doc.remove(field)? {
        Value::String(s) => Some(s),
        _ => None,
    }
}

pub(crate) fn read_language(doc: &Document) -> Result<Option<Language>, ModelError> {
    match doc.get("language") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => s
            .parse()
            .map(Some)
            .map_err(|_| ModelError::invalid("language", format!("unknown language {s:?}"))),
        Some(_) => Err(ModelError::invalid("language", "must be a string")),
    }
}

pub(crate) fn read_academic_grade(doc: &Document) -> Result<Option<String>, ModelError> {
    match doc.get("academicGrade") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(_) => Err(ModelError::invalid(
            "academicGrade",
            "must be a string or a number",
        )),
    }
}

pub(crate) fn read_tags(doc: &Document) -> Result<Option<IndexSet<String>>, ModelError> {
    match doc.get("tags") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(values)) => values
            .iter()
            .map(|v| match v {
                Value::String(s) => Ok(s.clone()),
                _ => Err(ModelError::invalid("tags", "must contain only strings")),
            })
            .collect::<Result<IndexSet<_>, _>>()
            .map(Some),
        Some(_) => Err(ModelError::invalid("tags", "must be an array of strings")),
    }
}

pub(crate) fn strip_shape_fields(doc: &mut Document) {
    for field in SHAPE_FIELDS {
        doc.remove(*field);
    }
}
