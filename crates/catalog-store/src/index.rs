//! Secondary index definitions kept in a store's index catalogue

use serde::{Deserialize, Serialize};

/// How a single field is indexed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IndexKind {
    /// Ordered single-field key
    Ascending,
    /// Full-text key
    Text,
}

/// One indexed field
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexKey {
    /// Dotted field path
    pub field: String,
    /// Key kind
    pub kind: IndexKind,
}

/// Full-text index language settings
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextOptions {
    /// Stemming language applied to every document
    pub default_language: String,
    /// Document field whose value overrides the stemming language per
    /// document; `None` means documents cannot select it
    pub language_override: Option<String>,
}

impl Default for TextOptions {
    /// The text engine's stock behaviour: english stemming, overridable by a
    /// document's own `language` field
    fn default() -> Self {
        Self {
            default_language: "english".to_string(),
            language_override: Some("language".to_string()),
        }
    }
}

impl TextOptions {
    /// No stemming and no per-document override
    #[inline]
    #[must_use]
    pub fn without_language_override() -> Self {
        Self {
            default_language: "none".to_string(),
            language_override: None,
        }
    }

    /// Field the text engine would read a per-document language from
    #[inline]
    #[must_use]
    pub fn override_field(&self) -> Option<&str> {
        self.language_override.as_deref()
    }
}

/// Index definition
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSpec {
    /// Index name, unique within the collection
    pub name: String,
    /// Indexed fields in order
    pub keys: Vec<IndexKey>,
    /// Only documents containing the field are indexed
    #[serde(default)]
    pub sparse: bool,
    /// Text settings, for indexes with text keys
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextOptions>,
}

impl IndexSpec {
    /// Single-field ascending index
    #[must_use]
    pub fn ascending(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            keys: vec![IndexKey {
                field: field.into(),
                kind: IndexKind::Ascending,
            }],
            sparse: false,
            text: None,
        }
    }

    /// Full-text index over several fields
    #[must_use]
    pub fn text<I, S>(name: impl Into<String>, fields: I, options: TextOptions) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            keys: fields
                .into_iter()
                .map(|field| IndexKey {
                    field: field.into(),
                    kind: IndexKind::Text,
                })
                .collect(),
            sparse: false,
            text: Some(options),
        }
    }

    /// Mark as sparse
    #[inline]
    #[must_use]
    pub fn sparse(mut self) -> Self {
        self.sparse = true;
        self
    }

    /// Has at least one text key
    #[inline]
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.keys.iter().any(|k| k.kind == IndexKind::Text)
    }

    /// Indexed field paths
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(|k| k.field.as_str())
    }
}

/// Result of an index catalogue operation that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum IndexOutcome {
    /// Index was created
    Created,
    /// An identical index already existed
    AlreadyExists,
    /// Index was dropped
    Dropped,
    /// No index with that name existed
    NotFound,
}
