//! Error types for catalog documents
//!
//! Covers:
//! - Documents whose shape cannot be classified
//! - Transform input missing a mandatory sub-field
//! - Field values that break the migrated-shape invariants

use crate::document::ItemId;

/// Errors raised while classifying or transforming a catalog document
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    /// Shape detector could not classify the document
    #[error("malformed document {}: {reason}", display_id(.id))]
    Malformed {
        /// Identifier, when the document carries one
        id: Option<ItemId>,
        /// What made the document unclassifiable
        reason: String,
    },

    /// A nested input lacks a mandatory sub-field; never defaulted
    #[error("missing required field: {field}")]
    MissingRequiredField {
        /// Dotted path of the missing field
        field: &'static str,
    },

    /// A field is present but holds an unusable value
    #[error("invalid field {field}: {reason}")]
    InvalidField {
        /// Dotted path of the offending field
        field: &'static str,
        /// Why the value was rejected
        reason: String,
    },

    /// Document carries no usable `_id`
    #[error("document has no usable _id")]
    MissingId,
}

impl ModelError {
    /// Create malformed-document error
    pub fn malformed(id: Option<ItemId>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            id,
            reason: reason.into(),
        }
    }

    /// Create invalid-field error
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }

    /// Check if this is a caller-side validation failure (as opposed to a
    /// stored document that cannot be classified)
    #[inline]
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingRequiredField { .. } | Self::InvalidField { .. } | Self::MissingId
        )
    }
}

fn display_id(id: &Option<ItemId>) -> String {
    id.as_ref()
        .map_or_else(|| "<no id>".to_string(), ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_display_includes_id() {
        let err = ModelError::malformed(Some(ItemId::new("x1")), "title is array");
        assert_eq!(err.to_string(), "malformed document x1: title is array");

        let err = ModelError::malformed(None, "title is missing");
        assert!(err.to_string().contains("<no id>"));
    }

    #[test]
    fn validation_classification() {
        assert!(ModelError::MissingRequiredField { field: "title.display" }.is_validation());
        assert!(ModelError::invalid("price", "negative").is_validation());
        assert!(!ModelError::malformed(None, "x").is_validation());
    }
}
