//! The module contains the errors the engine can throw.
//!
//! The errors are:
//!
//! - [`Validation`] thrown when operator input breaks a business rule. It
//!   names the offending form field so the caller can attach the message to it.
//! - [`Conflict`] thrown when an entry (or a calculator price) targets a ledger
//!   of another vertical.
//! - [`Persistence`] thrown when the store refuses a write or holds unreadable
//!   data.
//! - [`KeyNotFound`] thrown when a document is not found or no document is
//!   open for the routed view.
//!
//! No failing operation mutates a ledger.
//!
//!  [`Validation`]: EngineError::Validation
//!  [`Conflict`]: EngineError::Conflict
//!  [`Persistence`]: EngineError::Persistence
//!  [`KeyNotFound`]: EngineError::KeyNotFound
use core::fmt;

use thiserror::Error;

/// Form field a validation failure is tied to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputField {
    Description,
    Quantity,
    Rate,
    Amount,
    QuoteMode,
    DocumentKind,
    DocumentId,
    Vertical,
}

impl InputField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Description => "description",
            Self::Quantity => "quantity",
            Self::Rate => "rate",
            Self::Amount => "amount",
            Self::QuoteMode => "quote_mode",
            Self::DocumentKind => "document_kind",
            Self::DocumentId => "document_id",
            Self::Vertical => "vertical",
        }
    }
}

impl fmt::Display for InputField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Engine custom errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Invalid {field}: {reason}")]
    Validation { field: InputField, reason: String },
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Persistence failure: {0}")]
    Persistence(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
}

impl EngineError {
    pub(crate) fn validation(field: InputField, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Returns `true` for operator-recoverable input errors.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// The form field to highlight, if any.
    #[must_use]
    pub fn field(&self) -> Option<InputField> {
        match self {
            Self::Validation { field, .. } => Some(*field),
            _ => None,
        }
    }
}
