//! Small enums shared by every component: the document kind, the business
//! vertical and the quote mode.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::{EngineError, InputField};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Invoice,
    Estimate,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 2] = [Self::Invoice, Self::Estimate];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Invoice => "invoice",
            Self::Estimate => "estimate",
        }
    }

    /// Store key of the collection holding documents of this kind.
    pub fn collection_key(self) -> &'static str {
        match self {
            Self::Invoice => "invoices",
            Self::Estimate => "estimates",
        }
    }
}

impl TryFrom<&str> for DocumentKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "invoice" | "invoices" => Ok(Self::Invoice),
            "estimate" | "estimates" => Ok(Self::Estimate),
            other => Err(EngineError::validation(
                InputField::DocumentKind,
                format!("unknown document kind: {other}"),
            )),
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Business category. Each vertical keeps its own ledger, quote mode and
/// calculator state inside a document.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum BusinessVertical {
    #[default]
    Concrete,
    Masonry,
}

impl BusinessVertical {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Concrete => "concrete",
            Self::Masonry => "masonry",
        }
    }
}

impl TryFrom<&str> for BusinessVertical {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "concrete" => Ok(Self::Concrete),
            "masonry" => Ok(Self::Masonry),
            other => Err(EngineError::validation(
                InputField::Vertical,
                format!("unknown business vertical: {other}"),
            )),
        }
    }
}

impl fmt::Display for BusinessVertical {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pricing strategy of a vertical section.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum QuoteMode {
    /// Multiple priced lines.
    #[default]
    Itemized,
    /// A single lump-sum line.
    Custom,
}

impl QuoteMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Itemized => "itemized",
            Self::Custom => "custom",
        }
    }
}

impl TryFrom<&str> for QuoteMode {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "itemized" => Ok(Self::Itemized),
            "custom" => Ok(Self::Custom),
            other => Err(EngineError::validation(
                InputField::QuoteMode,
                format!("unknown quote mode: {other}"),
            )),
        }
    }
}

impl fmt::Display for QuoteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
