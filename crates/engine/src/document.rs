//! The `Document` is an invoice or an estimate and owns one [`Section`] per
//! business vertical that has been used while editing it.

use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    BusinessVertical, DocumentKind, EngineError, InputField, MoneyCents, ResultEngine,
    ServiceEntry, quote_mode::Section,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for DocumentId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl TryFrom<&str> for DocumentId {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|_| {
                EngineError::validation(
                    InputField::DocumentId,
                    format!("{:?} is not a document id", value.trim()),
                )
            })
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Derived money figures of a document. Never stored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub subtotal: MoneyCents,
    pub tax: MoneyCents,
    pub total: MoneyCents,
}

#[derive(Debug)]
pub struct Document {
    pub id: DocumentId,
    pub kind: DocumentKind,
    pub client: Option<String>,
    /// Tax applied on top of the subtotal, in basis points.
    pub tax_rate_bps: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    vertical: BusinessVertical,
    sections: BTreeMap<BusinessVertical, Section>,
    dirty: bool,
}

impl Document {
    pub fn new(kind: DocumentKind, vertical: BusinessVertical) -> Self {
        let now = Utc::now();
        let id = DocumentId::generate();
        let mut sections = BTreeMap::new();
        sections.insert(vertical, Section::new(id, vertical));
        Self {
            id,
            kind,
            client: None,
            tax_rate_bps: 0,
            created_at: now,
            updated_at: now,
            vertical,
            sections,
            dirty: true,
        }
    }

    pub(crate) fn from_parts(
        id: DocumentId,
        kind: DocumentKind,
        vertical: BusinessVertical,
        sections: BTreeMap<BusinessVertical, Section>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            kind,
            client: None,
            tax_rate_bps: 0,
            created_at,
            updated_at,
            vertical,
            sections,
            dirty: false,
        }
    }

    /// The vertical currently being edited.
    pub fn vertical(&self) -> BusinessVertical {
        self.vertical
    }

    /// Selects the vertical being edited. Returns `true` when it changed.
    ///
    /// Sections stay separate: the other vertical's lines, mode and stash are
    /// left exactly as they were.
    pub fn set_vertical(&mut self, vertical: BusinessVertical) -> bool {
        if self.vertical == vertical {
            return false;
        }
        self.vertical = vertical;
        self.section_mut(vertical);
        true
    }

    pub fn section(&self, vertical: BusinessVertical) -> Option<&Section> {
        self.sections.get(&vertical)
    }

    /// The section for `vertical`, created on first use.
    pub fn section_mut(&mut self, vertical: BusinessVertical) -> &mut Section {
        let id = self.id;
        self.sections
            .entry(vertical)
            .or_insert_with(|| Section::new(id, vertical))
    }

    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.values()
    }

    /// All live lines, concrete section first, each in display order.
    pub fn services(&self) -> impl Iterator<Item = &ServiceEntry> {
        self.sections
            .values()
            .flat_map(|section| section.ledger().entries())
    }

    /// Subtotal over every section, tax and grand total. Fails when a
    /// figure does not fit in [`MoneyCents`].
    pub fn totals(&self) -> ResultEngine<Totals> {
        let too_large =
            || EngineError::validation(InputField::Amount, "document total is too large");
        let subtotal = MoneyCents::checked_sum(
            self.sections
                .values()
                .map(|section| section.ledger().total()),
        )
        .ok_or_else(too_large)?;
        let tax = subtotal
            .checked_mul_bps(self.tax_rate_bps)
            .ok_or_else(too_large)?;
        let total = subtotal.checked_add(tax).ok_or_else(too_large)?;
        Ok(Totals {
            subtotal,
            tax,
            total,
        })
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
        self.dirty = true;
    }

    pub(crate) fn mark_saved(&mut self) {
        self.dirty = false;
    }
}
