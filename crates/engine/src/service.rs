//! The module contains [`ServiceEntry`], one billable line of a document.
//!
//! An entry is priced either per unit (`quantity * rate`) or as a flat
//! amount. Its amount is always derived from the pricing shape and is always
//! strictly positive: the constructors are the only way in and they refuse
//! anything else.

use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    BusinessVertical, EngineError, InputField, MoneyCents, Quantity, ResultEngine,
    parsing::{Description, DescriptionRule, normalize_description},
};

const CUSTOM_QUOTE_PREFIX: &str = "custom-quote-";
const DEFAULT_UNIT: &str = "ea";

/// Identifier of a service entry, unique inside its document.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceId(String);

impl ServiceId {
    /// A fresh identifier. Never reuses a removed one.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// The reserved identifier of the single lump-sum line a section holds
    /// while in custom mode.
    pub fn custom_quote(vertical: BusinessVertical) -> Self {
        Self(format!("{CUSTOM_QUOTE_PREFIX}{vertical}"))
    }

    pub fn is_custom_quote(&self) -> bool {
        self.0.starts_with(CUSTOM_QUOTE_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ServiceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ServiceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "pricing", rename_all = "snake_case")]
pub enum PricingShape {
    Itemized {
        quantity: Quantity,
        unit: String,
        rate: MoneyCents,
    },
    Custom {
        flat_amount: MoneyCents,
    },
}

impl PricingShape {
    fn amount(&self) -> Option<MoneyCents> {
        match self {
            Self::Itemized { quantity, rate, .. } => rate.checked_mul_quantity(*quantity),
            Self::Custom { flat_amount } => Some(*flat_amount),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEntry {
    pub id: ServiceId,
    pub vertical: BusinessVertical,
    pub description: Description,
    #[serde(flatten)]
    pub pricing: PricingShape,
    pub created_at: DateTime<Utc>,
}

impl ServiceEntry {
    /// The billed amount: `quantity * rate` or the flat amount.
    pub fn amount(&self) -> MoneyCents {
        // Construction and loading both reject shapes that overflow.
        self.pricing.amount().unwrap_or(MoneyCents::ZERO)
    }

    pub fn is_itemized(&self) -> bool {
        matches!(self.pricing, PricingShape::Itemized { .. })
    }

    pub fn is_custom_quote(&self) -> bool {
        self.id.is_custom_quote()
    }

    /// Re-stamps the entry with the reserved custom-quote id of its vertical.
    pub(crate) fn into_custom_quote(mut self) -> Self {
        self.id = ServiceId::custom_quote(self.vertical);
        self
    }

    /// Checks an entry that did not come through the constructors (e.g. one
    /// read back from the store).
    pub(crate) fn validate(&self) -> ResultEngine<()> {
        let amount = self.pricing.amount().ok_or_else(|| {
            EngineError::validation(InputField::Amount, "amount is too large")
        })?;
        if !amount.is_positive() {
            return Err(EngineError::validation(
                InputField::Amount,
                format!("service {} has a non-positive amount", self.id),
            ));
        }
        Ok(())
    }
}

/// Builds a per-unit priced entry.
pub fn build_itemized(
    vertical: BusinessVertical,
    description: &str,
    quantity: Quantity,
    unit: &str,
    rate: MoneyCents,
) -> ResultEngine<ServiceEntry> {
    let description = normalize_description(description, DescriptionRule::Required)?;
    if !quantity.is_positive() {
        return Err(EngineError::validation(
            InputField::Quantity,
            "quantity must be > 0",
        ));
    }
    if !rate.is_positive() {
        return Err(EngineError::validation(InputField::Rate, "rate must be > 0"));
    }
    let unit = match unit.trim() {
        "" => DEFAULT_UNIT.to_string(),
        unit => unit.to_string(),
    };
    let pricing = PricingShape::Itemized {
        quantity,
        unit,
        rate,
    };
    if pricing.amount().is_none() {
        return Err(EngineError::validation(
            InputField::Amount,
            "amount is too large",
        ));
    }

    Ok(ServiceEntry {
        id: ServiceId::generate(),
        vertical,
        description,
        pricing,
        created_at: Utc::now(),
    })
}

/// Builds a flat-amount entry.
pub fn build_custom(
    vertical: BusinessVertical,
    description: &str,
    flat_amount: MoneyCents,
) -> ResultEngine<ServiceEntry> {
    let description = normalize_description(description, DescriptionRule::Required)?;
    if !flat_amount.is_positive() {
        return Err(EngineError::validation(
            InputField::Amount,
            "amount must be > 0",
        ));
    }

    Ok(ServiceEntry {
        id: ServiceId::generate(),
        vertical,
        description,
        pricing: PricingShape::Custom { flat_amount },
        created_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn itemized_amount_is_quantity_times_rate() {
        let entry = build_itemized(
            BusinessVertical::Concrete,
            "Driveway leveling",
            Quantity::whole(120),
            "sqft",
            MoneyCents::new(4_50),
        )
        .unwrap();
        assert_eq!(entry.amount(), MoneyCents::new(540_00));
        assert!(entry.is_itemized());
        assert!(!entry.is_custom_quote());
    }

    #[test]
    fn custom_amount_is_flat_amount() {
        let entry = build_custom(
            BusinessVertical::Masonry,
            "Chimney rebuild",
            MoneyCents::new(2_800_00),
        )
        .unwrap();
        assert_eq!(entry.amount(), MoneyCents::new(2_800_00));
        assert_eq!(entry.vertical, BusinessVertical::Masonry);
    }

    #[test]
    fn constructors_reject_non_positive_inputs() {
        let v = BusinessVertical::Concrete;
        let err = build_itemized(v, "", Quantity::whole(1), "ea", MoneyCents::new(1)).unwrap_err();
        assert_eq!(err.field(), Some(InputField::Description));
        let err = build_itemized(v, "Slab", Quantity::ZERO, "ea", MoneyCents::new(1)).unwrap_err();
        assert_eq!(err.field(), Some(InputField::Quantity));
        let err = build_itemized(v, "Slab", Quantity::whole(1), "ea", MoneyCents::new(-5))
            .unwrap_err();
        assert_eq!(err.field(), Some(InputField::Rate));
        let err = build_custom(v, "Slab", MoneyCents::ZERO).unwrap_err();
        assert_eq!(err.field(), Some(InputField::Amount));
    }

    #[test]
    fn ids_are_fresh() {
        let v = BusinessVertical::Concrete;
        let a = build_custom(v, "Slab", MoneyCents::new(1)).unwrap();
        let b = build_custom(v, "Slab", MoneyCents::new(1)).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn empty_unit_defaults() {
        let entry = build_itemized(
            BusinessVertical::Concrete,
            "Crack fill",
            Quantity::whole(2),
            "  ",
            MoneyCents::new(75_00),
        )
        .unwrap();
        assert!(matches!(entry.pricing, PricingShape::Itemized { ref unit, .. } if unit == "ea"));
    }

    #[test]
    fn custom_quote_id_is_per_vertical() {
        let concrete = ServiceId::custom_quote(BusinessVertical::Concrete);
        let masonry = ServiceId::custom_quote(BusinessVertical::Masonry);
        assert_ne!(concrete, masonry);
        assert!(concrete.is_custom_quote());
        assert!(!ServiceId::generate().is_custom_quote());
    }

    #[test]
    fn serialized_entry_keeps_shape_and_newlines() {
        let entry = build_custom(
            BusinessVertical::Masonry,
            "Chimney rebuild, 3 courses\nTuckpoint front face",
            MoneyCents::new(2_800_00),
        )
        .unwrap();
        let json = serde_json::to_string(&entry).unwrap();
        let back: ServiceEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
        assert!(json.contains("\"pricing\":\"custom\""));
    }
}
