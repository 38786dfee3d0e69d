//! Price sources for calculator-assisted lines.
//!
//! A calculator proposes three tiers for an area; the operator picks one or
//! types a figure. The engine only ever consumes the single chosen amount.

use serde::{Deserialize, Serialize};

use crate::{MoneyCents, Quantity};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceTiers {
    pub low: MoneyCents,
    pub mid: MoneyCents,
    pub high: MoneyCents,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PriceChoice {
    Low,
    Mid,
    High,
    /// Operator-typed figure.
    Custom(MoneyCents),
}

impl PriceChoice {
    pub fn resolve(self, tiers: &PriceTiers) -> MoneyCents {
        match self {
            Self::Low => tiers.low,
            Self::Mid => tiers.mid,
            Self::High => tiers.high,
            Self::Custom(amount) => amount,
        }
    }
}

pub trait PriceSource {
    fn tiers(&self, area: Quantity) -> PriceTiers;
}

/// Per-square-foot pricing used for concrete leveling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SquareFootCalculator {
    pub low_rate: MoneyCents,
    pub mid_rate: MoneyCents,
    pub high_rate: MoneyCents,
}

impl Default for SquareFootCalculator {
    fn default() -> Self {
        Self {
            low_rate: MoneyCents::new(3_00),
            mid_rate: MoneyCents::new(4_50),
            high_rate: MoneyCents::new(6_00),
        }
    }
}

impl PriceSource for SquareFootCalculator {
    fn tiers(&self, area: Quantity) -> PriceTiers {
        let price = |rate: MoneyCents| rate.checked_mul_quantity(area).unwrap_or(MoneyCents::ZERO);
        PriceTiers {
            low: price(self.low_rate),
            mid: price(self.mid_rate),
            high: price(self.high_rate),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_foot_tiers() {
        let tiers = SquareFootCalculator::default().tiers(Quantity::whole(120));
        assert_eq!(tiers.low, MoneyCents::new(360_00));
        assert_eq!(tiers.mid, MoneyCents::new(540_00));
        assert_eq!(tiers.high, MoneyCents::new(720_00));
        assert_eq!(PriceChoice::Mid.resolve(&tiers), MoneyCents::new(540_00));
        assert_eq!(
            PriceChoice::Custom(MoneyCents::new(499_00)).resolve(&tiers),
            MoneyCents::new(499_00)
        );
    }
}
