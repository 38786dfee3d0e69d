//! Command structs for operator actions.
//!
//! These types group the inputs of each ledger action so call sites stay
//! readable. The `from_form` constructors take raw form text and run it
//! through the lenient parsers; validation happens when the command runs.

use std::collections::BTreeSet;

use crate::{
    BusinessVertical, ModeTransition, MoneyCents, Quantity, QuoteMode, ServiceId,
    context::SelectedPrice,
    parsing::{parse_currency, parse_quantity},
};

/// Add a per-unit priced line to the active section.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddItemizedCmd {
    pub description: String,
    pub quantity: Quantity,
    pub unit: String,
    pub rate: MoneyCents,
}

impl AddItemizedCmd {
    #[must_use]
    pub fn new(
        description: impl Into<String>,
        quantity: Quantity,
        unit: impl Into<String>,
        rate: MoneyCents,
    ) -> Self {
        Self {
            description: description.into(),
            quantity,
            unit: unit.into(),
            rate,
        }
    }

    #[must_use]
    pub fn from_form(description: &str, quantity: &str, unit: &str, rate: &str) -> Self {
        Self::new(description, parse_quantity(quantity), unit, parse_currency(rate))
    }
}

/// Add a flat-amount line, or set the custom quote when the section is in
/// custom mode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddCustomCmd {
    pub description: String,
    pub amount: MoneyCents,
}

impl AddCustomCmd {
    #[must_use]
    pub fn new(description: impl Into<String>, amount: MoneyCents) -> Self {
        Self {
            description: description.into(),
            amount,
        }
    }

    #[must_use]
    pub fn from_form(description: &str, amount: &str) -> Self {
        Self::new(description, parse_currency(amount))
    }
}

/// Add a line priced by the calculator selection made in the current
/// section session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddCalculatedCmd {
    pub description: String,
    pub price: SelectedPrice,
}

impl AddCalculatedCmd {
    #[must_use]
    pub fn new(description: impl Into<String>, price: SelectedPrice) -> Self {
        Self {
            description: description.into(),
            price,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    AddItemized(AddItemizedCmd),
    AddCustom(AddCustomCmd),
    AddCalculated(AddCalculatedCmd),
    Remove(ServiceId),
    SwitchMode {
        vertical: BusinessVertical,
        mode: QuoteMode,
    },
}

impl Command {
    pub fn label(&self) -> &'static str {
        match self {
            Self::AddItemized(_) => "add_itemized",
            Self::AddCustom(_) => "add_custom",
            Self::AddCalculated(_) => "add_calculated",
            Self::Remove(_) => "remove",
            Self::SwitchMode { .. } => "switch_mode",
        }
    }
}

/// One operator action (a click). A token runs at most one command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ActionToken(pub(crate) u64);

/// Spent tokens above `floor` that are kept individually. Beyond this many
/// the oldest still-unspent tokens are given up and count as spent.
const OPEN_TOKEN_WINDOW: usize = 256;

/// Tracks which tokens were used in bounded memory.
///
/// Tokens are issued in increasing order, so every token at or below `floor`
/// counts as spent and only the ones spent out of order above it are stored.
#[derive(Debug, Default)]
pub(crate) struct SpentTokens {
    floor: u64,
    above: BTreeSet<u64>,
}

impl SpentTokens {
    /// Marks `token` as spent. Returns `false` if it already was.
    pub(crate) fn spend(&mut self, token: ActionToken) -> bool {
        if token.0 <= self.floor || !self.above.insert(token.0) {
            return false;
        }
        while self.above.len() > OPEN_TOKEN_WINDOW {
            if let Some(lowest) = self.above.pop_first() {
                self.floor = lowest;
            }
        }
        while self.above.remove(&(self.floor + 1)) {
            self.floor += 1;
        }
        true
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.above.len()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Added(ServiceId),
    /// `true` when a line was actually removed.
    Removed(bool),
    ModeSwitched(ModeTransition),
    /// The token was already used; nothing happened.
    Duplicate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_order_tokens_keep_nothing_around() {
        let mut spent = SpentTokens::default();
        for n in 1..=1_000 {
            assert!(spent.spend(ActionToken(n)));
        }
        assert_eq!(spent.tracked(), 0);
        assert!(!spent.spend(ActionToken(1)));
        assert!(!spent.spend(ActionToken(1_000)));
        assert!(spent.spend(ActionToken(1_001)));
    }

    #[test]
    fn out_of_order_tokens_are_bounded() {
        let mut spent = SpentTokens::default();
        // Token 1 is issued but never submitted.
        for n in 2..=1_000 {
            assert!(spent.spend(ActionToken(n)));
            assert!(spent.tracked() <= OPEN_TOKEN_WINDOW);
        }
        assert!(!spent.spend(ActionToken(500)));
        assert!(!spent.spend(ActionToken(1_000)));
        // Abandoned long ago, so it counts as spent.
        assert!(!spent.spend(ActionToken(1)));
        assert_eq!(spent.tracked(), 0);
    }

    #[test]
    fn late_token_inside_the_window_still_runs() {
        let mut spent = SpentTokens::default();
        assert!(spent.spend(ActionToken(2)));
        assert!(spent.spend(ActionToken(3)));
        assert_eq!(spent.tracked(), 2);
        assert!(spent.spend(ActionToken(1)));
        assert_eq!(spent.tracked(), 0);
        assert!(!spent.spend(ActionToken(2)));
    }

    #[test]
    fn form_input_is_parsed_leniently() {
        let cmd = AddItemizedCmd::from_form("Driveway leveling", "120", "sqft", "$4.50");
        assert_eq!(cmd.quantity, Quantity::whole(120));
        assert_eq!(cmd.rate, MoneyCents::new(4_50));

        let cmd = AddCustomCmd::from_form("Chimney", "two thousand");
        assert_eq!(cmd.amount, MoneyCents::ZERO);
    }
}
