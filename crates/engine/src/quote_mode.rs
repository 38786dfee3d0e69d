//! Quote-mode state machine of one vertical section.
//!
//! A section is either `Itemized` (any number of priced lines) or `Custom`
//! (one lump-sum line under the reserved custom-quote id). Switching to
//! `Custom` moves the itemized lines aside into the stash; switching back
//! drops the lump sum and restores the stash in its original order.
//!
//! The stash is only filled on the way out of `Itemized` and only drained on
//! the way back in, so rapid toggling never duplicates or loses lines.

use std::collections::HashSet;

use crate::{
    BusinessVertical, DocumentId, EngineError, InputField, Ledger, QuoteMode, ResultEngine,
    ServiceEntry, ServiceId,
};

/// What a call to [`Section::switch_mode`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeTransition {
    /// Already in the requested mode.
    Unchanged,
    /// Entered custom mode; `stashed` lines were moved aside.
    Stashed { stashed: usize },
    /// Back to itemized; `restored` lines are live again.
    Restored { restored: usize },
}

#[derive(Debug)]
pub struct Section {
    mode: QuoteMode,
    ledger: Ledger,
    stash: Vec<ServiceEntry>,
}

impl Section {
    pub fn new(document_id: DocumentId, vertical: BusinessVertical) -> Self {
        Self {
            mode: QuoteMode::Itemized,
            ledger: Ledger::new(document_id, vertical),
            stash: Vec::new(),
        }
    }

    /// Rebuilds a stored section, refusing shapes no edit can produce: a
    /// custom section holds at most its own quote, an itemized one holds no
    /// quote and no stash, and stashed lines are never also live.
    pub(crate) fn restore(
        document_id: DocumentId,
        vertical: BusinessVertical,
        mode: QuoteMode,
        services: Vec<ServiceEntry>,
        stash: Vec<ServiceEntry>,
    ) -> ResultEngine<Self> {
        let corrupt = |what: &str| -> ResultEngine<Self> {
            Err(EngineError::Persistence(format!(
                "{mode} {vertical} section {what}"
            )))
        };
        let ledger = Ledger::from_entries(document_id, vertical, services)?;
        for entry in &stash {
            ledger.check_admissible(entry)?;
        }

        let quote_id = ServiceId::custom_quote(vertical);
        match mode {
            QuoteMode::Itemized if !stash.is_empty() => {
                return corrupt("holds stashed services");
            }
            QuoteMode::Itemized if ledger.entries().iter().any(ServiceEntry::is_custom_quote) => {
                return corrupt("holds a custom quote");
            }
            QuoteMode::Custom if ledger.entries().iter().any(|e| e.id != quote_id) => {
                return corrupt("holds lines other than its custom quote");
            }
            _ => {}
        }
        if stash.iter().any(ServiceEntry::is_custom_quote) {
            return corrupt("stashed a custom quote");
        }

        let mut seen = HashSet::new();
        let all_ids = ledger.entries().iter().chain(&stash).map(|e| &e.id);
        for id in all_ids {
            if !seen.insert(id) {
                return corrupt(&format!("lists service {id} twice"));
            }
        }

        Ok(Self {
            mode,
            ledger,
            stash,
        })
    }

    pub fn mode(&self) -> QuoteMode {
        self.mode
    }

    pub fn vertical(&self) -> BusinessVertical {
        self.ledger.vertical()
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut Ledger {
        &mut self.ledger
    }

    pub fn stash(&self) -> &[ServiceEntry] {
        &self.stash
    }

    /// The lump-sum line, if one is set.
    pub fn custom_quote(&self) -> Option<&ServiceEntry> {
        self.ledger.entries().iter().find(|e| e.is_custom_quote())
    }

    /// Adds a per-unit priced line. Refused while a custom quote is active.
    pub fn add_itemized(&mut self, entry: ServiceEntry) -> ResultEngine<ServiceId> {
        if self.mode == QuoteMode::Custom {
            return Err(EngineError::validation(
                InputField::QuoteMode,
                "switch back to itemized pricing to add line items",
            ));
        }
        reject_reserved_id(&entry)?;
        let id = entry.id.clone();
        self.ledger.add(entry)?;
        Ok(id)
    }

    /// Adds a flat-amount line.
    ///
    /// In itemized mode it is appended like any other line. In custom mode
    /// it becomes the section's single custom quote, replacing the previous
    /// one.
    pub fn add_flat(&mut self, entry: ServiceEntry) -> ResultEngine<ServiceId> {
        match self.mode {
            QuoteMode::Itemized => {
                reject_reserved_id(&entry)?;
                let id = entry.id.clone();
                self.ledger.add(entry)?;
                Ok(id)
            }
            QuoteMode::Custom => {
                let entry = entry.into_custom_quote();
                let id = entry.id.clone();
                self.ledger.upsert(entry)?;
                Ok(id)
            }
        }
    }

    pub fn switch_mode(&mut self, mode: QuoteMode) -> ResultEngine<ModeTransition> {
        let transition = match (self.mode, mode) {
            (QuoteMode::Itemized, QuoteMode::Custom) => self.enter_custom()?,
            (QuoteMode::Custom, QuoteMode::Itemized) => self.enter_itemized()?,
            _ => ModeTransition::Unchanged,
        };
        self.mode = mode;
        tracing::debug!(
            "{} section of document {} now {}: {:?}",
            self.vertical(),
            self.ledger.document_id(),
            mode,
            transition
        );
        Ok(transition)
    }

    fn enter_custom(&mut self) -> ResultEngine<ModeTransition> {
        let (quotes, displaced): (Vec<_>, Vec<_>) = self
            .ledger
            .entries()
            .iter()
            .cloned()
            .partition(ServiceEntry::is_custom_quote);
        self.ledger.replace_all(quotes)?;

        let stashed = displaced.len();
        if self.stash.is_empty() {
            self.stash = displaced;
        } else {
            // Never overwrite a populated stash; only add lines it lacks.
            for entry in displaced {
                if !self.stash.iter().any(|kept| kept.id == entry.id) {
                    self.stash.push(entry);
                }
            }
        }
        Ok(ModeTransition::Stashed { stashed })
    }

    fn enter_itemized(&mut self) -> ResultEngine<ModeTransition> {
        let mut restored = self.stash.clone();
        for entry in self.ledger.entries() {
            if !entry.is_custom_quote() && !restored.iter().any(|kept| kept.id == entry.id) {
                restored.push(entry.clone());
            }
        }
        let count = restored.len();
        self.ledger.replace_all(restored)?;
        self.stash.clear();
        Ok(ModeTransition::Restored { restored: count })
    }
}

/// The custom-quote id only ever enters a ledger through custom mode.
fn reject_reserved_id(entry: &ServiceEntry) -> ResultEngine<()> {
    if entry.is_custom_quote() {
        return Err(EngineError::Conflict(format!(
            "{} is reserved for the custom quote",
            entry.id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MoneyCents, build_custom};

    fn section(vertical: BusinessVertical) -> Section {
        Section::new(DocumentId::generate(), vertical)
    }

    fn flat(vertical: BusinessVertical, cents: i64) -> ServiceEntry {
        build_custom(vertical, "Lump sum work", MoneyCents::new(cents)).unwrap()
    }

    fn ids(entries: &[ServiceEntry]) -> Vec<ServiceId> {
        entries.iter().map(|e| e.id.clone()).collect()
    }

    #[test]
    fn round_trip_restores_entries() {
        let v = BusinessVertical::Concrete;
        let mut section = section(v);
        section.add_itemized(flat(v, 100)).unwrap();
        section.add_itemized(flat(v, 250)).unwrap();
        let original = section.ledger().entries().to_vec();

        assert_eq!(
            section.switch_mode(QuoteMode::Custom).unwrap(),
            ModeTransition::Stashed { stashed: 2 }
        );
        assert!(section.ledger().is_empty());
        assert_eq!(section.stash(), original.as_slice());

        assert_eq!(
            section.switch_mode(QuoteMode::Itemized).unwrap(),
            ModeTransition::Restored { restored: 2 }
        );
        assert_eq!(section.ledger().entries(), original.as_slice());
        assert!(section.stash().is_empty());
    }

    #[test]
    fn second_custom_quote_overwrites_first() {
        let v = BusinessVertical::Masonry;
        let mut section = section(v);
        section.switch_mode(QuoteMode::Custom).unwrap();
        section.add_flat(flat(v, 1_000)).unwrap();
        section.add_flat(flat(v, 2_000)).unwrap();

        assert_eq!(section.ledger().len(), 1);
        let quote = section.custom_quote().unwrap();
        assert_eq!(quote.amount(), MoneyCents::new(2_000));
        assert_eq!(quote.id, ServiceId::custom_quote(v));
    }

    #[test]
    fn toggle_and_restore_drops_the_custom_quote() {
        let v = BusinessVertical::Concrete;
        let mut section = section(v);
        section.add_itemized(flat(v, 100_00)).unwrap();
        section.add_itemized(flat(v, 250_00)).unwrap();
        let original = section.ledger().entries().to_vec();

        section.switch_mode(QuoteMode::Custom).unwrap();
        section.add_flat(flat(v, 500_00)).unwrap();
        assert_eq!(section.ledger().total(), MoneyCents::new(500_00));

        section.switch_mode(QuoteMode::Itemized).unwrap();
        assert_eq!(section.ledger().entries(), original.as_slice());
        assert_eq!(section.ledger().total(), MoneyCents::new(350_00));
    }

    #[test]
    fn rapid_toggling_keeps_stash_intact() {
        let v = BusinessVertical::Concrete;
        let mut section = section(v);
        section.add_itemized(flat(v, 100)).unwrap();
        section.add_itemized(flat(v, 200)).unwrap();
        let original = ids(section.ledger().entries());

        section.switch_mode(QuoteMode::Custom).unwrap();
        assert_eq!(
            section.switch_mode(QuoteMode::Custom).unwrap(),
            ModeTransition::Unchanged
        );
        section.switch_mode(QuoteMode::Itemized).unwrap();
        section.switch_mode(QuoteMode::Custom).unwrap();
        assert_eq!(ids(section.stash()), original);
        section.switch_mode(QuoteMode::Itemized).unwrap();

        assert_eq!(ids(section.ledger().entries()), original);
        assert!(section.stash().is_empty());
    }

    #[test]
    fn itemized_lines_refused_in_custom_mode() {
        let v = BusinessVertical::Concrete;
        let mut section = section(v);
        section.switch_mode(QuoteMode::Custom).unwrap();
        let err = section.add_itemized(flat(v, 100)).unwrap_err();
        assert_eq!(err.field(), Some(InputField::QuoteMode));
        assert!(section.ledger().is_empty());
    }

    #[test]
    fn flat_lines_append_in_itemized_mode() {
        let v = BusinessVertical::Concrete;
        let mut section = section(v);
        section.add_flat(flat(v, 100)).unwrap();
        section.add_flat(flat(v, 200)).unwrap();
        assert_eq!(section.ledger().len(), 2);
        assert!(section.custom_quote().is_none());
    }

    #[test]
    fn empty_stash_leaves_ledger_empty() {
        let v = BusinessVertical::Masonry;
        let mut section = section(v);
        section.switch_mode(QuoteMode::Custom).unwrap();
        section.add_flat(flat(v, 900)).unwrap();
        assert_eq!(
            section.switch_mode(QuoteMode::Itemized).unwrap(),
            ModeTransition::Restored { restored: 0 }
        );
        assert!(section.ledger().is_empty());
    }

    #[test]
    fn custom_quote_for_other_vertical_is_a_conflict() {
        let mut section = section(BusinessVertical::Masonry);
        section.switch_mode(QuoteMode::Custom).unwrap();
        section
            .add_flat(flat(BusinessVertical::Masonry, 900))
            .unwrap();
        let err = section
            .add_flat(flat(BusinessVertical::Concrete, 100))
            .unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(section.ledger().total(), MoneyCents::new(900));
    }

    #[test]
    fn replacing_the_custom_quote_notifies_once() {
        use std::{cell::RefCell, rc::Rc};

        use crate::{ChangeReason, LedgerChange};

        let v = BusinessVertical::Masonry;
        let mut section = section(v);
        section.switch_mode(QuoteMode::Custom).unwrap();
        section.add_flat(flat(v, 1_000)).unwrap();

        let seen: Rc<RefCell<Vec<(ChangeReason, bool)>>> = Rc::default();
        let sink = Rc::clone(&seen);
        section
            .ledger_mut()
            .subscribe(Rc::new(move |change: &LedgerChange<'_>| {
                sink.borrow_mut()
                    .push((change.reason.clone(), change.is_empty()));
            }));
        section.add_flat(flat(v, 2_000)).unwrap();

        assert_eq!(
            seen.borrow().as_slice(),
            &[(ChangeReason::Updated(ServiceId::custom_quote(v)), false)]
        );
    }

    #[test]
    fn reserved_id_cannot_enter_as_a_plain_line() {
        let v = BusinessVertical::Concrete;
        let mut section = section(v);
        let mut entry = flat(v, 100);
        entry.id = ServiceId::custom_quote(v);
        assert!(section.add_flat(entry.clone()).unwrap_err().is_conflict());
        assert!(section.add_itemized(entry).unwrap_err().is_conflict());
        assert!(section.ledger().is_empty());
    }

    fn restore(
        mode: QuoteMode,
        services: Vec<ServiceEntry>,
        stash: Vec<ServiceEntry>,
    ) -> ResultEngine<Section> {
        Section::restore(
            DocumentId::generate(),
            BusinessVertical::Concrete,
            mode,
            services,
            stash,
        )
    }

    #[test]
    fn restore_accepts_what_edits_produce() {
        let v = BusinessVertical::Concrete;
        let quote = flat(v, 500).into_custom_quote();
        let stashed = vec![flat(v, 100), flat(v, 200)];
        let section = restore(QuoteMode::Custom, vec![quote], stashed.clone()).unwrap();
        assert_eq!(section.stash(), stashed.as_slice());
        assert!(restore(QuoteMode::Itemized, stashed, Vec::new()).is_ok());
    }

    #[test]
    fn restore_refuses_impossible_sections() {
        let v = BusinessVertical::Concrete;
        let line = flat(v, 100);
        let quote = flat(v, 500).into_custom_quote();
        let persistence = |result: ResultEngine<Section>| {
            matches!(result, Err(EngineError::Persistence(_)))
        };

        assert!(persistence(restore(
            QuoteMode::Custom,
            vec![quote.clone(), line.clone()],
            Vec::new()
        )));
        assert!(persistence(restore(
            QuoteMode::Itemized,
            vec![line.clone(), quote.clone()],
            Vec::new()
        )));
        assert!(persistence(restore(
            QuoteMode::Itemized,
            Vec::new(),
            vec![line.clone()]
        )));
        assert!(persistence(restore(
            QuoteMode::Custom,
            vec![quote.clone()],
            vec![quote.clone()]
        )));
        assert!(persistence(restore(
            QuoteMode::Itemized,
            vec![line.clone(), line.clone()],
            Vec::new()
        )));

        let mut twin = line.clone();
        twin.pricing = crate::PricingShape::Custom {
            flat_amount: MoneyCents::new(300),
        };
        assert!(persistence(restore(
            QuoteMode::Custom,
            vec![quote],
            vec![line, twin]
        )));
    }
}
