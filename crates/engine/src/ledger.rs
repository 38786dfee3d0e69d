//! The ordered collection of service entries for one (document, vertical)
//! pair.
//!
//! Insertion order is display order. Every mutation is validated up front and
//! either applies fully or not at all, then observers are notified.

use std::rc::Rc;

use crate::{
    BusinessVertical, DocumentId, EngineError, InputField, MoneyCents, ResultEngine, ServiceEntry,
    ServiceId,
    events::{ChangeReason, LedgerChange, LedgerObserver, Observers, SubscriptionId},
};

#[derive(Debug)]
pub struct Ledger {
    document_id: DocumentId,
    vertical: BusinessVertical,
    entries: Vec<ServiceEntry>,
    observers: Observers,
}

impl Ledger {
    pub fn new(document_id: DocumentId, vertical: BusinessVertical) -> Self {
        Self {
            document_id,
            vertical,
            entries: Vec::new(),
            observers: Observers::default(),
        }
    }

    /// Rebuilds a ledger from stored entries, checking every entry.
    pub(crate) fn from_entries(
        document_id: DocumentId,
        vertical: BusinessVertical,
        entries: Vec<ServiceEntry>,
    ) -> ResultEngine<Self> {
        let mut ledger = Self::new(document_id, vertical);
        for entry in &entries {
            ledger.check_admissible(entry)?;
        }
        checked_total(entries.iter().map(ServiceEntry::amount))?;
        ledger.entries = entries;
        Ok(ledger)
    }

    pub fn vertical(&self) -> BusinessVertical {
        self.vertical
    }

    pub fn document_id(&self) -> DocumentId {
        self.document_id
    }

    pub fn entries(&self) -> &[ServiceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &ServiceId) -> Option<&ServiceEntry> {
        self.entries.iter().find(|entry| &entry.id == id)
    }

    pub fn contains(&self, id: &ServiceId) -> bool {
        self.get(id).is_some()
    }

    /// Sum of the amounts of the current entries.
    pub fn total(&self) -> MoneyCents {
        // Every mutation refuses entry sets whose sum does not fit.
        MoneyCents::checked_sum(self.entries.iter().map(ServiceEntry::amount))
            .unwrap_or(MoneyCents::ZERO)
    }

    /// Checks that `entry` may enter this ledger without touching it.
    pub fn check_admissible(&self, entry: &ServiceEntry) -> ResultEngine<()> {
        if entry.vertical != self.vertical {
            tracing::warn!(
                "rejected {} entry {} for {} ledger of document {}",
                entry.vertical,
                entry.id,
                self.vertical,
                self.document_id
            );
            return Err(EngineError::Conflict(format!(
                "{} entry cannot be added to the {} ledger",
                entry.vertical, self.vertical
            )));
        }
        entry.validate()
    }

    /// Appends an entry.
    pub fn add(&mut self, entry: ServiceEntry) -> ResultEngine<()> {
        self.check_admissible(&entry)?;
        checked_total(
            self.entries
                .iter()
                .map(ServiceEntry::amount)
                .chain([entry.amount()]),
        )?;
        let id = entry.id.clone();
        tracing::debug!(
            "adding {} to {} ledger of document {}",
            id,
            self.vertical,
            self.document_id
        );
        self.entries.push(entry);
        self.publish(ChangeReason::Added(id));
        Ok(())
    }

    /// Puts `entry` in place of the entry with the same id, or appends it
    /// when there is none. Observers see a single change.
    pub fn upsert(&mut self, entry: ServiceEntry) -> ResultEngine<()> {
        self.check_admissible(&entry)?;
        checked_total(
            self.entries
                .iter()
                .filter(|existing| existing.id != entry.id)
                .map(ServiceEntry::amount)
                .chain([entry.amount()]),
        )?;
        let id = entry.id.clone();
        match self.entries.iter_mut().find(|existing| existing.id == id) {
            Some(existing) => {
                *existing = entry;
                tracing::debug!(
                    "updated {} in {} ledger of document {}",
                    id,
                    self.vertical,
                    self.document_id
                );
                self.publish(ChangeReason::Updated(id));
            }
            None => {
                tracing::debug!(
                    "adding {} to {} ledger of document {}",
                    id,
                    self.vertical,
                    self.document_id
                );
                self.entries.push(entry);
                self.publish(ChangeReason::Added(id));
            }
        }
        Ok(())
    }

    /// Removes the entry with `id`. Absent ids are a no-op so repeated clicks
    /// and late UI events are harmless.
    pub fn remove_by_id(&mut self, id: &ServiceId) -> Option<ServiceEntry> {
        let position = self.entries.iter().position(|entry| &entry.id == id)?;
        let removed = self.entries.remove(position);
        tracing::debug!(
            "removed {} from {} ledger of document {}",
            id,
            self.vertical,
            self.document_id
        );
        self.publish(ChangeReason::Removed(id.clone()));
        Some(removed)
    }

    /// Swaps every entry for `entries`, returning the previous ones.
    ///
    /// The whole sequence is checked before anything changes.
    pub fn replace_all(&mut self, entries: Vec<ServiceEntry>) -> ResultEngine<Vec<ServiceEntry>> {
        for entry in &entries {
            self.check_admissible(entry)?;
        }
        checked_total(entries.iter().map(ServiceEntry::amount))?;
        let previous = std::mem::replace(&mut self.entries, entries);
        tracing::debug!(
            "replaced {} entries with {} in {} ledger of document {}",
            previous.len(),
            self.entries.len(),
            self.vertical,
            self.document_id
        );
        self.publish(ChangeReason::Replaced);
        Ok(previous)
    }

    pub fn subscribe(&mut self, observer: Rc<dyn LedgerObserver>) -> SubscriptionId {
        self.observers.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    fn publish(&self, reason: ChangeReason) {
        let change = LedgerChange {
            document_id: self.document_id,
            vertical: self.vertical,
            reason: &reason,
            entries: &self.entries,
            total: self.total(),
        };
        self.observers.publish(&change);
    }
}

fn checked_total(amounts: impl IntoIterator<Item = MoneyCents>) -> ResultEngine<MoneyCents> {
    MoneyCents::checked_sum(amounts)
        .ok_or_else(|| EngineError::validation(InputField::Amount, "ledger total is too large"))
}
