//! Change notifications published by a [`Ledger`](crate::Ledger).
//!
//! Renderers and other collaborators register a [`LedgerObserver`] and get a
//! [`LedgerChange`] after every mutation. Registration is explicit and is
//! undone with the returned [`SubscriptionId`].

use std::{fmt, rc::Rc};

use crate::{BusinessVertical, DocumentId, MoneyCents, ServiceEntry, ServiceId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChangeReason {
    Added(ServiceId),
    /// An existing entry was swapped in place.
    Updated(ServiceId),
    Removed(ServiceId),
    Replaced,
}

/// Snapshot handed to observers right after a mutation.
#[derive(Clone, Copy, Debug)]
pub struct LedgerChange<'a> {
    pub document_id: DocumentId,
    pub vertical: BusinessVertical,
    pub reason: &'a ChangeReason,
    pub entries: &'a [ServiceEntry],
    pub total: MoneyCents,
}

impl LedgerChange<'_> {
    /// The ledger has no lines left; renderers show their placeholder.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub trait LedgerObserver {
    fn ledger_changed(&self, change: &LedgerChange<'_>);
}

impl<F> LedgerObserver for F
where
    F: Fn(&LedgerChange<'_>),
{
    fn ledger_changed(&self, change: &LedgerChange<'_>) {
        self(change)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
pub(crate) struct Observers {
    next_id: u64,
    registered: Vec<(SubscriptionId, Rc<dyn LedgerObserver>)>,
}

impl Observers {
    pub(crate) fn subscribe(&mut self, observer: Rc<dyn LedgerObserver>) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.registered.push((id, observer));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.registered.len();
        self.registered.retain(|(registered, _)| *registered != id);
        before != self.registered.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.registered.len()
    }

    pub(crate) fn publish(&self, change: &LedgerChange<'_>) {
        for (_, observer) in &self.registered {
            observer.ledger_changed(change);
        }
    }
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("registered", &self.registered.len())
            .finish()
    }
}
