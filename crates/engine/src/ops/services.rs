use std::rc::Rc;

use crate::{
    BusinessVertical, EngineError, ModeTransition, MoneyCents, QuoteMode, ResultEngine,
    ServiceEntry, ServiceId, Totals, build_custom, build_itemized,
    commands::{AddCalculatedCmd, AddCustomCmd, AddItemizedCmd},
    events::LedgerObserver,
    parsing::{DescriptionRule, normalize_description},
    quote_mode::Section,
};

use super::Engine;

impl Engine {
    /// Adds a `quantity * rate` line to the routed section.
    pub fn add_itemized(&mut self, cmd: AddItemizedCmd) -> ResultEngine<ServiceId> {
        self.with_active_section(|route, section| {
            let entry = build_itemized(
                route.vertical,
                &cmd.description,
                cmd.quantity,
                &cmd.unit,
                cmd.rate,
            )?;
            section.add_itemized(entry)
        })
    }

    /// Adds a flat-amount line, or sets the custom quote when the routed
    /// section is in custom mode.
    pub fn add_custom(&mut self, cmd: AddCustomCmd) -> ResultEngine<ServiceId> {
        self.with_active_section(|route, section| {
            add_flat_line(route.vertical, section, &cmd.description, cmd.amount)
        })
    }

    /// Adds a line priced with a calculator selection.
    ///
    /// The selection must come from the current section session: a price
    /// picked before a vertical switch is refused.
    pub fn add_calculated(&mut self, cmd: AddCalculatedCmd) -> ResultEngine<ServiceId> {
        let owned = self
            .router
            .session()
            .is_some_and(|session| session.owns(&cmd.price));
        if !owned {
            tracing::warn!(
                "refusing stale {} calculator price #{}",
                cmd.price.vertical,
                cmd.price.generation
            );
            return Err(EngineError::Conflict(format!(
                "the {} calculator price is no longer current",
                cmd.price.vertical
            )));
        }
        self.with_active_section(|route, section| {
            add_flat_line(route.vertical, section, &cmd.description, cmd.price.amount)
        })
    }

    /// Adds an entry built by the caller. Its vertical must match the route.
    pub fn add_entry(&mut self, entry: ServiceEntry) -> ResultEngine<ServiceId> {
        self.with_active_section(|_, section| {
            if entry.is_itemized() {
                section.add_itemized(entry)
            } else {
                section.add_flat(entry)
            }
        })
    }

    /// Removes a line of the routed section. Unknown ids are a no-op.
    pub fn remove_by_id(&mut self, id: &ServiceId) -> ResultEngine<bool> {
        let (route, doc) = self.active_document_mut()?;
        let removed = doc
            .section_mut(route.vertical)
            .ledger_mut()
            .remove_by_id(id)
            .is_some();
        if removed {
            doc.touch();
        } else {
            tracing::debug!("remove of unknown service {id} ignored");
        }
        Ok(removed)
    }

    /// Switches the quote mode of `vertical`, which must be the routed one.
    pub fn switch_mode(
        &mut self,
        vertical: BusinessVertical,
        mode: QuoteMode,
    ) -> ResultEngine<ModeTransition> {
        let route = self.active_route()?;
        if route.vertical != vertical {
            return Err(EngineError::Conflict(format!(
                "cannot switch the {vertical} section while {} is active",
                route.vertical
            )));
        }
        self.with_active_section(|_, section| section.switch_mode(mode))
    }

    pub fn current_mode(&self) -> ResultEngine<QuoteMode> {
        let (route, doc) = self.active_document()?;
        Ok(doc
            .section(route.vertical)
            .map_or(QuoteMode::Itemized, Section::mode))
    }

    pub fn current_totals(&self) -> ResultEngine<Totals> {
        self.active_document().and_then(|(_, doc)| doc.totals())
    }

    /// Lines of the routed section in display order.
    pub fn current_entries(&self) -> ResultEngine<&[ServiceEntry]> {
        let (route, doc) = self.active_document()?;
        Ok(doc
            .section(route.vertical)
            .map_or(&[][..], |section| section.ledger().entries()))
    }

    /// Registers a renderer; it follows the active section from now on.
    pub fn subscribe(&mut self, renderer: Rc<dyn LedgerObserver>) {
        self.detach_renderers();
        self.renderers.push(renderer);
        self.attach_renderers();
    }
}

fn add_flat_line(
    vertical: BusinessVertical,
    section: &mut Section,
    description: &str,
    amount: MoneyCents,
) -> ResultEngine<ServiceId> {
    if section.mode() == QuoteMode::Custom {
        normalize_description(description, DescriptionRule::Detailed)?;
    }
    let entry = build_custom(vertical, description, amount)?;
    section.add_flat(entry)
}
