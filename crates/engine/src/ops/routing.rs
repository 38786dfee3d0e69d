use crate::{
    BusinessVertical, EngineError, Quantity, ResultEngine,
    calculator::{PriceChoice, PriceTiers},
    context::{Routing, SelectedPrice, UiSnapshot},
};

use super::Engine;

impl Engine {
    /// Applies the UI state: picks the document view and vertical the next
    /// actions target.
    ///
    /// When the route changes the renderers are detached from the previous
    /// section's ledger before being attached to the new one.
    pub fn route(&mut self, snapshot: &UiSnapshot) -> Routing {
        let routing = self.router.route(snapshot);
        if !routing.changed() {
            return routing;
        }

        self.detach_renderers();
        let route = routing.route;
        if let Some(doc) = self.open.get_mut(&route.kind)
            && doc.set_vertical(route.vertical)
        {
            doc.touch();
        }
        self.attach_renderers();
        routing
    }

    /// Calculator tiers for `area` in the active concrete section.
    pub fn price_tiers(&self, area: Quantity) -> ResultEngine<PriceTiers> {
        let route = self.active_route()?;
        ensure_calculator(route.vertical)?;
        Ok(self.price_source.tiers(area))
    }

    /// Records the operator's calculator choice in the active section session.
    pub fn select_price(&mut self, area: Quantity, choice: PriceChoice) -> ResultEngine<SelectedPrice> {
        let tiers = self.price_tiers(area)?;
        let amount = choice.resolve(&tiers);
        let session = self
            .router
            .session_mut()
            .ok_or_else(|| EngineError::KeyNotFound("no active section".to_string()))?;
        Ok(session.select_price(area, amount))
    }
}

fn ensure_calculator(vertical: BusinessVertical) -> ResultEngine<()> {
    if vertical != BusinessVertical::Concrete {
        return Err(EngineError::Conflict(format!(
            "the {vertical} section has no price calculator"
        )));
    }
    Ok(())
}
