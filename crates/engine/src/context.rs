//! Context routing: which document kind and which business vertical an
//! operator action applies to.
//!
//! The UI layer hands over a [`UiSnapshot`] whenever a view becomes active or
//! the vertical selector changes. Resolution is priority ordered and always
//! yields a definite vertical.
//!
//! Every route owns one [`SectionSession`] holding per-vertical transient
//! state (the calculator's last result). Changing route tears the old session
//! down before the new one exists, so state of two verticals is never live at
//! the same time.

use crate::{BusinessVertical, DocumentKind, MoneyCents, Quantity};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewState {
    pub kind: DocumentKind,
    pub active: bool,
    pub visible: bool,
}

/// Form elements that only exist inside one vertical's section.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SectionMarker {
    ConcreteCalculator,
    SquareFootageInput,
    MasonryServiceSelect,
    MasonryJobDescription,
}

impl SectionMarker {
    pub fn vertical(self) -> BusinessVertical {
        match self {
            Self::ConcreteCalculator | Self::SquareFootageInput => BusinessVertical::Concrete,
            Self::MasonryServiceSelect | Self::MasonryJobDescription => BusinessVertical::Masonry,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UiSnapshot {
    pub views: Vec<ViewState>,
    pub selected_vertical: Option<BusinessVertical>,
    pub markers: Vec<SectionMarker>,
}

impl UiSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a view that is both active and visible.
    #[must_use]
    pub fn showing(mut self, kind: DocumentKind) -> Self {
        self.views.push(ViewState {
            kind,
            active: true,
            visible: true,
        });
        self
    }

    #[must_use]
    pub fn view(mut self, view: ViewState) -> Self {
        self.views.push(view);
        self
    }

    #[must_use]
    pub fn selected(mut self, vertical: BusinessVertical) -> Self {
        self.selected_vertical = Some(vertical);
        self
    }

    #[must_use]
    pub fn marker(mut self, marker: SectionMarker) -> Self {
        self.markers.push(marker);
        self
    }
}

/// Where a resolved vertical came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerticalSource {
    Selector,
    Markers,
    Default,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Route {
    pub kind: DocumentKind,
    pub vertical: BusinessVertical,
}

/// Result of [`ContextRouter::route`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Routing {
    pub route: Route,
    pub previous: Option<Route>,
    pub source: VerticalSource,
}

impl Routing {
    pub fn changed(&self) -> bool {
        self.previous != Some(self.route)
    }

    pub fn vertical_switched(&self) -> bool {
        self.previous
            .is_some_and(|previous| previous.vertical != self.route.vertical)
    }
}

/// A calculator price picked by the operator, bound to the session it was
/// picked in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SelectedPrice {
    pub vertical: BusinessVertical,
    pub generation: u64,
    pub area: Quantity,
    pub amount: MoneyCents,
}

/// Transient state of the active vertical section.
#[derive(Debug, PartialEq, Eq)]
pub struct SectionSession {
    vertical: BusinessVertical,
    generation: u64,
    last_price: Option<SelectedPrice>,
}

impl SectionSession {
    fn init(vertical: BusinessVertical, generation: u64) -> Self {
        tracing::debug!("initialising {vertical} section session #{generation}");
        Self {
            vertical,
            generation,
            last_price: None,
        }
    }

    fn destroy(&mut self) {
        tracing::debug!(
            "tearing down {} section session #{}",
            self.vertical,
            self.generation
        );
        self.last_price = None;
    }

    pub fn vertical(&self) -> BusinessVertical {
        self.vertical
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn last_price(&self) -> Option<SelectedPrice> {
        self.last_price
    }

    pub(crate) fn select_price(&mut self, area: Quantity, amount: MoneyCents) -> SelectedPrice {
        let selected = SelectedPrice {
            vertical: self.vertical,
            generation: self.generation,
            area,
            amount,
        };
        self.last_price = Some(selected);
        selected
    }

    /// `true` if `price` was picked in this very session.
    pub fn owns(&self, price: &SelectedPrice) -> bool {
        price.vertical == self.vertical && price.generation == self.generation
    }
}

#[derive(Debug, Default)]
pub struct ContextRouter {
    current: Option<Route>,
    session: Option<SectionSession>,
    generations: u64,
}

impl ContextRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Route> {
        self.current
    }

    pub fn session(&self) -> Option<&SectionSession> {
        self.session.as_ref()
    }

    pub(crate) fn session_mut(&mut self) -> Option<&mut SectionSession> {
        self.session.as_mut()
    }

    /// Resolves the route for `snapshot` and swaps the section session when it
    /// changed.
    pub fn route(&mut self, snapshot: &UiSnapshot) -> Routing {
        let kind = resolve_kind(snapshot)
            .or(self.current.map(|route| route.kind))
            .unwrap_or(DocumentKind::Invoice);
        let (vertical, source) = resolve_vertical(snapshot);
        let route = Route { kind, vertical };
        let routing = Routing {
            route,
            previous: self.current,
            source,
        };

        if routing.changed() {
            if routing.vertical_switched() {
                tracing::info!(
                    "switching {} view from {} to {}",
                    kind,
                    routing.previous.map_or("none", |p| p.vertical.as_str()),
                    vertical
                );
            }
            self.teardown();
            self.generations += 1;
            self.session = Some(SectionSession::init(vertical, self.generations));
            self.current = Some(route);
        }
        routing
    }

    /// Forgets the current route so the next [`route`](Self::route) starts a
    /// fresh session even for the same view.
    pub fn reset(&mut self) {
        self.teardown();
        self.current = None;
    }

    /// Destroys the active section session, if any.
    pub fn teardown(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.destroy();
        }
    }
}

fn resolve_kind(snapshot: &UiSnapshot) -> Option<DocumentKind> {
    snapshot
        .views
        .iter()
        .find(|view| view.active && view.visible)
        .map(|view| view.kind)
}

fn resolve_vertical(snapshot: &UiSnapshot) -> (BusinessVertical, VerticalSource) {
    if let Some(vertical) = snapshot.selected_vertical {
        return (vertical, VerticalSource::Selector);
    }

    let mut marked = snapshot.markers.iter().map(|marker| marker.vertical());
    if let Some(first) = marked.next()
        && marked.all(|vertical| vertical == first)
    {
        return (first, VerticalSource::Markers);
    }

    (BusinessVertical::Concrete, VerticalSource::Default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visible_active_view_decides_kind() {
        let mut router = ContextRouter::new();
        let snapshot = UiSnapshot::new()
            .view(ViewState {
                kind: DocumentKind::Invoice,
                active: true,
                visible: false,
            })
            .showing(DocumentKind::Estimate)
            .selected(BusinessVertical::Masonry);
        let routing = router.route(&snapshot);
        assert_eq!(
            routing.route,
            Route {
                kind: DocumentKind::Estimate,
                vertical: BusinessVertical::Masonry
            }
        );
        assert_eq!(routing.source, VerticalSource::Selector);
    }

    #[test]
    fn selector_wins_over_markers() {
        let mut router = ContextRouter::new();
        let snapshot = UiSnapshot::new()
            .showing(DocumentKind::Invoice)
            .selected(BusinessVertical::Concrete)
            .marker(SectionMarker::MasonryServiceSelect);
        assert_eq!(router.route(&snapshot).route.vertical, BusinessVertical::Concrete);
    }

    #[test]
    fn markers_then_default() {
        let mut router = ContextRouter::new();
        let masonry = UiSnapshot::new()
            .showing(DocumentKind::Invoice)
            .marker(SectionMarker::MasonryJobDescription);
        let routing = router.route(&masonry);
        assert_eq!(routing.route.vertical, BusinessVertical::Masonry);
        assert_eq!(routing.source, VerticalSource::Markers);

        let ambiguous = UiSnapshot::new()
            .showing(DocumentKind::Invoice)
            .marker(SectionMarker::MasonryJobDescription)
            .marker(SectionMarker::ConcreteCalculator);
        let routing = router.route(&ambiguous);
        assert_eq!(routing.route.vertical, BusinessVertical::Concrete);
        assert_eq!(routing.source, VerticalSource::Default);
    }

    #[test]
    fn kind_falls_back_to_previous_route_then_invoice() {
        let mut router = ContextRouter::new();
        assert_eq!(router.route(&UiSnapshot::new()).route.kind, DocumentKind::Invoice);
        router.route(&UiSnapshot::new().showing(DocumentKind::Estimate));
        assert_eq!(router.route(&UiSnapshot::new()).route.kind, DocumentKind::Estimate);
    }

    #[test]
    fn vertical_switch_tears_down_session_state() {
        let mut router = ContextRouter::new();
        let concrete = UiSnapshot::new()
            .showing(DocumentKind::Estimate)
            .selected(BusinessVertical::Concrete);
        router.route(&concrete);
        let price = router
            .session_mut()
            .unwrap()
            .select_price(Quantity::whole(10), MoneyCents::new(45_00));
        assert!(router.session().unwrap().owns(&price));

        // Same route again keeps the session.
        assert!(!router.route(&concrete).changed());
        assert_eq!(router.session().unwrap().last_price(), Some(price));

        let routing = router.route(&concrete.clone().selected(BusinessVertical::Masonry));
        assert!(routing.vertical_switched());
        let session = router.session().unwrap();
        assert_eq!(session.vertical(), BusinessVertical::Masonry);
        assert_eq!(session.last_price(), None);
        assert!(!session.owns(&price));

        // Coming back does not resurrect the old selection either.
        router.route(&concrete);
        assert!(!router.session().unwrap().owns(&price));
        assert_eq!(router.session().unwrap().last_price(), None);
    }
}
