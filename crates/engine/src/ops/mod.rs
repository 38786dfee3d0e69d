use std::{
    collections::BTreeMap,
    rc::Rc,
};

use crate::{
    BusinessVertical, Document, DocumentKind, EngineError, ResultEngine,
    calculator::{PriceSource, SquareFootCalculator},
    commands::SpentTokens,
    context::{ContextRouter, Route},
    events::{LedgerObserver, SubscriptionId},
    quote_mode::Section,
    store::{DocumentRepository, KeyValueStore, MemoryStore},
};

mod actions;
mod documents;
mod routing;
mod services;

/// Entry point used by the UI layer.
///
/// Owns the open documents (at most one per kind, i.e. per form view), the
/// context router and the persistence repository. Every ledger operation
/// targets the section selected by the current route.
pub struct Engine {
    repository: DocumentRepository,
    router: ContextRouter,
    open: BTreeMap<DocumentKind, Document>,
    renderers: Vec<Rc<dyn LedgerObserver>>,
    attached: Vec<(DocumentKind, BusinessVertical, SubscriptionId)>,
    price_source: Box<dyn PriceSource>,
    default_tax_rate_bps: u32,
    issued_tokens: u64,
    spent_tokens: SpentTokens,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn router(&self) -> &ContextRouter {
        &self.router
    }

    fn active_route(&self) -> ResultEngine<Route> {
        self.router
            .current()
            .ok_or_else(|| EngineError::KeyNotFound("no active document view".to_string()))
    }

    fn active_document(&self) -> ResultEngine<(Route, &Document)> {
        let route = self.active_route()?;
        let doc = self
            .open
            .get(&route.kind)
            .ok_or_else(|| EngineError::KeyNotFound(format!("no open {}", route.kind)))?;
        Ok((route, doc))
    }

    fn active_document_mut(&mut self) -> ResultEngine<(Route, &mut Document)> {
        let route = self.active_route()?;
        let doc = self
            .open
            .get_mut(&route.kind)
            .ok_or_else(|| EngineError::KeyNotFound(format!("no open {}", route.kind)))?;
        Ok((route, doc))
    }

    /// Runs `f` on the routed section and marks the document as changed when
    /// it succeeds.
    fn with_active_section<T>(
        &mut self,
        f: impl FnOnce(Route, &mut Section) -> ResultEngine<T>,
    ) -> ResultEngine<T> {
        let (route, doc) = self.active_document_mut()?;
        let value = f(route, doc.section_mut(route.vertical))?;
        doc.touch();
        Ok(value)
    }

    fn attach_renderers(&mut self) {
        let Some(route) = self.router.current() else {
            return;
        };
        let Some(doc) = self.open.get_mut(&route.kind) else {
            return;
        };
        let ledger = doc.section_mut(route.vertical).ledger_mut();
        for renderer in &self.renderers {
            let id = ledger.subscribe(Rc::clone(renderer));
            self.attached.push((route.kind, route.vertical, id));
        }
    }

    fn detach_renderers(&mut self) {
        for (kind, vertical, id) in self.attached.drain(..) {
            if let Some(doc) = self.open.get_mut(&kind) {
                doc.section_mut(vertical).ledger_mut().unsubscribe(id);
            }
        }
    }
}

/// The builder for `Engine`
pub struct EngineBuilder {
    store: Box<dyn KeyValueStore>,
    price_source: Box<dyn PriceSource>,
    renderers: Vec<Rc<dyn LedgerObserver>>,
    tax_rate_bps: u32,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            store: Box::new(MemoryStore::new()),
            price_source: Box::new(SquareFootCalculator::default()),
            renderers: Vec::new(),
            tax_rate_bps: 0,
        }
    }
}

impl EngineBuilder {
    /// Pass the persistence store
    pub fn store(mut self, store: impl KeyValueStore + 'static) -> EngineBuilder {
        self.store = Box::new(store);
        self
    }

    /// Pass the calculator used for concrete pricing
    pub fn price_source(mut self, source: impl PriceSource + 'static) -> EngineBuilder {
        self.price_source = Box::new(source);
        self
    }

    /// Register a renderer notified after every ledger mutation
    pub fn renderer(mut self, renderer: Rc<dyn LedgerObserver>) -> EngineBuilder {
        self.renderers.push(renderer);
        self
    }

    /// Tax rate (basis points) applied to new documents
    pub fn tax_rate_bps(mut self, bps: u32) -> EngineBuilder {
        self.tax_rate_bps = bps;
        self
    }

    /// Construct `Engine`
    pub fn build(self) -> Engine {
        Engine {
            repository: DocumentRepository::from_boxed(self.store),
            router: ContextRouter::new(),
            open: BTreeMap::new(),
            renderers: self.renderers,
            attached: Vec::new(),
            price_source: self.price_source,
            default_tax_rate_bps: self.tax_rate_bps,
            issued_tokens: 0,
            spent_tokens: SpentTokens::default(),
        }
    }
}
