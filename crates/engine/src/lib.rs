//! Service ledger and quote-mode engine for concrete and masonry invoices
//! and estimates.
//!
//! A [`Document`] (invoice or estimate) holds one [`Section`] per business
//! vertical. Each section owns a [`Ledger`] of [`ServiceEntry`] lines and a
//! [`QuoteMode`]: itemized lines, or a single custom lump-sum quote with the
//! itemized lines stashed aside. The [`Engine`] ties this to the UI: the
//! [`ContextRouter`] decides which document and vertical an action targets,
//! and documents are persisted through a [`KeyValueStore`].

pub use calculator::{PriceChoice, PriceSource, PriceTiers, SquareFootCalculator};
pub use commands::{ActionToken, AddCalculatedCmd, AddCustomCmd, AddItemizedCmd, Command, Outcome};
pub use context::{
    ContextRouter, Route, Routing, SectionMarker, SectionSession, SelectedPrice, UiSnapshot,
    VerticalSource, ViewState,
};
pub use document::{Document, DocumentId, Totals};
pub use error::{EngineError, InputField};
pub use events::{ChangeReason, LedgerChange, LedgerObserver, SubscriptionId};
pub use kinds::{BusinessVertical, DocumentKind, QuoteMode};
pub use ledger::Ledger;
pub use money::{MoneyCents, Quantity};
pub use ops::{Engine, EngineBuilder};
pub use parsing::{
    DETAILED_DESCRIPTION_MIN_CHARS, Description, DescriptionRule, DisplayMarkup,
    normalize_description, parse_currency, parse_quantity, render_description_for_display,
};
pub use quote_mode::{ModeTransition, Section};
pub use readiness::{RetryPolicy, wait_for};
pub use service::{PricingShape, ServiceEntry, ServiceId, build_custom, build_itemized};
pub use store::{
    DocumentRecord, DocumentRepository, FileStore, KeyValueStore, MemoryStore, SectionRecord,
};

mod calculator;
mod commands;
mod context;
mod document;
mod error;
mod events;
mod kinds;
mod ledger;
mod money;
mod ops;
mod parsing;
mod quote_mode;
mod readiness;
mod service;
mod store;

type ResultEngine<T> = Result<T, EngineError>;
