//! pidtags-core: rule-driven P&ID tag recognition over positioned text.
//!
//! Given a page of positioned text fragments — as produced by any PDF or
//! text-layout engine — this crate extracts a classified set of domain
//! tags: equipment numbers, line numbers, and compound instrument tags.
//! Classification follows user-editable regex conventions held in a
//! [`PatternRegistry`]; instrument tags are reconstructed from their two
//! separately printed fragments (function code over loop number) by the
//! geometry-aware [`instrument`] matcher.
//!
//! The crate is backend-independent: no PDF parsing, rendering, UI, or
//! file I/O lives here. Hosts feed [`TextItem`]s in (or a raw text blob in
//! degraded mode) and consume the resulting [`TagSet`].

pub mod classify;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod instrument;
pub mod registry;
pub mod store;
pub mod tags;
pub mod text;
pub mod tokens;

pub use engine::{recognize_items, recognize_items_with_trace, recognize_text};
pub use error::PatternError;
pub use geometry::BBox;
pub use instrument::{MatchOptions, SearchParams, TraceEvent};
pub use registry::{PatternRegistry, PatternRule, PatternSet, RuleSource};
pub use store::{MemoryStore, PatternStore};
pub use tags::{ClassifiedTag, InstrumentParts, LineParts, TagCategory, TagSet};
pub use text::TextItem;
