//! Batch recognition entry points.
//!
//! One call processes the whole document: a classifier pass over every
//! positioned item for equipment and line tags, then the spatial matcher
//! pass for instrument tags. Both passes read the same registry borrow, so
//! the rule set is naturally a snapshot for the duration of the run.
//! Recognition is pure and stateless — identical input and rules produce
//! identical, order-stable output.

use crate::classify::{classify_item, classify_token};
use crate::instrument::{MatchOptions, TraceEvent, match_instruments, match_instruments_with_trace};
use crate::registry::PatternRegistry;
use crate::tags::TagSet;
use crate::text::TextItem;
use crate::tokens::extract_tokens;

/// Recognize all tags in a set of positioned items (any number of pages).
///
/// Tags with identical `(category, name)` collapse to the first
/// occurrence; output order is encounter order in `items`.
pub fn recognize_items(
    registry: &PatternRegistry,
    items: &[TextItem],
    options: &MatchOptions,
) -> TagSet {
    let mut tags = TagSet::default();
    classifier_pass(registry, items, &mut tags);
    for tag in match_instruments(registry, items, options) {
        tags.push_dedup(tag);
    }
    tags
}

/// [`recognize_items`] with a diagnostic callback for the instrument
/// matcher.
pub fn recognize_items_with_trace(
    registry: &PatternRegistry,
    items: &[TextItem],
    options: &MatchOptions,
    trace: &mut dyn FnMut(TraceEvent<'_>),
) -> TagSet {
    let mut tags = TagSet::default();
    classifier_pass(registry, items, &mut tags);
    for tag in match_instruments_with_trace(registry, items, options, trace) {
        tags.push_dedup(tag);
    }
    tags
}

fn classifier_pass(registry: &PatternRegistry, items: &[TextItem], tags: &mut TagSet) {
    for item in items {
        if let Some(tag) = classify_item(registry, item) {
            tags.push_dedup(tag);
        }
    }
}

/// Degraded-mode recognition over a raw text blob with no positions.
///
/// The blob is tokenized and each token classified; instrument recognition
/// is skipped entirely because there is no geometry to pair fragments
/// with. This is a documented capability reduction of degraded mode, not a
/// defect.
pub fn recognize_text(registry: &PatternRegistry, text: &str) -> TagSet {
    let mut tags = TagSet::default();
    for token in extract_tokens(text) {
        if let Some(tag) = classify_token(registry, &token) {
            tags.push_dedup(tag);
        }
    }
    tags
}
