//! Tag classification for equipment and line tags.
//!
//! Applies the registry's rules to one text fragment and builds a
//! [`ClassifiedTag`] for the equipment and line categories. Instrument
//! matches are deliberately *not* produced here: a single fragment is only
//! half of an instrument tag, and pairing the halves needs geometry — see
//! the instrument matcher.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::registry::PatternRegistry;
use crate::tags::{ClassifiedTag, LineParts, TagCategory};
use crate::text::TextItem;

/// Equipment prefix dictionary, longest prefix first so two-letter codes
/// win over their one-letter prefixes (PK before P, AG before A).
const EQUIPMENT_PREFIXES: &[(&str, &str)] = &[
    ("AG", "Agitator"),
    ("PK", "Package Unit"),
    ("B", "Blower"),
    ("C", "Column"),
    ("D", "Drum"),
    ("E", "Heat Exchanger"),
    ("F", "Filter"),
    ("H", "Heater"),
    ("K", "Compressor"),
    ("P", "Pump"),
    ("R", "Reactor"),
    ("T", "Tank"),
    ("V", "Vessel"),
];

/// Fallback label when no prefix matches.
const GENERIC_EQUIPMENT: &str = "Equipment";

/// Optional leading size token: `<digits>` with an optional inch mark,
/// followed by a dash (`100-...`, `6"-...`).
static LINE_SIZE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"^(\d+)"?-"#).expect("static regex"));

/// Optional 1–3 letter service code between dashes, before digits
/// (`...-PS-1234-...`).
static LINE_SERVICE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-([A-Z]{1,3})-\s?\d").expect("static regex"));

/// Human-readable equipment type from the tag's leading alphabetic prefix.
///
/// Longest-prefix match over the fixed dictionary; unmatched prefixes map
/// to the generic `"Equipment"` label.
pub fn equipment_type_label(name: &str) -> &'static str {
    EQUIPMENT_PREFIXES
        .iter()
        .find(|(prefix, _)| name.starts_with(prefix))
        .map(|(_, label)| *label)
        .unwrap_or(GENERIC_EQUIPMENT)
}

/// Parse the advisory size and service attributes of a line tag. Both are
/// optional; absence is not an error.
pub fn parse_line_parts(name: &str) -> LineParts {
    let size = LINE_SIZE
        .captures(name)
        .map(|c| c[1].to_string());
    let service = LINE_SERVICE
        .captures(name)
        .map(|c| c[1].to_string());
    LineParts { size, service }
}

/// Classify one free-standing token (degraded, no-position mode).
///
/// Returns `None` when no rule matches or when the matching rule belongs
/// to the instrument category, which cannot be recognized without
/// positional data.
pub fn classify_token(registry: &PatternRegistry, token: &str) -> Option<ClassifiedTag> {
    build_tag(registry, token, None, None)
}

/// Classify one positioned item into an equipment or line tag.
///
/// Same contract as [`classify_token`], with the item's page and position
/// attached to the resulting tag.
pub fn classify_item(registry: &PatternRegistry, item: &TextItem) -> Option<ClassifiedTag> {
    build_tag(registry, item.text.trim(), Some(item.page), Some(item))
}

fn build_tag(
    registry: &PatternRegistry,
    text: &str,
    page: Option<usize>,
    item: Option<&TextItem>,
) -> Option<ClassifiedTag> {
    if text.is_empty() {
        return None;
    }
    let rule = registry.classify(text)?;
    // Instrument fragments are paired by the spatial matcher, never here.
    if rule.category == TagCategory::Instrument {
        return None;
    }

    let (type_label, line) = match rule.category {
        TagCategory::Equipment => (equipment_type_label(text).to_string(), None),
        TagCategory::Line => ("Line".to_string(), Some(parse_line_parts(text))),
        TagCategory::Instrument => unreachable!("filtered above"),
    };

    Some(ClassifiedTag {
        id: ClassifiedTag::make_id(rule.category, text),
        name: text.to_string(),
        category: rule.category,
        type_label,
        recognized: true,
        matched_rule: Some(rule.id.clone()),
        page,
        position: item.map(|i| i.bbox),
        instrument: None,
        line,
    })
}
