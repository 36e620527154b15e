//! End-to-end recognition tests over the public API: a small synthetic
//! drawing exercised through classification, spatial matching, and
//! degraded mode together.

use pidtags_core::*;

/// A two-page synthetic P&ID text layer.
fn drawing() -> Vec<TextItem> {
    vec![
        // Page 1: a pump, a line, and a PT/1234 instrument stack.
        TextItem::new("P28-P-1234", 30.0, 30.0, 55.0, 8.0, 1),
        TextItem::new("100-PS-1234-A1B2", 30.0, 50.0, 95.0, 8.0, 1),
        TextItem::new("PT", 98.0, 186.0, 14.0, 8.0, 1),
        TextItem::new("1234", 100.0, 200.0, 10.0, 8.0, 1),
        TextItem::new("see note 3", 200.0, 300.0, 60.0, 8.0, 1),
        // Page 2: an orphan loop number with no function anywhere near,
        // and a vessel.
        TextItem::new("5678", 100.0, 200.0, 10.0, 8.0, 2),
        TextItem::new("V28-E-0003", 300.0, 30.0, 60.0, 8.0, 2),
    ]
}

#[test]
fn whole_document_recognition() {
    let registry = PatternRegistry::new();
    let tags = recognize_items(&registry, &drawing(), &MatchOptions::default());

    let equipment: Vec<&str> = tags.equipment.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(equipment, vec!["P28-P-1234", "V28-E-0003"]);
    assert_eq!(tags.equipment[0].type_label, "Pump");
    assert_eq!(tags.equipment[1].type_label, "Vessel");

    assert_eq!(tags.line.len(), 1);
    let line = &tags.line[0];
    assert_eq!(line.line.as_ref().unwrap().size.as_deref(), Some("100"));
    assert_eq!(line.line.as_ref().unwrap().service.as_deref(), Some("PS"));

    let instruments: Vec<&str> = tags.instrument.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(instruments, vec!["PT-1234", "5678"]);
    // The orphan number is emitted with no function, never dropped or
    // given a fabricated one.
    assert_eq!(tags.instrument[1].instrument.as_ref().unwrap().function, None);
}

#[test]
fn idempotence_across_runs_and_registries() {
    let registry = PatternRegistry::new();
    let items = drawing();
    let first = recognize_items(&registry, &items, &MatchOptions::default());
    let second = recognize_items(&registry, &items, &MatchOptions::default());
    assert_eq!(first, second);

    // A structurally identical fresh registry gives the same answer.
    let other = PatternRegistry::new();
    let third = recognize_items(&other, &items, &MatchOptions::default());
    assert_eq!(first, third);
}

#[test]
fn builtin_categories_win_over_user_rules() {
    let mut registry = PatternRegistry::new();
    registry
        .upsert(PatternRule::user(
            "greedy",
            r"^[A-Z\d-]+$",
            TagCategory::Line,
            "#808080",
            "matches most tags",
        ))
        .unwrap();

    let tags = recognize_text(&registry, "V28-E-0003 AB-CD");
    // The built-in equipment rule outranks the user rule for the
    // equipment tag; the user rule picks up what built-ins do not match.
    assert_eq!(tags.equipment.len(), 1);
    assert_eq!(tags.line.len(), 1);
    assert_eq!(tags.line[0].name, "AB-CD");
    assert_eq!(tags.line[0].matched_rule.as_deref(), Some("greedy"));
}

#[test]
fn disabling_instrument_rules_degrades_gracefully() {
    let mut registry = PatternRegistry::new();
    registry
        .set_enabled(registry::INSTRUMENT_NUMBER, false)
        .unwrap();
    let tags = recognize_items(&registry, &drawing(), &MatchOptions::default());
    assert!(tags.instrument.is_empty());
    // Other categories are unaffected.
    assert_eq!(tags.equipment.len(), 2);
}

#[test]
fn per_item_failures_never_abort_the_batch() {
    let registry = PatternRegistry::new();
    let mut items = drawing();
    // Degenerate and empty items are skipped, not fatal.
    items.push(TextItem::new("", 0.0, 0.0, 0.0, 0.0, 1));
    items.push(TextItem::new("   ", 10.0, 10.0, 5.0, 0.0, 1));
    let tags = recognize_items(&registry, &items, &MatchOptions::default());
    assert_eq!(tags.equipment.len(), 2);
    assert_eq!(tags.instrument.len(), 2);
}

#[test]
fn trace_observer_sees_fallback_decisions() {
    let registry = PatternRegistry::new();
    let items = drawing();
    let mut fallbacks = Vec::new();
    recognize_items_with_trace(&registry, &items, &MatchOptions::default(), &mut |ev| {
        if let TraceEvent::Fallback { number, function, .. } = ev {
            fallbacks.push((number.text.clone(), function.is_some()));
        }
    });
    // Only the page-2 orphan goes through fallback, and it finds nothing.
    assert_eq!(fallbacks, vec![("5678".to_string(), false)]);
}

#[test]
fn widening_tolerances_is_configurable() {
    let registry = PatternRegistry::new();
    let items = vec![
        TextItem::new("1234", 100.0, 200.0, 10.0, 8.0, 1),
        // 150 units away: beyond the default fallback ceiling.
        TextItem::new("PT", 250.0, 200.0, 14.0, 8.0, 1),
    ];
    let default_tags = recognize_items(&registry, &items, &MatchOptions::default());
    assert_eq!(default_tags.instrument[0].name, "1234");

    let generous = MatchOptions {
        fallback_ceiling: 200.0,
        ..MatchOptions::default()
    };
    let tags = recognize_items(&registry, &items, &generous);
    assert_eq!(tags.instrument[0].name, "PT-1234");
}
