//! Pattern registry: classification rules and their lifecycle.
//!
//! The registry owns every [`PatternRule`] and is their sole mutator.
//! Built-in rules ship with the registry and are permanent; a user edit to
//! a built-in produces a *user override* that shadows it entirely without
//! deleting the original definition, so reset-to-defaults always works.
//!
//! Classification order is fixed: built-in categories first (line,
//! equipment, instrument-number, instrument-function, in that order), then
//! user rules — priority user rules before the rest, insertion order within
//! each group. First match wins.
//!
//! Every regex is validated at write time; an invalid pattern fails the
//! single mutating call and leaves prior state untouched. A pattern that is
//! somehow stored but broken is treated as non-matching during
//! classification rather than failing the whole run.

use std::collections::HashMap;

use indexmap::IndexMap;
use regex::Regex;

use crate::error::PatternError;
use crate::tags::TagCategory;

/// Built-in rule id: piping line numbers.
pub const LINE_NUMBER: &str = "line_number";
/// Built-in rule id: equipment numbers.
pub const EQUIPMENT_NUMBER: &str = "equipment_number";
/// Built-in rule id: instrument loop numbers.
pub const INSTRUMENT_NUMBER: &str = "instrument_number";
/// Built-in rule id: instrument function codes.
pub const INSTRUMENT_FUNCTION: &str = "instrument_function";

/// Fixed classification priority of the built-in rules.
const BUILTIN_ORDER: [&str; 4] = [
    LINE_NUMBER,
    EQUIPMENT_NUMBER,
    INSTRUMENT_NUMBER,
    INSTRUMENT_FUNCTION,
];

/// Provenance of a rule definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleSource {
    /// Shipped with the registry; permanent.
    Default,
    /// Created by the user.
    User,
    /// A user edit of a built-in rule; shadows the default of the same id.
    UserOverride,
}

/// One classification rule.
#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct PatternRule {
    /// Stable identifier; user overrides reuse the built-in's id.
    pub id: String,
    /// Regular expression source. Always compilable once stored.
    pub pattern: String,
    /// Category a match is classified as.
    pub category: TagCategory,
    /// Highlight color as `#rrggbb`, for the presentation layer.
    pub color: String,
    /// Human-readable description of the convention the rule encodes.
    pub description: String,
    /// Disabled rules keep their definition but never match.
    pub enabled: bool,
    /// Priority user rules are tried before non-priority user rules.
    /// Has no effect on built-ins, whose order is fixed.
    pub priority: bool,
    /// Provenance; maintained by the registry, not by callers.
    pub source: RuleSource,
}

impl PatternRule {
    /// Convenience constructor for a user rule with the common defaults
    /// (enabled, non-priority).
    pub fn user(
        id: impl Into<String>,
        pattern: impl Into<String>,
        category: TagCategory,
        color: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            pattern: pattern.into(),
            category,
            color: color.into(),
            description: description.into(),
            enabled: true,
            priority: false,
            source: RuleSource::User,
        }
    }
}

/// Serializable snapshot of a registry's rule set (rule id → rule fields).
///
/// This is the flat structure persisted by a [`PatternStore`] and shared
/// between installations.
///
/// [`PatternStore`]: crate::store::PatternStore
#[derive(Debug, Clone, Default, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct PatternSet {
    pub rules: IndexMap<String, PatternRule>,
}

impl PatternSet {
    /// Serialize to a JSON string.
    pub fn to_json(&self) -> Result<String, PatternError> {
        serde_json::to_string_pretty(self).map_err(|e| PatternError::Storage(e.to_string()))
    }

    /// Deserialize from a JSON string. Regexes are *not* validated here;
    /// validation happens on [`PatternRegistry::import`], which is the only
    /// way a set enters a registry.
    pub fn from_json(json: &str) -> Result<Self, PatternError> {
        serde_json::from_str(json).map_err(|e| PatternError::Storage(e.to_string()))
    }
}

/// The rule registry. See the module docs for the ordering and shadowing
/// contract.
#[derive(Debug, Clone)]
pub struct PatternRegistry {
    defaults: IndexMap<String, PatternRule>,
    user: IndexMap<String, PatternRule>,
    /// Compiled regex per effective rule id. A missing entry means the
    /// stored pattern failed to compile and the rule silently never matches.
    compiled: HashMap<String, Regex>,
}

impl Default for PatternRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternRegistry {
    /// Create a registry holding the built-in rules.
    ///
    /// The default patterns encode common P&ID drafting conventions:
    /// line numbers like `100-PS-1234-A1B2`, equipment numbers like
    /// `V28-E-0003`, bare 4-digit instrument loop numbers, and 2–4 letter
    /// instrument function codes like `PT` or `FIC`.
    pub fn new() -> Self {
        let mut registry = Self {
            defaults: Self::default_rules(),
            user: IndexMap::new(),
            compiled: HashMap::new(),
        };
        registry.recompile_all();
        registry
    }

    fn default_rules() -> IndexMap<String, PatternRule> {
        let mut rules = IndexMap::new();
        let mut add = |id: &str, pattern: &str, category, color: &str, description: &str| {
            rules.insert(
                id.to_string(),
                PatternRule {
                    id: id.to_string(),
                    pattern: pattern.to_string(),
                    category,
                    color: color.to_string(),
                    description: description.to_string(),
                    enabled: true,
                    priority: true,
                    source: RuleSource::Default,
                },
            );
        };
        add(
            LINE_NUMBER,
            r"^.+-[A-Z\d]{1,4}-\s?\d{3,5}-[A-Z\d]{3,7}$",
            TagCategory::Line,
            "#ffff00",
            "Line number format (e.g. 100-PS-1234-A1B2)",
        );
        add(
            EQUIPMENT_NUMBER,
            r"^[A-Z\d]+-[A-Z]{1,2}-\d{4}$",
            TagCategory::Equipment,
            "#008000",
            "Equipment number format (e.g. V28-E-0003)",
        );
        add(
            INSTRUMENT_NUMBER,
            r"^\d{4}\s?[A-Za-z0-9-]{0,3}$",
            TagCategory::Instrument,
            "#ff0000",
            "Instrument loop number format (e.g. 1234)",
        );
        add(
            INSTRUMENT_FUNCTION,
            r"^[A-Z]{2,4}$",
            TagCategory::Instrument,
            "#0000ff",
            "Instrument function code (e.g. PT, TT, FIC)",
        );
        rules
    }

    fn recompile_all(&mut self) {
        self.compiled.clear();
        let ids: Vec<String> = self
            .defaults
            .keys()
            .chain(self.user.keys())
            .cloned()
            .collect();
        for id in ids {
            self.recompile(&id);
        }
    }

    fn recompile(&mut self, id: &str) {
        self.compiled.remove(id);
        if let Some(rule) = self.effective(id) {
            if let Ok(re) = Regex::new(&rule.pattern) {
                self.compiled.insert(id.to_string(), re);
            }
        }
    }

    /// The rule that is in force for `id`: the user override if one exists,
    /// else the built-in definition.
    pub fn effective(&self, id: &str) -> Option<&PatternRule> {
        self.user.get(id).or_else(|| self.defaults.get(id))
    }

    /// Whether `id` names a built-in rule (shadowed or not).
    pub fn is_builtin(&self, id: &str) -> bool {
        self.defaults.contains_key(id)
    }

    /// The enabled rules in classification order: built-ins first in their
    /// fixed order, then priority user rules, then the remaining user
    /// rules, each group in insertion order. A user override shadows its
    /// built-in entirely — never both.
    pub fn active(&self) -> Vec<&PatternRule> {
        let mut rules: Vec<&PatternRule> = Vec::new();
        for id in BUILTIN_ORDER {
            if let Some(rule) = self.effective(id) {
                if rule.enabled {
                    rules.push(rule);
                }
            }
        }
        let customs = || {
            self.user
                .values()
                .filter(|r| !self.defaults.contains_key(&r.id) && r.enabled)
        };
        rules.extend(customs().filter(|r| r.priority));
        rules.extend(customs().filter(|r| !r.priority));
        rules
    }

    /// Test `text` against the active rules in classification order and
    /// return the first matching rule, or `None`.
    ///
    /// A stored-but-broken pattern never matches; one bad rule cannot blank
    /// an entire recognition run.
    pub fn classify(&self, text: &str) -> Option<&PatternRule> {
        self.active()
            .into_iter()
            .find(|rule| self.compiled.get(&rule.id).is_some_and(|re| re.is_match(text)))
    }

    /// The compiled regex in force for `id`, if the rule exists, is
    /// enabled, and compiles. Used by the instrument matcher to test
    /// fragments in bulk without re-running the full priority chain.
    pub fn compiled_rule(&self, id: &str) -> Option<&Regex> {
        let rule = self.effective(id)?;
        if !rule.enabled {
            return None;
        }
        self.compiled.get(id)
    }

    /// Check that a pattern compiles, without storing anything.
    pub fn validate(pattern: &str) -> Result<(), PatternError> {
        Regex::new(pattern).map(|_| ()).map_err(|e| PatternError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
    }

    /// Validate a pattern and report whether it matches `text`.
    ///
    /// This backs the interactive rule tester; unlike `classify` it reports
    /// a broken pattern as an error so the user gets synchronous feedback.
    pub fn test_pattern(pattern: &str, text: &str) -> Result<bool, PatternError> {
        let re = Regex::new(pattern).map_err(|e| PatternError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(re.is_match(text))
    }

    /// Insert or update a rule. Editing a built-in id stores a user
    /// override; the built-in definition is kept for reset. The pattern is
    /// validated first — on rejection nothing changes.
    pub fn upsert(&mut self, mut rule: PatternRule) -> Result<(), PatternError> {
        Self::validate(&rule.pattern)?;
        rule.source = if self.defaults.contains_key(&rule.id) {
            RuleSource::UserOverride
        } else {
            RuleSource::User
        };
        let id = rule.id.clone();
        self.user.insert(id.clone(), rule);
        self.recompile(&id);
        Ok(())
    }

    /// Remove a user rule, or revert a built-in to its shipped definition
    /// by removing its override. Removing an unshadowed built-in is an
    /// error — disable it instead.
    pub fn remove(&mut self, id: &str) -> Result<(), PatternError> {
        if self.user.shift_remove(id).is_some() {
            self.recompile(id);
            return Ok(());
        }
        if self.defaults.contains_key(id) {
            return Err(PatternError::BuiltinRule(id.to_string()));
        }
        Err(PatternError::UnknownRule(id.to_string()))
    }

    /// Enable or disable a rule without touching its definition. Disabling
    /// a built-in stores an override flagged disabled, so the shipped
    /// definition stays recoverable.
    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> Result<(), PatternError> {
        if let Some(rule) = self.user.get_mut(id) {
            rule.enabled = enabled;
            return Ok(());
        }
        if let Some(default) = self.defaults.get(id) {
            let mut rule = default.clone();
            rule.enabled = enabled;
            rule.source = RuleSource::UserOverride;
            self.user.insert(id.to_string(), rule);
            self.recompile(id);
            return Ok(());
        }
        Err(PatternError::UnknownRule(id.to_string()))
    }

    /// Discard every user rule and override, restoring the shipped rule
    /// set.
    pub fn reset_to_defaults(&mut self) {
        self.user.clear();
        self.recompile_all();
    }

    /// Snapshot the effective rule set for persistence or sharing:
    /// built-ins (as shadowed, if shadowed) in their fixed order, then user
    /// rules in insertion order.
    pub fn export(&self) -> PatternSet {
        let mut rules = IndexMap::new();
        for id in BUILTIN_ORDER {
            if let Some(rule) = self.effective(id) {
                rules.insert(id.to_string(), rule.clone());
            }
        }
        for rule in self.user.values() {
            if !self.defaults.contains_key(&rule.id) {
                rules.insert(rule.id.clone(), rule.clone());
            }
        }
        PatternSet { rules }
    }

    /// Replace this registry's user rules with the contents of `set`.
    ///
    /// All-or-nothing: every pattern is validated before any mutation, and
    /// one invalid rule rejects the whole import with prior state intact.
    /// Imported rules whose id and fields coincide with a built-in are
    /// recognized as the built-in rather than stored as overrides.
    pub fn import(&mut self, set: &PatternSet) -> Result<(), PatternError> {
        for rule in set.rules.values() {
            Self::validate(&rule.pattern)?;
        }
        self.user.clear();
        for rule in set.rules.values() {
            if let Some(default) = self.defaults.get(&rule.id) {
                let unchanged = rule.pattern == default.pattern
                    && rule.category == default.category
                    && rule.color == default.color
                    && rule.description == default.description
                    && rule.enabled == default.enabled
                    && rule.priority == default.priority;
                if unchanged {
                    continue;
                }
            }
            // Already validated; cannot fail.
            self.upsert(rule.clone())?;
        }
        self.recompile_all();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_active_in_fixed_order() {
        let registry = PatternRegistry::new();
        let ids: Vec<&str> = registry.active().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                LINE_NUMBER,
                EQUIPMENT_NUMBER,
                INSTRUMENT_NUMBER,
                INSTRUMENT_FUNCTION
            ]
        );
    }

    #[test]
    fn classify_default_conventions() {
        let registry = PatternRegistry::new();
        assert_eq!(
            registry.classify("100-PS-1234-A1B2").map(|r| r.id.as_str()),
            Some(LINE_NUMBER)
        );
        assert_eq!(
            registry.classify("V28-E-0003").map(|r| r.id.as_str()),
            Some(EQUIPMENT_NUMBER)
        );
        assert_eq!(
            registry.classify("1234").map(|r| r.id.as_str()),
            Some(INSTRUMENT_NUMBER)
        );
        assert_eq!(
            registry.classify("PT").map(|r| r.id.as_str()),
            Some(INSTRUMENT_FUNCTION)
        );
        assert_eq!(registry.classify("lowercase text"), None);
    }

    #[test]
    fn builtin_beats_user_rule_on_overlap() {
        let mut registry = PatternRegistry::new();
        // Matches everything, including texts the built-ins match.
        registry
            .upsert(PatternRule::user(
                "catch_all",
                r"^.*$",
                TagCategory::Equipment,
                "#123456",
                "catch-all",
            ))
            .unwrap();
        // Built-in category still wins by priority order.
        assert_eq!(
            registry.classify("V28-E-0003").map(|r| r.id.as_str()),
            Some(EQUIPMENT_NUMBER)
        );
        // Texts no built-in matches fall through to the user rule.
        assert_eq!(
            registry.classify("anything else").map(|r| r.id.as_str()),
            Some("catch_all")
        );
    }

    #[test]
    fn priority_user_rules_precede_other_user_rules() {
        let mut registry = PatternRegistry::new();
        registry
            .upsert(PatternRule::user(
                "late",
                r"^ZZ-\d+$",
                TagCategory::Equipment,
                "#111111",
                "",
            ))
            .unwrap();
        let mut prioritized = PatternRule::user(
            "early",
            r"^ZZ-\d+$",
            TagCategory::Line,
            "#222222",
            "",
        );
        prioritized.priority = true;
        registry.upsert(prioritized).unwrap();

        // Inserted second but tried first.
        assert_eq!(registry.classify("ZZ-42").map(|r| r.id.as_str()), Some("early"));
    }

    #[test]
    fn invalid_pattern_rejected_without_corruption() {
        let mut registry = PatternRegistry::new();
        let err = registry
            .upsert(PatternRule::user(
                "broken",
                "[unclosed",
                TagCategory::Equipment,
                "#000000",
                "",
            ))
            .unwrap_err();
        assert!(matches!(err, PatternError::InvalidPattern { .. }));
        assert!(registry.effective("broken").is_none());
        // Prior rules still classify.
        assert!(registry.classify("1234").is_some());
    }

    #[test]
    fn editing_a_default_creates_a_shadowing_override() {
        let mut registry = PatternRegistry::new();
        let mut edited = registry.effective(INSTRUMENT_FUNCTION).unwrap().clone();
        edited.pattern = r"^[A-Z]{2,5}$".to_string();
        registry.upsert(edited).unwrap();

        let rule = registry.effective(INSTRUMENT_FUNCTION).unwrap();
        assert_eq!(rule.source, RuleSource::UserOverride);
        assert_eq!(rule.pattern, r"^[A-Z]{2,5}$");
        // The override's pattern is the one in force.
        assert_eq!(
            registry.classify("ABCDE").map(|r| r.id.as_str()),
            Some(INSTRUMENT_FUNCTION)
        );
        // Exactly one instrument_function rule is active.
        let count = registry
            .active()
            .iter()
            .filter(|r| r.id == INSTRUMENT_FUNCTION)
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn remove_reverts_override_and_rejects_builtin_deletion() {
        let mut registry = PatternRegistry::new();
        let mut edited = registry.effective(INSTRUMENT_FUNCTION).unwrap().clone();
        edited.pattern = r"^[A-Z]{5}$".to_string();
        registry.upsert(edited).unwrap();
        assert!(registry.classify("PT").is_none() || registry.classify("PT").unwrap().id != INSTRUMENT_FUNCTION);

        registry.remove(INSTRUMENT_FUNCTION).unwrap();
        assert_eq!(
            registry.effective(INSTRUMENT_FUNCTION).unwrap().source,
            RuleSource::Default
        );
        assert_eq!(
            registry.classify("PT").map(|r| r.id.as_str()),
            Some(INSTRUMENT_FUNCTION)
        );

        // No override present anymore: deletion is refused.
        let err = registry.remove(INSTRUMENT_FUNCTION).unwrap_err();
        assert!(matches!(err, PatternError::BuiltinRule(_)));
        let err = registry.remove("does_not_exist").unwrap_err();
        assert!(matches!(err, PatternError::UnknownRule(_)));
    }

    #[test]
    fn disabling_hides_without_deleting() {
        let mut registry = PatternRegistry::new();
        registry.set_enabled(LINE_NUMBER, false).unwrap();
        assert!(registry.active().iter().all(|r| r.id != LINE_NUMBER));
        assert_eq!(registry.classify("100-PS-1234-A1B2"), None);

        // Definition is still there, and reset restores it.
        assert!(registry.effective(LINE_NUMBER).is_some());
        registry.reset_to_defaults();
        assert!(registry.classify("100-PS-1234-A1B2").is_some());
    }

    #[test]
    fn test_pattern_reports_matches_and_errors() {
        assert_eq!(PatternRegistry::test_pattern(r"^\d+$", "123"), Ok(true));
        assert_eq!(PatternRegistry::test_pattern(r"^\d+$", "abc"), Ok(false));
        assert!(PatternRegistry::test_pattern("[bad", "x").is_err());
    }

    #[test]
    fn export_import_round_trip() {
        let mut registry = PatternRegistry::new();
        registry
            .upsert(PatternRule::user(
                "custom",
                r"^X-\d{2}$",
                TagCategory::Equipment,
                "#abcdef",
                "custom equipment",
            ))
            .unwrap();
        registry.set_enabled(INSTRUMENT_NUMBER, false).unwrap();

        let exported = registry.export();
        let json = exported.to_json().unwrap();
        let restored_set = PatternSet::from_json(&json).unwrap();

        let mut fresh = PatternRegistry::new();
        fresh.import(&restored_set).unwrap();

        let original: Vec<(String, String, bool)> = registry
            .active()
            .iter()
            .map(|r| (r.id.clone(), r.pattern.clone(), r.enabled))
            .collect();
        let imported: Vec<(String, String, bool)> = fresh
            .active()
            .iter()
            .map(|r| (r.id.clone(), r.pattern.clone(), r.enabled))
            .collect();
        assert_eq!(original, imported);
        assert!(fresh.classify("X-42").is_some());
        assert_eq!(fresh.classify("1234"), None); // disabled survived the trip
    }

    #[test]
    fn import_is_atomic() {
        let mut registry = PatternRegistry::new();
        registry
            .upsert(PatternRule::user(
                "keep_me",
                r"^K-\d$",
                TagCategory::Equipment,
                "#000000",
                "",
            ))
            .unwrap();

        let mut set = PatternSet::default();
        set.rules.insert(
            "ok".to_string(),
            PatternRule::user("ok", r"^\d$", TagCategory::Line, "#000000", ""),
        );
        set.rules.insert(
            "bad".to_string(),
            PatternRule::user("bad", "[unclosed", TagCategory::Line, "#000000", ""),
        );

        let err = registry.import(&set).unwrap_err();
        assert!(matches!(err, PatternError::InvalidPattern { .. }));
        // Nothing was applied: the pre-import user rule is intact and the
        // valid half of the import is absent.
        assert!(registry.effective("keep_me").is_some());
        assert!(registry.effective("ok").is_none());
    }
}
