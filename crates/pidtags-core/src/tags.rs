//! Recognition output types.
//!
//! A recognition run produces a [`TagSet`]: per-category, insertion-ordered
//! sequences of [`ClassifiedTag`]. Tags are plain data — the presentation
//! and export layers that consume them live outside this crate.

use crate::geometry::BBox;

/// Domain category of a recognized tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagCategory {
    /// Static equipment: pumps, vessels, exchangers, ...
    Equipment,
    /// Piping line numbers.
    Line,
    /// Instrument tags (function code + loop number).
    Instrument,
}

impl TagCategory {
    /// String tag for this category, as used in serialized rule sets and
    /// deterministic tag ids.
    pub fn as_str(&self) -> &'static str {
        match self {
            TagCategory::Equipment => "equipment",
            TagCategory::Line => "line",
            TagCategory::Instrument => "instrument",
        }
    }
}

impl std::fmt::Display for TagCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two fragments of a compound instrument tag.
#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct InstrumentParts {
    /// The loop number fragment (e.g. `"1234"`).
    pub number: String,
    /// The function code fragment (e.g. `"PT"`), if one was paired.
    /// `None` is the expected no-candidate outcome, not an error.
    pub function: Option<String>,
}

/// Advisory attributes parsed from a line tag.
///
/// Both fields are best-effort; absence is normal for drafting conventions
/// that omit them.
#[derive(Debug, Clone, PartialEq, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct LineParts {
    /// Leading nominal size token (e.g. `"100"` from `100-PS-1234-A1B2`).
    pub size: Option<String>,
    /// 1–3 letter service code (e.g. `"PS"`).
    pub service: Option<String>,
}

/// One recognized tag.
#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct ClassifiedTag {
    /// Deterministic identifier, `"<category>:<name>"`.
    pub id: String,
    /// Display name. For instruments this is the fused
    /// `"<function>-<number>"` form when a function was paired, else the
    /// bare number.
    pub name: String,
    /// Domain category.
    pub category: TagCategory,
    /// Human-readable type derived from the prefix / function-code tables.
    pub type_label: String,
    /// Whether the tag came out of pattern recognition (as opposed to a
    /// host adding it by hand downstream).
    pub recognized: bool,
    /// Id of the registry rule that matched, when known.
    pub matched_rule: Option<String>,
    /// Page the tag anchors to (1-based). Absent in degraded mode.
    pub page: Option<usize>,
    /// Anchor position. For instruments this is the loop-number fragment's
    /// box, not the function code's. Absent in degraded mode.
    pub position: Option<BBox>,
    /// Instrument-specific fragments; `Some` iff `category` is
    /// [`TagCategory::Instrument`].
    pub instrument: Option<InstrumentParts>,
    /// Line-specific attributes; `Some` iff `category` is
    /// [`TagCategory::Line`].
    pub line: Option<LineParts>,
}

impl ClassifiedTag {
    /// Deterministic id for a `(category, name)` pair. Identical tags map
    /// to identical ids, which is what makes re-runs idempotent and
    /// deduplication order-stable.
    pub fn make_id(category: TagCategory, name: &str) -> String {
        format!("{}:{}", category.as_str(), name)
    }
}

/// Recognition output: per-category, insertion-ordered tag sequences.
///
/// Insertion order is the order of first match in the input, which
/// downstream listing and export layers rely on.
#[derive(Debug, Clone, Default, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct TagSet {
    pub equipment: Vec<ClassifiedTag>,
    pub line: Vec<ClassifiedTag>,
    pub instrument: Vec<ClassifiedTag>,
}

impl TagSet {
    /// The tags recognized for one category.
    pub fn by_category(&self, category: TagCategory) -> &[ClassifiedTag] {
        match category {
            TagCategory::Equipment => &self.equipment,
            TagCategory::Line => &self.line,
            TagCategory::Instrument => &self.instrument,
        }
    }

    /// Total number of tags across all categories.
    pub fn len(&self) -> usize {
        self.equipment.len() + self.line.len() + self.instrument.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate all tags, equipment first, then line, then instrument.
    pub fn iter(&self) -> impl Iterator<Item = &ClassifiedTag> {
        self.equipment
            .iter()
            .chain(self.line.iter())
            .chain(self.instrument.iter())
    }

    /// Whether a `(category, name)` pair is already present.
    pub fn contains(&self, category: TagCategory, name: &str) -> bool {
        self.by_category(category).iter().any(|t| t.name == name)
    }

    /// Append a tag unless an identical `(category, name)` is already
    /// present. First occurrence wins; returns whether the tag was added.
    pub fn push_dedup(&mut self, tag: ClassifiedTag) -> bool {
        if self.contains(tag.category, &tag.name) {
            return false;
        }
        match tag.category {
            TagCategory::Equipment => self.equipment.push(tag),
            TagCategory::Line => self.line.push(tag),
            TagCategory::Instrument => self.instrument.push(tag),
        }
        true
    }
}
