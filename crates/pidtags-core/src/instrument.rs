//! Spatial instrument matcher.
//!
//! Instrument tags are printed as two separate fragments: a short
//! alphabetic function code (`PT`) stacked over a numeric loop number
//! (`1234`). This module reconstructs the compound tag (`PT-1234`) from
//! the fragments' relative positions:
//!
//! 1. Estimate a vertical search window from the page set's own
//!    statistics (mean text height, then the 75th percentile of observed
//!    number/function spacing) instead of one fixed constant — dense
//!    layouts get a tight window, sparse layouts a wider one.
//! 2. For each loop number, collect function-code candidates inside a
//!    vertical band above it and a horizontal band around its midpoint.
//! 3. Prefer candidates above the number; score the rest with vertical
//!    distance weighted 4x over horizontal and take the minimum, first
//!    encounter winning ties.
//! 4. If the bands are empty, fall back to the nearest function code on
//!    the page, accepted only under a fixed distance ceiling; otherwise
//!    the number is emitted with no function, never a fabricated one.
//!
//! The matcher is a pure function of (items, rules): it keeps no state
//! between runs and mutates nothing it is given.

use regex::Regex;

use crate::registry::{INSTRUMENT_FUNCTION, INSTRUMENT_NUMBER, PatternRegistry};
use crate::tags::{ClassifiedTag, InstrumentParts, TagCategory};
use crate::text::TextItem;

/// Instrument function-code descriptions (ISA-5.1 style). Unknown codes
/// degrade to `"<code> Instrument"`.
const FUNCTION_LABELS: &[(&str, &str)] = &[
    ("PT", "Pressure Transmitter"),
    ("PI", "Pressure Indicator"),
    ("PG", "Pressure Gauge"),
    ("PS", "Pressure Switch"),
    ("PE", "Pressure Element"),
    ("PIC", "Pressure Indicating Controller"),
    ("PCV", "Pressure Control Valve"),
    ("PSV", "Pressure Safety Valve"),
    ("PDT", "Differential Pressure Transmitter"),
    ("PDI", "Differential Pressure Indicator"),
    ("TT", "Temperature Transmitter"),
    ("TI", "Temperature Indicator"),
    ("TG", "Temperature Gauge"),
    ("TE", "Temperature Element"),
    ("TW", "Thermowell"),
    ("TS", "Temperature Switch"),
    ("TIC", "Temperature Indicating Controller"),
    ("TCV", "Temperature Control Valve"),
    ("FT", "Flow Transmitter"),
    ("FI", "Flow Indicator"),
    ("FE", "Flow Element"),
    ("FS", "Flow Switch"),
    ("FIC", "Flow Indicating Controller"),
    ("FCV", "Flow Control Valve"),
    ("LT", "Level Transmitter"),
    ("LI", "Level Indicator"),
    ("LG", "Level Gauge"),
    ("LS", "Level Switch"),
    ("LIC", "Level Indicating Controller"),
    ("LCV", "Level Control Valve"),
    ("AT", "Analyzer Transmitter"),
    ("AI", "Analyzer Indicator"),
    ("AIT", "Analyzer Indicating Transmitter"),
    ("ZT", "Position Transmitter"),
    ("ZS", "Position Switch"),
    ("HS", "Hand Switch"),
    ("HV", "Hand Valve"),
    ("XV", "On-Off Valve"),
];

/// Tuning constants for the matcher.
///
/// The defaults are empirically tuned against real drawing sets; they are
/// exposed as configuration rather than hard-coded because drafting
/// conventions vary between engineering houses.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchOptions {
    /// Provisional search height is this multiple of the mean text height.
    pub height_multiplier: f64,
    /// Lower bound on the search height; guards against pathologically
    /// narrow windows on sparse pages.
    pub search_height_floor: f64,
    /// Vertical bound when collecting number/function pairs for the
    /// spacing statistic.
    pub pair_vertical_bound: f64,
    /// Horizontal centroid bound when collecting pairs for the statistic.
    pub pair_horizontal_bound: f64,
    /// Multiplier applied to the 75th-percentile spacing.
    pub percentile_multiplier: f64,
    /// Horizontal half-width is this multiple of the number's width...
    pub width_multiplier: f64,
    /// ...but never narrower than this floor.
    pub horizontal_tolerance: f64,
    /// How far below the number's bottom the vertical band extends.
    pub below_slack: f64,
    /// Score weight for horizontal centroid distance.
    pub horizontal_weight: f64,
    /// Score weight for vertical distance to the candidate's center.
    pub vertical_weight: f64,
    /// Maximum centroid distance the page-wide fallback will accept.
    pub fallback_ceiling: f64,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            height_multiplier: 5.0,
            search_height_floor: 10.0,
            pair_vertical_bound: 80.0,
            pair_horizontal_bound: 100.0,
            percentile_multiplier: 1.3,
            width_multiplier: 2.0,
            horizontal_tolerance: 20.0,
            below_slack: 3.0,
            horizontal_weight: 0.5,
            vertical_weight: 2.0,
            fallback_ceiling: 100.0,
        }
    }
}

/// Search parameters derived from one page set. Recomputed on every run,
/// never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchParams {
    /// Height of the vertical band searched above each loop number.
    pub search_height: f64,
    /// Floor of the horizontal half-width around the number's midpoint.
    pub horizontal_tolerance: f64,
}

/// Diagnostic events emitted while matching. Consumed by an optional
/// callback so hosts can surface per-candidate detail without the matcher
/// carrying any logging of its own.
#[derive(Debug, Clone, Copy)]
pub enum TraceEvent<'a> {
    /// Search parameters estimated for this run.
    Params(SearchParams),
    /// The instrument number or function rule is absent or disabled;
    /// instrument recognition was skipped.
    RulesMissing,
    /// A candidate inside the bands was scored for a number.
    Candidate {
        number: &'a TextItem,
        function: &'a TextItem,
        score: f64,
    },
    /// The winning candidate for a number.
    Selected {
        number: &'a TextItem,
        function: &'a TextItem,
        score: f64,
    },
    /// The bands were empty; page-wide fallback ran. `function` is the
    /// accepted nearest neighbor, or `None` when nothing was inside the
    /// distance ceiling.
    Fallback {
        number: &'a TextItem,
        function: Option<&'a TextItem>,
        distance: Option<f64>,
    },
}

/// Human-readable instrument type for a function code.
pub fn function_type_label(code: &str) -> String {
    FUNCTION_LABELS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, label)| (*label).to_string())
        .unwrap_or_else(|| format!("{code} Instrument"))
}

/// Nearest-rank percentile of an unsorted, non-empty sample.
fn percentile(values: &[f64], q: f64) -> f64 {
    debug_assert!(!values.is_empty());
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let idx = (q * (sorted.len() - 1) as f64).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

/// Vertical distance between a loop number and a function candidate: the
/// number's top edge to the candidate's vertical center. The same quantity
/// drives both the spacing statistic and candidate scoring.
fn vertical_distance(number: &TextItem, function: &TextItem) -> f64 {
    (number.bbox.top - function.bbox.y_center()).abs()
}

/// Estimate the search window from the page set's own statistics.
///
/// Provisional height is `height_multiplier x` the mean height of
/// non-degenerate items, floored. When observably paired number/function
/// fragments exist within generous proximity bounds, the height is widened
/// to `percentile_multiplier x` their 75th-percentile vertical spacing if
/// that is larger. Widening only — a tight sample never shrinks the window
/// below the provisional value.
pub fn estimate_search_params(
    items: &[TextItem],
    number_re: &Regex,
    function_re: &Regex,
    options: &MatchOptions,
) -> SearchParams {
    let heights: Vec<f64> = items
        .iter()
        .filter(|i| !i.is_degenerate())
        .map(|i| i.bbox.height())
        .collect();
    let mut search_height = if heights.is_empty() {
        options.search_height_floor
    } else {
        let mean = heights.iter().sum::<f64>() / heights.len() as f64;
        (options.height_multiplier * mean).max(options.search_height_floor)
    };

    let mut spacings: Vec<f64> = Vec::new();
    for number in items.iter().filter(|i| number_re.is_match(i.text.trim())) {
        for function in items
            .iter()
            .filter(|i| i.page == number.page && function_re.is_match(i.text.trim()))
        {
            let dv = vertical_distance(number, function);
            let dh = (number.bbox.x_center() - function.bbox.x_center()).abs();
            if dv < options.pair_vertical_bound && dh < options.pair_horizontal_bound {
                spacings.push(dv);
            }
        }
    }
    if !spacings.is_empty() {
        let p75 = percentile(&spacings, 0.75);
        search_height = (options.percentile_multiplier * p75)
            .max(search_height)
            .max(options.search_height_floor);
    }

    SearchParams {
        search_height,
        horizontal_tolerance: options.horizontal_tolerance,
    }
}

/// Match instrument loop numbers with function codes and build the
/// combined tags.
///
/// Missing number/function rules are not an error: the result is empty
/// (and a [`TraceEvent::RulesMissing`] is emitted when tracing). Output
/// order follows the numbers' encounter order in `items`.
pub fn match_instruments(
    registry: &PatternRegistry,
    items: &[TextItem],
    options: &MatchOptions,
) -> Vec<ClassifiedTag> {
    run(registry, items, options, None)
}

/// [`match_instruments`] with a diagnostic callback.
pub fn match_instruments_with_trace(
    registry: &PatternRegistry,
    items: &[TextItem],
    options: &MatchOptions,
    trace: &mut dyn FnMut(TraceEvent<'_>),
) -> Vec<ClassifiedTag> {
    run(registry, items, options, Some(trace))
}

fn emit(trace: &mut Option<&mut dyn FnMut(TraceEvent<'_>)>, event: TraceEvent<'_>) {
    if let Some(cb) = trace {
        cb(event);
    }
}

fn run(
    registry: &PatternRegistry,
    items: &[TextItem],
    options: &MatchOptions,
    mut trace: Option<&mut dyn FnMut(TraceEvent<'_>)>,
) -> Vec<ClassifiedTag> {
    let (Some(number_re), Some(function_re)) = (
        registry.compiled_rule(INSTRUMENT_NUMBER),
        registry.compiled_rule(INSTRUMENT_FUNCTION),
    ) else {
        #[cfg(feature = "tracing")]
        tracing::debug!("instrument rules absent or disabled; skipping instrument recognition");
        emit(&mut trace, TraceEvent::RulesMissing);
        return Vec::new();
    };

    let params = estimate_search_params(items, number_re, function_re, options);
    #[cfg(feature = "tracing")]
    tracing::debug!(
        search_height = params.search_height,
        horizontal_tolerance = params.horizontal_tolerance,
        "estimated instrument search parameters"
    );
    emit(&mut trace, TraceEvent::Params(params));

    let functions: Vec<&TextItem> = items
        .iter()
        .filter(|i| function_re.is_match(i.text.trim()))
        .collect();

    let mut tags = Vec::new();
    for number in items.iter().filter(|i| number_re.is_match(i.text.trim())) {
        let function = find_function(number, &functions, &params, options, &mut trace);
        tags.push(build_tag(number, function));
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(count = tags.len(), "instrument matching complete");
    tags
}

/// Steps 2–4 for one loop number: band search, scoring, fallback.
fn find_function<'a>(
    number: &TextItem,
    functions: &[&'a TextItem],
    params: &SearchParams,
    options: &MatchOptions,
    trace: &mut Option<&mut dyn FnMut(TraceEvent<'_>)>,
) -> Option<&'a TextItem> {
    let band_top = number.bbox.top - params.search_height;
    let band_bottom = number.bbox.bottom + options.below_slack;
    let half_width = (options.width_multiplier * number.bbox.width()).max(params.horizontal_tolerance);

    let candidates: Vec<&TextItem> = functions
        .iter()
        .copied()
        .filter(|f| {
            f.page == number.page
                && f.bbox.top >= band_top
                && f.bbox.top <= band_bottom
                && (f.bbox.x_center() - number.bbox.x_center()).abs() <= half_width
        })
        .collect();

    if candidates.is_empty() {
        // Step 4: page-wide nearest neighbor under an absolute ceiling.
        let nearest = functions
            .iter()
            .copied()
            .filter(|f| f.page == number.page)
            .map(|f| (f, number.bbox.center_distance(&f.bbox)))
            .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap());
        return match nearest {
            Some((f, distance)) if distance < options.fallback_ceiling => {
                emit(
                    trace,
                    TraceEvent::Fallback {
                        number,
                        function: Some(f),
                        distance: Some(distance),
                    },
                );
                Some(f)
            }
            _ => {
                emit(
                    trace,
                    TraceEvent::Fallback {
                        number,
                        function: None,
                        distance: nearest.map(|(_, d)| d),
                    },
                );
                None
            }
        };
    }

    // Step 3: prefer candidates above the number when any exist.
    let any_above = candidates.iter().any(|f| f.bbox.top < number.bbox.top);
    let mut best: Option<(&TextItem, f64)> = None;
    for f in candidates {
        if any_above && f.bbox.top >= number.bbox.top {
            continue;
        }
        let dx = (f.bbox.x_center() - number.bbox.x_center()).abs();
        let score =
            options.horizontal_weight * dx + options.vertical_weight * vertical_distance(number, f);
        emit(
            trace,
            TraceEvent::Candidate {
                number,
                function: f,
                score,
            },
        );
        // Strict comparison keeps the first-encountered candidate on ties.
        if best.is_none_or(|(_, s)| score < s) {
            best = Some((f, score));
        }
    }
    let (f, score) = best.expect("candidates is non-empty");
    emit(
        trace,
        TraceEvent::Selected {
            number,
            function: f,
            score,
        },
    );
    Some(f)
}

/// Step 5: fuse the fragments into a tag anchored at the number.
fn build_tag(number: &TextItem, function: Option<&TextItem>) -> ClassifiedTag {
    let loop_number = number.text.trim().to_string();
    let function_code = function.map(|f| f.text.trim().to_string());
    let name = match &function_code {
        Some(code) => format!("{code}-{loop_number}"),
        None => loop_number.clone(),
    };
    let type_label = match &function_code {
        Some(code) => function_type_label(code),
        None => "Instrument".to_string(),
    };
    ClassifiedTag {
        id: ClassifiedTag::make_id(TagCategory::Instrument, &name),
        name,
        category: TagCategory::Instrument,
        type_label,
        recognized: true,
        matched_rule: Some(INSTRUMENT_NUMBER.to_string()),
        page: Some(number.page),
        position: Some(number.bbox),
        instrument: Some(InstrumentParts {
            number: loop_number,
            function: function_code,
        }),
        line: None,
    }
}
