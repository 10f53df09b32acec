//! Favorite selection and ranking for the dashboard.
//!
//! The dashboard shows a bounded set of biomarker cards. Profiles pick
//! favorites explicitly; remaining slots are filled from a configurable
//! candidate pool ranked by popularity (recent + frequently measured).
//! Explicit picks always precede filler, and no name appears twice.
//!
//! This engine holds no state — the explicit list is persisted per-profile
//! by the caller, and the result is recomputed whenever inputs change.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use super::Biomarker;

/// Score bonus for appearing in the most recent report.
const RECENCY_BOOST: u32 = 3;

/// Default dashboard slot count.
pub const DEFAULT_MAX_SLOTS: usize = 8;

/// Default filler candidates, in priority order. Score ties keep this order,
/// so the list doubles as an implicit priority ranking — injectable via
/// [`FavoritesConfig`] rather than baked into the algorithm.
pub const DEFAULT_CANDIDATE_POOL: &[&str] = &[
    "Glucose",
    "HbA1c",
    "Total Cholesterol",
    "LDL Cholesterol",
    "HDL Cholesterol",
    "Triglycerides",
    "Hemoglobin",
    "Creatinine",
    "TSH",
    "Vitamin D",
    "ALT",
    "AST",
];

/// Slot bound and candidate pool for favorite selection.
#[derive(Debug, Clone)]
pub struct FavoritesConfig {
    pub max_slots: usize,
    pub candidate_pool: Vec<String>,
}

impl Default for FavoritesConfig {
    fn default() -> Self {
        Self {
            max_slots: DEFAULT_MAX_SLOTS,
            candidate_pool: DEFAULT_CANDIDATE_POOL.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Direction of change between the two most recent measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
    /// Either value is missing or not a finite number.
    Unknown,
}

/// One dashboard card: a biomarker's latest and previous measurements.
#[derive(Debug, Clone, Serialize)]
pub struct BiomarkerSummary {
    pub name: String,
    pub latest: Option<Biomarker>,
    pub previous: Option<Biomarker>,
    pub trend: Trend,
}

/// Classify the direction between two measurement values.
pub fn classify_trend(latest: Option<f64>, previous: Option<f64>) -> Trend {
    match (latest, previous) {
        (Some(l), Some(p)) if l.is_finite() && p.is_finite() => {
            if l > p {
                Trend::Increasing
            } else if l < p {
                Trend::Decreasing
            } else {
                Trend::Stable
            }
        }
        _ => Trend::Unknown,
    }
}

/// Select the ordered dashboard set: explicit favorites first (input order
/// preserved), then pool candidates ranked by popularity until `max_slots`
/// is reached. Never padded — fewer candidates than slots means a shorter
/// result.
pub fn select_favorites(
    all: &[Biomarker],
    explicit_names: &[String],
    config: &FavoritesConfig,
) -> Vec<BiomarkerSummary> {
    let history = MeasurementHistory::build(all);

    // Explicit pass — preserve order, drop repeats within the list itself.
    let mut selected: Vec<BiomarkerSummary> = Vec::new();
    for name in explicit_names {
        if selected.len() >= config.max_slots {
            break;
        }
        if selected.iter().any(|s| &s.name == name) {
            continue;
        }
        selected.push(history.summarize(name));
    }

    let explicit_count = selected.len();
    if explicit_count >= config.max_slots {
        return selected;
    }

    // Filler pass — pool minus explicit, restricted to measured names,
    // ranked by popularity. `sort_by` is stable, so ties keep pool order.
    let mut candidates: Vec<(&String, u32)> = config
        .candidate_pool
        .iter()
        .filter(|name| !explicit_names.contains(*name))
        .filter(|name| history.contains(name.as_str()))
        .map(|name| (name, history.popularity(name)))
        .collect();
    candidates.sort_by(|a, b| b.1.cmp(&a.1));

    for (name, score) in candidates.into_iter().take(config.max_slots - explicit_count) {
        tracing::debug!(name = %name, score, "Filler favorite selected");
        selected.push(history.summarize(name));
    }

    selected
}

/// Per-name measurement index over the full biomarker history.
struct MeasurementHistory<'a> {
    /// Measurements per name, most recent first.
    by_name: HashMap<&'a str, Vec<&'a Biomarker>>,
    /// The single latest report date across the whole set.
    latest_report: Option<NaiveDate>,
}

impl<'a> MeasurementHistory<'a> {
    fn build(all: &'a [Biomarker]) -> Self {
        let mut by_name: HashMap<&str, Vec<&Biomarker>> = HashMap::new();
        for b in all {
            by_name.entry(b.name.as_str()).or_default().push(b);
        }
        for measurements in by_name.values_mut() {
            // Stable: equal dates keep input order.
            measurements.sort_by(|a, b| b.report_date.cmp(&a.report_date));
        }
        let latest_report = all.iter().map(|b| b.report_date).max();
        Self { by_name, latest_report }
    }

    fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// `recency_boost + frequency`: +3 when the name appears in the globally
    /// latest report, plus the count of distinct report dates containing it.
    fn popularity(&self, name: &str) -> u32 {
        let Some(measurements) = self.by_name.get(name) else {
            return 0;
        };
        let mut dates: Vec<NaiveDate> = measurements.iter().map(|b| b.report_date).collect();
        dates.dedup(); // already sorted descending
        let frequency = dates.len() as u32;
        let recency = match self.latest_report {
            Some(latest) if dates.contains(&latest) => RECENCY_BOOST,
            _ => 0,
        };
        recency + frequency
    }

    fn summarize(&self, name: &str) -> BiomarkerSummary {
        let measurements = self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[]);
        let latest = measurements.first().map(|b| (*b).clone());
        let previous = measurements.get(1).map(|b| (*b).clone());
        let trend = classify_trend(
            latest.as_ref().map(|b| b.value),
            previous.as_ref().map(|b| b.value),
        );
        BiomarkerSummary {
            name: name.to_string(),
            latest,
            previous,
            trend,
        }
    }
}
