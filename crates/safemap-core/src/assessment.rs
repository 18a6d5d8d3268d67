use crate::scoring::compute_safety_score;
use crate::spatial::filter_by_viewport;
use crate::temporal::filter_by_date_range;
use crate::types::{CrimeCategory, DateRange, IncidentRecord, SafetyScore, Viewport};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Incidents whose category is listed. An empty list keeps nothing.
pub fn filter_by_categories(
    incidents: &[IncidentRecord],
    categories: &[CrimeCategory],
) -> Vec<IncidentRecord> {
    incidents
        .iter()
        .filter(|incident| categories.contains(&incident.category))
        .cloned()
        .collect()
}

/// Filters selected on the map. `None` fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AreaQuery {
    pub viewport: Option<Viewport>,
    pub range: DateRange,
    pub categories: Option<Vec<CrimeCategory>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaAssessment {
    pub incidents: Vec<IncidentRecord>,
    pub safety: SafetyScore,
}

/// Apply category, date and viewport filters, then score what is left.
pub fn filter_area(incidents: &[IncidentRecord], query: &AreaQuery, now: NaiveDateTime) -> Vec<IncidentRecord> {
    let mut selected = match &query.categories {
        Some(categories) => filter_by_categories(incidents, categories),
        None => incidents.to_vec(),
    };
    selected = filter_by_date_range(&selected, query.range, now);
    if let Some(viewport) = &query.viewport {
        selected = filter_by_viewport(&selected, viewport);
    }
    selected
}

pub fn assess_area(incidents: &[IncidentRecord], query: &AreaQuery, now: NaiveDateTime) -> AreaAssessment {
    let incidents = filter_area(incidents, query, now);
    let safety = compute_safety_score(&incidents);
    AreaAssessment { incidents, safety }
}
