use crate::types::{IncidentRecord, Viewport};

/// Incidents whose coordinates fall inside the viewport, boundaries included.
/// Input order is preserved.
pub fn filter_by_viewport(incidents: &[IncidentRecord], viewport: &Viewport) -> Vec<IncidentRecord> {
    incidents
        .iter()
        .filter(|incident| viewport.contains(incident.point()))
        .cloned()
        .collect()
}
