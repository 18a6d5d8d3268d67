use crate::types::{DateRange, IncidentRecord};
use chrono::{Duration, NaiveDateTime};

/// Earliest instant still inside `range` relative to `now`. `None` means no
/// cutoff, either for All Time or when the window reaches past the calendar.
pub fn range_cutoff(range: DateRange, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let days = range.window_days()?;
    now.checked_sub_signed(Duration::days(days))
}

/// Incidents that occurred on or after the range's cutoff. Incident dates are
/// compared at midnight, in the same implicit zone as `now`.
pub fn filter_by_date_range(
    incidents: &[IncidentRecord],
    range: DateRange,
    now: NaiveDateTime,
) -> Vec<IncidentRecord> {
    match range_cutoff(range, now) {
        None => incidents.to_vec(),
        Some(cutoff) => incidents
            .iter()
            .filter(|incident| incident.occurred_at() >= cutoff)
            .cloned()
            .collect(),
    }
}
