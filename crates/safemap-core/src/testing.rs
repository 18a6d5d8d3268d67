//! Record builders shared by the unit tests.

use crate::types::{CrimeCategory, IncidentRecord};
use chrono::NaiveDate;
use std::str::FromStr;

pub fn incident(id: &str, lat: &str, lng: &str, severity: u8, date: &str) -> IncidentRecord {
    IncidentRecord {
        id: id.to_string(),
        lat: rust_decimal::Decimal::from_str(lat).unwrap(),
        lng: rust_decimal::Decimal::from_str(lng).unwrap(),
        category: CrimeCategory::Theft,
        severity,
        occurred_on: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        description: format!("incident {}", id),
    }
}

pub fn incident_at(id: &str, lat: &str, lng: &str) -> IncidentRecord {
    incident(id, lat, lng, 5, "2024-08-15")
}

pub fn incident_on(id: &str, date: &str) -> IncidentRecord {
    incident(id, "26.85", "80.95", 5, date)
}

pub fn with_severity(severity: u8) -> IncidentRecord {
    incident("s", "26.85", "80.95", severity, "2024-08-15")
}

pub fn with_severities(severities: &[u8]) -> Vec<IncidentRecord> {
    severities.iter().copied().map(with_severity).collect()
}
