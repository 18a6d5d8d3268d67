use crate::precision::{deserialize_decimal_text, parse_coordinate, CoordinateField};
use crate::types::{CrimeCategory, IncidentRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_SEVERITY: i64 = 1;
pub const MAX_SEVERITY: i64 = 10;

/// Rejections raised while turning client payloads into records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid {field} '{value}'")]
    InvalidCoordinate { field: &'static str, value: String },
    #[error("{field} '{value}' is out of range")]
    CoordinateOutOfRange { field: &'static str, value: String },
    #[error("unknown incident type '{0}'")]
    UnknownCategory(String),
    #[error("unknown date range '{0}'")]
    UnknownDateRange(String),
    #[error("severity {0} must be between 1 and 10")]
    SeverityOutOfRange(i64),
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("{0} must not be empty")]
    Blank(&'static str),
    #[error("invalid email '{0}'")]
    InvalidEmail(String),
    #[error("invalid {field}: {reason}")]
    InvalidEvidence { field: &'static str, reason: String },
}

/// Incident report as submitted by a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewIncident {
    #[serde(deserialize_with = "deserialize_decimal_text")]
    pub lat: String,
    #[serde(deserialize_with = "deserialize_decimal_text")]
    pub lng: String,
    #[serde(rename = "type")]
    pub category: String,
    pub severity: i64,
    pub date: String,
    pub description: String,
}

impl NewIncident {
    /// Validate every field and build the immutable record.
    pub fn into_record(self, id: String) -> Result<IncidentRecord, ValidationError> {
        let lat = parse_coordinate(CoordinateField::Latitude, &self.lat)?;
        let lng = parse_coordinate(CoordinateField::Longitude, &self.lng)?;
        let category: CrimeCategory = self.category.parse()?;

        if !(MIN_SEVERITY..=MAX_SEVERITY).contains(&self.severity) {
            return Err(ValidationError::SeverityOutOfRange(self.severity));
        }

        let occurred_on = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d")
            .map_err(|_| ValidationError::InvalidDate(self.date.clone()))?;

        let description = self.description.trim();
        if description.is_empty() {
            return Err(ValidationError::Blank("description"));
        }

        Ok(IncidentRecord {
            id,
            lat,
            lng,
            category,
            severity: self.severity as u8,
            occurred_on,
            description: description.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn report() -> NewIncident {
        NewIncident {
            lat: "26.8500".to_string(),
            lng: "80.9500".to_string(),
            category: "Theft".to_string(),
            severity: 3,
            date: "2024-08-15".to_string(),
            description: "A purse was snatched near the market.".to_string(),
        }
    }

    #[test]
    fn test_valid_report() {
        let record = report().into_record("abc".to_string()).unwrap();
        assert_eq!(record.id, "abc");
        assert_eq!(record.lat, dec!(26.8500));
        assert_eq!(record.category, CrimeCategory::Theft);
        assert_eq!(record.severity, 3);
        assert_eq!(record.occurred_on, NaiveDate::from_ymd_opt(2024, 8, 15).unwrap());
    }

    #[test]
    fn test_numeric_coordinates_accepted() {
        let json = r#"{"lat":26.85,"lng":"80.95","type":"Assault","severity":6,"date":"2024-07-28","description":"x"}"#;
        let report: NewIncident = serde_json::from_str(json).unwrap();
        assert_eq!(report.lat, "26.85");
        let record = report.into_record("1".to_string()).unwrap();
        assert_eq!(record.lng, dec!(80.95));
    }

    #[test]
    fn test_severity_bounds() {
        for severity in [0, 11, -3] {
            let mut r = report();
            r.severity = severity;
            assert_eq!(
                r.into_record("x".to_string()),
                Err(ValidationError::SeverityOutOfRange(severity))
            );
        }
        let mut r = report();
        r.severity = 10;
        assert!(r.into_record("x".to_string()).is_ok());
    }

    #[test]
    fn test_rejections() {
        let mut r = report();
        r.category = "Arson".to_string();
        assert!(matches!(r.into_record("x".into()), Err(ValidationError::UnknownCategory(_))));

        let mut r = report();
        r.date = "15/08/2024".to_string();
        assert!(matches!(r.into_record("x".into()), Err(ValidationError::InvalidDate(_))));

        let mut r = report();
        r.description = "   ".to_string();
        assert_eq!(r.into_record("x".into()), Err(ValidationError::Blank("description")));

        let mut r = report();
        r.lat = "91".to_string();
        assert!(matches!(
            r.into_record("x".into()),
            Err(ValidationError::CoordinateOutOfRange { field: "lat", .. })
        ));
    }
}
