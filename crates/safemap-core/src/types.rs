use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::report::ValidationError;

/// Fixed set of incident categories shown on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrimeCategory {
    Theft,
    Assault,
    Burglary,
    Vandalism,
    Robbery,
}

impl CrimeCategory {
    pub const ALL: [CrimeCategory; 5] = [
        CrimeCategory::Theft,
        CrimeCategory::Assault,
        CrimeCategory::Burglary,
        CrimeCategory::Vandalism,
        CrimeCategory::Robbery,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CrimeCategory::Theft => "Theft",
            CrimeCategory::Assault => "Assault",
            CrimeCategory::Burglary => "Burglary",
            CrimeCategory::Vandalism => "Vandalism",
            CrimeCategory::Robbery => "Robbery",
        }
    }
}

impl fmt::Display for CrimeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CrimeCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        CrimeCategory::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ValidationError::UnknownCategory(s.to_string()))
    }
}

/// A reported crime incident. Coordinates keep the exact decimal text they
/// were reported with; use [`IncidentRecord::point`] for arithmetic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentRecord {
    pub id: String,
    pub lat: Decimal,
    pub lng: Decimal,
    #[serde(rename = "type")]
    pub category: CrimeCategory,
    pub severity: u8,
    #[serde(rename = "date")]
    pub occurred_on: NaiveDate,
    pub description: String,
}

impl IncidentRecord {
    pub fn point(&self) -> GeoPoint {
        // Decimal -> f64 never fails for values inside coordinate range; NaN
        // keeps anything odd out of every viewport.
        GeoPoint {
            lat: self.lat.to_f64().unwrap_or(f64::NAN),
            lng: self.lng.to_f64().unwrap_or(f64::NAN),
        }
    }

    pub fn occurred_at(&self) -> NaiveDateTime {
        self.occurred_on.and_time(NaiveTime::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.lat, self.lng)
    }
}

/// Axis-aligned map rectangle. No antimeridian handling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl Viewport {
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Self {
        Self {
            north,
            south,
            east,
            west,
        }
    }

    /// Closed-interval test on all four bounds. Inverted bounds are not
    /// corrected and simply match nothing.
    pub fn contains(&self, point: GeoPoint) -> bool {
        point.lat >= self.south
            && point.lat <= self.north
            && point.lng >= self.west
            && point.lng <= self.east
    }

    /// Smallest viewport holding both points, grown by `padding` degrees on
    /// every side.
    pub fn spanning(a: GeoPoint, b: GeoPoint, padding: f64) -> Self {
        Self {
            north: a.lat.max(b.lat) + padding,
            south: a.lat.min(b.lat) - padding,
            east: a.lng.max(b.lng) + padding,
            west: a.lng.min(b.lng) - padding,
        }
    }
}

/// Named date-range buckets offered by the filter panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DateRange {
    #[serde(rename = "Last 30 days")]
    LastThirtyDays,
    #[serde(rename = "Last 6 months")]
    LastSixMonths,
    #[default]
    #[serde(rename = "All Time")]
    AllTime,
}

impl DateRange {
    pub fn label(&self) -> &'static str {
        match self {
            DateRange::LastThirtyDays => "Last 30 days",
            DateRange::LastSixMonths => "Last 6 months",
            DateRange::AllTime => "All Time",
        }
    }

    /// Window length in days. Six months is approximated as 6 x 30 days.
    pub fn window_days(&self) -> Option<i64> {
        match self {
            DateRange::LastThirtyDays => Some(30),
            DateRange::LastSixMonths => Some(180),
            DateRange::AllTime => None,
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DateRange {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "last 30 days" | "30d" => Ok(DateRange::LastThirtyDays),
            "last 6 months" | "6m" => Ok(DateRange::LastSixMonths),
            "all time" | "all" => Ok(DateRange::AllTime),
            other => Err(ValidationError::UnknownDateRange(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SafetyLevel {
    #[serde(rename = "High Risk")]
    HighRisk,
    #[serde(rename = "Use Caution")]
    UseCaution,
    Moderate,
    Safe,
    #[serde(rename = "Very Safe")]
    VerySafe,
}

impl SafetyLevel {
    pub fn from_score(score: u8) -> Self {
        if score >= 80 {
            SafetyLevel::VerySafe
        } else if score >= 65 {
            SafetyLevel::Safe
        } else if score >= 45 {
            SafetyLevel::Moderate
        } else if score >= 25 {
            SafetyLevel::UseCaution
        } else {
            SafetyLevel::HighRisk
        }
    }

    pub fn color(&self) -> SafetyColor {
        match self {
            SafetyLevel::VerySafe | SafetyLevel::Safe => SafetyColor::Safe,
            SafetyLevel::Moderate => SafetyColor::Moderate,
            SafetyLevel::UseCaution | SafetyLevel::HighRisk => SafetyColor::Unsafe,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SafetyLevel::VerySafe => "Very Safe",
            SafetyLevel::Safe => "Safe",
            SafetyLevel::Moderate => "Moderate",
            SafetyLevel::UseCaution => "Use Caution",
            SafetyLevel::HighRisk => "High Risk",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafetyColor {
    Safe,
    Moderate,
    Unsafe,
}

/// Derived score for a set of incidents. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyScore {
    pub score: u8,
    pub level: SafetyLevel,
    pub color: SafetyColor,
}

impl SafetyScore {
    pub fn from_score(score: u8) -> Self {
        let level = SafetyLevel::from_score(score);
        Self {
            score,
            level,
            color: level.color(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_incident_json_shape() {
        let record = IncidentRecord {
            id: "1".to_string(),
            lat: dec!(26.8500),
            lng: dec!(80.9500),
            category: CrimeCategory::Theft,
            severity: 3,
            occurred_on: NaiveDate::from_ymd_opt(2024, 8, 15).unwrap(),
            description: "Purse snatched".to_string(),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["lat"], "26.8500");
        assert_eq!(json["lng"], "80.9500");
        assert_eq!(json["type"], "Theft");
        assert_eq!(json["date"], "2024-08-15");

        let back: IncidentRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
        assert_eq!(back.point(), GeoPoint::new(26.85, 80.95));
    }

    #[test]
    fn test_labels_serialize() {
        let score = SafetyScore::from_score(30);
        let json = serde_json::to_value(score).unwrap();
        assert_eq!(json["level"], "Use Caution");
        assert_eq!(json["color"], "unsafe");
        assert_eq!(serde_json::to_value(DateRange::LastSixMonths).unwrap(), "Last 6 months");
    }

    #[test]
    fn test_parse_date_range() {
        assert_eq!("Last 30 days".parse::<DateRange>().unwrap(), DateRange::LastThirtyDays);
        assert_eq!("6m".parse::<DateRange>().unwrap(), DateRange::LastSixMonths);
        assert_eq!(" ALL TIME ".parse::<DateRange>().unwrap(), DateRange::AllTime);
        assert!("last week".parse::<DateRange>().is_err());
    }

    #[test]
    fn test_parse_category() {
        assert_eq!("robbery".parse::<CrimeCategory>().unwrap(), CrimeCategory::Robbery);
        assert!("Arson".parse::<CrimeCategory>().is_err());
    }

    #[test]
    fn test_spanning_viewport() {
        let vp = Viewport::spanning(GeoPoint::new(26.9, 80.9), GeoPoint::new(26.8, 81.0), 0.01);
        assert!((vp.north - 26.91).abs() < 1e-9);
        assert!((vp.south - 26.79).abs() < 1e-9);
        assert!((vp.east - 81.01).abs() < 1e-9);
        assert!((vp.west - 80.89).abs() < 1e-9);
    }
}
