use crate::assessment::{assess_area, AreaQuery};
use crate::types::{DateRange, GeoPoint, IncidentRecord, SafetyScore, Viewport};
use chrono::NaiveDateTime;
use geo::{point, HaversineDistance};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteOptions {
    /// Degrees added around the endpoints' bounding box.
    pub corridor_padding: f64,
    pub walking_speed_kmh: f64,
    pub range: DateRange,
}

impl Default for RouteOptions {
    fn default() -> Self {
        Self {
            corridor_padding: 0.005,
            walking_speed_kmh: 5.0,
            range: DateRange::AllTime,
        }
    }
}

/// Straight-line estimate between two points; no road network involved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteEstimate {
    pub distance_km: f64,
    pub walking_minutes: u32,
    pub corridor: Viewport,
    pub incident_count: usize,
    pub safety: SafetyScore,
}

pub fn great_circle_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let from = point!(x: a.lng, y: a.lat);
    let to = point!(x: b.lng, y: b.lat);
    from.haversine_distance(&to) / 1000.0
}

pub fn estimate_route(
    origin: GeoPoint,
    destination: GeoPoint,
    incidents: &[IncidentRecord],
    options: &RouteOptions,
    now: NaiveDateTime,
) -> RouteEstimate {
    let distance_km = great_circle_km(origin, destination);
    let walking_minutes = if options.walking_speed_kmh > 0.0 {
        (distance_km / options.walking_speed_kmh * 60.0).ceil() as u32
    } else {
        0
    };

    let corridor = Viewport::spanning(origin, destination, options.corridor_padding);
    let query = AreaQuery {
        viewport: Some(corridor),
        range: options.range,
        categories: None,
    };
    let assessment = assess_area(incidents, &query, now);

    RouteEstimate {
        distance_km,
        walking_minutes,
        corridor,
        incident_count: assessment.incidents.len(),
        safety: assessment.safety,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::incident;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 9, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_one_degree_of_latitude() {
        let km = great_circle_km(GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 0.0));
        assert!((km - 111.2).abs() < 0.5, "got {}", km);
    }

    #[test]
    fn test_same_point() {
        let p = GeoPoint::new(26.85, 80.95);
        let estimate = estimate_route(p, p, &[], &RouteOptions::default(), now());
        assert_eq!(estimate.distance_km, 0.0);
        assert_eq!(estimate.walking_minutes, 0);
        assert_eq!(estimate.safety.score, 100);
    }

    #[test]
    fn test_corridor_picks_up_nearby_incidents() {
        let incidents = vec![
            incident("on_route", "26.8600", "80.9600", 8, "2024-08-20"),
            incident("near_destination", "26.8740", "80.9600", 8, "2024-08-20"),
            incident("far", "26.9500", "80.9600", 9, "2024-08-20"),
        ];
        let origin = GeoPoint::new(26.85, 80.95);
        let destination = GeoPoint::new(26.87, 80.97);
        let estimate = estimate_route(origin, destination, &incidents, &RouteOptions::default(), now());

        assert_eq!(estimate.incident_count, 2);
        // avg 8, penalty 4 -> 32
        assert_eq!(estimate.safety.score, 32);
        assert!(estimate.distance_km > 2.0 && estimate.distance_km < 3.5);
        assert!(estimate.walking_minutes >= 24 && estimate.walking_minutes <= 42);
    }

    #[test]
    fn test_range_applies_to_corridor() {
        let incidents = vec![incident("old", "26.86", "80.96", 8, "2023-01-01")];
        let options = RouteOptions {
            range: DateRange::LastThirtyDays,
            ..RouteOptions::default()
        };
        let estimate = estimate_route(
            GeoPoint::new(26.85, 80.95),
            GeoPoint::new(26.87, 80.97),
            &incidents,
            &options,
            now(),
        );
        assert_eq!(estimate.incident_count, 0);
        assert_eq!(estimate.safety.score, 100);
    }
}
