use crate::types::{IncidentRecord, SafetyScore};

/// Points removed per unit of average severity.
pub const SEVERITY_WEIGHT: f64 = 8.0;
/// Points removed per incident in the set, up to [`DENSITY_PENALTY_CAP`].
pub const DENSITY_PENALTY_PER_INCIDENT: f64 = 2.0;
pub const DENSITY_PENALTY_CAP: f64 = 30.0;

/// Score for an area with no incidents.
pub const EMPTY_AREA_SCORE: u8 = 100;

/// Collapse a set of incidents into a 0-100 safety score.
///
/// `100 - avg_severity * 8 - min(count * 2, 30)`, clamped to [0, 100] and
/// rounded half up. Level and color follow the rounded score. Severities are
/// not re-checked here; anything out of domain is absorbed by the clamp.
pub fn compute_safety_score(incidents: &[IncidentRecord]) -> SafetyScore {
    if incidents.is_empty() {
        return SafetyScore::from_score(EMPTY_AREA_SCORE);
    }

    let count = incidents.len() as f64;
    let total_severity: f64 = incidents.iter().map(|i| f64::from(i.severity)).sum();
    let average_severity = total_severity / count;

    let density_penalty = (count * DENSITY_PENALTY_PER_INCIDENT).min(DENSITY_PENALTY_CAP);
    let raw_score = 100.0 - average_severity * SEVERITY_WEIGHT - density_penalty;

    // Clamped to [0, 100] before the cast, so `as u8` cannot truncate
    let score = raw_score.clamp(0.0, 100.0).round() as u8;
    SafetyScore::from_score(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{with_severities, with_severity};
    use crate::types::{SafetyColor, SafetyLevel};

    #[test]
    fn test_empty_is_very_safe() {
        let score = compute_safety_score(&[]);
        assert_eq!(score.score, 100);
        assert_eq!(score.level, SafetyLevel::VerySafe);
        assert_eq!(score.color, SafetyColor::Safe);
    }

    #[test]
    fn test_single_low_severity() {
        // 100 - 3*8 - 2 = 74
        let score = compute_safety_score(&with_severities(&[3]));
        assert_eq!(score.score, 74);
        assert_eq!(score.level, SafetyLevel::Safe);
        assert_eq!(score.color, SafetyColor::Safe);
    }

    #[test]
    fn test_two_severe_incidents() {
        // avg 8.5 -> 100 - 68 - 4 = 28
        let score = compute_safety_score(&with_severities(&[9, 8]));
        assert_eq!(score.score, 28);
        assert_eq!(score.level, SafetyLevel::UseCaution);
        assert_eq!(score.color, SafetyColor::Unsafe);
    }

    #[test]
    fn test_density_penalty_caps_at_thirty() {
        // avg 1, penalty min(40, 30) -> 100 - 8 - 30 = 62
        let score = compute_safety_score(&with_severities(&[1; 20]));
        assert_eq!(score.score, 62);
        assert_eq!(score.level, SafetyLevel::Moderate);
        assert_eq!(score.color, SafetyColor::Moderate);
    }

    #[test]
    fn test_single_max_severity() {
        // 100 - 80 - 2 = 18
        let score = compute_safety_score(&with_severities(&[10]));
        assert_eq!(score.score, 18);
        assert_eq!(score.level, SafetyLevel::HighRisk);
    }

    #[test]
    fn test_rounds_half_up() {
        // avg 4/3 -> 100 - 10.666.. - 6 = 83.33 -> 83
        assert_eq!(compute_safety_score(&with_severities(&[1, 1, 2])).score, 83);
        // avg 1.0625 -> 100 - 8.5 - 30 = 61.5 -> 62
        let mut severities = vec![1u8; 15];
        severities.push(2);
        assert_eq!(compute_safety_score(&with_severities(&severities)).score, 62);
    }

    #[test]
    fn test_level_follows_rounded_score() {
        // avg 51/16 -> 100 - 25.5 - 30 = 44.5, rounds up into Moderate
        let mut severities = vec![3u8; 13];
        severities.extend([4, 4, 4]);
        let score = compute_safety_score(&with_severities(&severities));
        assert_eq!(score.score, 45);
        assert_eq!(score.level, SafetyLevel::Moderate);
        assert_eq!(score.color, SafetyColor::Moderate);
    }

    #[test]
    fn test_severity_monotonic() {
        for low in 1..=10u8 {
            for high in low..=10u8 {
                let a = compute_safety_score(&[with_severity(low)]).score;
                let b = compute_safety_score(&[with_severity(high)]).score;
                assert!(b <= a, "severity {} scored {} above severity {} at {}", high, b, low, a);
            }
        }
    }

    #[test]
    fn test_density_monotonic() {
        for severity in 1..=10u8 {
            let mut previous = compute_safety_score(&[]).score;
            for count in 1..=25usize {
                let score = compute_safety_score(&vec![with_severity(severity); count]).score;
                assert!(score <= previous, "count {} severity {} rose to {}", count, severity, score);
                previous = score;
            }
        }
    }

    #[test]
    fn test_out_of_domain_severity_is_clamped() {
        let score = compute_safety_score(&with_severities(&[0]));
        assert_eq!(score.score, 98);
        let score = compute_safety_score(&with_severities(&[u8::MAX, 200]));
        assert_eq!(score.score, 0);
        assert_eq!(score.level, SafetyLevel::HighRisk);
    }

    #[test]
    fn test_level_and_color_table() {
        for score in 0..=100u8 {
            let s = SafetyScore::from_score(score);
            let (level, color) = match score {
                80..=100 => (SafetyLevel::VerySafe, SafetyColor::Safe),
                65..=79 => (SafetyLevel::Safe, SafetyColor::Safe),
                45..=64 => (SafetyLevel::Moderate, SafetyColor::Moderate),
                25..=44 => (SafetyLevel::UseCaution, SafetyColor::Unsafe),
                _ => (SafetyLevel::HighRisk, SafetyColor::Unsafe),
            };
            assert_eq!((s.level, s.color), (level, color), "score {}", score);
        }
    }

    #[test]
    fn test_score_always_in_range() {
        let mut incidents = Vec::new();
        for severity in [0u8, 1, 5, 10, 50, 255] {
            incidents.push(with_severity(severity));
            let score = compute_safety_score(&incidents);
            assert!(score.score <= 100);
            assert_eq!(score.level, SafetyLevel::from_score(score.score));
        }
    }
}
