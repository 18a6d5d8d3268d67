use crate::report::ValidationError;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Fractional digits kept for stored coordinates (about 1 cm).
pub const COORDINATE_SCALE: u32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateField {
    Latitude,
    Longitude,
}

impl CoordinateField {
    pub fn name(&self) -> &'static str {
        match self {
            CoordinateField::Latitude => "lat",
            CoordinateField::Longitude => "lng",
        }
    }

    fn limit(&self) -> Decimal {
        match self {
            CoordinateField::Latitude => Decimal::from(90),
            CoordinateField::Longitude => Decimal::from(180),
        }
    }
}

/// Parse a string as Decimal, preserving full precision.
/// Handles both regular decimal notation and scientific notation (e.g., "1e-3").
pub fn parse_decimal(s: &str) -> Option<Decimal> {
    let s = s.trim();
    if let Ok(dec) = Decimal::from_str(s) {
        return Some(dec);
    }

    // Scientific notation goes through f64 first
    let f = s.parse::<f64>().ok()?;
    if !f.is_finite() {
        return None;
    }
    Decimal::from_str_exact(&format!("{}", f))
        .ok()
        .or_else(|| Decimal::try_from(f).ok())
}

/// Parse coordinate text into its stored form: range-checked and rounded to
/// [`COORDINATE_SCALE`] places. Already-shorter values keep their scale.
pub fn parse_coordinate(field: CoordinateField, text: &str) -> Result<Decimal, ValidationError> {
    let value = parse_decimal(text).ok_or_else(|| ValidationError::InvalidCoordinate {
        field: field.name(),
        value: text.to_string(),
    })?;

    let limit = field.limit();
    if value < -limit || value > limit {
        return Err(ValidationError::CoordinateOutOfRange {
            field: field.name(),
            value: text.to_string(),
        });
    }

    if value.scale() > COORDINATE_SCALE {
        Ok(value.round_dp(COORDINATE_SCALE))
    } else {
        Ok(value)
    }
}

/// Accept a coordinate sent either as a JSON number or as a string and keep
/// its text for [`parse_coordinate`].
pub fn deserialize_decimal_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let value: serde_json::Value = serde::Deserialize::deserialize(deserializer)?;
    match value {
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::String(s) => Ok(s),
        _ => Err(Error::custom("Expected number or string for coordinate")),
    }
}
