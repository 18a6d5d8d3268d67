use crate::precision::{deserialize_decimal_text, parse_coordinate, CoordinateField};
use crate::report::ValidationError;
use crate::route::RouteEstimate;
use crate::types::{DateRange, GeoPoint};
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Blank(field));
    }
    Ok(value.to_string())
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn valid_email(value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    match value.split_once('@') {
        Some((user, domain)) if !user.is_empty() && !domain.is_empty() => Ok(value.to_string()),
        _ => Err(ValidationError::InvalidEmail(value.to_string())),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProfile {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

impl NewProfile {
    pub fn into_profile(self, id: String, created_at: DateTime<Utc>) -> Result<UserProfile, ValidationError> {
        Ok(UserProfile {
            id,
            name: required("name", &self.name)?,
            email: valid_email(&self.email)?,
            phone: optional(self.phone),
            created_at,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl ProfilePatch {
    /// Validate the patch fully before touching the profile.
    pub fn apply(self, profile: &mut UserProfile) -> Result<(), ValidationError> {
        let name = self.name.as_deref().map(|n| required("name", n)).transpose()?;
        let email = self.email.as_deref().map(valid_email).transpose()?;

        if let Some(name) = name {
            profile.name = name;
        }
        if let Some(email) = email {
            profile.email = email;
        }
        if self.phone.is_some() {
            profile.phone = optional(self.phone);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyContact {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub relationship: Option<String>,
    /// Lower goes first; unset sorts last.
    pub priority: Option<u8>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewContact {
    pub user_id: String,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub relationship: Option<String>,
    pub priority: Option<u8>,
}

impl NewContact {
    pub fn into_contact(self, id: String) -> Result<EmergencyContact, ValidationError> {
        let email = optional(self.email).map(|e| valid_email(&e)).transpose()?;
        Ok(EmergencyContact {
            id,
            user_id: required("user_id", &self.user_id)?,
            name: required("name", &self.name)?,
            phone: required("phone", &self.phone)?,
            email,
            relationship: optional(self.relationship),
            priority: self.priority,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactPatch {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub relationship: Option<String>,
    pub priority: Option<u8>,
}

impl ContactPatch {
    pub fn apply(self, contact: &mut EmergencyContact) -> Result<(), ValidationError> {
        let name = self.name.as_deref().map(|n| required("name", n)).transpose()?;
        let phone = self.phone.as_deref().map(|p| required("phone", p)).transpose()?;
        // Some("") clears the email; None leaves it untouched
        let email = self
            .email
            .map(|e| optional(Some(e)).map(|e| valid_email(&e)).transpose())
            .transpose()?;

        if let Some(name) = name {
            contact.name = name;
        }
        if let Some(phone) = phone {
            contact.phone = phone;
        }
        if let Some(email) = email {
            contact.email = email;
        }
        if self.relationship.is_some() {
            contact.relationship = optional(self.relationship);
        }
        if self.priority.is_some() {
            contact.priority = self.priority;
        }
        Ok(())
    }
}

/// Contacts ordered by priority, unset priorities last, then by name.
pub fn sort_contacts(contacts: &mut [EmergencyContact]) {
    contacts.sort_by(|a, b| {
        let key = |c: &EmergencyContact| c.priority.unwrap_or(u8::MAX);
        key(a).cmp(&key(b)).then_with(|| a.name.cmp(&b.name))
    });
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SosStatus {
    Active,
    Analyzing,
    Alerted,
    Failed,
    Resolved,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SosEvent {
    pub id: String,
    pub user_id: String,
    pub lat: Decimal,
    pub lng: Decimal,
    pub status: SosStatus,
    pub ai_summary: Option<String>,
    pub alerts_sent: u32,
    pub photo_attached: bool,
    pub audio_attached: bool,
    pub created_at: DateTime<Utc>,
}

impl SosEvent {
    pub fn point(&self) -> GeoPoint {
        GeoPoint {
            lat: self.lat.to_f64().unwrap_or(f64::NAN),
            lng: self.lng.to_f64().unwrap_or(f64::NAN),
        }
    }
}

/// SOS location as sent by the client. Evidence is decoded by the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct SosLocation {
    #[serde(deserialize_with = "deserialize_decimal_text")]
    pub lat: String,
    #[serde(deserialize_with = "deserialize_decimal_text")]
    pub lng: String,
}

impl SosLocation {
    pub fn parse(&self) -> Result<(Decimal, Decimal), ValidationError> {
        Ok((
            parse_coordinate(CoordinateField::Latitude, &self.lat)?,
            parse_coordinate(CoordinateField::Longitude, &self.lng)?,
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRequest {
    pub id: String,
    pub user_id: Option<String>,
    pub origin: GeoPoint,
    pub destination: GeoPoint,
    pub origin_label: Option<String>,
    pub destination_label: Option<String>,
    pub range: DateRange,
    pub estimate: RouteEstimate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRoute {
    pub user_id: Option<String>,
    pub origin: GeoPoint,
    pub destination: GeoPoint,
    pub origin_label: Option<String>,
    pub destination_label: Option<String>,
    #[serde(default)]
    pub range: DateRange,
}

impl NewRoute {
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (point, lat_name, lng_name) in [
            (self.origin, "origin.lat", "origin.lng"),
            (self.destination, "destination.lat", "destination.lng"),
        ] {
            if !(-90.0..=90.0).contains(&point.lat) {
                return Err(ValidationError::CoordinateOutOfRange {
                    field: lat_name,
                    value: point.lat.to_string(),
                });
            }
            if !(-180.0..=180.0).contains(&point.lng) {
                return Err(ValidationError::CoordinateOutOfRange {
                    field: lng_name,
                    value: point.lng.to_string(),
                });
            }
        }
        Ok(())
    }
}
