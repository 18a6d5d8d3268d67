use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use safemap_core::records::{
    ContactPatch, EmergencyContact, NewContact, NewProfile, ProfilePatch, UserProfile,
};
use tracing::info;
use uuid::Uuid;

pub async fn create_profile(
    State(state): State<AppState>,
    payload: Result<Json<NewProfile>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<UserProfile>)> {
    let Json(new_profile) = payload?;
    let profile = new_profile.into_profile(Uuid::new_v4().to_string(), Utc::now())?;

    info!("Profile {} created", profile.id);
    state.profiles.insert(profile.id.clone(), profile.clone());
    Ok((StatusCode::CREATED, Json(profile)))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<UserProfile>> {
    state
        .profiles
        .get(&id)
        .map(|p| Json(p.value().clone()))
        .ok_or(ApiError::NotFound("Profile"))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ProfilePatch>, JsonRejection>,
) -> ApiResult<Json<UserProfile>> {
    let Json(patch) = payload?;
    let mut profile = state
        .profiles
        .get_mut(&id)
        .ok_or(ApiError::NotFound("Profile"))?;
    patch.apply(&mut profile)?;
    Ok(Json(profile.clone()))
}

/// Removes the profile together with its emergency contacts.
pub async fn delete_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .profiles
        .remove(&id)
        .ok_or(ApiError::NotFound("Profile"))?;
    state.contacts.retain(|_, c| c.user_id != id);
    info!("Profile {} deleted", id);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_contacts(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<Vec<EmergencyContact>> {
    Json(state.contacts_for(&user_id))
}

pub async fn create_contact(
    State(state): State<AppState>,
    payload: Result<Json<NewContact>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<EmergencyContact>)> {
    let Json(new_contact) = payload?;
    let contact = new_contact.into_contact(Uuid::new_v4().to_string())?;

    info!("Contact {} added for user {}", contact.id, contact.user_id);
    state.contacts.insert(contact.id.clone(), contact.clone());
    Ok((StatusCode::CREATED, Json(contact)))
}

pub async fn get_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<EmergencyContact>> {
    state
        .contacts
        .get(&id)
        .map(|c| Json(c.value().clone()))
        .ok_or(ApiError::NotFound("Contact"))
}

pub async fn update_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ContactPatch>, JsonRejection>,
) -> ApiResult<Json<EmergencyContact>> {
    let Json(patch) = payload?;
    let mut contact = state
        .contacts
        .get_mut(&id)
        .ok_or(ApiError::NotFound("Contact"))?;
    patch.apply(&mut contact)?;
    Ok(Json(contact.clone()))
}

pub async fn delete_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .contacts
        .remove(&id)
        .ok_or(ApiError::NotFound("Contact"))?;
    Ok(StatusCode::NO_CONTENT)
}
