use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::{AppState, SosEvidence};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use safemap_alerts::{notify_all, AlertMessage, PersonContext, Recipient};
use safemap_core::precision::deserialize_decimal_text;
use safemap_core::records::{SosEvent, SosLocation, SosStatus};
use safemap_core::report::ValidationError;
use serde::{Deserialize, Serialize};
use std::io::{Cursor, Write};
use tracing::{info, warn};
use uuid::Uuid;
use zip::{write::FileOptions, CompressionMethod, ZipWriter};

const NO_PHOTO_ANALYSIS: &str = "No photo evidence was captured.";

/// Request body cap for SOS triggers, which carry base64 photo and audio.
pub const SOS_BODY_LIMIT: usize = 24 * 1024 * 1024;

#[derive(Debug, Deserialize)]
pub struct SosTrigger {
    pub user_id: String,
    #[serde(deserialize_with = "deserialize_decimal_text")]
    pub lat: String,
    #[serde(deserialize_with = "deserialize_decimal_text")]
    pub lng: String,
    /// Base64 JPEG, optionally as a `data:` URL.
    pub photo: Option<String>,
    /// Base64 WebM audio, optionally as a `data:` URL.
    pub audio: Option<String>,
}

/// Decode base64 evidence. Blank input counts as absent.
fn decode_evidence(field: &'static str, text: Option<&str>) -> Result<Option<Vec<u8>>, ValidationError> {
    let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };
    let payload = match text.strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map(|(_, data)| data).unwrap_or_default(),
        None => text,
    };
    STANDARD
        .decode(payload)
        .map(Some)
        .map_err(|e| ValidationError::InvalidEvidence {
            field,
            reason: e.to_string(),
        })
}

pub async fn trigger_sos(
    State(state): State<AppState>,
    payload: Result<Json<SosTrigger>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SosEvent>)> {
    let Json(trigger) = payload?;

    let user_id = trigger.user_id.trim();
    if user_id.is_empty() {
        return Err(ValidationError::Blank("user_id").into());
    }
    let (lat, lng) = SosLocation {
        lat: trigger.lat,
        lng: trigger.lng,
    }
    .parse()?;
    let evidence = SosEvidence {
        photo: decode_evidence("photo", trigger.photo.as_deref())?,
        audio: decode_evidence("audio", trigger.audio.as_deref())?,
    };

    let event = SosEvent {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        lat,
        lng,
        status: SosStatus::Active,
        ai_summary: None,
        alerts_sent: 0,
        photo_attached: evidence.photo.is_some(),
        audio_attached: evidence.audio.is_some(),
        created_at: Utc::now(),
    };

    warn!(
        "SOS {} triggered by {} at {}, {}",
        event.id, event.user_id, event.lat, event.lng
    );
    metrics::record_sos_triggered();
    state.sos_events.insert(event.id.clone(), event.clone());
    state.evidence.insert(event.id.clone(), evidence);

    tokio::spawn(process_sos(state.clone(), event.id.clone()));

    Ok((StatusCode::CREATED, Json(event)))
}

fn update_event(state: &AppState, id: &str, f: impl FnOnce(&mut SosEvent)) -> Option<SosEvent> {
    let mut event = state.sos_events.get_mut(id)?;
    f(event.value_mut());
    Some(event.value().clone())
}

/// Analyze evidence, summarize, and alert the user's emergency contacts.
pub async fn process_sos(state: AppState, sos_id: String) {
    let Some(event) = update_event(&state, &sos_id, |e| {
        if e.status != SosStatus::Resolved {
            e.status = SosStatus::Analyzing;
        }
    }) else {
        warn!("SOS {} vanished before processing", sos_id);
        return;
    };
    if event.status == SosStatus::Resolved {
        info!("SOS {} already resolved, skipping alerts", sos_id);
        return;
    }

    let location = event.point();
    let photo = state
        .evidence
        .get(&sos_id)
        .and_then(|e| e.value().photo.clone());

    let analysis = match photo {
        Some(photo) => match state.analyzer.analyze_image(&photo, Some(location)).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Image analysis for SOS {} failed: {}", sos_id, e);
                metrics::record_analysis_failure();
                format!("Error analyzing image: {}", e)
            }
        },
        None => NO_PHOTO_ANALYSIS.to_string(),
    };

    let person = state.profiles.get(&event.user_id).map(|p| PersonContext {
        name: p.name.clone(),
        phone: p.phone.clone(),
    });

    let summary = match state
        .analyzer
        .summarize(&analysis, location, person.as_ref())
        .await
    {
        Ok(text) => text,
        Err(e) => {
            warn!("Summary for SOS {} failed: {}", sos_id, e);
            metrics::record_analysis_failure();
            format!(
                "Emergency situation detected at {}, {}. Unable to generate detailed summary.",
                event.lat, event.lng
            )
        }
    };

    let contacts = state.contacts_for(&event.user_id);
    let messages: Vec<AlertMessage> = contacts
        .iter()
        .map(|c| AlertMessage {
            sos_id: sos_id.clone(),
            recipient: Recipient {
                name: c.name.clone(),
                phone: c.phone.clone(),
                email: c.email.clone(),
            },
            text: summary.clone(),
            location,
        })
        .collect();

    let sent = notify_all(state.notifier.as_ref(), &messages).await;
    metrics::record_alerts(sent, messages.len() - sent);

    let status = if !messages.is_empty() && sent == 0 {
        SosStatus::Failed
    } else {
        SosStatus::Alerted
    };
    update_event(&state, &sos_id, |e| {
        e.ai_summary = Some(summary);
        e.alerts_sent = sent as u32;
        if e.status != SosStatus::Resolved {
            e.status = status;
        }
    });

    info!(
        "SOS {} processed: {}/{} alerts delivered",
        sos_id,
        sent,
        messages.len()
    );
}

pub async fn get_sos(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SosEvent>> {
    state
        .sos_events
        .get(&id)
        .map(|e| Json(e.value().clone()))
        .ok_or(ApiError::NotFound("SOS event"))
}

pub async fn list_sos_events(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<Vec<SosEvent>> {
    Json(state.sos_events_for(&user_id))
}

pub async fn resolve_sos(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SosEvent>> {
    let event = update_event(&state, &id, |e| e.status = SosStatus::Resolved)
        .ok_or(ApiError::NotFound("SOS event"))?;
    info!("SOS {} resolved", id);
    Ok(Json(event))
}

#[derive(Serialize)]
struct BundleMetadata<'a> {
    event: &'a SosEvent,
    exported_at: DateTime<Utc>,
    photo_bytes: Option<usize>,
    audio_bytes: Option<usize>,
}

/// Zip the event and its evidence in memory.
pub fn build_bundle(event: &SosEvent, evidence: &SosEvidence) -> anyhow::Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let metadata = BundleMetadata {
        event,
        exported_at: Utc::now(),
        photo_bytes: evidence.photo.as_ref().map(Vec::len),
        audio_bytes: evidence.audio.as_ref().map(Vec::len),
    };
    zip.start_file("metadata.json", options)?;
    zip.write_all(serde_json::to_string_pretty(&metadata)?.as_bytes())?;

    if let Some(summary) = &event.ai_summary {
        zip.start_file("summary.txt", options)?;
        zip.write_all(summary.as_bytes())?;
    }

    // Media is already compressed
    let stored = FileOptions::default().compression_method(CompressionMethod::Stored);
    if let Some(photo) = &evidence.photo {
        zip.start_file("photo.jpg", stored)?;
        zip.write_all(photo)?;
    }
    if let Some(audio) = &evidence.audio {
        zip.start_file("audio.webm", stored)?;
        zip.write_all(audio)?;
    }

    Ok(zip.finish()?.into_inner())
}

pub async fn export_bundle(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let event = state
        .sos_events
        .get(&id)
        .map(|e| e.value().clone())
        .ok_or(ApiError::NotFound("SOS event"))?;
    let evidence = state
        .evidence
        .get(&id)
        .map(|e| e.value().clone())
        .unwrap_or_default();

    let bytes = build_bundle(&event, &evidence)
        .map_err(|e| ApiError::Internal(format!("Failed to build SOS bundle: {}", e)))?;
    info!("SOS bundle exported for {} ({} bytes)", id, bytes.len());

    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"sos-{}.zip\"", id),
            ),
        ],
        bytes,
    )
        .into_response())
}
