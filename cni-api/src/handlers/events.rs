use crate::auth::jwt::AuthUser;
use crate::error::{row_id, ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use cni_core::domain::{ApprovalStatus, Conversation, Event, EventStatus, User};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub description: Option<String>,
    pub event_type: Option<String>,
    pub event_date: DateTime<Utc>,
    pub duration_minutes: Option<u32>,
    pub audience_size: Option<u32>,
    pub budget: Option<f64>,
    pub organizer_name: String,
    pub organizer_email: String,
    pub speaker_id: Uuid,
}

/// Public speaker-request form. When the organizer email belongs to a host
/// account, a conversation with the speaker is opened alongside the request.
pub async fn create_event(
    State(state): State<AppState>,
    Json(req): Json<CreateEventRequest>,
) -> ApiResult<Json<Value>> {
    if req.title.trim().is_empty() {
        return Err(ApiError::bad_request("event title is required"));
    }
    if !req.organizer_email.contains('@') {
        return Err(ApiError::bad_request("a valid organizer email is required"));
    }

    let speaker = state
        .storage
        .get_speaker_by_id(req.speaker_id)
        .await?
        .ok_or_else(|| ApiError::not_found("speaker not found"))?;
    if speaker.approval_status != ApprovalStatus::Approved {
        return Err(ApiError::bad_request("this speaker is not accepting requests"));
    }

    let mut event = Event {
        id: None,
        title: req.title.trim().to_string(),
        description: req.description,
        event_type: req.event_type,
        event_date: req.event_date,
        duration_minutes: req.duration_minutes,
        audience_size: req.audience_size,
        budget: req.budget,
        organizer_name: req.organizer_name,
        organizer_email: req.organizer_email.trim().to_lowercase(),
        speaker_id: req.speaker_id,
        status: EventStatus::Pending,
        response_notes: None,
        responded_at: None,
        created_at: Utc::now(),
    };
    state.storage.create_event(&mut event).await?;

    if let Some(org_user) = state.storage.get_user_by_email(&event.organizer_email).await? {
        let org_user_id = row_id(org_user.id)?;
        if state.storage.get_host_by_user(org_user_id).await?.is_some()
            && state
                .storage
                .find_conversation(org_user_id, speaker.user_id, event.id)
                .await?
                .is_none()
        {
            let now = Utc::now();
            let mut conversation = Conversation {
                id: None,
                host_user_id: org_user_id,
                speaker_user_id: speaker.user_id,
                event_id: event.id,
                subject: format!("Event request: {}", event.title),
                created_at: now,
                updated_at: now,
            };
            state.storage.create_conversation(&mut conversation).await?;
        }
    }

    Ok(Json(json!({ "message": "request sent", "event": event })))
}

pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let event = state
        .storage
        .get_event_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("event not found"))?;
    Ok(Json(json!({ "event": event })))
}

/// Whether the caller is a party to the event: its speaker or its organizer.
pub(crate) async fn is_event_party(
    state: &AppState,
    user: &User,
    event: &Event,
) -> ApiResult<bool> {
    if user.email.eq_ignore_ascii_case(&event.organizer_email) {
        return Ok(true);
    }
    let speaker = state.storage.get_speaker_by_id(event.speaker_id).await?;
    Ok(speaker.map_or(false, |s| Some(s.user_id) == user.id))
}

#[derive(Debug, Deserialize)]
pub struct UpdateEventStatusRequest {
    pub status: String,
    pub response_notes: Option<String>,
}

pub async fn update_event_status(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateEventStatusRequest>,
) -> ApiResult<Json<Value>> {
    let mut event = state
        .storage
        .get_event_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("event not found"))?;

    let status = EventStatus::parse(&req.status)
        .ok_or_else(|| ApiError::bad_request("unknown event status"))?;

    if !is_event_party(&state, &user, &event).await? {
        return Err(ApiError::forbidden(
            "only the event's speaker or organizer may respond",
        ));
    }

    event.status = status;
    if req.response_notes.is_some() {
        event.response_notes = req.response_notes;
    }
    event.responded_at = Some(Utc::now());
    state.storage.update_event(&event).await?;

    Ok(Json(json!({ "event": event })))
}
