use super::require_speaker;
use crate::auth::jwt::AuthUser;
use crate::error::{row_id, ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{Duration, NaiveDate, Utc};
use cni_core::domain::SpeakerAvailability;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct AvailabilityRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// Public calendar; defaults to the next 30 days.
pub async fn speaker_availability(
    State(state): State<AppState>,
    Path(speaker_id): Path<Uuid>,
    Query(range): Query<AvailabilityRange>,
) -> ApiResult<Json<Value>> {
    let today = Utc::now().date_naive();
    let start = range.start.unwrap_or(today);
    let end = range.end.unwrap_or(start + Duration::days(30));
    if end < start {
        return Err(ApiError::bad_request("end date is before start date"));
    }

    let slots = state.storage.get_availability(speaker_id, start, end).await?;
    Ok(Json(json!({ "availability": slots })))
}

#[derive(Debug, Deserialize)]
pub struct SetAvailabilityRequest {
    pub date: NaiveDate,
    pub available: bool,
    pub notes: Option<String>,
}

/// One entry per day; setting the same day again replaces it.
pub async fn set_availability(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<SetAvailabilityRequest>,
) -> ApiResult<Json<Value>> {
    let speaker = require_speaker(&state, &user).await?;

    let mut slot = SpeakerAvailability {
        id: None,
        speaker_id: row_id(speaker.id)?,
        date: req.date,
        available: req.available,
        notes: req.notes,
    };
    state.storage.upsert_availability(&mut slot).await?;

    Ok(Json(json!({ "availability": slot })))
}
