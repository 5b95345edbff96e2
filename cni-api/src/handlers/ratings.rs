use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use cni_core::domain::{average_rating, EventRating, EventStatus};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateRatingRequest {
    pub event_id: Uuid,
    pub rating: u8,
    pub feedback: Option<String>,
    pub would_recommend: Option<bool>,
}

/// Public, like the request form: organizers rate without an account. Only
/// completed events qualify, one rating per event.
pub async fn create_rating(
    State(state): State<AppState>,
    Json(req): Json<CreateRatingRequest>,
) -> ApiResult<Json<Value>> {
    if !(1..=5).contains(&req.rating) {
        return Err(ApiError::bad_request("rating must be between 1 and 5"));
    }

    let event = state
        .storage
        .get_event_by_id(req.event_id)
        .await?
        .ok_or_else(|| ApiError::not_found("event not found"))?;
    if event.status != EventStatus::Completed {
        return Err(ApiError::bad_request("only completed events can be rated"));
    }
    if state.storage.get_rating_by_event(req.event_id).await?.is_some() {
        return Err(ApiError::conflict("this event has already been rated"));
    }

    let mut rating = EventRating {
        id: None,
        event_id: req.event_id,
        speaker_id: event.speaker_id,
        organizer_name: event.organizer_name.clone(),
        rating: req.rating,
        feedback: req.feedback,
        would_recommend: req.would_recommend.unwrap_or(true),
        created_at: Utc::now(),
    };
    state.storage.create_rating(&mut rating).await?;

    Ok(Json(json!({ "rating": rating })))
}

pub async fn speaker_ratings(
    State(state): State<AppState>,
    Path(speaker_id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let ratings = state.storage.get_ratings_by_speaker(speaker_id).await?;
    Ok(Json(json!({
        "average": average_rating(&ratings),
        "count": ratings.len(),
        "ratings": ratings,
    })))
}
