use super::require_speaker;
use crate::auth::jwt::AuthUser;
use crate::error::{row_id, ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use cni_core::domain::{average_rating, ApprovalStatus, EventStatus, Speaker, User};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

fn speaker_json(user: &User, speaker: &Speaker) -> Value {
    json!({
        "id": speaker.id,
        "user_id": speaker.user_id,
        "full_name": user.full_name(),
        "expertise": speaker.expertise,
        "industry": speaker.industry,
        "speaking_topics": speaker.speaking_topics,
        "bio": speaker.bio,
        "location": speaker.location,
        "languages": speaker.languages,
        "profile_image_url": speaker.profile_image_url,
        "availability_status": speaker.availability_status,
        "approval_status": speaker.approval_status,
        "created_at": speaker.created_at,
    })
}

fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack.map_or(false, |h| h.to_lowercase().contains(&needle.to_lowercase()))
}

#[derive(Debug, Deserialize)]
pub struct SpeakerFilter {
    pub expertise: Option<String>,
    pub industry: Option<String>,
    pub availability: Option<String>,
    pub search: Option<String>,
}

fn matches(filter: &SpeakerFilter, user: &User, speaker: &Speaker) -> bool {
    if let Some(expertise) = &filter.expertise {
        if !contains_ci(speaker.expertise.as_deref(), expertise) {
            return false;
        }
    }
    if let Some(industry) = &filter.industry {
        if !contains_ci(speaker.industry.as_deref(), industry) {
            return false;
        }
    }
    if let Some(availability) = &filter.availability {
        let matched = speaker
            .availability_status
            .as_deref()
            .map_or(false, |s| s.eq_ignore_ascii_case(availability));
        if !matched {
            return false;
        }
    }
    if let Some(search) = &filter.search {
        let name = user.full_name();
        let hit = contains_ci(Some(name.as_str()), search)
            || contains_ci(speaker.expertise.as_deref(), search)
            || contains_ci(speaker.speaking_topics.as_deref(), search)
            || contains_ci(speaker.bio.as_deref(), search)
            || contains_ci(speaker.location.as_deref(), search);
        if !hit {
            return false;
        }
    }
    true
}

/// Public directory: approved speakers only, with optional filters.
pub async fn list_speakers(
    State(state): State<AppState>,
    Query(filter): Query<SpeakerFilter>,
) -> ApiResult<Json<Value>> {
    let speakers = state.storage.get_all_speakers().await?;

    let mut out = Vec::new();
    for speaker in speakers
        .into_iter()
        .filter(|s| s.approval_status == ApprovalStatus::Approved)
    {
        let Some(user) = state.storage.get_user_by_id(speaker.user_id).await? else {
            continue;
        };
        if matches(&filter, &user, &speaker) {
            out.push(speaker_json(&user, &speaker));
        }
    }

    Ok(Json(json!({ "speakers": out })))
}

/// Public profile; unapproved speakers are invisible.
pub async fn get_speaker(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let speaker = state
        .storage
        .get_speaker_by_id(id)
        .await?
        .filter(|s| s.approval_status == ApprovalStatus::Approved)
        .ok_or_else(|| ApiError::not_found("speaker not found"))?;

    let user = state
        .storage
        .get_user_by_id(speaker.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("speaker not found"))?;

    let ratings = state.storage.get_ratings_by_speaker(id).await?;

    let mut body = speaker_json(&user, &speaker);
    body["average_rating"] = json!(average_rating(&ratings));
    body["rating_count"] = json!(ratings.len());
    Ok(Json(body))
}

pub async fn my_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Value>> {
    let speaker = require_speaker(&state, &user).await?;
    Ok(Json(speaker_json(&user, &speaker)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateSpeakerProfile {
    pub expertise: Option<String>,
    pub industry: Option<String>,
    pub speaking_topics: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub languages: Option<String>,
    pub profile_image_url: Option<String>,
    pub availability_status: Option<String>,
}

pub async fn update_my_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<UpdateSpeakerProfile>,
) -> ApiResult<Json<Value>> {
    let mut speaker = require_speaker(&state, &user).await?;

    if req.expertise.is_some() {
        speaker.expertise = req.expertise;
    }
    if req.industry.is_some() {
        speaker.industry = req.industry;
    }
    if req.speaking_topics.is_some() {
        speaker.speaking_topics = req.speaking_topics;
    }
    if req.bio.is_some() {
        speaker.bio = req.bio;
    }
    if req.location.is_some() {
        speaker.location = req.location;
    }
    if req.languages.is_some() {
        speaker.languages = req.languages;
    }
    if req.profile_image_url.is_some() {
        speaker.profile_image_url = req.profile_image_url;
    }
    if req.availability_status.is_some() {
        speaker.availability_status = req.availability_status;
    }

    state.storage.update_speaker(&speaker).await?;
    Ok(Json(speaker_json(&user, &speaker)))
}

/// Request counts, upcoming bookings, and the rating average.
pub async fn dashboard(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Value>> {
    let speaker = require_speaker(&state, &user).await?;
    let speaker_id = row_id(speaker.id)?;

    let events = state.storage.get_events_by_speaker(speaker_id).await?;
    let ratings = state.storage.get_ratings_by_speaker(speaker_id).await?;
    let now = Utc::now();

    let count = |status: EventStatus| events.iter().filter(|e| e.status == status).count();

    Ok(Json(json!({
        "stats": {
            "total_requests": events.len(),
            "pending": count(EventStatus::Pending),
            "accepted": count(EventStatus::Accepted),
            "completed": count(EventStatus::Completed),
            "upcoming": events
                .iter()
                .filter(|e| e.status.is_upcoming() && e.event_date > now)
                .count(),
        },
        "average_rating": average_rating(&ratings),
        "rating_count": ratings.len(),
        "approval_status": speaker.approval_status,
    })))
}

pub async fn my_events(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Value>> {
    let speaker = require_speaker(&state, &user).await?;
    let mut events = state
        .storage
        .get_events_by_speaker(row_id(speaker.id)?)
        .await?;
    events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(Json(json!({ "events": events })))
}
