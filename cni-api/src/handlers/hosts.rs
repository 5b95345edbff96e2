use super::require_host;
use crate::auth::jwt::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use cni_core::domain::{EventStatus, Host, User};
use serde::Deserialize;
use serde_json::{json, Value};

fn host_json(user: &User, host: &Host) -> Value {
    json!({
        "id": host.id,
        "user_id": host.user_id,
        "email": user.email,
        "full_name": user.full_name(),
        "organization": host.organization,
        "location": host.location,
        "bio": host.bio,
        "profile_image_url": host.profile_image_url,
        "approval_status": host.approval_status,
        "created_at": host.created_at,
    })
}

pub async fn my_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Value>> {
    let host = require_host(&state, &user).await?;
    Ok(Json(host_json(&user, &host)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateHostProfile {
    pub organization: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub profile_image_url: Option<String>,
}

/// Partial update: only the fields present in the request change.
pub async fn update_my_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<UpdateHostProfile>,
) -> ApiResult<Json<Value>> {
    let mut host = require_host(&state, &user).await?;

    if req.organization.is_some() {
        host.organization = req.organization;
    }
    if req.location.is_some() {
        host.location = req.location;
    }
    if req.bio.is_some() {
        host.bio = req.bio;
    }
    if req.profile_image_url.is_some() {
        host.profile_image_url = req.profile_image_url;
    }

    state.storage.update_host(&host).await?;
    Ok(Json(host_json(&user, &host)))
}

/// Request counts by status plus the five most recent requests.
pub async fn dashboard(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Value>> {
    require_host(&state, &user).await?;

    let mut events = state.storage.get_events_by_organizer(&user.email).await?;
    let now = Utc::now();

    let count = |status: EventStatus| events.iter().filter(|e| e.status == status).count();
    let upcoming = events
        .iter()
        .filter(|e| e.status.is_upcoming() && e.event_date > now)
        .count();

    let stats = json!({
        "total": events.len(),
        "pending": count(EventStatus::Pending),
        "accepted": count(EventStatus::Accepted),
        "declined": count(EventStatus::Declined),
        "completed": count(EventStatus::Completed),
        "upcoming": upcoming,
    });

    events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    events.truncate(5);

    Ok(Json(json!({ "stats": stats, "recent_requests": events })))
}

#[derive(Debug, Deserialize)]
pub struct RequestFilter {
    pub status: Option<String>,
}

pub async fn my_requests(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(filter): Query<RequestFilter>,
) -> ApiResult<Json<Value>> {
    require_host(&state, &user).await?;

    let mut events = state.storage.get_events_by_organizer(&user.email).await?;
    if let Some(raw) = filter.status {
        let status = EventStatus::parse(&raw)
            .ok_or_else(|| ApiError::bad_request("unknown event status"))?;
        events.retain(|e| e.status == status);
    }
    events.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(Json(json!({ "requests": events })))
}
