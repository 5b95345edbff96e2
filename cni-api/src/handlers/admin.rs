use crate::auth::jwt::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use cni_core::domain::{ApprovalStatus, User};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

fn require_admin(user: &User) -> ApiResult<()> {
    if user.is_admin {
        Ok(())
    } else {
        Err(ApiError::forbidden("admin access required"))
    }
}

#[derive(Debug, Deserialize)]
pub struct ApprovalAction {
    pub action: String,
}

fn resolve_action(action: &str) -> ApiResult<(ApprovalStatus, Option<DateTime<Utc>>)> {
    match action {
        "approve" => Ok((ApprovalStatus::Approved, Some(Utc::now()))),
        "reject" => Ok((ApprovalStatus::Rejected, None)),
        _ => Err(ApiError::bad_request("action must be approve or reject")),
    }
}

pub async fn set_host_approval(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ApprovalAction>,
) -> ApiResult<Json<Value>> {
    require_admin(&user)?;

    let mut host = state
        .storage
        .get_host_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("host not found"))?;

    let (status, approved_at) = resolve_action(&req.action)?;
    host.approval_status = status;
    host.approved_at = approved_at;
    state.storage.update_host(&host).await?;

    info!(host = %id, action = %req.action, "host approval updated");
    Ok(Json(json!({ "host": host })))
}

pub async fn set_speaker_approval(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ApprovalAction>,
) -> ApiResult<Json<Value>> {
    require_admin(&user)?;

    let mut speaker = state
        .storage
        .get_speaker_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("speaker not found"))?;

    let (status, approved_at) = resolve_action(&req.action)?;
    speaker.approval_status = status;
    speaker.approved_at = approved_at;
    state.storage.update_speaker(&speaker).await?;

    info!(speaker = %id, action = %req.action, "speaker approval updated");
    Ok(Json(json!({ "speaker": speaker })))
}
