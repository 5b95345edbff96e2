//! Account provisioning: signup request → email verification → password and
//! account creation, plus login, token refresh, and password reset. All state
//! transitions go through the `Storage` trait so the flow is testable against
//! the in-memory backend.

pub mod jwt;
pub mod password;
pub mod service;

use crate::error::{row_id, ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use chrono::Utc;
use cni_core::domain::{
    AccountKind, Host, OtpPurpose, PendingUser, Speaker, User, UserProfile,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use jwt::AuthUser;

fn normalize_email(raw: &str) -> ApiResult<String> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::bad_request("a valid email address is required"));
    }
    Ok(email)
}

fn check_password_strength(raw: &str) -> ApiResult<()> {
    if raw.len() < password::MIN_PASSWORD_LENGTH {
        return Err(ApiError::bad_request(format!(
            "password must be at least {} characters",
            password::MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    #[serde(default)]
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub kind: AccountKind,
}

/// Start (or restart) a signup: upsert the pending user and send a code.
/// Restarting resets the verified flag so a changed email gets re-proven.
pub async fn signup_request(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> ApiResult<Json<Value>> {
    let email = normalize_email(&req.email)?;

    if let Some(user) = state.storage.get_user_by_email(&email).await? {
        let user_id = row_id(user.id)?;
        let role_taken = match req.kind {
            AccountKind::Host => state.storage.get_host_by_user(user_id).await?.is_some(),
            AccountKind::Speaker => state.storage.get_speaker_by_user(user_id).await?.is_some(),
        };
        if role_taken {
            return Err(ApiError::conflict(format!(
                "this email is already registered as a {}",
                req.kind.as_str()
            )));
        }
    }

    let username = req
        .username
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());

    let mut pending = PendingUser {
        id: None,
        email: email.clone(),
        username,
        kind: req.kind,
        first_name: req.first_name.trim().to_string(),
        last_name: req.last_name.trim().to_string(),
        email_verified: false,
        created_at: Utc::now(),
    };
    state.storage.upsert_pending_user(&mut pending).await?;

    service::issue_otp(&state, &email, OtpPurpose::for_signup(req.kind)).await?;

    info!(email = %email, kind = %req.kind.as_str(), "signup started");
    Ok(Json(json!({ "message": "verification code sent" })))
}

#[derive(Debug, Deserialize)]
pub struct SignupVerifyRequest {
    pub email: String,
    pub code: String,
}

pub async fn signup_verify(
    State(state): State<AppState>,
    Json(req): Json<SignupVerifyRequest>,
) -> ApiResult<Json<Value>> {
    let email = normalize_email(&req.email)?;

    let mut pending = state
        .storage
        .get_pending_user(&email)
        .await?
        .ok_or_else(|| ApiError::bad_request("no signup in progress for this email"))?;

    service::verify_otp(&state, &email, OtpPurpose::for_signup(pending.kind), &req.code).await?;

    pending.email_verified = true;
    state.storage.upsert_pending_user(&mut pending).await?;

    Ok(Json(json!({ "message": "email verified" })))
}

#[derive(Debug, Deserialize)]
pub struct SignupPasswordRequest {
    pub email: String,
    pub password: String,
}

/// Final provisioning step. Requires a verified pending signup. Creates the
/// user (or attaches a second role to an existing account after re-proving
/// the password), the role profile, and the bare `UserProfile`, then clears
/// the pending row and every OTP for the email.
pub async fn signup_password(
    State(state): State<AppState>,
    Json(req): Json<SignupPasswordRequest>,
) -> ApiResult<Json<Value>> {
    let email = normalize_email(&req.email)?;
    check_password_strength(&req.password)?;

    let pending = state
        .storage
        .get_pending_user(&email)
        .await?
        .ok_or_else(|| ApiError::bad_request("no signup in progress for this email"))?;
    if !pending.email_verified {
        return Err(ApiError::forbidden("email is not verified yet"));
    }

    let user = match state.storage.get_user_by_email(&email).await? {
        Some(existing) => {
            // Adding a second role to an existing account requires the
            // existing password, not a new one.
            if !password::verify_password(&req.password, &existing.password_hash) {
                return Err(ApiError::unauthorized(
                    "an account with this email already exists and the password does not match",
                ));
            }
            existing
        }
        None => {
            let mut user = User {
                id: None,
                email: email.clone(),
                username: pending.username.clone(),
                first_name: pending.first_name.clone(),
                last_name: pending.last_name.clone(),
                password_hash: password::hash_password(&req.password)?,
                is_admin: false,
                created_at: Utc::now(),
            };
            state.storage.create_user(&mut user).await?;
            user
        }
    };
    let user_id = row_id(user.id)?;

    match pending.kind {
        AccountKind::Host => {
            if state.storage.get_host_by_user(user_id).await?.is_some() {
                return Err(ApiError::conflict(
                    "this email is already registered as a host",
                ));
            }
            let mut host = Host::new(user_id);
            state.storage.create_host(&mut host).await?;
        }
        AccountKind::Speaker => {
            if state.storage.get_speaker_by_user(user_id).await?.is_some() {
                return Err(ApiError::conflict(
                    "this email is already registered as a speaker",
                ));
            }
            let mut speaker = Speaker::new(user_id);
            state.storage.create_speaker(&mut speaker).await?;
        }
    }

    if state.storage.get_user_profile(user_id).await?.is_none() {
        let mut profile = UserProfile::new(user_id);
        state.storage.create_user_profile(&mut profile).await?;
    }

    state.storage.delete_pending_user(&email).await?;
    state.storage.delete_otps(&email, None).await?;

    let tokens = jwt::issue_pair(&state.config, user_id)?;

    info!(email = %email, kind = %pending.kind.as_str(), "account provisioned");
    Ok(Json(json!({
        "message": "account created; awaiting approval",
        "user": {
            "id": user_id,
            "email": user.email,
            "username": user.username,
            "full_name": user.full_name(),
        },
        "role": pending.kind,
        "access_token": tokens.access_token,
        "refresh_token": tokens.refresh_token,
    })))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Password check, then the approval gate: an account with no approved role
/// profile may not log in. Admins bypass the gate.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<Value>> {
    let email = normalize_email(&req.email)?;

    let user = state
        .storage
        .get_user_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::unauthorized("invalid email or password"))?;
    if !password::verify_password(&req.password, &user.password_hash) {
        return Err(ApiError::unauthorized("invalid email or password"));
    }
    let user_id = row_id(user.id)?;

    let host = state.storage.get_host_by_user(user_id).await?;
    let speaker = state.storage.get_speaker_by_user(user_id).await?;

    if !user.is_admin {
        let statuses: Vec<_> = host
            .iter()
            .map(|h| h.approval_status)
            .chain(speaker.iter().map(|s| s.approval_status))
            .collect();
        let any_approved = statuses.contains(&cni_core::domain::ApprovalStatus::Approved);
        if !any_approved {
            if !statuses.is_empty()
                && statuses
                    .iter()
                    .all(|s| *s == cni_core::domain::ApprovalStatus::Rejected)
            {
                return Err(ApiError::forbidden("this account has been rejected"));
            }
            return Err(ApiError::forbidden("this account is awaiting approval"));
        }
    }

    let tokens = jwt::issue_pair(&state.config, user_id)?;

    Ok(Json(json!({
        "access_token": tokens.access_token,
        "refresh_token": tokens.refresh_token,
        "user": {
            "id": user_id,
            "email": user.email,
            "username": user.username,
            "full_name": user.full_name(),
            "is_admin": user.is_admin,
        },
        "roles": {
            "host": host.map(|h| h.approval_status),
            "speaker": speaker.map(|s| s.approval_status),
        },
    })))
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<Value>> {
    let user_id = jwt::decode_user_id(&state.config, &req.refresh_token, jwt::KIND_REFRESH)?;

    // The account must still exist for the token to be honored.
    state
        .storage
        .get_user_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("unknown user"))?;

    let tokens = jwt::issue_pair(&state.config, user_id)?;
    Ok(Json(json!({
        "access_token": tokens.access_token,
        "refresh_token": tokens.refresh_token,
    })))
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// The response never reveals whether the account exists.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> ApiResult<Json<Value>> {
    let email = normalize_email(&req.email)?;

    if state.storage.get_user_by_email(&email).await?.is_some() {
        if let Err(err) = service::issue_otp(&state, &email, OtpPurpose::ForgotPassword).await {
            warn!(email = %email, "password reset code not sent: {}", err.message);
        }
    }

    Ok(Json(json!({
        "message": "if an account exists for this email, a reset code has been sent"
    })))
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub code: String,
    pub new_password: String,
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<Json<Value>> {
    let email = normalize_email(&req.email)?;
    check_password_strength(&req.new_password)?;

    let mut user = state
        .storage
        .get_user_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::bad_request("no verification code on file for this email"))?;

    service::verify_otp(&state, &email, OtpPurpose::ForgotPassword, &req.code).await?;

    user.password_hash = password::hash_password(&req.new_password)?;
    state.storage.update_user(&user).await?;
    state
        .storage
        .delete_otps(&email, Some(OtpPurpose::ForgotPassword))
        .await?;

    info!(email = %email, "password reset");
    Ok(Json(json!({ "message": "password updated" })))
}

#[derive(Debug, Deserialize)]
pub struct ResendOtpRequest {
    pub email: String,
}

/// Resend the signup code; the throttle inside `issue_otp` applies.
pub async fn resend_otp(
    State(state): State<AppState>,
    Json(req): Json<ResendOtpRequest>,
) -> ApiResult<Json<Value>> {
    let email = normalize_email(&req.email)?;

    let pending = state
        .storage
        .get_pending_user(&email)
        .await?
        .ok_or_else(|| ApiError::bad_request("no signup in progress for this email"))?;

    service::issue_otp(&state, &email, OtpPurpose::for_signup(pending.kind)).await?;
    Ok(Json(json!({ "message": "verification code sent" })))
}

#[derive(Debug, Deserialize)]
pub struct EmailCheckRequest {
    pub email: String,
}

/// Existence probe used by the signup form.
pub async fn email_check(
    State(state): State<AppState>,
    Json(req): Json<EmailCheckRequest>,
) -> ApiResult<Json<Value>> {
    let email = normalize_email(&req.email)?;
    let exists = state.storage.get_user_by_email(&email).await?.is_some();
    Ok(Json(json!({ "exists": exists })))
}

/// Identity of the current bearer token; used by frontends on reload.
pub async fn me(State(state): State<AppState>, AuthUser(user): AuthUser) -> ApiResult<Json<Value>> {
    let user_id = row_id(user.id)?;
    let host = state.storage.get_host_by_user(user_id).await?;
    let speaker = state.storage.get_speaker_by_user(user_id).await?;

    Ok(Json(json!({
        "user": {
            "id": user_id,
            "email": user.email,
            "username": user.username,
            "full_name": user.full_name(),
            "is_admin": user.is_admin,
        },
        "roles": {
            "host": host.map(|h| h.approval_status),
            "speaker": speaker.map(|s| s.approval_status),
        },
    })))
}
