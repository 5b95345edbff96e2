use crate::email::OutboundEmail;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use chrono::Utc;
use cni_core::domain::ContactSubmission;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

/// Stores the submission, then notifies the admin inbox and sends the sender
/// a confirmation. Mail failures are logged, not surfaced: the submission is
/// already on record.
pub async fn submit_contact(
    State(state): State<AppState>,
    Json(req): Json<ContactRequest>,
) -> ApiResult<Json<Value>> {
    if !req.email.contains('@') {
        return Err(ApiError::bad_request("a valid email address is required"));
    }
    if req.message.trim().is_empty() {
        return Err(ApiError::bad_request("a message is required"));
    }

    let mut submission = ContactSubmission {
        id: None,
        name: req.name,
        email: req.email.trim().to_lowercase(),
        subject: req.subject,
        message: req.message,
        created_at: Utc::now(),
    };
    state.storage.create_contact_submission(&mut submission).await?;

    let admin_note = OutboundEmail {
        to: state.config.admin_email.clone(),
        subject: format!("Contact form: {}", submission.subject),
        body: format!(
            "From: {} <{}>\n\n{}",
            submission.name, submission.email, submission.message
        ),
    };
    if let Err(err) = state.mailer.send(admin_note).await {
        warn!("contact form admin notification not sent: {err}");
    }

    let confirmation = OutboundEmail {
        to: submission.email.clone(),
        subject: "We received your message".to_string(),
        body: format!(
            "Hi {},\n\nThanks for reaching out. We'll get back to you soon.",
            submission.name
        ),
    };
    if let Err(err) = state.mailer.send(confirmation).await {
        warn!("contact form confirmation not sent: {err}");
    }

    Ok(Json(json!({ "message": "thanks, we'll be in touch" })))
}
