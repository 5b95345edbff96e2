use super::events::is_event_party;
use crate::auth::jwt::AuthUser;
use crate::error::{row_id, ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use cni_core::domain::{Payment, PaymentStatus};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

/// Payments on every event where the caller is the organizer or the speaker.
pub async fn list_payments(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Value>> {
    let user_id = row_id(user.id)?;

    let mut events = state.storage.get_events_by_organizer(&user.email).await?;
    if let Some(speaker) = state.storage.get_speaker_by_user(user_id).await? {
        events.extend(
            state
                .storage
                .get_events_by_speaker(row_id(speaker.id)?)
                .await?,
        );
    }

    let mut payments = Vec::new();
    for event in events {
        if let Some(payment) = state.storage.get_payment_by_event(row_id(event.id)?).await? {
            payments.push(payment);
        }
    }

    Ok(Json(json!({ "payments": payments })))
}

#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    pub event_id: Uuid,
    pub amount: f64,
    pub payment_method: Option<String>,
}

/// One payment per event.
pub async fn create_payment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<CreatePaymentRequest>,
) -> ApiResult<Json<Value>> {
    if req.amount <= 0.0 {
        return Err(ApiError::bad_request("amount must be positive"));
    }

    let event = state
        .storage
        .get_event_by_id(req.event_id)
        .await?
        .ok_or_else(|| ApiError::not_found("event not found"))?;
    if !is_event_party(&state, &user, &event).await? {
        return Err(ApiError::forbidden(
            "only the event's speaker or organizer may record payments",
        ));
    }
    if state.storage.get_payment_by_event(req.event_id).await?.is_some() {
        return Err(ApiError::conflict("a payment already exists for this event"));
    }

    let mut payment = Payment {
        id: None,
        event_id: req.event_id,
        amount: req.amount,
        status: PaymentStatus::Pending,
        payment_method: req.payment_method,
        transaction_id: None,
        paid_at: None,
        created_at: Utc::now(),
    };
    state.storage.create_payment(&mut payment).await?;

    Ok(Json(json!({ "payment": payment })))
}

#[derive(Debug, Deserialize)]
pub struct UpdatePaymentStatusRequest {
    pub status: String,
    pub transaction_id: Option<String>,
}

pub async fn update_payment_status(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdatePaymentStatusRequest>,
) -> ApiResult<Json<Value>> {
    let mut payment = state
        .storage
        .get_payment_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("payment not found"))?;

    let event = state
        .storage
        .get_event_by_id(payment.event_id)
        .await?
        .ok_or_else(|| ApiError::not_found("event not found"))?;
    if !is_event_party(&state, &user, &event).await? {
        return Err(ApiError::forbidden(
            "only the event's speaker or organizer may update payments",
        ));
    }

    let status = PaymentStatus::parse(&req.status)
        .ok_or_else(|| ApiError::bad_request("unknown payment status"))?;

    payment.status = status;
    if req.transaction_id.is_some() {
        payment.transaction_id = req.transaction_id;
    }
    if status == PaymentStatus::Completed && payment.paid_at.is_none() {
        payment.paid_at = Some(Utc::now());
    }
    state.storage.update_payment(&payment).await?;

    Ok(Json(json!({ "payment": payment })))
}
