use super::require_host;
use crate::auth::jwt::AuthUser;
use crate::error::{row_id, ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use cni_core::domain::{Conversation, Message};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

/// The caller's conversations, newest activity first, with unread counts.
pub async fn list_conversations(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Value>> {
    let user_id = row_id(user.id)?;
    let conversations = state.storage.get_conversations_for_user(user_id).await?;

    let mut out = Vec::new();
    for conversation in conversations {
        let conversation_id = row_id(conversation.id)?;
        let messages = state
            .storage
            .get_messages_by_conversation(conversation_id)
            .await?;
        let unread = messages
            .iter()
            .filter(|m| m.recipient_id == user_id && !m.read)
            .count();
        out.push(json!({
            "conversation": conversation,
            "counterpart_id": conversation.counterpart(user_id),
            "unread": unread,
            "last_message": messages.last().map(|m| m.body.clone()),
        }));
    }

    Ok(Json(json!({ "conversations": out })))
}

#[derive(Debug, Deserialize)]
pub struct CreateConversationRequest {
    pub speaker_id: Uuid,
    pub event_id: Option<Uuid>,
    pub subject: Option<String>,
}

/// Hosts open conversations; one per (host, speaker, event) triple, so
/// repeating the request returns the existing thread.
pub async fn create_conversation(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<CreateConversationRequest>,
) -> ApiResult<Json<Value>> {
    require_host(&state, &user).await?;
    let user_id = row_id(user.id)?;

    let speaker = state
        .storage
        .get_speaker_by_id(req.speaker_id)
        .await?
        .ok_or_else(|| ApiError::not_found("speaker not found"))?;

    if let Some(existing) = state
        .storage
        .find_conversation(user_id, speaker.user_id, req.event_id)
        .await?
    {
        return Ok(Json(json!({ "conversation": existing })));
    }

    let now = Utc::now();
    let mut conversation = Conversation {
        id: None,
        host_user_id: user_id,
        speaker_user_id: speaker.user_id,
        event_id: req.event_id,
        subject: req
            .subject
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "New conversation".to_string()),
        created_at: now,
        updated_at: now,
    };
    state.storage.create_conversation(&mut conversation).await?;

    Ok(Json(json!({ "conversation": conversation })))
}

async fn load_for_participant(
    state: &AppState,
    conversation_id: Uuid,
    user_id: Uuid,
) -> ApiResult<Conversation> {
    let conversation = state
        .storage
        .get_conversation_by_id(conversation_id)
        .await?
        .ok_or_else(|| ApiError::not_found("conversation not found"))?;
    if !conversation.includes(user_id) {
        return Err(ApiError::forbidden(
            "only participants may access this conversation",
        ));
    }
    Ok(conversation)
}

/// Reading a thread marks the caller's incoming messages read.
pub async fn get_messages(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(conversation_id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let user_id = row_id(user.id)?;
    load_for_participant(&state, conversation_id, user_id).await?;

    state
        .storage
        .mark_messages_read(conversation_id, user_id)
        .await?;
    let messages = state
        .storage
        .get_messages_by_conversation(conversation_id)
        .await?;

    Ok(Json(json!({ "messages": messages })))
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub body: String,
}

pub async fn send_message(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(conversation_id): Path<Uuid>,
    Json(req): Json<SendMessageRequest>,
) -> ApiResult<Json<Value>> {
    let body = req.body.trim().to_string();
    if body.is_empty() {
        return Err(ApiError::bad_request("message body is required"));
    }

    let user_id = row_id(user.id)?;
    let mut conversation = load_for_participant(&state, conversation_id, user_id).await?;

    let mut message = Message {
        id: None,
        conversation_id,
        sender_id: user_id,
        recipient_id: conversation.counterpart(user_id),
        body,
        read: false,
        created_at: Utc::now(),
    };
    state.storage.create_message(&mut message).await?;

    conversation.updated_at = message.created_at;
    state.storage.update_conversation(&conversation).await?;

    Ok(Json(json!({ "message": message })))
}
