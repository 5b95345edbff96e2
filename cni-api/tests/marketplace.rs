//! Marketplace flows: speaker requests, responses, messaging, payments, and
//! ratings, including the permission checks between the two sides.

mod common;

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::Json;
use chrono::{Duration, Utc};
use cni_core::domain::{AccountKind, EventStatus, User};
use uuid::Uuid;

use cni_api::auth::jwt::AuthUser;
use cni_api::handlers::{admin, events, messaging, payments, ratings, speakers};
use common::{approve_host, approve_speaker, provision_account, test_env, TestEnv};

async fn user_of(env: &TestEnv, email: &str) -> User {
    env.state
        .storage
        .get_user_by_email(email)
        .await
        .unwrap()
        .expect("user exists")
}

async fn speaker_profile_id(env: &TestEnv, email: &str) -> Uuid {
    let user = user_of(env, email).await;
    env.state
        .storage
        .get_speaker_by_user(user.id.unwrap())
        .await
        .unwrap()
        .expect("speaker profile exists")
        .id
        .unwrap()
}

/// One approved host and one approved speaker, ready to interact.
async fn marketplace(env: &TestEnv) -> (User, User, Uuid) {
    provision_account(env, "host@example.org", AccountKind::Host, "hunter2hunter2").await;
    approve_host(env, "host@example.org").await;
    provision_account(env, "speaker@example.org", AccountKind::Speaker, "hunter2hunter2").await;
    approve_speaker(env, "speaker@example.org").await;

    let host = user_of(env, "host@example.org").await;
    let speaker = user_of(env, "speaker@example.org").await;
    let speaker_id = speaker_profile_id(env, "speaker@example.org").await;
    (host, speaker, speaker_id)
}

fn event_request(speaker_id: Uuid, organizer_email: &str) -> events::CreateEventRequest {
    events::CreateEventRequest {
        title: "Village science fair".to_string(),
        description: Some("An afternoon of demonstrations".to_string()),
        event_type: Some("workshop".to_string()),
        event_date: Utc::now() + Duration::days(30),
        duration_minutes: Some(90),
        audience_size: Some(120),
        budget: Some(500.0),
        organizer_name: "Test User".to_string(),
        organizer_email: organizer_email.to_string(),
        speaker_id,
    }
}

#[tokio::test]
async fn only_approved_speakers_are_listed() {
    let env = test_env();
    provision_account(&env, "hidden@example.org", AccountKind::Speaker, "hunter2hunter2").await;
    provision_account(&env, "visible@example.org", AccountKind::Speaker, "hunter2hunter2").await;
    approve_speaker(&env, "visible@example.org").await;

    let body = speakers::list_speakers(
        env.app(),
        Query(speakers::SpeakerFilter {
            expertise: None,
            industry: None,
            availability: None,
            search: None,
        }),
    )
    .await
    .unwrap()
    .0;

    let listed = body["speakers"].as_array().unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn approvals_go_through_the_admin_gate() {
    let env = test_env();
    provision_account(&env, "host@example.org", AccountKind::Host, "hunter2hunter2").await;
    provision_account(&env, "speaker@example.org", AccountKind::Speaker, "hunter2hunter2").await;
    provision_account(&env, "staff@example.org", AccountKind::Host, "hunter2hunter2").await;

    let mut staff = user_of(&env, "staff@example.org").await;
    staff.is_admin = true;
    env.state.storage.update_user(&staff).await.unwrap();

    let host_user = user_of(&env, "host@example.org").await;
    let host_id = env
        .state
        .storage
        .get_host_by_user(host_user.id.unwrap())
        .await
        .unwrap()
        .expect("host profile exists")
        .id
        .unwrap();
    let speaker_id = speaker_profile_id(&env, "speaker@example.org").await;

    // Ordinary users cannot approve anyone, not even themselves.
    let err = admin::set_host_approval(
        env.app(),
        AuthUser(host_user.clone()),
        Path(host_id),
        Json(admin::ApprovalAction {
            action: "approve".to_string(),
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status, StatusCode::FORBIDDEN);

    // Approval stamps the timestamp.
    let body = admin::set_host_approval(
        env.app(),
        AuthUser(staff.clone()),
        Path(host_id),
        Json(admin::ApprovalAction {
            action: "approve".to_string(),
        }),
    )
    .await
    .unwrap()
    .0;
    assert_eq!(body["host"]["approval_status"], "approved");
    assert!(!body["host"]["approved_at"].is_null());

    // Rejection leaves no approval timestamp.
    let body = admin::set_speaker_approval(
        env.app(),
        AuthUser(staff.clone()),
        Path(speaker_id),
        Json(admin::ApprovalAction {
            action: "reject".to_string(),
        }),
    )
    .await
    .unwrap()
    .0;
    assert_eq!(body["speaker"]["approval_status"], "rejected");
    assert!(body["speaker"]["approved_at"].is_null());

    // Unknown actions are refused.
    let err = admin::set_speaker_approval(
        env.app(),
        AuthUser(staff),
        Path(speaker_id),
        Json(admin::ApprovalAction {
            action: "postpone".to_string(),
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn event_lifecycle_with_permissions() {
    let env = test_env();
    let (host, speaker, speaker_id) = marketplace(&env).await;

    let body = events::create_event(env.app(), Json(event_request(speaker_id, &host.email)))
        .await
        .unwrap()
        .0;
    let event_id: Uuid = serde_json::from_value(body["event"]["id"].clone()).unwrap();
    assert_eq!(body["event"]["status"], "pending");

    // The organizer has a host account, so a conversation was auto-opened.
    let conversation = env
        .state
        .storage
        .find_conversation(host.id.unwrap(), speaker.id.unwrap(), Some(event_id))
        .await
        .unwrap();
    assert!(conversation.is_some());

    // A bystander cannot respond to the request.
    provision_account(&env, "bystander@example.org", AccountKind::Host, "hunter2hunter2").await;
    approve_host(&env, "bystander@example.org").await;
    let bystander = user_of(&env, "bystander@example.org").await;
    let err = events::update_event_status(
        env.app(),
        AuthUser(bystander),
        Path(event_id),
        Json(events::UpdateEventStatusRequest {
            status: "accepted".to_string(),
            response_notes: None,
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status, StatusCode::FORBIDDEN);

    // The speaker accepts, which stamps the response time.
    let body = events::update_event_status(
        env.app(),
        AuthUser(speaker.clone()),
        Path(event_id),
        Json(events::UpdateEventStatusRequest {
            status: "accepted".to_string(),
            response_notes: Some("Happy to join".to_string()),
        }),
    )
    .await
    .unwrap()
    .0;
    assert_eq!(body["event"]["status"], "accepted");
    assert!(!body["event"]["responded_at"].is_null());

    let err = events::update_event_status(
        env.app(),
        AuthUser(speaker),
        Path(event_id),
        Json(events::UpdateEventStatusRequest {
            status: "postponed".to_string(),
            response_notes: None,
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn messaging_is_for_participants_only() {
    let env = test_env();
    let (host, speaker, speaker_id) = marketplace(&env).await;

    let body = messaging::create_conversation(
        env.app(),
        AuthUser(host.clone()),
        Json(messaging::CreateConversationRequest {
            speaker_id,
            event_id: None,
            subject: Some("Availability in June".to_string()),
        }),
    )
    .await
    .unwrap()
    .0;
    let conversation_id: Uuid =
        serde_json::from_value(body["conversation"]["id"].clone()).unwrap();

    // Creating the same thread again returns it instead of duplicating.
    let body = messaging::create_conversation(
        env.app(),
        AuthUser(host.clone()),
        Json(messaging::CreateConversationRequest {
            speaker_id,
            event_id: None,
            subject: None,
        }),
    )
    .await
    .unwrap()
    .0;
    let again: Uuid = serde_json::from_value(body["conversation"]["id"].clone()).unwrap();
    assert_eq!(conversation_id, again);

    messaging::send_message(
        env.app(),
        AuthUser(host.clone()),
        Path(conversation_id),
        Json(messaging::SendMessageRequest {
            body: "Are you free on the 14th?".to_string(),
        }),
    )
    .await
    .unwrap();

    // Unread until the speaker opens the thread.
    let body = messaging::list_conversations(env.app(), AuthUser(speaker.clone()))
        .await
        .unwrap()
        .0;
    assert_eq!(body["conversations"][0]["unread"], 1);

    let body = messaging::get_messages(env.app(), AuthUser(speaker.clone()), Path(conversation_id))
        .await
        .unwrap()
        .0;
    assert_eq!(body["messages"].as_array().unwrap().len(), 1);

    let body = messaging::list_conversations(env.app(), AuthUser(speaker))
        .await
        .unwrap()
        .0;
    assert_eq!(body["conversations"][0]["unread"], 0);

    // An outsider can neither read nor write.
    provision_account(&env, "outsider@example.org", AccountKind::Host, "hunter2hunter2").await;
    approve_host(&env, "outsider@example.org").await;
    let outsider = user_of(&env, "outsider@example.org").await;
    let err = messaging::get_messages(env.app(), AuthUser(outsider), Path(conversation_id))
        .await
        .unwrap_err();
    assert_eq!(err.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn one_payment_per_event() {
    let env = test_env();
    let (host, _speaker, speaker_id) = marketplace(&env).await;

    let body = events::create_event(env.app(), Json(event_request(speaker_id, &host.email)))
        .await
        .unwrap()
        .0;
    let event_id: Uuid = serde_json::from_value(body["event"]["id"].clone()).unwrap();

    let body = payments::create_payment(
        env.app(),
        AuthUser(host.clone()),
        Json(payments::CreatePaymentRequest {
            event_id,
            amount: 500.0,
            payment_method: Some("bank transfer".to_string()),
        }),
    )
    .await
    .unwrap()
    .0;
    let payment_id: Uuid = serde_json::from_value(body["payment"]["id"].clone()).unwrap();

    let err = payments::create_payment(
        env.app(),
        AuthUser(host.clone()),
        Json(payments::CreatePaymentRequest {
            event_id,
            amount: 500.0,
            payment_method: None,
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status, StatusCode::CONFLICT);

    // Completing the payment stamps paid_at.
    let body = payments::update_payment_status(
        env.app(),
        AuthUser(host.clone()),
        Path(payment_id),
        Json(payments::UpdatePaymentStatusRequest {
            status: "completed".to_string(),
            transaction_id: Some("TXN-1".to_string()),
        }),
    )
    .await
    .unwrap()
    .0;
    assert_eq!(body["payment"]["status"], "completed");
    assert!(!body["payment"]["paid_at"].is_null());

    let body = payments::list_payments(env.app(), AuthUser(host))
        .await
        .unwrap()
        .0;
    assert_eq!(body["payments"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn only_completed_events_can_be_rated_once() {
    let env = test_env();
    let (host, _speaker, speaker_id) = marketplace(&env).await;

    let body = events::create_event(env.app(), Json(event_request(speaker_id, &host.email)))
        .await
        .unwrap()
        .0;
    let event_id: Uuid = serde_json::from_value(body["event"]["id"].clone()).unwrap();

    let err = ratings::create_rating(
        env.app(),
        Json(ratings::CreateRatingRequest {
            event_id,
            rating: 5,
            feedback: None,
            would_recommend: None,
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status, StatusCode::BAD_REQUEST);

    // Mark the event completed, then rate it.
    let mut event = env
        .state
        .storage
        .get_event_by_id(event_id)
        .await
        .unwrap()
        .unwrap();
    event.status = EventStatus::Completed;
    env.state.storage.update_event(&event).await.unwrap();

    let err = ratings::create_rating(
        env.app(),
        Json(ratings::CreateRatingRequest {
            event_id,
            rating: 6,
            feedback: None,
            would_recommend: None,
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status, StatusCode::BAD_REQUEST);

    ratings::create_rating(
        env.app(),
        Json(ratings::CreateRatingRequest {
            event_id,
            rating: 4,
            feedback: Some("Great session".to_string()),
            would_recommend: Some(true),
        }),
    )
    .await
    .unwrap();

    let err = ratings::create_rating(
        env.app(),
        Json(ratings::CreateRatingRequest {
            event_id,
            rating: 5,
            feedback: None,
            would_recommend: None,
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status, StatusCode::CONFLICT);

    let body = ratings::speaker_ratings(env.app(), Path(speaker_id))
        .await
        .unwrap()
        .0;
    assert_eq!(body["count"], 1);
    assert_eq!(body["average"], 4.0);
}
