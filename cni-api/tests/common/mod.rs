//! Shared test harness: in-memory storage, a recording mailer, and helpers
//! that drive the signup flow end to end.
#![allow(dead_code)] // not every suite uses every helper

use async_trait::async_trait;
use axum::extract::State;
use axum::Json;
use chrono::Utc;
use std::sync::{Arc, Mutex};

use cni_api::auth;
use cni_api::config::Config;
use cni_api::email::{Mailer, OutboundEmail};
use cni_api::state::AppState;
use cni_core::domain::{AccountKind, ApprovalStatus};
use cni_core::storage::{InMemoryStorage, Storage};
use cni_core::Result;

/// Captures outbound mail so tests can read verification codes.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutboundEmail>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutboundEmail) -> Result<()> {
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

pub struct TestEnv {
    pub state: AppState,
    pub mailer: Arc<RecordingMailer>,
}

pub fn test_env() -> TestEnv {
    let storage: Arc<dyn Storage> = Arc::new(InMemoryStorage::new());
    let mailer = Arc::new(RecordingMailer::default());
    let config = Config {
        port: 0,
        jwt_secret: "test-secret".to_string(),
        access_ttl_minutes: 30,
        refresh_ttl_days: 14,
        smtp: None,
        email_from: "no-reply@test.local".to_string(),
        admin_email: "admin@test.local".to_string(),
        media_dir: std::env::temp_dir(),
        use_memory_storage: true,
    };
    let state = AppState::new(storage, mailer.clone() as Arc<dyn Mailer>, config);
    TestEnv { state, mailer }
}

impl TestEnv {
    pub fn app(&self) -> State<AppState> {
        State(self.state.clone())
    }

    /// The 6-digit code from the most recent email.
    pub fn last_code(&self) -> String {
        let sent = self.mailer.sent.lock().unwrap();
        let body = &sent.last().expect("an email should have been sent").body;
        body.split(|c: char| !c.is_ascii_digit())
            .find(|token| token.len() == 6)
            .expect("email should contain a 6-digit code")
            .to_string()
    }
}

/// Run the whole signup flow: request, verify, set password. Returns the
/// provisioning response body (tokens and user info).
pub async fn provision_account(
    env: &TestEnv,
    email: &str,
    kind: AccountKind,
    password: &str,
) -> serde_json::Value {
    auth::signup_request(
        env.app(),
        Json(auth::SignupRequest {
            email: email.to_string(),
            username: None,
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            kind,
        }),
    )
    .await
    .expect("signup request should succeed");

    let code = env.last_code();
    auth::signup_verify(
        env.app(),
        Json(auth::SignupVerifyRequest {
            email: email.to_string(),
            code,
        }),
    )
    .await
    .expect("signup verify should succeed");

    auth::signup_password(
        env.app(),
        Json(auth::SignupPasswordRequest {
            email: email.to_string(),
            password: password.to_string(),
        }),
    )
    .await
    .expect("signup password should succeed")
    .0
}

pub async fn approve_host(env: &TestEnv, email: &str) {
    let user = env
        .state
        .storage
        .get_user_by_email(email)
        .await
        .unwrap()
        .expect("user exists");
    let mut host = env
        .state
        .storage
        .get_host_by_user(user.id.unwrap())
        .await
        .unwrap()
        .expect("host profile exists");
    host.approval_status = ApprovalStatus::Approved;
    host.approved_at = Some(Utc::now());
    env.state.storage.update_host(&host).await.unwrap();
}

pub async fn approve_speaker(env: &TestEnv, email: &str) {
    let user = env
        .state
        .storage
        .get_user_by_email(email)
        .await
        .unwrap()
        .expect("user exists");
    let mut speaker = env
        .state
        .storage
        .get_speaker_by_user(user.id.unwrap())
        .await
        .unwrap()
        .expect("speaker profile exists");
    speaker.approval_status = ApprovalStatus::Approved;
    speaker.approved_at = Some(Utc::now());
    env.state.storage.update_speaker(&speaker).await.unwrap();
}
