//! End-to-end account provisioning: signup request, code verification,
//! password step, approval gating, token refresh, and password reset.

mod common;

use axum::http::StatusCode;
use axum::Json;
use chrono::{Duration, Utc};
use cni_core::domain::{AccountKind, OtpPurpose};

use cni_api::auth;
use common::{approve_host, approve_speaker, provision_account, test_env};

#[tokio::test]
async fn signup_flow_provisions_a_gated_account() {
    let env = test_env();

    let body = provision_account(&env, "host@example.org", AccountKind::Host, "hunter2hunter2").await;
    assert!(body["access_token"].is_string());
    assert_eq!(body["role"], "host");

    // Pending row and OTPs are gone once the account exists.
    assert!(env
        .state
        .storage
        .get_pending_user("host@example.org")
        .await
        .unwrap()
        .is_none());
    assert!(env
        .state
        .storage
        .get_unverified_otp("host@example.org", OtpPurpose::SignupHost)
        .await
        .unwrap()
        .is_none());

    // Unapproved hosts cannot log in.
    let err = auth::login(
        env.app(),
        Json(auth::LoginRequest {
            email: "host@example.org".to_string(),
            password: "hunter2hunter2".to_string(),
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status, StatusCode::FORBIDDEN);
    assert!(err.message.contains("awaiting approval"));

    approve_host(&env, "host@example.org").await;

    let body = auth::login(
        env.app(),
        Json(auth::LoginRequest {
            email: "host@example.org".to_string(),
            password: "hunter2hunter2".to_string(),
        }),
    )
    .await
    .unwrap()
    .0;
    assert!(body["access_token"].is_string());
    assert_eq!(body["roles"]["host"], "approved");
}

#[tokio::test]
async fn password_step_requires_a_verified_email() {
    let env = test_env();

    auth::signup_request(
        env.app(),
        Json(auth::SignupRequest {
            email: "eager@example.org".to_string(),
            username: None,
            first_name: "Too".to_string(),
            last_name: "Eager".to_string(),
            kind: AccountKind::Speaker,
        }),
    )
    .await
    .unwrap();

    let err = auth::signup_password(
        env.app(),
        Json(auth::SignupPasswordRequest {
            email: "eager@example.org".to_string(),
            password: "hunter2hunter2".to_string(),
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn three_wrong_guesses_kill_the_code() {
    let env = test_env();

    auth::signup_request(
        env.app(),
        Json(auth::SignupRequest {
            email: "guess@example.org".to_string(),
            username: None,
            first_name: "G".to_string(),
            last_name: "W".to_string(),
            kind: AccountKind::Host,
        }),
    )
    .await
    .unwrap();
    let code = env.last_code();
    let wrong = if code == "000000" { "111111" } else { "000000" };

    for remaining in [2, 1, 0] {
        let err = auth::signup_verify(
            env.app(),
            Json(auth::SignupVerifyRequest {
                email: "guess@example.org".to_string(),
                code: wrong.to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.contains(&format!("{remaining} attempts remaining")));
    }

    // All three attempts used; even the right code is refused now.
    let err = auth::signup_verify(
        env.app(),
        Json(auth::SignupVerifyRequest {
            email: "guess@example.org".to_string(),
            code,
        }),
    )
    .await
    .unwrap_err();
    assert!(err.message.contains("too many incorrect attempts"));
}

#[tokio::test]
async fn expired_codes_are_rejected() {
    let env = test_env();

    auth::signup_request(
        env.app(),
        Json(auth::SignupRequest {
            email: "slow@example.org".to_string(),
            username: None,
            first_name: "S".to_string(),
            last_name: "L".to_string(),
            kind: AccountKind::Host,
        }),
    )
    .await
    .unwrap();
    let code = env.last_code();

    // Age the code past its window.
    let mut otp = env
        .state
        .storage
        .get_unverified_otp("slow@example.org", OtpPurpose::SignupHost)
        .await
        .unwrap()
        .unwrap();
    otp.expires_at = Utc::now() - Duration::seconds(1);
    env.state.storage.update_otp(&otp).await.unwrap();

    let err = auth::signup_verify(
        env.app(),
        Json(auth::SignupVerifyRequest {
            email: "slow@example.org".to_string(),
            code,
        }),
    )
    .await
    .unwrap_err();
    assert!(err.message.contains("expired"));
}

#[tokio::test]
async fn resends_are_throttled_per_minute() {
    let env = test_env();

    auth::signup_request(
        env.app(),
        Json(auth::SignupRequest {
            email: "impatient@example.org".to_string(),
            username: None,
            first_name: "I".to_string(),
            last_name: "P".to_string(),
            kind: AccountKind::Speaker,
        }),
    )
    .await
    .unwrap();

    // Two resends fit in the window on top of the initial code...
    for _ in 0..2 {
        auth::resend_otp(
            env.app(),
            Json(auth::ResendOtpRequest {
                email: "impatient@example.org".to_string(),
            }),
        )
        .await
        .unwrap();
    }

    // ...the next one is throttled.
    let err = auth::resend_otp(
        env.app(),
        Json(auth::ResendOtpRequest {
            email: "impatient@example.org".to_string(),
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(env.mailer.sent.lock().unwrap().len(), 3);

    // A resend invalidates older codes: only the newest one verifies.
    let newest = env.last_code();
    auth::signup_verify(
        env.app(),
        Json(auth::SignupVerifyRequest {
            email: "impatient@example.org".to_string(),
            code: newest,
        }),
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn second_role_reuses_the_account_after_reproving_the_password() {
    let env = test_env();
    provision_account(&env, "both@example.org", AccountKind::Host, "hunter2hunter2").await;
    approve_host(&env, "both@example.org").await;

    // Start a speaker signup on the same email.
    auth::signup_request(
        env.app(),
        Json(auth::SignupRequest {
            email: "both@example.org".to_string(),
            username: None,
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            kind: AccountKind::Speaker,
        }),
    )
    .await
    .unwrap();
    let code = env.last_code();
    auth::signup_verify(
        env.app(),
        Json(auth::SignupVerifyRequest {
            email: "both@example.org".to_string(),
            code,
        }),
    )
    .await
    .unwrap();

    // Wrong password: the existing account is not hijackable.
    let err = auth::signup_password(
        env.app(),
        Json(auth::SignupPasswordRequest {
            email: "both@example.org".to_string(),
            password: "not-the-password".to_string(),
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status, StatusCode::UNAUTHORIZED);

    // Right password attaches the speaker profile to the same user.
    auth::signup_password(
        env.app(),
        Json(auth::SignupPasswordRequest {
            email: "both@example.org".to_string(),
            password: "hunter2hunter2".to_string(),
        }),
    )
    .await
    .unwrap();

    let user = env
        .state
        .storage
        .get_user_by_email("both@example.org")
        .await
        .unwrap()
        .unwrap();
    assert!(env
        .state
        .storage
        .get_speaker_by_user(user.id.unwrap())
        .await
        .unwrap()
        .is_some());

    // A third signup for an already-held role is refused outright.
    let err = auth::signup_request(
        env.app(),
        Json(auth::SignupRequest {
            email: "both@example.org".to_string(),
            username: None,
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            kind: AccountKind::Speaker,
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn password_reset_replaces_the_password() {
    let env = test_env();
    provision_account(&env, "forgot@example.org", AccountKind::Speaker, "hunter2hunter2").await;
    approve_speaker(&env, "forgot@example.org").await;

    auth::forgot_password(
        env.app(),
        Json(auth::ForgotPasswordRequest {
            email: "forgot@example.org".to_string(),
        }),
    )
    .await
    .unwrap();
    let code = env.last_code();

    auth::reset_password(
        env.app(),
        Json(auth::ResetPasswordRequest {
            email: "forgot@example.org".to_string(),
            code,
            new_password: "betterpassword1".to_string(),
        }),
    )
    .await
    .unwrap();

    let err = auth::login(
        env.app(),
        Json(auth::LoginRequest {
            email: "forgot@example.org".to_string(),
            password: "hunter2hunter2".to_string(),
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status, StatusCode::UNAUTHORIZED);

    auth::login(
        env.app(),
        Json(auth::LoginRequest {
            email: "forgot@example.org".to_string(),
            password: "betterpassword1".to_string(),
        }),
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn forgot_password_does_not_reveal_accounts() {
    let env = test_env();

    let body = auth::forgot_password(
        env.app(),
        Json(auth::ForgotPasswordRequest {
            email: "nobody@example.org".to_string(),
        }),
    )
    .await
    .unwrap()
    .0;
    assert!(body["message"].as_str().unwrap().contains("if an account exists"));
    assert!(env.mailer.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn refresh_tokens_rotate_and_access_tokens_do_not_refresh() {
    let env = test_env();
    let body = provision_account(&env, "fresh@example.org", AccountKind::Host, "hunter2hunter2").await;

    let refreshed = auth::refresh(
        env.app(),
        Json(auth::RefreshRequest {
            refresh_token: body["refresh_token"].as_str().unwrap().to_string(),
        }),
    )
    .await
    .unwrap()
    .0;
    assert!(refreshed["access_token"].is_string());

    let err = auth::refresh(
        env.app(),
        Json(auth::RefreshRequest {
            refresh_token: body["access_token"].as_str().unwrap().to_string(),
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn email_check_reports_existence() {
    let env = test_env();
    provision_account(&env, "known@example.org", AccountKind::Host, "hunter2hunter2").await;

    let body = auth::email_check(
        env.app(),
        Json(auth::EmailCheckRequest {
            email: "known@example.org".to_string(),
        }),
    )
    .await
    .unwrap()
    .0;
    assert_eq!(body["exists"], true);

    let body = auth::email_check(
        env.app(),
        Json(auth::EmailCheckRequest {
            email: "unknown@example.org".to_string(),
        }),
    )
    .await
    .unwrap()
    .0;
    assert_eq!(body["exists"], false);
}
