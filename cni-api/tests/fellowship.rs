//! Fellowship funnel: signup, registration, orientation videos, tasks,
//! selection, and consents, all keyed by mobile number.

mod common;

use axum::extract::Path;
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;

use cni_api::handlers::fellowship;
use common::{test_env, TestEnv};

const MOBILE: &str = "9876543210";

async fn signed_up(env: &TestEnv) {
    fellowship::signup(
        env.app(),
        Json(fellowship::FellowSignupRequest {
            surname: "Rao".to_string(),
            given_name: "Anita".to_string(),
            mobile_number: MOBILE.to_string(),
            email: None,
        }),
    )
    .await
    .unwrap();
}

/// Registration on top of an existing signup.
async fn registered(env: &TestEnv) {
    fellowship::upsert_registration(
        env.app(),
        Json(fellowship::RegistrationRequest {
            mobile_number: MOBILE.to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(2003, 6, 15),
            gender: Some("female".to_string()),
            caste_category: None,
            state_id: Some(36),
            district_id: Some(1),
            mandal_id: Some(101),
            gram_panchayat_id: Some(5001),
            academic_year: Some("2026-27".to_string()),
            batch: Some("B1".to_string()),
        }),
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn signup_assigns_unique_numbers_and_rejects_duplicates() {
    let env = test_env();

    let body = fellowship::signup(
        env.app(),
        Json(fellowship::FellowSignupRequest {
            surname: "Rao".to_string(),
            given_name: "Anita".to_string(),
            mobile_number: MOBILE.to_string(),
            email: None,
        }),
    )
    .await
    .unwrap()
    .0;
    assert_eq!(body["full_name"], "RAO ANITA");
    let first = body["unique_number"].as_str().unwrap().to_string();
    assert!(first.starts_with("CNI-"));
    assert!(first.ends_with("-00001"));

    // Same mobile and name: refused.
    let err = fellowship::signup(
        env.app(),
        Json(fellowship::FellowSignupRequest {
            surname: "rao".to_string(),
            given_name: "ANITA".to_string(),
            mobile_number: MOBILE.to_string(),
            email: None,
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status, StatusCode::CONFLICT);

    // A different fellow gets the next sequence number.
    let body = fellowship::signup(
        env.app(),
        Json(fellowship::FellowSignupRequest {
            surname: "Kumar".to_string(),
            given_name: "Ravi".to_string(),
            mobile_number: "9876543211".to_string(),
            email: Some("ravi@example.org".to_string()),
        }),
    )
    .await
    .unwrap()
    .0;
    assert!(body["unique_number"].as_str().unwrap().ends_with("-00002"));
}

#[tokio::test]
async fn malformed_mobile_numbers_are_rejected() {
    let env = test_env();
    let err = fellowship::signup(
        env.app(),
        Json(fellowship::FellowSignupRequest {
            surname: "Rao".to_string(),
            given_name: "Anita".to_string(),
            mobile_number: "98765".to_string(),
            email: None,
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn registration_requires_a_prior_signup() {
    let env = test_env();
    let err = fellowship::upsert_registration(
        env.app(),
        Json(fellowship::RegistrationRequest {
            mobile_number: MOBILE.to_string(),
            date_of_birth: None,
            gender: None,
            caste_category: None,
            state_id: None,
            district_id: None,
            mandal_id: None,
            gram_panchayat_id: None,
            academic_year: None,
            batch: None,
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn funnel_advances_stage_by_stage() {
    let env = test_env();
    signed_up(&env).await;

    // Signed up, not yet registered.
    let body = fellowship::funnel_status(env.app(), Path(MOBILE.to_string()))
        .await
        .unwrap()
        .0;
    assert_eq!(body["stage"], "signup");

    registered(&env).await;
    let body = fellowship::funnel_status(env.app(), Path(MOBILE.to_string()))
        .await
        .unwrap()
        .0;
    assert_eq!(body["stage"], "orientation");

    // Watch both videos.
    let body = fellowship::update_video_status(
        env.app(),
        Path(MOBILE.to_string()),
        Json(fellowship::UpdateVideosRequest {
            video1_seen: Some(true),
            video2_seen: Some(true),
        }),
    )
    .await
    .unwrap()
    .0;
    assert_eq!(body["stage"], "tasks");

    // Submit both tasks.
    fellowship::submit_task1(
        env.app(),
        Json(fellowship::Task1Request {
            mobile_number: MOBILE.to_string(),
            lc_district: Some("Adilabad".to_string()),
            lc_mandal: Some("Tamsi".to_string()),
            lc_gram_panchayat: Some("Ponnari".to_string()),
            lc_photo_url: Some("/media/lc.jpg".to_string()),
        }),
    )
    .await
    .unwrap();
    let body = fellowship::submit_task2(
        env.app(),
        Json(fellowship::Task2Request {
            mobile_number: MOBILE.to_string(),
            students_marks_url: Some("/media/marks.pdf".to_string()),
        }),
    )
    .await
    .unwrap()
    .0;
    assert_eq!(body["stage"], "selection");

    // Not accepted yet.
    let body = fellowship::acceptance_status(env.app(), Path(MOBILE.to_string()))
        .await
        .unwrap()
        .0;
    assert_eq!(body["accepted"], false);

    // The program accepts the fellow.
    let body = fellowship::update_acceptance(
        env.app(),
        Path(MOBILE.to_string()),
        Json(fellowship::AcceptanceRequest { accepted: true }),
    )
    .await
    .unwrap()
    .0;
    assert_eq!(body["accepted"], true);
    assert_eq!(body["stage"], "consent");

    let body = fellowship::update_consents(
        env.app(),
        Path(MOBILE.to_string()),
        Json(fellowship::ConsentRequest {
            data_consent: Some(true),
            child_protection_consent: Some(true),
        }),
    )
    .await
    .unwrap()
    .0;
    assert_eq!(body["stage"], "active");
}

#[tokio::test]
async fn re_registering_keeps_funnel_progress() {
    let env = test_env();
    signed_up(&env).await;
    registered(&env).await;

    fellowship::update_video_status(
        env.app(),
        Path(MOBILE.to_string()),
        Json(fellowship::UpdateVideosRequest {
            video1_seen: Some(true),
            video2_seen: None,
        }),
    )
    .await
    .unwrap();

    // Submitting the registration again with new demographics.
    fellowship::upsert_registration(
        env.app(),
        Json(fellowship::RegistrationRequest {
            mobile_number: MOBILE.to_string(),
            date_of_birth: None,
            gender: None,
            caste_category: Some("BC".to_string()),
            state_id: None,
            district_id: None,
            mandal_id: None,
            gram_panchayat_id: None,
            academic_year: None,
            batch: None,
        }),
    )
    .await
    .unwrap();

    let registration = env
        .state
        .storage
        .get_fellow_registration(MOBILE)
        .await
        .unwrap()
        .unwrap();
    assert!(registration.video1_seen);
    assert_eq!(registration.caste_category.as_deref(), Some("BC"));
    // Fields omitted in the resubmission survive.
    assert_eq!(registration.state_id, Some(36));
}

#[tokio::test]
async fn concurrent_signups_mint_distinct_numbers() {
    let env = test_env();

    let signup = |mobile: &str, given_name: &str| {
        fellowship::signup(
            env.app(),
            Json(fellowship::FellowSignupRequest {
                surname: "Rao".to_string(),
                given_name: given_name.to_string(),
                mobile_number: mobile.to_string(),
                email: None,
            }),
        )
    };

    let (a, b, c) = tokio::join!(
        signup("9000000001", "Anita"),
        signup("9000000002", "Bhavani"),
        signup("9000000003", "Chandra"),
    );

    let mut numbers: Vec<String> = [a, b, c]
        .into_iter()
        .map(|r| r.unwrap().0["unique_number"].as_str().unwrap().to_string())
        .collect();
    numbers.sort();
    numbers.dedup();
    assert_eq!(numbers.len(), 3);
}

#[tokio::test]
async fn testimonials_and_attendance_are_per_fellow() {
    let env = test_env();
    signed_up(&env).await;

    fellowship::create_testimonial(
        env.app(),
        Json(fellowship::CreateTestimonialRequest {
            mobile_number: MOBILE.to_string(),
            recorder_type: "parent".to_string(),
            video_url: "/media/testimonial.mp4".to_string(),
        }),
    )
    .await
    .unwrap();
    let body = fellowship::list_testimonials(env.app(), Path(MOBILE.to_string()))
        .await
        .unwrap()
        .0;
    assert_eq!(body["testimonials"].as_array().unwrap().len(), 1);

    fellowship::record_attendance(
        env.app(),
        Json(fellowship::RecordAttendanceRequest {
            mobile_number: MOBILE.to_string(),
            date: NaiveDate::from_ymd_opt(2026, 8, 20).unwrap(),
            present: true,
        }),
    )
    .await
    .unwrap();
    let body = fellowship::list_attendance(env.app(), Path(MOBILE.to_string()))
        .await
        .unwrap()
        .0;
    assert_eq!(body["attendance"].as_array().unwrap().len(), 1);

    // Unknown fellows have no records to list.
    let err = fellowship::list_attendance(env.app(), Path("9999999999".to_string()))
        .await
        .unwrap_err();
    assert_eq!(err.status, StatusCode::NOT_FOUND);
}
