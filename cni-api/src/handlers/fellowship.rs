//! Fellowship onboarding funnel: signup, registration, orientation videos,
//! task submissions, selection, and consents. Fellows are keyed by mobile
//! number throughout; there is no password flow on this side of the platform.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::Json;
use chrono::{NaiveDate, Utc};
use cni_core::domain::{
    AttendanceRecord, FellowRegistration, FellowSignup, FellowTestimonial, TaskDetails,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

fn validate_mobile(mobile: &str) -> ApiResult<()> {
    if mobile.len() == 10 && mobile.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ApiError::bad_request("mobile number must be 10 digits"))
    }
}

async fn require_fellow(state: &AppState, mobile: &str) -> ApiResult<FellowSignup> {
    state
        .storage
        .get_fellow_by_mobile(mobile)
        .await?
        .ok_or_else(|| ApiError::not_found("fellow not found"))
}

async fn require_registration(state: &AppState, mobile: &str) -> ApiResult<FellowRegistration> {
    state
        .storage
        .get_fellow_registration(mobile)
        .await?
        .ok_or_else(|| ApiError::not_found("registration not found"))
}

#[derive(Debug, Deserialize)]
pub struct FellowSignupRequest {
    pub surname: String,
    pub given_name: String,
    pub mobile_number: String,
    pub email: Option<String>,
}

/// First contact: name and mobile. The (mobile, full name) pair is unique and
/// the fellow receives a generated unique number.
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<FellowSignupRequest>,
) -> ApiResult<Json<Value>> {
    validate_mobile(&req.mobile_number)?;
    if req.surname.trim().is_empty() || req.given_name.trim().is_empty() {
        return Err(ApiError::bad_request("surname and given name are required"));
    }

    let full_name = FellowSignup::compose_full_name(req.surname.trim(), req.given_name.trim());
    if state
        .storage
        .find_fellow(&req.mobile_number, &full_name)
        .await?
        .is_some()
    {
        return Err(ApiError::conflict("this fellow is already signed up"));
    }

    // Storage mints the unique number when it inserts the row.
    let mut fellow = FellowSignup {
        id: None,
        unique_number: String::new(),
        surname: req.surname.trim().to_uppercase(),
        given_name: req.given_name.trim().to_uppercase(),
        full_name,
        mobile_number: req.mobile_number,
        email: req.email,
        created_at: Utc::now(),
    };
    state.storage.create_fellow_signup(&mut fellow).await?;

    info!(unique_number = %fellow.unique_number, "fellow signed up");
    Ok(Json(json!({
        "unique_number": fellow.unique_number,
        "full_name": fellow.full_name,
    })))
}

#[derive(Debug, Deserialize)]
pub struct RegistrationRequest {
    pub mobile_number: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub caste_category: Option<String>,
    pub state_id: Option<u32>,
    pub district_id: Option<u32>,
    pub mandal_id: Option<u32>,
    pub gram_panchayat_id: Option<u32>,
    pub academic_year: Option<String>,
    pub batch: Option<String>,
}

/// Full registration. Upserting never touches the funnel flags: re-submitting
/// demographics cannot reset watched videos or submitted tasks.
pub async fn upsert_registration(
    State(state): State<AppState>,
    Json(req): Json<RegistrationRequest>,
) -> ApiResult<Json<Value>> {
    validate_mobile(&req.mobile_number)?;
    let fellow = require_fellow(&state, &req.mobile_number).await?;

    let mut registration = state
        .storage
        .get_fellow_registration(&req.mobile_number)
        .await?
        .unwrap_or_else(|| FellowRegistration {
            id: None,
            mobile_number: req.mobile_number.clone(),
            full_name: fellow.full_name.clone(),
            date_of_birth: None,
            gender: None,
            caste_category: None,
            state_id: None,
            district_id: None,
            mandal_id: None,
            gram_panchayat_id: None,
            academic_year: None,
            batch: None,
            video1_seen: false,
            video2_seen: false,
            task1_submitted: false,
            task2_submitted: false,
            approved: false,
            data_consent: false,
            child_protection_consent: false,
            created_at: Utc::now(),
        });

    registration.date_of_birth = req.date_of_birth.or(registration.date_of_birth);
    registration.gender = req.gender.or(registration.gender);
    registration.caste_category = req.caste_category.or(registration.caste_category);
    registration.state_id = req.state_id.or(registration.state_id);
    registration.district_id = req.district_id.or(registration.district_id);
    registration.mandal_id = req.mandal_id.or(registration.mandal_id);
    registration.gram_panchayat_id = req.gram_panchayat_id.or(registration.gram_panchayat_id);
    registration.academic_year = req.academic_year.or(registration.academic_year);
    registration.batch = req.batch.or(registration.batch);

    state
        .storage
        .upsert_fellow_registration(&mut registration)
        .await?;

    Ok(Json(json!({
        "registration": registration,
        "stage": registration.funnel_stage(),
    })))
}

/// Where the fellow stands in the funnel. "signup" means no registration yet.
pub async fn funnel_status(
    State(state): State<AppState>,
    Path(mobile): Path<String>,
) -> ApiResult<Json<Value>> {
    let fellow = require_fellow(&state, &mobile).await?;
    let registration = state.storage.get_fellow_registration(&mobile).await?;

    Ok(match registration {
        Some(registration) => Json(json!({
            "unique_number": fellow.unique_number,
            "full_name": fellow.full_name,
            "stage": registration.funnel_stage(),
            "registration": registration,
        })),
        None => Json(json!({
            "unique_number": fellow.unique_number,
            "full_name": fellow.full_name,
            "stage": "signup",
            "registration": null,
        })),
    })
}

pub async fn video_status(
    State(state): State<AppState>,
    Path(mobile): Path<String>,
) -> ApiResult<Json<Value>> {
    let registration = require_registration(&state, &mobile).await?;
    Ok(Json(json!({
        "video1_seen": registration.video1_seen,
        "video2_seen": registration.video2_seen,
    })))
}

#[derive(Debug, Deserialize)]
pub struct UpdateVideosRequest {
    pub video1_seen: Option<bool>,
    pub video2_seen: Option<bool>,
}

pub async fn update_video_status(
    State(state): State<AppState>,
    Path(mobile): Path<String>,
    Json(req): Json<UpdateVideosRequest>,
) -> ApiResult<Json<Value>> {
    let mut registration = require_registration(&state, &mobile).await?;

    if let Some(seen) = req.video1_seen {
        registration.video1_seen = seen;
    }
    if let Some(seen) = req.video2_seen {
        registration.video2_seen = seen;
    }
    state
        .storage
        .upsert_fellow_registration(&mut registration)
        .await?;

    Ok(Json(json!({
        "video1_seen": registration.video1_seen,
        "video2_seen": registration.video2_seen,
        "stage": registration.funnel_stage(),
    })))
}

async fn load_task_details(state: &AppState, mobile: &str) -> ApiResult<TaskDetails> {
    Ok(state
        .storage
        .get_task_details(mobile)
        .await?
        .unwrap_or_else(|| TaskDetails {
            id: None,
            mobile_number: mobile.to_string(),
            lc_district: None,
            lc_mandal: None,
            lc_gram_panchayat: None,
            lc_photo_url: None,
            students_marks_url: None,
            created_at: Utc::now(),
        }))
}

#[derive(Debug, Deserialize)]
pub struct Task1Request {
    pub mobile_number: String,
    pub lc_district: Option<String>,
    pub lc_mandal: Option<String>,
    pub lc_gram_panchayat: Option<String>,
    pub lc_photo_url: Option<String>,
}

/// Task 1: learning-centre location and photo.
pub async fn submit_task1(
    State(state): State<AppState>,
    Json(req): Json<Task1Request>,
) -> ApiResult<Json<Value>> {
    let mut registration = require_registration(&state, &req.mobile_number).await?;

    let mut details = load_task_details(&state, &req.mobile_number).await?;
    details.lc_district = req.lc_district.or(details.lc_district);
    details.lc_mandal = req.lc_mandal.or(details.lc_mandal);
    details.lc_gram_panchayat = req.lc_gram_panchayat.or(details.lc_gram_panchayat);
    details.lc_photo_url = req.lc_photo_url.or(details.lc_photo_url);
    state.storage.upsert_task_details(&mut details).await?;

    registration.task1_submitted = true;
    state
        .storage
        .upsert_fellow_registration(&mut registration)
        .await?;

    Ok(Json(json!({
        "message": "task 1 submitted",
        "stage": registration.funnel_stage(),
    })))
}

#[derive(Debug, Deserialize)]
pub struct Task2Request {
    pub mobile_number: String,
    pub students_marks_url: Option<String>,
}

/// Task 2: student marks sheet.
pub async fn submit_task2(
    State(state): State<AppState>,
    Json(req): Json<Task2Request>,
) -> ApiResult<Json<Value>> {
    let mut registration = require_registration(&state, &req.mobile_number).await?;

    let mut details = load_task_details(&state, &req.mobile_number).await?;
    details.students_marks_url = req.students_marks_url.or(details.students_marks_url);
    state.storage.upsert_task_details(&mut details).await?;

    registration.task2_submitted = true;
    state
        .storage
        .upsert_fellow_registration(&mut registration)
        .await?;

    Ok(Json(json!({
        "message": "task 2 submitted",
        "stage": registration.funnel_stage(),
    })))
}

#[derive(Debug, Deserialize)]
pub struct AcceptanceRequest {
    pub accepted: bool,
}

/// Selection decision: accept (or withdraw acceptance of) a fellow who has
/// come through the task stage.
pub async fn update_acceptance(
    State(state): State<AppState>,
    Path(mobile): Path<String>,
    Json(req): Json<AcceptanceRequest>,
) -> ApiResult<Json<Value>> {
    let mut registration = require_registration(&state, &mobile).await?;

    registration.approved = req.accepted;
    state
        .storage
        .upsert_fellow_registration(&mut registration)
        .await?;

    info!(mobile = %mobile, accepted = req.accepted, "fellow acceptance updated");
    Ok(Json(json!({
        "accepted": registration.approved,
        "stage": registration.funnel_stage(),
    })))
}

pub async fn acceptance_status(
    State(state): State<AppState>,
    Path(mobile): Path<String>,
) -> ApiResult<Json<Value>> {
    let registration = require_registration(&state, &mobile).await?;
    Ok(Json(json!({
        "accepted": registration.approved,
        "stage": registration.funnel_stage(),
    })))
}

#[derive(Debug, Deserialize)]
pub struct ConsentRequest {
    pub data_consent: Option<bool>,
    pub child_protection_consent: Option<bool>,
}

pub async fn update_consents(
    State(state): State<AppState>,
    Path(mobile): Path<String>,
    Json(req): Json<ConsentRequest>,
) -> ApiResult<Json<Value>> {
    let mut registration = require_registration(&state, &mobile).await?;

    if let Some(consent) = req.data_consent {
        registration.data_consent = consent;
    }
    if let Some(consent) = req.child_protection_consent {
        registration.child_protection_consent = consent;
    }
    state
        .storage
        .upsert_fellow_registration(&mut registration)
        .await?;

    Ok(Json(json!({
        "data_consent": registration.data_consent,
        "child_protection_consent": registration.child_protection_consent,
        "stage": registration.funnel_stage(),
    })))
}

#[derive(Debug, Deserialize)]
pub struct CreateTestimonialRequest {
    pub mobile_number: String,
    pub recorder_type: String,
    pub video_url: String,
}

pub async fn create_testimonial(
    State(state): State<AppState>,
    Json(req): Json<CreateTestimonialRequest>,
) -> ApiResult<Json<Value>> {
    require_fellow(&state, &req.mobile_number).await?;
    if req.video_url.trim().is_empty() {
        return Err(ApiError::bad_request("a video url is required"));
    }

    let mut testimonial = FellowTestimonial {
        id: None,
        mobile_number: req.mobile_number,
        recorder_type: req.recorder_type,
        video_url: req.video_url,
        created_at: Utc::now(),
    };
    state.storage.create_testimonial(&mut testimonial).await?;

    Ok(Json(json!({ "testimonial": testimonial })))
}

pub async fn list_testimonials(
    State(state): State<AppState>,
    Path(mobile): Path<String>,
) -> ApiResult<Json<Value>> {
    require_fellow(&state, &mobile).await?;
    let testimonials = state.storage.get_testimonials(&mobile).await?;
    Ok(Json(json!({ "testimonials": testimonials })))
}

#[derive(Debug, Deserialize)]
pub struct RecordAttendanceRequest {
    pub mobile_number: String,
    pub date: NaiveDate,
    pub present: bool,
}

pub async fn record_attendance(
    State(state): State<AppState>,
    Json(req): Json<RecordAttendanceRequest>,
) -> ApiResult<Json<Value>> {
    require_fellow(&state, &req.mobile_number).await?;

    let mut record = AttendanceRecord {
        id: None,
        mobile_number: req.mobile_number,
        date: req.date,
        present: req.present,
        created_at: Utc::now(),
    };
    state.storage.create_attendance(&mut record).await?;

    Ok(Json(json!({ "attendance": record })))
}

pub async fn list_attendance(
    State(state): State<AppState>,
    Path(mobile): Path<String>,
) -> ApiResult<Json<Value>> {
    require_fellow(&state, &mobile).await?;
    let records = state.storage.get_attendance(&mobile).await?;
    Ok(Json(json!({ "attendance": records })))
}
