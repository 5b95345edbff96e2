//! OTP issuance and verification against storage. Handlers and the
//! operational flows share these; the pure state transitions live on
//! `OtpVerification` itself.

use crate::email::OutboundEmail;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use chrono::{Duration, Utc};
use cni_core::domain::{
    OtpPurpose, OtpVerification, VerifyOutcome, OTP_RESEND_LIMIT, OTP_RESEND_WINDOW_SECONDS,
    OTP_TTL_MINUTES,
};

/// Issue a fresh code and email it. Subject to the resend throttle; a new
/// code supersedes any outstanding one for the same email and purpose.
pub async fn issue_otp(state: &AppState, email: &str, purpose: OtpPurpose) -> ApiResult<()> {
    let window_start = Utc::now() - Duration::seconds(OTP_RESEND_WINDOW_SECONDS);
    let recent = state
        .storage
        .count_otps_since(email, purpose, window_start)
        .await?;
    if recent >= OTP_RESEND_LIMIT {
        return Err(ApiError::too_many_requests(
            "too many codes requested; wait a minute before retrying",
        ));
    }

    let mut otp = OtpVerification::issue(email, purpose);
    state.storage.create_otp(&mut otp).await?;

    state
        .mailer
        .send(OutboundEmail {
            to: email.to_string(),
            subject: purpose.email_subject().to_string(),
            body: format!(
                "Your verification code is {}. It expires in {} minutes.",
                otp.code, OTP_TTL_MINUTES
            ),
        })
        .await?;

    Ok(())
}

/// Run one verification attempt against the newest outstanding code and
/// persist the result (consumed on success, attempt counted on mismatch).
pub async fn verify_otp(
    state: &AppState,
    email: &str,
    purpose: OtpPurpose,
    code: &str,
) -> ApiResult<()> {
    let mut otp = state
        .storage
        .get_unverified_otp(email, purpose)
        .await?
        .ok_or_else(|| ApiError::bad_request("no verification code on file for this email"))?;

    match otp.verify(code) {
        VerifyOutcome::Verified => {
            state.storage.update_otp(&otp).await?;
            Ok(())
        }
        VerifyOutcome::Expired => Err(ApiError::bad_request(
            "verification code expired; request a new one",
        )),
        VerifyOutcome::AttemptsExhausted => Err(ApiError::bad_request(
            "too many incorrect attempts; request a new code",
        )),
        VerifyOutcome::Mismatch { remaining } => {
            state.storage.update_otp(&otp).await?;
            Err(ApiError::bad_request(format!(
                "incorrect code; {remaining} attempts remaining"
            )))
        }
    }
}
