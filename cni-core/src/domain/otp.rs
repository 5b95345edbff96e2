//! One-time verification codes: the stateful heart of account provisioning.
//!
//! A code is valid for a bounded time window and a bounded number of guess
//! attempts. Issuing a new code for the same email and purpose invalidates
//! the old one; a verified code is consumed and never matches again.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AccountKind;

/// Minutes a code stays valid after issue.
pub const OTP_TTL_MINUTES: i64 = 10;

/// Wrong guesses allowed before the code is dead.
pub const OTP_MAX_ATTEMPTS: u32 = 3;

/// Resend throttle: at most this many codes per email+purpose...
pub const OTP_RESEND_LIMIT: usize = 3;
/// ...within this window.
pub const OTP_RESEND_WINDOW_SECONDS: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    SignupHost,
    SignupSpeaker,
    ForgotPassword,
}

impl OtpPurpose {
    pub fn for_signup(kind: AccountKind) -> Self {
        match kind {
            AccountKind::Host => OtpPurpose::SignupHost,
            AccountKind::Speaker => OtpPurpose::SignupSpeaker,
        }
    }

    pub fn email_subject(&self) -> &'static str {
        match self {
            OtpPurpose::SignupHost => "Complete Your Host Registration",
            OtpPurpose::SignupSpeaker => "Complete Your Speaker Registration",
            OtpPurpose::ForgotPassword => "Reset Your Password",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OtpPurpose::SignupHost => "signup_host",
            OtpPurpose::SignupSpeaker => "signup_speaker",
            OtpPurpose::ForgotPassword => "forgot_password",
        }
    }
}

/// Result of a single verification attempt, in check order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// Code matched; the row is now consumed.
    Verified,
    /// Past the expiry window.
    Expired,
    /// Guess budget already spent.
    AttemptsExhausted,
    /// Wrong code; `remaining` guesses left.
    Mismatch { remaining: u32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpVerification {
    pub id: Option<Uuid>,
    pub email: String,
    pub code: String,
    pub purpose: OtpPurpose,
    pub verified: bool,
    pub attempts: u32,
    pub max_attempts: u32,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl OtpVerification {
    pub fn issue(email: &str, purpose: OtpPurpose) -> Self {
        Self::issue_at(email, purpose, Utc::now())
    }

    /// Issue with an explicit clock, so expiry paths are testable.
    pub fn issue_at(email: &str, purpose: OtpPurpose, now: DateTime<Utc>) -> Self {
        Self {
            id: None,
            email: email.to_string(),
            code: generate_code(),
            purpose,
            verified: false,
            attempts: 0,
            max_attempts: OTP_MAX_ATTEMPTS,
            created_at: now,
            expires_at: now + Duration::minutes(OTP_TTL_MINUTES),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn remaining_attempts(&self) -> u32 {
        self.max_attempts.saturating_sub(self.attempts)
    }

    pub fn verify(&mut self, code: &str) -> VerifyOutcome {
        self.verify_at(code, Utc::now())
    }

    /// Run one verification attempt. Checks are ordered: expiry, then the
    /// attempt budget, then the code itself. A mismatch burns an attempt;
    /// expiry and exhaustion do not.
    pub fn verify_at(&mut self, code: &str, now: DateTime<Utc>) -> VerifyOutcome {
        if self.is_expired_at(now) {
            return VerifyOutcome::Expired;
        }
        if self.attempts >= self.max_attempts {
            return VerifyOutcome::AttemptsExhausted;
        }
        if self.code != code {
            self.attempts += 1;
            return VerifyOutcome::Mismatch {
                remaining: self.remaining_attempts(),
            };
        }
        self.verified = true;
        VerifyOutcome::Verified
    }
}

/// Six decimal digits, zero-padded so leading zeros survive as text.
pub fn generate_code() -> String {
    let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{n:06}")
}
