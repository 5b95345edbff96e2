pub mod fellowship;
pub mod locations;
pub mod marketplace;
pub mod otp;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use fellowship::*;
pub use locations::*;
pub use marketplace::*;
pub use otp::*;

/// Which side of the marketplace an account is signing up for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Host,
    Speaker,
}

impl AccountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Host => "host",
            AccountKind::Speaker => "speaker",
        }
    }
}

/// Three-valued admin gate on host and speaker accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Option<Uuid>,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Signup-in-flight record. Lives only between the initial signup request
/// and account creation, at which point it is deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingUser {
    pub id: Option<Uuid>,
    pub email: String,
    pub username: String,
    pub kind: AccountKind,
    pub first_name: String,
    pub last_name: String,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Host {
    pub id: Option<Uuid>,
    pub user_id: Uuid,
    pub organization: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub profile_image_url: Option<String>,
    pub approval_status: ApprovalStatus,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Host {
    /// Fresh profile as created at the end of signup, awaiting approval.
    pub fn new(user_id: Uuid) -> Self {
        Self {
            id: None,
            user_id,
            organization: None,
            location: None,
            bio: None,
            profile_image_url: None,
            approval_status: ApprovalStatus::Pending,
            approved_at: None,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Speaker {
    pub id: Option<Uuid>,
    pub user_id: Uuid,
    pub expertise: Option<String>,
    pub industry: Option<String>,
    pub speaking_topics: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub languages: Option<String>,
    pub profile_image_url: Option<String>,
    pub availability_status: Option<String>,
    pub approval_status: ApprovalStatus,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Speaker {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            id: None,
            user_id,
            expertise: None,
            industry: None,
            speaking_topics: None,
            bio: None,
            location: None,
            languages: None,
            profile_image_url: None,
            availability_status: None,
            approval_status: ApprovalStatus::Pending,
            approved_at: None,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Option<Uuid>,
    pub user_id: Uuid,
    pub phone: Option<String>,
    pub occupation: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            id: None,
            user_id,
            phone: None,
            occupation: None,
            created_at: Utc::now(),
        }
    }
}
