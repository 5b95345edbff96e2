use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// First contact with the program: name and mobile number only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FellowSignup {
    pub id: Option<Uuid>,
    pub unique_number: String,
    pub surname: String,
    pub given_name: String,
    pub full_name: String,
    pub mobile_number: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl FellowSignup {
    /// Canonical form used for the duplicate check: `SURNAME GIVEN_NAME`,
    /// upper-cased.
    pub fn compose_full_name(surname: &str, given_name: &str) -> String {
        format!("{} {}", surname.to_uppercase(), given_name.to_uppercase())
            .trim()
            .to_string()
    }

    pub fn unique_number_for(year: i32, sequence: usize) -> String {
        format!("CNI-{year}-{sequence:05}")
    }
}

/// Full registration plus the onboarding funnel flags. Keyed by mobile
/// number, one row per fellow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FellowRegistration {
    pub id: Option<Uuid>,
    pub mobile_number: String,
    pub full_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub caste_category: Option<String>,
    pub state_id: Option<u32>,
    pub district_id: Option<u32>,
    pub mandal_id: Option<u32>,
    pub gram_panchayat_id: Option<u32>,
    pub academic_year: Option<String>,
    pub batch: Option<String>,
    pub video1_seen: bool,
    pub video2_seen: bool,
    pub task1_submitted: bool,
    pub task2_submitted: bool,
    pub approved: bool,
    pub data_consent: bool,
    pub child_protection_consent: bool,
    pub created_at: DateTime<Utc>,
}

impl FellowRegistration {
    /// Where the fellow currently stands in the onboarding funnel.
    pub fn funnel_stage(&self) -> FunnelStage {
        if !self.video1_seen || !self.video2_seen {
            FunnelStage::Orientation
        } else if !self.task1_submitted || !self.task2_submitted {
            FunnelStage::Tasks
        } else if !self.approved {
            FunnelStage::Selection
        } else if !self.data_consent || !self.child_protection_consent {
            FunnelStage::Consent
        } else {
            FunnelStage::Active
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunnelStage {
    /// Registered but orientation videos unwatched.
    Orientation,
    /// Videos done, tasks outstanding.
    Tasks,
    /// Tasks in, awaiting selection.
    Selection,
    /// Selected, consents outstanding.
    Consent,
    /// Fully onboarded.
    Active,
}

/// Learning-centre details captured with the task submissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDetails {
    pub id: Option<Uuid>,
    pub mobile_number: String,
    pub lc_district: Option<String>,
    pub lc_mandal: Option<String>,
    pub lc_gram_panchayat: Option<String>,
    pub lc_photo_url: Option<String>,
    pub students_marks_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FellowTestimonial {
    pub id: Option<Uuid>,
    pub mobile_number: String,
    pub recorder_type: String,
    pub video_url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: Option<Uuid>,
    pub mobile_number: String,
    pub date: NaiveDate,
    pub present: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration() -> FellowRegistration {
        FellowRegistration {
            id: None,
            mobile_number: "9876543210".to_string(),
            full_name: "RAO ANITA".to_string(),
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
        }
    }

    #[test]
    fn full_name_is_uppercased_surname_first() {
        assert_eq!(
            FellowSignup::compose_full_name("rao", "Anita"),
            "RAO ANITA"
        );
    }

    #[test]
    fn funnel_advances_flag_by_flag() {
        let mut r = registration();
        assert_eq!(r.funnel_stage(), FunnelStage::Orientation);
        r.video1_seen = true;
        r.video2_seen = true;
        assert_eq!(r.funnel_stage(), FunnelStage::Tasks);
        r.task1_submitted = true;
        r.task2_submitted = true;
        assert_eq!(r.funnel_stage(), FunnelStage::Selection);
        r.approved = true;
        assert_eq!(r.funnel_stage(), FunnelStage::Consent);
        r.data_consent = true;
        r.child_protection_consent = true;
        assert_eq!(r.funnel_stage(), FunnelStage::Active);
    }
}
