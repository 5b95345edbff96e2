use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Pending,
    Accepted,
    Declined,
    Confirmed,
    Completed,
    Cancelled,
}

impl EventStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(EventStatus::Pending),
            "accepted" => Some(EventStatus::Accepted),
            "declined" => Some(EventStatus::Declined),
            "confirmed" => Some(EventStatus::Confirmed),
            "completed" => Some(EventStatus::Completed),
            "cancelled" => Some(EventStatus::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Pending => "pending",
            EventStatus::Accepted => "accepted",
            EventStatus::Declined => "declined",
            EventStatus::Confirmed => "confirmed",
            EventStatus::Completed => "completed",
            EventStatus::Cancelled => "cancelled",
        }
    }

    /// Accepted or confirmed events still ahead of us count as upcoming.
    pub fn is_upcoming(&self) -> bool {
        matches!(self, EventStatus::Accepted | EventStatus::Confirmed)
    }
}

/// A speaker request made by a host, doubling as the event record once
/// accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub event_type: Option<String>,
    pub event_date: DateTime<Utc>,
    pub duration_minutes: Option<u32>,
    pub audience_size: Option<u32>,
    pub budget: Option<f64>,
    pub organizer_name: String,
    pub organizer_email: String,
    pub speaker_id: Uuid,
    pub status: EventStatus,
    pub response_notes: Option<String>,
    pub responded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Option<Uuid>,
    pub host_user_id: Uuid,
    pub speaker_user_id: Uuid,
    pub event_id: Option<Uuid>,
    pub subject: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn includes(&self, user_id: Uuid) -> bool {
        self.host_user_id == user_id || self.speaker_user_id == user_id
    }

    /// The other side of the conversation, from `user_id`'s point of view.
    pub fn counterpart(&self, user_id: Uuid) -> Uuid {
        if self.host_user_id == user_id {
            self.speaker_user_id
        } else {
            self.host_user_id
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Option<Uuid>,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub body: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PaymentStatus::Pending),
            "completed" => Some(PaymentStatus::Completed),
            "failed" => Some(PaymentStatus::Failed),
            "refunded" => Some(PaymentStatus::Refunded),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Option<Uuid>,
    pub event_id: Uuid,
    pub amount: f64,
    pub status: PaymentStatus,
    pub payment_method: Option<String>,
    pub transaction_id: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRating {
    pub id: Option<Uuid>,
    pub event_id: Uuid,
    pub speaker_id: Uuid,
    pub organizer_name: String,
    pub rating: u8,
    pub feedback: Option<String>,
    pub would_recommend: bool,
    pub created_at: DateTime<Utc>,
}

/// One calendar day in a speaker's availability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeakerAvailability {
    pub id: Option<Uuid>,
    pub speaker_id: Uuid,
    pub date: NaiveDate,
    pub available: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactSubmission {
    pub id: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Mean of 1..=5 ratings, rounded to one decimal. None when unrated.
pub fn average_rating(ratings: &[EventRating]) -> Option<f64> {
    if ratings.is_empty() {
        return None;
    }
    let sum: u32 = ratings.iter().map(|r| r.rating as u32).sum();
    Some((sum as f64 / ratings.len() as f64 * 10.0).round() / 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rating(event_id: Uuid, value: u8) -> EventRating {
        EventRating {
            id: None,
            event_id,
            speaker_id: Uuid::new_v4(),
            organizer_name: "Org".to_string(),
            rating: value,
            feedback: None,
            would_recommend: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn average_rounds_to_one_decimal() {
        let e = Uuid::new_v4();
        let ratings = vec![rating(e, 5), rating(e, 4), rating(e, 4)];
        assert_eq!(average_rating(&ratings), Some(4.3));
        assert_eq!(average_rating(&[]), None);
    }

    #[test]
    fn event_status_round_trips_from_wire_strings() {
        for s in ["pending", "accepted", "declined", "confirmed", "completed", "cancelled"] {
            assert_eq!(EventStatus::parse(s).unwrap().as_str(), s);
        }
        assert!(EventStatus::parse("archived").is_none());
    }
}
