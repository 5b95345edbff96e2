use super::traits::Storage;
use crate::common::error::{CoreError, Result};
use crate::database::DatabaseManager;
use crate::domain::*;
use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Entity labels in the document store.
mod label {
    pub const USER: &str = "user";
    pub const PENDING_USER: &str = "pending_user";
    pub const OTP: &str = "otp";
    pub const HOST: &str = "host";
    pub const SPEAKER: &str = "speaker";
    pub const USER_PROFILE: &str = "user_profile";
    pub const EVENT: &str = "event";
    pub const CONVERSATION: &str = "conversation";
    pub const MESSAGE: &str = "message";
    pub const PAYMENT: &str = "payment";
    pub const RATING: &str = "event_rating";
    pub const AVAILABILITY: &str = "availability";
    pub const CONTACT: &str = "contact_submission";
    pub const STATE: &str = "state";
    pub const DISTRICT: &str = "district";
    pub const MANDAL: &str = "mandal";
    pub const GRAM_PANCHAYAT: &str = "gram_panchayat";
    pub const FELLOW_SIGNUP: &str = "fellow_signup";
    pub const FELLOW_REGISTRATION: &str = "fellow_registration";
    pub const TASK_DETAILS: &str = "task_details";
    pub const TESTIMONIAL: &str = "fellow_testimonial";
    pub const ATTENDANCE: &str = "attendance";
}

/// Database storage implementation over the libSQL document store. Each row
/// is a JSON document; relations are ids inside the documents, and filtered
/// reads scan by label.
pub struct DatabaseStorage {
    db: Arc<DatabaseManager>,
}

fn decode<T: DeserializeOwned>(label: &str, data: &str) -> Result<T> {
    serde_json::from_str(data).map_err(|e| CoreError::Database {
        message: format!("Failed to deserialize {label}: {e}"),
    })
}

fn encode<T: Serialize>(label: &str, value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| CoreError::Database {
        message: format!("Failed to serialize {label}: {e}"),
    })
}

fn require_id(id: Option<Uuid>, what: &'static str) -> Result<Uuid> {
    id.ok_or_else(|| CoreError::Database {
        message: format!("cannot update {what} without an id"),
    })
}

impl DatabaseStorage {
    pub async fn new() -> Result<Self> {
        let db_manager = DatabaseManager::new().await?;
        db_manager.run_migrations().await?;

        Ok(Self {
            db: Arc::new(db_manager),
        })
    }

    async fn put<T: Serialize>(&self, label: &str, id: &str, value: &T) -> Result<()> {
        let data = encode(label, value)?;
        self.db.upsert_node(id, label, &data).await
    }

    async fn fetch<T: DeserializeOwned>(&self, label: &str, id: &str) -> Result<Option<T>> {
        match self.db.get_node(id).await? {
            Some((node_label, data)) if node_label == label => decode(label, &data).map(Some),
            _ => Ok(None),
        }
    }

    async fn scan<T: DeserializeOwned>(&self, label: &str) -> Result<Vec<T>> {
        let mut out = Vec::new();
        for (_, data) in self.db.get_nodes_by_label(label).await? {
            out.push(decode(label, &data)?);
        }
        Ok(out)
    }

}

fn pending_key(email: &str) -> String {
    format!("{}:{}", label::PENDING_USER, email.to_lowercase())
}

#[async_trait]
impl Storage for DatabaseStorage {
    async fn create_user(&self, user: &mut User) -> Result<()> {
        let id = user.id.unwrap_or_else(Uuid::new_v4);
        user.id = Some(id);
        self.put(label::USER, &id.to_string(), user).await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let users: Vec<User> = self.scan(label::USER).await?;
        Ok(users
            .into_iter()
            .find(|u| u.email.eq_ignore_ascii_case(email)))
    }

    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        self.fetch(label::USER, &id.to_string()).await
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        let id = require_id(user.id, "user")?;
        self.put(label::USER, &id.to_string(), user).await
    }

    async fn upsert_pending_user(&self, pending: &mut PendingUser) -> Result<()> {
        let key = pending_key(&pending.email);
        if let Some(existing) = self.fetch::<PendingUser>(label::PENDING_USER, &key).await? {
            pending.id = existing.id;
        } else if pending.id.is_none() {
            pending.id = Some(Uuid::new_v4());
        }
        self.put(label::PENDING_USER, &key, pending).await
    }

    async fn get_pending_user(&self, email: &str) -> Result<Option<PendingUser>> {
        self.fetch(label::PENDING_USER, &pending_key(email)).await
    }

    async fn delete_pending_user(&self, email: &str) -> Result<()> {
        self.db.delete_node(&pending_key(email)).await
    }

    async fn create_otp(&self, otp: &mut OtpVerification) -> Result<()> {
        let id = otp.id.unwrap_or_else(Uuid::new_v4);
        otp.id = Some(id);
        self.put(label::OTP, &id.to_string(), otp).await
    }

    async fn get_unverified_otp(
        &self,
        email: &str,
        purpose: OtpPurpose,
    ) -> Result<Option<OtpVerification>> {
        let otps: Vec<OtpVerification> = self.scan(label::OTP).await?;
        Ok(otps
            .into_iter()
            .filter(|o| o.email.eq_ignore_ascii_case(email) && o.purpose == purpose && !o.verified)
            .max_by_key(|o| o.created_at))
    }

    async fn update_otp(&self, otp: &OtpVerification) -> Result<()> {
        let id = require_id(otp.id, "otp")?;
        self.put(label::OTP, &id.to_string(), otp).await
    }

    async fn delete_otps(&self, email: &str, purpose: Option<OtpPurpose>) -> Result<()> {
        for (node_id, data) in self.db.get_nodes_by_label(label::OTP).await? {
            let otp: OtpVerification = decode(label::OTP, &data)?;
            if otp.email.eq_ignore_ascii_case(email)
                && purpose.map_or(true, |p| otp.purpose == p)
            {
                self.db.delete_node(&node_id).await?;
            }
        }
        Ok(())
    }

    async fn count_otps_since(
        &self,
        email: &str,
        purpose: OtpPurpose,
        since: DateTime<Utc>,
    ) -> Result<usize> {
        let otps: Vec<OtpVerification> = self.scan(label::OTP).await?;
        Ok(otps
            .iter()
            .filter(|o| {
                o.email.eq_ignore_ascii_case(email)
                    && o.purpose == purpose
                    && o.created_at >= since
            })
            .count())
    }

    async fn create_host(&self, host: &mut Host) -> Result<()> {
        let id = host.id.unwrap_or_else(Uuid::new_v4);
        host.id = Some(id);
        self.put(label::HOST, &id.to_string(), host).await
    }

    async fn get_host_by_id(&self, id: Uuid) -> Result<Option<Host>> {
        self.fetch(label::HOST, &id.to_string()).await
    }

    async fn get_host_by_user(&self, user_id: Uuid) -> Result<Option<Host>> {
        let hosts: Vec<Host> = self.scan(label::HOST).await?;
        Ok(hosts.into_iter().find(|h| h.user_id == user_id))
    }

    async fn update_host(&self, host: &Host) -> Result<()> {
        let id = require_id(host.id, "host")?;
        self.put(label::HOST, &id.to_string(), host).await
    }

    async fn create_speaker(&self, speaker: &mut Speaker) -> Result<()> {
        let id = speaker.id.unwrap_or_else(Uuid::new_v4);
        speaker.id = Some(id);
        self.put(label::SPEAKER, &id.to_string(), speaker).await
    }

    async fn get_speaker_by_id(&self, id: Uuid) -> Result<Option<Speaker>> {
        self.fetch(label::SPEAKER, &id.to_string()).await
    }

    async fn get_speaker_by_user(&self, user_id: Uuid) -> Result<Option<Speaker>> {
        let speakers: Vec<Speaker> = self.scan(label::SPEAKER).await?;
        Ok(speakers.into_iter().find(|s| s.user_id == user_id))
    }

    async fn update_speaker(&self, speaker: &Speaker) -> Result<()> {
        let id = require_id(speaker.id, "speaker")?;
        self.put(label::SPEAKER, &id.to_string(), speaker).await
    }

    async fn get_all_speakers(&self) -> Result<Vec<Speaker>> {
        let mut speakers: Vec<Speaker> = self.scan(label::SPEAKER).await?;
        speakers.sort_by_key(|s| s.created_at);
        Ok(speakers)
    }

    async fn create_user_profile(&self, profile: &mut UserProfile) -> Result<()> {
        let id = profile.id.unwrap_or_else(Uuid::new_v4);
        profile.id = Some(id);
        self.put(label::USER_PROFILE, &id.to_string(), profile).await
    }

    async fn get_user_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>> {
        let profiles: Vec<UserProfile> = self.scan(label::USER_PROFILE).await?;
        Ok(profiles.into_iter().find(|p| p.user_id == user_id))
    }

    async fn create_event(&self, event: &mut Event) -> Result<()> {
        let id = event.id.unwrap_or_else(Uuid::new_v4);
        event.id = Some(id);
        self.put(label::EVENT, &id.to_string(), event).await
    }

    async fn get_event_by_id(&self, id: Uuid) -> Result<Option<Event>> {
        self.fetch(label::EVENT, &id.to_string()).await
    }

    async fn update_event(&self, event: &Event) -> Result<()> {
        let id = require_id(event.id, "event")?;
        self.put(label::EVENT, &id.to_string(), event).await
    }

    async fn get_events_by_speaker(&self, speaker_id: Uuid) -> Result<Vec<Event>> {
        let mut events: Vec<Event> = self.scan(label::EVENT).await?;
        events.retain(|e| e.speaker_id == speaker_id);
        events.sort_by_key(|e| e.created_at);
        Ok(events)
    }

    async fn get_events_by_organizer(&self, email: &str) -> Result<Vec<Event>> {
        let mut events: Vec<Event> = self.scan(label::EVENT).await?;
        events.retain(|e| e.organizer_email.eq_ignore_ascii_case(email));
        events.sort_by_key(|e| e.created_at);
        Ok(events)
    }

    async fn create_conversation(&self, conversation: &mut Conversation) -> Result<()> {
        let id = conversation.id.unwrap_or_else(Uuid::new_v4);
        conversation.id = Some(id);
        self.put(label::CONVERSATION, &id.to_string(), conversation)
            .await
    }

    async fn get_conversation_by_id(&self, id: Uuid) -> Result<Option<Conversation>> {
        self.fetch(label::CONVERSATION, &id.to_string()).await
    }

    async fn update_conversation(&self, conversation: &Conversation) -> Result<()> {
        let id = require_id(conversation.id, "conversation")?;
        self.put(label::CONVERSATION, &id.to_string(), conversation)
            .await
    }

    async fn find_conversation(
        &self,
        host_user_id: Uuid,
        speaker_user_id: Uuid,
        event_id: Option<Uuid>,
    ) -> Result<Option<Conversation>> {
        let conversations: Vec<Conversation> = self.scan(label::CONVERSATION).await?;
        Ok(conversations.into_iter().find(|c| {
            c.host_user_id == host_user_id
                && c.speaker_user_id == speaker_user_id
                && c.event_id == event_id
        }))
    }

    async fn get_conversations_for_user(&self, user_id: Uuid) -> Result<Vec<Conversation>> {
        let mut conversations: Vec<Conversation> = self.scan(label::CONVERSATION).await?;
        conversations.retain(|c| c.includes(user_id));
        conversations.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(conversations)
    }

    async fn create_message(&self, message: &mut Message) -> Result<()> {
        let id = message.id.unwrap_or_else(Uuid::new_v4);
        message.id = Some(id);
        self.put(label::MESSAGE, &id.to_string(), message).await
    }

    async fn get_messages_by_conversation(&self, conversation_id: Uuid) -> Result<Vec<Message>> {
        let mut messages: Vec<Message> = self.scan(label::MESSAGE).await?;
        messages.retain(|m| m.conversation_id == conversation_id);
        messages.sort_by_key(|m| m.created_at);
        Ok(messages)
    }

    async fn mark_messages_read(&self, conversation_id: Uuid, recipient_id: Uuid) -> Result<()> {
        for (node_id, data) in self.db.get_nodes_by_label(label::MESSAGE).await? {
            let mut message: Message = decode(label::MESSAGE, &data)?;
            if message.conversation_id == conversation_id
                && message.recipient_id == recipient_id
                && !message.read
            {
                message.read = true;
                self.put(label::MESSAGE, &node_id, &message).await?;
            }
        }
        Ok(())
    }

    async fn create_payment(&self, payment: &mut Payment) -> Result<()> {
        let id = payment.id.unwrap_or_else(Uuid::new_v4);
        payment.id = Some(id);
        self.put(label::PAYMENT, &id.to_string(), payment).await
    }

    async fn get_payment_by_id(&self, id: Uuid) -> Result<Option<Payment>> {
        self.fetch(label::PAYMENT, &id.to_string()).await
    }

    async fn get_payment_by_event(&self, event_id: Uuid) -> Result<Option<Payment>> {
        let payments: Vec<Payment> = self.scan(label::PAYMENT).await?;
        Ok(payments.into_iter().find(|p| p.event_id == event_id))
    }

    async fn update_payment(&self, payment: &Payment) -> Result<()> {
        let id = require_id(payment.id, "payment")?;
        self.put(label::PAYMENT, &id.to_string(), payment).await
    }

    async fn create_rating(&self, rating: &mut EventRating) -> Result<()> {
        let id = rating.id.unwrap_or_else(Uuid::new_v4);
        rating.id = Some(id);
        self.put(label::RATING, &id.to_string(), rating).await
    }

    async fn get_rating_by_event(&self, event_id: Uuid) -> Result<Option<EventRating>> {
        let ratings: Vec<EventRating> = self.scan(label::RATING).await?;
        Ok(ratings.into_iter().find(|r| r.event_id == event_id))
    }

    async fn get_ratings_by_speaker(&self, speaker_id: Uuid) -> Result<Vec<EventRating>> {
        let mut ratings: Vec<EventRating> = self.scan(label::RATING).await?;
        ratings.retain(|r| r.speaker_id == speaker_id);
        ratings.sort_by_key(|r| r.created_at);
        Ok(ratings)
    }

    async fn upsert_availability(&self, slot: &mut SpeakerAvailability) -> Result<()> {
        let existing: Vec<SpeakerAvailability> = self.scan(label::AVAILABILITY).await?;
        let id = existing
            .iter()
            .find(|s| s.speaker_id == slot.speaker_id && s.date == slot.date)
            .and_then(|s| s.id)
            .unwrap_or_else(Uuid::new_v4);
        slot.id = Some(id);
        self.put(label::AVAILABILITY, &id.to_string(), slot).await
    }

    async fn get_availability(
        &self,
        speaker_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<SpeakerAvailability>> {
        let mut slots: Vec<SpeakerAvailability> = self.scan(label::AVAILABILITY).await?;
        slots.retain(|s| s.speaker_id == speaker_id && s.date >= start && s.date <= end);
        slots.sort_by_key(|s| s.date);
        Ok(slots)
    }

    async fn create_contact_submission(&self, submission: &mut ContactSubmission) -> Result<()> {
        let id = submission.id.unwrap_or_else(Uuid::new_v4);
        submission.id = Some(id);
        self.put(label::CONTACT, &id.to_string(), submission).await
    }

    async fn upsert_state(&self, state: &State) -> Result<()> {
        self.put(label::STATE, &format!("state:{}", state.id), state)
            .await
    }

    async fn upsert_district(&self, district: &District) -> Result<()> {
        self.put(
            label::DISTRICT,
            &format!("district:{}", district.id),
            district,
        )
        .await
    }

    async fn upsert_mandal(&self, mandal: &Mandal) -> Result<()> {
        self.put(label::MANDAL, &format!("mandal:{}", mandal.id), mandal)
            .await
    }

    async fn upsert_gram_panchayat(&self, gp: &GramPanchayat) -> Result<()> {
        self.put(
            label::GRAM_PANCHAYAT,
            &format!("gram_panchayat:{}", gp.id),
            gp,
        )
        .await
    }

    async fn get_states(&self) -> Result<Vec<State>> {
        let mut states: Vec<State> = self.scan(label::STATE).await?;
        states.sort_by_key(|s| s.id);
        Ok(states)
    }

    async fn get_districts(&self, state_id: u32) -> Result<Vec<District>> {
        let mut districts: Vec<District> = self.scan(label::DISTRICT).await?;
        districts.retain(|d| d.state_id == state_id);
        districts.sort_by_key(|d| d.id);
        Ok(districts)
    }

    async fn get_mandals(&self, district_id: u32) -> Result<Vec<Mandal>> {
        let mut mandals: Vec<Mandal> = self.scan(label::MANDAL).await?;
        mandals.retain(|m| m.district_id == district_id);
        mandals.sort_by_key(|m| m.id);
        Ok(mandals)
    }

    async fn get_gram_panchayats(&self, mandal_id: u32) -> Result<Vec<GramPanchayat>> {
        let mut gps: Vec<GramPanchayat> = self.scan(label::GRAM_PANCHAYAT).await?;
        gps.retain(|g| g.mandal_id == mandal_id);
        gps.sort_by_key(|g| g.id);
        Ok(gps)
    }

    async fn create_fellow_signup(&self, signup: &mut FellowSignup) -> Result<()> {
        let id = signup.id.unwrap_or_else(Uuid::new_v4);
        signup.id = Some(id);
        let sequence = self.db.get_nodes_by_label(label::FELLOW_SIGNUP).await?.len() + 1;
        signup.unique_number = FellowSignup::unique_number_for(Utc::now().year(), sequence);
        self.put(label::FELLOW_SIGNUP, &id.to_string(), signup).await
    }

    async fn get_fellow_by_mobile(&self, mobile: &str) -> Result<Option<FellowSignup>> {
        let signups: Vec<FellowSignup> = self.scan(label::FELLOW_SIGNUP).await?;
        Ok(signups.into_iter().find(|f| f.mobile_number == mobile))
    }

    async fn find_fellow(&self, mobile: &str, full_name: &str) -> Result<Option<FellowSignup>> {
        let signups: Vec<FellowSignup> = self.scan(label::FELLOW_SIGNUP).await?;
        Ok(signups
            .into_iter()
            .find(|f| f.mobile_number == mobile && f.full_name == full_name))
    }

    async fn upsert_fellow_registration(
        &self,
        registration: &mut FellowRegistration,
    ) -> Result<()> {
        let key = format!("{}:{}", label::FELLOW_REGISTRATION, registration.mobile_number);
        if let Some(existing) = self
            .fetch::<FellowRegistration>(label::FELLOW_REGISTRATION, &key)
            .await?
        {
            registration.id = existing.id;
        } else if registration.id.is_none() {
            registration.id = Some(Uuid::new_v4());
        }
        self.put(label::FELLOW_REGISTRATION, &key, registration).await
    }

    async fn get_fellow_registration(&self, mobile: &str) -> Result<Option<FellowRegistration>> {
        let key = format!("{}:{}", label::FELLOW_REGISTRATION, mobile);
        self.fetch(label::FELLOW_REGISTRATION, &key).await
    }

    async fn upsert_task_details(&self, details: &mut TaskDetails) -> Result<()> {
        let key = format!("{}:{}", label::TASK_DETAILS, details.mobile_number);
        if let Some(existing) = self.fetch::<TaskDetails>(label::TASK_DETAILS, &key).await? {
            details.id = existing.id;
        } else if details.id.is_none() {
            details.id = Some(Uuid::new_v4());
        }
        self.put(label::TASK_DETAILS, &key, details).await
    }

    async fn get_task_details(&self, mobile: &str) -> Result<Option<TaskDetails>> {
        let key = format!("{}:{}", label::TASK_DETAILS, mobile);
        self.fetch(label::TASK_DETAILS, &key).await
    }

    async fn create_testimonial(&self, testimonial: &mut FellowTestimonial) -> Result<()> {
        let id = testimonial.id.unwrap_or_else(Uuid::new_v4);
        testimonial.id = Some(id);
        self.put(label::TESTIMONIAL, &id.to_string(), testimonial)
            .await
    }

    async fn get_testimonials(&self, mobile: &str) -> Result<Vec<FellowTestimonial>> {
        let mut testimonials: Vec<FellowTestimonial> = self.scan(label::TESTIMONIAL).await?;
        testimonials.retain(|t| t.mobile_number == mobile);
        testimonials.sort_by_key(|t| t.created_at);
        Ok(testimonials)
    }

    async fn create_attendance(&self, record: &mut AttendanceRecord) -> Result<()> {
        let id = record.id.unwrap_or_else(Uuid::new_v4);
        record.id = Some(id);
        self.put(label::ATTENDANCE, &id.to_string(), record).await
    }

    async fn get_attendance(&self, mobile: &str) -> Result<Vec<AttendanceRecord>> {
        let mut records: Vec<AttendanceRecord> = self.scan(label::ATTENDANCE).await?;
        records.retain(|a| a.mobile_number == mobile);
        records.sort_by_key(|a| a.date);
        Ok(records)
    }
}
