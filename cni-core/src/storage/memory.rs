use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::common::error::{CoreError, Result};
use crate::domain::*;

use super::traits::Storage;

/// In-memory storage implementation for development and testing.
#[derive(Default)]
pub struct InMemoryStorage {
    users: Mutex<HashMap<Uuid, User>>,
    pending_users: Mutex<HashMap<String, PendingUser>>,
    otps: Mutex<Vec<OtpVerification>>,
    hosts: Mutex<HashMap<Uuid, Host>>,
    speakers: Mutex<HashMap<Uuid, Speaker>>,
    profiles: Mutex<HashMap<Uuid, UserProfile>>,
    events: Mutex<HashMap<Uuid, Event>>,
    conversations: Mutex<HashMap<Uuid, Conversation>>,
    messages: Mutex<HashMap<Uuid, Message>>,
    payments: Mutex<HashMap<Uuid, Payment>>,
    ratings: Mutex<HashMap<Uuid, EventRating>>,
    availability: Mutex<HashMap<Uuid, SpeakerAvailability>>,
    contacts: Mutex<HashMap<Uuid, ContactSubmission>>,
    states: Mutex<BTreeMap<u32, State>>,
    districts: Mutex<BTreeMap<u32, District>>,
    mandals: Mutex<BTreeMap<u32, Mandal>>,
    gram_panchayats: Mutex<BTreeMap<u32, GramPanchayat>>,
    fellow_signups: Mutex<HashMap<Uuid, FellowSignup>>,
    fellow_registrations: Mutex<HashMap<String, FellowRegistration>>,
    task_details: Mutex<HashMap<String, TaskDetails>>,
    testimonials: Mutex<HashMap<Uuid, FellowTestimonial>>,
    attendance: Mutex<HashMap<Uuid, AttendanceRecord>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn missing_id(what: &'static str) -> CoreError {
    CoreError::Database {
        message: format!("cannot update {what} without an id"),
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn create_user(&self, user: &mut User) -> Result<()> {
        let id = Uuid::new_v4();
        user.id = Some(id);
        self.users.lock().unwrap().insert(id, user.clone());
        debug!("Created user {} with id {}", user.email, id);
        Ok(())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        let id = user.id.ok_or_else(|| missing_id("user"))?;
        self.users.lock().unwrap().insert(id, user.clone());
        Ok(())
    }

    async fn upsert_pending_user(&self, pending: &mut PendingUser) -> Result<()> {
        let mut table = self.pending_users.lock().unwrap();
        let key = pending.email.to_lowercase();
        if let Some(existing) = table.get(&key) {
            pending.id = existing.id;
        } else {
            pending.id = Some(Uuid::new_v4());
        }
        table.insert(key, pending.clone());
        Ok(())
    }

    async fn get_pending_user(&self, email: &str) -> Result<Option<PendingUser>> {
        Ok(self
            .pending_users
            .lock()
            .unwrap()
            .get(&email.to_lowercase())
            .cloned())
    }

    async fn delete_pending_user(&self, email: &str) -> Result<()> {
        self.pending_users
            .lock()
            .unwrap()
            .remove(&email.to_lowercase());
        Ok(())
    }

    async fn create_otp(&self, otp: &mut OtpVerification) -> Result<()> {
        otp.id = Some(Uuid::new_v4());
        self.otps.lock().unwrap().push(otp.clone());
        Ok(())
    }

    async fn get_unverified_otp(
        &self,
        email: &str,
        purpose: OtpPurpose,
    ) -> Result<Option<OtpVerification>> {
        let otps = self.otps.lock().unwrap();
        Ok(otps
            .iter()
            .filter(|o| o.email.eq_ignore_ascii_case(email) && o.purpose == purpose && !o.verified)
            .max_by_key(|o| o.created_at)
            .cloned())
    }

    async fn update_otp(&self, otp: &OtpVerification) -> Result<()> {
        let id = otp.id.ok_or_else(|| missing_id("otp"))?;
        let mut otps = self.otps.lock().unwrap();
        if let Some(slot) = otps.iter_mut().find(|o| o.id == Some(id)) {
            *slot = otp.clone();
        }
        Ok(())
    }

    async fn delete_otps(&self, email: &str, purpose: Option<OtpPurpose>) -> Result<()> {
        let mut otps = self.otps.lock().unwrap();
        otps.retain(|o| {
            !(o.email.eq_ignore_ascii_case(email)
                && purpose.map_or(true, |p| o.purpose == p))
        });
        Ok(())
    }

    async fn count_otps_since(
        &self,
        email: &str,
        purpose: OtpPurpose,
        since: DateTime<Utc>,
    ) -> Result<usize> {
        let otps = self.otps.lock().unwrap();
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
        let id = Uuid::new_v4();
        host.id = Some(id);
        self.hosts.lock().unwrap().insert(id, host.clone());
        Ok(())
    }

    async fn get_host_by_id(&self, id: Uuid) -> Result<Option<Host>> {
        Ok(self.hosts.lock().unwrap().get(&id).cloned())
    }

    async fn get_host_by_user(&self, user_id: Uuid) -> Result<Option<Host>> {
        let hosts = self.hosts.lock().unwrap();
        Ok(hosts.values().find(|h| h.user_id == user_id).cloned())
    }

    async fn update_host(&self, host: &Host) -> Result<()> {
        let id = host.id.ok_or_else(|| missing_id("host"))?;
        self.hosts.lock().unwrap().insert(id, host.clone());
        Ok(())
    }

    async fn create_speaker(&self, speaker: &mut Speaker) -> Result<()> {
        let id = Uuid::new_v4();
        speaker.id = Some(id);
        self.speakers.lock().unwrap().insert(id, speaker.clone());
        Ok(())
    }

    async fn get_speaker_by_id(&self, id: Uuid) -> Result<Option<Speaker>> {
        Ok(self.speakers.lock().unwrap().get(&id).cloned())
    }

    async fn get_speaker_by_user(&self, user_id: Uuid) -> Result<Option<Speaker>> {
        let speakers = self.speakers.lock().unwrap();
        Ok(speakers.values().find(|s| s.user_id == user_id).cloned())
    }

    async fn update_speaker(&self, speaker: &Speaker) -> Result<()> {
        let id = speaker.id.ok_or_else(|| missing_id("speaker"))?;
        self.speakers.lock().unwrap().insert(id, speaker.clone());
        Ok(())
    }

    async fn get_all_speakers(&self) -> Result<Vec<Speaker>> {
        let speakers = self.speakers.lock().unwrap();
        let mut all: Vec<Speaker> = speakers.values().cloned().collect();
        all.sort_by_key(|s| s.created_at);
        Ok(all)
    }

    async fn create_user_profile(&self, profile: &mut UserProfile) -> Result<()> {
        let id = Uuid::new_v4();
        profile.id = Some(id);
        self.profiles.lock().unwrap().insert(id, profile.clone());
        Ok(())
    }

    async fn get_user_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>> {
        let profiles = self.profiles.lock().unwrap();
        Ok(profiles.values().find(|p| p.user_id == user_id).cloned())
    }

    async fn create_event(&self, event: &mut Event) -> Result<()> {
        let id = Uuid::new_v4();
        event.id = Some(id);
        self.events.lock().unwrap().insert(id, event.clone());
        debug!("Created event '{}' with id {}", event.title, id);
        Ok(())
    }

    async fn get_event_by_id(&self, id: Uuid) -> Result<Option<Event>> {
        Ok(self.events.lock().unwrap().get(&id).cloned())
    }

    async fn update_event(&self, event: &Event) -> Result<()> {
        let id = event.id.ok_or_else(|| missing_id("event"))?;
        self.events.lock().unwrap().insert(id, event.clone());
        Ok(())
    }

    async fn get_events_by_speaker(&self, speaker_id: Uuid) -> Result<Vec<Event>> {
        let events = self.events.lock().unwrap();
        let mut found: Vec<Event> = events
            .values()
            .filter(|e| e.speaker_id == speaker_id)
            .cloned()
            .collect();
        found.sort_by_key(|e| e.created_at);
        Ok(found)
    }

    async fn get_events_by_organizer(&self, email: &str) -> Result<Vec<Event>> {
        let events = self.events.lock().unwrap();
        let mut found: Vec<Event> = events
            .values()
            .filter(|e| e.organizer_email.eq_ignore_ascii_case(email))
            .cloned()
            .collect();
        found.sort_by_key(|e| e.created_at);
        Ok(found)
    }

    async fn create_conversation(&self, conversation: &mut Conversation) -> Result<()> {
        let id = Uuid::new_v4();
        conversation.id = Some(id);
        self.conversations
            .lock()
            .unwrap()
            .insert(id, conversation.clone());
        Ok(())
    }

    async fn get_conversation_by_id(&self, id: Uuid) -> Result<Option<Conversation>> {
        Ok(self.conversations.lock().unwrap().get(&id).cloned())
    }

    async fn update_conversation(&self, conversation: &Conversation) -> Result<()> {
        let id = conversation.id.ok_or_else(|| missing_id("conversation"))?;
        self.conversations
            .lock()
            .unwrap()
            .insert(id, conversation.clone());
        Ok(())
    }

    async fn find_conversation(
        &self,
        host_user_id: Uuid,
        speaker_user_id: Uuid,
        event_id: Option<Uuid>,
    ) -> Result<Option<Conversation>> {
        let conversations = self.conversations.lock().unwrap();
        Ok(conversations
            .values()
            .find(|c| {
                c.host_user_id == host_user_id
                    && c.speaker_user_id == speaker_user_id
                    && c.event_id == event_id
            })
            .cloned())
    }

    async fn get_conversations_for_user(&self, user_id: Uuid) -> Result<Vec<Conversation>> {
        let conversations = self.conversations.lock().unwrap();
        let mut found: Vec<Conversation> = conversations
            .values()
            .filter(|c| c.includes(user_id))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(found)
    }

    async fn create_message(&self, message: &mut Message) -> Result<()> {
        let id = Uuid::new_v4();
        message.id = Some(id);
        self.messages.lock().unwrap().insert(id, message.clone());
        Ok(())
    }

    async fn get_messages_by_conversation(&self, conversation_id: Uuid) -> Result<Vec<Message>> {
        let messages = self.messages.lock().unwrap();
        let mut found: Vec<Message> = messages
            .values()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect();
        found.sort_by_key(|m| m.created_at);
        Ok(found)
    }

    async fn mark_messages_read(&self, conversation_id: Uuid, recipient_id: Uuid) -> Result<()> {
        let mut messages = self.messages.lock().unwrap();
        for message in messages.values_mut() {
            if message.conversation_id == conversation_id
                && message.recipient_id == recipient_id
                && !message.read
            {
                message.read = true;
            }
        }
        Ok(())
    }

    async fn create_payment(&self, payment: &mut Payment) -> Result<()> {
        let id = Uuid::new_v4();
        payment.id = Some(id);
        self.payments.lock().unwrap().insert(id, payment.clone());
        Ok(())
    }

    async fn get_payment_by_id(&self, id: Uuid) -> Result<Option<Payment>> {
        Ok(self.payments.lock().unwrap().get(&id).cloned())
    }

    async fn get_payment_by_event(&self, event_id: Uuid) -> Result<Option<Payment>> {
        let payments = self.payments.lock().unwrap();
        Ok(payments.values().find(|p| p.event_id == event_id).cloned())
    }

    async fn update_payment(&self, payment: &Payment) -> Result<()> {
        let id = payment.id.ok_or_else(|| missing_id("payment"))?;
        self.payments.lock().unwrap().insert(id, payment.clone());
        Ok(())
    }

    async fn create_rating(&self, rating: &mut EventRating) -> Result<()> {
        let id = Uuid::new_v4();
        rating.id = Some(id);
        self.ratings.lock().unwrap().insert(id, rating.clone());
        Ok(())
    }

    async fn get_rating_by_event(&self, event_id: Uuid) -> Result<Option<EventRating>> {
        let ratings = self.ratings.lock().unwrap();
        Ok(ratings.values().find(|r| r.event_id == event_id).cloned())
    }

    async fn get_ratings_by_speaker(&self, speaker_id: Uuid) -> Result<Vec<EventRating>> {
        let ratings = self.ratings.lock().unwrap();
        let mut found: Vec<EventRating> = ratings
            .values()
            .filter(|r| r.speaker_id == speaker_id)
            .cloned()
            .collect();
        found.sort_by_key(|r| r.created_at);
        Ok(found)
    }

    async fn upsert_availability(&self, slot: &mut SpeakerAvailability) -> Result<()> {
        let mut table = self.availability.lock().unwrap();
        let existing = table
            .values()
            .find(|s| s.speaker_id == slot.speaker_id && s.date == slot.date)
            .and_then(|s| s.id);
        let id = existing.unwrap_or_else(Uuid::new_v4);
        slot.id = Some(id);
        table.insert(id, slot.clone());
        Ok(())
    }

    async fn get_availability(
        &self,
        speaker_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<SpeakerAvailability>> {
        let table = self.availability.lock().unwrap();
        let mut found: Vec<SpeakerAvailability> = table
            .values()
            .filter(|s| s.speaker_id == speaker_id && s.date >= start && s.date <= end)
            .cloned()
            .collect();
        found.sort_by_key(|s| s.date);
        Ok(found)
    }

    async fn create_contact_submission(&self, submission: &mut ContactSubmission) -> Result<()> {
        let id = Uuid::new_v4();
        submission.id = Some(id);
        self.contacts.lock().unwrap().insert(id, submission.clone());
        Ok(())
    }

    async fn upsert_state(&self, state: &State) -> Result<()> {
        self.states.lock().unwrap().insert(state.id, state.clone());
        Ok(())
    }

    async fn upsert_district(&self, district: &District) -> Result<()> {
        self.districts
            .lock()
            .unwrap()
            .insert(district.id, district.clone());
        Ok(())
    }

    async fn upsert_mandal(&self, mandal: &Mandal) -> Result<()> {
        self.mandals
            .lock()
            .unwrap()
            .insert(mandal.id, mandal.clone());
        Ok(())
    }

    async fn upsert_gram_panchayat(&self, gp: &GramPanchayat) -> Result<()> {
        self.gram_panchayats
            .lock()
            .unwrap()
            .insert(gp.id, gp.clone());
        Ok(())
    }

    async fn get_states(&self) -> Result<Vec<State>> {
        Ok(self.states.lock().unwrap().values().cloned().collect())
    }

    async fn get_districts(&self, state_id: u32) -> Result<Vec<District>> {
        let districts = self.districts.lock().unwrap();
        Ok(districts
            .values()
            .filter(|d| d.state_id == state_id)
            .cloned()
            .collect())
    }

    async fn get_mandals(&self, district_id: u32) -> Result<Vec<Mandal>> {
        let mandals = self.mandals.lock().unwrap();
        Ok(mandals
            .values()
            .filter(|m| m.district_id == district_id)
            .cloned()
            .collect())
    }

    async fn get_gram_panchayats(&self, mandal_id: u32) -> Result<Vec<GramPanchayat>> {
        let gps = self.gram_panchayats.lock().unwrap();
        Ok(gps
            .values()
            .filter(|g| g.mandal_id == mandal_id)
            .cloned()
            .collect())
    }

    async fn create_fellow_signup(&self, signup: &mut FellowSignup) -> Result<()> {
        let mut table = self.fellow_signups.lock().unwrap();
        let id = Uuid::new_v4();
        signup.id = Some(id);
        signup.unique_number =
            FellowSignup::unique_number_for(Utc::now().year(), table.len() + 1);
        table.insert(id, signup.clone());
        Ok(())
    }

    async fn get_fellow_by_mobile(&self, mobile: &str) -> Result<Option<FellowSignup>> {
        let signups = self.fellow_signups.lock().unwrap();
        Ok(signups
            .values()
            .find(|f| f.mobile_number == mobile)
            .cloned())
    }

    async fn find_fellow(&self, mobile: &str, full_name: &str) -> Result<Option<FellowSignup>> {
        let signups = self.fellow_signups.lock().unwrap();
        Ok(signups
            .values()
            .find(|f| f.mobile_number == mobile && f.full_name == full_name)
            .cloned())
    }

    async fn upsert_fellow_registration(
        &self,
        registration: &mut FellowRegistration,
    ) -> Result<()> {
        let mut table = self.fellow_registrations.lock().unwrap();
        if let Some(existing) = table.get(&registration.mobile_number) {
            registration.id = existing.id;
        } else {
            registration.id = Some(Uuid::new_v4());
        }
        table.insert(registration.mobile_number.clone(), registration.clone());
        Ok(())
    }

    async fn get_fellow_registration(&self, mobile: &str) -> Result<Option<FellowRegistration>> {
        Ok(self
            .fellow_registrations
            .lock()
            .unwrap()
            .get(mobile)
            .cloned())
    }

    async fn upsert_task_details(&self, details: &mut TaskDetails) -> Result<()> {
        let mut table = self.task_details.lock().unwrap();
        if let Some(existing) = table.get(&details.mobile_number) {
            details.id = existing.id;
        } else {
            details.id = Some(Uuid::new_v4());
        }
        table.insert(details.mobile_number.clone(), details.clone());
        Ok(())
    }

    async fn get_task_details(&self, mobile: &str) -> Result<Option<TaskDetails>> {
        Ok(self.task_details.lock().unwrap().get(mobile).cloned())
    }

    async fn create_testimonial(&self, testimonial: &mut FellowTestimonial) -> Result<()> {
        let id = Uuid::new_v4();
        testimonial.id = Some(id);
        self.testimonials
            .lock()
            .unwrap()
            .insert(id, testimonial.clone());
        Ok(())
    }

    async fn get_testimonials(&self, mobile: &str) -> Result<Vec<FellowTestimonial>> {
        let testimonials = self.testimonials.lock().unwrap();
        let mut found: Vec<FellowTestimonial> = testimonials
            .values()
            .filter(|t| t.mobile_number == mobile)
            .cloned()
            .collect();
        found.sort_by_key(|t| t.created_at);
        Ok(found)
    }

    async fn create_attendance(&self, record: &mut AttendanceRecord) -> Result<()> {
        let id = Uuid::new_v4();
        record.id = Some(id);
        self.attendance.lock().unwrap().insert(id, record.clone());
        Ok(())
    }

    async fn get_attendance(&self, mobile: &str) -> Result<Vec<AttendanceRecord>> {
        let attendance = self.attendance.lock().unwrap();
        let mut found: Vec<AttendanceRecord> = attendance
            .values()
            .filter(|a| a.mobile_number == mobile)
            .cloned()
            .collect();
        found.sort_by_key(|a| a.date);
        Ok(found)
    }
}
