use crate::common::error::Result;
use crate::domain::*;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

/// Storage trait for all platform data. Create operations take `&mut` and
/// assign the row id; location upserts are keyed on the CSV ids instead.
#[async_trait]
pub trait Storage: Send + Sync {
    // User operations
    async fn create_user(&self, user: &mut User) -> Result<()>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>>;
    async fn update_user(&self, user: &User) -> Result<()>;

    // Pending user operations (one row per email)
    async fn upsert_pending_user(&self, pending: &mut PendingUser) -> Result<()>;
    async fn get_pending_user(&self, email: &str) -> Result<Option<PendingUser>>;
    async fn delete_pending_user(&self, email: &str) -> Result<()>;

    // OTP operations
    async fn create_otp(&self, otp: &mut OtpVerification) -> Result<()>;
    /// The most recently issued unverified code for (email, purpose). Older
    /// unverified rows are superseded and never consulted.
    async fn get_unverified_otp(
        &self,
        email: &str,
        purpose: OtpPurpose,
    ) -> Result<Option<OtpVerification>>;
    async fn update_otp(&self, otp: &OtpVerification) -> Result<()>;
    /// Delete OTP rows for an email; `purpose: None` clears every purpose.
    async fn delete_otps(&self, email: &str, purpose: Option<OtpPurpose>) -> Result<()>;
    async fn count_otps_since(
        &self,
        email: &str,
        purpose: OtpPurpose,
        since: DateTime<Utc>,
    ) -> Result<usize>;

    // Host operations
    async fn create_host(&self, host: &mut Host) -> Result<()>;
    async fn get_host_by_id(&self, id: Uuid) -> Result<Option<Host>>;
    async fn get_host_by_user(&self, user_id: Uuid) -> Result<Option<Host>>;
    async fn update_host(&self, host: &Host) -> Result<()>;

    // Speaker operations
    async fn create_speaker(&self, speaker: &mut Speaker) -> Result<()>;
    async fn get_speaker_by_id(&self, id: Uuid) -> Result<Option<Speaker>>;
    async fn get_speaker_by_user(&self, user_id: Uuid) -> Result<Option<Speaker>>;
    async fn update_speaker(&self, speaker: &Speaker) -> Result<()>;
    async fn get_all_speakers(&self) -> Result<Vec<Speaker>>;

    // Profile operations
    async fn create_user_profile(&self, profile: &mut UserProfile) -> Result<()>;
    async fn get_user_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>>;

    // Event operations
    async fn create_event(&self, event: &mut Event) -> Result<()>;
    async fn get_event_by_id(&self, id: Uuid) -> Result<Option<Event>>;
    async fn update_event(&self, event: &Event) -> Result<()>;
    async fn get_events_by_speaker(&self, speaker_id: Uuid) -> Result<Vec<Event>>;
    async fn get_events_by_organizer(&self, email: &str) -> Result<Vec<Event>>;

    // Conversation and message operations
    async fn create_conversation(&self, conversation: &mut Conversation) -> Result<()>;
    async fn get_conversation_by_id(&self, id: Uuid) -> Result<Option<Conversation>>;
    async fn update_conversation(&self, conversation: &Conversation) -> Result<()>;
    async fn find_conversation(
        &self,
        host_user_id: Uuid,
        speaker_user_id: Uuid,
        event_id: Option<Uuid>,
    ) -> Result<Option<Conversation>>;
    async fn get_conversations_for_user(&self, user_id: Uuid) -> Result<Vec<Conversation>>;
    async fn create_message(&self, message: &mut Message) -> Result<()>;
    async fn get_messages_by_conversation(&self, conversation_id: Uuid) -> Result<Vec<Message>>;
    async fn mark_messages_read(&self, conversation_id: Uuid, recipient_id: Uuid) -> Result<()>;

    // Payment operations
    async fn create_payment(&self, payment: &mut Payment) -> Result<()>;
    async fn get_payment_by_id(&self, id: Uuid) -> Result<Option<Payment>>;
    async fn get_payment_by_event(&self, event_id: Uuid) -> Result<Option<Payment>>;
    async fn update_payment(&self, payment: &Payment) -> Result<()>;

    // Rating operations
    async fn create_rating(&self, rating: &mut EventRating) -> Result<()>;
    async fn get_rating_by_event(&self, event_id: Uuid) -> Result<Option<EventRating>>;
    async fn get_ratings_by_speaker(&self, speaker_id: Uuid) -> Result<Vec<EventRating>>;

    // Availability operations (one row per speaker and day)
    async fn upsert_availability(&self, slot: &mut SpeakerAvailability) -> Result<()>;
    async fn get_availability(
        &self,
        speaker_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<SpeakerAvailability>>;

    // Contact form
    async fn create_contact_submission(&self, submission: &mut ContactSubmission) -> Result<()>;

    // Location reference data
    async fn upsert_state(&self, state: &State) -> Result<()>;
    async fn upsert_district(&self, district: &District) -> Result<()>;
    async fn upsert_mandal(&self, mandal: &Mandal) -> Result<()>;
    async fn upsert_gram_panchayat(&self, gp: &GramPanchayat) -> Result<()>;
    async fn get_states(&self) -> Result<Vec<State>>;
    async fn get_districts(&self, state_id: u32) -> Result<Vec<District>>;
    async fn get_mandals(&self, district_id: u32) -> Result<Vec<Mandal>>;
    async fn get_gram_panchayats(&self, mandal_id: u32) -> Result<Vec<GramPanchayat>>;

    // Fellowship operations (keyed by mobile number)
    /// Insert a signup, assigning its id and minting the unique number from
    /// the next sequence. Minting and insertion are a single step so
    /// concurrent signups never share a number.
    async fn create_fellow_signup(&self, signup: &mut FellowSignup) -> Result<()>;
    async fn get_fellow_by_mobile(&self, mobile: &str) -> Result<Option<FellowSignup>>;
    async fn find_fellow(&self, mobile: &str, full_name: &str) -> Result<Option<FellowSignup>>;
    async fn upsert_fellow_registration(&self, registration: &mut FellowRegistration)
        -> Result<()>;
    async fn get_fellow_registration(&self, mobile: &str) -> Result<Option<FellowRegistration>>;
    async fn upsert_task_details(&self, details: &mut TaskDetails) -> Result<()>;
    async fn get_task_details(&self, mobile: &str) -> Result<Option<TaskDetails>>;
    async fn create_testimonial(&self, testimonial: &mut FellowTestimonial) -> Result<()>;
    async fn get_testimonials(&self, mobile: &str) -> Result<Vec<FellowTestimonial>>;
    async fn create_attendance(&self, record: &mut AttendanceRecord) -> Result<()>;
    async fn get_attendance(&self, mobile: &str) -> Result<Vec<AttendanceRecord>>;
}
