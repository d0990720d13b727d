//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Operations that guard a state
//! change return `Ok(None)` when the guard no longer holds (the row was
//! changed by someone else), leaving the caller to decide how to
//! report it.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::TutorResult;
use crate::models::Actor;
use crate::models::{
    availability::{Availability, AvailabilityWindow, CreateAvailability},
    booking::{Booking, BookingFilter, BookingReschedule, BookingTransition, CreateBooking},
    booking_draft::{BookingDraft, CreateBookingDraft, UpdateBookingDraft},
    booking_history::{BookingHistory, CreateBookingHistory},
    booking_modification::{BookingModification, CreateBookingModification, ResolveModification},
    subject::{CreateSubject, Subject},
    teacher::{CreateTeacherProfile, TeacherProfile, UpdateTeacherProfile},
    teaching_session::{TeachingSession, UpdateTeachingSession},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Teachers, subjects and availability
// ---------------------------------------------------------------------------

pub trait TeacherProfileRepository: Send + Sync {
    fn create(
        &self,
        input: CreateTeacherProfile,
    ) -> impl Future<Output = TutorResult<TeacherProfile>> + Send;
    fn get(&self, teacher_id: Uuid) -> impl Future<Output = TutorResult<TeacherProfile>> + Send;
    /// Like [`get`](Self::get) but a missing profile is `Ok(None)`.
    fn find(
        &self,
        teacher_id: Uuid,
    ) -> impl Future<Output = TutorResult<Option<TeacherProfile>>> + Send;
    fn update(
        &self,
        teacher_id: Uuid,
        input: UpdateTeacherProfile,
    ) -> impl Future<Output = TutorResult<TeacherProfile>> + Send;
}

pub trait SubjectRepository: Send + Sync {
    fn create(&self, input: CreateSubject) -> impl Future<Output = TutorResult<Subject>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = TutorResult<Subject>> + Send;
    /// Fetch several subjects; unknown ids are skipped.
    fn get_many(&self, ids: &[Uuid]) -> impl Future<Output = TutorResult<Vec<Subject>>> + Send;
}

pub trait AvailabilityRepository: Send + Sync {
    fn create(
        &self,
        input: CreateAvailability,
    ) -> impl Future<Output = TutorResult<Availability>> + Send;
    /// Replace the teacher's whole weekly set in one transaction.
    fn replace_for_teacher(
        &self,
        teacher_id: Uuid,
        time_zone: &str,
        windows: Vec<AvailabilityWindow>,
    ) -> impl Future<Output = TutorResult<Vec<Availability>>> + Send;
    /// Windows ordered by day, then start time.
    fn list_for_teacher(
        &self,
        teacher_id: Uuid,
    ) -> impl Future<Output = TutorResult<Vec<Availability>>> + Send;
    /// Fetch several windows; unknown ids are skipped.
    fn get_many(&self, ids: &[Uuid])
    -> impl Future<Output = TutorResult<Vec<Availability>>> + Send;
}

// ---------------------------------------------------------------------------
// Bookings and their dependents
// ---------------------------------------------------------------------------

pub trait BookingRepository: Send + Sync {
    /// Insert all bookings (status `Pending`) together with a `created`
    /// history entry each, atomically.
    fn create_many(
        &self,
        inputs: Vec<CreateBooking>,
        actor: &Actor,
    ) -> impl Future<Output = TutorResult<Vec<Booking>>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = TutorResult<Booking>> + Send;
    fn list_for_teacher(
        &self,
        teacher_id: Uuid,
        filter: BookingFilter,
        pagination: Pagination,
    ) -> impl Future<Output = TutorResult<PaginatedResult<Booking>>> + Send;
    fn list_for_student(
        &self,
        student_id: Uuid,
        filter: BookingFilter,
        pagination: Pagination,
    ) -> impl Future<Output = TutorResult<PaginatedResult<Booking>>> + Send;
    /// Pending bookings dated on or after `from`, across all teachers.
    fn list_pending_from(
        &self,
        from: NaiveDate,
    ) -> impl Future<Output = TutorResult<Vec<Booking>>> + Send;
    /// Apply a status change if the stored version still equals
    /// `current.version`, then write the session effect and history.
    fn transition(
        &self,
        current: &Booking,
        transition: BookingTransition,
    ) -> impl Future<Output = TutorResult<Option<Booking>>> + Send;
    /// Move the booking (and its session) if the stored version still
    /// equals `current.version`, then write the history entry.
    fn reschedule(
        &self,
        current: &Booking,
        reschedule: BookingReschedule,
    ) -> impl Future<Output = TutorResult<Option<Booking>>> + Send;
}

/// Append-only: no update or delete operations exist.
pub trait BookingHistoryRepository: Send + Sync {
    fn append(
        &self,
        input: CreateBookingHistory,
    ) -> impl Future<Output = TutorResult<BookingHistory>> + Send;
    /// Entries oldest first.
    fn list_for_booking(
        &self,
        booking_id: Uuid,
    ) -> impl Future<Output = TutorResult<Vec<BookingHistory>>> + Send;
}

pub trait TeachingSessionRepository: Send + Sync {
    fn get_by_booking(
        &self,
        booking_id: Uuid,
    ) -> impl Future<Output = TutorResult<Option<TeachingSession>>> + Send;
    fn update_details(
        &self,
        booking_id: Uuid,
        input: UpdateTeachingSession,
    ) -> impl Future<Output = TutorResult<TeachingSession>> + Send;
}

pub trait BookingModificationRepository: Send + Sync {
    /// Store a new `Pending` request. `Ok(None)` when the booking already
    /// has a pending request.
    fn create(
        &self,
        input: CreateBookingModification,
    ) -> impl Future<Output = TutorResult<Option<BookingModification>>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = TutorResult<BookingModification>> + Send;
    fn list_for_booking(
        &self,
        booking_id: Uuid,
    ) -> impl Future<Output = TutorResult<Vec<BookingModification>>> + Send;
    fn find_pending_for_booking(
        &self,
        booking_id: Uuid,
    ) -> impl Future<Output = TutorResult<Option<BookingModification>>> + Send;
    /// Answer a request that is still `Pending`.
    fn resolve(
        &self,
        id: Uuid,
        input: ResolveModification,
    ) -> impl Future<Output = TutorResult<Option<BookingModification>>> + Send;
    /// Put an `Approved` request back to `Pending` (used when applying
    /// it failed).
    fn reopen(&self, id: Uuid)
    -> impl Future<Output = TutorResult<Option<BookingModification>>> + Send;
    fn set_resulting_booking(
        &self,
        id: Uuid,
        booking_id: Uuid,
    ) -> impl Future<Output = TutorResult<BookingModification>> + Send;
}

pub trait BookingDraftRepository: Send + Sync {
    fn create(
        &self,
        input: CreateBookingDraft,
    ) -> impl Future<Output = TutorResult<BookingDraft>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = TutorResult<BookingDraft>> + Send;
    /// Apply `input` if the stored version equals `expected_version`.
    fn update(
        &self,
        id: Uuid,
        expected_version: u64,
        input: UpdateBookingDraft,
    ) -> impl Future<Output = TutorResult<Option<BookingDraft>>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = TutorResult<()>> + Send;
    /// Remove drafts that expired before `now`. Returns the number removed.
    fn delete_expired(&self, now: DateTime<Utc>) -> impl Future<Output = TutorResult<u64>> + Send;
}

// ---------------------------------------------------------------------------
// Bundle
// ---------------------------------------------------------------------------

/// Access to every repository the booking workflows need, so services
/// can stay generic over one storage backend.
pub trait Repositories: Send + Sync {
    type Profiles: TeacherProfileRepository;
    type Subjects: SubjectRepository;
    type Availability: AvailabilityRepository;
    type Bookings: BookingRepository;
    type History: BookingHistoryRepository;
    type Sessions: TeachingSessionRepository;
    type Modifications: BookingModificationRepository;
    type Drafts: BookingDraftRepository;

    fn profiles(&self) -> &Self::Profiles;
    fn subjects(&self) -> &Self::Subjects;
    fn availability(&self) -> &Self::Availability;
    fn bookings(&self) -> &Self::Bookings;
    fn history(&self) -> &Self::History;
    fn sessions(&self) -> &Self::Sessions;
    fn modifications(&self) -> &Self::Modifications;
    fn drafts(&self) -> &Self::Drafts;
}
