//! Booking domain model and status state machine.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::booking_history::CreateBookingHistory;
use super::teacher::Currency;
use super::teaching_session::{CreateTeachingSession, TeachingSessionStatus};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum BookingStatus {
    Pending,
    Approved,
    Confirmed,
    Declined,
    Rejected,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 7] = [
        BookingStatus::Pending,
        BookingStatus::Approved,
        BookingStatus::Confirmed,
        BookingStatus::Declined,
        BookingStatus::Rejected,
        BookingStatus::Cancelled,
        BookingStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "Pending",
            BookingStatus::Approved => "Approved",
            BookingStatus::Confirmed => "Confirmed",
            BookingStatus::Declined => "Declined",
            BookingStatus::Rejected => "Rejected",
            BookingStatus::Cancelled => "Cancelled",
            BookingStatus::Completed => "Completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    ///
    /// Reschedules keep the status and are governed by
    /// [`BookingStatus::is_reschedulable`] instead.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Pending, Approved)
                | (Pending, Rejected)
                | (Pending, Declined)
                | (Pending, Cancelled)
                | (Approved, Confirmed)
                | (Approved, Cancelled)
                | (Approved, Completed)
                | (Confirmed, Cancelled)
                | (Confirmed, Completed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Declined
                | BookingStatus::Rejected
                | BookingStatus::Cancelled
                | BookingStatus::Completed
        )
    }

    pub fn is_reschedulable(&self) -> bool {
        matches!(
            self,
            BookingStatus::Pending | BookingStatus::Approved | BookingStatus::Confirmed
        )
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_str().to_lowercase())
    }
}

/// Pricing frozen onto a booking at creation time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RateLock {
    pub hourly_rate_ngn: f64,
    pub hourly_rate_usd: f64,
    pub rate_currency: Currency,
    /// NGN per USD at the moment of locking.
    pub exchange_rate_used: f64,
    pub rate_locked_at: DateTime<Utc>,
}

impl RateLock {
    pub fn hourly_rate(&self) -> f64 {
        match self.rate_currency {
            Currency::Ngn => self.hourly_rate_ngn,
            Currency::Usd => self.hourly_rate_usd,
        }
    }
}

/// A concrete bookable time range produced by the slot resolver.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookingSlot {
    pub availability_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub duration_minutes: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    /// Public reference shown to guardians and teachers.
    pub booking_uuid: Uuid,
    pub student_id: Uuid,
    pub teacher_id: Uuid,
    pub subject_id: Uuid,
    pub booking_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub duration_minutes: u32,
    pub status: BookingStatus,
    pub rate: RateLock,
    pub created_by_id: Uuid,
    pub notes: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub cancelled_by_id: Option<Uuid>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Optimistic concurrency token, bumped on every write.
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Whether `user_id` is a party to this booking (student, creator or
    /// teacher).
    pub fn is_participant(&self, user_id: Uuid) -> bool {
        user_id == self.student_id || user_id == self.created_by_id || user_id == self.teacher_id
    }

    /// Whether `user_id` acts on the student's side of the booking.
    pub fn is_student_side(&self, user_id: Uuid) -> bool {
        user_id == self.student_id || user_id == self.created_by_id
    }

    /// Price of the whole session in the locked currency.
    pub fn locked_price(&self) -> f64 {
        self.rate.hourly_rate() * f64::from(self.duration_minutes) / 60.0
    }

    pub fn schedule(&self) -> BookingSchedule {
        BookingSchedule {
            date: self.booking_date,
            start_time: self.start_time,
            end_time: self.end_time,
        }
    }
}

/// Date and time range of a booking.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookingSchedule {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl BookingSchedule {
    pub fn duration_minutes(&self) -> u32 {
        (self.end_time - self.start_time).num_minutes().max(0) as u32
    }
}

impl std::fmt::Display for BookingSchedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}-{}",
            self.date.format("%Y-%m-%d"),
            self.start_time.format("%H:%M"),
            self.end_time.format("%H:%M")
        )
    }
}

/// Fields required to create a booking. Every booking starts `Pending`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBooking {
    pub student_id: Uuid,
    pub teacher_id: Uuid,
    pub subject_id: Uuid,
    pub slot: BookingSlot,
    pub rate: RateLock,
    pub created_by_id: Uuid,
    pub notes: Option<String>,
}

/// Effect of a transition on the booking's teaching session.
#[derive(Debug, Clone)]
pub enum SessionEffect {
    None,
    /// Insert the session unless one already exists for the booking.
    Create(CreateTeachingSession),
    SetStatus(TeachingSessionStatus),
}

/// A status change applied with a version check.
#[derive(Debug, Clone)]
pub struct BookingTransition {
    pub status: BookingStatus,
    pub actor_id: Uuid,
    pub reason: Option<String>,
    pub session: SessionEffect,
    pub history: CreateBookingHistory,
}

/// A date/time change applied with a version check. Status is kept.
#[derive(Debug, Clone)]
pub struct BookingReschedule {
    pub schedule: BookingSchedule,
    pub history: CreateBookingHistory,
}

/// Filter for booking list queries.
#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    pub from_date: Option<NaiveDate>,
}
