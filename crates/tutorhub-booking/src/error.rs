//! Booking workflow error types.

use chrono::NaiveDate;
use thiserror::Error;
use tutorhub_core::error::TutorError;
use tutorhub_core::models::booking::BookingStatus;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("at least one date and one availability window must be selected")]
    EmptySelection,

    #[error("teacher is currently unavailable for bookings")]
    TeacherUnavailable,

    #[error("availability window {0} does not exist, is inactive or belongs to another teacher")]
    UnknownAvailability(Uuid),

    #[error("no selected availability window falls on {0}")]
    NoMatchingWindow(NaiveDate),

    #[error("date {0} is in the past")]
    DateInPast(NaiveDate),

    #[error("new date must be after today")]
    DateNotInFuture,

    #[error("end time must be after start time")]
    InvalidTimeRange,

    #[error("start and end times must be whole minutes")]
    SubMinuteTime,

    #[error("subject is not offered")]
    InactiveSubject,

    #[error("teacher has no pricing profile")]
    MissingTeacherProfile,

    #[error("hourly rates cannot be negative")]
    NegativeRate,

    #[error("proposed time is outside the teacher's availability")]
    OutsideAvailability,

    #[error("invalid availability window: {0}")]
    InvalidWindow(String),

    #[error("invalid day schedule: {0}")]
    InvalidDaySchedule(String),

    #[error("rating must be between 1 and 5")]
    InvalidRating,

    #[error("booking cannot be {action} in current status ({status})")]
    InvalidStatus {
        action: &'static str,
        status: BookingStatus,
    },

    #[error("booking was changed by another request")]
    StaleBooking,

    #[error("only the booking's teacher may do this")]
    NotBookingTeacher,

    #[error("only the booking's student or creator may do this")]
    NotStudentSide,

    #[error("only a participant of the booking may do this")]
    NotParticipant,

    #[error("a modification request is already pending for this booking")]
    ModificationAlreadyPending,

    #[error("modification request is no longer pending")]
    ModificationNotPending,

    #[error("only the other party may answer this modification request")]
    NotCounterparty,

    #[error("only the requester may withdraw this modification request")]
    NotRequester,

    #[error("booking draft belongs to another user")]
    NotDraftOwner,

    #[error("booking draft has expired")]
    DraftExpired,

    #[error("booking draft is missing {0}")]
    DraftIncomplete(&'static str),

    #[error("booking draft was changed by another request")]
    StaleDraft,

    #[error("exchange rate unavailable: {0}")]
    ExchangeRate(String),
}

impl From<BookingError> for TutorError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::TeacherUnavailable => TutorError::TeacherUnavailable,
            BookingError::EmptySelection
            | BookingError::UnknownAvailability(_)
            | BookingError::NoMatchingWindow(_)
            | BookingError::DateInPast(_)
            | BookingError::DateNotInFuture
            | BookingError::InvalidTimeRange
            | BookingError::SubMinuteTime
            | BookingError::InactiveSubject
            | BookingError::MissingTeacherProfile
            | BookingError::NegativeRate
            | BookingError::OutsideAvailability
            | BookingError::InvalidWindow(_)
            | BookingError::InvalidDaySchedule(_)
            | BookingError::InvalidRating
            | BookingError::DraftExpired
            | BookingError::DraftIncomplete(_) => TutorError::validation(err.to_string()),
            BookingError::InvalidStatus { .. }
            | BookingError::StaleBooking
            | BookingError::ModificationAlreadyPending
            | BookingError::ModificationNotPending
            | BookingError::StaleDraft => TutorError::conflict(err.to_string()),
            BookingError::NotBookingTeacher
            | BookingError::NotStudentSide
            | BookingError::NotParticipant
            | BookingError::NotCounterparty
            | BookingError::NotRequester
            | BookingError::NotDraftOwner => TutorError::forbidden(err.to_string()),
            BookingError::ExchangeRate(msg) => TutorError::ExchangeRate(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_guard_maps_to_conflict() {
        let err: TutorError = BookingError::InvalidStatus {
            action: "approved",
            status: BookingStatus::Completed,
        }
        .into();
        assert!(matches!(err, TutorError::Conflict { .. }));
        assert!(err.to_string().contains("cannot be approved in current status"));
    }

    #[test]
    fn holiday_mode_keeps_its_own_variant() {
        let err: TutorError = BookingError::TeacherUnavailable.into();
        assert!(matches!(err, TutorError::TeacherUnavailable));
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn exchange_rate_failures_are_infrastructure() {
        let err: TutorError = BookingError::ExchangeRate("feed down".into()).into();
        assert_eq!(err.status_code(), 500);
    }
}
