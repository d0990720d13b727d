//! Booking modification request domain model.
//!
//! Requests carry their own status so that a pending change never
//! races with the booking's lifecycle status.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::booking::BookingSchedule;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ModificationKind {
    /// Move the existing booking to a new date/time.
    Reschedule,
    /// Book the same teacher and subject again at a new date/time.
    Rebook,
}

impl ModificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModificationKind::Reschedule => "Reschedule",
            ModificationKind::Rebook => "Rebook",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Reschedule" => Some(ModificationKind::Reschedule),
            "Rebook" => Some(ModificationKind::Rebook),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ModificationStatus {
    Pending,
    Approved,
    Rejected,
    Withdrawn,
}

impl ModificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModificationStatus::Pending => "Pending",
            ModificationStatus::Approved => "Approved",
            ModificationStatus::Rejected => "Rejected",
            ModificationStatus::Withdrawn => "Withdrawn",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Pending" => Some(ModificationStatus::Pending),
            "Approved" => Some(ModificationStatus::Approved),
            "Rejected" => Some(ModificationStatus::Rejected),
            "Withdrawn" => Some(ModificationStatus::Withdrawn),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingModification {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub requested_by_id: Uuid,
    pub kind: ModificationKind,
    pub proposed_date: NaiveDate,
    pub proposed_start_time: NaiveTime,
    pub proposed_end_time: NaiveTime,
    pub reason: Option<String>,
    pub status: ModificationStatus,
    pub responded_by_id: Option<Uuid>,
    pub response_note: Option<String>,
    pub responded_at: Option<DateTime<Utc>>,
    /// Booking created when a rebook request is approved.
    pub resulting_booking_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BookingModification {
    pub fn proposed_schedule(&self) -> BookingSchedule {
        BookingSchedule {
            date: self.proposed_date,
            start_time: self.proposed_start_time,
            end_time: self.proposed_end_time,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookingModification {
    pub booking_id: Uuid,
    pub requested_by_id: Uuid,
    pub kind: ModificationKind,
    pub proposed: BookingSchedule,
    pub reason: Option<String>,
}

/// Outcome recorded when a pending request is answered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveModification {
    pub status: ModificationStatus,
    pub responded_by_id: Uuid,
    pub response_note: Option<String>,
}
