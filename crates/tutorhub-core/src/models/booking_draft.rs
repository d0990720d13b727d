//! Booking draft domain model.
//!
//! Holds the selections of the multi-step booking form between steps.
//! Every update is conditional on `version`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingDraft {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub student_id: Option<Uuid>,
    pub teacher_id: Option<Uuid>,
    pub subject_id: Option<Uuid>,
    pub dates: Vec<NaiveDate>,
    pub availability_ids: Vec<Uuid>,
    pub notes: Option<String>,
    pub version: u64,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BookingDraft {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookingDraft {
    pub owner_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Partial update of a draft. `None` leaves the field unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateBookingDraft {
    pub student_id: Option<Uuid>,
    pub teacher_id: Option<Uuid>,
    pub subject_id: Option<Uuid>,
    pub dates: Option<Vec<NaiveDate>>,
    pub availability_ids: Option<Vec<Uuid>>,
    pub notes: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}
