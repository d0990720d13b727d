//! Teaching session domain model.
//!
//! A session exists only for approved bookings and shares the
//! booking's id.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TeachingSessionStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl TeachingSessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeachingSessionStatus::Scheduled => "Scheduled",
            TeachingSessionStatus::Completed => "Completed",
            TeachingSessionStatus::Cancelled => "Cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Scheduled" => Some(TeachingSessionStatus::Scheduled),
            "Completed" => Some(TeachingSessionStatus::Completed),
            "Cancelled" => Some(TeachingSessionStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeachingSession {
    pub booking_id: Uuid,
    pub teacher_id: Uuid,
    pub student_id: Uuid,
    pub subject_id: Uuid,
    pub session_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: TeachingSessionStatus,
    pub meeting_link: Option<String>,
    pub teacher_notes: Option<String>,
    /// 1–5 stars left by the student.
    pub student_rating: Option<u8>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTeachingSession {
    pub booking_id: Uuid,
    pub teacher_id: Uuid,
    pub student_id: Uuid,
    pub subject_id: Uuid,
    pub session_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateTeachingSession {
    pub meeting_link: Option<String>,
    pub teacher_notes: Option<String>,
    pub student_rating: Option<u8>,
}
