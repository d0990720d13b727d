//! Teacher profile domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Currency {
    Ngn,
    Usd,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Ngn => "NGN",
            Currency::Usd => "USD",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "NGN" => Some(Currency::Ngn),
            "USD" => Some(Currency::Usd),
            _ => None,
        }
    }
}

/// Pricing and matching data for a teacher. Keyed by the teacher's
/// user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeacherProfile {
    pub teacher_id: Uuid,
    pub hourly_rate_ngn: Option<f64>,
    pub hourly_rate_usd: Option<f64>,
    pub preferred_currency: Currency,
    /// Suspends all new bookings regardless of configured availability.
    pub holiday_mode: bool,
    pub time_zone: String,
    pub subjects: Vec<String>,
    pub specializations: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTeacherProfile {
    pub teacher_id: Uuid,
    pub hourly_rate_ngn: Option<f64>,
    pub hourly_rate_usd: Option<f64>,
    pub preferred_currency: Currency,
    pub time_zone: String,
    pub subjects: Vec<String>,
    pub specializations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateTeacherProfile {
    /// `Some(Some(v))` = set, `Some(None)` = clear, `None` = no change.
    pub hourly_rate_ngn: Option<Option<f64>>,
    pub hourly_rate_usd: Option<Option<f64>>,
    pub preferred_currency: Option<Currency>,
    pub holiday_mode: Option<bool>,
    pub time_zone: Option<String>,
    pub subjects: Option<Vec<String>>,
    pub specializations: Option<Vec<String>>,
}
