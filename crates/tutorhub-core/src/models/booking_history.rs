//! Booking history domain model (append-only audit trail).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Actor;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum HistoryAction {
    Created,
    Approved,
    Rejected,
    Rescheduled,
    Cancelled,
    Confirmed,
    Completed,
}

impl HistoryAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryAction::Created => "created",
            HistoryAction::Approved => "approved",
            HistoryAction::Rejected => "rejected",
            HistoryAction::Rescheduled => "rescheduled",
            HistoryAction::Cancelled => "cancelled",
            HistoryAction::Confirmed => "confirmed",
            HistoryAction::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "created" => Some(HistoryAction::Created),
            "approved" => Some(HistoryAction::Approved),
            "rejected" => Some(HistoryAction::Rejected),
            "rescheduled" => Some(HistoryAction::Rescheduled),
            "cancelled" => Some(HistoryAction::Cancelled),
            "confirmed" => Some(HistoryAction::Confirmed),
            "completed" => Some(HistoryAction::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingHistory {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub action: HistoryAction,
    pub previous_data: Option<serde_json::Value>,
    pub new_data: Option<serde_json::Value>,
    pub performed_by_id: Uuid,
    pub notes: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookingHistory {
    pub booking_id: Uuid,
    pub action: HistoryAction,
    pub previous_data: Option<serde_json::Value>,
    pub new_data: Option<serde_json::Value>,
    pub performed_by_id: Uuid,
    pub notes: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl CreateBookingHistory {
    pub fn new(booking_id: Uuid, action: HistoryAction, actor: &Actor) -> Self {
        Self {
            booking_id,
            action,
            previous_data: None,
            new_data: None,
            performed_by_id: actor.id,
            notes: None,
            ip_address: actor.ip_address.clone(),
            user_agent: actor.user_agent.clone(),
        }
    }

    pub fn with_data(
        mut self,
        previous_data: Option<serde_json::Value>,
        new_data: Option<serde_json::Value>,
    ) -> Self {
        self.previous_data = previous_data;
        self.new_data = new_data;
        self
    }

    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }
}
