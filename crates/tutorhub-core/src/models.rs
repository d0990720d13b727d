//! Domain models for TutorHub.
//!
//! These are the core types shared across all crates.

pub mod availability;
pub mod booking;
pub mod booking_draft;
pub mod booking_history;
pub mod booking_modification;
pub mod subject;
pub mod teacher;
pub mod teaching_session;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The user performing an operation, with request metadata recorded in
/// the booking history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl Actor {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            ip_address: None,
            user_agent: None,
        }
    }
}
