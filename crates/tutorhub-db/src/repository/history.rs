//! SurrealDB implementation of [`BookingHistoryRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tutorhub_core::error::TutorResult;
use tutorhub_core::models::booking_history::{BookingHistory, CreateBookingHistory, HistoryAction};
use tutorhub_core::repository::BookingHistoryRepository;
use uuid::Uuid;

use crate::error::DbError;
use crate::row::{corrupt, parse_uuid};

#[derive(Debug, SurrealValue)]
struct HistoryRow {
    record_id: String,
    booking_id: String,
    action: String,
    previous_data: Option<serde_json::Value>,
    new_data: Option<serde_json::Value>,
    performed_by_id: String,
    notes: Option<String>,
    ip_address: Option<String>,
    user_agent: Option<String>,
    created_at: DateTime<Utc>,
}

impl HistoryRow {
    fn try_into_history(self) -> Result<BookingHistory, DbError> {
        let action = HistoryAction::parse(&self.action).ok_or_else(|| {
            corrupt("booking_history", format!("unknown action: {}", self.action))
        })?;
        Ok(BookingHistory {
            id: parse_uuid("booking_history", &self.record_id)?,
            booking_id: parse_uuid("booking_history", &self.booking_id)?,
            action,
            previous_data: self.previous_data,
            new_data: self.new_data,
            performed_by_id: parse_uuid("booking_history", &self.performed_by_id)?,
            notes: self.notes,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            created_at: self.created_at,
        })
    }
}

/// Content of a history entry. `id` becomes the record key.
#[derive(Debug, SurrealValue)]
pub(crate) struct NewHistoryRow {
    pub id: String,
    booking_id: String,
    action: String,
    previous_data: Option<serde_json::Value>,
    new_data: Option<serde_json::Value>,
    performed_by_id: String,
    notes: Option<String>,
    ip_address: Option<String>,
    user_agent: Option<String>,
}

impl From<CreateBookingHistory> for NewHistoryRow {
    fn from(input: CreateBookingHistory) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            booking_id: input.booking_id.to_string(),
            action: input.action.as_str().to_string(),
            previous_data: input.previous_data,
            new_data: input.new_data,
            performed_by_id: input.performed_by_id.to_string(),
            notes: input.notes,
            ip_address: input.ip_address,
            user_agent: input.user_agent,
        }
    }
}

/// SurrealDB implementation of the booking history repository.
#[derive(Clone)]
pub struct SurrealBookingHistoryRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealBookingHistoryRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> BookingHistoryRepository for SurrealBookingHistoryRepository<C> {
    async fn append(&self, input: CreateBookingHistory) -> TutorResult<BookingHistory> {
        let row = NewHistoryRow::from(input);
        let id_str = row.id.clone();

        let mut result = self
            .db
            .query(
                "INSERT INTO booking_history $row; \
                 SELECT meta::id(id) AS record_id, * \
                 FROM type::record('booking_history', $id);",
            )
            .bind(("row", row))
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<HistoryRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "booking_history".into(),
            id: id_str,
        })?;

        Ok(row.try_into_history()?)
    }

    async fn list_for_booking(&self, booking_id: Uuid) -> TutorResult<Vec<BookingHistory>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM booking_history \
                 WHERE booking_id = $booking_id \
                 ORDER BY created_at ASC",
            )
            .bind(("booking_id", booking_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<HistoryRow> = result.take(0).map_err(DbError::from)?;
        let entries = rows
            .into_iter()
            .map(HistoryRow::try_into_history)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(entries)
    }
}
