//! SurrealDB implementation of [`BookingModificationRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tutorhub_core::error::TutorResult;
use tutorhub_core::models::booking_modification::{
    BookingModification, CreateBookingModification, ModificationKind, ModificationStatus,
    ResolveModification,
};
use tutorhub_core::repository::BookingModificationRepository;
use uuid::Uuid;

use crate::error::DbError;
use crate::row::{
    corrupt, format_date, format_time, parse_date, parse_opt_uuid, parse_time, parse_uuid,
};

const ENTITY: &str = "booking_modification";

/// Unique index over `pending_guard`: the booking id while a request is
/// `Pending`, the request's own id otherwise.
const PENDING_INDEX: &str = "idx_booking_modification_pending";

/// Projection used to count rows touched by a conditional update.
#[derive(Debug, SurrealValue)]
struct StatusRow {
    #[allow(dead_code)]
    status: String,
}

#[derive(Debug, SurrealValue)]
struct ModificationRow {
    record_id: String,
    booking_id: String,
    requested_by_id: String,
    kind: String,
    proposed_date: String,
    proposed_start_time: String,
    proposed_end_time: String,
    reason: Option<String>,
    status: String,
    responded_by_id: Option<String>,
    response_note: Option<String>,
    responded_at: Option<DateTime<Utc>>,
    resulting_booking_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ModificationRow {
    fn try_into_modification(self) -> Result<BookingModification, DbError> {
        let kind = ModificationKind::parse(&self.kind)
            .ok_or_else(|| corrupt(ENTITY, format!("unknown kind: {}", self.kind)))?;
        let status = ModificationStatus::parse(&self.status)
            .ok_or_else(|| corrupt(ENTITY, format!("unknown status: {}", self.status)))?;
        Ok(BookingModification {
            id: parse_uuid(ENTITY, &self.record_id)?,
            booking_id: parse_uuid(ENTITY, &self.booking_id)?,
            requested_by_id: parse_uuid(ENTITY, &self.requested_by_id)?,
            kind,
            proposed_date: parse_date(ENTITY, &self.proposed_date)?,
            proposed_start_time: parse_time(ENTITY, &self.proposed_start_time)?,
            proposed_end_time: parse_time(ENTITY, &self.proposed_end_time)?,
            reason: self.reason,
            status,
            responded_by_id: parse_opt_uuid(ENTITY, self.responded_by_id)?,
            response_note: self.response_note,
            responded_at: self.responded_at,
            resulting_booking_id: parse_opt_uuid(ENTITY, self.resulting_booking_id)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the modification request repository.
#[derive(Clone)]
pub struct SurrealBookingModificationRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealBookingModificationRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn select_where(
        &self,
        condition: &str,
        booking_id: Uuid,
    ) -> TutorResult<Vec<BookingModification>> {
        let mut result = self
            .db
            .query(format!(
                "SELECT meta::id(id) AS record_id, * FROM booking_modification \
                 WHERE {condition} ORDER BY created_at ASC"
            ))
            .bind(("booking_id", booking_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ModificationRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(ModificationRow::try_into_modification)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(items)
    }

    /// Conditional status change; `Ok(None)` when the row is not in
    /// `from` any more.
    async fn move_status(
        &self,
        id: Uuid,
        from: ModificationStatus,
        sets: &str,
        binds: Vec<(&'static str, Option<String>)>,
    ) -> TutorResult<Option<BookingModification>> {
        let mut builder = self
            .db
            .query(format!(
                "UPDATE type::record('booking_modification', $id) SET {sets}, \
                 updated_at = time::now() WHERE status = $from"
            ))
            .bind(("id", id.to_string()))
            .bind(("from", from.as_str().to_string()));
        for bind in binds {
            builder = builder.bind(bind);
        }

        let mut result = builder
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let touched: Vec<StatusRow> = result.take(0).map_err(DbError::from)?;
        if touched.is_empty() {
            return Ok(None);
        }

        self.get_by_id(id).await.map(Some)
    }
}

impl<C: Connection> BookingModificationRepository for SurrealBookingModificationRepository<C> {
    async fn create(
        &self,
        input: CreateBookingModification,
    ) -> TutorResult<Option<BookingModification>> {
        let id = Uuid::new_v4();
        let booking_id = input.booking_id;

        let outcome = self
            .db
            .query(
                "CREATE type::record('booking_modification', $id) SET \
                 booking_id = $booking_id, \
                 requested_by_id = $requested_by_id, \
                 kind = $kind, \
                 proposed_date = $proposed_date, \
                 proposed_start_time = $proposed_start_time, \
                 proposed_end_time = $proposed_end_time, \
                 reason = $reason, \
                 status = 'Pending', \
                 pending_guard = $booking_id",
            )
            .bind(("id", id.to_string()))
            .bind(("booking_id", input.booking_id.to_string()))
            .bind(("requested_by_id", input.requested_by_id.to_string()))
            .bind(("kind", input.kind.as_str().to_string()))
            .bind(("proposed_date", format_date(input.proposed.date)))
            .bind(("proposed_start_time", format_time(input.proposed.start_time)))
            .bind(("proposed_end_time", format_time(input.proposed.end_time)))
            .bind(("reason", input.reason))
            .await
            .and_then(|response| response.check());

        if let Err(e) = outcome {
            if e.to_string().contains(PENDING_INDEX)
                || self.find_pending_for_booking(booking_id).await?.is_some()
            {
                return Ok(None);
            }
            return Err(DbError::Query(e.to_string()).into());
        }

        self.get_by_id(id).await.map(Some)
    }

    async fn get_by_id(&self, id: Uuid) -> TutorResult<BookingModification> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM type::record('booking_modification', $id)",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ModificationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: ENTITY.into(),
            id: id_str,
        })?;

        Ok(row.try_into_modification()?)
    }

    async fn list_for_booking(&self, booking_id: Uuid) -> TutorResult<Vec<BookingModification>> {
        self.select_where("booking_id = $booking_id", booking_id)
            .await
    }

    async fn find_pending_for_booking(
        &self,
        booking_id: Uuid,
    ) -> TutorResult<Option<BookingModification>> {
        let pending = self
            .select_where("booking_id = $booking_id AND status = 'Pending'", booking_id)
            .await?;
        Ok(pending.into_iter().next())
    }

    async fn resolve(
        &self,
        id: Uuid,
        input: ResolveModification,
    ) -> TutorResult<Option<BookingModification>> {
        self.move_status(
            id,
            ModificationStatus::Pending,
            "status = $status, responded_by_id = $responded_by_id, \
             response_note = $response_note, responded_at = time::now(), \
             pending_guard = $id",
            vec![
                ("status", Some(input.status.as_str().to_string())),
                ("responded_by_id", Some(input.responded_by_id.to_string())),
                ("response_note", input.response_note),
            ],
        )
        .await
    }

    async fn reopen(&self, id: Uuid) -> TutorResult<Option<BookingModification>> {
        self.move_status(
            id,
            ModificationStatus::Approved,
            "status = 'Pending', responded_by_id = NONE, \
             response_note = NONE, responded_at = NONE, \
             pending_guard = booking_id",
            Vec::new(),
        )
        .await
    }

    async fn set_resulting_booking(
        &self,
        id: Uuid,
        booking_id: Uuid,
    ) -> TutorResult<BookingModification> {
        self.db
            .query(
                "UPDATE type::record('booking_modification', $id) SET \
                 resulting_booking_id = $booking_id, updated_at = time::now()",
            )
            .bind(("id", id.to_string()))
            .bind(("booking_id", booking_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        self.get_by_id(id).await
    }
}
