//! SurrealDB implementation of [`BookingRepository`].
//!
//! Every write is conditional on the row's `version`. The conditional
//! update and the rows that depend on it (teaching session, history
//! entry) run in one transaction; a stale snapshot aborts it with
//! `STALE_BOOKING`.

use chrono::{DateTime, NaiveDate, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::{error, info};
use tutorhub_core::error::TutorResult;
use tutorhub_core::models::Actor;
use tutorhub_core::models::booking::{
    Booking, BookingFilter, BookingReschedule, BookingStatus, BookingTransition,
    CreateBooking, RateLock, SessionEffect,
};
use tutorhub_core::models::booking_history::{CreateBookingHistory, HistoryAction};
use tutorhub_core::models::teacher::Currency;
use tutorhub_core::repository::{BookingRepository, PaginatedResult, Pagination};
use uuid::Uuid;

use super::history::NewHistoryRow;
use super::session::NewSessionRow;
use crate::error::DbError;
use crate::row::{
    CountRow, corrupt, format_date, format_time, parse_date, parse_opt_uuid,
    parse_time, parse_uuid,
};

/// Thrown inside the write transaction when the snapshot is stale.
const STALE_BOOKING: &str = "stale booking snapshot";

/// Wrap a conditional booking `update` and the statements that depend
/// on it in one transaction that aborts when the update matched no row.
fn write_transaction(update: &str, dependents: &str) -> String {
    format!(
        "BEGIN TRANSACTION; \
         LET $updated = ({update}); \
         IF array::len($updated) = 0 {{ THROW '{STALE_BOOKING}'; }}; \
         {dependents} \
         INSERT INTO booking_history $history; \
         COMMIT TRANSACTION;"
    )
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct BookingRow {
    record_id: String,
    booking_uuid: String,
    student_id: String,
    teacher_id: String,
    subject_id: String,
    booking_date: String,
    start_time: String,
    end_time: String,
    duration_minutes: u32,
    status: String,
    hourly_rate_ngn: f64,
    hourly_rate_usd: f64,
    rate_currency: String,
    exchange_rate_used: f64,
    rate_locked_at: DateTime<Utc>,
    created_by_id: String,
    notes: Option<String>,
    approved_at: Option<DateTime<Utc>>,
    rejection_reason: Option<String>,
    rejected_at: Option<DateTime<Utc>>,
    cancelled_by_id: Option<String>,
    cancelled_at: Option<DateTime<Utc>>,
    cancellation_reason: Option<String>,
    completed_at: Option<DateTime<Utc>>,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BookingRow {
    fn try_into_booking(self) -> Result<Booking, DbError> {
        let status = BookingStatus::parse(&self.status)
            .ok_or_else(|| corrupt("booking", format!("unknown status: {}", self.status)))?;
        let rate_currency = Currency::parse(&self.rate_currency).ok_or_else(|| {
            corrupt("booking", format!("unknown currency: {}", self.rate_currency))
        })?;
        Ok(Booking {
            id: parse_uuid("booking", &self.record_id)?,
            booking_uuid: parse_uuid("booking", &self.booking_uuid)?,
            student_id: parse_uuid("booking", &self.student_id)?,
            teacher_id: parse_uuid("booking", &self.teacher_id)?,
            subject_id: parse_uuid("booking", &self.subject_id)?,
            booking_date: parse_date("booking", &self.booking_date)?,
            start_time: parse_time("booking", &self.start_time)?,
            end_time: parse_time("booking", &self.end_time)?,
            duration_minutes: self.duration_minutes,
            status,
            rate: RateLock {
                hourly_rate_ngn: self.hourly_rate_ngn,
                hourly_rate_usd: self.hourly_rate_usd,
                rate_currency,
                exchange_rate_used: self.exchange_rate_used,
                rate_locked_at: self.rate_locked_at,
            },
            created_by_id: parse_uuid("booking", &self.created_by_id)?,
            notes: self.notes,
            approved_at: self.approved_at,
            rejection_reason: self.rejection_reason,
            rejected_at: self.rejected_at,
            cancelled_by_id: parse_opt_uuid("booking", self.cancelled_by_id)?,
            cancelled_at: self.cancelled_at,
            cancellation_reason: self.cancellation_reason,
            completed_at: self.completed_at,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Content of a new booking. `id` becomes the record key.
#[derive(Debug, SurrealValue)]
struct NewBookingRow {
    id: String,
    booking_uuid: String,
    student_id: String,
    teacher_id: String,
    subject_id: String,
    booking_date: String,
    start_time: String,
    end_time: String,
    duration_minutes: u32,
    status: String,
    hourly_rate_ngn: f64,
    hourly_rate_usd: f64,
    rate_currency: String,
    exchange_rate_used: f64,
    rate_locked_at: DateTime<Utc>,
    created_by_id: String,
    notes: Option<String>,
}

impl NewBookingRow {
    fn new(id: Uuid, input: CreateBooking) -> Self {
        Self {
            id: id.to_string(),
            booking_uuid: Uuid::new_v4().to_string(),
            student_id: input.student_id.to_string(),
            teacher_id: input.teacher_id.to_string(),
            subject_id: input.subject_id.to_string(),
            booking_date: format_date(input.slot.date),
            start_time: format_time(input.slot.start_time),
            end_time: format_time(input.slot.end_time),
            duration_minutes: input.slot.duration_minutes,
            status: BookingStatus::Pending.as_str().to_string(),
            hourly_rate_ngn: input.rate.hourly_rate_ngn,
            hourly_rate_usd: input.rate.hourly_rate_usd,
            rate_currency: input.rate.rate_currency.as_str().to_string(),
            exchange_rate_used: input.rate.exchange_rate_used,
            rate_locked_at: input.rate.rate_locked_at,
            created_by_id: input.created_by_id.to_string(),
            notes: input.notes,
        }
    }
}

/// Which side of a list query the owner id refers to.
#[derive(Clone, Copy)]
enum Owner {
    Teacher,
    Student,
}

impl Owner {
    fn column(self) -> &'static str {
        match self {
            Owner::Teacher => "teacher_id",
            Owner::Student => "student_id",
        }
    }
}

/// SurrealDB implementation of the booking repository.
#[derive(Clone)]
pub struct SurrealBookingRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealBookingRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn list_owned(
        &self,
        owner: Owner,
        owner_id: Uuid,
        filter: BookingFilter,
        pagination: Pagination,
    ) -> TutorResult<PaginatedResult<Booking>> {
        let mut conditions = vec![format!("{} = $owner_id", owner.column())];
        if filter.status.is_some() {
            conditions.push("status = $status".into());
        }
        if filter.from_date.is_some() {
            conditions.push("booking_date >= $from_date".into());
        }
        let where_clause = conditions.join(" AND ");

        let status = filter.status.map(|s| s.as_str().to_string());
        let from_date = filter.from_date.map(format_date);

        let mut count_result = self
            .db
            .query(format!(
                "SELECT count() AS total FROM booking WHERE {where_clause} GROUP ALL"
            ))
            .bind(("owner_id", owner_id.to_string()))
            .bind(("status", status.clone()))
            .bind(("from_date", from_date.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(format!(
                "SELECT meta::id(id) AS record_id, * FROM booking \
                 WHERE {where_clause} \
                 ORDER BY booking_date ASC, start_time ASC \
                 LIMIT $limit START $offset"
            ))
            .bind(("owner_id", owner_id.to_string()))
            .bind(("status", status))
            .bind(("from_date", from_date))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<BookingRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(BookingRow::try_into_booking)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn get_many(&self, ids: &[String]) -> Result<Vec<Booking>, DbError> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM booking \
                 WHERE meta::id(id) IN $ids",
            )
            .bind(("ids", ids.to_vec()))
            .await?;

        let rows: Vec<BookingRow> = result.take(0)?;
        rows.into_iter().map(BookingRow::try_into_booking).collect()
    }

    /// Turn the outcome of a write transaction into the refreshed
    /// booking, `None` for a stale snapshot, or an error.
    async fn settle(
        &self,
        current: &Booking,
        outcome: Result<(), surrealdb::Error>,
    ) -> TutorResult<Option<Booking>> {
        if let Err(e) = outcome {
            if self.is_stale(current, &e).await? {
                return Ok(None);
            }
            error!(
                booking_id = %current.id,
                error = %e,
                "Booking write rolled back"
            );
            return Err(DbError::Query(e.to_string()).into());
        }

        self.get_by_id(current.id).await.map(Some)
    }

    /// Whether a failed write was refused because `current` is no longer
    /// the stored version.
    async fn is_stale(&self, current: &Booking, err: &surrealdb::Error) -> TutorResult<bool> {
        if err.to_string().contains(STALE_BOOKING) {
            return Ok(true);
        }
        let stored = self.get_by_id(current.id).await?;
        Ok(stored.version != current.version)
    }
}

impl<C: Connection> BookingRepository for SurrealBookingRepository<C> {
    async fn create_many(&self, inputs: Vec<CreateBooking>, actor: &Actor) -> TutorResult<Vec<Booking>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::with_capacity(inputs.len());
        let mut bookings = Vec::with_capacity(inputs.len());
        let mut history = Vec::with_capacity(inputs.len());
        for input in inputs {
            let id = Uuid::new_v4();
            history.push(NewHistoryRow::from(
                CreateBookingHistory::new(id, HistoryAction::Created, actor)
                    .with_notes(input.notes.clone()),
            ));
            bookings.push(NewBookingRow::new(id, input));
            ids.push(id.to_string());
        }

        self.db
            .query(
                "BEGIN TRANSACTION; \
                 INSERT INTO booking $bookings; \
                 INSERT INTO booking_history $history; \
                 COMMIT TRANSACTION;",
            )
            .bind(("bookings", bookings))
            .bind(("history", history))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let mut created = self.get_many(&ids).await?;
        created.sort_by_key(|b| ids.iter().position(|id| *id == b.id.to_string()));

        info!(
            count = created.len(),
            performed_by = %actor.id,
            "Bookings created"
        );

        Ok(created)
    }

    async fn get_by_id(&self, id: Uuid) -> TutorResult<Booking> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM type::record('booking', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<BookingRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "booking".into(),
            id: id_str,
        })?;

        Ok(row.try_into_booking()?)
    }

    async fn list_for_teacher(
        &self,
        teacher_id: Uuid,
        filter: BookingFilter,
        pagination: Pagination,
    ) -> TutorResult<PaginatedResult<Booking>> {
        self.list_owned(Owner::Teacher, teacher_id, filter, pagination)
            .await
    }

    async fn list_for_student(
        &self,
        student_id: Uuid,
        filter: BookingFilter,
        pagination: Pagination,
    ) -> TutorResult<PaginatedResult<Booking>> {
        self.list_owned(Owner::Student, student_id, filter, pagination)
            .await
    }

    async fn list_pending_from(&self, from: NaiveDate) -> TutorResult<Vec<Booking>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM booking \
                 WHERE status = 'Pending' AND booking_date >= $from \
                 ORDER BY booking_date ASC, start_time ASC",
            )
            .bind(("from", format_date(from)))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<BookingRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(BookingRow::try_into_booking)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(items)
    }

    async fn transition(
        &self,
        current: &Booking,
        transition: BookingTransition,
    ) -> TutorResult<Option<Booking>> {
        let mut sets = vec!["status = $status"];
        match transition.status {
            BookingStatus::Approved => sets.push("approved_at = time::now()"),
            BookingStatus::Rejected | BookingStatus::Declined => {
                sets.push("rejection_reason = $reason");
                sets.push("rejected_at = time::now()");
            }
            BookingStatus::Cancelled => {
                sets.push("cancelled_by_id = $actor_id");
                sets.push("cancelled_at = time::now()");
                sets.push("cancellation_reason = $reason");
            }
            BookingStatus::Completed => sets.push("completed_at = time::now()"),
            BookingStatus::Pending | BookingStatus::Confirmed => {}
        }
        sets.push("version += 1");
        sets.push("updated_at = time::now()");

        let update = format!(
            "UPDATE type::record('booking', $id) SET {} \
             WHERE version = $version AND status = $from",
            sets.join(", ")
        );
        let dependents = match &transition.session {
            SessionEffect::Create(_) => "INSERT IGNORE INTO teaching_session $new_session;",
            SessionEffect::SetStatus(_) => {
                "UPDATE teaching_session SET status = $session_status, \
                 updated_at = time::now() WHERE booking_id = $id;"
            }
            SessionEffect::None => "",
        };

        let mut builder = self
            .db
            .query(write_transaction(&update, dependents))
            .bind(("id", current.id.to_string()))
            .bind(("status", transition.status.as_str().to_string()))
            .bind(("reason", transition.reason.clone()))
            .bind(("actor_id", transition.actor_id.to_string()))
            .bind(("version", current.version))
            .bind(("from", current.status.as_str().to_string()))
            .bind(("history", NewHistoryRow::from(transition.history)));

        match transition.session {
            SessionEffect::Create(input) => {
                builder = builder.bind(("new_session", NewSessionRow::from(input)));
            }
            SessionEffect::SetStatus(status) => {
                builder = builder.bind(("session_status", status.as_str().to_string()));
            }
            SessionEffect::None => {}
        }

        let outcome = match builder.await {
            Ok(response) => response.check().map(|_| ()),
            Err(e) => Err(e),
        };
        self.settle(current, outcome).await
    }

    async fn reschedule(
        &self,
        current: &Booking,
        reschedule: BookingReschedule,
    ) -> TutorResult<Option<Booking>> {
        let schedule = reschedule.schedule;
        let query = write_transaction(
            "UPDATE type::record('booking', $id) SET \
             booking_date = $booking_date, \
             start_time = $start_time, \
             end_time = $end_time, \
             duration_minutes = $duration_minutes, \
             version += 1, \
             updated_at = time::now() \
             WHERE version = $version \
             AND status IN ['Pending', 'Approved', 'Confirmed']",
            "UPDATE teaching_session SET session_date = $booking_date, \
             start_time = $start_time, end_time = $end_time, \
             updated_at = time::now() WHERE booking_id = $id;",
        );

        let outcome = match self
            .db
            .query(query)
            .bind(("id", current.id.to_string()))
            .bind(("booking_date", format_date(schedule.date)))
            .bind(("start_time", format_time(schedule.start_time)))
            .bind(("end_time", format_time(schedule.end_time)))
            .bind(("duration_minutes", schedule.duration_minutes()))
            .bind(("version", current.version))
            .bind(("history", NewHistoryRow::from(reschedule.history)))
            .await
        {
            Ok(response) => response.check().map(|_| ()),
            Err(e) => Err(e),
        };
        self.settle(current, outcome).await
    }
}
