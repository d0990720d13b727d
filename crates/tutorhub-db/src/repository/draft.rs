//! SurrealDB implementation of [`BookingDraftRepository`].

use chrono::{DateTime, NaiveDate, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;
use tutorhub_core::error::TutorResult;
use tutorhub_core::models::booking_draft::{BookingDraft, CreateBookingDraft, UpdateBookingDraft};
use tutorhub_core::repository::BookingDraftRepository;
use uuid::Uuid;

use crate::error::DbError;
use crate::row::{CountRow, VersionRow, format_date, parse_date, parse_opt_uuid, parse_uuid};

const ENTITY: &str = "booking_draft";

#[derive(Debug, SurrealValue)]
struct DraftRow {
    record_id: String,
    owner_id: String,
    student_id: Option<String>,
    teacher_id: Option<String>,
    subject_id: Option<String>,
    dates: Vec<String>,
    availability_ids: Vec<String>,
    notes: Option<String>,
    version: u64,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl DraftRow {
    fn try_into_draft(self) -> Result<BookingDraft, DbError> {
        let dates = self
            .dates
            .iter()
            .map(|d| parse_date(ENTITY, d))
            .collect::<Result<Vec<NaiveDate>, _>>()?;
        let availability_ids = self
            .availability_ids
            .iter()
            .map(|id| parse_uuid(ENTITY, id))
            .collect::<Result<Vec<Uuid>, _>>()?;
        Ok(BookingDraft {
            id: parse_uuid(ENTITY, &self.record_id)?,
            owner_id: parse_uuid(ENTITY, &self.owner_id)?,
            student_id: parse_opt_uuid(ENTITY, self.student_id)?,
            teacher_id: parse_opt_uuid(ENTITY, self.teacher_id)?,
            subject_id: parse_opt_uuid(ENTITY, self.subject_id)?,
            dates,
            availability_ids,
            notes: self.notes,
            version: self.version,
            expires_at: self.expires_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the booking draft repository.
#[derive(Clone)]
pub struct SurrealBookingDraftRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealBookingDraftRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> BookingDraftRepository for SurrealBookingDraftRepository<C> {
    async fn create(&self, input: CreateBookingDraft) -> TutorResult<BookingDraft> {
        let id = Uuid::new_v4();

        self.db
            .query(
                "CREATE type::record('booking_draft', $id) SET \
                 owner_id = $owner_id, \
                 expires_at = $expires_at",
            )
            .bind(("id", id.to_string()))
            .bind(("owner_id", input.owner_id.to_string()))
            .bind(("expires_at", input.expires_at))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        self.get_by_id(id).await
    }

    async fn get_by_id(&self, id: Uuid) -> TutorResult<BookingDraft> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM type::record('booking_draft', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DraftRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: ENTITY.into(),
            id: id_str,
        })?;

        Ok(row.try_into_draft()?)
    }

    async fn update(
        &self,
        id: Uuid,
        expected_version: u64,
        input: UpdateBookingDraft,
    ) -> TutorResult<Option<BookingDraft>> {
        let mut sets = Vec::new();
        if input.student_id.is_some() {
            sets.push("student_id = $student_id");
        }
        if input.teacher_id.is_some() {
            sets.push("teacher_id = $teacher_id");
        }
        if input.subject_id.is_some() {
            sets.push("subject_id = $subject_id");
        }
        if input.dates.is_some() {
            sets.push("dates = $dates");
        }
        if input.availability_ids.is_some() {
            sets.push("availability_ids = $availability_ids");
        }
        if input.notes.is_some() {
            sets.push("notes = $notes");
        }
        if input.expires_at.is_some() {
            sets.push("expires_at = $expires_at");
        }
        sets.push("version += 1");
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('booking_draft', $id) SET {} \
             WHERE version = $version",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id.to_string()))
            .bind(("version", expected_version));

        if let Some(student_id) = input.student_id {
            builder = builder.bind(("student_id", student_id.to_string()));
        }
        if let Some(teacher_id) = input.teacher_id {
            builder = builder.bind(("teacher_id", teacher_id.to_string()));
        }
        if let Some(subject_id) = input.subject_id {
            builder = builder.bind(("subject_id", subject_id.to_string()));
        }
        if let Some(dates) = input.dates {
            let dates: Vec<String> = dates.into_iter().map(format_date).collect();
            builder = builder.bind(("dates", dates));
        }
        if let Some(ids) = input.availability_ids {
            let ids: Vec<String> = ids.iter().map(Uuid::to_string).collect();
            builder = builder.bind(("availability_ids", ids));
        }
        if let Some(notes) = input.notes {
            builder = builder.bind(("notes", notes));
        }
        if let Some(expires_at) = input.expires_at {
            builder = builder.bind(("expires_at", expires_at));
        }

        let mut result = builder
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let touched: Vec<VersionRow> = result.take(0).map_err(DbError::from)?;
        if touched.is_empty() {
            return Ok(None);
        }

        self.get_by_id(id).await.map(Some)
    }

    async fn delete(&self, id: Uuid) -> TutorResult<()> {
        self.db
            .query("DELETE type::record('booking_draft', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> TutorResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM booking_draft \
                 WHERE expires_at < $now GROUP ALL; \
                 DELETE booking_draft WHERE expires_at < $now;",
            )
            .bind(("now", now))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let counts: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        let removed = counts.first().map(|r| r.total).unwrap_or(0);

        if removed > 0 {
            info!(removed, "Expired booking drafts purged");
        }

        Ok(removed)
    }
}
