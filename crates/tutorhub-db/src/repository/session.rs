//! SurrealDB implementation of [`TeachingSessionRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tutorhub_core::error::TutorResult;
use tutorhub_core::models::teaching_session::{
    CreateTeachingSession, TeachingSession, TeachingSessionStatus, UpdateTeachingSession,
};
use tutorhub_core::repository::TeachingSessionRepository;
use uuid::Uuid;

use crate::error::DbError;
use crate::row::{corrupt, format_date, format_time, parse_date, parse_time, parse_uuid};

#[derive(Debug, SurrealValue)]
struct SessionRow {
    booking_id: String,
    teacher_id: String,
    student_id: String,
    subject_id: String,
    session_date: String,
    start_time: String,
    end_time: String,
    status: String,
    meeting_link: Option<String>,
    teacher_notes: Option<String>,
    student_rating: Option<u32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SessionRow {
    fn try_into_session(self) -> Result<TeachingSession, DbError> {
        let status = TeachingSessionStatus::parse(&self.status).ok_or_else(|| {
            corrupt("teaching_session", format!("unknown status: {}", self.status))
        })?;
        Ok(TeachingSession {
            booking_id: parse_uuid("teaching_session", &self.booking_id)?,
            teacher_id: parse_uuid("teaching_session", &self.teacher_id)?,
            student_id: parse_uuid("teaching_session", &self.student_id)?,
            subject_id: parse_uuid("teaching_session", &self.subject_id)?,
            session_date: parse_date("teaching_session", &self.session_date)?,
            start_time: parse_time("teaching_session", &self.start_time)?,
            end_time: parse_time("teaching_session", &self.end_time)?,
            status,
            meeting_link: self.meeting_link,
            teacher_notes: self.teacher_notes,
            student_rating: self.student_rating.and_then(|r| u8::try_from(r).ok()),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Content of a new session. The record key is the booking id, so a
/// booking can never own two sessions.
#[derive(Debug, SurrealValue)]
pub(crate) struct NewSessionRow {
    id: String,
    booking_id: String,
    teacher_id: String,
    student_id: String,
    subject_id: String,
    session_date: String,
    start_time: String,
    end_time: String,
    status: String,
}

impl From<CreateTeachingSession> for NewSessionRow {
    fn from(input: CreateTeachingSession) -> Self {
        Self {
            id: input.booking_id.to_string(),
            booking_id: input.booking_id.to_string(),
            teacher_id: input.teacher_id.to_string(),
            student_id: input.student_id.to_string(),
            subject_id: input.subject_id.to_string(),
            session_date: format_date(input.session_date),
            start_time: format_time(input.start_time),
            end_time: format_time(input.end_time),
            status: TeachingSessionStatus::Scheduled.as_str().to_string(),
        }
    }
}

/// SurrealDB implementation of the teaching session repository.
#[derive(Clone)]
pub struct SurrealTeachingSessionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTeachingSessionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> TeachingSessionRepository for SurrealTeachingSessionRepository<C> {
    async fn get_by_booking(&self, booking_id: Uuid) -> TutorResult<Option<TeachingSession>> {
        let mut result = self
            .db
            .query("SELECT * FROM teaching_session WHERE booking_id = $booking_id")
            .bind(("booking_id", booking_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SessionRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_session()?)),
            None => Ok(None),
        }
    }

    async fn update_details(
        &self,
        booking_id: Uuid,
        input: UpdateTeachingSession,
    ) -> TutorResult<TeachingSession> {
        let mut sets = Vec::new();
        if input.meeting_link.is_some() {
            sets.push("meeting_link = $meeting_link");
        }
        if input.teacher_notes.is_some() {
            sets.push("teacher_notes = $teacher_notes");
        }
        if input.student_rating.is_some() {
            sets.push("student_rating = $student_rating");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE teaching_session SET {} WHERE booking_id = $booking_id",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("booking_id", booking_id.to_string()));

        if let Some(link) = input.meeting_link {
            builder = builder.bind(("meeting_link", link));
        }
        if let Some(notes) = input.teacher_notes {
            builder = builder.bind(("teacher_notes", notes));
        }
        if let Some(rating) = input.student_rating {
            builder = builder.bind(("student_rating", u32::from(rating)));
        }

        let mut result = builder
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<SessionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "teaching_session".into(),
            id: booking_id.to_string(),
        })?;

        Ok(row.try_into_session()?)
    }
}
