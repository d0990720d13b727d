//! SurrealDB implementation of [`AvailabilityRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tutorhub_core::error::TutorResult;
use tutorhub_core::models::availability::{Availability, AvailabilityWindow, CreateAvailability};
use tutorhub_core::repository::AvailabilityRepository;
use uuid::Uuid;

use crate::error::DbError;
use crate::row::{corrupt, format_time, parse_time, parse_uuid};

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct AvailabilityRow {
    record_id: String,
    teacher_id: String,
    day_of_week: u32,
    start_time: String,
    end_time: String,
    is_active: bool,
    time_zone: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Content of a window inserted in bulk. `id` becomes the record key.
#[derive(Debug, SurrealValue)]
struct NewAvailabilityRow {
    id: String,
    teacher_id: String,
    day_of_week: u32,
    start_time: String,
    end_time: String,
    is_active: bool,
    time_zone: String,
}

impl AvailabilityRow {
    fn try_into_availability(self) -> Result<Availability, DbError> {
        let day_of_week = u8::try_from(self.day_of_week)
            .ok()
            .filter(|d| *d <= 6)
            .ok_or_else(|| corrupt("availability", format!("bad day {}", self.day_of_week)))?;
        Ok(Availability {
            id: parse_uuid("availability", &self.record_id)?,
            teacher_id: parse_uuid("availability", &self.teacher_id)?,
            day_of_week,
            start_time: parse_time("availability", &self.start_time)?,
            end_time: parse_time("availability", &self.end_time)?,
            is_active: self.is_active,
            time_zone: self.time_zone,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn new_row(teacher_id: Uuid, time_zone: &str, window: &AvailabilityWindow) -> NewAvailabilityRow {
    NewAvailabilityRow {
        id: Uuid::new_v4().to_string(),
        teacher_id: teacher_id.to_string(),
        day_of_week: u32::from(window.day_of_week),
        start_time: format_time(window.start_time),
        end_time: format_time(window.end_time),
        is_active: true,
        time_zone: time_zone.to_string(),
    }
}

/// SurrealDB implementation of the availability repository.
#[derive(Clone)]
pub struct SurrealAvailabilityRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAvailabilityRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn get_by_id(&self, id: &str) -> TutorResult<Availability> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM type::record('availability', $id)",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AvailabilityRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "availability".into(),
            id: id.to_string(),
        })?;

        Ok(row.try_into_availability()?)
    }
}

impl<C: Connection> AvailabilityRepository for SurrealAvailabilityRepository<C> {
    async fn create(&self, input: CreateAvailability) -> TutorResult<Availability> {
        let row = new_row(input.teacher_id, &input.time_zone, &input.window);
        let id = row.id.clone();

        self.db
            .query("INSERT INTO availability $row")
            .bind(("row", row))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        self.get_by_id(&id).await
    }

    async fn replace_for_teacher(
        &self,
        teacher_id: Uuid,
        time_zone: &str,
        windows: Vec<AvailabilityWindow>,
    ) -> TutorResult<Vec<Availability>> {
        let rows: Vec<NewAvailabilityRow> = windows
            .iter()
            .map(|w| new_row(teacher_id, time_zone, w))
            .collect();

        let query = if rows.is_empty() {
            "DELETE availability WHERE teacher_id = $teacher_id"
        } else {
            "BEGIN TRANSACTION; \
             DELETE availability WHERE teacher_id = $teacher_id; \
             INSERT INTO availability $rows; \
             COMMIT TRANSACTION;"
        };

        self.db
            .query(query)
            .bind(("teacher_id", teacher_id.to_string()))
            .bind(("rows", rows))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        self.list_for_teacher(teacher_id).await
    }

    async fn list_for_teacher(&self, teacher_id: Uuid) -> TutorResult<Vec<Availability>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM availability \
                 WHERE teacher_id = $teacher_id \
                 ORDER BY day_of_week ASC, start_time ASC",
            )
            .bind(("teacher_id", teacher_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AvailabilityRow> = result.take(0).map_err(DbError::from)?;
        let windows = rows
            .into_iter()
            .map(AvailabilityRow::try_into_availability)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(windows)
    }

    async fn get_many(&self, ids: &[Uuid]) -> TutorResult<Vec<Availability>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<String> = ids.iter().map(Uuid::to_string).collect();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM availability \
                 WHERE meta::id(id) IN $ids",
            )
            .bind(("ids", ids))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AvailabilityRow> = result.take(0).map_err(DbError::from)?;
        let windows = rows
            .into_iter()
            .map(AvailabilityRow::try_into_availability)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(windows)
    }
}
