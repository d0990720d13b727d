//! SurrealDB implementation of [`TeacherProfileRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tutorhub_core::error::TutorResult;
use tutorhub_core::models::teacher::{
    CreateTeacherProfile, Currency, TeacherProfile, UpdateTeacherProfile,
};
use tutorhub_core::repository::TeacherProfileRepository;
use uuid::Uuid;

use crate::error::DbError;
use crate::row::{corrupt, parse_uuid};

#[derive(Debug, SurrealValue)]
struct TeacherProfileRow {
    teacher_id: String,
    hourly_rate_ngn: Option<f64>,
    hourly_rate_usd: Option<f64>,
    preferred_currency: String,
    holiday_mode: bool,
    time_zone: String,
    subjects: Vec<String>,
    specializations: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TeacherProfileRow {
    fn try_into_profile(self) -> Result<TeacherProfile, DbError> {
        let preferred_currency = Currency::parse(&self.preferred_currency).ok_or_else(|| {
            corrupt(
                "teacher_profile",
                format!("unknown currency: {}", self.preferred_currency),
            )
        })?;
        Ok(TeacherProfile {
            teacher_id: parse_uuid("teacher_profile", &self.teacher_id)?,
            hourly_rate_ngn: self.hourly_rate_ngn,
            hourly_rate_usd: self.hourly_rate_usd,
            preferred_currency,
            holiday_mode: self.holiday_mode,
            time_zone: self.time_zone,
            subjects: self.subjects,
            specializations: self.specializations,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the teacher profile repository.
#[derive(Clone)]
pub struct SurrealTeacherProfileRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTeacherProfileRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> TeacherProfileRepository for SurrealTeacherProfileRepository<C> {
    async fn create(&self, input: CreateTeacherProfile) -> TutorResult<TeacherProfile> {
        let id_str = input.teacher_id.to_string();

        self.db
            .query(
                "CREATE type::record('teacher_profile', $id) SET \
                 teacher_id = $id, \
                 hourly_rate_ngn = $hourly_rate_ngn, \
                 hourly_rate_usd = $hourly_rate_usd, \
                 preferred_currency = $preferred_currency, \
                 holiday_mode = false, \
                 time_zone = $time_zone, \
                 subjects = $subjects, \
                 specializations = $specializations",
            )
            .bind(("id", id_str))
            .bind(("hourly_rate_ngn", input.hourly_rate_ngn))
            .bind(("hourly_rate_usd", input.hourly_rate_usd))
            .bind((
                "preferred_currency",
                input.preferred_currency.as_str().to_string(),
            ))
            .bind(("time_zone", input.time_zone))
            .bind(("subjects", input.subjects))
            .bind(("specializations", input.specializations))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        self.get(input.teacher_id).await
    }

    async fn get(&self, teacher_id: Uuid) -> TutorResult<TeacherProfile> {
        self.find(teacher_id).await?.ok_or_else(|| {
            DbError::NotFound {
                entity: "teacher_profile".into(),
                id: teacher_id.to_string(),
            }
            .into()
        })
    }

    async fn find(&self, teacher_id: Uuid) -> TutorResult<Option<TeacherProfile>> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('teacher_profile', $id)")
            .bind(("id", teacher_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TeacherProfileRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_profile()?)),
            None => Ok(None),
        }
    }

    async fn update(
        &self,
        teacher_id: Uuid,
        input: UpdateTeacherProfile,
    ) -> TutorResult<TeacherProfile> {
        let mut sets = Vec::new();
        if input.hourly_rate_ngn.is_some() {
            sets.push("hourly_rate_ngn = $hourly_rate_ngn");
        }
        if input.hourly_rate_usd.is_some() {
            sets.push("hourly_rate_usd = $hourly_rate_usd");
        }
        if input.preferred_currency.is_some() {
            sets.push("preferred_currency = $preferred_currency");
        }
        if input.holiday_mode.is_some() {
            sets.push("holiday_mode = $holiday_mode");
        }
        if input.time_zone.is_some() {
            sets.push("time_zone = $time_zone");
        }
        if input.subjects.is_some() {
            sets.push("subjects = $subjects");
        }
        if input.specializations.is_some() {
            sets.push("specializations = $specializations");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('teacher_profile', $id) SET {} \
             WHERE teacher_id = $id",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", teacher_id.to_string()));

        if let Some(rate) = input.hourly_rate_ngn {
            builder = builder.bind(("hourly_rate_ngn", rate));
        }
        if let Some(rate) = input.hourly_rate_usd {
            builder = builder.bind(("hourly_rate_usd", rate));
        }
        if let Some(currency) = input.preferred_currency {
            builder = builder.bind(("preferred_currency", currency.as_str().to_string()));
        }
        if let Some(holiday_mode) = input.holiday_mode {
            builder = builder.bind(("holiday_mode", holiday_mode));
        }
        if let Some(time_zone) = input.time_zone {
            builder = builder.bind(("time_zone", time_zone));
        }
        if let Some(subjects) = input.subjects {
            builder = builder.bind(("subjects", subjects));
        }
        if let Some(specializations) = input.specializations {
            builder = builder.bind(("specializations", specializations));
        }

        let mut result = builder
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<TeacherProfileRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "teacher_profile".into(),
            id: teacher_id.to_string(),
        })?;

        Ok(row.try_into_profile()?)
    }
}
