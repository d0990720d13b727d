//! SurrealDB implementation of [`SubjectRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tutorhub_core::error::TutorResult;
use tutorhub_core::models::subject::{CreateSubject, Subject};
use tutorhub_core::repository::SubjectRepository;
use uuid::Uuid;

use crate::error::DbError;
use crate::row::parse_uuid;

#[derive(Debug, SurrealValue)]
struct SubjectRow {
    record_id: String,
    name: String,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl SubjectRow {
    fn try_into_subject(self) -> Result<Subject, DbError> {
        Ok(Subject {
            id: parse_uuid("subject", &self.record_id)?,
            name: self.name,
            is_active: self.is_active,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the subject repository.
#[derive(Clone)]
pub struct SurrealSubjectRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSubjectRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> SubjectRepository for SurrealSubjectRepository<C> {
    async fn create(&self, input: CreateSubject) -> TutorResult<Subject> {
        let id = Uuid::new_v4();

        self.db
            .query("CREATE type::record('subject', $id) SET name = $name")
            .bind(("id", id.to_string()))
            .bind(("name", input.name))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        self.get_by_id(id).await
    }

    async fn get_by_id(&self, id: Uuid) -> TutorResult<Subject> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM type::record('subject', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SubjectRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "subject".into(),
            id: id_str,
        })?;

        Ok(row.try_into_subject()?)
    }

    async fn get_many(&self, ids: &[Uuid]) -> TutorResult<Vec<Subject>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<String> = ids.iter().map(Uuid::to_string).collect();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM subject \
                 WHERE meta::id(id) IN $ids ORDER BY name ASC",
            )
            .bind(("ids", ids))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SubjectRow> = result.take(0).map_err(DbError::from)?;
        let subjects = rows
            .into_iter()
            .map(SubjectRow::try_into_subject)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(subjects)
    }
}
