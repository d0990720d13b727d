//! Conversions shared by the row structs of every repository.
//!
//! UUIDs are stored as strings, dates as `YYYY-MM-DD` and times of day
//! as `HH:MM`, so lexical order matches chronological order.

use chrono::{NaiveDate, NaiveTime};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
pub(crate) struct CountRow {
    pub total: u64,
}

/// Minimal projection used to count rows touched by a conditional update.
#[derive(Debug, SurrealValue)]
pub(crate) struct VersionRow {
    #[allow(dead_code)]
    pub version: u64,
}

pub(crate) fn parse_uuid(entity: &'static str, value: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(value).map_err(|e| DbError::CorruptRow {
        entity,
        message: format!("invalid UUID '{value}': {e}"),
    })
}

pub(crate) fn parse_opt_uuid(
    entity: &'static str,
    value: Option<String>,
) -> Result<Option<Uuid>, DbError> {
    value.map(|v| parse_uuid(entity, &v)).transpose()
}

pub(crate) fn parse_date(entity: &'static str, value: &str) -> Result<NaiveDate, DbError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e| DbError::CorruptRow {
        entity,
        message: format!("invalid date '{value}': {e}"),
    })
}

pub(crate) fn parse_time(entity: &'static str, value: &str) -> Result<NaiveTime, DbError> {
    NaiveTime::parse_from_str(value, TIME_FORMAT).map_err(|e| DbError::CorruptRow {
        entity,
        message: format!("invalid time '{value}': {e}"),
    })
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub(crate) fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

pub(crate) fn corrupt(entity: &'static str, message: impl Into<String>) -> DbError {
    DbError::CorruptRow {
        entity,
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_and_times_use_sortable_text() {
        let date = NaiveDate::from_ymd_opt(2030, 3, 11).unwrap();
        let time = NaiveTime::from_hms_opt(9, 5, 0).unwrap();
        assert_eq!(format_date(date), "2030-03-11");
        assert_eq!(format_time(time), "09:05");
        assert_eq!(parse_date("booking", "2030-03-11").unwrap(), date);
        assert_eq!(parse_time("booking", "09:05").unwrap(), time);
    }

    #[test]
    fn corrupt_values_name_the_entity() {
        let err = parse_uuid("booking", "not-a-uuid").unwrap_err();
        assert!(err.to_string().contains("booking"));
        assert!(parse_time("availability", "9am").is_err());
    }
}
