//! Teacher availability domain model.
//!
//! A window is a recurring weekly range (`day_of_week` plus start and
//! end time). Teachers may hold several windows on the same day and
//! overlapping windows are stored as given.

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Day numbering used by availability windows: 0 = Sunday … 6 = Saturday.
pub fn day_of_week(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// Times of day are stored to the minute, so anything finer is refused.
pub fn is_whole_minute(time: NaiveTime) -> bool {
    time.second() == 0 && time.nanosecond() == 0
}

/// Parse an English day name (`"monday"`, `"Mon"`) into the 0–6 numbering.
pub fn parse_day_name(name: &str) -> Option<u8> {
    let weekday: Weekday = name.trim().parse().ok()?;
    Some(weekday.num_days_from_sunday() as u8)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Availability {
    pub id: Uuid,
    pub teacher_id: Uuid,
    pub day_of_week: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_active: bool,
    pub time_zone: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Availability {
    /// Minutes between the configured start and end of the window.
    pub fn duration_minutes(&self) -> u32 {
        (self.end_time - self.start_time).num_minutes().max(0) as u32
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        self.day_of_week == day_of_week(date)
    }
}

/// One weekly window as submitted by the teacher's settings form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AvailabilityWindow {
    pub day_of_week: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl AvailabilityWindow {
    /// Returns a human-readable problem with the window, if any.
    pub fn problem(&self) -> Option<String> {
        if self.day_of_week > 6 {
            return Some(format!(
                "day_of_week must be between 0 and 6, got {}",
                self.day_of_week
            ));
        }
        if !is_whole_minute(self.start_time) || !is_whole_minute(self.end_time) {
            return Some("start and end times must be whole minutes".into());
        }
        if self.end_time <= self.start_time {
            return Some(format!(
                "end time {} must be after start time {}",
                self.end_time.format("%H:%M"),
                self.start_time.format("%H:%M")
            ));
        }
        None
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAvailability {
    pub teacher_id: Uuid,
    pub window: AvailabilityWindow,
    pub time_zone: String,
}

/// Legacy per-day schedule entry (`day_schedules` JSON blob).
///
/// Only read by the one-time import into [`AvailabilityWindow`]s.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DaySchedule {
    pub day: String,
    #[serde(default)]
    pub enabled: bool,
    pub from: Option<String>,
    pub to: Option<String>,
}

impl DaySchedule {
    /// Convert into a window. Disabled days yield `Ok(None)`.
    pub fn to_window(&self) -> Result<Option<AvailabilityWindow>, String> {
        if !self.enabled {
            return Ok(None);
        }
        let day_of_week =
            parse_day_name(&self.day).ok_or_else(|| format!("unknown day '{}'", self.day))?;
        let start_time = parse_clock(self.from.as_deref(), &self.day, "from")?;
        let end_time = parse_clock(self.to.as_deref(), &self.day, "to")?;

        let window = AvailabilityWindow {
            day_of_week,
            start_time,
            end_time,
        };
        match window.problem() {
            Some(problem) => Err(format!("{}: {problem}", self.day)),
            None => Ok(Some(window)),
        }
    }
}

fn parse_clock(value: Option<&str>, day: &str, field: &str) -> Result<NaiveTime, String> {
    let value = value.ok_or_else(|| format!("{day}: missing '{field}' time"))?;
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| format!("{day}: invalid '{field}' time '{value}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn day_numbering_starts_on_sunday() {
        let monday = NaiveDate::from_ymd_opt(2030, 3, 11).unwrap();
        assert_eq!(day_of_week(monday), 1);
        assert_eq!(parse_day_name("Sunday"), Some(0));
        assert_eq!(parse_day_name("sat"), Some(6));
        assert_eq!(parse_day_name("someday"), None);
    }

    #[test]
    fn window_rejects_inverted_range() {
        let window = AvailabilityWindow {
            day_of_week: 1,
            start_time: t(19, 0),
            end_time: t(18, 0),
        };
        assert!(window.problem().is_some());

        let window = AvailabilityWindow {
            day_of_week: 7,
            start_time: t(18, 0),
            end_time: t(19, 0),
        };
        assert!(window.problem().unwrap().contains("day_of_week"));
    }

    #[test]
    fn window_rejects_seconds() {
        let window = AvailabilityWindow {
            day_of_week: 1,
            start_time: t(18, 0),
            end_time: NaiveTime::from_hms_opt(18, 0, 30).unwrap(),
        };
        assert!(window.problem().unwrap().contains("whole minutes"));

        let legacy = DaySchedule {
            day: "monday".into(),
            enabled: true,
            from: Some("18:00:00".into()),
            to: Some("19:00:15".into()),
        };
        assert!(legacy.to_window().is_err());
    }

    #[test]
    fn day_schedule_converts_enabled_days_only() {
        let monday = DaySchedule {
            day: "monday".into(),
            enabled: true,
            from: Some("18:00".into()),
            to: Some("19:30".into()),
        };
        let window = monday.to_window().unwrap().unwrap();
        assert_eq!(window.day_of_week, 1);
        assert_eq!(window.start_time, t(18, 0));
        assert_eq!(window.end_time, t(19, 30));

        let tuesday = DaySchedule {
            day: "tuesday".into(),
            enabled: false,
            from: None,
            to: None,
        };
        assert_eq!(tuesday.to_window().unwrap(), None);
    }

    #[test]
    fn day_schedule_reports_bad_times() {
        let broken = DaySchedule {
            day: "friday".into(),
            enabled: true,
            from: Some("25:00".into()),
            to: Some("26:00".into()),
        };
        assert!(broken.to_window().unwrap_err().contains("invalid 'from'"));
    }
}
