//! Teacher-side settings: pricing profile, weekly availability and
//! holiday mode.

use tracing::info;
use tutorhub_core::error::TutorResult;
use tutorhub_core::models::availability::{Availability, AvailabilityWindow, DaySchedule};
use tutorhub_core::models::teacher::{CreateTeacherProfile, TeacherProfile, UpdateTeacherProfile};
use tutorhub_core::repository::{AvailabilityRepository, Repositories, TeacherProfileRepository};
use uuid::Uuid;

use crate::error::BookingError;

const DEFAULT_TIME_ZONE: &str = "UTC";

/// Manages what a teacher offers: rates, subjects and weekly windows.
pub struct AvailabilityService<R: Repositories> {
    repos: R,
}

impl<R: Repositories> AvailabilityService<R> {
    pub fn new(repos: R) -> Self {
        Self { repos }
    }

    /// Create the teacher's profile, or overwrite it if one exists.
    /// Holiday mode is left as it was.
    pub async fn upsert_profile(&self, input: CreateTeacherProfile) -> TutorResult<TeacherProfile> {
        check_rate(input.hourly_rate_ngn)?;
        check_rate(input.hourly_rate_usd)?;

        let profiles = self.repos.profiles();
        match profiles.find(input.teacher_id).await? {
            Some(_) => {
                profiles
                    .update(
                        input.teacher_id,
                        UpdateTeacherProfile {
                            hourly_rate_ngn: Some(input.hourly_rate_ngn),
                            hourly_rate_usd: Some(input.hourly_rate_usd),
                            preferred_currency: Some(input.preferred_currency),
                            holiday_mode: None,
                            time_zone: Some(input.time_zone),
                            subjects: Some(input.subjects),
                            specializations: Some(input.specializations),
                        },
                    )
                    .await
            }
            None => profiles.create(input).await,
        }
    }

    pub async fn update_profile(
        &self,
        teacher_id: Uuid,
        input: UpdateTeacherProfile,
    ) -> TutorResult<TeacherProfile> {
        if let Some(rate) = input.hourly_rate_ngn {
            check_rate(rate)?;
        }
        if let Some(rate) = input.hourly_rate_usd {
            check_rate(rate)?;
        }
        self.repos.profiles().update(teacher_id, input).await
    }

    pub async fn set_holiday_mode(&self, teacher_id: Uuid, on: bool) -> TutorResult<TeacherProfile> {
        let profile = self
            .repos
            .profiles()
            .update(
                teacher_id,
                UpdateTeacherProfile {
                    holiday_mode: Some(on),
                    ..Default::default()
                },
            )
            .await?;

        info!(teacher_id = %teacher_id, holiday_mode = on, "Holiday mode changed");

        Ok(profile)
    }

    /// Replace the teacher's whole weekly set with `windows`.
    pub async fn replace_weekly(
        &self,
        teacher_id: Uuid,
        windows: Vec<AvailabilityWindow>,
    ) -> TutorResult<Vec<Availability>> {
        if let Some(problem) = windows.iter().find_map(AvailabilityWindow::problem) {
            return Err(BookingError::InvalidWindow(problem).into());
        }

        let time_zone = self
            .repos
            .profiles()
            .find(teacher_id)
            .await?
            .map(|p| p.time_zone)
            .unwrap_or_else(|| DEFAULT_TIME_ZONE.to_string());

        let stored = self
            .repos
            .availability()
            .replace_for_teacher(teacher_id, &time_zone, windows)
            .await?;

        info!(
            teacher_id = %teacher_id,
            windows = stored.len(),
            "Weekly availability replaced"
        );

        Ok(stored)
    }

    pub async fn list(&self, teacher_id: Uuid) -> TutorResult<Vec<Availability>> {
        self.repos.availability().list_for_teacher(teacher_id).await
    }

    /// One-time import of a legacy day-schedule JSON array. Disabled
    /// days are skipped; the result replaces the weekly set.
    pub async fn import_day_schedules(
        &self,
        teacher_id: Uuid,
        json: &str,
    ) -> TutorResult<Vec<Availability>> {
        let windows = parse_day_schedules(json)?;
        self.replace_weekly(teacher_id, windows).await
    }
}

/// Convert a legacy `[{day, enabled, from, to}]` blob into windows.
pub fn parse_day_schedules(json: &str) -> Result<Vec<AvailabilityWindow>, BookingError> {
    let schedules: Vec<DaySchedule> = serde_json::from_str(json)
        .map_err(|e| BookingError::InvalidDaySchedule(e.to_string()))?;

    let mut windows = Vec::with_capacity(schedules.len());
    for schedule in &schedules {
        if let Some(window) = schedule
            .to_window()
            .map_err(BookingError::InvalidDaySchedule)?
        {
            windows.push(window);
        }
    }
    Ok(windows)
}

fn check_rate(rate: Option<f64>) -> Result<(), BookingError> {
    match rate {
        Some(r) if !r.is_finite() || r < 0.0 => Err(BookingError::NegativeRate),
        _ => Ok(()),
    }
}
