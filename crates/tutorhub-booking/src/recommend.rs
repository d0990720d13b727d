//! Ranking of pending booking requests against a teacher's profile.
//!
//! Scores are a weighted sum out of 100:
//!
//! | Dimension        | Points |
//! |------------------|--------|
//! | Subject          | 40 exact, otherwise similarity-scaled < 40 |
//! | Specialization   | 25 |
//! | Time of day      | 15 morning/evening, 10 midday, 5 night |
//! | Experience       | 10 (placeholder) |
//! | Availability     | 10 (placeholder) |

use std::collections::HashMap;

use chrono::{Duration, NaiveDate, NaiveTime, Timelike};
use serde::Serialize;
use tutorhub_core::error::TutorResult;
use tutorhub_core::models::booking::Booking;
use tutorhub_core::models::teacher::TeacherProfile;
use tutorhub_core::repository::{
    BookingRepository, Repositories, SubjectRepository, TeacherProfileRepository,
};
use uuid::Uuid;

use crate::config::BookingConfig;

pub const SUBJECT_MATCH_POINTS: u32 = 40;
pub const SPECIALIZATION_POINTS: u32 = 25;
pub const PEAK_TIME_POINTS: u32 = 15;
pub const MIDDAY_POINTS: u32 = 10;
pub const OFF_PEAK_POINTS: u32 = 5;
/// Experience level is not assessed; every booking gets this credit.
pub const EXPERIENCE_PLACEHOLDER_POINTS: u32 = 10;
/// Calendar fit is not assessed; every booking gets this credit.
pub const AVAILABILITY_PLACEHOLDER_POINTS: u32 = 10;

const SUBJECT_REASON_MIN: u32 = 30;
const SPECIALIZATION_REASON_MIN: u32 = 20;
const TIME_REASON_MIN: u32 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    pub subject: u32,
    pub specialization: u32,
    pub time_of_day: u32,
    pub experience: u32,
    pub availability: u32,
}

impl ScoreBreakdown {
    pub fn total(&self) -> u32 {
        self.subject + self.specialization + self.time_of_day + self.experience + self.availability
    }

    pub fn reasons(&self) -> Vec<&'static str> {
        let mut reasons = Vec::new();
        if self.subject >= SUBJECT_REASON_MIN {
            reasons.push("Subject match");
        }
        if self.specialization >= SPECIALIZATION_REASON_MIN {
            reasons.push("Matches your specialization");
        }
        if self.time_of_day >= TIME_REASON_MIN {
            reasons.push("Preferred time of day");
        }
        reasons
    }
}

/// A pending booking worth showing to a teacher.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub booking: Booking,
    pub subject_name: String,
    pub score: u32,
    pub breakdown: ScoreBreakdown,
    pub reasons: Vec<&'static str>,
}

/// Score one booking request for `teacher`.
pub fn score(
    teacher: &TeacherProfile,
    subject_name: &str,
    notes: Option<&str>,
    start_time: NaiveTime,
) -> ScoreBreakdown {
    ScoreBreakdown {
        subject: subject_points(&teacher.subjects, subject_name),
        specialization: specialization_points(&teacher.specializations, subject_name, notes),
        time_of_day: time_of_day_points(start_time),
        experience: EXPERIENCE_PLACEHOLDER_POINTS,
        availability: AVAILABILITY_PLACEHOLDER_POINTS,
    }
}

/// Score every candidate, keep those at or above `threshold`, best
/// first, at most `limit`. Ties go to the earlier booking.
pub fn rank(
    teacher: &TeacherProfile,
    candidates: Vec<(Booking, String)>,
    threshold: u32,
    limit: usize,
) -> Vec<Recommendation> {
    let mut ranked: Vec<Recommendation> = candidates
        .into_iter()
        .map(|(booking, subject_name)| {
            let breakdown = score(
                teacher,
                &subject_name,
                booking.notes.as_deref(),
                booking.start_time,
            );
            Recommendation {
                score: breakdown.total(),
                reasons: breakdown.reasons(),
                breakdown,
                subject_name,
                booking,
            }
        })
        .filter(|r| r.score >= threshold)
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then(a.booking.booking_date.cmp(&b.booking.booking_date))
            .then(a.booking.start_time.cmp(&b.booking.start_time))
            .then(a.booking.id.cmp(&b.booking.id))
    });
    ranked.truncate(limit);
    ranked
}

fn subject_points(teacher_subjects: &[String], subject_name: &str) -> u32 {
    let wanted = subject_name.trim().to_lowercase();
    if teacher_subjects
        .iter()
        .any(|s| s.trim().to_lowercase() == wanted)
    {
        return SUBJECT_MATCH_POINTS;
    }

    let best = teacher_subjects
        .iter()
        .map(|s| similarity(s, subject_name))
        .fold(0.0, f64::max);
    let partial = (best * f64::from(SUBJECT_MATCH_POINTS)).floor() as u32;
    partial.min(SUBJECT_MATCH_POINTS - 1)
}

fn specialization_points(
    specializations: &[String],
    subject_name: &str,
    notes: Option<&str>,
) -> u32 {
    let subject = subject_name.to_lowercase();
    let notes = notes.unwrap_or_default().to_lowercase();
    let mentioned = specializations
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .any(|s| subject.contains(&s) || notes.contains(&s));
    if mentioned { SPECIALIZATION_POINTS } else { 0 }
}

fn time_of_day_points(start_time: NaiveTime) -> u32 {
    match start_time.hour() {
        6..=11 | 16..=20 => PEAK_TIME_POINTS,
        12..=15 => MIDDAY_POINTS,
        _ => OFF_PEAK_POINTS,
    }
}

/// Case-insensitive similarity in `[0, 1]`: twice the number of common
/// characters (longest common substring, applied recursively to both
/// sides) over the combined length.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.trim().to_lowercase().chars().collect();
    let b: Vec<char> = b.trim().to_lowercase().chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 0.0;
    }
    (2 * common_chars(&a, &b)) as f64 / total as f64
}

fn common_chars(a: &[char], b: &[char]) -> usize {
    let (mut best_a, mut best_b, mut best_len) = (0, 0, 0);
    for i in 0..a.len() {
        for j in 0..b.len() {
            let len = a[i..]
                .iter()
                .zip(&b[j..])
                .take_while(|(x, y)| x == y)
                .count();
            if len > best_len {
                (best_a, best_b, best_len) = (i, j, len);
            }
        }
    }
    if best_len == 0 {
        return 0;
    }
    best_len
        + common_chars(&a[..best_a], &b[..best_b])
        + common_chars(&a[best_a + best_len..], &b[best_b + best_len..])
}

/// Reads the pending pool and ranks it for one teacher.
pub struct RecommendationService<R: Repositories> {
    repos: R,
    config: BookingConfig,
}

impl<R: Repositories> RecommendationService<R> {
    pub fn new(repos: R, config: BookingConfig) -> Self {
        Self { repos, config }
    }

    /// Pending bookings dated after `today` from other teachers' pools
    /// that match `teacher_id`. A teacher without a profile gets none.
    pub async fn recommend(
        &self,
        teacher_id: Uuid,
        today: NaiveDate,
    ) -> TutorResult<Vec<Recommendation>> {
        let Some(teacher) = self.repos.profiles().find(teacher_id).await? else {
            return Ok(Vec::new());
        };

        let pool: Vec<Booking> = self
            .repos
            .bookings()
            .list_pending_from(today + Duration::days(1))
            .await?
            .into_iter()
            .filter(|b| b.teacher_id != teacher_id)
            .collect();

        let mut subject_ids: Vec<Uuid> = pool.iter().map(|b| b.subject_id).collect();
        subject_ids.sort();
        subject_ids.dedup();
        let names: HashMap<Uuid, String> = self
            .repos
            .subjects()
            .get_many(&subject_ids)
            .await?
            .into_iter()
            .map(|s| (s.id, s.name))
            .collect();

        let candidates = pool
            .into_iter()
            .map(|b| {
                let name = names.get(&b.subject_id).cloned().unwrap_or_default();
                (b, name)
            })
            .collect();

        Ok(rank(
            &teacher,
            candidates,
            self.config.recommendation_threshold,
            self.config.recommendation_limit,
        ))
    }
}
