//! Booking lifecycle service: creation and status transitions.

use chrono::{NaiveDate, NaiveTime, Utc};
use serde_json::json;
use tracing::info;
use tutorhub_core::error::TutorResult;
use tutorhub_core::models::Actor;
use tutorhub_core::models::availability::is_whole_minute;
use tutorhub_core::models::booking::{
    Booking, BookingFilter, BookingReschedule, BookingSchedule, BookingStatus, BookingTransition,
    CreateBooking, SessionEffect,
};
use tutorhub_core::models::booking_history::{BookingHistory, CreateBookingHistory, HistoryAction};
use tutorhub_core::models::teaching_session::{
    CreateTeachingSession, TeachingSession, TeachingSessionStatus, UpdateTeachingSession,
};
use tutorhub_core::repository::{
    AvailabilityRepository, BookingHistoryRepository, BookingRepository, PaginatedResult,
    Pagination, Repositories, SubjectRepository, TeacherProfileRepository,
    TeachingSessionRepository,
};
use uuid::Uuid;

use crate::config::BookingConfig;
use crate::error::BookingError;
use crate::notify::{BookingNotification, Notifier, dispatch};
use crate::rates::{ExchangeRateProvider, RateLocker};
use crate::slots::{SlotSelection, resolve_slots};

/// Input for booking one or more sessions with a teacher.
#[derive(Debug, Clone)]
pub struct CreateBookingRequest {
    pub student_id: Uuid,
    pub teacher_id: Uuid,
    pub subject_id: Uuid,
    pub dates: Vec<NaiveDate>,
    pub availability_ids: Vec<Uuid>,
    pub notes: Option<String>,
}

/// Input for moving a booking to another date and time.
#[derive(Debug, Clone)]
pub struct RescheduleRequest {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub reason: Option<String>,
}

impl RescheduleRequest {
    pub fn schedule(&self) -> BookingSchedule {
        BookingSchedule {
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
        }
    }
}

/// Booking lifecycle service.
///
/// Generic over the repository bundle so that the workflow has no
/// dependency on the database crate.
pub struct BookingService<R: Repositories, X: ExchangeRateProvider, N: Notifier> {
    pub(crate) repos: R,
    pub(crate) rates: RateLocker<X>,
    pub(crate) notifier: N,
    pub(crate) config: BookingConfig,
}

impl<R: Repositories, X: ExchangeRateProvider, N: Notifier> BookingService<R, X, N> {
    pub fn new(repos: R, exchange_rates: X, notifier: N, config: BookingConfig) -> Self {
        Self {
            repos,
            rates: RateLocker::new(exchange_rates, config.allow_unpriced_bookings),
            notifier,
            config,
        }
    }

    pub fn repositories(&self) -> &R {
        &self.repos
    }

    pub fn config(&self) -> &BookingConfig {
        &self.config
    }

    /// Book every selected date against the matching availability
    /// windows. All bookings start `Pending` and share one rate lock.
    pub async fn create(
        &self,
        request: CreateBookingRequest,
        actor: &Actor,
    ) -> TutorResult<Vec<Booking>> {
        if request.dates.is_empty() || request.availability_ids.is_empty() {
            return Err(BookingError::EmptySelection.into());
        }

        let subject = self.repos.subjects().get_by_id(request.subject_id).await?;
        if !subject.is_active {
            return Err(BookingError::InactiveSubject.into());
        }

        let profile = self.repos.profiles().find(request.teacher_id).await?;
        let windows = self
            .repos
            .availability()
            .get_many(&request.availability_ids)
            .await?;

        let slots = resolve_slots(
            &SlotSelection {
                teacher_id: request.teacher_id,
                holiday_mode: profile.as_ref().is_some_and(|p| p.holiday_mode),
                dates: &request.dates,
                availability_ids: &request.availability_ids,
            },
            &windows,
            Utc::now().date_naive(),
        )?;

        let rate = self.rates.lock(request.teacher_id, profile.as_ref()).await?;

        // The teacher may have gone on holiday while we were resolving.
        let latest = self.repos.profiles().find(request.teacher_id).await?;
        if latest.is_some_and(|p| p.holiday_mode) {
            return Err(BookingError::TeacherUnavailable.into());
        }

        let inputs = slots
            .into_iter()
            .map(|slot| CreateBooking {
                student_id: request.student_id,
                teacher_id: request.teacher_id,
                subject_id: request.subject_id,
                slot,
                rate: rate.clone(),
                created_by_id: actor.id,
                notes: request.notes.clone(),
            })
            .collect();

        let bookings = self.repos.bookings().create_many(inputs, actor).await?;

        info!(
            teacher_id = %request.teacher_id,
            student_id = %request.student_id,
            count = bookings.len(),
            hourly_rate = rate.hourly_rate(),
            currency = rate.rate_currency.as_str(),
            "Booking request submitted"
        );

        for booking in &bookings {
            dispatch(
                &self.notifier,
                BookingNotification::Requested {
                    booking: booking.clone(),
                },
            )
            .await;
        }

        Ok(bookings)
    }

    /// Teacher accepts a pending booking; its teaching session is
    /// created at the same time.
    pub async fn approve(&self, booking_id: Uuid, actor: &Actor) -> TutorResult<Booking> {
        let booking = self.repos.bookings().get_by_id(booking_id).await?;
        if actor.id != booking.teacher_id {
            return Err(BookingError::NotBookingTeacher.into());
        }
        ensure_transition(&booking, BookingStatus::Approved, "approved")?;

        let session = SessionEffect::Create(CreateTeachingSession {
            booking_id: booking.id,
            teacher_id: booking.teacher_id,
            student_id: booking.student_id,
            subject_id: booking.subject_id,
            session_date: booking.booking_date,
            start_time: booking.start_time,
            end_time: booking.end_time,
        });
        let updated = self
            .apply(
                &booking,
                BookingStatus::Approved,
                actor,
                None,
                session,
                HistoryAction::Approved,
            )
            .await?;

        dispatch(
            &self.notifier,
            BookingNotification::Approved {
                booking: updated.clone(),
            },
        )
        .await;

        Ok(updated)
    }

    pub async fn reject(
        &self,
        booking_id: Uuid,
        actor: &Actor,
        reason: Option<String>,
    ) -> TutorResult<Booking> {
        let booking = self.repos.bookings().get_by_id(booking_id).await?;
        if actor.id != booking.teacher_id {
            return Err(BookingError::NotBookingTeacher.into());
        }
        ensure_transition(&booking, BookingStatus::Rejected, "rejected")?;

        let updated = self
            .apply(
                &booking,
                BookingStatus::Rejected,
                actor,
                reason,
                SessionEffect::None,
                HistoryAction::Rejected,
            )
            .await?;

        dispatch(
            &self.notifier,
            BookingNotification::Rejected {
                booking: updated.clone(),
            },
        )
        .await;

        Ok(updated)
    }

    /// Teacher moves a booking. The status is kept.
    pub async fn reschedule(
        &self,
        booking_id: Uuid,
        actor: &Actor,
        request: RescheduleRequest,
    ) -> TutorResult<Booking> {
        let booking = self.repos.bookings().get_by_id(booking_id).await?;
        if actor.id != booking.teacher_id {
            return Err(BookingError::NotBookingTeacher.into());
        }

        self.reschedule_booking(&booking, actor, request.schedule(), request.reason)
            .await
    }

    /// Cancel on behalf of the student, the creator or the teacher.
    /// An existing teaching session is cancelled with it.
    pub async fn cancel(
        &self,
        booking_id: Uuid,
        actor: &Actor,
        reason: Option<String>,
    ) -> TutorResult<Booking> {
        let booking = self.repos.bookings().get_by_id(booking_id).await?;
        if !booking.is_participant(actor.id) {
            return Err(BookingError::NotParticipant.into());
        }
        ensure_transition(&booking, BookingStatus::Cancelled, "cancelled")?;

        let session = if has_session(booking.status) {
            SessionEffect::SetStatus(TeachingSessionStatus::Cancelled)
        } else {
            SessionEffect::None
        };
        let updated = self
            .apply(
                &booking,
                BookingStatus::Cancelled,
                actor,
                reason,
                session,
                HistoryAction::Cancelled,
            )
            .await?;

        dispatch(
            &self.notifier,
            BookingNotification::Cancelled {
                booking: updated.clone(),
            },
        )
        .await;

        Ok(updated)
    }

    /// Student side confirms an approved booking once payment cleared.
    pub async fn confirm(&self, booking_id: Uuid, actor: &Actor) -> TutorResult<Booking> {
        let booking = self.repos.bookings().get_by_id(booking_id).await?;
        if !booking.is_student_side(actor.id) {
            return Err(BookingError::NotStudentSide.into());
        }
        ensure_transition(&booking, BookingStatus::Confirmed, "confirmed")?;

        let updated = self
            .apply(
                &booking,
                BookingStatus::Confirmed,
                actor,
                None,
                SessionEffect::None,
                HistoryAction::Confirmed,
            )
            .await?;

        dispatch(
            &self.notifier,
            BookingNotification::Confirmed {
                booking: updated.clone(),
            },
        )
        .await;

        Ok(updated)
    }

    pub async fn complete(&self, booking_id: Uuid, actor: &Actor) -> TutorResult<Booking> {
        let booking = self.repos.bookings().get_by_id(booking_id).await?;
        if actor.id != booking.teacher_id {
            return Err(BookingError::NotBookingTeacher.into());
        }
        ensure_transition(&booking, BookingStatus::Completed, "completed")?;

        let updated = self
            .apply(
                &booking,
                BookingStatus::Completed,
                actor,
                None,
                SessionEffect::SetStatus(TeachingSessionStatus::Completed),
                HistoryAction::Completed,
            )
            .await?;

        dispatch(
            &self.notifier,
            BookingNotification::Completed {
                booking: updated.clone(),
            },
        )
        .await;

        Ok(updated)
    }

    pub async fn get(&self, booking_id: Uuid) -> TutorResult<Booking> {
        self.repos.bookings().get_by_id(booking_id).await
    }

    pub async fn list_for_teacher(
        &self,
        teacher_id: Uuid,
        filter: BookingFilter,
        pagination: Pagination,
    ) -> TutorResult<PaginatedResult<Booking>> {
        self.repos
            .bookings()
            .list_for_teacher(teacher_id, filter, pagination)
            .await
    }

    pub async fn list_for_student(
        &self,
        student_id: Uuid,
        filter: BookingFilter,
        pagination: Pagination,
    ) -> TutorResult<PaginatedResult<Booking>> {
        self.repos
            .bookings()
            .list_for_student(student_id, filter, pagination)
            .await
    }

    pub async fn history(&self, booking_id: Uuid) -> TutorResult<Vec<BookingHistory>> {
        self.repos.history().list_for_booking(booking_id).await
    }

    pub async fn session(&self, booking_id: Uuid) -> TutorResult<Option<TeachingSession>> {
        self.repos.sessions().get_by_booking(booking_id).await
    }

    /// The teacher sets the meeting link and notes; the student side
    /// leaves a rating.
    pub async fn update_session(
        &self,
        booking_id: Uuid,
        actor: &Actor,
        input: UpdateTeachingSession,
    ) -> TutorResult<TeachingSession> {
        let booking = self.repos.bookings().get_by_id(booking_id).await?;
        if !booking.is_participant(actor.id) {
            return Err(BookingError::NotParticipant.into());
        }
        let teacher_fields = input.meeting_link.is_some() || input.teacher_notes.is_some();
        if teacher_fields && actor.id != booking.teacher_id {
            return Err(BookingError::NotBookingTeacher.into());
        }
        if let Some(rating) = input.student_rating {
            if !booking.is_student_side(actor.id) {
                return Err(BookingError::NotStudentSide.into());
            }
            if !(1..=5).contains(&rating) {
                return Err(BookingError::InvalidRating.into());
            }
        }

        self.repos.sessions().update_details(booking_id, input).await
    }

    /// Shared by the teacher's direct reschedule and approved
    /// modification requests.
    pub(crate) async fn reschedule_booking(
        &self,
        booking: &Booking,
        actor: &Actor,
        schedule: BookingSchedule,
        reason: Option<String>,
    ) -> TutorResult<Booking> {
        validate_schedule(&schedule, Utc::now().date_naive())?;
        if !booking.status.is_reschedulable() {
            return Err(BookingError::InvalidStatus {
                action: "rescheduled",
                status: booking.status,
            }
            .into());
        }

        let previous = booking.schedule();
        let history = CreateBookingHistory::new(booking.id, HistoryAction::Rescheduled, actor)
            .with_data(Some(schedule_json(&previous)), Some(schedule_json(&schedule)))
            .with_notes(reason);

        let updated = self
            .repos
            .bookings()
            .reschedule(booking, BookingReschedule { schedule, history })
            .await?
            .ok_or(BookingError::StaleBooking)?;

        info!(
            booking_id = %booking.id,
            from = %previous,
            to = %schedule,
            performed_by = %actor.id,
            "Booking rescheduled"
        );

        dispatch(
            &self.notifier,
            BookingNotification::Rescheduled {
                booking: updated.clone(),
                previous,
            },
        )
        .await;

        Ok(updated)
    }

    async fn apply(
        &self,
        booking: &Booking,
        status: BookingStatus,
        actor: &Actor,
        reason: Option<String>,
        session: SessionEffect,
        action: HistoryAction,
    ) -> TutorResult<Booking> {
        let history = CreateBookingHistory::new(booking.id, action, actor)
            .with_data(
                Some(json!({ "status": booking.status.as_str() })),
                Some(json!({ "status": status.as_str() })),
            )
            .with_notes(reason.clone());

        let updated = self
            .repos
            .bookings()
            .transition(
                booking,
                BookingTransition {
                    status,
                    actor_id: actor.id,
                    reason,
                    session,
                    history,
                },
            )
            .await?
            .ok_or(BookingError::StaleBooking)?;

        info!(
            booking_id = %booking.id,
            from = %booking.status,
            to = %status,
            performed_by = %actor.id,
            "Booking status changed"
        );

        Ok(updated)
    }
}

fn ensure_transition(
    booking: &Booking,
    next: BookingStatus,
    action: &'static str,
) -> Result<(), BookingError> {
    if booking.status.can_transition_to(next) {
        Ok(())
    } else {
        Err(BookingError::InvalidStatus {
            action,
            status: booking.status,
        })
    }
}

/// Whether a booking in `status` already has a teaching session.
fn has_session(status: BookingStatus) -> bool {
    matches!(status, BookingStatus::Approved | BookingStatus::Confirmed)
}

/// A new date must lie after `today` and the range must cover at least
/// one whole minute.
pub(crate) fn validate_schedule(
    schedule: &BookingSchedule,
    today: NaiveDate,
) -> Result<(), BookingError> {
    if schedule.date <= today {
        return Err(BookingError::DateNotInFuture);
    }
    if !is_whole_minute(schedule.start_time) || !is_whole_minute(schedule.end_time) {
        return Err(BookingError::SubMinuteTime);
    }
    if schedule.end_time <= schedule.start_time {
        return Err(BookingError::InvalidTimeRange);
    }
    Ok(())
}

fn schedule_json(schedule: &BookingSchedule) -> serde_json::Value {
    json!({
        "booking_date": schedule.date.format("%Y-%m-%d").to_string(),
        "start_time": schedule.start_time.format("%H:%M").to_string(),
        "end_time": schedule.end_time.format("%H:%M").to_string(),
    })
}
