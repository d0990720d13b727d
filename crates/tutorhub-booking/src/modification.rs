//! Modification requests: reschedule or rebook proposals that the other
//! party of a booking approves or rejects.

use chrono::Utc;
use tracing::{error, info};
use tutorhub_core::error::{TutorError, TutorResult};
use tutorhub_core::models::Actor;
use tutorhub_core::models::availability::day_of_week;
use tutorhub_core::models::booking::{
    Booking, BookingSchedule, BookingSlot, BookingStatus, CreateBooking,
};
use tutorhub_core::models::booking_modification::{
    BookingModification, CreateBookingModification, ModificationKind, ModificationStatus,
    ResolveModification,
};
use tutorhub_core::repository::{
    AvailabilityRepository, BookingModificationRepository, BookingRepository, Repositories,
    TeacherProfileRepository,
};
use uuid::Uuid;

use crate::error::BookingError;
use crate::notify::{BookingNotification, Notifier, dispatch};
use crate::rates::ExchangeRateProvider;
use crate::service::{BookingService, validate_schedule};

/// A proposed change to an existing booking.
#[derive(Debug, Clone)]
pub struct ModificationRequest {
    pub kind: ModificationKind,
    pub proposed: BookingSchedule,
    pub reason: Option<String>,
}

/// Result of approving a request: the answered request and the booking
/// it produced (the moved booking, or the new one for a rebook).
#[derive(Debug, Clone)]
pub struct ModificationOutcome {
    pub modification: BookingModification,
    pub booking: Booking,
}

impl<R: Repositories, X: ExchangeRateProvider, N: Notifier> BookingService<R, X, N> {
    pub async fn request_modification(
        &self,
        booking_id: Uuid,
        actor: &Actor,
        request: ModificationRequest,
    ) -> TutorResult<BookingModification> {
        let booking = self.repos.bookings().get_by_id(booking_id).await?;
        if !booking.is_participant(actor.id) {
            return Err(BookingError::NotParticipant.into());
        }

        let allowed = match request.kind {
            ModificationKind::Reschedule => booking.status.is_reschedulable(),
            ModificationKind::Rebook => matches!(
                booking.status,
                BookingStatus::Approved | BookingStatus::Confirmed | BookingStatus::Completed
            ),
        };
        if !allowed {
            let action = match request.kind {
                ModificationKind::Reschedule => "rescheduled",
                ModificationKind::Rebook => "rebooked",
            };
            return Err(BookingError::InvalidStatus {
                action,
                status: booking.status,
            }
            .into());
        }
        validate_schedule(&request.proposed, Utc::now().date_naive())?;

        let modification = self
            .repos
            .modifications()
            .create(CreateBookingModification {
                booking_id,
                requested_by_id: actor.id,
                kind: request.kind,
                proposed: request.proposed,
                reason: request.reason,
            })
            .await?
            .ok_or(BookingError::ModificationAlreadyPending)?;

        info!(
            modification_id = %modification.id,
            booking_id = %booking_id,
            kind = modification.kind.as_str(),
            requested_by = %actor.id,
            "Booking modification requested"
        );

        dispatch(
            &self.notifier,
            BookingNotification::ModificationRequested {
                booking,
                modification: modification.clone(),
            },
        )
        .await;

        Ok(modification)
    }

    /// Counterparty accepts the request, which is then applied. If
    /// applying fails the request goes back to pending.
    pub async fn approve_modification(
        &self,
        modification_id: Uuid,
        actor: &Actor,
        note: Option<String>,
    ) -> TutorResult<ModificationOutcome> {
        let (modification, booking) = self.load_for_answer(modification_id, actor).await?;

        let claimed = self
            .repos
            .modifications()
            .resolve(
                modification.id,
                ResolveModification {
                    status: ModificationStatus::Approved,
                    responded_by_id: actor.id,
                    response_note: note,
                },
            )
            .await?
            .ok_or(BookingError::ModificationNotPending)?;

        let applied = match claimed.kind {
            ModificationKind::Reschedule => {
                self.reschedule_booking(
                    &booking,
                    actor,
                    claimed.proposed_schedule(),
                    claimed.reason.clone(),
                )
                .await
            }
            ModificationKind::Rebook => self.rebook(&booking, &claimed, actor).await,
        };

        let result = match applied {
            Ok(result) => result,
            Err(e) => {
                if let Err(reopen_err) = self.repos.modifications().reopen(claimed.id).await {
                    error!(
                        modification_id = %claimed.id,
                        error = %reopen_err,
                        "Failed to reopen modification request"
                    );
                }
                return Err(e);
            }
        };

        let modification = match claimed.kind {
            ModificationKind::Rebook => {
                self.repos
                    .modifications()
                    .set_resulting_booking(claimed.id, result.id)
                    .await?
            }
            ModificationKind::Reschedule => claimed,
        };

        info!(
            modification_id = %modification.id,
            booking_id = %result.id,
            kind = modification.kind.as_str(),
            approved_by = %actor.id,
            "Booking modification approved"
        );

        dispatch(
            &self.notifier,
            BookingNotification::ModificationAnswered {
                booking: result.clone(),
                modification: modification.clone(),
            },
        )
        .await;

        Ok(ModificationOutcome {
            modification,
            booking: result,
        })
    }

    pub async fn reject_modification(
        &self,
        modification_id: Uuid,
        actor: &Actor,
        note: Option<String>,
    ) -> TutorResult<BookingModification> {
        let (modification, booking) = self.load_for_answer(modification_id, actor).await?;

        let rejected = self
            .repos
            .modifications()
            .resolve(
                modification.id,
                ResolveModification {
                    status: ModificationStatus::Rejected,
                    responded_by_id: actor.id,
                    response_note: note,
                },
            )
            .await?
            .ok_or(BookingError::ModificationNotPending)?;

        info!(
            modification_id = %rejected.id,
            rejected_by = %actor.id,
            "Booking modification rejected"
        );

        dispatch(
            &self.notifier,
            BookingNotification::ModificationAnswered {
                booking,
                modification: rejected.clone(),
            },
        )
        .await;

        Ok(rejected)
    }

    pub async fn withdraw_modification(
        &self,
        modification_id: Uuid,
        actor: &Actor,
    ) -> TutorResult<BookingModification> {
        let modification = self.repos.modifications().get_by_id(modification_id).await?;
        if modification.requested_by_id != actor.id {
            return Err(BookingError::NotRequester.into());
        }

        let withdrawn = self
            .repos
            .modifications()
            .resolve(
                modification.id,
                ResolveModification {
                    status: ModificationStatus::Withdrawn,
                    responded_by_id: actor.id,
                    response_note: None,
                },
            )
            .await?
            .ok_or(BookingError::ModificationNotPending)?;

        info!(modification_id = %withdrawn.id, "Booking modification withdrawn");

        Ok(withdrawn)
    }

    pub async fn list_modifications(
        &self,
        booking_id: Uuid,
    ) -> TutorResult<Vec<BookingModification>> {
        self.repos.modifications().list_for_booking(booking_id).await
    }

    /// Load a pending request and check that `actor` is the party who
    /// has to answer it.
    async fn load_for_answer(
        &self,
        modification_id: Uuid,
        actor: &Actor,
    ) -> TutorResult<(BookingModification, Booking)> {
        let modification = self.repos.modifications().get_by_id(modification_id).await?;
        if modification.status != ModificationStatus::Pending {
            return Err(BookingError::ModificationNotPending.into());
        }

        let booking = self
            .repos
            .bookings()
            .get_by_id(modification.booking_id)
            .await?;
        let answers = if booking.is_student_side(modification.requested_by_id) {
            actor.id == booking.teacher_id
        } else {
            booking.is_student_side(actor.id)
        };
        if !answers || actor.id == modification.requested_by_id {
            return Err(BookingError::NotCounterparty.into());
        }

        Ok((modification, booking))
    }

    /// New pending booking with the same parties and subject at the
    /// proposed time, priced at the teacher's current rates.
    async fn rebook(
        &self,
        original: &Booking,
        modification: &BookingModification,
        actor: &Actor,
    ) -> TutorResult<Booking> {
        let schedule = modification.proposed_schedule();
        validate_schedule(&schedule, Utc::now().date_naive())?;

        let profile = self.repos.profiles().find(original.teacher_id).await?;
        if profile.as_ref().is_some_and(|p| p.holiday_mode) {
            return Err(BookingError::TeacherUnavailable.into());
        }

        let weekday = day_of_week(schedule.date);
        let window = self
            .repos
            .availability()
            .list_for_teacher(original.teacher_id)
            .await?
            .into_iter()
            .find(|w| {
                w.is_active
                    && w.day_of_week == weekday
                    && w.start_time <= schedule.start_time
                    && w.end_time >= schedule.end_time
            })
            .ok_or(BookingError::OutsideAvailability)?;

        let rate = self.rates.lock(original.teacher_id, profile.as_ref()).await?;

        let created = self
            .repos
            .bookings()
            .create_many(
                vec![CreateBooking {
                    student_id: original.student_id,
                    teacher_id: original.teacher_id,
                    subject_id: original.subject_id,
                    slot: BookingSlot {
                        availability_id: window.id,
                        date: schedule.date,
                        start_time: schedule.start_time,
                        end_time: schedule.end_time,
                        duration_minutes: schedule.duration_minutes(),
                    },
                    rate,
                    created_by_id: original.created_by_id,
                    notes: original.notes.clone(),
                }],
                actor,
            )
            .await?;

        let booking = created
            .into_iter()
            .next()
            .ok_or_else(|| TutorError::Internal("rebook created no booking".into()))?;

        dispatch(
            &self.notifier,
            BookingNotification::Requested {
                booking: booking.clone(),
            },
        )
        .await;

        Ok(booking)
    }
}
