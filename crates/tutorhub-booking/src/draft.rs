//! Booking drafts: the multi-step booking form's state, stored between
//! steps and submitted as one booking request.

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{info, warn};
use tutorhub_core::error::{TutorError, TutorResult};
use tutorhub_core::models::Actor;
use tutorhub_core::models::booking::Booking;
use tutorhub_core::models::booking_draft::{BookingDraft, CreateBookingDraft, UpdateBookingDraft};
use tutorhub_core::repository::{BookingDraftRepository, Repositories};
use uuid::Uuid;

use crate::error::BookingError;
use crate::notify::Notifier;
use crate::rates::ExchangeRateProvider;
use crate::service::{BookingService, CreateBookingRequest};

impl<R: Repositories, X: ExchangeRateProvider, N: Notifier> BookingService<R, X, N> {
    pub async fn start_draft(&self, owner_id: Uuid) -> TutorResult<BookingDraft> {
        let draft = self
            .repos
            .drafts()
            .create(CreateBookingDraft {
                owner_id,
                expires_at: self.draft_expiry(Utc::now())?,
            })
            .await?;

        info!(draft_id = %draft.id, owner_id = %owner_id, "Booking draft started");

        Ok(draft)
    }

    pub async fn get_draft(&self, draft_id: Uuid, owner_id: Uuid) -> TutorResult<BookingDraft> {
        let draft = self.repos.drafts().get_by_id(draft_id).await?;
        if draft.owner_id != owner_id {
            return Err(BookingError::NotDraftOwner.into());
        }
        Ok(draft)
    }

    /// Apply `patch` if the draft is still at `expected_version`. Each
    /// update pushes the expiry forward.
    pub async fn update_draft(
        &self,
        draft_id: Uuid,
        owner_id: Uuid,
        expected_version: u64,
        mut patch: UpdateBookingDraft,
    ) -> TutorResult<BookingDraft> {
        let now = Utc::now();
        let draft = self.get_draft(draft_id, owner_id).await?;
        if draft.is_expired(now) {
            return Err(BookingError::DraftExpired.into());
        }

        patch.expires_at = Some(self.draft_expiry(now)?);
        let updated = self
            .repos
            .drafts()
            .update(draft_id, expected_version, patch)
            .await?
            .ok_or(BookingError::StaleDraft)?;

        Ok(updated)
    }

    /// Turn a complete draft into bookings and remove it.
    pub async fn submit_draft(&self, draft_id: Uuid, actor: &Actor) -> TutorResult<Vec<Booking>> {
        let now = Utc::now();
        let draft = self.get_draft(draft_id, actor.id).await?;
        if draft.is_expired(now) {
            return Err(BookingError::DraftExpired.into());
        }

        let request = CreateBookingRequest {
            student_id: draft
                .student_id
                .ok_or(BookingError::DraftIncomplete("a student"))?,
            teacher_id: draft
                .teacher_id
                .ok_or(BookingError::DraftIncomplete("a teacher"))?,
            subject_id: draft
                .subject_id
                .ok_or(BookingError::DraftIncomplete("a subject"))?,
            dates: draft.dates.clone(),
            availability_ids: draft.availability_ids.clone(),
            notes: draft.notes.clone(),
        };
        if request.dates.is_empty() {
            return Err(BookingError::DraftIncomplete("dates").into());
        }
        if request.availability_ids.is_empty() {
            return Err(BookingError::DraftIncomplete("availability windows").into());
        }

        // Claim the draft so a second submit of the same version fails.
        self.repos
            .drafts()
            .update(draft.id, draft.version, UpdateBookingDraft::default())
            .await?
            .ok_or(BookingError::StaleDraft)?;

        let bookings = self.create(request, actor).await?;
        // The bookings exist now; a leftover draft is removed by the purge.
        if let Err(e) = self.repos.drafts().delete(draft.id).await {
            warn!(draft_id = %draft.id, error = %e, "Failed to delete submitted draft");
        }

        info!(
            draft_id = %draft.id,
            bookings = bookings.len(),
            "Booking draft submitted"
        );

        Ok(bookings)
    }

    /// Remove drafts whose expiry lies before `now`.
    pub async fn purge_expired_drafts(&self, now: DateTime<Utc>) -> TutorResult<u64> {
        self.repos.drafts().delete_expired(now).await
    }

    fn draft_expiry(&self, now: DateTime<Utc>) -> TutorResult<DateTime<Utc>> {
        let secs = self.config.draft_lifetime_secs;
        i64::try_from(secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| {
                TutorError::Internal(format!("draft lifetime of {secs}s is out of range"))
            })
    }
}
