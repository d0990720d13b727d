//! Notification seam for booking events.
//!
//! Delivery (e-mail, push) lives outside this crate. Failures are
//! logged and never fail the operation that triggered them.

use thiserror::Error;
use tracing::{info, warn};
use tutorhub_core::models::booking::{Booking, BookingSchedule};
use tutorhub_core::models::booking_modification::BookingModification;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification delivery failed: {0}")]
    Delivery(String),
}

/// A booking event both parties are told about.
#[derive(Debug, Clone)]
pub enum BookingNotification {
    Requested {
        booking: Booking,
    },
    Approved {
        booking: Booking,
    },
    Rejected {
        booking: Booking,
    },
    Rescheduled {
        booking: Booking,
        previous: BookingSchedule,
    },
    Cancelled {
        booking: Booking,
    },
    Confirmed {
        booking: Booking,
    },
    Completed {
        booking: Booking,
    },
    ModificationRequested {
        booking: Booking,
        modification: BookingModification,
    },
    ModificationAnswered {
        booking: Booking,
        modification: BookingModification,
    },
}

impl BookingNotification {
    pub fn kind(&self) -> &'static str {
        match self {
            BookingNotification::Requested { .. } => "booking_requested",
            BookingNotification::Approved { .. } => "booking_approved",
            BookingNotification::Rejected { .. } => "booking_rejected",
            BookingNotification::Rescheduled { .. } => "booking_rescheduled",
            BookingNotification::Cancelled { .. } => "booking_cancelled",
            BookingNotification::Confirmed { .. } => "booking_confirmed",
            BookingNotification::Completed { .. } => "booking_completed",
            BookingNotification::ModificationRequested { .. } => "modification_requested",
            BookingNotification::ModificationAnswered { .. } => "modification_answered",
        }
    }

    pub fn booking(&self) -> &Booking {
        match self {
            BookingNotification::Requested { booking }
            | BookingNotification::Approved { booking }
            | BookingNotification::Rejected { booking }
            | BookingNotification::Rescheduled { booking, .. }
            | BookingNotification::Cancelled { booking }
            | BookingNotification::Confirmed { booking }
            | BookingNotification::Completed { booking }
            | BookingNotification::ModificationRequested { booking, .. }
            | BookingNotification::ModificationAnswered { booking, .. } => booking,
        }
    }

    /// Teacher, student and (when different) the guardian who booked.
    pub fn recipients(&self) -> Vec<Uuid> {
        let booking = self.booking();
        let mut recipients = vec![booking.teacher_id, booking.student_id];
        if !recipients.contains(&booking.created_by_id) {
            recipients.push(booking.created_by_id);
        }
        recipients
    }
}

/// Delivers booking notifications.
pub trait Notifier: Send + Sync {
    fn notify(
        &self,
        notification: &BookingNotification,
    ) -> impl Future<Output = Result<(), NotifyError>> + Send;
}

/// Notifier that only records the event in the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    async fn notify(&self, notification: &BookingNotification) -> Result<(), NotifyError> {
        let booking = notification.booking();
        info!(
            kind = notification.kind(),
            booking_id = %booking.id,
            booking_ref = %booking.booking_uuid,
            recipients = notification.recipients().len(),
            "Booking notification"
        );
        Ok(())
    }
}

/// Send `notification`, logging instead of propagating failures.
pub(crate) async fn dispatch<N: Notifier>(notifier: &N, notification: BookingNotification) {
    if let Err(e) = notifier.notify(&notification).await {
        warn!(
            kind = notification.kind(),
            booking_id = %notification.booking().id,
            error = %e,
            "Failed to deliver booking notification"
        );
    }
}
