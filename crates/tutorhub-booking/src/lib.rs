//! TutorHub Booking — slot resolution, rate locking, the booking
//! lifecycle, modification requests, drafts and teacher matching.

pub mod availability;
pub mod config;
pub mod draft;
pub mod error;
pub mod modification;
pub mod notify;
pub mod rates;
pub mod recommend;
pub mod service;
pub mod slots;

pub use availability::AvailabilityService;
pub use config::BookingConfig;
pub use error::BookingError;
pub use modification::{ModificationOutcome, ModificationRequest};
pub use notify::{BookingNotification, Notifier, NotifyError, TracingNotifier};
pub use rates::{ExchangeRateProvider, FixedExchangeRate, RateLocker};
pub use recommend::{Recommendation, RecommendationService};
pub use service::{BookingService, CreateBookingRequest, RescheduleRequest};
