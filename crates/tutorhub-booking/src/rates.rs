//! Rate locking: freezing a teacher's pricing onto new bookings.

use chrono::{DateTime, Utc};
use tracing::warn;
use tutorhub_core::models::booking::RateLock;
use tutorhub_core::models::teacher::{Currency, TeacherProfile};
use uuid::Uuid;

use crate::error::BookingError;

/// Source of the NGN-per-USD exchange rate.
pub trait ExchangeRateProvider: Send + Sync {
    fn ngn_per_usd(&self) -> impl Future<Output = Result<f64, BookingError>> + Send;
}

/// Provider returning a configured constant.
#[derive(Debug, Clone, Copy)]
pub struct FixedExchangeRate {
    ngn_per_usd: f64,
}

impl FixedExchangeRate {
    pub fn new(ngn_per_usd: f64) -> Self {
        Self { ngn_per_usd }
    }
}

impl ExchangeRateProvider for FixedExchangeRate {
    async fn ngn_per_usd(&self) -> Result<f64, BookingError> {
        Ok(self.ngn_per_usd)
    }
}

/// Builds the [`RateLock`] stamped on each booking of one request.
pub struct RateLocker<X: ExchangeRateProvider> {
    provider: X,
    allow_unpriced: bool,
}

impl<X: ExchangeRateProvider> RateLocker<X> {
    pub fn new(provider: X, allow_unpriced: bool) -> Self {
        Self {
            provider,
            allow_unpriced,
        }
    }

    /// Lock the teacher's current rates.
    ///
    /// Without a profile, or with a profile that sets neither rate, the
    /// request is refused unless unpriced bookings are allowed, in which
    /// case zero rates are locked.
    pub async fn lock(
        &self,
        teacher_id: Uuid,
        profile: Option<&TeacherProfile>,
    ) -> Result<RateLock, BookingError> {
        let exchange_rate = self.provider.ngn_per_usd().await?;
        if !exchange_rate.is_finite() || exchange_rate <= 0.0 {
            return Err(BookingError::ExchangeRate(format!(
                "invalid NGN/USD rate {exchange_rate}"
            )));
        }

        let priced = profile
            .filter(|p| p.hourly_rate_ngn.is_some() || p.hourly_rate_usd.is_some());
        match priced {
            Some(profile) => Ok(lock_rates(profile, exchange_rate, Utc::now())),
            None if self.allow_unpriced => {
                warn!(
                    teacher_id = %teacher_id,
                    has_profile = profile.is_some(),
                    "Teacher has no hourly rate, locking zero rates"
                );
                Ok(RateLock {
                    hourly_rate_ngn: 0.0,
                    hourly_rate_usd: 0.0,
                    rate_currency: Currency::Ngn,
                    exchange_rate_used: exchange_rate,
                    rate_locked_at: Utc::now(),
                })
            }
            None => Err(BookingError::MissingTeacherProfile),
        }
    }
}

/// Freeze `profile`'s rates. A missing side of the NGN/USD pair is
/// derived from the other one.
pub fn lock_rates(profile: &TeacherProfile, ngn_per_usd: f64, now: DateTime<Utc>) -> RateLock {
    let (ngn, usd) = match (profile.hourly_rate_ngn, profile.hourly_rate_usd) {
        (Some(ngn), Some(usd)) => (ngn, usd),
        (Some(ngn), None) => (ngn, round_cents(ngn / ngn_per_usd)),
        (None, Some(usd)) => (round_cents(usd * ngn_per_usd), usd),
        (None, None) => (0.0, 0.0),
    };

    RateLock {
        hourly_rate_ngn: ngn,
        hourly_rate_usd: usd,
        rate_currency: profile.preferred_currency,
        exchange_rate_used: ngn_per_usd,
        rate_locked_at: now,
    }
}

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
