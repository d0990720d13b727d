//! Booking service configuration.

/// Configuration for the booking services.
#[derive(Debug, Clone)]
pub struct BookingConfig {
    /// Minimum score a pending booking needs to be recommended (0–100).
    pub recommendation_threshold: u32,
    /// Maximum number of recommendations returned.
    pub recommendation_limit: usize,
    /// Booking draft lifetime in seconds (default: 3600 = 1 hour).
    pub draft_lifetime_secs: u64,
    /// Accept bookings for teachers without a pricing profile, locking
    /// zero rates. Every such booking is logged as a warning.
    pub allow_unpriced_bookings: bool,
    /// NGN per USD used by [`FixedExchangeRate`](crate::FixedExchangeRate).
    pub ngn_per_usd: f64,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            recommendation_threshold: 70,
            recommendation_limit: 10,
            draft_lifetime_secs: 3600,
            allow_unpriced_bookings: false,
            ngn_per_usd: 1500.0,
        }
    }
}
