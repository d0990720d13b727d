//! Server configuration from `TUTORHUB_*` environment variables.

use std::str::FromStr;

use tutorhub_booking::BookingConfig;
use tutorhub_db::DbConfig;

/// Upper bound for `TUTORHUB_DRAFT_LIFETIME_SECS` (30 days).
const MAX_DRAFT_LIFETIME_SECS: u64 = 30 * 24 * 60 * 60;

/// Configuration error for a single environment variable.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?} ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Everything the server needs at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub db: DbConfig,
    pub booking: BookingConfig,
    /// Seconds between expired-draft purges (default: 300).
    pub housekeeping_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db: DbConfig::default(),
            booking: BookingConfig::default(),
            housekeeping_interval_secs: 300,
        }
    }
}

impl ServerConfig {
    /// Read the process environment. Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("TUTORHUB_DB_URL") {
            config.db.url = url;
        }
        if let Some(namespace) = lookup("TUTORHUB_DB_NAMESPACE") {
            config.db.namespace = namespace;
        }
        if let Some(database) = lookup("TUTORHUB_DB_DATABASE") {
            config.db.database = database;
        }
        if let Some(username) = lookup("TUTORHUB_DB_USERNAME") {
            config.db.username = username;
        }
        if let Some(password) = lookup("TUTORHUB_DB_PASSWORD") {
            config.db.password = password;
        }

        if let Some(rate) = parsed::<f64>(&lookup, "TUTORHUB_NGN_PER_USD")? {
            if !rate.is_finite() || rate <= 0.0 {
                return Err(ConfigError::Invalid {
                    var: "TUTORHUB_NGN_PER_USD",
                    value: rate.to_string(),
                    reason: "must be a positive number".into(),
                });
            }
            config.booking.ngn_per_usd = rate;
        }
        if let Some(allow) = parsed::<bool>(&lookup, "TUTORHUB_ALLOW_UNPRICED_BOOKINGS")? {
            config.booking.allow_unpriced_bookings = allow;
        }
        if let Some(secs) = parsed::<u64>(&lookup, "TUTORHUB_DRAFT_LIFETIME_SECS")? {
            if secs == 0 || secs > MAX_DRAFT_LIFETIME_SECS {
                return Err(ConfigError::Invalid {
                    var: "TUTORHUB_DRAFT_LIFETIME_SECS",
                    value: secs.to_string(),
                    reason: format!("must be between 1 and {MAX_DRAFT_LIFETIME_SECS}"),
                });
            }
            config.booking.draft_lifetime_secs = secs;
        }
        if let Some(secs) = parsed::<u64>(&lookup, "TUTORHUB_HOUSEKEEPING_INTERVAL_SECS")? {
            if secs == 0 {
                return Err(ConfigError::Invalid {
                    var: "TUTORHUB_HOUSEKEEPING_INTERVAL_SECS",
                    value: secs.to_string(),
                    reason: "must be at least 1".into(),
                });
            }
            config.housekeeping_interval_secs = secs;
        }

        Ok(config)
    }
}

fn parsed<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = lookup(var) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<T>()
        .map(Some)
        .map_err(|e| ConfigError::Invalid {
            var,
            value: raw.clone(),
            reason: e.to_string(),
        })
}
