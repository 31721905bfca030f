//! Backoff interval providers.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{ConfigurationError, LogsError};

/// Computes the delay to wait before a retry.
///
/// Implementations must be pure: the same attempt always yields the same
/// duration. Closures `Fn(u32) -> Duration` implement this trait.
pub trait IntervalProvider: Send + Sync {
    /// Delay before retry number `attempt`.
    fn get_interval(&self, attempt: u32) -> Duration;
}

impl<F> IntervalProvider for F
where
    F: Fn(u32) -> Duration + Send + Sync,
{
    fn get_interval(&self, attempt: u32) -> Duration {
        self(attempt)
    }
}

/// Shared handle to an interval provider.
pub type SharedIntervalProvider = Arc<dyn IntervalProvider>;

/// Interval provider that never waits.
pub fn no_delay() -> SharedIntervalProvider {
    Arc::new(|_: u32| Duration::ZERO)
}

/// Unit an interval value is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeUnit {
    /// Seconds.
    #[default]
    Seconds,
    /// Minutes.
    Minutes,
    /// Hours.
    Hours,
}

impl TimeUnit {
    fn seconds_per_unit(self) -> f64 {
        match self {
            TimeUnit::Seconds => 1.0,
            TimeUnit::Minutes => 60.0,
            TimeUnit::Hours => 3600.0,
        }
    }

    /// Interpret `value` in this unit. Saturates at [`Duration::MAX`].
    pub fn to_duration(self, value: f64) -> Duration {
        let secs = value * self.seconds_per_unit();
        if secs.is_nan() || secs <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TimeUnit::Seconds => "seconds",
            TimeUnit::Minutes => "minutes",
            TimeUnit::Hours => "hours",
        })
    }
}

impl FromStr for TimeUnit {
    type Err = LogsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "s" | "sec" | "secs" | "second" | "seconds" => Ok(TimeUnit::Seconds),
            "m" | "min" | "mins" | "minute" | "minutes" => Ok(TimeUnit::Minutes),
            "h" | "hour" | "hours" => Ok(TimeUnit::Hours),
            other => Err(LogsError::Configuration(
                ConfigurationError::InvalidConfiguration {
                    field: "backoff_unit".to_string(),
                    message: format!("unknown time unit '{}'", other),
                },
            )),
        }
    }
}

/// `unit(base ^ attempt)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialInterval {
    base: f64,
    unit: TimeUnit,
}

impl ExponentialInterval {
    /// Create an exponential interval.
    pub fn new(base: f64, unit: TimeUnit) -> Self {
        Self { base, unit }
    }

    /// Base of the exponent.
    pub fn base(&self) -> f64 {
        self.base
    }

    /// Unit the result is expressed in.
    pub fn unit(&self) -> TimeUnit {
        self.unit
    }
}

impl Default for ExponentialInterval {
    fn default() -> Self {
        Self::new(2.0, TimeUnit::Seconds)
    }
}

impl IntervalProvider for ExponentialInterval {
    fn get_interval(&self, attempt: u32) -> Duration {
        self.unit.to_duration(self.base.powf(f64::from(attempt)))
    }
}
