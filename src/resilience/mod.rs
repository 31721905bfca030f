//! Retry and backoff.
//!
//! Destination resolution and appends both run under a [`RetryPolicy`],
//! whose sleep between attempts is supplied by an [`IntervalProvider`].

mod interval;
mod retry;

pub use interval::{
    no_delay, ExponentialInterval, IntervalProvider, SharedIntervalProvider, TimeUnit,
};
pub use retry::{RetryPolicy, DEFAULT_RETRIES};
