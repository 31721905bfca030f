//! Destination resolution and sequence token tracking.
//!
//! [`TokenCache`] holds the token to present on the next append to each
//! destination; [`DestinationResolver`] fills it on first use and again
//! after an eviction.

mod cache;
mod resolver;

pub use cache::{TokenCache, TokenLease};
pub use resolver::DestinationResolver;
