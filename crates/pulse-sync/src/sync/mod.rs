//! Polling subscriptions.
//!
//! A subscription re-reads one query on a fixed interval while its owner
//! keeps the [`SubscriptionHandle`] alive and enabled.

mod scheduler;

pub use scheduler::{PollConfig, SubscriptionHandle, SubscriptionState};
