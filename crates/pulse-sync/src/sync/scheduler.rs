//! Per-subscription polling.

use std::time::Duration;

use pulse_core::DashboardError;
use tokio::sync::watch;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tracing::{debug, info};
use uuid::Uuid;

use crate::cache::CacheKey;
use crate::client::QueryClient;
use crate::query::Query;

/// Configuration of one polling subscription.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollConfig {
    /// Interval between polls.
    pub interval: Duration,
    /// Consecutive failures tolerated before backing off.
    pub max_failures: u32,
    /// Backoff multiplier applied per failure past the threshold.
    pub backoff_multiplier: f64,
    /// Upper bound of the backed-off interval.
    pub max_backoff: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_failures: 3,
            backoff_multiplier: 2.0,
            max_backoff: Duration::from_secs(60),
        }
    }
}

impl PollConfig {
    /// Default backoff with the given interval.
    pub fn every(interval: Duration) -> Self {
        Self {
            interval,
            ..Self::default()
        }
    }
}

/// Lifecycle of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    /// Created, poller not started yet.
    Idle,
    /// Waiting for the next tick.
    Scheduled,
    /// A poll is running.
    Fetching,
    /// Paused; no ticks until re-enabled.
    Disabled,
    /// Terminal.
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Control {
    enabled: bool,
    stopped: bool,
}

/// Handle of a running subscription. Dropping it stops the poller.
///
/// Stopping or disabling never aborts a poll that is already running: its
/// result is still stored in the cache for other readers.
#[derive(Debug)]
pub struct SubscriptionHandle {
    id: Uuid,
    key: CacheKey,
    control: watch::Sender<Control>,
    state: watch::Receiver<SubscriptionState>,
}

impl SubscriptionHandle {
    /// Returns the subscription id, as used in logs.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the cache key being polled.
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Pauses or resumes polling. Resuming polls immediately.
    pub fn set_enabled(&self, enabled: bool) {
        self.control.send_if_modified(|control| {
            if control.enabled == enabled {
                return false;
            }
            control.enabled = enabled;
            true
        });
    }

    pub fn is_enabled(&self) -> bool {
        self.control.borrow().enabled
    }

    /// Stops the poller for good.
    pub fn stop(&self) {
        self.control.send_modify(|control| control.stopped = true);
    }

    /// Returns the current state.
    pub fn state(&self) -> SubscriptionState {
        *self.state.borrow()
    }

    /// Returns a receiver that is notified on every state change.
    pub fn state_changes(&self) -> watch::Receiver<SubscriptionState> {
        self.state.clone()
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

impl QueryClient {
    /// Polls `query` every `config.interval` while enabled.
    ///
    /// Each tick goes through [`QueryClient::fetch`], so a fresh cached
    /// value is not refetched and subscriptions on the same key share one
    /// request.
    pub fn subscribe<Q: Query>(
        &self,
        query: Q,
        config: PollConfig,
        enabled: bool,
    ) -> SubscriptionHandle {
        let id = Uuid::now_v7();
        let key = query.key();
        let (control_tx, control_rx) = watch::channel(Control {
            enabled,
            stopped: false,
        });
        let (state_tx, state_rx) = watch::channel(SubscriptionState::Idle);

        let poller = Poller {
            id,
            client: self.clone(),
            query,
            config,
            backoff: Backoff::new(config.interval),
            state: state_tx,
        };
        tokio::spawn(poller.run(control_rx));

        SubscriptionHandle {
            id,
            key,
            control: control_tx,
            state: state_rx,
        }
    }
}

/// Consecutive-failure backoff.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Backoff {
    failures: u32,
    period: Duration,
}

impl Backoff {
    fn new(interval: Duration) -> Self {
        Self {
            failures: 0,
            period: interval,
        }
    }

    /// Updates the period after a poll. Non-transient errors skip straight
    /// to the backoff threshold.
    fn record(&mut self, error: Option<&DashboardError>, config: &PollConfig) {
        let Some(error) = error else {
            *self = Self::new(config.interval);
            return;
        };

        self.failures = if error.is_transient() {
            self.failures + 1
        } else {
            (self.failures + 1).max(config.max_failures)
        };

        if self.failures >= config.max_failures {
            let next =
                Duration::from_secs_f64(self.period.as_secs_f64() * config.backoff_multiplier);
            self.period = next.min(config.max_backoff);
        }
    }
}

struct Poller<Q> {
    id: Uuid,
    client: QueryClient,
    query: Q,
    config: PollConfig,
    backoff: Backoff,
    state: watch::Sender<SubscriptionState>,
}

impl<Q: Query> Poller<Q> {
    async fn run(mut self, mut control: watch::Receiver<Control>) {
        let key = self.query.key();
        info!(
            subscription = %self.id,
            key = %key,
            interval = ?self.config.interval,
            "Starting subscription"
        );

        let initial = *control.borrow_and_update();
        let mut enabled = initial.enabled;
        let mut timer = timer(Instant::now(), self.backoff.period);

        if !initial.stopped {
            self.set_state(if enabled {
                SubscriptionState::Scheduled
            } else {
                SubscriptionState::Disabled
            });

            loop {
                tokio::select! {
                    // A stop that arrived during a slow poll wins over a due tick.
                    biased;

                    changed = control.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let current = *control.borrow_and_update();
                        if current.stopped {
                            break;
                        }
                        if current.enabled != enabled {
                            enabled = current.enabled;
                            if enabled {
                                timer.reset_immediately();
                                self.set_state(SubscriptionState::Scheduled);
                            } else {
                                self.set_state(SubscriptionState::Disabled);
                            }
                        }
                    }
                    _ = timer.tick(), if enabled => {
                        self.poll_once().await;

                        if self.backoff.period != timer.period() {
                            debug!(
                                subscription = %self.id,
                                period = ?self.backoff.period,
                                failures = self.backoff.failures,
                                "Adjusted polling interval"
                            );
                            timer = timer_after(self.backoff.period);
                        }
                    }
                }
            }
        }

        self.set_state(SubscriptionState::Stopped);
        info!(subscription = %self.id, key = %key, "Subscription stopped");
    }

    async fn poll_once(&mut self) {
        self.set_state(SubscriptionState::Fetching);

        let result = self.client.fetch(&self.query).await;
        if let Err(e) = &result {
            debug!(subscription = %self.id, error = %e, "Poll failed");
        }
        self.backoff.record(result.err().as_ref(), &self.config);

        self.set_state(SubscriptionState::Scheduled);
    }

    fn set_state(&self, next: SubscriptionState) {
        self.state.send_if_modified(|state| {
            if *state == next {
                return false;
            }
            *state = next;
            true
        });
    }
}

// `interval_at` panics on a zero period.
fn timer(start: Instant, period: Duration) -> Interval {
    let mut timer = interval_at(start, period.max(Duration::from_millis(1)));
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    timer
}

fn timer_after(period: Duration) -> Interval {
    timer(Instant::now() + period, period)
}
