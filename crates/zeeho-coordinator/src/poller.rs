//! Fixed-interval refresh driver

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::coordinator::PollingCoordinator;
use crate::error::{FailureKind, RefreshError};

/// When to alarm and when to give up
#[derive(Debug, Clone)]
pub struct PollPolicy {
    pub interval: Duration,
    /// Consecutive transient failures before logging at error level
    pub failure_alarm_threshold: u32,
    /// Consecutive non-transient failures before the poller halts
    pub max_persistent_failures: u32,
}

impl PollPolicy {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            failure_alarm_threshold: 3,
            max_persistent_failures: 3,
        }
    }
}

/// Why the poll loop ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollerExit {
    Shutdown,
    /// Gave up after repeated non-transient failures
    Halted(RefreshError),
    Aborted,
}

#[derive(Debug, PartialEq, Eq)]
enum Verdict {
    Continue,
    Halt,
}

/// Consecutive-failure bookkeeping; both counters reset on success
#[derive(Debug, Default)]
struct FailureTracker {
    transient: u32,
    persistent: u32,
}

impl FailureTracker {
    fn record_success(&mut self) {
        if self.transient > 0 || self.persistent > 0 {
            info!(
                after_failures = self.transient + self.persistent,
                "Telemetry polling recovered"
            );
        }
        self.transient = 0;
        self.persistent = 0;
    }

    fn record_failure(&mut self, err: &RefreshError, policy: &PollPolicy) -> Verdict {
        match err.kind() {
            FailureKind::Transient => {
                self.transient += 1;
                if self.transient >= policy.failure_alarm_threshold {
                    error!(error = %err, failures = self.transient, "Telemetry repeatedly unavailable");
                } else {
                    warn!(error = %err, failures = self.transient, "Transient refresh failure, retrying next tick");
                }
                Verdict::Continue
            }
            kind => {
                self.persistent += 1;
                error!(
                    error = %err,
                    ?kind,
                    failures = self.persistent,
                    "Refresh needs operator attention"
                );
                if self.persistent >= policy.max_persistent_failures {
                    Verdict::Halt
                } else {
                    Verdict::Continue
                }
            }
        }
    }
}

/// Background task refreshing a coordinator on a fixed interval
pub struct Poller {
    handle: JoinHandle<PollerExit>,
}

impl Poller {
    /// Start polling until `shutdown` turns true or its sender is dropped
    pub fn spawn(
        coordinator: PollingCoordinator,
        policy: PollPolicy,
        mut shutdown: watch::Receiver<bool>,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(policy.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut tracker = FailureTracker::default();

            info!(interval_secs = policy.interval.as_secs(), "Poller started");
            loop {
                if *shutdown.borrow() {
                    break;
                }
                tokio::select! {
                    _ = ticker.tick() => {}
                    changed = shutdown.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        continue;
                    }
                }

                debug!("Poll tick");
                match coordinator.refresh().await {
                    Ok(_) => tracker.record_success(),
                    Err(e) => {
                        if tracker.record_failure(&e, &policy) == Verdict::Halt {
                            error!(error = %e, "Poller halted");
                            return PollerExit::Halted(e);
                        }
                    }
                }
            }

            info!("Poller stopped");
            PollerExit::Shutdown
        });

        Self { handle }
    }

    /// Wait for the loop to end
    pub async fn join(self) -> PollerExit {
        self.handle.await.unwrap_or(PollerExit::Aborted)
    }

    pub fn abort(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
