//! Circuit breaker with per-call timeout and bounded retries
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: upstream assumed down, calls fail fast to the fallback
//! - Half-Open: one probe tests whether the upstream recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive failed invocations reach max_failures
//! Open → Half-Open: after reset_timeout, next caller becomes the probe
//! Half-Open → Closed: probe invocation succeeds
//! Half-Open → Open: probe invocation fails
//! ```
//!
//! One breaker instance models the health of one upstream endpoint and is
//! shared by all callers. State, failure counter and open timestamp live
//! behind a single mutex so transitions stay consistent under concurrent
//! invocation; the lock is never held across an await.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use thiserror::Error;
use tokio::time::{timeout, Instant};
use tracing::{debug, info, warn};

/// Breaker state as observed at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    /// Calls pass through; failures are being counted
    Closed,
    /// Calls fail fast until the reset timeout elapses
    Open,
    /// A single probe call is testing the upstream
    HalfOpen,
}

/// Tunable limits for a breaker instance
///
/// The defaults mirror the production proxy configuration: three consecutive
/// failed invocations open the circuit, each attempt gets two seconds, the
/// circuit stays open for one second before probing, and a single invocation
/// makes at most three attempts.
#[derive(Debug, Clone)]
pub struct BreakerConfig {
    /// Consecutive failed invocations before the circuit opens
    pub max_failures: u32,
    /// Deadline for a single attempt; exceeding it counts as a failure
    pub call_timeout: Duration,
    /// Time spent open before a probe is allowed through
    pub reset_timeout: Duration,
    /// Maximum attempts per invocation
    pub max_retries: u32,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            max_failures: 3,
            call_timeout: Duration::from_millis(2000),
            reset_timeout: Duration::from_millis(1000),
            max_retries: 3,
        }
    }
}

/// Why an invocation could not produce a value
#[derive(Debug, Error)]
pub enum BreakerError<E> {
    /// The circuit was open; the operation was never invoked
    #[error("circuit is open, call rejected")]
    Open,
    /// The last attempt exceeded the per-call deadline
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),
    /// The last attempt failed with the operation's own error
    #[error("operation failed: {0}")]
    Operation(E),
}

/// Result of one breaker invocation
///
/// Carries the produced value together with the number of re-attempts the
/// invocation needed. The counter is scoped to this invocation and exists
/// for observability only.
#[derive(Debug)]
pub struct Execution<T> {
    /// The operation's result, or the fallback value
    pub value: T,
    /// Attempts beyond the first that this invocation made
    pub retries: u32,
}

#[derive(Debug)]
struct Shared {
    state: BreakerState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    probe_in_flight: bool,
}

/// What the admission check decided for one invocation
enum Admission {
    Proceed { probe: bool },
    Reject,
}

/// Tri-state circuit breaker shared by all callers of one upstream endpoint
#[derive(Debug)]
pub struct CircuitBreaker {
    config: BreakerConfig,
    shared: Mutex<Shared>,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(BreakerConfig::default())
    }
}

impl CircuitBreaker {
    /// Creates a breaker in the Closed state
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            shared: Mutex::new(Shared {
                state: BreakerState::Closed,
                consecutive_failures: 0,
                opened_at: None,
                probe_in_flight: false,
            }),
        }
    }

    /// Current state, for logging and tests
    #[allow(dead_code)]
    pub fn state(&self) -> BreakerState {
        self.shared.lock().expect("breaker lock poisoned").state
    }

    /// Runs `operation` under the breaker's protection
    ///
    /// While the circuit is open, or while another caller's probe is in
    /// flight, `operation` is not invoked and `fallback` produces the result
    /// immediately. Otherwise each attempt runs under the per-call deadline
    /// and is re-attempted until it succeeds or `max_retries` attempts have
    /// been made, after which the failure is recorded and `fallback` is
    /// invoked with the last error. The returned [`Execution`] never carries
    /// an error out to the caller.
    pub async fn execute<T, E, F, Fut, FB>(&self, operation: F, fallback: FB) -> Execution<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
        FB: FnOnce(BreakerError<E>) -> T,
    {
        let probe = match self.admit() {
            Admission::Proceed { probe } => probe,
            Admission::Reject => {
                debug!("circuit open, rejecting call");
                return Execution {
                    value: fallback(BreakerError::Open),
                    retries: 0,
                };
            }
        };

        let mut last_error = BreakerError::Open;
        for attempt in 0..self.config.max_retries {
            match timeout(self.config.call_timeout, operation()).await {
                Ok(Ok(value)) => {
                    self.record_success(probe);
                    return Execution {
                        value,
                        retries: attempt,
                    };
                }
                Ok(Err(error)) => {
                    debug!(attempt, %error, "attempt failed");
                    last_error = BreakerError::Operation(error);
                }
                Err(_) => {
                    debug!(attempt, timeout = ?self.config.call_timeout, "attempt timed out");
                    last_error = BreakerError::Timeout(self.config.call_timeout);
                }
            }
        }

        self.record_failure(probe);
        Execution {
            value: fallback(last_error),
            retries: self.config.max_retries.saturating_sub(1),
        }
    }

    /// Decides whether this invocation may run the operation
    fn admit(&self) -> Admission {
        let mut shared = self.shared.lock().expect("breaker lock poisoned");
        match shared.state {
            BreakerState::Closed => Admission::Proceed { probe: false },
            BreakerState::Open => {
                let cooled_down = shared
                    .opened_at
                    .is_some_and(|opened_at| opened_at.elapsed() >= self.config.reset_timeout);
                if cooled_down {
                    info!("reset timeout elapsed, probing upstream");
                    shared.state = BreakerState::HalfOpen;
                    shared.probe_in_flight = true;
                    Admission::Proceed { probe: true }
                } else {
                    Admission::Reject
                }
            }
            BreakerState::HalfOpen => {
                if shared.probe_in_flight {
                    Admission::Reject
                } else {
                    shared.probe_in_flight = true;
                    Admission::Proceed { probe: true }
                }
            }
        }
    }

    fn record_success(&self, probe: bool) {
        let mut shared = self.shared.lock().expect("breaker lock poisoned");
        shared.consecutive_failures = 0;
        if probe {
            info!("probe succeeded, closing circuit");
            shared.state = BreakerState::Closed;
            shared.opened_at = None;
            shared.probe_in_flight = false;
        }
    }

    fn record_failure(&self, probe: bool) {
        let mut shared = self.shared.lock().expect("breaker lock poisoned");
        shared.consecutive_failures += 1;
        if probe {
            warn!("probe failed, reopening circuit");
            shared.state = BreakerState::Open;
            shared.opened_at = Some(Instant::now());
            shared.probe_in_flight = false;
        } else if shared.state == BreakerState::Closed
            && shared.consecutive_failures >= self.config.max_failures
        {
            warn!(
                failures = shared.consecutive_failures,
                "failure threshold reached, opening circuit"
            );
            shared.state = BreakerState::Open;
            shared.opened_at = Some(Instant::now());
        }
    }
}
