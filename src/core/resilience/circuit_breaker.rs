//! Per-adapter circuit breaker
//!
//! Tracks consecutive failures of outbound calls and stops calling a vendor
//! that is already failing. One breaker guards one adapter instance; breakers
//! are never shared across hospitals.
//!
//! States:
//!
//! - **Closed**: calls pass through. Each failure increments the counter and
//!   reaching `failure_threshold` opens the circuit.
//! - **Open**: calls fail with [`EmrError::CircuitOpen`] without running the
//!   wrapped operation, until `reset_timeout` has elapsed since the last
//!   failure.
//! - **Half-open**: the first call after the timeout is the trial. While it is
//!   in flight every other call fails fast. Trial success closes the circuit
//!   and zeroes the counter, trial failure re-opens it unconditionally.

use crate::domain::{EmrError, Result};
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// Observable breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

/// Breaker tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit
    pub failure_threshold: u32,

    /// Cooldown after the last failure before a trial call is let through
    pub reset_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout: Duration::from_millis(30_000),
        }
    }
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    failures: u32,
    last_failure: Option<Instant>,
}

/// Failure-tracking state machine guarding outbound calls
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerState>,
}

/// Whether an admitted call is the half-open trial
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Admission {
    Normal,
    Trial,
}

impl CircuitBreaker {
    /// Create a closed breaker
    ///
    /// `name` only labels log events.
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(BreakerState {
                state: CircuitState::Closed,
                failures: 0,
                last_failure: None,
            }),
        }
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Current state
    ///
    /// An open circuit whose cooldown has elapsed still reports `Open`; the
    /// switch to half-open happens when the next call is admitted.
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    /// Current failure counter
    pub fn failures(&self) -> u32 {
        self.lock().failures
    }

    /// Run `operation` under the breaker
    ///
    /// Returns the operation's result unchanged. Failures are recorded before
    /// the error is handed back; nothing is swallowed.
    ///
    /// # Errors
    ///
    /// Returns [`EmrError::CircuitOpen`] without calling `operation` when the
    /// circuit is open or a half-open trial is already in flight.
    pub async fn execute<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let admission = self.admit()?;
        let mut guard = TrialGuard {
            breaker: self,
            armed: admission == Admission::Trial,
        };

        let result = operation().await;
        guard.armed = false;

        match &result {
            Ok(_) => self.record_success(admission),
            Err(e) => self.record_failure(admission, e),
        }

        result
    }

    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn admit(&self) -> Result<Admission> {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => Ok(Admission::Normal),
            CircuitState::HalfOpen => Err(EmrError::CircuitOpen { retry_after_ms: 0 }),
            CircuitState::Open => {
                let now = Instant::now();
                let elapsed = inner
                    .last_failure
                    .map(|at| now.saturating_duration_since(at))
                    .unwrap_or(self.config.reset_timeout);

                if elapsed >= self.config.reset_timeout {
                    inner.state = CircuitState::HalfOpen;
                    tracing::info!(
                        breaker = %self.name,
                        failures = inner.failures,
                        "Circuit half-open, admitting trial call"
                    );
                    Ok(Admission::Trial)
                } else {
                    let remaining = self.config.reset_timeout - elapsed;
                    tracing::debug!(
                        breaker = %self.name,
                        retry_after_ms = remaining.as_millis() as u64,
                        "Circuit open, rejecting call"
                    );
                    Err(EmrError::CircuitOpen {
                        retry_after_ms: remaining.as_millis() as u64,
                    })
                }
            }
        }
    }

    fn record_success(&self, admission: Admission) {
        let mut inner = self.lock();
        match (admission, inner.state) {
            (Admission::Trial, _) => {
                inner.failures = 0;
                inner.state = CircuitState::Closed;
                tracing::info!(breaker = %self.name, "Trial call succeeded, circuit closed");
            }
            (Admission::Normal, CircuitState::Closed) => {
                inner.failures = 0;
            }
            // A call admitted while closed finished after the circuit opened
            // underneath it; the open state stands.
            (Admission::Normal, _) => {}
        }
    }

    fn record_failure(&self, admission: Admission, error: &EmrError) {
        let mut inner = self.lock();
        inner.failures = inner.failures.saturating_add(1);
        inner.last_failure = Some(Instant::now());

        let reopen = admission == Admission::Trial
            || (inner.state == CircuitState::Closed
                && inner.failures >= self.config.failure_threshold);

        if reopen {
            inner.state = CircuitState::Open;
            tracing::warn!(
                breaker = %self.name,
                failures = inner.failures,
                threshold = self.config.failure_threshold,
                error = %error,
                "Circuit opened"
            );
        } else {
            tracing::debug!(
                breaker = %self.name,
                failures = inner.failures,
                error = %error,
                "Call failed under circuit breaker"
            );
        }
    }

    fn abandon_trial(&self) {
        let mut inner = self.lock();
        if inner.state == CircuitState::HalfOpen {
            inner.state = CircuitState::Open;
            inner.last_failure = Some(Instant::now());
            tracing::warn!(breaker = %self.name, "Trial call cancelled, circuit re-opened");
        }
    }
}

/// Re-opens the circuit if a trial call is dropped before it completes
struct TrialGuard<'a> {
    breaker: &'a CircuitBreaker,
    armed: bool,
}

impl Drop for TrialGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.breaker.abandon_trial();
        }
    }
}
