//! Retrying query execution.
//!
//! [`ResilientQueryExecutor`] wraps a [`QueryService`] and absorbs the two
//! transient failure modes through backoff-and-resubmit. Every other
//! failure propagates on the first occurrence.

use std::time::{Duration, Instant};

use log::warn;
use rand::Rng;
use thiserror::Error;

use crate::{
    OsmId, QueryResult, QueryService, RemoteError, RetryPolicy, Sleeper, ThreadSleeper,
};

/// Errors from [`ResilientQueryExecutor`] and the stages built on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecuteError {
    /// The service returned a non-retryable error.
    #[error("remote query failed: {0}")]
    Remote(#[source] RemoteError),
    /// The retry cap was reached while the service kept failing transiently.
    #[error("giving up after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Number of attempts made, including the first.
        attempts: u32,
        /// Error returned by the final attempt.
        #[source]
        last: RemoteError,
    },
    /// The next pause would overrun the configured deadline.
    #[error("deadline of {deadline:?} exceeded after {attempts} attempts: {last}")]
    DeadlineExceeded {
        /// Configured time budget.
        deadline: Duration,
        /// Number of attempts made, including the first.
        attempts: u32,
        /// Error returned by the final attempt.
        #[source]
        last: RemoteError,
    },
    /// The service did not return a node referenced by a way.
    #[error("way {way} references node {node}, which the service did not return")]
    UnresolvedNode {
        /// Way holding the dangling reference.
        way: OsmId,
        /// Node that could not be resolved.
        node: OsmId,
    },
}

/// Time charged against a policy deadline.
///
/// One budget can be threaded through several related requests, so a
/// deadline bounds the whole operation rather than each request. Time spent
/// is the larger of the wall-clock time since [`RetryBudget::start`] and the
/// sum of pauses requested so far.
#[derive(Debug, Clone, Copy)]
pub struct RetryBudget {
    started: Instant,
    paused: Duration,
}

impl RetryBudget {
    /// Start charging time from now.
    #[must_use]
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
            paused: Duration::ZERO,
        }
    }

    /// Time charged so far.
    #[must_use]
    pub fn spent(&self) -> Duration {
        self.started.elapsed().max(self.paused)
    }

    fn record_pause(&mut self, pause: Duration) {
        self.paused = self.paused.saturating_add(pause);
    }
}

/// Runs queries against a [`QueryService`], retrying transient failures.
///
/// # Examples
///
/// ```
/// use wayfetch_core::{QueryResult, QueryService, RemoteError, ResilientQueryExecutor, RetryPolicy};
///
/// struct Empty;
///
/// impl QueryService for Empty {
///     fn query(&self, _query: &str) -> Result<QueryResult, RemoteError> {
///         Ok(QueryResult::default())
///     }
/// }
///
/// let executor = ResilientQueryExecutor::new(Empty).with_policy(RetryPolicy::classic());
/// let result = executor.execute("[out:json];();out body;")?;
/// assert!(result.ways.is_empty());
/// # Ok::<(), wayfetch_core::ExecuteError>(())
/// ```
#[derive(Debug)]
pub struct ResilientQueryExecutor<S, Z = ThreadSleeper> {
    service: S,
    policy: RetryPolicy,
    sleeper: Z,
}

impl<S: QueryService> ResilientQueryExecutor<S> {
    /// Create an executor with the default bounded policy and real sleeps.
    #[must_use]
    pub fn new(service: S) -> Self {
        Self {
            service,
            policy: RetryPolicy::default(),
            sleeper: ThreadSleeper,
        }
    }
}

impl<S: QueryService, Z: Sleeper> ResilientQueryExecutor<S, Z> {
    /// Replace the retry policy.
    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the sleeper used between retries.
    #[must_use]
    pub fn with_sleeper<Z2: Sleeper>(self, sleeper: Z2) -> ResilientQueryExecutor<S, Z2> {
        ResilientQueryExecutor {
            service: self.service,
            policy: self.policy,
            sleeper,
        }
    }

    /// The wrapped service.
    pub const fn service(&self) -> &S {
        &self.service
    }

    /// Submit `query`, retrying transient failures according to the policy.
    pub fn execute(&self, query: &str) -> Result<QueryResult, ExecuteError> {
        self.execute_within(query, &mut RetryBudget::start())
    }

    /// As [`Self::execute`], charging pauses to a shared `budget`.
    pub fn execute_within(
        &self,
        query: &str,
        budget: &mut RetryBudget,
    ) -> Result<QueryResult, ExecuteError> {
        self.run_within("query", budget, || self.service.query(query))
    }

    /// Run `attempt` until it succeeds or fails with a non-retryable error.
    ///
    /// `label` names the operation in retry diagnostics.
    pub fn run<T, F>(&self, label: &str, attempt: F) -> Result<T, ExecuteError>
    where
        F: FnMut() -> Result<T, RemoteError>,
    {
        self.run_within(label, &mut RetryBudget::start(), attempt)
    }

    /// As [`Self::run`], charging pauses to a shared `budget`.
    ///
    /// The retry cap counts this call's retries only; the deadline covers
    /// everything already charged to `budget`.
    pub fn run_within<T, F>(
        &self,
        label: &str,
        budget: &mut RetryBudget,
        mut attempt: F,
    ) -> Result<T, ExecuteError>
    where
        F: FnMut() -> Result<T, RemoteError>,
    {
        let mut retries: u32 = 0;
        loop {
            let error = match attempt() {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };
            let Some(kind) = error.retry_kind() else {
                return Err(ExecuteError::Remote(error));
            };
            let attempts = retries.saturating_add(1);
            if !self.policy.allows_retry(retries) {
                return Err(ExecuteError::RetriesExhausted {
                    attempts,
                    last: error,
                });
            }
            let delay = self.policy.delay(kind, retries, self.jitter_sample());
            if let Some(deadline) = self.policy.deadline
                && budget.spent().saturating_add(delay) > deadline
            {
                return Err(ExecuteError::DeadlineExceeded {
                    deadline,
                    attempts,
                    last: error,
                });
            }
            warn!("{label}: {error}; retrying in {delay:?} (attempt {attempts})");
            self.sleeper.sleep(delay);
            budget.record_pause(delay);
            retries = attempts;
        }
    }

    fn jitter_sample(&self) -> f64 {
        if self.policy.jitter > 0.0 {
            rand::thread_rng().gen_range(-1.0..=1.0)
        } else {
            0.0
        }
    }
}
