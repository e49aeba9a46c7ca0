//! Deterministic test doubles for the query service and the backoff clock.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::time::Duration;

use crate::{QueryResult, QueryService, RemoteError, Sleeper};

/// [`QueryService`] replaying a fixed script of responses.
///
/// Each call to [`QueryService::query`] records the query text and pops the
/// next scripted response. Once the script is exhausted every call fails
/// with [`RemoteError::Parse`], so an unexpected extra request surfaces as a
/// fatal error instead of hanging a retry loop.
#[derive(Debug, Default)]
pub struct ScriptedService {
    script: RefCell<VecDeque<Result<QueryResult, RemoteError>>>,
    queries: RefCell<Vec<String>>,
}

impl ScriptedService {
    /// Create a service with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a successful response.
    #[must_use]
    pub fn then_ok(self, result: QueryResult) -> Self {
        self.script.borrow_mut().push_back(Ok(result));
        self
    }

    /// Append a failing response.
    #[must_use]
    pub fn then_err(self, error: RemoteError) -> Self {
        self.script.borrow_mut().push_back(Err(error));
        self
    }

    /// Append `times` copies of a failing response.
    #[must_use]
    pub fn fail_times(self, times: usize, error: &RemoteError) -> Self {
        (0..times).fold(self, |service, _| service.then_err(error.clone()))
    }

    /// Queries received so far, in call order.
    #[must_use]
    pub fn queries(&self) -> Vec<String> {
        self.queries.borrow().clone()
    }

    /// Number of scripted responses not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.script.borrow().len()
    }
}

impl QueryService for ScriptedService {
    fn query(&self, query: &str) -> Result<QueryResult, RemoteError> {
        self.queries.borrow_mut().push(query.to_owned());
        self.script
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| {
                Err(RemoteError::Parse {
                    message: "scripted service has no response left".to_owned(),
                })
            })
    }
}

/// [`Sleeper`] that records requested pauses without waiting.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    pauses: RefCell<Vec<Duration>>,
}

impl RecordingSleeper {
    /// Pauses requested so far, in call order.
    #[must_use]
    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses.borrow().clone()
    }

    /// Sum of all requested pauses.
    #[must_use]
    pub fn total(&self) -> Duration {
        self.pauses.borrow().iter().sum()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.pauses.borrow_mut().push(duration);
    }
}
