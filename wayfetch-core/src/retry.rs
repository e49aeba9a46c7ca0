//! Backoff policy for transient query-service failures.
//!
//! Two conditions are retried: rate limiting and gateway timeouts. Gateway
//! timeouts signal server overload and get a base delay ten times longer
//! than rate limiting. The [`RetryPolicy::classic`] policy retries forever
//! with fixed delays; the default policy caps retries, grows delays
//! exponentially and adds jitter.

use std::time::Duration;

use crate::RetryKind;

/// Base pause after a rate-limit response.
pub const DEFAULT_RATE_LIMIT_DELAY: Duration = Duration::from_secs(1);

/// Base pause after a gateway timeout.
pub const DEFAULT_GATEWAY_TIMEOUT_DELAY: Duration = Duration::from_secs(10);

/// Retry cap applied by [`RetryPolicy::default`].
pub const DEFAULT_MAX_RETRIES: u32 = 8;

/// Largest single pause applied by [`RetryPolicy::default`].
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(120);

/// Retry and backoff configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Base pause after [`RetryKind::TooManyRequests`].
    pub rate_limit_delay: Duration,
    /// Base pause after [`RetryKind::GatewayTimeout`].
    pub gateway_timeout_delay: Duration,
    /// Maximum number of retries per operation; `None` retries forever.
    pub max_retries: Option<u32>,
    /// Growth factor applied per consecutive retry; `1.0` keeps delays fixed.
    pub multiplier: f64,
    /// Upper bound for a single pause before jitter.
    pub max_delay: Duration,
    /// Relative jitter in `[0, 1]`; a pause is scaled by `1 ± jitter`.
    pub jitter: f64,
    /// Total time budget per operation, including pauses.
    pub deadline: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            rate_limit_delay: DEFAULT_RATE_LIMIT_DELAY,
            gateway_timeout_delay: DEFAULT_GATEWAY_TIMEOUT_DELAY,
            max_retries: Some(DEFAULT_MAX_RETRIES),
            multiplier: 2.0,
            max_delay: DEFAULT_MAX_DELAY,
            jitter: 0.1,
            deadline: None,
        }
    }
}

impl RetryPolicy {
    /// Unbounded retries with fixed one- and ten-second pauses.
    ///
    /// Suited to unattended batch runs where eventual success matters more
    /// than latency; a stuck service blocks the caller indefinitely.
    #[must_use]
    pub const fn classic() -> Self {
        Self {
            rate_limit_delay: DEFAULT_RATE_LIMIT_DELAY,
            gateway_timeout_delay: DEFAULT_GATEWAY_TIMEOUT_DELAY,
            max_retries: None,
            multiplier: 1.0,
            max_delay: Duration::MAX,
            jitter: 0.0,
            deadline: None,
        }
    }

    /// Set the retry cap.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: Option<u32>) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set both base delays.
    #[must_use]
    pub const fn with_base_delays(mut self, rate_limit: Duration, gateway_timeout: Duration) -> Self {
        self.rate_limit_delay = rate_limit;
        self.gateway_timeout_delay = gateway_timeout;
        self
    }

    /// Set the exponential growth factor. Values below `1.0` are clamped.
    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = if multiplier.is_finite() {
            multiplier.max(1.0)
        } else {
            1.0
        };
        self
    }

    /// Set the single-pause cap.
    #[must_use]
    pub const fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Set the relative jitter, clamped to `[0, 1]`.
    #[must_use]
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = if jitter.is_finite() {
            jitter.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self
    }

    /// Set the per-operation deadline.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Base pause for `kind` before growth and jitter.
    #[must_use]
    pub const fn base_delay(&self, kind: RetryKind) -> Duration {
        match kind {
            RetryKind::TooManyRequests => self.rate_limit_delay,
            RetryKind::GatewayTimeout => self.gateway_timeout_delay,
        }
    }

    /// Whether another retry is allowed after `retries` have happened.
    #[must_use]
    pub fn allows_retry(&self, retries: u32) -> bool {
        self.max_retries.is_none_or(|max| retries < max)
    }

    /// Pause before retry number `retry` (zero-based) of `kind`.
    ///
    /// `unit_sample` is a uniform sample in `[-1, 1]` that drives jitter; it
    /// is ignored when jitter is zero.
    #[must_use]
    pub fn delay(&self, kind: RetryKind, retry: u32, unit_sample: f64) -> Duration {
        let base = self.base_delay(kind);
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let grown = base.as_secs_f64() * self.multiplier.powi(exponent);
        let capped = grown.min(self.max_delay.as_secs_f64());
        let jittered = if self.jitter > 0.0 {
            capped * (1.0 + self.jitter * unit_sample.clamp(-1.0, 1.0))
        } else {
            capped
        };
        Duration::try_from_secs_f64(jittered).unwrap_or(self.max_delay)
    }
}

/// Blocking pause used between retries.
pub trait Sleeper {
    /// Suspend the caller for `duration`.
    fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by [`std::thread::sleep`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

impl<T: Sleeper + ?Sized> Sleeper for &T {
    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration);
    }
}
