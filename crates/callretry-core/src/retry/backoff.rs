//! Backoff policies: how long to wait before the next attempt.

use super::classify::FailureKind;
use super::config::Backoff;
use std::time::Duration;

/// Per-invocation attempt state. Created fresh for every executor run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptContext {
    attempt: u32,
    last_failure: Option<FailureKind>,
}

impl AttemptContext {
    pub fn new() -> Self {
        Self {
            attempt: 1,
            last_failure: None,
        }
    }

    /// Current attempt number (1-based). After a failure this is also the
    /// number of attempts already made.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn last_failure(&self) -> Option<FailureKind> {
        self.last_failure
    }

    pub(crate) fn record_failure(&mut self, kind: FailureKind) {
        self.last_failure = Some(kind);
    }

    pub(crate) fn advance(&mut self) {
        self.attempt = self.attempt.saturating_add(1);
    }
}

impl Default for AttemptContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Computes the delay before the next attempt. Pure: callers do the waiting.
pub trait BackoffPolicy {
    fn next_delay(&self, ctx: &AttemptContext) -> Duration;

    /// The declared base delay, reported in attempt logs.
    fn configured_delay(&self) -> Duration;
}

/// Constant delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedBackoff {
    pub period: Duration,
}

impl BackoffPolicy for FixedBackoff {
    fn next_delay(&self, _ctx: &AttemptContext) -> Duration {
        self.period
    }

    fn configured_delay(&self) -> Duration {
        self.period
    }
}

/// 2^64, the first nanosecond count `Duration::from_nanos` cannot take.
const U64_NANOS: f64 = 18_446_744_073_709_551_616.0;

/// Geometric delay growth without jitter.
///
/// Before attempt `k + 1` (k attempts made):
/// `min(max_delay, initial_delay * multiplier^(k - 1))`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialBackoff {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl BackoffPolicy for ExponentialBackoff {
    fn next_delay(&self, ctx: &AttemptContext) -> Duration {
        if self.initial_delay.is_zero() {
            return Duration::ZERO;
        }
        let exp = i32::try_from(ctx.attempt().saturating_sub(1)).unwrap_or(i32::MAX);
        let nanos = (self.initial_delay.as_nanos() as f64 * self.multiplier.powi(exp)).round();
        let cap = self.max_delay.as_nanos() as f64;
        if nanos.is_nan() || nanos >= cap {
            return self.max_delay;
        }
        if nanos < U64_NANOS {
            return Duration::from_nanos(nanos as u64);
        }
        // Beyond u64 nanoseconds a Duration is only reachable through seconds.
        Duration::try_from_secs_f64(nanos / 1e9)
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }

    fn configured_delay(&self) -> Duration {
        self.initial_delay
    }
}

impl BackoffPolicy for Backoff {
    fn next_delay(&self, ctx: &AttemptContext) -> Duration {
        match *self {
            Backoff::Fixed { period } => FixedBackoff { period }.next_delay(ctx),
            Backoff::Exponential {
                initial_delay,
                max_delay,
                multiplier,
            } => ExponentialBackoff {
                initial_delay,
                max_delay,
                multiplier,
            }
            .next_delay(ctx),
        }
    }

    fn configured_delay(&self) -> Duration {
        self.delay()
    }
}

impl<B: BackoffPolicy + ?Sized> BackoffPolicy for &B {
    fn next_delay(&self, ctx: &AttemptContext) -> Duration {
        (**self).next_delay(ctx)
    }

    fn configured_delay(&self) -> Duration {
        (**self).configured_delay()
    }
}

/// Delays the executor would wait between `max_attempts` attempts, in order.
///
/// Lazy: `max_attempts` may be as large as `u32::MAX`.
pub fn schedule<B: BackoffPolicy + ?Sized>(
    backoff: &B,
    max_attempts: u32,
) -> impl Iterator<Item = Duration> + '_ {
    (1..max_attempts).map(move |attempt| {
        backoff.next_delay(&AttemptContext {
            attempt,
            last_failure: None,
        })
    })
}
