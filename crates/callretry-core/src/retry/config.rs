//! Immutable retry configuration for one declared operation.

use super::classify::FailureKind;
use std::collections::BTreeSet;
use std::time::Duration;
use thiserror::Error;

/// Invalid retry declaration.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("max_attempts must be at least 1")]
    ZeroMaxAttempts,
    #[error("backoff multiplier must be a finite number >= 0, got {0}")]
    InvalidMultiplier(f64),
}

/// Delay shape between attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// Same delay before every retry.
    Fixed { period: Duration },
    /// `initial_delay * multiplier^(n-1)`, capped at `max_delay`.
    Exponential {
        initial_delay: Duration,
        max_delay: Duration,
        multiplier: f64,
    },
}

impl Backoff {
    /// Build a backoff from the declared `delay`, `max_delay` and `multiplier`.
    ///
    /// A multiplier of exactly zero selects fixed backoff with `delay` as the
    /// period; `max_delay` is then ignored.
    pub fn from_params(
        delay: Duration,
        max_delay: Duration,
        multiplier: f64,
    ) -> Result<Self, ConfigError> {
        if !multiplier.is_finite() || multiplier < 0.0 {
            return Err(ConfigError::InvalidMultiplier(multiplier));
        }
        if multiplier == 0.0 {
            return Ok(Backoff::Fixed { period: delay });
        }
        Ok(Backoff::Exponential {
            initial_delay: delay,
            max_delay,
            multiplier,
        })
    }

    /// The declared `delay` (fixed period or initial interval).
    pub fn delay(&self) -> Duration {
        match self {
            Backoff::Fixed { period } => *period,
            Backoff::Exponential { initial_delay, .. } => *initial_delay,
        }
    }
}

/// Retry declaration for one remote operation.
///
/// Built once, then shared read-only across every invocation of the
/// operation. Policy objects are derived from it per invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    max_attempts: u32,
    retryable: BTreeSet<FailureKind>,
    backoff: Backoff,
}

impl RetryConfig {
    pub fn new(
        max_attempts: u32,
        retryable: impl IntoIterator<Item = FailureKind>,
        backoff: Backoff,
    ) -> Result<Self, ConfigError> {
        if max_attempts == 0 {
            return Err(ConfigError::ZeroMaxAttempts);
        }
        Ok(Self {
            max_attempts,
            retryable: retryable.into_iter().collect(),
            backoff,
        })
    }

    /// One attempt, nothing retryable.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            retryable: BTreeSet::new(),
            backoff: Backoff::Fixed {
                period: Duration::ZERO,
            },
        }
    }

    /// Total attempts including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn retryable(&self) -> &BTreeSet<FailureKind> {
        &self.retryable
    }

    pub fn is_retryable(&self, kind: FailureKind) -> bool {
        self.retryable.contains(&kind)
    }

    pub fn backoff(&self) -> &Backoff {
        &self.backoff
    }
}

impl Default for RetryConfig {
    /// Three attempts, 1s fixed delay, transport-level failures retryable.
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retryable: [
                FailureKind::Timeout,
                FailureKind::Connection,
                FailureKind::Throttled,
                FailureKind::ServerError,
            ]
            .into_iter()
            .collect(),
            backoff: Backoff::Fixed {
                period: Duration::from_millis(1000),
            },
        }
    }
}
