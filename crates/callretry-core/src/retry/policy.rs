use super::classify::FailureKind;
use super::config::RetryConfig;
use std::collections::BTreeSet;

/// Decides whether another attempt is permitted after a failure.
pub trait RetryPolicy {
    /// `attempts_so_far` counts the attempt that just failed.
    fn can_retry(&self, kind: FailureKind, attempts_so_far: u32) -> bool;

    /// Total attempts including the first, reported in attempt logs.
    fn max_attempts(&self) -> u32;
}

/// Attempt cap plus an allow-list of retryable failure kinds.
///
/// Any kind not listed is fatal on first occurrence. `Cancelled` is never
/// retried, even if listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleRetryPolicy {
    max_attempts: u32,
    retryable: BTreeSet<FailureKind>,
}

impl SimpleRetryPolicy {
    pub fn new(max_attempts: u32, retryable: impl IntoIterator<Item = FailureKind>) -> Self {
        Self {
            max_attempts,
            retryable: retryable.into_iter().collect(),
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts(),
            retryable: config.retryable().clone(),
        }
    }
}

impl RetryPolicy for SimpleRetryPolicy {
    fn can_retry(&self, kind: FailureKind, attempts_so_far: u32) -> bool {
        if attempts_so_far >= self.max_attempts {
            return false;
        }
        if kind == FailureKind::Cancelled {
            return false;
        }
        self.retryable.contains(&kind)
    }

    fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

impl<P: RetryPolicy + ?Sized> RetryPolicy for &P {
    fn can_retry(&self, kind: FailureKind, attempts_so_far: u32) -> bool {
        (**self).can_retry(kind, attempts_so_far)
    }

    fn max_attempts(&self) -> u32 {
        (**self).max_attempts()
    }
}
