//! Retry loop: run an operation until it succeeds or the policies say stop.
//!
//! The executor owns no policy of its own. Retryability comes from a
//! `RetryPolicy`, delays from a `BackoffPolicy`; the loop only sequences
//! attempts, sleeps and logs.

use super::backoff::{AttemptContext, BackoffPolicy};
use super::classify::{Classify, FailureKind};
use super::policy::RetryPolicy;
use crate::control::{AbortToken, Cancelled};
use std::future::Future;
use std::time::Duration;

/// Decision taken after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Propagate the failure as-is.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Blocking wait between attempts.
pub trait Sleeper {
    fn sleep(&self, delay: Duration);
}

/// Sleeps the current thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, delay: Duration) {
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }
}

impl<S: Sleeper + ?Sized> Sleeper for &S {
    fn sleep(&self, delay: Duration) {
        (**self).sleep(delay)
    }
}

/// Sequential attempt loop for one logical call.
///
/// `operation` identifies the call in logs only.
#[derive(Debug, Clone)]
pub struct RetryExecutor<'a, S = ThreadSleeper> {
    operation: &'a str,
    sleeper: S,
}

impl<'a> RetryExecutor<'a, ThreadSleeper> {
    pub fn new(operation: &'a str) -> Self {
        Self {
            operation,
            sleeper: ThreadSleeper,
        }
    }
}

impl<'a, S> RetryExecutor<'a, S> {
    /// Replace the blocking sleeper (async runs always use tokio's timer).
    pub fn with_sleeper<S2: Sleeper>(self, sleeper: S2) -> RetryExecutor<'a, S2> {
        RetryExecutor {
            operation: self.operation,
            sleeper,
        }
    }

    pub fn operation(&self) -> &str {
        self.operation
    }

    fn log_attempt(
        &self,
        ctx: &AttemptContext,
        retry: &impl RetryPolicy,
        backoff: &impl BackoffPolicy,
    ) {
        tracing::info!(
            operation = self.operation,
            max_attempts = retry.max_attempts(),
            delay_ms = backoff.configured_delay().as_millis() as u64,
            attempt = ctx.attempt(),
            "sending request"
        );
    }

    /// Record the failure and ask the policies what happens next.
    fn decide(
        &self,
        ctx: &mut AttemptContext,
        kind: FailureKind,
        retry: &impl RetryPolicy,
        backoff: &impl BackoffPolicy,
    ) -> RetryDecision {
        ctx.record_failure(kind);
        let attempt = ctx.attempt();
        if !retry.can_retry(kind, attempt) {
            if attempt >= retry.max_attempts() {
                tracing::warn!(operation = self.operation, attempt, %kind, "retries exhausted");
            } else {
                tracing::warn!(operation = self.operation, attempt, %kind, "non-retryable failure");
            }
            return RetryDecision::NoRetry;
        }
        let delay = backoff.next_delay(ctx);
        tracing::warn!(
            operation = self.operation,
            attempt,
            %kind,
            next_delay_ms = delay.as_millis() as u64,
            "attempt failed, retrying"
        );
        RetryDecision::RetryAfter(delay)
    }

    /// Run `op` until it succeeds, hits a fatal failure or runs out of attempts.
    /// The returned error is always the one `op` produced last.
    pub fn execute<T, E, F>(
        &self,
        mut op: F,
        retry: &impl RetryPolicy,
        backoff: &impl BackoffPolicy,
    ) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
        E: Classify,
        S: Sleeper,
    {
        let mut ctx = AttemptContext::new();
        loop {
            self.log_attempt(&ctx, retry, backoff);
            let err = match op() {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            match self.decide(&mut ctx, err.failure_kind(), retry, backoff) {
                RetryDecision::NoRetry => return Err(err),
                RetryDecision::RetryAfter(delay) => {
                    self.sleeper.sleep(delay);
                    ctx.advance();
                }
            }
        }
    }

    /// Async variant of [`execute`](Self::execute). The backoff sleep only
    /// suspends the current task.
    pub async fn execute_async<T, E, F, Fut>(
        &self,
        mut op: F,
        retry: &impl RetryPolicy,
        backoff: &impl BackoffPolicy,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify,
    {
        let mut ctx = AttemptContext::new();
        loop {
            self.log_attempt(&ctx, retry, backoff);
            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            match self.decide(&mut ctx, err.failure_kind(), retry, backoff) {
                RetryDecision::NoRetry => return Err(err),
                RetryDecision::RetryAfter(delay) => {
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    ctx.advance();
                }
            }
        }
    }

    /// Like [`execute_async`](Self::execute_async), but aborting `token`
    /// interrupts both the in-flight call and the backoff sleep. The run then
    /// fails with `E::from(Cancelled)` and is not retried.
    pub async fn execute_cancellable<T, E, F, Fut>(
        &self,
        token: &AbortToken,
        mut op: F,
        retry: &impl RetryPolicy,
        backoff: &impl BackoffPolicy,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify + From<Cancelled>,
    {
        let mut ctx = AttemptContext::new();
        loop {
            if token.is_aborted() {
                return Err(self.cancelled(&ctx));
            }
            self.log_attempt(&ctx, retry, backoff);
            let outcome = tokio::select! {
                biased;
                _ = token.aborted() => return Err(self.cancelled(&ctx)),
                outcome = op() => outcome,
            };
            let err = match outcome {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            match self.decide(&mut ctx, err.failure_kind(), retry, backoff) {
                RetryDecision::NoRetry => return Err(err),
                RetryDecision::RetryAfter(delay) => {
                    tokio::select! {
                        biased;
                        _ = token.aborted() => return Err(self.cancelled(&ctx)),
                        _ = tokio::time::sleep(delay) => {}
                    }
                    ctx.advance();
                }
            }
        }
    }

    fn cancelled<E: From<Cancelled>>(&self, ctx: &AttemptContext) -> E {
        tracing::info!(operation = self.operation, attempt = ctx.attempt(), "call aborted");
        E::from(Cancelled)
    }
}
