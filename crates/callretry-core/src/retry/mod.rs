//! Retry and backoff engine for outbound calls.
//!
//! Layers, leaf first: failure classification, backoff delays, the retry
//! allow-list policy, the attempt loop, and the interceptor that composes
//! them for a declared operation. Each layer is usable on its own, e.g. a
//! plain closure can be run through `RetryExecutor` without any declaration.

mod backoff;
mod classify;
mod config;
mod interceptor;
mod policy;
mod run;

pub use backoff::{schedule, AttemptContext, BackoffPolicy, ExponentialBackoff, FixedBackoff};
pub use classify::{classify_http_status, classify_io_error, Classify, FailureKind};
pub use config::{Backoff, ConfigError, RetryConfig};
pub use interceptor::{intercept, CallInterceptor, RetryRegistry};
pub use policy::{RetryPolicy, SimpleRetryPolicy};
pub use run::{RetryDecision, RetryExecutor, Sleeper, ThreadSleeper};
