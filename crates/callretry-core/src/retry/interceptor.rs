//! Wraps declared remote calls with a retry executor.
//!
//! The interceptor is composition only: every invocation builds fresh
//! policy values from the shared `RetryConfig` and hands the original call,
//! deferred as a closure, to `RetryExecutor`. Results and failures pass
//! through untouched.

use super::classify::Classify;
use super::config::RetryConfig;
use super::policy::SimpleRetryPolicy;
use super::run::{RetryExecutor, Sleeper, ThreadSleeper};
use crate::control::{AbortToken, Cancelled};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

/// Retry wrapper for one declared operation.
#[derive(Debug, Clone)]
pub struct CallInterceptor<S = ThreadSleeper> {
    operation: Arc<str>,
    config: Arc<RetryConfig>,
    sleeper: S,
}

impl CallInterceptor<ThreadSleeper> {
    pub fn new(operation: impl Into<Arc<str>>, config: Arc<RetryConfig>) -> Self {
        Self {
            operation: operation.into(),
            config,
            sleeper: ThreadSleeper,
        }
    }
}

impl<S> CallInterceptor<S> {
    /// Replace the sleeper used by blocking calls.
    pub fn with_sleeper<S2: Sleeper>(self, sleeper: S2) -> CallInterceptor<S2> {
        CallInterceptor {
            operation: self.operation,
            config: self.config,
            sleeper,
        }
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Run a blocking call under the declared retry policy.
    pub fn call<T, E, F>(&self, op: F) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
        E: Classify,
        S: Sleeper,
    {
        let retry = SimpleRetryPolicy::from_config(&self.config);
        let backoff = *self.config.backoff();
        RetryExecutor::new(&self.operation)
            .with_sleeper(&self.sleeper)
            .execute(op, &retry, &backoff)
    }

    /// Run an async call under the declared retry policy.
    pub async fn call_async<T, E, F, Fut>(&self, op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify,
    {
        let retry = SimpleRetryPolicy::from_config(&self.config);
        let backoff = *self.config.backoff();
        RetryExecutor::new(&self.operation)
            .execute_async(op, &retry, &backoff)
            .await
    }

    /// Run an async call that `token` can abort mid-call or mid-backoff.
    pub async fn call_cancellable<T, E, F, Fut>(&self, token: &AbortToken, op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify + From<Cancelled>,
    {
        let retry = SimpleRetryPolicy::from_config(&self.config);
        let backoff = *self.config.backoff();
        RetryExecutor::new(&self.operation)
            .execute_cancellable(token, op, &retry, &backoff)
            .await
    }
}

/// Wrap `f` so every call goes through `interceptor`.
///
/// The returned function has the same signature as `f`; arguments are
/// cloned into each attempt.
pub fn intercept<A, T, E, F, S>(
    interceptor: CallInterceptor<S>,
    f: F,
) -> impl Fn(A) -> Result<T, E>
where
    A: Clone,
    F: Fn(A) -> Result<T, E>,
    E: Classify,
    S: Sleeper,
{
    move |args: A| interceptor.call(|| f(args.clone()))
}

/// Declared retry configs by operation name.
///
/// Operations that were never declared get the fallback config.
#[derive(Debug, Clone, Default)]
pub struct RetryRegistry {
    operations: BTreeMap<String, Arc<RetryConfig>>,
    fallback: Arc<RetryConfig>,
}

impl RetryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fallback(mut self, config: RetryConfig) -> Self {
        self.fallback = Arc::new(config);
        self
    }

    pub fn declare(mut self, operation: impl Into<String>, config: RetryConfig) -> Self {
        self.operations.insert(operation.into(), Arc::new(config));
        self
    }

    /// Declared config for `operation`, if any.
    pub fn get(&self, operation: &str) -> Option<&Arc<RetryConfig>> {
        self.operations.get(operation)
    }

    /// Declared config for `operation`, or the fallback.
    pub fn resolve(&self, operation: &str) -> Arc<RetryConfig> {
        match self.operations.get(operation) {
            Some(cfg) => Arc::clone(cfg),
            None => {
                tracing::debug!(operation, "no retry declared, using fallback");
                Arc::clone(&self.fallback)
            }
        }
    }

    pub fn interceptor(&self, operation: &str) -> CallInterceptor {
        CallInterceptor::new(operation, self.resolve(operation))
    }

    pub fn operations(&self) -> impl Iterator<Item = (&str, &RetryConfig)> {
        self.operations.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::classify::FailureKind;
    use crate::retry::config::Backoff;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Debug, PartialEq)]
    enum CallError {
        Unavailable,
        NotFound(u64),
    }

    impl Classify for CallError {
        fn failure_kind(&self) -> FailureKind {
            match self {
                CallError::Unavailable => FailureKind::Throttled,
                CallError::NotFound(_) => FailureKind::ClientError,
            }
        }
    }

    #[derive(Default)]
    struct NoSleep(Mutex<Vec<Duration>>);

    impl Sleeper for NoSleep {
        fn sleep(&self, delay: Duration) {
            self.0.lock().unwrap().push(delay);
        }
    }

    fn declared() -> Arc<RetryConfig> {
        Arc::new(
            RetryConfig::new(
                5,
                [FailureKind::Throttled],
                Backoff::from_params(
                    Duration::from_millis(500),
                    Duration::from_millis(20_000),
                    4.0,
                )
                .unwrap(),
            )
            .unwrap(),
        )
    }

    #[test]
    fn intercepted_fn_keeps_signature_and_arguments() {
        let calls = AtomicU32::new(0);
        let seen = Mutex::new(Vec::new());
        let sleeper = NoSleep::default();
        let todos = intercept(
            CallInterceptor::new("todos", declared()).with_sleeper(&sleeper),
            |id: u64| {
                seen.lock().unwrap().push(id);
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(CallError::Unavailable)
                } else {
                    Ok(format!("todo {id}"))
                }
            },
        );
        assert_eq!(todos(7), Ok("todo 7".to_string()));
        assert_eq!(*seen.lock().unwrap(), vec![7, 7, 7]);
        assert_eq!(
            *sleeper.0.lock().unwrap(),
            vec![Duration::from_millis(500), Duration::from_millis(2000)]
        );
    }

    #[test]
    fn failure_is_not_translated() {
        let calls = AtomicU32::new(0);
        let interceptor =
            CallInterceptor::new("todos", declared()).with_sleeper(NoSleep::default());
        let result: Result<(), _> = interceptor.call(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(CallError::NotFound(3))
        });
        assert_eq!(result, Err(CallError::NotFound(3)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn concurrent_invocations_are_independent() {
        let interceptor =
            CallInterceptor::new("todos", declared()).with_sleeper(NoSleep::default());
        let interceptor = &interceptor;
        std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    s.spawn(move || {
                        let calls = AtomicU32::new(0);
                        let result: Result<(), _> = interceptor.call(|| {
                            calls.fetch_add(1, Ordering::SeqCst);
                            Err(CallError::Unavailable)
                        });
                        (result, calls.load(Ordering::SeqCst))
                    })
                })
                .collect();
            for h in handles {
                let (result, calls) = h.join().unwrap();
                assert_eq!(result, Err(CallError::Unavailable));
                assert_eq!(calls, 5);
            }
        });
    }

    #[tokio::test(start_paused = true)]
    async fn async_call_passes_result_through() {
        let interceptor = CallInterceptor::new("todos", declared());
        let calls = AtomicU32::new(0);
        let result = interceptor
            .call_async(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(CallError::Unavailable)
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;
        assert_eq!(result, Ok(1));
    }

    #[test]
    fn registry_falls_back_for_undeclared_operations() {
        let registry = RetryRegistry::new()
            .with_fallback(RetryConfig::no_retry())
            .declare("todos", RetryConfig::default());
        assert_eq!(registry.interceptor("todos").config().max_attempts(), 3);
        assert_eq!(registry.interceptor("users").config().max_attempts(), 1);
        assert!(registry.get("users").is_none());
        assert_eq!(registry.operations().count(), 1);
    }
}
