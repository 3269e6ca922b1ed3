//! Outbound todo client and its retrying decorator.
//!
//! `CurlTodoClient` performs single requests; `RetryingTodoClient` wraps any
//! `TodoClient` with the interceptor declared for the `todos` operation and
//! exposes the same trait, so callers cannot tell the two apart.

mod error;
mod http;

pub use error::{classify_curl_error, ClientError};
pub use http::CurlTodoClient;

use crate::control::AbortToken;
use crate::retry::{CallInterceptor, RetryRegistry};

/// Operation name under which the todo call is declared.
pub const TODOS_OPERATION: &str = "todos";

/// A remote source of todos.
pub trait TodoClient {
    fn todo(&self, id: u64) -> Result<serde_json::Value, ClientError>;
}

impl<C: TodoClient + ?Sized> TodoClient for &C {
    fn todo(&self, id: u64) -> Result<serde_json::Value, ClientError> {
        (**self).todo(id)
    }
}

impl<C: TodoClient + ?Sized> TodoClient for std::sync::Arc<C> {
    fn todo(&self, id: u64) -> Result<serde_json::Value, ClientError> {
        (**self).todo(id)
    }
}

/// `TodoClient` whose calls are retried per the `todos` declaration.
#[derive(Debug, Clone)]
pub struct RetryingTodoClient<C> {
    inner: C,
    interceptor: CallInterceptor,
}

impl<C: TodoClient> RetryingTodoClient<C> {
    pub fn new(inner: C, interceptor: CallInterceptor) -> Self {
        Self { inner, interceptor }
    }

    /// Wrap `inner` with the `todos` declaration from `registry`.
    pub fn from_registry(inner: C, registry: &RetryRegistry) -> Self {
        Self::new(inner, registry.interceptor(TODOS_OPERATION))
    }

    pub fn interceptor(&self) -> &CallInterceptor {
        &self.interceptor
    }
}

impl<C: TodoClient> TodoClient for RetryingTodoClient<C> {
    fn todo(&self, id: u64) -> Result<serde_json::Value, ClientError> {
        self.interceptor.call(|| self.inner.todo(id))
    }
}

impl<C> RetryingTodoClient<C>
where
    C: TodoClient + Clone + Send + 'static,
{
    /// Fetch from async code. Each attempt runs on the blocking pool;
    /// aborting `token` stops waiting on the attempt in flight and on any
    /// backoff sleep.
    pub async fn todo_cancellable(
        &self,
        id: u64,
        token: &AbortToken,
    ) -> Result<serde_json::Value, ClientError> {
        self.interceptor
            .call_cancellable(token, || {
                let inner = self.inner.clone();
                async move {
                    match tokio::task::spawn_blocking(move || inner.todo(id)).await {
                        Ok(result) => result,
                        Err(e) => Err(ClientError::Worker(e.to_string())),
                    }
                }
            })
            .await
    }
}
