//! `callretry todo <id>` – fetch one todo through the retrying client.

use anyhow::{Context, Result};
use callretry_core::client::{CurlTodoClient, RetryingTodoClient};
use callretry_core::config::ClientConfig;
use callretry_core::control::AbortToken;

pub async fn run_todo(cfg: &ClientConfig, id: u64) -> Result<()> {
    let registry = cfg.registry()?;
    let client = RetryingTodoClient::from_registry(CurlTodoClient::from_config(cfg)?, &registry);

    // Ctrl-C aborts the in-flight attempt or backoff wait.
    let token = AbortToken::new();
    let ctrl_c = tokio::spawn({
        let token = token.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                token.abort();
            }
        }
    });

    let result = client.todo_cancellable(id, &token).await;
    ctrl_c.abort();

    let todo = result.with_context(|| format!("fetching todo {id}"))?;
    println!("{}", serde_json::to_string_pretty(&todo)?);
    Ok(())
}
