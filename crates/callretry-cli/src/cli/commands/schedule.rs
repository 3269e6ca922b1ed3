//! `callretry schedule [operation]` – print the declared backoff schedule.

use anyhow::Result;
use callretry_core::config::ClientConfig;
use callretry_core::retry::{schedule, Backoff, RetryConfig};
use std::time::Duration;

fn describe_backoff(backoff: &Backoff) -> String {
    match backoff {
        Backoff::Fixed { period } => format!("fixed {}ms", period.as_millis()),
        Backoff::Exponential {
            initial_delay,
            max_delay,
            multiplier,
        } => format!(
            "exponential {}ms x{} (max {}ms)",
            initial_delay.as_millis(),
            multiplier,
            max_delay.as_millis()
        ),
    }
}

/// Attempts listed one per line; the rest are summarised.
const LISTED_ATTEMPTS: usize = 20;

/// True once every later delay is guaranteed to equal `delay`.
fn is_steady(backoff: &Backoff, delay: Duration) -> bool {
    match *backoff {
        Backoff::Fixed { .. } => true,
        Backoff::Exponential {
            max_delay,
            multiplier,
            ..
        } => {
            multiplier == 1.0
                || (multiplier > 1.0 && delay == max_delay)
                || (multiplier < 1.0 && delay.is_zero())
        }
    }
}

/// Sum of all delays, or `None` if it does not fit in a `Duration`.
///
/// Stops iterating once the delay is steady, so huge `max_attempts` stay cheap.
fn worst_case_wait(backoff: &Backoff, max_attempts: u32) -> Option<Duration> {
    let retries = max_attempts.saturating_sub(1);
    let mut total = Duration::ZERO;
    let mut done = 0u32;
    for delay in schedule(backoff, max_attempts) {
        done += 1;
        total = total.checked_add(delay)?;
        if is_steady(backoff, delay) {
            return total.checked_add(delay.checked_mul(retries - done)?);
        }
    }
    Some(total)
}

/// One line per attempt (up to a limit), then the worst-case total wait.
pub(crate) fn schedule_lines(operation: &str, declared: bool, cfg: &RetryConfig) -> Vec<String> {
    let source = if declared { "declared" } else { "fallback" };
    let retryable: Vec<&str> = cfg.retryable().iter().map(|k| k.as_str()).collect();
    let mut lines = vec![
        format!(
            "{operation} ({source}): max_attempts={}, backoff={}",
            cfg.max_attempts(),
            describe_backoff(cfg.backoff())
        ),
        format!(
            "  retryable: {}",
            if retryable.is_empty() {
                "-".to_string()
            } else {
                retryable.join(", ")
            }
        ),
        "  attempt 1: immediately".to_string(),
    ];
    let delays = schedule(cfg.backoff(), cfg.max_attempts());
    for (i, d) in delays.take(LISTED_ATTEMPTS).enumerate() {
        lines.push(format!("  attempt {}: after {}ms", i + 2, d.as_millis()));
    }
    let retries = cfg.max_attempts().saturating_sub(1) as usize;
    if retries > LISTED_ATTEMPTS {
        lines.push(format!("  ... {} more attempts", retries - LISTED_ATTEMPTS));
    }
    match worst_case_wait(cfg.backoff(), cfg.max_attempts()) {
        Some(total) => lines.push(format!("  worst-case wait: {}ms", total.as_millis())),
        None => lines.push("  worst-case wait: overflow".to_string()),
    }
    lines
}

pub fn run_schedule(cfg: &ClientConfig, operation: &str) -> Result<()> {
    let registry = cfg.registry()?;
    let declared = registry.get(operation).is_some();
    let retry = registry.resolve(operation);
    for line in schedule_lines(operation, declared, &retry) {
        println!("{line}");
    }
    Ok(())
}
