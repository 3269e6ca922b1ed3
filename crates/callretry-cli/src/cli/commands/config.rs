//! `callretry config` – show where the config lives and what it declares.

use anyhow::Result;
use callretry_core::config::{self, ClientConfig};
use std::path::Path;

pub fn run_config(cfg: &ClientConfig, explicit: Option<&Path>) -> Result<()> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => config::config_path()?,
    };
    println!("config:   {}", path.display());
    println!("base_url: {}", cfg.base_url);
    println!(
        "timeouts: connect {}s, total {}s",
        cfg.connect_timeout_secs, cfg.timeout_secs
    );
    let registry = cfg.registry()?;
    let ops: Vec<_> = registry.operations().collect();
    if ops.is_empty() {
        println!("No operations declared.");
    } else {
        println!("{:<16} {:<9} {}", "OPERATION", "ATTEMPTS", "RETRYABLE");
        for (name, retry) in ops {
            let kinds: Vec<&str> = retry.retryable().iter().map(|k| k.as_str()).collect();
            println!("{:<16} {:<9} {}", name, retry.max_attempts(), kinds.join(","));
        }
    }
    Ok(())
}
