//! CLI for callretry.

mod commands;

use anyhow::Result;
use callretry_core::config::{self, ClientConfig};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use commands::{run_config, run_schedule, run_todo};

/// Top-level CLI for callretry.
#[derive(Debug, Parser)]
#[command(name = "callretry")]
#[command(about = "callretry: remote calls with declarative retry and backoff", long_about = None)]
pub struct Cli {
    /// Use this config file instead of ~/.config/callretry/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Fetch a todo through the retrying client and print it as JSON.
    Todo {
        /// Todo identifier.
        id: u64,
    },

    /// Show the backoff schedule declared for an operation.
    Schedule {
        /// Operation name.
        #[arg(default_value = "todos")]
        operation: String,
    },

    /// Show the config file path and the declared operations.
    Config,
}

fn load_config(path: Option<&Path>) -> Result<ClientConfig> {
    match path {
        Some(p) => config::load_from(p),
        None => config::load_or_init(),
    }
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = load_config(cli.config.as_deref())?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Todo { id } => run_todo(&cfg, id).await?,
            CliCommand::Schedule { operation } => run_schedule(&cfg, &operation)?,
            CliCommand::Config => run_config(&cfg, cli.config.as_deref())?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
