use crate::retry::{Backoff, ConfigError, FailureKind, RetryConfig, RetryRegistry};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

fn default_max_attempts() -> u32 {
    3
}

fn default_retryable() -> Vec<FailureKind> {
    vec![
        FailureKind::Timeout,
        FailureKind::Connection,
        FailureKind::Throttled,
        FailureKind::ServerError,
    ]
}

fn default_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    30_000
}

/// Backoff parameters of a declared operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackoffSpec {
    /// Fixed period, or initial interval when `multiplier` is non-zero.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    /// Cap for exponential backoff. Ignored for fixed backoff.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// 0 = fixed backoff; anything else = exponential growth factor.
    #[serde(default)]
    pub multiplier: f64,
}

impl Default for BackoffSpec {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            multiplier: 0.0,
        }
    }
}

/// Retry declaration as written in `config.toml` (`[operations.<name>]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrySpec {
    /// Total attempts including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Failure kinds eligible for retry; anything else fails immediately.
    #[serde(default = "default_retryable")]
    pub retryable: Vec<FailureKind>,
    #[serde(default)]
    pub backoff: BackoffSpec,
}

impl Default for RetrySpec {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retryable: default_retryable(),
            backoff: BackoffSpec::default(),
        }
    }
}

impl RetrySpec {
    /// Validate into the immutable config used by interceptors.
    pub fn to_config(&self) -> Result<RetryConfig, ConfigError> {
        let backoff = Backoff::from_params(
            Duration::from_millis(self.backoff.delay_ms),
            Duration::from_millis(self.backoff.max_delay_ms),
            self.backoff.multiplier,
        )?;
        RetryConfig::new(self.max_attempts, self.retryable.iter().copied(), backoff)
    }
}

/// Global configuration loaded from `~/.config/callretry/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the remote todo service.
    pub base_url: String,
    /// Connect timeout per attempt, in seconds.
    pub connect_timeout_secs: u64,
    /// Whole-request timeout per attempt, in seconds.
    pub timeout_secs: u64,
    /// Retry policy for operations without their own section. Defaults apply if missing.
    #[serde(default)]
    pub fallback: Option<RetrySpec>,
    /// Per-operation retry declarations.
    #[serde(default)]
    pub operations: BTreeMap<String, RetrySpec>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let todos = RetrySpec {
            max_attempts: 5,
            retryable: default_retryable(),
            backoff: BackoffSpec {
                delay_ms: 500,
                max_delay_ms: 20_000,
                multiplier: 4.0,
            },
        };
        Self {
            base_url: "https://jsonplaceholder.typicode.com".to_string(),
            connect_timeout_secs: 10,
            timeout_secs: 30,
            fallback: None,
            operations: BTreeMap::from([("todos".to_string(), todos)]),
        }
    }
}

impl ClientConfig {
    pub fn base_url(&self) -> Result<Url> {
        Url::parse(&self.base_url).with_context(|| format!("invalid base_url {:?}", self.base_url))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Build the registry of declared operations.
    pub fn registry(&self) -> Result<RetryRegistry> {
        let fallback = self
            .fallback
            .clone()
            .unwrap_or_default()
            .to_config()
            .context("invalid fallback retry declaration")?;
        let mut registry = RetryRegistry::new().with_fallback(fallback);
        for (name, spec) in &self.operations {
            let cfg = spec
                .to_config()
                .with_context(|| format!("invalid retry declaration for operation {name:?}"))?;
            registry = registry.declare(name.clone(), cfg);
        }
        Ok(registry)
    }

    /// Check everything that is otherwise only checked lazily.
    pub fn validate(&self) -> Result<()> {
        self.base_url()?;
        self.registry()?;
        Ok(())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("callretry")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load and validate configuration from `path`.
pub fn load_from(path: &Path) -> Result<ClientConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let cfg: ClientConfig =
        toml::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Write the default configuration to `path`, creating parent directories.
pub fn write_default(path: &Path) -> Result<ClientConfig> {
    let default_cfg = ClientConfig::default();
    let toml = toml::to_string_pretty(&default_cfg)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, toml)?;
    tracing::info!("created default config at {}", path.display());
    Ok(default_cfg)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<ClientConfig> {
    let path = config_path()?;
    if !path.exists() {
        return write_default(&path);
    }
    load_from(&path)
}
