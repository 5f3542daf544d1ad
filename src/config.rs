use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::retry::{Backoff, RetryPolicy};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub wikigraph: WikigraphConfig,
    #[serde(default)]
    pub sparql: SparqlConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub metadata: MetadataConfig,
    /// File the configuration was read from; `None` when running on defaults.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// General settings
#[derive(Debug, Clone, Deserialize)]
pub struct WikigraphConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for WikigraphConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// SPARQL endpoint configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SparqlConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Delay after every successful request, in milliseconds.
    #[serde(default = "default_pause_ms")]
    pub pause_ms: u64,
}

impl Default for SparqlConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            pause_ms: default_pause_ms(),
        }
    }
}

/// Backoff applied when the endpoint throttles
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
    /// `fixed` or `exponential`
    #[serde(default = "default_strategy")]
    pub strategy: String,
    /// 0 means retry forever.
    #[serde(default)]
    pub max_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            backoff_ms: default_backoff_ms(),
            strategy: default_strategy(),
            max_attempts: 0,
        }
    }
}

/// Relation discovery configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GraphConfig {
    #[serde(default = "default_graph_batch_size")]
    pub batch_size: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            batch_size: default_graph_batch_size(),
        }
    }
}

/// Labels / descriptions / redirections fetch configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MetadataConfig {
    #[serde(default = "default_metadata_batch_size")]
    pub batch_size: usize,
    /// Batches between partial dumps, 0 disables checkpointing.
    #[serde(default = "default_checkpoint_every")]
    pub checkpoint_every: usize,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            batch_size: default_metadata_batch_size(),
            checkpoint_every: default_checkpoint_every(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_endpoint() -> String {
    "https://query.wikidata.org/bigdata/namespace/wdq/sparql".to_string()
}

fn default_user_agent() -> String {
    concat!("wikigraph/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_pause_ms() -> u64 {
    300
}

fn default_backoff_ms() -> u64 {
    100
}

fn default_strategy() -> String {
    "fixed".to_string()
}

fn default_graph_batch_size() -> usize {
    100
}

fn default_metadata_batch_size() -> usize {
    20
}

fn default_checkpoint_every() -> usize {
    10
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in WIKIGRAPH_CONFIG environment variable
    /// 2. ./config.toml in current directory
    pub fn load() -> Result<Self> {
        let _ = dotenv::dotenv();

        let config_path = Self::config_path();
        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let mut config = Self::from_toml(&config_str)?;
        config.source = Some(config_path);
        Ok(config)
    }

    /// Like [`Config::load`], but an absent config file yields the defaults.
    ///
    /// Runs before logging is set up, so callers report [`Config::source`]
    /// themselves once the logger exists.
    pub fn load_or_default() -> Result<Self> {
        let _ = dotenv::dotenv();

        let config_path = Self::config_path();
        if !config_path.exists() {
            let config = Config::default();
            config.validate()?;
            return Ok(config);
        }
        Self::load()
    }

    /// Parse and validate a TOML document
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config.toml")?;
        config.validate()?;
        Ok(config)
    }

    fn config_path() -> PathBuf {
        std::env::var("WIKIGRAPH_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"))
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        let endpoint = url::Url::parse(&self.sparql.endpoint)
            .with_context(|| format!("sparql.endpoint is not a valid URL: {}", self.sparql.endpoint))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            anyhow::bail!("sparql.endpoint must use http or https, got {}", endpoint.scheme());
        }

        if self.sparql.timeout_secs == 0 {
            anyhow::bail!("sparql.timeout_secs must be greater than 0");
        }

        if self.graph.batch_size == 0 {
            anyhow::bail!("graph.batch_size must be greater than 0");
        }

        if self.metadata.batch_size == 0 {
            anyhow::bail!("metadata.batch_size must be greater than 0");
        }

        if !matches!(self.retry.strategy.as_str(), "fixed" | "exponential") {
            anyhow::bail!(
                "retry.strategy must be \"fixed\" or \"exponential\", got \"{}\"",
                self.retry.strategy
            );
        }

        Ok(())
    }

    /// Retry policy described by the `[retry]` section
    pub fn retry_policy(&self) -> RetryPolicy {
        let delay = Duration::from_millis(self.retry.backoff_ms);
        let backoff = match self.retry.strategy.as_str() {
            "exponential" => Backoff::Exponential { initial: delay },
            _ => Backoff::Fixed(delay),
        };
        let max_attempts = (self.retry.max_attempts > 0).then_some(self.retry.max_attempts);
        RetryPolicy::new(backoff, max_attempts)
    }
}
