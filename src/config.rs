//! Configuration loading and management for scipan.
//!
//! Settings come from built-in defaults, an optional `scipan.toml`, and
//! environment variable overrides (credentials are only ever read from the
//! environment). The resulting [`Config`] is passed explicitly to every
//! component.

use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Name of the config file looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "scipan.toml";

pub const ENV_MODEL: &str = "OPENROUTER_MODEL";
pub const ENV_URL: &str = "OPENROUTER_URL";
pub const ENV_API_KEY: &str = "OPENROUTER_API_KEY";
pub const ENV_USER_AGENT: &str = "SCIPAN_USER_AGENT";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// What the digest is about and where it goes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
    /// Search topic, also embedded in the digest title
    pub topic: String,
    /// Maximum number of papers requested from the feed
    pub max_results: usize,
    /// Directory receiving `digest_<date>.md`
    pub output_dir: PathBuf,
}

/// arXiv search endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArxivConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

/// Chat-completion endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Model identifier (e.g., "mistralai/mistral-7b-instruct")
    pub model: String,
    /// OpenAI-compatible chat-completion URL
    pub url: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

/// API keys configuration (loaded from environment, never from the file)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiConfig {
    #[serde(skip)]
    pub openrouter_key: Option<String>,
}

/// Command-line overrides, applied after the file and environment
#[derive(Debug, Clone, Default, clap::Args)]
pub struct Overrides {
    /// Search topic (overrides config)
    #[arg(long)]
    pub topic: Option<String>,
    /// Maximum number of papers (overrides config)
    #[arg(long)]
    pub max_results: Option<NonZeroUsize>,
    /// Directory for digest files (overrides config)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub digest: DigestConfig,
    #[serde(default)]
    pub arxiv: ArxivConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

impl Config {
    /// Load configuration from the default location, falling back to
    /// built-in defaults when no file exists.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::find_config_file() {
            Some(path) => Self::read_file(&path)?,
            None => Config::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::read_file(path)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Override values from environment variables.
    ///
    /// Takes a lookup function so tests can supply variables without touching
    /// the process environment. Empty values count as unset.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(model) = get(ENV_MODEL) {
            self.llm.model = model;
        }
        if let Some(url) = get(ENV_URL) {
            self.llm.url = url;
        }
        if let Some(agent) = get(ENV_USER_AGENT) {
            self.arxiv.user_agent = agent;
        }
        if let Some(key) = get(ENV_API_KEY) {
            self.api.openrouter_key = Some(key);
        }
    }

    /// Apply command-line overrides; unset flags keep the current values
    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(topic) = &overrides.topic {
            self.digest.topic = topic.clone();
        }
        if let Some(max) = overrides.max_results {
            self.digest.max_results = max.get();
        }
        if let Some(dir) = &overrides.output_dir {
            self.digest.output_dir = dir.clone();
        }
    }

    /// Find the config file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let local_config = PathBuf::from(CONFIG_FILE_NAME);
        if local_config.exists() {
            return Some(local_config);
        }

        let home_config = dirs::home_dir()?
            .join(".config")
            .join("scipan")
            .join(CONFIG_FILE_NAME);
        home_config.exists().then_some(home_config)
    }

    /// The completion API key, if one is configured
    pub fn api_key(&self) -> Option<&str> {
        self.api.openrouter_key.as_deref()
    }
}

impl ArxivConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            topic: "microwave plasma CVD diamond growth".to_string(),
            max_results: 10,
            output_dir: PathBuf::from("digests"),
        }
    }
}

impl Default for ArxivConfig {
    fn default() -> Self {
        Self {
            base_url: "https://export.arxiv.org/api/query".to_string(),
            user_agent: "SciPAn/1.0 (mailto:you@example.com)".to_string(),
            timeout_secs: 15,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "mistralai/mistral-7b-instruct".to_string(),
            url: "https://api.openrouter.ai/v1/chat/completions".to_string(),
            temperature: 0.5,
            max_tokens: 300,
            timeout_secs: 30,
        }
    }
}
