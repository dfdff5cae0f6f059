//! Agent configuration
//!
//! Secrets come from the process environment and are required: a missing
//! one is startup-fatal, before any candidate is fetched. Tunables and the
//! mailbox filter come from an optional TOML settings file with defaults
//! matching the stock deployment.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tallyman_domain::MailboxQuery;
use tallyman_extractor::CategoryRules;
use thiserror::Error;

/// Environment variable holding the classification-service API key
pub const ENV_API_KEY: &str = "GEMINI_API_KEY";
/// Environment variable holding the target dataset identifier
pub const ENV_SHEET_ID: &str = "SHEET_ID";
/// Environment variable holding the target table identifier
pub const ENV_SHEET_NAME: &str = "SHEET_NAME";
/// Environment variable holding the processed-marker label name
pub const ENV_PROCESSED_LABEL: &str = "PROCESSED_LABEL";

/// Agent configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required secret is absent from the environment
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    /// Failed to read the settings file
    #[error("Failed to read settings file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the settings TOML
    #[error("Failed to parse settings TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Settings or rule table failed validation
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Mailbox filter settings, translated into a [`MailboxQuery`] at run time
#[derive(Debug, Clone, Deserialize)]
pub struct FilterSettings {
    /// Sender substring candidates must match
    #[serde(default = "default_from")]
    pub from: String,

    /// Subject substrings; any match qualifies a message
    #[serde(default = "default_subject_any")]
    pub subject_any: Vec<String>,

    /// Substring that disqualifies a message outright
    #[serde(default = "default_exclude_text")]
    pub exclude_text: Option<String>,
}

fn default_from() -> String {
    "capitalone".to_string()
}

fn default_subject_any() -> Vec<String> {
    vec![
        "transaction".to_string(),
        "withdrawal notice".to_string(),
        "You sent money with Zelle".to_string(),
    ]
}

fn default_exclude_text() -> Option<String> {
    Some("CAPITAL ONE has initiated".to_string())
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            from: default_from(),
            subject_any: default_subject_any(),
            exclude_text: default_exclude_text(),
        }
    }
}

/// Tunable (non-secret) agent settings loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct AgentSettings {
    /// Classification model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Classification service endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Maximum candidate threads fetched per run
    #[serde(default = "default_batch_limit")]
    pub batch_limit: usize,

    /// Pause after each successful classification call (seconds)
    #[serde(default = "default_throttle_secs")]
    pub throttle_secs: u64,

    /// Mailbox filter
    #[serde(default)]
    pub filter: FilterSettings,

    /// Optional path to a custom category rule table (TOML)
    #[serde(default)]
    pub rules_path: Option<PathBuf>,
}

fn default_model() -> String {
    "gemini-2.5-flash-lite".to_string()
}

fn default_endpoint() -> String {
    tallyman_llm::gemini::DEFAULT_ENDPOINT.to_string()
}

fn default_batch_limit() -> usize {
    15
}

fn default_throttle_secs() -> u64 {
    10
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            endpoint: default_endpoint(),
            batch_limit: default_batch_limit(),
            throttle_secs: default_throttle_secs(),
            filter: FilterSettings::default(),
            rules_path: None,
        }
    }
}

impl AgentSettings {
    /// Load settings from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let settings: AgentSettings = toml::from_str(&contents)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_limit == 0 {
            return Err(ConfigError::Invalid(
                "batch_limit must be greater than 0".to_string(),
            ));
        }
        if self.filter.subject_any.is_empty() {
            return Err(ConfigError::Invalid(
                "filter.subject_any must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Immutable agent configuration, constructed once at process start
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Classification service API key
    pub api_key: String,

    /// Target dataset identifier (directory holding the table)
    pub sheet_id: String,

    /// Target table identifier (file stem of the table)
    pub sheet_name: String,

    /// Processed-marker label name
    pub processed_label: String,

    /// Non-secret tunables
    pub settings: AgentSettings,
}

impl AgentConfig {
    /// Build the configuration from the process environment with default
    /// settings
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with_settings(AgentSettings::default())
    }

    /// Build the configuration from the process environment with explicit
    /// settings
    pub fn from_env_with_settings(settings: AgentSettings) -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok(), settings)
    }

    /// Build the configuration from an arbitrary variable lookup
    ///
    /// Fails fast: every secret must be present and non-empty.
    pub fn from_lookup<F>(lookup: F, settings: AgentSettings) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |name: &'static str| -> Result<String, ConfigError> {
            lookup(name)
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::MissingVar(name))
        };

        Ok(Self {
            api_key: require(ENV_API_KEY)?,
            sheet_id: require(ENV_SHEET_ID)?,
            sheet_name: require(ENV_SHEET_NAME)?,
            processed_label: require(ENV_PROCESSED_LABEL)?,
            settings,
        })
    }

    /// The declarative mailbox query for one run
    pub fn mailbox_query(&self) -> MailboxQuery {
        MailboxQuery {
            from: self.settings.filter.from.clone(),
            subject_any: self.settings.filter.subject_any.clone(),
            exclude_text: self.settings.filter.exclude_text.clone(),
            without_label: self.processed_label.clone(),
            limit: self.settings.batch_limit,
        }
    }

    /// The category rule table for this deployment: the stock table, or
    /// the one named by `settings.rules_path`
    pub fn load_rules(&self) -> Result<CategoryRules, ConfigError> {
        match &self.settings.rules_path {
            Some(path) => CategoryRules::from_file(path).map_err(ConfigError::Invalid),
            None => Ok(CategoryRules::default()),
        }
    }
}
