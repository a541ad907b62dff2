//! Configuration for the sync engine.
//!
//! One `SyncConfig` is constructed at process start (usually via
//! [`SyncConfig::from_env`]) and passed by reference into every component
//! constructor. There is no ambient or global configuration lookup.

use crate::retry::RetryPolicy;
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors. Fatal at startup, never during a cycle.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// One or more required values were absent.
    #[error("missing required config values: {keys}")]
    Missing {
        /// Comma-separated environment keys.
        keys: String,
    },

    /// A value was present but unparsable.
    #[error("invalid value for {key}: {value}")]
    Invalid {
        /// The offending environment key.
        key: String,
        /// The raw value.
        value: String,
    },
}

/// Connection settings for the lead source.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Base URL of the source REST API.
    pub api_url: String,
    /// Bearer token.
    pub api_token: String,
    /// Account/base identifier, used as a path segment.
    pub base_id: String,
    /// Table name, used as a path segment (URL-encoded).
    pub table: String,
}

impl SourceConfig {
    /// Creates source settings with the default table name.
    pub fn new(
        api_url: impl Into<String>,
        api_token: impl Into<String>,
        base_id: impl Into<String>,
    ) -> Self {
        Self {
            api_url: api_url.into(),
            api_token: api_token.into(),
            base_id: base_id.into(),
            table: "Leads".into(),
        }
    }

    /// Sets the table name.
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }
}

/// Connection settings for the task board.
#[derive(Debug, Clone)]
pub struct BoardConfig {
    /// Base URL of the board REST API.
    pub api_url: String,
    /// API key, sent as a query parameter.
    pub api_key: String,
    /// API token, sent as a query parameter.
    pub api_token: String,
    /// Board identifier.
    pub board_id: String,
    /// List id backing the TODO partition.
    pub list_todo_id: String,
    /// List id backing the IN_PROGRESS partition.
    pub list_in_progress_id: String,
    /// List id backing the DONE partition.
    pub list_done_id: String,
}

impl BoardConfig {
    /// Creates board settings.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        api_token: impl Into<String>,
        board_id: impl Into<String>,
        list_todo_id: impl Into<String>,
        list_in_progress_id: impl Into<String>,
        list_done_id: impl Into<String>,
    ) -> Self {
        Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
            api_token: api_token.into(),
            board_id: board_id.into(),
            list_todo_id: list_todo_id.into(),
            list_in_progress_id: list_in_progress_id.into(),
            list_done_id: list_done_id.into(),
        }
    }
}

/// Configuration for the whole sync process.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Lead source settings.
    pub source: SourceConfig,
    /// Task board settings.
    pub board: BoardConfig,
    /// Delay between polling-loop cycles.
    pub poll_interval: Duration,
    /// Log verbosity (tracing filter directive).
    pub log_level: String,
    /// Per-request timeout, independent of retries.
    pub timeout: Duration,
    /// Retry policy applied to every remote call.
    pub retry: RetryPolicy,
}

impl SyncConfig {
    /// Creates a configuration with default interval, timeout, and retry.
    pub fn new(source: SourceConfig, board: BoardConfig) -> Self {
        Self {
            source,
            board,
            poll_interval: Duration::from_secs(30),
            log_level: "INFO".into(),
            timeout: Duration::from_secs(20),
            retry: RetryPolicy::default(),
        }
    }

    /// Sets the polling interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the log verbosity.
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Loads and validates configuration from the process environment.
    ///
    /// Fails fast before any cycle runs: every missing credential or
    /// identifier is reported at once.
    pub fn from_env() -> Result<Self, ConfigError> {
        let poll_key = "SYNC_POLL_INTERVAL_SECONDS";
        let poll_raw = env_or(poll_key, "30");
        let poll_secs: u64 = poll_raw.parse().map_err(|_| ConfigError::Invalid {
            key: poll_key.into(),
            value: poll_raw.clone(),
        })?;

        let config = Self {
            source: SourceConfig {
                api_url: env_or("SOURCE_API_URL", ""),
                api_token: env_or("SOURCE_API_TOKEN", ""),
                base_id: env_or("SOURCE_BASE_ID", ""),
                table: env_or("SOURCE_TABLE_NAME", "Leads"),
            },
            board: BoardConfig {
                api_url: env_or("BOARD_API_URL", ""),
                api_key: env_or("BOARD_API_KEY", ""),
                api_token: env_or("BOARD_API_TOKEN", ""),
                board_id: env_or("BOARD_ID", ""),
                list_todo_id: env_or("BOARD_LIST_TODO_ID", ""),
                list_in_progress_id: env_or("BOARD_LIST_IN_PROGRESS_ID", ""),
                list_done_id: env_or("BOARD_LIST_DONE_ID", ""),
            },
            poll_interval: Duration::from_secs(poll_secs),
            log_level: env_or("LOG_LEVEL", "INFO"),
            timeout: Duration::from_secs(20),
            retry: RetryPolicy::default(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Checks that every credential and identifier is present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("SOURCE_API_URL", &self.source.api_url),
            ("SOURCE_API_TOKEN", &self.source.api_token),
            ("SOURCE_BASE_ID", &self.source.base_id),
            ("BOARD_API_URL", &self.board.api_url),
            ("BOARD_API_KEY", &self.board.api_key),
            ("BOARD_API_TOKEN", &self.board.api_token),
            ("BOARD_ID", &self.board.board_id),
            ("BOARD_LIST_TODO_ID", &self.board.list_todo_id),
            ("BOARD_LIST_IN_PROGRESS_ID", &self.board.list_in_progress_id),
            ("BOARD_LIST_DONE_ID", &self.board.list_done_id),
        ];

        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(key, _)| *key)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Missing {
                keys: missing.join(", "),
            })
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
