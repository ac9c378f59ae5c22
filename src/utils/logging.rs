//! Logging configuration and subscriber setup

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::error::{ChopError, ChopResult};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line human-readable output
    Pretty,
    /// One line per event
    #[default]
    Compact,
    /// Newline-delimited JSON for log collectors
    Json,
}

/// Logging configuration options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set, e.g. `info` or `objchop_cli=debug`
    pub level: String,
    /// Output format
    pub format: LogFormat,
    /// Use ANSI colours
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
            ansi: true,
        }
    }
}

impl LoggingConfig {
    /// Build the filter, giving `RUST_LOG` priority over the configured level
    pub fn filter(&self) -> ChopResult<EnvFilter> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(&self.level).map_err(|e| ChopError::ConfigError {
                message: format!("invalid log level '{}': {}", self.level, e),
            }),
        }
    }

    /// Install the global subscriber. Events go to stderr so stdout stays
    /// free for command output.
    pub fn init(&self) -> ChopResult<()> {
        let filter = self.filter()?;
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_ansi(self.ansi);

        let result = match self.format {
            LogFormat::Pretty => builder.pretty().try_init(),
            LogFormat::Compact => builder.compact().try_init(),
            LogFormat::Json => builder.json().try_init(),
        };

        result.map_err(|e| ChopError::ConfigError {
            message: format!("failed to initialise logging: {}", e),
        })?;

        tracing::debug!(format = ?self.format, level = %self.level, "Logging initialised");
        Ok(())
    }
}
