// Config file adapter - Production profiles and settings from TOML or YAML files

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::model::{AnalyserSettings, ProductionProfileLimits};
use crate::error::{ChopError, ChopResult};
use crate::utils::logging::LoggingConfig;

/// Name of the built-in profile
pub const DEFAULT_PROFILE: &str = "default";

/// Locations tried, in order, when no config file is given explicitly
pub const DEFAULT_SEARCH_PATHS: &[&str] = &["config/objchop.toml", "objchop.toml", "objchop.yaml"];

/// File-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Profile selected when none is named on the command line
    pub profile: String,
    pub profiles: BTreeMap<String, ProductionProfileLimits>,
    pub analyser: AnalyserSettings,
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let mut profiles = BTreeMap::new();
        profiles.insert(DEFAULT_PROFILE.to_string(), ProductionProfileLimits::default());
        Self {
            profile: DEFAULT_PROFILE.to_string(),
            profiles,
            analyser: AnalyserSettings::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Limits of a named profile; the built-in profile is always available
    pub fn limits(&self, name: &str) -> ChopResult<ProductionProfileLimits> {
        match self.profiles.get(name) {
            Some(limits) => Ok(*limits),
            None if name == DEFAULT_PROFILE => Ok(ProductionProfileLimits::default()),
            None => Err(ChopError::ConfigError {
                message: format!(
                    "unknown profile '{}' (available: {})",
                    name,
                    self.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
                ),
            }),
        }
    }
}

/// Supported config file syntaxes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
}

impl ConfigFormat {
    /// Pick the syntax from a file extension
    pub fn from_path(path: &Path) -> ChopResult<Self> {
        match path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase()) {
            Some(ext) if ext == "toml" => Ok(ConfigFormat::Toml),
            Some(ext) if ext == "yaml" || ext == "yml" => Ok(ConfigFormat::Yaml),
            _ => Err(ChopError::ConfigError {
                message: format!("{} is neither .toml nor .yaml", path.display()),
            }),
        }
    }
}

/// Finds and parses config files
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    search_paths: Vec<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            search_paths: DEFAULT_SEARCH_PATHS.iter().map(PathBuf::from).collect(),
        }
    }

    /// Replace the default search locations
    pub fn with_search_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.search_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn parse_str(&self, text: &str, format: ConfigFormat) -> ChopResult<AppConfig> {
        let config: AppConfig = match format {
            ConfigFormat::Toml => toml::from_str(text)?,
            ConfigFormat::Yaml => serde_yaml::from_str(text)?,
        };
        for (name, limits) in &config.profiles {
            limits.validate().map_err(|e| ChopError::ConfigError {
                message: format!("profile '{}': {}", name, e),
            })?;
        }
        config.analyser.validate()?;
        Ok(config)
    }

    pub fn load_file(&self, path: &Path) -> ChopResult<AppConfig> {
        let format = ConfigFormat::from_path(path)?;
        let text = fs::read_to_string(path).map_err(|e| ChopError::ConfigError {
            message: format!("failed to read {}: {}", path.display(), e),
        })?;
        let config = self.parse_str(&text, format)?;
        info!(path = %path.display(), profiles = config.profiles.len(), "Loaded configuration");
        Ok(config)
    }

    /// Load `explicit` if given, else the first existing search path, else defaults.
    ///
    /// Returns the path the configuration came from.
    pub fn load(&self, explicit: Option<&Path>) -> ChopResult<(AppConfig, Option<PathBuf>)> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(ChopError::ConfigError {
                    message: format!("config file {} does not exist", path.display()),
                });
            }
            return Ok((self.load_file(path)?, Some(path.to_path_buf())));
        }

        for path in &self.search_paths {
            if path.exists() {
                return Ok((self.load_file(path)?, Some(path.clone())));
            }
        }
        debug!("No configuration file found, using defaults");
        Ok((AppConfig::default(), None))
    }
}
