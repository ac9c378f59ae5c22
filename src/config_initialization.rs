//! Configuration initialization and hierarchy management
//!
//! Precedence: CLI > environment > file > defaults. Command-line flags and
//! their `OBJCHOP_*` environment fallbacks arrive together as
//! [`ConfigOverrides`]; the file layer comes from [`ConfigLoader`].

use std::path::{Path, PathBuf};

use tracing::info;

use crate::adapters::toml_config::{AppConfig, ConfigLoader};
use crate::domain::model::{AnalyserSettings, ProductionProfileLimits};
use crate::error::ChopResult;
use crate::utils::logging::{LogFormat, LoggingConfig};

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub profile: Option<String>,
    pub lead_in_ns: Option<i64>,
    pub lead_out_ns: Option<i64>,
    pub min_gap_ns: Option<i64>,
    pub min_duration_ns: Option<i64>,
    pub max_gap_ns: Option<i64>,
    pub no_crop: bool,
    pub threshold: Option<f64>,
    pub block_size: Option<usize>,
    pub time_base_hz: Option<u32>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

impl ConfigOverrides {
    /// Number of values that override the lower layers
    pub fn count(&self) -> usize {
        [
            self.profile.is_some(),
            self.lead_in_ns.is_some(),
            self.lead_out_ns.is_some(),
            self.min_gap_ns.is_some(),
            self.min_duration_ns.is_some(),
            self.max_gap_ns.is_some(),
            self.no_crop,
            self.threshold.is_some(),
            self.block_size.is_some(),
            self.time_base_hz.is_some(),
            self.log_level.is_some(),
            self.log_format.is_some(),
        ]
        .iter()
        .filter(|set| **set)
        .count()
    }

    fn apply_limits(&self, limits: &mut ProductionProfileLimits) {
        if let Some(v) = self.lead_in_ns {
            limits.lead_in_ns = v;
        }
        if let Some(v) = self.lead_out_ns {
            limits.lead_out_ns = v;
        }
        if let Some(v) = self.min_gap_ns {
            limits.min_gap_ns = v;
        }
        if let Some(v) = self.min_duration_ns {
            limits.min_duration_ns = v;
        }
        if let Some(v) = self.max_gap_ns {
            limits.max_gap_ns = v;
        }
        if self.no_crop {
            limits.crop_objects = false;
        }
    }

    fn apply_analyser(&self, analyser: &mut AnalyserSettings) {
        if let Some(v) = self.threshold {
            analyser.threshold = v;
        }
        if let Some(v) = self.block_size {
            analyser.block_size = v;
        }
        if let Some(v) = self.time_base_hz {
            analyser.time_base_hz = v;
        }
    }

    fn apply_logging(&self, logging: &mut LoggingConfig) {
        if let Some(level) = &self.log_level {
            logging.level = level.clone();
        }
        if let Some(format) = self.log_format {
            logging.format = format;
        }
    }
}

/// Effective settings for one run
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub profile: String,
    pub limits: ProductionProfileLimits,
    pub analyser: AnalyserSettings,
    pub logging: LoggingConfig,
    /// File the configuration was read from, if any
    pub source: Option<PathBuf>,
}

/// Merge a loaded file configuration with overrides
pub fn resolve(config: AppConfig, source: Option<PathBuf>, overrides: &ConfigOverrides) -> ChopResult<ResolvedConfig> {
    let profile = overrides.profile.clone().unwrap_or_else(|| config.profile.clone());
    let mut limits = config.limits(&profile)?;
    overrides.apply_limits(&mut limits);
    limits.validate()?;

    let mut analyser = config.analyser;
    overrides.apply_analyser(&mut analyser);
    analyser.validate()?;

    let mut logging = config.logging;
    overrides.apply_logging(&mut logging);

    Ok(ResolvedConfig {
        profile,
        limits,
        analyser,
        logging,
        source,
    })
}

/// Initialize configuration hierarchy following precedence: CLI > Env > File > Defaults
pub fn initialize_configuration_hierarchy(
    loader: &ConfigLoader,
    config_path: Option<&Path>,
    overrides: &ConfigOverrides,
) -> ChopResult<ResolvedConfig> {
    let (config, source) = loader.load(config_path)?;
    let resolved = resolve(config, source, overrides)?;
    info!(
        profile = %resolved.profile,
        source = ?resolved.source,
        overrides = overrides.count(),
        "Configuration resolved"
    );
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::toml_config::ConfigFormat;
    use crate::domain::model::NS_PER_MS;
    use crate::error::ChopError;

    fn file_config() -> AppConfig {
        ConfigLoader::new()
            .parse_str(
                "profile = \"film\"\n[profiles.film]\nmin_gap_ns = 2000000000\nlead_in_ns = 40000000\n[analyser]\nblock_size = 256\n",
                ConfigFormat::Toml,
            )
            .unwrap()
    }

    #[test]
    fn test_file_over_defaults() {
        let resolved = resolve(file_config(), None, &ConfigOverrides::default()).unwrap();
        assert_eq!(resolved.profile, "film");
        assert_eq!(resolved.limits.min_gap_ns, 2000 * NS_PER_MS);
        assert_eq!(resolved.limits.lead_out_ns, 20 * NS_PER_MS);
        assert_eq!(resolved.analyser.block_size, 256);
    }

    #[test]
    fn test_overrides_over_file() {
        let overrides = ConfigOverrides {
            lead_in_ns: Some(5 * NS_PER_MS),
            no_crop: true,
            block_size: Some(2048),
            log_level: Some("debug".to_string()),
            ..Default::default()
        };
        let resolved = resolve(file_config(), None, &overrides).unwrap();
        assert_eq!(resolved.limits.lead_in_ns, 5 * NS_PER_MS);
        assert_eq!(resolved.limits.min_gap_ns, 2000 * NS_PER_MS);
        assert!(!resolved.limits.crop_objects);
        assert_eq!(resolved.analyser.block_size, 2048);
        assert_eq!(resolved.logging.level, "debug");
        assert_eq!(overrides.count(), 4);
    }

    #[test]
    fn test_profile_override_selects_profile() {
        let overrides = ConfigOverrides {
            profile: Some("default".to_string()),
            ..Default::default()
        };
        let resolved = resolve(file_config(), None, &overrides).unwrap();
        assert_eq!(resolved.limits, ProductionProfileLimits::default());
    }

    #[test]
    fn test_unknown_profile_fails() {
        let overrides = ConfigOverrides {
            profile: Some("radio".to_string()),
            ..Default::default()
        };
        let err = resolve(AppConfig::default(), None, &overrides).unwrap_err();
        assert!(matches!(err, ChopError::ConfigError { .. }));
    }

    #[test]
    fn test_negative_override_rejected() {
        let overrides = ConfigOverrides {
            min_gap_ns: Some(-1),
            ..Default::default()
        };
        assert!(resolve(AppConfig::default(), None, &overrides).is_err());
    }
}
