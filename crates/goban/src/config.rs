//! Configuration management for the goban host.
//!
//! Loads the TOML configuration file, applies command-line overrides and
//! converts the result into the settings the match service runs with.

use crate::cli::CliArgs;
use goban_rules::{MatchConfig, ScoringMode};
use goban_server::ServerConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

fn default_match_timeout_secs() -> u64 {
    30 * 60
}

fn default_sweep_interval_secs() -> u64 {
    300
}

/// Application configuration loaded from TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Match expiry settings
    #[serde(default)]
    pub registry: RegistrySettings,
    /// Settings for matches created without explicit ones
    #[serde(default)]
    pub defaults: MatchDefaults,
    /// Logging configuration settings
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Match expiry settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrySettings {
    /// Seconds of inactivity after which a match is removed
    #[serde(default = "default_match_timeout_secs")]
    pub match_timeout_secs: u64,
    /// Seconds between sweeps for inactive matches
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            match_timeout_secs: default_match_timeout_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

/// Board, komi and clock used when a match is created with defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchDefaults {
    pub board_size: usize,
    pub komi: f64,
    pub main_time_secs: u64,
    pub overtime_secs: u64,
    pub overtime_periods: u32,
    pub scoring: ScoringMode,
}

impl Default for MatchDefaults {
    fn default() -> Self {
        let config = MatchConfig::default();
        Self {
            board_size: config.board_size,
            komi: config.komi,
            main_time_secs: config.main_time_secs,
            overtime_secs: config.overtime_secs,
            overtime_periods: config.overtime_periods,
            scoring: config.scoring,
        }
    }
}

impl MatchDefaults {
    fn to_match_config(&self) -> MatchConfig {
        MatchConfig {
            board_size: self.board_size,
            komi: self.komi,
            main_time_secs: self.main_time_secs,
            overtime_secs: self.overtime_secs,
            overtime_periods: self.overtime_periods,
            scoring: self.scoring,
            ..MatchConfig::default()
        }
    }
}

/// Logging system configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: String,
    /// Whether to output logs in JSON format
    #[serde(default)]
    pub json_format: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            registry: RegistrySettings::default(),
            defaults: MatchDefaults::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// If the file doesn't exist, writes the default configuration to that
    /// path and returns it.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// The loaded or default configuration, or an error if reading, parsing
    /// or creating the file failed.
    pub async fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        if tokio::fs::try_exists(path).await? {
            let content = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// Applies command-line overrides.
    pub fn apply_cli(&mut self, args: &CliArgs) {
        if let Some(level) = &args.log_level {
            self.logging.level = level.clone();
        }
        if args.json_logs {
            self.logging.json_format = true;
        }
        if let Some(secs) = args.match_timeout_secs {
            self.registry.match_timeout_secs = secs;
        }
        if let Some(secs) = args.sweep_interval_secs {
            self.registry.sweep_interval_secs = secs;
        }
    }

    /// Settings for the match service.
    pub fn to_server_config(&self) -> ServerConfig {
        ServerConfig {
            match_timeout: Duration::from_secs(self.registry.match_timeout_secs),
            sweep_interval: Duration::from_secs(self.registry.sweep_interval_secs),
            match_defaults: self.defaults.to_match_config(),
        }
    }

    /// Checks the configuration for consistency.
    ///
    /// # Returns
    ///
    /// `Ok(())` if the configuration is valid, or a message describing the
    /// first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.registry.match_timeout_secs == 0 {
            return Err("Match timeout must be greater than zero".to_string());
        }
        if self.registry.sweep_interval_secs == 0 {
            return Err("Sweep interval must be greater than zero".to_string());
        }

        self.defaults
            .to_match_config()
            .validate_settings()
            .map_err(|e| format!("Invalid match defaults: {e}"))?;

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {valid_levels:?}",
                &self.logging.level
            ));
        }

        Ok(())
    }
}
