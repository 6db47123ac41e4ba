//! Configuration management for the `FlightOnTime` service
//!
//! Handles loading configuration from a TOML file and environment variables,
//! and validates every setting before the service starts.

use crate::FlightOnTimeError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file used when no path is given on the command line
pub const DEFAULT_CONFIG_PATH: &str = "config/flightontime.toml";

/// Environment variable consulted when no weather API key is configured
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// Root configuration structure for the `FlightOnTime` service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlightOnTimeConfig {
    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Model artifact location
    #[serde(default)]
    pub model: ModelConfig,
    /// Airport directory override
    #[serde(default)]
    pub airports: AirportsConfig,
    /// Weather API configuration
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Batch prediction limits
    #[serde(default)]
    pub batch: BatchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Path to the JSON model artifact
    #[serde(default = "default_model_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AirportsConfig {
    /// JSON airport file; the bundled directory is used when absent
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Weather API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// OpenWeatherMap API key; without one every snapshot is simulated
    pub api_key: Option<String>,
    /// Current-weather endpoint
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    /// Per-airport request timeout in seconds
    #[serde(default = "default_weather_timeout")]
    pub timeout_seconds: u64,
}

impl WeatherConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Maximum number of requests accepted by one batch call
    #[serde(default = "default_batch_max_items")]
    pub max_items: usize,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8001
}

fn default_model_path() -> PathBuf {
    PathBuf::from("artifacts/delay_model.json")
}

fn default_weather_base_url() -> String {
    "https://api.openweathermap.org/data/2.5/weather".to_string()
}

fn default_weather_timeout() -> u64 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_batch_max_items() -> usize {
    100
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: default_model_path(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_weather_base_url(),
            timeout_seconds: default_weather_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_items: default_batch_max_items(),
        }
    }
}

impl FlightOnTimeConfig {
    /// Load configuration from the given file (optional) and environment.
    ///
    /// Environment variables use the `FLIGHTONTIME_` prefix and `__` between
    /// section and key, e.g. `FLIGHTONTIME_WEATHER__TIMEOUT_SECONDS=3`.
    pub fn load_from_path(config_path: Option<&Path>) -> Result<Self> {
        let config_file =
            config_path.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), Path::to_path_buf);

        let settings = Config::builder()
            .add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                Environment::with_prefix("FLIGHTONTIME")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| {
                format!(
                    "Failed to build configuration from {}",
                    config_file.display()
                )
            })?;

        let mut config: FlightOnTimeConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_api_key_fallback(std::env::var(API_KEY_ENV).ok());
        config.validate()?;

        Ok(config)
    }

    /// Use `fallback` as the weather API key when none is configured
    pub fn apply_api_key_fallback(&mut self, fallback: Option<String>) {
        if self.weather.api_key.is_none() {
            self.weather.api_key = fallback.filter(|key| !key.trim().is_empty());
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_key()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    fn validate_api_key(&self) -> Result<()> {
        if let Some(api_key) = &self.weather.api_key {
            if api_key.trim().is_empty() {
                return Err(FlightOnTimeError::config(
                    "Weather API key cannot be empty if provided. Either remove it or provide a valid key.",
                )
                .into());
            }
        }
        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(FlightOnTimeError::config("Server port cannot be 0").into());
        }

        if !(1..=60).contains(&self.weather.timeout_seconds) {
            return Err(FlightOnTimeError::config(
                "Weather API timeout must be between 1 and 60 seconds",
            )
            .into());
        }

        if !(1..=1000).contains(&self.batch.max_items) {
            return Err(FlightOnTimeError::config(
                "Batch size must be between 1 and 1000 items",
            )
            .into());
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(FlightOnTimeError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(FlightOnTimeError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        if !self.weather.base_url.starts_with("http://")
            && !self.weather.base_url.starts_with("https://")
        {
            return Err(FlightOnTimeError::config(
                "Weather API base URL must be a valid HTTP or HTTPS URL",
            )
            .into());
        }

        Ok(())
    }

    /// Socket address string for the listener
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
