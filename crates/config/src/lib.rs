#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for banker
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded, the reference five requester setup)
//! - Configuration file (~/.config/banker/config.toml)
//! - Environment variables
//! - CLI flags (applied by the binary)

use banker_errors::{ConfigError, Error};
use banker_types::{ColorChoice, DemandPolicy, OutputFormat, ResourceVector};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub ledger: LedgerConfig,

    #[serde(default)]
    pub simulation: SimulationConfig,

    #[serde(default)]
    pub backoff: BackoffConfig,
}

/// General configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeneralConfig {
    #[serde(default = "default_output_format")]
    pub default_output: OutputFormat,
    #[serde(default = "default_color_choice")]
    pub color: ColorChoice,
}

/// Initial ledger shape
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerConfig {
    #[serde(default)]
    pub policy: DemandPolicy,
    /// Units of each resource type
    #[serde(default = "default_total")]
    pub total: Vec<u32>,
    /// One row per requester, one column per resource type
    #[serde(default = "default_maximum")]
    pub maximum: Vec<Vec<u32>>,
}

/// Requester task behaviour
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SimulationConfig {
    #[serde(default = "default_duration_secs")]
    pub duration_secs: u64,
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,
    /// Upper bound on a single request per resource type
    #[serde(default = "default_max_request_per_type")]
    pub max_request_per_type: u32,
    #[serde(default = "default_hold_min_ms")]
    pub hold_min_ms: u64,
    #[serde(default = "default_hold_max_ms")]
    pub hold_max_ms: u64,
    #[serde(default = "default_pause_min_ms")]
    pub pause_min_ms: u64,
    #[serde(default = "default_pause_max_ms")]
    pub pause_max_ms: u64,
    /// Sleep after drawing an all-zero request
    #[serde(default = "default_idle_ms")]
    pub idle_ms: u64,
    /// Fixed seed for reproducible runs
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Retry delays after a denied request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackoffConfig {
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    #[serde(default = "default_jitter_factor")]
    pub jitter_factor: f64,
}

// Default implementations

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_output: OutputFormat::Tty,
            color: ColorChoice::Auto,
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            policy: DemandPolicy::default(),
            total: default_total(),
            maximum: default_maximum(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            duration_secs: default_duration_secs(),
            tick_secs: default_tick_secs(),
            max_request_per_type: default_max_request_per_type(),
            hold_min_ms: default_hold_min_ms(),
            hold_max_ms: default_hold_max_ms(),
            pause_min_ms: default_pause_min_ms(),
            pause_max_ms: default_pause_max_ms(),
            idle_ms: default_idle_ms(),
            seed: None,
        }
    }
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            multiplier: default_multiplier(),
            jitter_factor: default_jitter_factor(),
        }
    }
}

// Default value functions for serde
fn default_output_format() -> OutputFormat {
    OutputFormat::Tty
}

fn default_color_choice() -> ColorChoice {
    ColorChoice::Auto
}

fn default_total() -> Vec<u32> {
    vec![10, 5, 7, 3, 2]
}

fn default_maximum() -> Vec<Vec<u32>> {
    vec![
        vec![2, 2, 1, 1, 1],
        vec![1, 1, 2, 1, 1],
        vec![4, 1, 2, 0, 0],
        vec![1, 0, 1, 1, 0],
        vec![2, 1, 1, 0, 0],
    ]
}

fn default_duration_secs() -> u64 {
    30
}

fn default_tick_secs() -> u64 {
    1
}

fn default_max_request_per_type() -> u32 {
    2
}

fn default_hold_min_ms() -> u64 {
    1000
}

fn default_hold_max_ms() -> u64 {
    4000
}

fn default_pause_min_ms() -> u64 {
    1000
}

fn default_pause_max_ms() -> u64 {
    3000
}

fn default_idle_ms() -> u64 {
    200
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    5000
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_jitter_factor() -> f64 {
    0.1
}

impl LedgerConfig {
    /// Totals as a resource vector
    #[must_use]
    pub fn total_vector(&self) -> ResourceVector {
        ResourceVector::new(self.total.clone())
    }

    /// Maximum matrix as one resource vector per requester
    #[must_use]
    pub fn maximum_rows(&self) -> Vec<ResourceVector> {
        self.maximum
            .iter()
            .map(|row| ResourceVector::new(row.clone()))
            .collect()
    }
}

impl SimulationConfig {
    #[must_use]
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }

    #[must_use]
    pub fn tick(&self) -> Duration {
        Duration::from_secs(self.tick_secs)
    }

    #[must_use]
    pub fn idle(&self) -> Duration {
        Duration::from_millis(self.idle_ms)
    }

    /// Bounds for how long a granted request is held, in milliseconds
    #[must_use]
    pub fn hold_range_ms(&self) -> RangeInclusive<u64> {
        self.hold_min_ms..=self.hold_max_ms
    }

    /// Bounds for the pause between iterations, in milliseconds
    #[must_use]
    pub fn pause_range_ms(&self) -> RangeInclusive<u64> {
        self.pause_min_ms..=self.pause_max_ms
    }
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir.join("banker").join("config.toml"))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        let config: Self = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if config_path.exists() {
            Self::load_from_file(&config_path).await
        } else {
            tracing::debug!(path = %config_path.display(), "no configuration file, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        // BANKER_OUTPUT
        if let Ok(output) = std::env::var("BANKER_OUTPUT") {
            self.general.default_output = match output.as_str() {
                "plain" => OutputFormat::Plain,
                "tty" => OutputFormat::Tty,
                "json" => OutputFormat::Json,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "BANKER_OUTPUT".to_string(),
                        value: output,
                    }
                    .into())
                }
            };
        }

        // BANKER_COLOR
        if let Ok(color) = std::env::var("BANKER_COLOR") {
            self.general.color = match color.as_str() {
                "always" => ColorChoice::Always,
                "auto" => ColorChoice::Auto,
                "never" => ColorChoice::Never,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "BANKER_COLOR".to_string(),
                        value: color,
                    }
                    .into())
                }
            };
        }

        if let Some(duration) = parse_env("BANKER_DURATION")? {
            self.simulation.duration_secs = duration;
        }

        if let Some(seed) = parse_env("BANKER_SEED")? {
            self.simulation.seed = Some(seed);
        }

        if let Some(max_request) = parse_env("BANKER_MAX_REQUEST")? {
            self.simulation.max_request_per_type = max_request;
        }

        Ok(())
    }

    /// Check value ranges that serde cannot express.
    ///
    /// Ledger shape (row lengths, demand against totals) is checked when
    /// the ledger is initialized.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` describing the first bad value.
    pub fn validate(&self) -> Result<(), Error> {
        let sim = &self.simulation;
        let backoff = &self.backoff;

        let problem = if sim.tick_secs == 0 {
            Some("simulation.tick_secs must be at least 1".to_string())
        } else if sim.max_request_per_type == 0 {
            Some("simulation.max_request_per_type must be at least 1".to_string())
        } else if sim.hold_min_ms > sim.hold_max_ms {
            Some(format!(
                "simulation.hold_min_ms ({}) exceeds hold_max_ms ({})",
                sim.hold_min_ms, sim.hold_max_ms
            ))
        } else if sim.pause_min_ms > sim.pause_max_ms {
            Some(format!(
                "simulation.pause_min_ms ({}) exceeds pause_max_ms ({})",
                sim.pause_min_ms, sim.pause_max_ms
            ))
        } else if backoff.initial_delay_ms > backoff.max_delay_ms {
            Some(format!(
                "backoff.initial_delay_ms ({}) exceeds max_delay_ms ({})",
                backoff.initial_delay_ms, backoff.max_delay_ms
            ))
        } else if backoff.multiplier.is_nan() || backoff.multiplier < 1.0 {
            Some(format!(
                "backoff.multiplier must be at least 1.0, got {}",
                backoff.multiplier
            ))
        } else if !(0.0..=1.0).contains(&backoff.jitter_factor) {
            Some(format!(
                "backoff.jitter_factor must be within [0, 1], got {}",
                backoff.jitter_factor
            ))
        } else {
            None
        };

        match problem {
            Some(message) => Err(ConfigError::Invalid { message }.into()),
            None => Ok(()),
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>, Error> {
    match std::env::var(name) {
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|_| {
                ConfigError::InvalidValue {
                    field: name.to_string(),
                    value,
                }
                .into()
            }),
        Err(_) => Ok(None),
    }
}
