//! Configuration for toll simulation execution
//!
//! This module provides configuration types for booth pacing, admission
//! capacity and plaza-wide lifecycle concurrency. Values are supplied once
//! at construction; [`SimulationConfig::from_env`] reads process-wide
//! defaults for binaries.

use crate::core::errors::{ConfigError, VehicleError};
use crate::core::vehicle::{PlateFormat, DEFAULT_PLATE_PATTERN};
use log::debug;
use std::time::Duration;

/// Default bounded queue capacity per booth
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;
/// Default full service time for one vehicle
pub const DEFAULT_PROCESSING_TIME: Duration = Duration::from_secs(1);
/// Default upper bound on the drain phase of `Booth::stop`
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);
/// Default wait of an idle or paused worker before re-checking
pub const DEFAULT_IDLE_BACKOFF: Duration = Duration::from_secs(1);
/// Default pause between two vehicles at the same booth
pub const DEFAULT_INTER_CYCLE_DELAY: Duration = Duration::from_millis(500);

/// Enumeration of supported concurrency modes for plaza-wide start/stop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConcurrencyMode {
    /// Booths are started and stopped one after the other
    #[default]
    Sequential,
    /// Booths are started and stopped in parallel on the Rayon pool
    Rayon,
}

impl std::str::FromStr for ConcurrencyMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(ConcurrencyMode::Sequential),
            "rayon" | "parallel" => Ok(ConcurrencyMode::Rayon),
            _ => Err(ConfigError::InvalidValue {
                key: "concurrency".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Per-booth configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoothConfig {
    /// Maximum number of vehicles waiting in the booth queue
    pub queue_capacity: usize,
    /// Full service time of one vehicle; each lifecycle event is followed by a third of it
    pub processing_time: Duration,
    /// How long `stop` waits for the queue to drain before discarding
    pub drain_timeout: Duration,
    /// Wake-up interval of an idle or paused worker
    pub idle_backoff: Duration,
    /// Pause after each processed vehicle
    pub inter_cycle_delay: Duration,
}

impl BoothConfig {
    pub fn new() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            processing_time: DEFAULT_PROCESSING_TIME,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
            idle_backoff: DEFAULT_IDLE_BACKOFF,
            inter_cycle_delay: DEFAULT_INTER_CYCLE_DELAY,
        }
    }

    /// Set the queue capacity. A capacity of zero is raised to one.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    pub fn with_processing_time(mut self, processing_time: Duration) -> Self {
        self.processing_time = processing_time;
        self
    }

    pub fn with_drain_timeout(mut self, drain_timeout: Duration) -> Self {
        self.drain_timeout = drain_timeout;
        self
    }

    pub fn with_idle_backoff(mut self, idle_backoff: Duration) -> Self {
        self.idle_backoff = idle_backoff;
        self
    }

    pub fn with_inter_cycle_delay(mut self, delay: Duration) -> Self {
        self.inter_cycle_delay = delay;
        self
    }

    /// Wait after each of the three lifecycle events
    pub fn event_delay(&self) -> Duration {
        self.processing_time / 3
    }
}

impl Default for BoothConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for a whole simulation run
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Settings applied to every booth
    pub booth: BoothConfig,
    /// How plazas cascade start/stop to their booths
    pub concurrency_mode: ConcurrencyMode,
    /// Regular expression every plate number must match
    pub plate_pattern: String,
}

impl SimulationConfig {
    /// Create a new simulation configuration with default values
    pub fn new() -> Self {
        Self {
            booth: BoothConfig::default(),
            concurrency_mode: ConcurrencyMode::default(),
            plate_pattern: DEFAULT_PLATE_PATTERN.to_string(),
        }
    }

    pub fn with_booth(mut self, booth: BoothConfig) -> Self {
        self.booth = booth;
        self
    }

    pub fn with_concurrency(mut self, mode: ConcurrencyMode) -> Self {
        self.concurrency_mode = mode;
        self
    }

    pub fn with_plate_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.plate_pattern = pattern.into();
        self
    }

    /// Compile the configured plate pattern
    pub fn plate_format(&self) -> Result<PlateFormat, VehicleError> {
        PlateFormat::new(&self.plate_pattern)
    }

    /// Build a configuration from `TOLLSIM_*` environment variables.
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new();

        if let Some(value) = lookup("TOLLSIM_QUEUE_CAPACITY") {
            config.booth = config.booth.with_queue_capacity(parse_value("TOLLSIM_QUEUE_CAPACITY", &value)?);
        }
        if let Some(value) = lookup("TOLLSIM_PROCESSING_MS") {
            config.booth.processing_time = parse_millis("TOLLSIM_PROCESSING_MS", &value)?;
        }
        if let Some(value) = lookup("TOLLSIM_DRAIN_TIMEOUT_MS") {
            config.booth.drain_timeout = parse_millis("TOLLSIM_DRAIN_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = lookup("TOLLSIM_IDLE_BACKOFF_MS") {
            config.booth.idle_backoff = parse_millis("TOLLSIM_IDLE_BACKOFF_MS", &value)?;
        }
        if let Some(value) = lookup("TOLLSIM_INTER_CYCLE_MS") {
            config.booth.inter_cycle_delay = parse_millis("TOLLSIM_INTER_CYCLE_MS", &value)?;
        }
        if let Some(value) = lookup("TOLLSIM_CONCURRENCY") {
            config.concurrency_mode = value.parse().map_err(|_| ConfigError::InvalidValue {
                key: "TOLLSIM_CONCURRENCY".to_string(),
                value: value.clone(),
            })?;
        }
        if let Some(value) = lookup("TOLLSIM_PLATE_PATTERN") {
            config.plate_pattern = value;
        }

        debug!("Loaded simulation config: {:?}", config);
        Ok(config)
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_millis(key: &str, value: &str) -> Result<Duration, ConfigError> {
    parse_value(key, value).map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = SimulationConfig::default();
        assert_eq!(config.concurrency_mode, ConcurrencyMode::Sequential);
        assert_eq!(config.booth.queue_capacity, 10);
        assert_eq!(config.booth.drain_timeout, Duration::from_secs(10));
        assert_eq!(config.plate_pattern, DEFAULT_PLATE_PATTERN);
    }

    #[test]
    fn test_config_builder() {
        let config = SimulationConfig::new()
            .with_concurrency(ConcurrencyMode::Rayon)
            .with_booth(BoothConfig::new().with_queue_capacity(0).with_processing_time(Duration::from_millis(300)));

        assert_eq!(config.concurrency_mode, ConcurrencyMode::Rayon);
        assert_eq!(config.booth.queue_capacity, 1);
        assert_eq!(config.booth.event_delay(), Duration::from_millis(100));
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("TOLLSIM_QUEUE_CAPACITY", "4"),
            ("TOLLSIM_PROCESSING_MS", "900"),
            ("TOLLSIM_CONCURRENCY", "rayon"),
            ("TOLLSIM_PLATE_PATTERN", r"^\d{4}$"),
        ]
        .into_iter()
        .collect();

        let config = SimulationConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();
        assert_eq!(config.booth.queue_capacity, 4);
        assert_eq!(config.booth.processing_time, Duration::from_millis(900));
        assert_eq!(config.booth.drain_timeout, DEFAULT_DRAIN_TIMEOUT);
        assert_eq!(config.concurrency_mode, ConcurrencyMode::Rayon);
        assert!(config.plate_format().unwrap().is_match("1234"));
    }

    #[test]
    fn test_from_lookup_rejects_garbage() {
        let err = SimulationConfig::from_lookup(|key| {
            (key == "TOLLSIM_DRAIN_TIMEOUT_MS").then(|| "soon".to_string())
        })
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: "TOLLSIM_DRAIN_TIMEOUT_MS".to_string(),
                value: "soon".to_string()
            }
        );
    }
}
