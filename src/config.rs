//! Emulator configuration.
//!
//! Settings can come from a JSON file and are then overridden by command
//! line flags. The engine itself only sees the final [`EmulatorConfig`].

use std::path::Path;
use std::time::Duration;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Default clock rate: two pulses per second.
pub const DEFAULT_CLOCK_HZ: f64 = 2.0;

/// Runtime settings for the emulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmulatorConfig {
    /// Clock rate in pulses per second.
    pub clock_hz: f64,
    /// Report a register snapshot after every step.
    pub trace: bool,
    /// Initial value of the input port (0-15).
    pub input: u8,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            clock_hz: DEFAULT_CLOCK_HZ,
            trace: false,
            input: 0,
        }
    }
}

impl EmulatorConfig {
    /// Parse a configuration from JSON text.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: EmulatorConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_json(&text)
    }

    /// Time between two clock pulses.
    ///
    /// Fails for rates that are not positive or so slow that the period
    /// does not fit in a [`Duration`].
    pub fn clock_period(&self) -> Result<Duration, ConfigError> {
        if !self.clock_hz.is_finite() || self.clock_hz <= 0.0 {
            return Err(ConfigError::InvalidClock(self.clock_hz));
        }
        Duration::try_from_secs_f64(1.0 / self.clock_hz)
            .map_err(|_| ConfigError::InvalidClock(self.clock_hz))
    }

    /// Check that every field is in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.clock_period()?;
        if self.input > 0x0F {
            return Err(ConfigError::InvalidInput(self.input));
        }
        Ok(())
    }
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("invalid config: {0}")]
    Parse(String),

    #[error("clock rate {0} Hz is out of range")]
    InvalidClock(f64),

    #[error("input port value {0} does not fit in 4 bits")]
    InvalidInput(u8),
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = EmulatorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.clock_hz, 2.0);
        assert!(!config.trace);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EmulatorConfig::from_json(r#"{ "trace": true }"#).unwrap();
        assert!(config.trace);
        assert_eq!(config.clock_hz, DEFAULT_CLOCK_HZ);
        assert_eq!(config.input, 0);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            EmulatorConfig::from_json(r#"{ "clock_hz": 0 }"#),
            Err(ConfigError::InvalidClock(_))
        ));
        assert!(matches!(
            EmulatorConfig::from_json(r#"{ "input": 16 }"#),
            Err(ConfigError::InvalidInput(16))
        ));
        assert!(matches!(
            EmulatorConfig::from_json("not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_rejects_unrepresentable_clock() {
        assert!(matches!(
            EmulatorConfig::from_json(r#"{ "clock_hz": 1e-20 }"#),
            Err(ConfigError::InvalidClock(hz)) if hz == 1e-20
        ));

        let slow = EmulatorConfig { clock_hz: 0.5, ..EmulatorConfig::default() };
        assert_eq!(slow.clock_period().unwrap(), Duration::from_secs(2));
    }
}
