//! Configuration management for the log detector.
//!
//! Settings are layered: built-in defaults, then an optional TOML file,
//! then `DDOS_`-prefixed environment variables.

use std::env;
use std::num::NonZeroUsize;
use std::time::Instant;

use chrono::Duration;
use ::config::{Config as ConfigBuilder, ConfigError, Environment, File};
use thiserror::Error;

use crate::models::{DetectionConfig, Settings};

/// Errors raised when loaded settings cannot drive a run
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SettingsError {
    #[error("{key} must be greater than zero")]
    ZeroValue { key: &'static str },
    #[error("{key} must not be empty")]
    EmptyValue { key: &'static str },
    #[error("{key} is out of range")]
    OutOfRange { key: &'static str },
}

/// Load settings from the config file and environment variables
pub fn load_settings() -> Result<Settings, ConfigError> {
    let config_file = env::var("CONFIG_FILE").unwrap_or_else(|_| "config/default.toml".to_string());
    let defaults = Settings::default();

    let config = ConfigBuilder::builder()
        .set_default("log_path", defaults.log_path)?
        .set_default("read_interval_secs", defaults.read_interval_secs as i64)?
        .set_default("bytes_to_read", defaults.bytes_to_read as i64)?
        .set_default("average_line_bytes", defaults.average_line_bytes as i64)?
        .set_default("threshold", defaults.threshold as i64)?
        .set_default("time_window_secs", defaults.time_window_secs as i64)?
        .set_default("url_pattern", defaults.url_pattern)?
        .set_default("lines_in_group", defaults.lines_in_group as i64)?
        .set_default("output_path", defaults.output_path)?
        .set_default("output_overwrite", defaults.output_overwrite)?
        .set_default("only_ipv4", defaults.only_ipv4)?
        .set_default("json_log_format", defaults.json_log_format)?
        .add_source(File::with_name(&config_file).required(false))
        .add_source(Environment::with_prefix("DDOS"))
        .build()?;

    config.try_deserialize()
}

impl Settings {
    /// Check every value the scan loop depends on and build the detection config
    pub fn validate(&self) -> Result<DetectionConfig, SettingsError> {
        non_zero("threshold", self.threshold as u64)?;
        non_zero("time_window_secs", self.time_window_secs)?;
        non_zero("bytes_to_read", self.bytes_to_read)?;
        non_zero("average_line_bytes", self.average_line_bytes)?;
        non_zero("read_interval_secs", self.read_interval_secs)?;
        if Instant::now()
            .checked_add(std::time::Duration::from_secs(self.read_interval_secs))
            .is_none()
        {
            return Err(SettingsError::OutOfRange { key: "read_interval_secs" });
        }
        let chunk_size = NonZeroUsize::new(self.lines_in_group)
            .ok_or(SettingsError::ZeroValue { key: "lines_in_group" })?;

        if self.log_path.trim().is_empty() {
            return Err(SettingsError::EmptyValue { key: "log_path" });
        }
        if self.output_path.trim().is_empty() {
            return Err(SettingsError::EmptyValue { key: "output_path" });
        }

        let window_secs = i64::try_from(self.time_window_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or(SettingsError::OutOfRange { key: "time_window_secs" })?;

        Ok(DetectionConfig {
            threshold: self.threshold,
            window: window_secs,
            url_filter: self.url_pattern.clone(),
            ipv4_only: self.only_ipv4,
            chunk_size,
        })
    }
}

fn non_zero(key: &'static str, value: u64) -> Result<(), SettingsError> {
    if value == 0 {
        return Err(SettingsError::ZeroValue { key });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_default_settings_are_valid() {
        let config = assert_ok!(Settings::default().validate());
        assert_eq!(config.threshold, 10);
        assert_eq!(config.window, Duration::seconds(60));
        assert_eq!(config.chunk_size.get(), 100);
        assert!(config.url_filter.is_empty());
        assert!(!config.ipv4_only);
    }

    #[test]
    fn test_zero_values_are_rejected() {
        let settings = Settings { threshold: 0, ..Settings::default() };
        assert_eq!(settings.validate().unwrap_err(), SettingsError::ZeroValue { key: "threshold" });

        let settings = Settings { time_window_secs: 0, ..Settings::default() };
        assert_eq!(
            settings.validate().unwrap_err(),
            SettingsError::ZeroValue { key: "time_window_secs" }
        );

        let settings = Settings { lines_in_group: 0, ..Settings::default() };
        assert_eq!(
            settings.validate().unwrap_err(),
            SettingsError::ZeroValue { key: "lines_in_group" }
        );

        let settings = Settings { bytes_to_read: 0, ..Settings::default() };
        assert_err!(settings.validate());
    }

    #[test]
    fn test_unschedulable_interval_is_rejected() {
        let settings = Settings { read_interval_secs: u64::MAX, ..Settings::default() };
        assert_eq!(
            settings.validate().unwrap_err(),
            SettingsError::OutOfRange { key: "read_interval_secs" }
        );

        let settings = Settings { read_interval_secs: 24 * 60 * 60, ..Settings::default() };
        assert_ok!(settings.validate());
    }

    #[test]
    fn test_empty_paths_are_rejected() {
        let settings = Settings { output_path: " ".to_string(), ..Settings::default() };
        assert_eq!(settings.validate().unwrap_err(), SettingsError::EmptyValue { key: "output_path" });
    }

    #[test]
    fn test_load_settings_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("detector.toml");
        std::fs::write(
            &path,
            "threshold = 3\ntime_window_secs = 10\nurl_pattern = \"login\"\nonly_ipv4 = true\n",
        )
        .unwrap();

        env::set_var("CONFIG_FILE", &path);
        let settings = load_settings().unwrap();
        env::remove_var("CONFIG_FILE");

        assert_eq!(settings.threshold, 3);
        assert_eq!(settings.time_window_secs, 10);
        assert_eq!(settings.url_pattern, "login");
        assert!(settings.only_ipv4);
        assert_eq!(settings.lines_in_group, 100);
        assert!(settings.json_time_layout.is_none());
    }
}
