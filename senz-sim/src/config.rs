//! Host configuration for the SENZ simulator.
//!
//! A single TOML file carries both the engine sections and a `[host]`
//! section:
//!
//! ```toml
//! [host]
//! tick_secs = 0.0333
//! cell_size = 16.0
//! log_format = "json"
//!
//! [senses]
//! vision_range = 60.0
//! ```

use serde::{Deserialize, Serialize};

use senz_core::config::SenzConfig;
use senz_core::error::{Result, SenzError};

use crate::telemetry::LogFormat;

/// Engine configuration plus host tuning.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimConfig {
    /// Scheduler and world settings.
    #[serde(default)]
    pub host: HostConfig,
    /// Per-agent engine settings, shared by every agent.
    #[serde(flatten)]
    pub senz: SenzConfig,
}

impl SimConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `SenzError::Config` if the TOML is invalid, or
    /// `SenzError::InvalidConfig` if a value is out of range.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str).map_err(|e| SenzError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Check host and engine values.
    ///
    /// # Errors
    /// Returns `SenzError::InvalidConfig` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if !(self.host.tick_secs.is_finite() && self.host.tick_secs > 0.0) {
            return Err(SenzError::InvalidConfig {
                field: "host.tick_secs",
                reason: format!("must be > 0 (got {})", self.host.tick_secs),
            });
        }
        if !(self.host.cell_size.is_finite() && self.host.cell_size > 0.0) {
            return Err(SenzError::InvalidConfig {
                field: "host.cell_size",
                reason: format!("must be > 0 (got {})", self.host.cell_size),
            });
        }
        self.senz.validate()
    }
}

/// Scheduler and world settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// Simulated seconds per frame.
    #[serde(default = "default_tick_secs")]
    pub tick_secs: f64,
    /// Broad-phase grid cell edge, in meters.
    #[serde(default = "default_cell_size")]
    pub cell_size: f32,
    /// Log output format.
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            tick_secs: default_tick_secs(),
            cell_size: default_cell_size(),
            log_format: LogFormat::default(),
        }
    }
}

fn default_tick_secs() -> f64 {
    1.0 / 30.0
}
fn default_cell_size() -> f32 {
    16.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SimConfig::default();
        assert!(config.validate().is_ok());
        assert!((config.host.tick_secs - 1.0 / 30.0).abs() < 1e-12);
        assert_eq!(config.senz.targeting.capacity, 10);
    }

    #[test]
    fn host_and_engine_sections_share_one_file() {
        let config = SimConfig::from_toml(
            r#"
            [host]
            tick_secs = 0.5
            log_format = "json"

            [senses]
            vision_range = 60.0

            [scan]
            interval = 2
            "#,
        )
        .expect("valid toml");
        assert!((config.host.tick_secs - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.host.log_format, LogFormat::Json);
        assert!((config.senz.senses.vision_range - 60.0).abs() < f32::EPSILON);
        assert_eq!(config.senz.scan.interval, 2);
    }

    #[test]
    fn rejects_bad_host_values() {
        let err = SimConfig::from_toml("[host]\ntick_secs = 0.0\n").expect_err("must be rejected");
        assert!(matches!(err, SenzError::InvalidConfig { field: "host.tick_secs", .. }));
        let err = SimConfig::from_toml("[targeting]\ncapacity = 0\n").expect_err("must be rejected");
        assert!(matches!(err, SenzError::InvalidConfig { field: "targeting.capacity", .. }));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("senz.toml");
        std::fs::write(&path, "[host]\ncell_size = 8.0\n").expect("write");
        let config = SimConfig::from_file(&path).expect("load");
        assert!((config.host.cell_size - 8.0).abs() < f32::EPSILON);
    }
}
