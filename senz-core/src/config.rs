//! Configuration for the SENZ perception system.
//!
//! Maps directly to `senz.toml`:
//!
//! ```toml
//! [senses]
//! fov_half_angle_deg = 110.0
//! vision_range = 100.0
//! scent_range = 0.0
//!
//! [targeting]
//! retain_nearest_secs = 5.0
//! capacity = 10
//!
//! [scan]
//! interval = 4
//! acquisition = "broad_phase"
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, SenzError};

/// Top-level SENZ configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SenzConfig {
    /// Sense ranges and accuracy.
    #[serde(default)]
    pub senses: SensesConfig,
    /// Ranked memory and nearest-target retention.
    #[serde(default)]
    pub targeting: TargetingConfig,
    /// Scan scheduling and candidate acquisition.
    #[serde(default)]
    pub scan: ScanConfig,
}

impl SenzConfig {
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

    /// Check every value against its allowed range.
    ///
    /// # Errors
    /// Returns `SenzError::InvalidConfig` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let s = &self.senses;
        let ranges = [
            ("senses.vision_range", s.vision_range),
            ("senses.scent_range", s.scent_range),
            ("senses.hearing_range", s.hearing_range),
            ("senses.implicit_range", s.implicit_range),
            ("senses.scent_accuracy_radius", s.scent_accuracy_radius),
            ("senses.hearing_accuracy_radius", s.hearing_accuracy_radius),
        ];
        for (field, value) in ranges {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(field, format!("must be a finite value >= 0 (got {value})")));
            }
        }
        if !(s.fov_half_angle_deg > 0.0 && s.fov_half_angle_deg <= 180.0) {
            return Err(invalid(
                "senses.fov_half_angle_deg",
                format!("must be in (0, 180] (got {})", s.fov_half_angle_deg),
            ));
        }
        if !self.targeting.retain_nearest_secs.is_finite() || self.targeting.retain_nearest_secs < 0.0 {
            return Err(invalid(
                "targeting.retain_nearest_secs",
                format!("must be a finite value >= 0 (got {})", self.targeting.retain_nearest_secs),
            ));
        }
        if self.targeting.capacity == 0 {
            return Err(invalid("targeting.capacity", "must be at least 1".to_string()));
        }
        if self.scan.interval == 0 {
            return Err(invalid("scan.interval", "must be at least 1".to_string()));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: String) -> SenzError {
    SenzError::InvalidConfig { field, reason }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Sense ranges, field of view and positional accuracy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensesConfig {
    /// Half-angle of the vision cone, in degrees, measured from the forward vector.
    #[serde(default = "default_110")]
    pub fov_half_angle_deg: f32,
    /// Maximum distance at which other creatures can be seen.
    #[serde(default = "default_100")]
    pub vision_range: f32,
    /// Maximum distance at which creatures or scent trails can be smelled.
    #[serde(default)]
    pub scent_range: f32,
    /// Maximum distance at which creatures can be heard.
    #[serde(default = "default_10")]
    pub hearing_range: f32,
    /// Distance under which a creature is noticed regardless of other senses.
    /// Should rarely exceed 1–2m.
    #[serde(default = "default_2")]
    pub implicit_range: f32,
    /// Radius of the random offset applied to smelled positions.
    #[serde(default = "default_2")]
    pub scent_accuracy_radius: f32,
    /// Radius of the random offset applied to heard positions.
    #[serde(default = "default_1")]
    pub hearing_accuracy_radius: f32,
}

impl SensesConfig {
    /// Radius of the candidate search: the farthest any sense reaches.
    #[must_use]
    pub fn max_sense_range(&self) -> f32 {
        self.vision_range
            .max(self.scent_range)
            .max(self.hearing_range)
            .max(self.implicit_range)
    }
}

impl Default for SensesConfig {
    fn default() -> Self {
        Self {
            fov_half_angle_deg: 110.0,
            vision_range: 100.0,
            scent_range: 0.0,
            hearing_range: 10.0,
            implicit_range: 2.0,
            scent_accuracy_radius: 2.0,
            hearing_accuracy_radius: 1.0,
        }
    }
}

/// Ranked memory bounds and nearest-target retention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetingConfig {
    /// Seconds the nearest target stays selected after it was last detected.
    #[serde(default = "default_5_0")]
    pub retain_nearest_secs: f64,
    /// Maximum number of remembered records (K).
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    /// Category bits a broad-phase candidate must share to be considered.
    #[serde(default = "default_mask")]
    pub detection_mask: u32,
}

impl Default for TargetingConfig {
    fn default() -> Self {
        Self {
            retain_nearest_secs: 5.0,
            capacity: 10,
            detection_mask: u32::MAX,
        }
    }
}

/// How candidates are gathered each scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionMode {
    /// Radius query against the spatial backend; falls back to the registry
    /// when no backend is attached.
    #[default]
    BroadPhase,
    /// Linear scan of the detectable-entity registry.
    Registry,
}

/// Scan throttling and acquisition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// A full scan runs every `interval` ticks unless the agent is alert.
    #[serde(default = "default_interval")]
    pub interval: u32,
    /// Candidate acquisition strategy.
    #[serde(default)]
    pub acquisition: AcquisitionMode,
    /// Seed for positional noise; `None` seeds from entropy.
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            interval: 4,
            acquisition: AcquisitionMode::BroadPhase,
            rng_seed: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_1() -> f32 { 1.0 }
fn default_2() -> f32 { 2.0 }
fn default_10() -> f32 { 10.0 }
fn default_100() -> f32 { 100.0 }
fn default_110() -> f32 { 110.0 }
fn default_5_0() -> f64 { 5.0 }
fn default_capacity() -> usize { 10 }
fn default_mask() -> u32 { u32::MAX }
fn default_interval() -> u32 { 4 }
