//! Configuration parsing and management for pantilt

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, PantiltError};
use crate::servo::Easing;

const CONFIG_FILE: &str = "pantilt.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub gimbal: GimbalConfig,
    pub gestures: GestureConfig,
    pub tracking: TrackingConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, PantiltError> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::ReadFile(format!("{}: {}", path.as_ref().display(), e))
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, PantiltError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()).into())
    }

    /// Load the first config found in the working directory, its `config/`
    /// subdirectory, or the user config directory. Defaults if none exist.
    pub fn load() -> Result<Self, PantiltError> {
        let found = [Some(PathBuf::from(".")), Some(PathBuf::from("config")), user_config_dir()]
            .into_iter()
            .flatten()
            .map(|dir| dir.join(CONFIG_FILE))
            .find(|path| path.is_file());

        match found {
            Some(path) => {
                tracing::info!("Loading config from: {}", path.display());
                Self::from_file(path)
            }
            None => {
                tracing::info!("No {} found, using defaults", CONFIG_FILE);
                Ok(Self::default())
            }
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), PantiltError> {
        let gimbal = &self.gimbal;
        gimbal.pan.validate("gimbal.pan")?;
        gimbal.tilt.validate("gimbal.tilt")?;

        if !gimbal.pan.contains(gimbal.home_pan) {
            return Err(invalid("gimbal.home_pan", "Home pan must lie inside the pan range"));
        }
        if !gimbal.tilt.contains(gimbal.home_tilt) {
            return Err(invalid("gimbal.home_tilt", "Home tilt must lie inside the tilt range"));
        }
        if gimbal.steps == 0 {
            return Err(invalid("gimbal.steps", "Step count must be greater than 0"));
        }

        let tracking = &self.tracking;
        if tracking.frame_width == 0 {
            return Err(invalid("tracking.frame_width", "Frame width must be greater than 0"));
        }
        if tracking.frame_height == 0 {
            return Err(invalid("tracking.frame_height", "Frame height must be greater than 0"));
        }
        if !tracking.deadzone.is_finite() || tracking.deadzone < 0.0 {
            return Err(invalid("tracking.deadzone", "Deadzone must be a non-negative number"));
        }
        if !tracking.prediction_scale.is_finite() {
            return Err(invalid("tracking.prediction_scale", "Prediction scale must be finite"));
        }
        match tracking.correction {
            CorrectionLaw::FlatGain { pan_gain, tilt_gain } => {
                if !pan_gain.is_finite() || !tilt_gain.is_finite() {
                    return Err(invalid("tracking.correction", "Gains must be finite"));
                }
            }
            CorrectionLaw::FocalLength { focal_length_px } => {
                if !focal_length_px.is_finite() || focal_length_px <= 0.0 {
                    return Err(invalid(
                        "tracking.correction.focal_length_px",
                        "Focal length must be greater than 0",
                    ));
                }
            }
        }

        let search = &self.gestures.search;
        if search.tilt_stations.is_empty() {
            return Err(invalid("gestures.search.tilt_stations", "At least one tilt station is required"));
        }
        for station in &search.tilt_stations {
            if !gimbal.tilt.contains(*station) {
                tracing::warn!(
                    "Search tilt station {} lies outside the tilt range and will be clamped",
                    station
                );
            }
        }

        Ok(())
    }
}

fn invalid(field: &str, message: &str) -> PantiltError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.to_string(),
    }
    .into()
}

/// Valid angle range of one axis, in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl Default for AxisRange {
    fn default() -> Self {
        Self { min: 0.0, max: 180.0 }
    }
}

impl AxisRange {
    pub fn contains(&self, angle: f64) -> bool {
        (self.min..=self.max).contains(&angle)
    }

    fn validate(&self, field: &str) -> Result<(), PantiltError> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min > self.max {
            return Err(invalid(field, "Range must be finite with min <= max"));
        }
        Ok(())
    }
}

/// Servo rig configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GimbalConfig {
    pub pan: AxisRange,
    pub tilt: AxisRange,
    /// Pan angle of the home (centre) position
    pub home_pan: f64,
    /// Tilt angle of the home (centre) position
    pub home_tilt: f64,
    /// Velocity profile applied to every interpolated move
    pub easing: Easing,
    /// Default number of intermediate positions per move
    pub steps: u32,
}

impl Default for GimbalConfig {
    fn default() -> Self {
        Self {
            pan: AxisRange::default(),
            tilt: AxisRange::default(),
            home_pan: 45.0,
            home_tilt: 45.0,
            easing: Easing::Linear,
            steps: 50,
        }
    }
}

/// Gesture timing and shape constants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Duration of the move back to home in milliseconds
    pub home_ms: u64,
    pub nod: NodConfig,
    pub scan: ScanConfig,
    pub search: SearchConfig,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            home_ms: 500,
            nod: NodConfig::default(),
            scan: ScanConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl GestureConfig {
    pub fn home_duration(&self) -> Duration {
        Duration::from_millis(self.home_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodConfig {
    pub tilt_up: f64,
    pub tilt_down: f64,
    pub repeats: u32,
    /// Duration of each half-stroke in milliseconds
    pub speed_ms: u64,
}

impl Default for NodConfig {
    fn default() -> Self {
        Self {
            tilt_up: 60.0,
            tilt_down: 120.0,
            repeats: 2,
            speed_ms: 400,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Left boundary of the sweep; `None` uses the pan minimum
    pub pan_start: Option<f64>,
    /// Right boundary of the sweep; `None` uses the pan maximum
    pub pan_end: Option<f64>,
    /// Tilt held during the scan; `None` holds the current tilt
    pub tilt: Option<f64>,
    /// Move to the sweep start, in milliseconds
    pub approach_ms: u64,
    /// One full left-to-right sweep, in milliseconds
    pub sweep_ms: u64,
    pub sweeps: u32,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            pan_start: None,
            pan_end: None,
            tilt: None,
            approach_ms: 400,
            sweep_ms: 2000,
            sweeps: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub max_attempts: u32,
    /// Tilt angles visited in order during each attempt
    pub tilt_stations: Vec<f64>,
    /// Move to a tilt station, in milliseconds
    pub tilt_ms: u64,
    /// Rewind pan to its minimum, in milliseconds
    pub rewind_ms: u64,
    /// Sweep pan to its maximum, in milliseconds
    pub sweep_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            tilt_stations: vec![45.0, 90.0, 135.0],
            tilt_ms: 500,
            rewind_ms: 1500,
            sweep_ms: 2000,
        }
    }
}

/// How a pixel error is turned into an angle correction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "law", rename_all = "snake_case")]
pub enum CorrectionLaw {
    /// Degrees of servo movement per pixel, per axis
    FlatGain { pan_gain: f64, tilt_gain: f64 },
    /// Single gain derived from the camera focal length in pixels
    FocalLength { focal_length_px: f64 },
}

impl Default for CorrectionLaw {
    fn default() -> Self {
        Self::FlatGain {
            pan_gain: 0.03,
            tilt_gain: 0.03,
        }
    }
}

impl CorrectionLaw {
    /// Degrees per pixel as `(pan, tilt)`
    pub fn gains(&self) -> (f64, f64) {
        match *self {
            Self::FlatGain { pan_gain, tilt_gain } => (pan_gain, tilt_gain),
            Self::FocalLength { focal_length_px } => {
                // small-angle image Jacobian: one pixel subtends 1/f radians
                let gain = (1.0 / focal_length_px).to_degrees();
                (gain, gain)
            }
        }
    }
}

/// Target-centering controller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    pub frame_width: u32,
    pub frame_height: u32,
    /// Pixel offset from the frame centre that is ignored, per axis
    pub deadzone: f64,
    pub correction: CorrectionLaw,
    /// Duration of one corrective move in milliseconds
    pub correction_ms: u64,
    /// Enable one-step velocity extrapolation of the target
    pub prediction: bool,
    pub prediction_scale: f64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            frame_width: 2592,
            frame_height: 1944,
            deadzone: 80.0,
            correction: CorrectionLaw::default(),
            correction_ms: 500,
            prediction: false,
            prediction_scale: 0.5,
        }
    }
}

impl TrackingConfig {
    pub fn correction_duration(&self) -> Duration {
        Duration::from_millis(self.correction_ms)
    }
}

/// `$XDG_CONFIG_HOME/pantilt`, falling back to `~/.config/pantilt`
fn user_config_dir() -> Option<PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
        .map(|base| base.join("pantilt"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.gimbal.home_pan, 45.0);
        assert_eq!(config.gimbal.steps, 50);
        assert_eq!(config.tracking.frame_width, 2592);
        assert_eq!(config.gestures.search.tilt_stations, vec![45.0, 90.0, 135.0]);
        assert!(!config.tracking.prediction);
    }

    #[test]
    fn test_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_home_outside_range_rejected() {
        let mut config = Config::default();
        config.gimbal.tilt = AxisRange { min: 0.0, max: 30.0 };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_frame_dimension_names_field() {
        let mut config = Config::default();
        config.tracking.frame_height = 0;
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("tracking.frame_height"), "{}", err);

        let mut config = Config::default();
        config.tracking.frame_width = 0;
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("tracking.frame_width"), "{}", err);
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            [gimbal]
            easing = "smoothstep"
            steps = 20

            [gimbal.tilt]
            min = 10.0
            max = 135.0

            [tracking]
            deadzone = 40.0
            prediction = true

            [tracking.correction]
            law = "focal_length"
            focal_length_px = 1000.0
        "#;

        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.gimbal.easing, Easing::Smoothstep);
        assert_eq!(config.gimbal.steps, 20);
        assert_eq!(config.gimbal.tilt.max, 135.0);
        assert_eq!(config.gimbal.pan.max, 180.0);
        assert_eq!(config.tracking.deadzone, 40.0);
        assert!(config.tracking.prediction);
        assert_eq!(
            config.tracking.correction,
            CorrectionLaw::FocalLength { focal_length_px: 1000.0 }
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sample_config_matches_defaults() {
        let config = Config::from_str(include_str!("../config/pantilt.toml")).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.gestures.nod, NodConfig::default());
        assert_eq!(config.gestures.search, SearchConfig::default());
        assert_eq!(config.tracking.correction, CorrectionLaw::default());
    }

    #[test]
    fn test_focal_length_gain() {
        let law = CorrectionLaw::FocalLength { focal_length_px: 1000.0 };
        let (pan, tilt) = law.gains();
        assert!((pan - 0.057_295_78).abs() < 1e-6);
        assert_eq!(pan, tilt);
    }
}
