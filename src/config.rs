//! Detector configuration.
//!
//! Bundles the per-stage configuration structs into one [`DetectorConfig`]
//! that can be built in code or loaded from a TOML file. Every field has a
//! default, so a file only needs the values it changes:
//!
//! ```toml
//! smoothing_window = 7
//! hysteresis_threshold = 0.2
//! phase_change_cooldown_ms = 150
//!
//! [classifier]
//! top_min_rotation = 75.0
//!
//! [velocity_gates]
//! impact_min_velocity = 0.6
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::classifier::ClassifierConfig;
use crate::error::{Result, SwingError};
use crate::features::FeatureConfig;
use crate::hysteresis::{
    clamp_cooldown, clamp_threshold, HysteresisConfig, VelocityGates,
    DEFAULT_HYSTERESIS_THRESHOLD, DEFAULT_PHASE_CHANGE_COOLDOWN_MS,
};
use crate::smoothing::{clamp_window, DEFAULT_SMOOTHING_WINDOW, PASSTHROUGH_WINDOW};

/// Frame rate used to derive frame times when snapshots carry no timestamp.
pub const DEFAULT_FRAME_RATE_HZ: f64 = 30.0;

/// Complete configuration for a [`crate::SwingPhaseDetector`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Majority-vote window in frames (3..=10, or 1 to disable smoothing).
    pub smoothing_window: usize,
    /// Minimum mean confidence to accept a change (0.05..=0.5, or 0 to disable).
    pub hysteresis_threshold: f32,
    /// Minimum time between accepted changes in ms (50..=500, or 0 to disable).
    pub phase_change_cooldown_ms: f64,
    /// Frame rate for snapshots without timestamps.
    pub frame_rate_hz: f64,
    pub features: FeatureConfig,
    pub classifier: ClassifierConfig,
    pub velocity_gates: VelocityGates,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            smoothing_window: DEFAULT_SMOOTHING_WINDOW,
            hysteresis_threshold: DEFAULT_HYSTERESIS_THRESHOLD,
            phase_change_cooldown_ms: DEFAULT_PHASE_CHANGE_COOLDOWN_MS,
            frame_rate_hz: DEFAULT_FRAME_RATE_HZ,
            features: FeatureConfig::default(),
            classifier: ClassifierConfig::default(),
            velocity_gates: VelocityGates::default(),
        }
    }
}

impl DetectorConfig {
    /// Configuration with smoothing, hysteresis and cooldown all disabled.
    ///
    /// The velocity preconditions and the adjacency table still apply. Useful
    /// as a baseline for measuring how much jitter the smoothing removes.
    pub fn unsmoothed() -> Self {
        Self {
            smoothing_window: PASSTHROUGH_WINDOW,
            hysteresis_threshold: 0.0,
            phase_change_cooldown_ms: 0.0,
            ..Self::default()
        }
    }

    /// Load a configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse, validate and normalize a TOML configuration.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: DetectorConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config.normalized())
    }

    /// Reject values that cannot be clamped into something meaningful.
    pub fn validate(&self) -> Result<()> {
        if !self.hysteresis_threshold.is_finite() {
            return Err(invalid("hysteresis_threshold", "must be a finite number"));
        }
        if !self.phase_change_cooldown_ms.is_finite() {
            return Err(invalid("phase_change_cooldown_ms", "must be a finite number"));
        }
        if !self.frame_rate_hz.is_finite() || self.frame_rate_hz <= 0.0 {
            return Err(invalid(
                "frame_rate_hz",
                format!("must be positive, got {}", self.frame_rate_hz),
            ));
        }
        if !(self.features.club_length.is_finite() && self.features.club_head_drop.is_finite()) {
            return Err(invalid("features", "club geometry must be finite"));
        }
        Ok(())
    }

    /// Clamp the tunable values into their supported ranges.
    ///
    /// Each adjusted value is reported with a warning.
    pub fn normalized(mut self) -> Self {
        let window = clamp_window(self.smoothing_window);
        if window != self.smoothing_window {
            warn!(requested = self.smoothing_window, used = window, "smoothing_window clamped");
            self.smoothing_window = window;
        }

        let threshold = clamp_threshold(self.hysteresis_threshold);
        if threshold != self.hysteresis_threshold {
            warn!(
                requested = self.hysteresis_threshold,
                used = threshold,
                "hysteresis_threshold clamped"
            );
            self.hysteresis_threshold = threshold;
        }

        let cooldown = clamp_cooldown(self.phase_change_cooldown_ms);
        if cooldown != self.phase_change_cooldown_ms {
            warn!(
                requested = self.phase_change_cooldown_ms,
                used = cooldown,
                "phase_change_cooldown_ms clamped"
            );
            self.phase_change_cooldown_ms = cooldown;
        }

        if !self.frame_rate_hz.is_finite() || self.frame_rate_hz <= 0.0 {
            warn!(
                requested = self.frame_rate_hz,
                used = DEFAULT_FRAME_RATE_HZ,
                "frame_rate_hz replaced with default"
            );
            self.frame_rate_hz = DEFAULT_FRAME_RATE_HZ;
        }

        self
    }

    /// Gate configuration derived from this bundle.
    pub fn hysteresis(&self) -> HysteresisConfig {
        HysteresisConfig {
            hysteresis_threshold: self.hysteresis_threshold,
            phase_change_cooldown_ms: self.phase_change_cooldown_ms,
            velocity: self.velocity_gates.clone(),
        }
    }

    /// Milliseconds per frame at the configured frame rate.
    pub fn frame_interval_ms(&self) -> f64 {
        1000.0 / self.frame_rate_hz
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> SwingError {
    SwingError::InvalidConfig {
        field,
        reason: reason.into(),
    }
}
