//! Raw per-frame phase classification.
//!
//! Each phase has an independent boolean rule over [`FrameFeatures`]. Rules
//! are evaluated in canonical swing order and the first match wins, so a
//! frame that satisfies several rules resolves by priority rather than by
//! best fit. A frame matching nothing is labelled `address`.
//!
//! The output is deliberately unsmoothed; see the `smoothing` and
//! `hysteresis` modules for the layers that stabilize it.
//!
//! All thresholds are empirical. They live in [`ClassifierConfig`] so they can
//! be tuned per camera setup without touching the rules.

use serde::Deserialize;

use crate::features::rotation_magnitude;
use crate::types::{FrameFeatures, PhaseName};

/// Base confidence for every classified frame.
pub const BASE_CONFIDENCE: f32 = 0.5;

/// Maximum confidence contributed by key-landmark visibility.
pub const VISIBILITY_WEIGHT: f32 = 0.3;

/// Maximum confidence contributed by phase-specific corroboration.
pub const MAX_PHASE_BONUS: f32 = 0.2;

/// Thresholds for the six phase rules and their confidence bonuses.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Address: maximum weight asymmetry (percentage points).
    pub address_max_asymmetry: u32,
    /// Address: how far past the reference line the club may sit.
    pub address_reference_tolerance: f32,
    /// Address: maximum hand movement per frame.
    pub address_max_hand_motion: f32,

    /// Backswing: club must be above this y (mid-frame).
    pub backswing_max_club_y: f32,
    /// Backswing: minimum shoulder rotation (degrees).
    pub backswing_min_rotation: f32,

    /// Top: minimum shoulder rotation (degrees).
    pub top_min_rotation: f32,
    /// Top: maximum deviation of the club from horizontal (degrees).
    pub top_max_club_tilt: f32,
    /// Top: minimum weight asymmetry (percentage points).
    pub top_min_asymmetry: u32,

    /// Downswing: minimum club velocity per frame.
    pub downswing_min_velocity: f32,

    /// Impact: fraction of the session's peak velocity counted as "at peak".
    pub impact_peak_ratio: f32,
    /// Impact: nominal ball position height.
    pub impact_zone_y: f32,
    /// Impact: half-width of the impact box around the reference line.
    pub impact_zone_half_width: f32,
    /// Impact: half-height of the impact box around `impact_zone_y`.
    pub impact_zone_half_height: f32,
    /// Impact: minimum weight asymmetry (percentage points).
    pub impact_min_asymmetry: u32,

    /// Follow-through: minimum shoulder rotation (degrees).
    pub follow_through_min_rotation: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            address_max_asymmetry: 20,
            address_reference_tolerance: 0.05,
            address_max_hand_motion: 0.02,
            backswing_max_club_y: 0.5,
            backswing_min_rotation: 20.0,
            top_min_rotation: 80.0,
            top_max_club_tilt: 15.0,
            top_min_asymmetry: 30,
            downswing_min_velocity: 0.05,
            impact_peak_ratio: 0.9,
            impact_zone_y: 0.75,
            impact_zone_half_width: 0.1,
            impact_zone_half_height: 0.1,
            impact_min_asymmetry: 70,
            follow_through_min_rotation: 5.0,
        }
    }
}

type PhaseRule = fn(&ClassifierConfig, &FrameFeatures) -> bool;

/// Phase rules in priority order.
const RULES: [(PhaseName, PhaseRule); 6] = [
    (PhaseName::Address, is_address),
    (PhaseName::Backswing, is_backswing),
    (PhaseName::Top, is_top),
    (PhaseName::Downswing, is_downswing),
    (PhaseName::Impact, is_impact),
    (PhaseName::FollowThrough, is_follow_through),
];

/// Result of classifying one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub phase: PhaseName,
    /// Confidence in `[0, 1]`.
    pub confidence: f32,
    /// False when no rule matched and the label fell back to `address`.
    pub matched: bool,
}

/// Stateless rule-based classifier.
#[derive(Debug, Clone, Default)]
pub struct PhaseClassifier {
    config: ClassifierConfig,
}

impl PhaseClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Label one frame and score the label.
    pub fn classify(&self, features: &FrameFeatures) -> Classification {
        let (phase, matched) = RULES
            .iter()
            .find(|(_, rule)| rule(&self.config, features))
            .map_or((PhaseName::Address, false), |&(phase, _)| (phase, true));

        Classification {
            phase,
            confidence: self.confidence(phase, features),
            matched,
        }
    }

    /// Every phase whose rule holds for this frame, in priority order.
    pub fn matching_phases(&self, features: &FrameFeatures) -> Vec<PhaseName> {
        RULES
            .iter()
            .filter(|(_, rule)| rule(&self.config, features))
            .map(|&(phase, _)| phase)
            .collect()
    }

    /// Confidence for labelling `features` as `phase`.
    ///
    /// `0.5 + 0.3 * visibility + bonus`, clamped to `[0, 1]`. The bonus only
    /// counts features that were measured, so a frame of defaults scores the
    /// base value.
    pub fn confidence(&self, phase: PhaseName, features: &FrameFeatures) -> f32 {
        let visibility = features.visibility.clamp(0.0, 1.0) * VISIBILITY_WEIGHT;
        let bonus = self.phase_bonus(phase, features).min(MAX_PHASE_BONUS);
        (BASE_CONFIDENCE + visibility + bonus).clamp(0.0, 1.0)
    }

    fn phase_bonus(&self, phase: PhaseName, f: &FrameFeatures) -> f32 {
        let c = &self.config;
        let shoulder = rotation_magnitude(f.rotation.shoulder_angle);
        let asymmetry = f.weight.asymmetry();

        match phase {
            PhaseName::Address if f.weight_measured && asymmetry < 10 => 0.2,
            PhaseName::Backswing if f.rotation_measured && shoulder > 45.0 => 0.1,
            PhaseName::Top if f.rotation_measured && shoulder > c.top_min_rotation => 0.2,
            PhaseName::Downswing if f.velocity > 2.0 * c.downswing_min_velocity => 0.1,
            PhaseName::Impact if f.weight_measured && asymmetry > c.impact_min_asymmetry => 0.2,
            PhaseName::FollowThrough if f.weight_measured && asymmetry > 50 => 0.1,
            _ => 0.0,
        }
    }
}

// ============================================================================
// PHASE RULES
// ============================================================================

fn is_address(c: &ClassifierConfig, f: &FrameFeatures) -> bool {
    f.weight.asymmetry() < c.address_max_asymmetry
        && f.club.x <= f.reference_x + c.address_reference_tolerance
        && f.hand_motion < c.address_max_hand_motion
}

fn is_backswing(c: &ClassifierConfig, f: &FrameFeatures) -> bool {
    f.club.y < c.backswing_max_club_y
        && rotation_magnitude(f.rotation.shoulder_angle) > c.backswing_min_rotation
        && f.club.x < f.reference_x
}

fn is_top(c: &ClassifierConfig, f: &FrameFeatures) -> bool {
    rotation_magnitude(f.rotation.shoulder_angle) > c.top_min_rotation
        && rotation_magnitude(f.club.angle) <= c.top_max_club_tilt
        && f.weight.asymmetry() > c.top_min_asymmetry
}

fn is_downswing(c: &ClassifierConfig, f: &FrameFeatures) -> bool {
    let (dx, dy) = f.club_delta;
    f.velocity > c.downswing_min_velocity && dy > 0.0 && dx > 0.0
}

fn is_impact(c: &ClassifierConfig, f: &FrameFeatures) -> bool {
    let at_peak = f.peak_velocity > 0.0 && f.velocity >= f.peak_velocity * c.impact_peak_ratio;
    let in_zone = (f.club.x - f.reference_x).abs() <= c.impact_zone_half_width
        && (f.club.y - c.impact_zone_y).abs() <= c.impact_zone_half_height;
    at_peak && in_zone && f.weight.asymmetry() > c.impact_min_asymmetry
}

fn is_follow_through(c: &ClassifierConfig, f: &FrameFeatures) -> bool {
    f.club.x > f.reference_x + c.impact_zone_half_width
        && rotation_magnitude(f.rotation.shoulder_angle) > c.follow_through_min_rotation
        && f.club_delta.1 < 0.0
}

// ============================================================================
// TESTS
// ============================================================================
