//! Feature extraction from landmark snapshots.
//!
//! Derives the biomechanical signals the phase classifier works on: weight
//! distribution between the feet, an estimated club head position, the
//! rotation of the shoulder and hip lines, and frame-to-frame club velocity.
//!
//! The single-frame functions are pure. [`FeatureExtractor`] adds the small
//! amount of memory (previous club position, previous hand position, running
//! peak velocity) needed for the motion features.
//!
//! Missing landmarks never cause an error. Each feature falls back to a
//! neutral value and the returned [`FrameFeatures`] records which features were
//! actually measured.

use serde::Deserialize;

use crate::types::{
    BodyRotation, ClubPosition, FrameFeatures, Landmark, LandmarkSnapshot, WeightDistribution,
    KEY_LANDMARKS, LEFT_ANKLE, LEFT_ELBOW, LEFT_FOOT_INDEX, LEFT_HEEL, LEFT_HIP, LEFT_SHOULDER,
    LEFT_WRIST, RIGHT_ANKLE, RIGHT_ELBOW, RIGHT_FOOT_INDEX, RIGHT_HEEL, RIGHT_HIP,
    RIGHT_SHOULDER, RIGHT_WRIST,
};

/// Downward offset from the hands to the club head in the wrist-only estimate.
pub const CLUB_HEAD_DROP: f32 = 0.1;

/// Projected shaft length (grip to head) in the elbow-assisted estimate.
pub const CLUB_LENGTH: f32 = 0.25;

/// Visibility above which a key landmark counts toward confidence.
pub const VISIBILITY_THRESHOLD: f32 = 0.5;

/// Shorter vectors than this are treated as degenerate.
const MIN_VECTOR_LENGTH: f32 = 1e-4;

/// Configuration for feature extraction.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Use elbows to project the club along the forearm line when available.
    pub enhanced_club_estimate: bool,
    /// See [`CLUB_HEAD_DROP`].
    pub club_head_drop: f32,
    /// See [`CLUB_LENGTH`].
    pub club_length: f32,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            enhanced_club_estimate: true,
            club_head_drop: CLUB_HEAD_DROP,
            club_length: CLUB_LENGTH,
        }
    }
}

// ============================================================================
// SINGLE-FRAME FEATURES
// ============================================================================

/// Estimates how body weight is split between the feet.
///
/// Each foot's pressure proxy is the mean of `1 - y` for its heel point (ankle,
/// falling back to heel) and toe point (foot index, falling back to the heel
/// point). A foot lower on screen reads as carrying more weight. Returns 50/50
/// if either foot is missing or total pressure is zero.
pub fn weight_distribution(snapshot: &LandmarkSnapshot) -> WeightDistribution {
    measured_weight(snapshot).unwrap_or_default()
}

fn measured_weight(snapshot: &LandmarkSnapshot) -> Option<WeightDistribution> {
    let left = foot_pressure(snapshot, LEFT_ANKLE, LEFT_HEEL, LEFT_FOOT_INDEX)?;
    let right = foot_pressure(snapshot, RIGHT_ANKLE, RIGHT_HEEL, RIGHT_FOOT_INDEX)?;

    let total = left + right;
    if !total.is_finite() || total <= 0.0 {
        return None;
    }

    // Only the left side is rounded; the right side is derived so the pair
    // always sums to 100.
    let left_pct = ((left / total) * 100.0).round().clamp(0.0, 100.0) as u32;
    Some(WeightDistribution::from_left(left_pct))
}

fn foot_pressure(
    snapshot: &LandmarkSnapshot,
    ankle: usize,
    heel: usize,
    toe: usize,
) -> Option<f32> {
    let heel_point = snapshot.get(ankle).or_else(|| snapshot.get(heel))?;
    let toe_point = snapshot.get(toe).unwrap_or(heel_point);

    let heel_pressure = 1.0 - heel_point.y.clamp(0.0, 1.0);
    let toe_pressure = 1.0 - toe_point.y.clamp(0.0, 1.0);
    Some((heel_pressure + toe_pressure) / 2.0)
}

/// Wrist-based club head estimate.
///
/// The head is placed [`CLUB_HEAD_DROP`] below the wrist midpoint and the
/// angle follows the left-to-right wrist vector. Without both wrists the
/// neutral center estimate is returned.
pub fn club_position(snapshot: &LandmarkSnapshot) -> ClubPosition {
    club_from_wrists(snapshot, CLUB_HEAD_DROP).unwrap_or_default()
}

/// Elbow-assisted club head estimate.
///
/// The grip is the wrist midpoint and the shaft continues the elbow-to-grip
/// line for [`CLUB_LENGTH`]. Falls back to [`club_position`] when the elbows
/// are missing or coincide with the grip.
pub fn club_position_enhanced(snapshot: &LandmarkSnapshot) -> ClubPosition {
    club_from_elbows(snapshot, CLUB_LENGTH)
        .or_else(|| club_from_wrists(snapshot, CLUB_HEAD_DROP))
        .unwrap_or_default()
}

fn club_from_wrists(snapshot: &LandmarkSnapshot, drop: f32) -> Option<ClubPosition> {
    let (left, right) = snapshot.pair(LEFT_WRIST, RIGHT_WRIST)?;
    let (mx, my) = midpoint(left, right);

    Some(ClubPosition {
        x: mx,
        y: my + drop,
        z: mean_z(left, right),
        angle: (right.y - left.y).atan2(right.x - left.x).to_degrees(),
    })
}

fn club_from_elbows(snapshot: &LandmarkSnapshot, length: f32) -> Option<ClubPosition> {
    let (left_wrist, right_wrist) = snapshot.pair(LEFT_WRIST, RIGHT_WRIST)?;
    let (left_elbow, right_elbow) = snapshot.pair(LEFT_ELBOW, RIGHT_ELBOW)?;

    let (gx, gy) = midpoint(left_wrist, right_wrist);
    let (ex, ey) = midpoint(left_elbow, right_elbow);
    let (vx, vy) = (gx - ex, gy - ey);
    if (vx * vx + vy * vy).sqrt() < MIN_VECTOR_LENGTH {
        return None;
    }

    let shaft = vy.atan2(vx);
    Some(ClubPosition {
        x: gx + length * shaft.cos(),
        y: gy + length * shaft.sin(),
        z: mean_z(left_wrist, right_wrist),
        angle: shaft.to_degrees(),
    })
}

/// Angles of the shoulder and hip lines in degrees.
///
/// Both angles are `atan2(dy, dx)` of the left-to-right landmark pair. Returns
/// `{0, 0}` if any of the four landmarks is missing.
pub fn body_rotation(snapshot: &LandmarkSnapshot) -> BodyRotation {
    measured_rotation(snapshot).unwrap_or_default()
}

fn measured_rotation(snapshot: &LandmarkSnapshot) -> Option<BodyRotation> {
    let (ls, rs) = snapshot.pair(LEFT_SHOULDER, RIGHT_SHOULDER)?;
    let (lh, rh) = snapshot.pair(LEFT_HIP, RIGHT_HIP)?;

    Some(BodyRotation {
        shoulder_angle: line_angle(ls, rs),
        hip_angle: line_angle(lh, rh),
    })
}

/// Distance the club head moved between two consecutive frames.
///
/// Returns 0 when there is no previous frame.
pub fn club_velocity(prev: Option<&ClubPosition>, curr: &ClubPosition) -> f32 {
    prev.map_or(0.0, |p| p.distance_to(curr))
}

/// Folds a line angle into its tilt from horizontal, in `[0, 90]` degrees.
///
/// A line drawn left-to-right or right-to-left gives the same magnitude, so
/// mirrored landmark order does not read as a half turn.
pub fn rotation_magnitude(angle: f32) -> f32 {
    let a = angle.abs() % 180.0;
    if a > 90.0 {
        180.0 - a
    } else {
        a
    }
}

/// Fraction of [`KEY_LANDMARKS`] that are present with visibility above
/// [`VISIBILITY_THRESHOLD`].
pub fn key_landmark_visibility(snapshot: &LandmarkSnapshot) -> f32 {
    let visible = KEY_LANDMARKS
        .iter()
        .filter_map(|&i| snapshot.get(i))
        .filter(|lm| lm.visibility_or_default() > VISIBILITY_THRESHOLD)
        .count();
    visible as f32 / KEY_LANDMARKS.len() as f32
}

/// X coordinate of the body's vertical reference line.
///
/// Hip midpoint, else shoulder midpoint, else the frame center.
pub fn reference_line_x(snapshot: &LandmarkSnapshot) -> f32 {
    snapshot
        .pair(LEFT_HIP, RIGHT_HIP)
        .or_else(|| snapshot.pair(LEFT_SHOULDER, RIGHT_SHOULDER))
        .map_or(0.5, |(l, r)| midpoint(l, r).0)
}

fn hand_midpoint(snapshot: &LandmarkSnapshot) -> Option<(f32, f32)> {
    snapshot
        .pair(LEFT_WRIST, RIGHT_WRIST)
        .map(|(l, r)| midpoint(l, r))
}

fn midpoint(a: &Landmark, b: &Landmark) -> (f32, f32) {
    ((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

fn mean_z(a: &Landmark, b: &Landmark) -> Option<f32> {
    Some((a.z? + b.z?) / 2.0)
}

fn line_angle(from: &Landmark, to: &Landmark) -> f32 {
    (to.y - from.y).atan2(to.x - from.x).to_degrees()
}

// ============================================================================
// STATEFUL EXTRACTOR
// ============================================================================

/// Per-session feature extractor.
///
/// Remembers just enough of the previous frame to compute motion features.
pub struct FeatureExtractor {
    config: FeatureConfig,
    prev_club: Option<ClubPosition>,
    prev_hands: Option<(f32, f32)>,
    peak_velocity: f32,
}

impl FeatureExtractor {
    pub fn new(config: FeatureConfig) -> Self {
        Self {
            config,
            prev_club: None,
            prev_hands: None,
            peak_velocity: 0.0,
        }
    }

    /// Extract all features for one frame and advance the motion memory.
    ///
    /// Velocity and hand motion are only measured between two frames that
    /// both saw the wrists; a dropout frame reports zero motion instead of a
    /// jump to the neutral center.
    pub fn extract(&mut self, snapshot: &LandmarkSnapshot) -> FrameFeatures {
        let measured_weight = measured_weight(snapshot);
        let measured_rotation = measured_rotation(snapshot);
        let measured_club = self.estimate_club(snapshot);
        let hands = hand_midpoint(snapshot);

        let club = measured_club.unwrap_or_default();
        let (velocity, club_delta) = match (self.prev_club.as_ref(), measured_club.as_ref()) {
            (Some(prev), Some(curr)) => (
                club_velocity(Some(prev), curr),
                (curr.x - prev.x, curr.y - prev.y),
            ),
            _ => (0.0, (0.0, 0.0)),
        };
        let hand_motion = match (self.prev_hands, hands) {
            (Some((px, py)), Some((cx, cy))) => ((cx - px).powi(2) + (cy - py).powi(2)).sqrt(),
            _ => 0.0,
        };

        self.peak_velocity = self.peak_velocity.max(velocity);
        if measured_club.is_some() {
            self.prev_club = measured_club;
        }
        if hands.is_some() {
            self.prev_hands = hands;
        }

        FrameFeatures {
            weight: measured_weight.unwrap_or_default(),
            club,
            rotation: measured_rotation.unwrap_or_default(),
            velocity,
            club_delta,
            hand_motion,
            peak_velocity: self.peak_velocity,
            reference_x: reference_line_x(snapshot),
            visibility: key_landmark_visibility(snapshot),
            weight_measured: measured_weight.is_some(),
            rotation_measured: measured_rotation.is_some(),
            club_measured: measured_club.is_some(),
        }
    }

    /// Highest club velocity seen since creation or the last reset.
    pub fn peak_velocity(&self) -> f32 {
        self.peak_velocity
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Forget all motion history.
    pub fn reset(&mut self) {
        self.prev_club = None;
        self.prev_hands = None;
        self.peak_velocity = 0.0;
    }

    fn estimate_club(&self, snapshot: &LandmarkSnapshot) -> Option<ClubPosition> {
        if self.config.enhanced_club_estimate {
            club_from_elbows(snapshot, self.config.club_length)
                .or_else(|| club_from_wrists(snapshot, self.config.club_head_drop))
        } else {
            club_from_wrists(snapshot, self.config.club_head_drop)
        }
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(FeatureConfig::default())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn feet(left_y: f32, right_y: f32) -> LandmarkSnapshot {
        LandmarkSnapshot::empty()
            .with(LEFT_ANKLE, Landmark::new(0.55, left_y))
            .with(RIGHT_ANKLE, Landmark::new(0.45, right_y))
    }

    fn wrists(left: (f32, f32), right: (f32, f32)) -> LandmarkSnapshot {
        LandmarkSnapshot::empty()
            .with(LEFT_WRIST, Landmark::new(left.0, left.1))
            .with(RIGHT_WRIST, Landmark::new(right.0, right.1))
    }

    #[test]
    fn test_level_feet_are_balanced() {
        let w = weight_distribution(&feet(0.9, 0.9));
        assert_eq!(w, WeightDistribution { left: 50, right: 50, total: 100 });
    }

    #[test]
    fn test_missing_foot_defaults_to_balanced() {
        let snapshot = LandmarkSnapshot::empty().with(LEFT_ANKLE, Landmark::new(0.5, 0.2));
        assert_eq!(weight_distribution(&snapshot), WeightDistribution::balanced());
    }

    #[test]
    fn test_heel_is_used_when_ankle_missing() {
        let snapshot = LandmarkSnapshot::empty()
            .with(LEFT_HEEL, Landmark::new(0.55, 0.7))
            .with(RIGHT_ANKLE, Landmark::new(0.45, 0.9));
        let w = weight_distribution(&snapshot);
        // 0.3 / (0.3 + 0.1)
        assert_eq!(w.left, 75);
        assert_eq!(w.right, 25);
    }

    #[test]
    fn test_toe_point_contributes() {
        let snapshot = feet(0.9, 0.9)
            .with(LEFT_FOOT_INDEX, Landmark::new(0.58, 0.7))
            .with(RIGHT_FOOT_INDEX, Landmark::new(0.42, 0.9));
        let w = weight_distribution(&snapshot);
        // left = (0.1 + 0.3) / 2 = 0.2, right = 0.1
        assert_eq!(w.left, 67);
        assert_eq!(w.right, 33);
    }

    #[test]
    fn test_zero_pressure_is_balanced() {
        let w = weight_distribution(&feet(1.0, 1.2));
        assert_eq!(w, WeightDistribution::balanced());
    }

    #[test]
    fn test_weight_sum_holds_across_grid() {
        for i in 0..=20 {
            for j in 0..=20 {
                let w = weight_distribution(&feet(i as f32 * 0.06 - 0.1, j as f32 * 0.06 - 0.1));
                assert_eq!(w.left + w.right, 100, "left_y step {i}, right_y step {j}");
            }
        }
    }

    #[test]
    fn test_club_position_from_wrists() {
        let club = club_position(&wrists((0.4, 0.5), (0.6, 0.5)));
        assert!((club.x - 0.5).abs() < 1e-6);
        assert!((club.y - 0.6).abs() < 1e-6);
        assert!(club.angle.abs() < 1e-4);
    }

    #[test]
    fn test_club_position_missing_wrist_is_center() {
        let snapshot = LandmarkSnapshot::empty().with(LEFT_WRIST, Landmark::new(0.2, 0.2));
        assert_eq!(club_position(&snapshot), ClubPosition::center());
        assert_eq!(club_position_enhanced(&snapshot), ClubPosition::center());
    }

    #[test]
    fn test_enhanced_club_projects_along_forearm() {
        let snapshot = wrists((0.5, 0.6), (0.5, 0.6))
            .with(LEFT_ELBOW, Landmark::new(0.5, 0.4))
            .with(RIGHT_ELBOW, Landmark::new(0.5, 0.4));
        let club = club_position_enhanced(&snapshot);
        assert!((club.x - 0.5).abs() < 1e-5);
        assert!((club.y - 0.85).abs() < 1e-5);
        assert!((club.angle - 90.0).abs() < 1e-3);
    }

    #[test]
    fn test_enhanced_club_falls_back_without_elbows() {
        let snapshot = wrists((0.4, 0.5), (0.6, 0.5));
        assert_eq!(club_position_enhanced(&snapshot), club_position(&snapshot));
    }

    #[test]
    fn test_body_rotation_angles() {
        let snapshot = LandmarkSnapshot::empty()
            .with(LEFT_SHOULDER, Landmark::new(0.4, 0.3))
            .with(RIGHT_SHOULDER, Landmark::new(0.6, 0.5))
            .with(LEFT_HIP, Landmark::new(0.4, 0.6))
            .with(RIGHT_HIP, Landmark::new(0.6, 0.6));
        let rotation = body_rotation(&snapshot);
        assert!((rotation.shoulder_angle - 45.0).abs() < 1e-3);
        assert!(rotation.hip_angle.abs() < 1e-3);
    }

    #[test]
    fn test_body_rotation_missing_hip_is_zero() {
        let snapshot = LandmarkSnapshot::empty()
            .with(LEFT_SHOULDER, Landmark::new(0.4, 0.3))
            .with(RIGHT_SHOULDER, Landmark::new(0.6, 0.5))
            .with(LEFT_HIP, Landmark::new(0.4, 0.6));
        assert_eq!(body_rotation(&snapshot), BodyRotation::default());
    }

    #[test]
    fn test_rotation_magnitude_folds_mirrored_lines() {
        assert!((rotation_magnitude(180.0)).abs() < 1e-6);
        assert!((rotation_magnitude(-170.0) - 10.0).abs() < 1e-4);
        assert!((rotation_magnitude(85.0) - 85.0).abs() < 1e-6);
        assert!((rotation_magnitude(-95.0) - 85.0).abs() < 1e-4);
    }

    #[test]
    fn test_club_velocity() {
        let a = ClubPosition { x: 0.1, y: 0.1, z: None, angle: 0.0 };
        let b = ClubPosition { x: 0.4, y: 0.5, z: None, angle: 0.0 };
        assert_eq!(club_velocity(None, &b), 0.0);
        assert!((club_velocity(Some(&a), &b) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_key_landmark_visibility() {
        let snapshot = LandmarkSnapshot::empty()
            .with(LEFT_SHOULDER, Landmark::with_visibility(0.4, 0.3, 0.9))
            .with(RIGHT_SHOULDER, Landmark::with_visibility(0.6, 0.3, 0.2))
            .with(LEFT_HIP, Landmark::new(0.4, 0.6));
        assert!((key_landmark_visibility(&snapshot) - 0.25).abs() < 1e-6);
        assert_eq!(key_landmark_visibility(&LandmarkSnapshot::empty()), 0.0);
    }

    #[test]
    fn test_reference_line_prefers_hips() {
        let snapshot = LandmarkSnapshot::empty()
            .with(LEFT_SHOULDER, Landmark::new(0.3, 0.3))
            .with(RIGHT_SHOULDER, Landmark::new(0.5, 0.3))
            .with(LEFT_HIP, Landmark::new(0.5, 0.6))
            .with(RIGHT_HIP, Landmark::new(0.7, 0.6));
        assert!((reference_line_x(&snapshot) - 0.6).abs() < 1e-6);
        assert_eq!(reference_line_x(&LandmarkSnapshot::empty()), 0.5);
    }

    #[test]
    fn test_extractor_tracks_motion_and_peak() {
        let mut extractor = FeatureExtractor::default();
        let first = extractor.extract(&wrists((0.4, 0.5), (0.6, 0.5)));
        assert_eq!(first.velocity, 0.0);
        assert!(first.club_measured);

        let second = extractor.extract(&wrists((0.4, 0.3), (0.6, 0.3)));
        assert!((second.velocity - 0.2).abs() < 1e-5);
        assert!((second.club_delta.1 + 0.2).abs() < 1e-5);
        assert!((second.hand_motion - 0.2).abs() < 1e-5);

        let third = extractor.extract(&wrists((0.4, 0.35), (0.6, 0.35)));
        assert!((third.peak_velocity - 0.2).abs() < 1e-5);
        assert!((extractor.peak_velocity() - 0.2).abs() < 1e-5);
    }

    #[test]
    fn test_extractor_dropout_reports_no_motion() {
        let mut extractor = FeatureExtractor::default();
        extractor.extract(&wrists((0.1, 0.1), (0.2, 0.1)));
        let dropout = extractor.extract(&LandmarkSnapshot::empty());
        assert_eq!(dropout.velocity, 0.0);
        assert!(!dropout.club_measured);
        assert_eq!(dropout.club, ClubPosition::center());
    }

    #[test]
    fn test_extractor_reset_clears_history() {
        let mut extractor = FeatureExtractor::default();
        extractor.extract(&wrists((0.1, 0.1), (0.2, 0.1)));
        extractor.extract(&wrists((0.5, 0.5), (0.6, 0.5)));
        assert!(extractor.peak_velocity() > 0.0);

        extractor.reset();
        assert_eq!(extractor.peak_velocity(), 0.0);
        let after = extractor.extract(&wrists((0.5, 0.5), (0.6, 0.5)));
        assert_eq!(after.velocity, 0.0);
    }
}
