//! Core data types for the swing phase engine.
//!
//! This module defines the input contract (landmark snapshots from an external
//! pose estimator), the per-frame feature snapshots derived from them, and the
//! phase records handed to downstream consumers.
//!
//! Coordinates are normalized to the video frame: `x` and `y` lie in `[0, 1]`
//! with `y` increasing downward.

use serde::{Deserialize, Serialize};

// ============================================================================
// LANDMARK INDICES (MediaPipe Pose - 33 total)
// ============================================================================

/// Number of landmark slots in a snapshot.
pub const LANDMARK_COUNT: usize = 33;

pub const NOSE: usize = 0;
pub const LEFT_SHOULDER: usize = 11;
pub const RIGHT_SHOULDER: usize = 12;
pub const LEFT_ELBOW: usize = 13;
pub const RIGHT_ELBOW: usize = 14;
pub const LEFT_WRIST: usize = 15;
pub const RIGHT_WRIST: usize = 16;
pub const LEFT_HIP: usize = 23;
pub const RIGHT_HIP: usize = 24;
pub const LEFT_KNEE: usize = 25;
pub const RIGHT_KNEE: usize = 26;
pub const LEFT_ANKLE: usize = 27;
pub const RIGHT_ANKLE: usize = 28;
pub const LEFT_HEEL: usize = 29;
pub const RIGHT_HEEL: usize = 30;
pub const LEFT_FOOT_INDEX: usize = 31;
pub const RIGHT_FOOT_INDEX: usize = 32;

/// Landmarks whose visibility feeds the confidence score.
pub const KEY_LANDMARKS: [usize; 8] = [
    LEFT_SHOULDER,
    RIGHT_SHOULDER,
    LEFT_WRIST,
    RIGHT_WRIST,
    LEFT_HIP,
    RIGHT_HIP,
    LEFT_ANKLE,
    RIGHT_ANKLE,
];

// ============================================================================
// INPUT CONTRACT
// ============================================================================

/// A single landmark point in normalized frame coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f32>,
    /// Detection confidence in `[0, 1]`. Absent means fully visible.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f32>,
}

impl Landmark {
    /// Creates a fully visible 2-D landmark.
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            z: None,
            visibility: None,
        }
    }

    /// Creates a 2-D landmark with an explicit visibility score.
    pub fn with_visibility(x: f32, y: f32, visibility: f32) -> Self {
        Self {
            x,
            y,
            z: None,
            visibility: Some(visibility),
        }
    }

    /// Visibility score, treating an absent score as fully visible.
    pub fn visibility_or_default(&self) -> f32 {
        self.visibility.unwrap_or(1.0)
    }

    /// True if both planar coordinates are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// One video frame worth of landmarks from the pose estimator.
///
/// Slots are indexed by anatomical role (see the index constants above). A slot
/// is `None` when the estimator did not report that landmark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkSnapshot {
    landmarks: Vec<Option<Landmark>>,
    /// Capture time in milliseconds, if the source provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_ms: Option<f64>,
}

impl LandmarkSnapshot {
    /// Creates a snapshot with every slot empty.
    pub fn empty() -> Self {
        Self {
            landmarks: vec![None; LANDMARK_COUNT],
            timestamp_ms: None,
        }
    }

    /// Creates a snapshot from a landmark list.
    ///
    /// Lists shorter than [`LANDMARK_COUNT`] are padded with empty slots and
    /// longer ones are truncated, so indexing by role is always in bounds.
    pub fn from_landmarks(mut landmarks: Vec<Option<Landmark>>) -> Self {
        landmarks.resize(LANDMARK_COUNT, None);
        Self {
            landmarks,
            timestamp_ms: None,
        }
    }

    /// Builder-style timestamp setter.
    pub fn at_time(mut self, timestamp_ms: f64) -> Self {
        self.timestamp_ms = Some(timestamp_ms);
        self
    }

    /// Builder-style landmark setter.
    pub fn with(mut self, index: usize, landmark: Landmark) -> Self {
        self.set(index, Some(landmark));
        self
    }

    /// Sets or clears a slot. Out-of-range indices are ignored.
    pub fn set(&mut self, index: usize, landmark: Option<Landmark>) {
        if let Some(slot) = self.landmarks.get_mut(index) {
            *slot = landmark;
        }
    }

    /// Returns the landmark at `index` if it is present with finite coordinates.
    pub fn get(&self, index: usize) -> Option<&Landmark> {
        self.landmarks
            .get(index)
            .and_then(|slot| slot.as_ref())
            .filter(|lm| lm.is_finite())
    }

    /// Returns both landmarks of a pair, or `None` if either is missing.
    pub fn pair(&self, left: usize, right: usize) -> Option<(&Landmark, &Landmark)> {
        Some((self.get(left)?, self.get(right)?))
    }

    /// All slots in index order.
    pub fn landmarks(&self) -> &[Option<Landmark>] {
        &self.landmarks
    }
}

impl Default for LandmarkSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

// ============================================================================
// DERIVED FEATURES
// ============================================================================

/// Estimated share of body weight on each foot, in whole percent.
///
/// `left + right == 100` always holds; constructors derive `right` from `left`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightDistribution {
    pub left: u32,
    pub right: u32,
    pub total: u32,
}

impl WeightDistribution {
    /// Creates a distribution from the left-foot percentage (clamped to 100).
    pub fn from_left(left: u32) -> Self {
        let left = left.min(100);
        Self {
            left,
            right: 100 - left,
            total: 100,
        }
    }

    /// The 50/50 default used when feet cannot be measured.
    pub fn balanced() -> Self {
        Self::from_left(50)
    }

    /// Absolute difference between the two sides, in percentage points.
    pub fn asymmetry(&self) -> u32 {
        self.left.abs_diff(self.right)
    }
}

impl Default for WeightDistribution {
    fn default() -> Self {
        Self::balanced()
    }
}

/// Geometric estimate of the club head position. Not a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClubPosition {
    pub x: f32,
    pub y: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f32>,
    /// Shaft angle in degrees.
    pub angle: f32,
}

impl ClubPosition {
    /// Neutral estimate at the frame center.
    pub fn center() -> Self {
        Self {
            x: 0.5,
            y: 0.5,
            z: None,
            angle: 0.0,
        }
    }

    /// Planar distance to another estimate.
    pub fn distance_to(&self, other: &ClubPosition) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl Default for ClubPosition {
    fn default() -> Self {
        Self::center()
    }
}

/// Horizontal angles of the shoulder and hip lines, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BodyRotation {
    pub shoulder_angle: f32,
    pub hip_angle: f32,
}

/// Everything the classifier needs to know about one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameFeatures {
    pub weight: WeightDistribution,
    pub club: ClubPosition,
    pub rotation: BodyRotation,
    /// Club head displacement since the previous frame (normalized units).
    pub velocity: f32,
    /// Signed club displacement `(dx, dy)` since the previous frame.
    pub club_delta: (f32, f32),
    /// Displacement of the hand midpoint since the previous frame.
    pub hand_motion: f32,
    /// Highest velocity seen so far in the session, including this frame.
    pub peak_velocity: f32,
    /// X coordinate of the body's vertical reference line.
    pub reference_x: f32,
    /// Fraction of [`KEY_LANDMARKS`] that are present and visible.
    pub visibility: f32,
    /// Weight was computed from both feet rather than defaulted.
    pub weight_measured: bool,
    /// Shoulder and hip angles were computed rather than defaulted.
    pub rotation_measured: bool,
    /// Club position was computed from the wrists rather than defaulted.
    pub club_measured: bool,
}

// ============================================================================
// PHASES
// ============================================================================

/// The six swing phases in canonical order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum PhaseName {
    /// Golfer set up over the ball, nearly still.
    #[default]
    Address,
    /// Club travelling up and behind the body.
    Backswing,
    /// Transition point at the top of the swing.
    Top,
    /// Club accelerating down toward the ball.
    Downswing,
    /// Club head passing through the ball position.
    Impact,
    /// Club continuing up to the finish.
    FollowThrough,
}

impl PhaseName {
    /// All phases in canonical order.
    pub const ALL: [PhaseName; 6] = [
        PhaseName::Address,
        PhaseName::Backswing,
        PhaseName::Top,
        PhaseName::Downswing,
        PhaseName::Impact,
        PhaseName::FollowThrough,
    ];

    /// Position in the canonical order, starting at 0 for address.
    pub fn index(&self) -> usize {
        match self {
            PhaseName::Address => 0,
            PhaseName::Backswing => 1,
            PhaseName::Top => 2,
            PhaseName::Downswing => 3,
            PhaseName::Impact => 4,
            PhaseName::FollowThrough => 5,
        }
    }

    /// The phase that follows in the swing cycle (follow-through wraps to address).
    pub fn next(&self) -> PhaseName {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    /// The phase that precedes in the swing cycle.
    pub fn previous(&self) -> PhaseName {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseName::Address => "address",
            PhaseName::Backswing => "backswing",
            PhaseName::Top => "top",
            PhaseName::Downswing => "downswing",
            PhaseName::Impact => "impact",
            PhaseName::FollowThrough => "follow-through",
        }
    }
}

impl std::fmt::Display for PhaseName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// A held phase as reported for a frame, or a closed phase on the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwingPhase {
    pub name: PhaseName,
    pub start_frame: u64,
    pub end_frame: u64,
    pub start_time_ms: f64,
    pub end_time_ms: f64,
    pub duration_ms: f64,
    pub confidence: f32,
    pub weight_distribution: WeightDistribution,
    pub club_position: ClubPosition,
    pub body_rotation: BodyRotation,
}

/// An accepted change of held phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseTransition {
    pub from: PhaseName,
    pub to: PhaseName,
    pub frame: u64,
    pub time_ms: f64,
    pub weight_distribution: WeightDistribution,
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_from_left_keeps_sum() {
        for left in 0..=120 {
            let w = WeightDistribution::from_left(left);
            assert_eq!(w.left + w.right, 100);
            assert_eq!(w.total, 100);
        }
    }

    #[test]
    fn test_weight_asymmetry() {
        assert_eq!(WeightDistribution::from_left(65).asymmetry(), 30);
        assert_eq!(WeightDistribution::from_left(20).asymmetry(), 60);
        assert_eq!(WeightDistribution::balanced().asymmetry(), 0);
    }

    #[test]
    fn test_phase_cycle_wraps() {
        assert_eq!(PhaseName::FollowThrough.next(), PhaseName::Address);
        assert_eq!(PhaseName::Address.previous(), PhaseName::FollowThrough);
        for phase in PhaseName::ALL {
            assert_eq!(phase.next().previous(), phase);
        }
    }

    #[test]
    fn test_phase_names_serialize_kebab_case() {
        let json = serde_json::to_string(&PhaseName::FollowThrough).unwrap();
        assert_eq!(json, "\"follow-through\"");
        let parsed: PhaseName = serde_json::from_str("\"downswing\"").unwrap();
        assert_eq!(parsed, PhaseName::Downswing);
    }

    #[test]
    fn test_snapshot_padding_and_lookup() {
        let snapshot = LandmarkSnapshot::from_landmarks(vec![Some(Landmark::new(0.1, 0.2))]);
        assert_eq!(snapshot.landmarks().len(), LANDMARK_COUNT);
        assert!(snapshot.get(NOSE).is_some());
        assert!(snapshot.get(LEFT_WRIST).is_none());
        assert!(snapshot.get(LANDMARK_COUNT + 5).is_none());
    }

    #[test]
    fn test_snapshot_ignores_non_finite_landmarks() {
        let snapshot = LandmarkSnapshot::empty().with(LEFT_WRIST, Landmark::new(f32::NAN, 0.5));
        assert!(snapshot.get(LEFT_WRIST).is_none());
    }

    #[test]
    fn test_snapshot_deserializes_from_json() {
        let json = r#"{"landmarks":[null,{"x":0.5,"y":0.4,"visibility":0.9}],"timestamp_ms":33.3}"#;
        let snapshot: LandmarkSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.timestamp_ms, Some(33.3));
        let lm = snapshot.get(1).unwrap();
        assert_eq!(lm.visibility_or_default(), 0.9);
    }
}
