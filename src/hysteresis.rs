//! Hysteresis gate for phase changes.
//!
//! The smoother proposes a consensus label; this gate decides whether the
//! proposal may replace the phase currently held. A change is accepted only
//! when every check passes, in this order:
//!
//! 1. the candidate differs from the held phase
//! 2. the cooldown since the last accepted change has elapsed
//! 3. recent confidence clears the hysteresis threshold
//! 4. the candidate's velocity precondition holds
//! 5. the change is an edge of the swing adjacency table
//!
//! Rejections are not errors. The caller keeps reporting the held phase.

use serde::Deserialize;

use crate::smoothing::TemporalSmoother;
use crate::types::PhaseName;

pub const DEFAULT_HYSTERESIS_THRESHOLD: f32 = 0.15;
pub const MIN_HYSTERESIS_THRESHOLD: f32 = 0.05;
pub const MAX_HYSTERESIS_THRESHOLD: f32 = 0.5;

pub const DEFAULT_PHASE_CHANGE_COOLDOWN_MS: f64 = 100.0;
pub const MIN_PHASE_CHANGE_COOLDOWN_MS: f64 = 50.0;
pub const MAX_PHASE_CHANGE_COOLDOWN_MS: f64 = 500.0;

/// Frames averaged for the confidence check.
pub const CONFIDENCE_LOOKBACK: usize = 3;

/// Legal phase changes: one step forward, or one step back to recover from a
/// brief misclassification.
pub fn allowed_transitions(from: PhaseName) -> &'static [PhaseName] {
    match from {
        PhaseName::Address => &[PhaseName::Backswing],
        PhaseName::Backswing => &[PhaseName::Top, PhaseName::Address],
        PhaseName::Top => &[PhaseName::Downswing, PhaseName::Backswing],
        PhaseName::Downswing => &[PhaseName::Impact, PhaseName::Top],
        PhaseName::Impact => &[PhaseName::FollowThrough, PhaseName::Downswing],
        PhaseName::FollowThrough => &[PhaseName::Address, PhaseName::Impact],
    }
}

/// True if `from -> to` is an edge of the adjacency table.
pub fn is_valid_transition(from: PhaseName, to: PhaseName) -> bool {
    allowed_transitions(from).contains(&to)
}

/// Clamp a threshold into range; `0` (or below) disables the check.
pub fn clamp_threshold(threshold: f32) -> f32 {
    if threshold <= 0.0 {
        0.0
    } else {
        threshold.clamp(MIN_HYSTERESIS_THRESHOLD, MAX_HYSTERESIS_THRESHOLD)
    }
}

/// Clamp a cooldown into range; `0` (or below) disables the check.
pub fn clamp_cooldown(cooldown_ms: f64) -> f64 {
    if cooldown_ms <= 0.0 {
        0.0
    } else {
        cooldown_ms.clamp(MIN_PHASE_CHANGE_COOLDOWN_MS, MAX_PHASE_CHANGE_COOLDOWN_MS)
    }
}

/// Velocity preconditions per target phase.
///
/// `delta` is the change between the last two buffered velocities.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct VelocityGates {
    /// Backswing needs `delta > backswing_min_delta` (not sharply decelerating).
    pub backswing_min_delta: f32,
    /// Top needs `delta < top_max_delta` (no longer accelerating).
    pub top_max_delta: f32,
    /// Downswing needs the latest velocity above this.
    pub downswing_min_velocity: f32,
    /// Impact needs the latest velocity above this.
    pub impact_min_velocity: f32,
    /// Follow-through needs `delta < follow_through_max_delta`.
    pub follow_through_max_delta: f32,
}

impl Default for VelocityGates {
    fn default() -> Self {
        Self {
            backswing_min_delta: -0.1,
            top_max_delta: 0.1,
            downswing_min_velocity: 0.5,
            impact_min_velocity: 0.8,
            follow_through_max_delta: 0.2,
        }
    }
}

impl VelocityGates {
    /// Whether `target` may be entered with the given velocities.
    pub fn allows(&self, target: PhaseName, previous: f32, latest: f32) -> bool {
        let delta = latest - previous;
        match target {
            PhaseName::Address => true,
            PhaseName::Backswing => delta > self.backswing_min_delta,
            PhaseName::Top => delta < self.top_max_delta,
            PhaseName::Downswing => latest > self.downswing_min_velocity,
            PhaseName::Impact => latest > self.impact_min_velocity,
            PhaseName::FollowThrough => delta < self.follow_through_max_delta,
        }
    }
}

/// Configuration for the hysteresis gate.
#[derive(Debug, Clone, PartialEq)]
pub struct HysteresisConfig {
    /// Minimum mean confidence over the last frames to accept a change.
    pub hysteresis_threshold: f32,
    /// Minimum time between accepted changes (milliseconds).
    pub phase_change_cooldown_ms: f64,
    pub velocity: VelocityGates,
}

impl Default for HysteresisConfig {
    fn default() -> Self {
        Self {
            hysteresis_threshold: DEFAULT_HYSTERESIS_THRESHOLD,
            phase_change_cooldown_ms: DEFAULT_PHASE_CHANGE_COOLDOWN_MS,
            velocity: VelocityGates::default(),
        }
    }
}

impl HysteresisConfig {
    /// Thresholds and cooldown all zero: every adjacent change with a
    /// satisfied velocity precondition goes through.
    pub fn disabled() -> Self {
        Self {
            hysteresis_threshold: 0.0,
            phase_change_cooldown_ms: 0.0,
            velocity: VelocityGates::default(),
        }
    }
}

/// Why a proposed change was held back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rejection {
    /// The smoother reached no consensus.
    NoConsensus,
    /// The consensus is the phase already held.
    Unchanged,
    /// Too soon after the previous accepted change.
    Cooldown { elapsed_ms: f64 },
    /// Recent frames were not confident enough.
    LowConfidence { average: f32 },
    /// The target phase's velocity precondition failed.
    Velocity { previous: f32, latest: f32 },
    /// The change is not an edge of the adjacency table.
    NotAdjacent,
}

/// Outcome of one gate evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateDecision {
    Accepted(PhaseName),
    Rejected(Rejection),
}

impl GateDecision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, GateDecision::Accepted(_))
    }
}

/// Gate state: the configuration and the time of the last accepted change.
#[derive(Debug, Clone)]
pub struct HysteresisGate {
    config: HysteresisConfig,
    last_change_ms: Option<f64>,
}

impl HysteresisGate {
    /// Create a gate; threshold and cooldown are clamped into range.
    pub fn new(config: HysteresisConfig) -> Self {
        let config = HysteresisConfig {
            hysteresis_threshold: clamp_threshold(config.hysteresis_threshold),
            phase_change_cooldown_ms: clamp_cooldown(config.phase_change_cooldown_ms),
            velocity: config.velocity,
        };
        Self {
            config,
            last_change_ms: None,
        }
    }

    pub fn config(&self) -> &HysteresisConfig {
        &self.config
    }

    /// Time of the last accepted change, if any.
    pub fn last_change_ms(&self) -> Option<f64> {
        self.last_change_ms
    }

    /// Evaluate the smoother's consensus against the held phase at `now_ms`.
    ///
    /// On acceptance the change time is recorded so the cooldown applies to
    /// the next proposal.
    pub fn evaluate(
        &mut self,
        held: PhaseName,
        smoother: &TemporalSmoother,
        now_ms: f64,
    ) -> GateDecision {
        let decision = self.check(held, smoother, now_ms);
        if decision.is_accepted() {
            self.last_change_ms = Some(now_ms);
        }
        decision
    }

    fn check(&self, held: PhaseName, smoother: &TemporalSmoother, now_ms: f64) -> GateDecision {
        use GateDecision::Rejected;

        let Some(candidate) = smoother.consensus() else {
            return Rejected(Rejection::NoConsensus);
        };
        if candidate == held {
            return Rejected(Rejection::Unchanged);
        }

        if let Some(last) = self.last_change_ms {
            let elapsed_ms = now_ms - last;
            if elapsed_ms < self.config.phase_change_cooldown_ms {
                return Rejected(Rejection::Cooldown { elapsed_ms });
            }
        }

        let average = smoother.recent_confidence(CONFIDENCE_LOOKBACK);
        if average < self.config.hysteresis_threshold {
            return Rejected(Rejection::LowConfidence { average });
        }

        let (previous, latest) = smoother.last_velocities().unwrap_or((0.0, 0.0));
        if !self.config.velocity.allows(candidate, previous, latest) {
            return Rejected(Rejection::Velocity { previous, latest });
        }

        if !is_valid_transition(held, candidate) {
            return Rejected(Rejection::NotAdjacent);
        }

        GateDecision::Accepted(candidate)
    }

    /// Forget the last change time.
    pub fn reset(&mut self) {
        self.last_change_ms = None;
    }
}

impl Default for HysteresisGate {
    fn default() -> Self {
        Self::new(HysteresisConfig::default())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn smoother_with(
        label: PhaseName,
        frames: usize,
        velocity: f32,
        confidence: f32,
    ) -> TemporalSmoother {
        let mut smoother = TemporalSmoother::new(5);
        for _ in 0..frames {
            smoother.push(label, velocity, confidence);
        }
        smoother
    }

    #[test]
    fn test_adjacency_table() {
        use PhaseName::*;
        assert!(is_valid_transition(Address, Backswing));
        assert!(!is_valid_transition(Address, Top));
        assert!(is_valid_transition(Backswing, Address));
        assert!(is_valid_transition(Top, Downswing));
        assert!(is_valid_transition(Downswing, Top));
        assert!(is_valid_transition(Impact, FollowThrough));
        assert!(is_valid_transition(FollowThrough, Address));
        assert!(is_valid_transition(FollowThrough, Impact));
        assert!(!is_valid_transition(Impact, Backswing));
        assert!(!is_valid_transition(Address, FollowThrough));
    }

    #[test]
    fn test_adjacency_is_one_step_either_way() {
        for from in PhaseName::ALL {
            for to in PhaseName::ALL {
                let expected =
                    to == from.next() || (to == from.previous() && from != PhaseName::Address);
                assert_eq!(is_valid_transition(from, to), expected, "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_velocity_gates() {
        let gates = VelocityGates::default();
        assert!(gates.allows(PhaseName::Address, 5.0, 0.0));
        assert!(gates.allows(PhaseName::Backswing, 0.2, 0.15));
        assert!(!gates.allows(PhaseName::Backswing, 0.5, 0.2));
        assert!(gates.allows(PhaseName::Top, 0.3, 0.1));
        assert!(!gates.allows(PhaseName::Top, 0.1, 0.3));
        assert!(gates.allows(PhaseName::Downswing, 0.0, 0.6));
        assert!(!gates.allows(PhaseName::Downswing, 0.0, 0.5));
        assert!(gates.allows(PhaseName::Impact, 0.0, 0.9));
        assert!(!gates.allows(PhaseName::Impact, 0.0, 0.8));
        assert!(gates.allows(PhaseName::FollowThrough, 0.9, 0.5));
        assert!(!gates.allows(PhaseName::FollowThrough, 0.1, 0.4));
    }

    #[test]
    fn test_clamping() {
        assert_eq!(clamp_threshold(0.0), 0.0);
        assert_eq!(clamp_threshold(0.01), MIN_HYSTERESIS_THRESHOLD);
        assert_eq!(clamp_threshold(0.9), MAX_HYSTERESIS_THRESHOLD);
        assert_eq!(clamp_cooldown(-5.0), 0.0);
        assert_eq!(clamp_cooldown(10.0), MIN_PHASE_CHANGE_COOLDOWN_MS);
        assert_eq!(clamp_cooldown(1000.0), MAX_PHASE_CHANGE_COOLDOWN_MS);
        assert_eq!(clamp_cooldown(200.0), 200.0);
    }

    #[test]
    fn test_accepts_valid_change() {
        let mut gate = HysteresisGate::default();
        let smoother = smoother_with(PhaseName::Backswing, 5, 0.1, 0.8);
        let decision = gate.evaluate(PhaseName::Address, &smoother, 0.0);
        assert_eq!(decision, GateDecision::Accepted(PhaseName::Backswing));
        assert_eq!(gate.last_change_ms(), Some(0.0));
    }

    #[test]
    fn test_rejects_without_consensus() {
        let mut gate = HysteresisGate::default();
        let smoother = smoother_with(PhaseName::Backswing, 2, 0.1, 0.8);
        assert_eq!(
            gate.evaluate(PhaseName::Address, &smoother, 0.0),
            GateDecision::Rejected(Rejection::NoConsensus)
        );
    }

    #[test]
    fn test_rejects_unchanged() {
        let mut gate = HysteresisGate::default();
        let smoother = smoother_with(PhaseName::Address, 5, 0.0, 0.8);
        assert_eq!(
            gate.evaluate(PhaseName::Address, &smoother, 0.0),
            GateDecision::Rejected(Rejection::Unchanged)
        );
    }

    #[test]
    fn test_cooldown_blocks_rapid_changes() {
        let mut gate = HysteresisGate::default();
        let to_backswing = smoother_with(PhaseName::Backswing, 5, 0.1, 0.8);
        assert!(gate.evaluate(PhaseName::Address, &to_backswing, 1000.0).is_accepted());

        let to_top = smoother_with(PhaseName::Top, 5, 0.1, 0.8);
        assert!(matches!(
            gate.evaluate(PhaseName::Backswing, &to_top, 1050.0),
            GateDecision::Rejected(Rejection::Cooldown { .. })
        ));
        assert!(gate.evaluate(PhaseName::Backswing, &to_top, 1100.0).is_accepted());
    }

    #[test]
    fn test_rejects_low_confidence() {
        let mut gate = HysteresisGate::default();
        let smoother = smoother_with(PhaseName::Backswing, 5, 0.1, 0.1);
        assert!(matches!(
            gate.evaluate(PhaseName::Address, &smoother, 0.0),
            GateDecision::Rejected(Rejection::LowConfidence { .. })
        ));
    }

    #[test]
    fn test_rejects_failed_velocity_precondition() {
        let mut gate = HysteresisGate::default();
        let smoother = smoother_with(PhaseName::Downswing, 5, 0.2, 0.8);
        assert!(matches!(
            gate.evaluate(PhaseName::Top, &smoother, 0.0),
            GateDecision::Rejected(Rejection::Velocity { .. })
        ));
    }

    #[test]
    fn test_rejects_non_adjacent() {
        let mut gate = HysteresisGate::default();
        let smoother = smoother_with(PhaseName::Top, 5, 0.1, 0.8);
        assert_eq!(
            gate.evaluate(PhaseName::Address, &smoother, 0.0),
            GateDecision::Rejected(Rejection::NotAdjacent)
        );
        assert_eq!(gate.last_change_ms(), None);
    }

    #[test]
    fn test_disabled_gate_has_no_cooldown() {
        let mut gate = HysteresisGate::new(HysteresisConfig::disabled());
        let to_backswing = smoother_with(PhaseName::Backswing, 5, 0.1, 0.0);
        assert!(gate.evaluate(PhaseName::Address, &to_backswing, 0.0).is_accepted());
        let to_top = smoother_with(PhaseName::Top, 5, 0.1, 0.0);
        assert!(gate.evaluate(PhaseName::Backswing, &to_top, 0.0).is_accepted());
    }

    #[test]
    fn test_reset_clears_cooldown() {
        let mut gate = HysteresisGate::default();
        let smoother = smoother_with(PhaseName::Backswing, 5, 0.1, 0.8);
        gate.evaluate(PhaseName::Address, &smoother, 0.0);
        gate.reset();
        assert_eq!(gate.last_change_ms(), None);
        assert!(gate.evaluate(PhaseName::Address, &smoother, 10.0).is_accepted());
    }
}
