//! Swing phase detection session.
//!
//! [`SwingPhaseDetector`] ties the stages together for one swing:
//!
//! 1. **Feature extraction**: weight, club estimate, rotation, velocity
//! 2. **Raw classification**: first matching phase rule
//! 3. **Temporal smoothing**: majority vote over recent raw labels
//! 4. **Hysteresis gate**: cooldown, confidence, velocity and adjacency checks
//! 5. **Session state**: held phase, phase timeline, transition history
//!
//! Frames must be fed in order. The smoothing and hysteresis state is only
//! meaningful for a monotonically increasing frame sequence, so a caller that
//! seeks backward has to [`reset`](SwingPhaseDetector::reset) and replay.
//!
//! The detector is a plain owned value with `&mut self` processing; sharing one
//! across threads needs external locking.

use tracing::{debug, trace};

use crate::classifier::{Classification, PhaseClassifier};
use crate::config::DetectorConfig;
use crate::features::FeatureExtractor;
use crate::hysteresis::{GateDecision, HysteresisGate};
use crate::smoothing::TemporalSmoother;
use crate::types::{FrameFeatures, LandmarkSnapshot, PhaseName, PhaseTransition, SwingPhase};

/// Everything the detector produced for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameResult {
    /// The held phase as of this frame.
    pub phase: SwingPhase,
    /// Unsmoothed classification of this frame alone.
    pub raw: Classification,
    /// The smoother's majority label, if any.
    pub consensus: Option<PhaseName>,
    /// What the gate decided about the consensus.
    pub decision: GateDecision,
    /// Set when this frame started a new phase.
    pub transition: Option<PhaseTransition>,
    pub features: FrameFeatures,
}

/// One swing analysis session.
pub struct SwingPhaseDetector {
    config: DetectorConfig,

    // Processing stages
    extractor: FeatureExtractor,
    classifier: PhaseClassifier,
    smoother: TemporalSmoother,
    gate: HysteresisGate,

    // Held phase
    current_phase: PhaseName,
    phase_start_frame: u64,
    phase_start_time_ms: f64,
    last_record: Option<SwingPhase>,

    // History
    frame_count: u64,
    transitions: Vec<PhaseTransition>,
    completed: Vec<SwingPhase>,
}

impl SwingPhaseDetector {
    /// Create a detector. Out-of-range tunables are clamped.
    pub fn new(config: DetectorConfig) -> Self {
        let config = config.normalized();
        Self {
            extractor: FeatureExtractor::new(config.features.clone()),
            classifier: PhaseClassifier::new(config.classifier.clone()),
            smoother: TemporalSmoother::new(config.smoothing_window),
            gate: HysteresisGate::new(config.hysteresis()),
            config,
            current_phase: PhaseName::Address,
            phase_start_frame: 0,
            phase_start_time_ms: 0.0,
            last_record: None,
            frame_count: 0,
            transitions: Vec::new(),
            completed: Vec::new(),
        }
    }

    /// Process one frame and report the held phase for it.
    pub fn process_frame(&mut self, snapshot: &LandmarkSnapshot) -> FrameResult {
        let frame = self.frame_count;
        let time_ms = snapshot
            .timestamp_ms
            .unwrap_or(frame as f64 * self.config.frame_interval_ms());
        if frame == 0 {
            self.phase_start_time_ms = time_ms;
        }

        let features = self.extractor.extract(snapshot);
        let raw = self.classifier.classify(&features);
        self.smoother.push(raw.phase, features.velocity, raw.confidence);

        let consensus = self.smoother.consensus();
        let decision = self.gate.evaluate(self.current_phase, &self.smoother, time_ms);

        let transition = match decision {
            GateDecision::Accepted(next) => Some(self.enter_phase(next, frame, time_ms, &features)),
            GateDecision::Rejected(reason) => {
                trace!(frame, held = %self.current_phase, raw = %raw.phase, ?reason, "phase held");
                None
            }
        };

        let record = SwingPhase {
            name: self.current_phase,
            start_frame: self.phase_start_frame,
            end_frame: frame,
            start_time_ms: self.phase_start_time_ms,
            end_time_ms: time_ms,
            duration_ms: time_ms - self.phase_start_time_ms,
            confidence: self.classifier.confidence(self.current_phase, &features),
            weight_distribution: features.weight,
            club_position: features.club,
            body_rotation: features.rotation,
        };
        self.last_record = Some(record.clone());
        self.frame_count += 1;

        FrameResult {
            phase: record,
            raw,
            consensus,
            decision,
            transition,
            features,
        }
    }

    /// Process a whole sequence in order.
    pub fn process_sequence<'a, I>(&mut self, snapshots: I) -> Vec<FrameResult>
    where
        I: IntoIterator<Item = &'a LandmarkSnapshot>,
    {
        snapshots
            .into_iter()
            .map(|snapshot| self.process_frame(snapshot))
            .collect()
    }

    /// The phase currently held.
    pub fn current_phase(&self) -> PhaseName {
        self.current_phase
    }

    /// Accepted transitions in order.
    pub fn transition_history(&self) -> &[PhaseTransition] {
        &self.transitions
    }

    /// Phases that have ended, in order. Each record covers the frames the
    /// phase was held; phases that never held a frame are omitted.
    pub fn completed_phases(&self) -> &[SwingPhase] {
        &self.completed
    }

    /// Completed phases followed by the phase still held, if any frame was seen.
    pub fn timeline(&self) -> Vec<SwingPhase> {
        let mut timeline = self.completed.clone();
        if let Some(current) = self.last_record.as_ref() {
            timeline.push(current.clone());
        }
        timeline
    }

    /// Frames processed since creation or the last reset.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Highest club velocity seen in this session.
    pub fn peak_velocity(&self) -> f32 {
        self.extractor.peak_velocity()
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Clear all session state so the next frame starts a fresh swing.
    pub fn reset(&mut self) {
        debug!(
            frames = self.frame_count,
            transitions = self.transitions.len(),
            "resetting swing session"
        );
        self.extractor.reset();
        self.smoother.clear();
        self.gate.reset();
        self.current_phase = PhaseName::Address;
        self.phase_start_frame = 0;
        self.phase_start_time_ms = 0.0;
        self.last_record = None;
        self.frame_count = 0;
        self.transitions.clear();
        self.completed.clear();
    }

    // =========================================================================
    // PRIVATE METHODS
    // =========================================================================

    fn enter_phase(
        &mut self,
        next: PhaseName,
        frame: u64,
        time_ms: f64,
        features: &FrameFeatures,
    ) -> PhaseTransition {
        if let Some(last) = self.last_record.take() {
            if last.name == self.current_phase {
                self.completed.push(last);
            }
        }

        let transition = PhaseTransition {
            from: self.current_phase,
            to: next,
            frame,
            time_ms,
            weight_distribution: features.weight,
        };
        debug!(frame, time_ms, from = %transition.from, to = %transition.to, "phase transition");

        self.transitions.push(transition.clone());
        self.current_phase = next;
        self.phase_start_frame = frame;
        self.phase_start_time_ms = time_ms;
        transition
    }
}

impl Default for SwingPhaseDetector {
    fn default() -> Self {
        Self::new(DetectorConfig::default())
    }
}

// ============================================================================
// TESTS
// ============================================================================
