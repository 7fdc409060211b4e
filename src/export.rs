//! Structured JSON output for swing analysis.
//!
//! Two shapes are provided:
//! - **Timeline**: the complete session (phase records, transitions, summary)
//!   produced once the swing has been processed
//! - **Streaming updates**: one small message per frame for live overlays
//!
//! Both serialize through `serde_json`.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::detector::{FrameResult, SwingPhaseDetector};
use crate::error::Result;
use crate::types::{PhaseName, PhaseTransition, SwingPhase, WeightDistribution};
use crate::validation::validate_transition_history;

/// Complete record of one processed swing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwingTimeline {
    pub frames_processed: u64,
    /// Held-phase records in order, the last one still open.
    pub phases: Vec<SwingPhase>,
    pub transitions: Vec<PhaseTransition>,
    pub summary: SwingSummary,
}

/// Aggregate statistics over a timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwingSummary {
    pub transition_count: usize,
    /// Total time held per phase; phases never held are absent.
    pub phase_durations_ms: BTreeMap<PhaseName, f64>,
    /// Backswing time over downswing time, when both were held for a while.
    pub tempo_ratio: Option<f64>,
    /// True when every transition stepped forward through the swing.
    pub canonical: bool,
    pub peak_club_velocity: f32,
}

impl SwingSummary {
    /// Summarize a list of phase records and the transitions between them.
    pub fn compute(
        phases: &[SwingPhase],
        transitions: &[PhaseTransition],
        peak_club_velocity: f32,
    ) -> Self {
        let mut phase_durations_ms = BTreeMap::new();
        for phase in phases {
            *phase_durations_ms.entry(phase.name).or_insert(0.0) += phase.duration_ms;
        }

        let backswing = phase_durations_ms.get(&PhaseName::Backswing).copied();
        let downswing = phase_durations_ms.get(&PhaseName::Downswing).copied();
        let tempo_ratio = match (backswing, downswing) {
            (Some(back), Some(down)) if down > 0.0 => Some(back / down),
            _ => None,
        };

        Self {
            transition_count: transitions.len(),
            phase_durations_ms,
            tempo_ratio,
            canonical: validate_transition_history(transitions).is_canonical(),
            peak_club_velocity,
        }
    }
}

impl SwingTimeline {
    /// Snapshot the detector's session so far.
    pub fn from_detector(detector: &SwingPhaseDetector) -> Self {
        let phases = detector.timeline();
        let transitions = detector.transition_history().to_vec();
        let summary = SwingSummary::compute(&phases, &transitions, detector.peak_velocity());
        Self {
            frames_processed: detector.frame_count(),
            phases,
            transitions,
            summary,
        }
    }

    /// Serialize to compact JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serialize to indented JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Export only the transitions.
    pub fn transitions_only_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.transitions)?)
    }
}

// ============================================================================
// STREAMING
// ============================================================================

/// A single per-frame message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamingUpdate {
    pub seq: u64,
    pub frame: u64,
    pub time_ms: f64,
    #[serde(flatten)]
    pub update: StreamingUpdateType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum StreamingUpdateType {
    /// The held phase for a frame with no change.
    Phase {
        phase: PhaseName,
        confidence: f32,
        weight: WeightDistribution,
    },
    /// A new phase started on this frame.
    Transition(PhaseTransition),
}

impl StreamingUpdate {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Numbers per-frame results into streaming updates.
#[derive(Debug, Default)]
pub struct StreamingExporter {
    sequence: u64,
}

impl StreamingExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn one detector result into an update.
    pub fn frame_update(&mut self, result: &FrameResult) -> StreamingUpdate {
        self.sequence += 1;
        let update = match &result.transition {
            Some(transition) => StreamingUpdateType::Transition(transition.clone()),
            None => StreamingUpdateType::Phase {
                phase: result.phase.name,
                confidence: result.phase.confidence,
                weight: result.phase.weight_distribution,
            },
        };
        StreamingUpdate {
            seq: self.sequence,
            frame: result.phase.end_frame,
            time_ms: result.phase.end_time_ms,
            update,
        }
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

// ============================================================================
// TESTS
// ============================================================================
