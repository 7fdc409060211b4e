//! Offline checks over recorded detector output.
//!
//! These helpers never change results. They flag phase sequences that stray
//! from the canonical swing order and weight records that break the 100%
//! invariant, for diagnostic reporting.

use serde::Serialize;
use tracing::warn;

use crate::hysteresis::is_valid_transition;
use crate::types::{PhaseName, PhaseTransition, WeightDistribution};

/// How a step in a phase sequence departs from canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviationKind {
    /// One step back; the gate allows it but a clean swing never does it.
    BackwardStep,
    /// Not an edge of the adjacency table at all.
    IllegalJump,
    /// A transition whose `from` is not the previous transition's `to`.
    Discontinuity,
}

/// A single flagged step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SequenceDeviation {
    /// Position of the offending step in the input.
    pub index: usize,
    pub from: PhaseName,
    pub to: PhaseName,
    pub kind: DeviationKind,
}

/// Result of checking a phase sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SequenceReport {
    pub deviations: Vec<SequenceDeviation>,
}

impl SequenceReport {
    /// True when every step moved forward along the swing cycle.
    pub fn is_canonical(&self) -> bool {
        self.deviations.is_empty()
    }

    /// Count of steps of a given kind.
    pub fn count(&self, kind: DeviationKind) -> usize {
        self.deviations.iter().filter(|d| d.kind == kind).count()
    }
}

/// Check a sequence of held phases (one entry per phase, or per frame).
///
/// Repeated labels are ignored; each change of label is one step.
pub fn validate_phase_sequence(phases: &[PhaseName]) -> SequenceReport {
    let deviations = phases
        .windows(2)
        .enumerate()
        .filter(|(_, pair)| pair[0] != pair[1])
        .filter_map(|(i, pair)| classify_step(i + 1, pair[0], pair[1]))
        .collect();
    SequenceReport { deviations }
}

/// Check a recorded transition history.
pub fn validate_transition_history(history: &[PhaseTransition]) -> SequenceReport {
    let mut deviations = Vec::new();
    for (i, transition) in history.iter().enumerate() {
        if i > 0 && history[i - 1].to != transition.from {
            deviations.push(SequenceDeviation {
                index: i,
                from: history[i - 1].to,
                to: transition.from,
                kind: DeviationKind::Discontinuity,
            });
        }
        deviations.extend(classify_step(i, transition.from, transition.to));
    }
    SequenceReport { deviations }
}

fn classify_step(index: usize, from: PhaseName, to: PhaseName) -> Option<SequenceDeviation> {
    if to == from.next() {
        return None;
    }
    let kind = if is_valid_transition(from, to) {
        DeviationKind::BackwardStep
    } else {
        DeviationKind::IllegalJump
    };
    Some(SequenceDeviation {
        index,
        from,
        to,
        kind,
    })
}

/// Check the weight invariant on a stored record, logging a warning if broken.
pub fn validate_weight_distribution(weight: &WeightDistribution) -> bool {
    let valid = weight.left <= 100 && weight.left + weight.right == 100 && weight.total == 100;
    if !valid {
        warn!(
            left = weight.left,
            right = weight.right,
            total = weight.total,
            "weight distribution does not sum to 100"
        );
    }
    valid
}

/// Number of label changes in a sequence.
pub fn count_transitions(phases: &[PhaseName]) -> usize {
    phases.windows(2).filter(|pair| pair[0] != pair[1]).count()
}
