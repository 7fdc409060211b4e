//! Temporal smoothing of raw phase labels.
//!
//! Keeps three parallel rolling buffers (raw labels, club velocities, raw
//! confidences) of the most recent frames and reduces the label buffer to a
//! single consensus label by majority vote.
//!
//! A label wins only with at least 60% of the configured window behind it.
//! Anything less reports no consensus, which the caller reads as "keep the
//! currently held phase".

use std::collections::VecDeque;

use crate::types::PhaseName;

/// Default number of frames in the voting window.
pub const DEFAULT_SMOOTHING_WINDOW: usize = 5;

/// Smallest window that still gives a meaningful majority.
pub const MIN_SMOOTHING_WINDOW: usize = 3;

/// Largest supported window.
pub const MAX_SMOOTHING_WINDOW: usize = 10;

/// Window value that disables smoothing: the latest raw label is the consensus.
pub const PASSTHROUGH_WINDOW: usize = 1;

/// Share of the window a label needs to win the vote (60%), as a fraction.
pub const CONSENSUS_NUMERATOR: usize = 3;
pub const CONSENSUS_DENOMINATOR: usize = 5;

/// Velocity and confidence history kept even in passthrough mode.
const MIN_SIGNAL_HISTORY: usize = 3;

/// Clamp a requested window into the supported range.
///
/// `0` and `1` select passthrough, `2` is raised to the minimum voting window
/// and anything above the maximum is lowered to it.
pub fn clamp_window(requested: usize) -> usize {
    if requested <= PASSTHROUGH_WINDOW {
        PASSTHROUGH_WINDOW
    } else {
        requested.clamp(MIN_SMOOTHING_WINDOW, MAX_SMOOTHING_WINDOW)
    }
}

/// Votes needed for a label to become the consensus.
pub fn required_votes(window: usize) -> usize {
    // Integer ceil(window * 0.6); float math rounds 5 * 0.6 up past 3.
    (window * CONSENSUS_NUMERATOR).div_ceil(CONSENSUS_DENOMINATOR).max(1)
}

/// Rolling buffers of recent raw classifications.
#[derive(Debug, Clone)]
pub struct TemporalSmoother {
    window: usize,
    signal_capacity: usize,
    labels: VecDeque<PhaseName>,
    velocities: VecDeque<f32>,
    confidences: VecDeque<f32>,
}

impl TemporalSmoother {
    /// Create a smoother; the window is passed through [`clamp_window`].
    pub fn new(window: usize) -> Self {
        let window = clamp_window(window);
        let signal_capacity = window.max(MIN_SIGNAL_HISTORY);
        Self {
            window,
            signal_capacity,
            labels: VecDeque::with_capacity(window),
            velocities: VecDeque::with_capacity(signal_capacity),
            confidences: VecDeque::with_capacity(signal_capacity),
        }
    }

    /// Record one raw classification, dropping the oldest once full.
    pub fn push(&mut self, label: PhaseName, velocity: f32, confidence: f32) {
        push_bounded(&mut self.labels, label, self.window);
        push_bounded(&mut self.velocities, velocity, self.signal_capacity);
        push_bounded(&mut self.confidences, confidence, self.signal_capacity);
    }

    /// Majority label if it holds at least 60% of the window, else `None`.
    pub fn consensus(&self) -> Option<PhaseName> {
        let mut counts = [0usize; PhaseName::ALL.len()];
        for label in &self.labels {
            counts[label.index()] += 1;
        }

        // Ties cannot both clear a 60% bar, so the first maximum is fine.
        let (best, &count) = counts
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(&a.0)))?;

        (count >= required_votes(self.window)).then(|| PhaseName::ALL[best])
    }

    /// Mean confidence of the most recent `n` frames (0 if empty).
    pub fn recent_confidence(&self, n: usize) -> f32 {
        let take = n.min(self.confidences.len());
        if take == 0 {
            return 0.0;
        }
        self.confidences.iter().rev().take(take).sum::<f32>() / take as f32
    }

    /// The two most recent velocities as `(previous, latest)`.
    ///
    /// A missing previous value reads as 0.
    pub fn last_velocities(&self) -> Option<(f32, f32)> {
        let mut recent = self.velocities.iter().rev();
        let latest = *recent.next()?;
        let previous = recent.next().copied().unwrap_or(0.0);
        Some((previous, latest))
    }

    /// Labels currently in the voting window, oldest first.
    pub fn labels(&self) -> impl Iterator<Item = PhaseName> + '_ {
        self.labels.iter().copied()
    }

    /// Effective window size after clamping.
    pub fn window(&self) -> usize {
        self.window
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// True once the voting window has been filled.
    pub fn is_full(&self) -> bool {
        self.labels.len() == self.window
    }

    pub fn clear(&mut self) {
        self.labels.clear();
        self.velocities.clear();
        self.confidences.clear();
    }
}

impl Default for TemporalSmoother {
    fn default() -> Self {
        Self::new(DEFAULT_SMOOTHING_WINDOW)
    }
}

fn push_bounded<T>(buffer: &mut VecDeque<T>, value: T, capacity: usize) {
    if buffer.len() == capacity {
        buffer.pop_front();
    }
    buffer.push_back(value);
}

// ============================================================================
// TESTS
// ============================================================================
