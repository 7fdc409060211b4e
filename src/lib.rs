//! Golf Swing Phase Detection Library
//!
//! Converts a stream of per-frame body landmark snapshots (from any 33-point
//! pose estimator) into a stable sequence of golf swing phases:
//! Address, Backswing, Top, Downswing, Impact and Follow-Through.
//!
//! # Design Philosophy
//!
//! - **Rules first**: each frame is classified by an ordered set of geometric
//!   rules on weight shift, estimated club position, body rotation and club
//!   velocity.
//! - **Stability over reactivity**: raw labels pass through majority-vote
//!   smoothing and a hysteresis gate, so the reported phase only changes when
//!   the evidence is sustained and the change follows the swing order.
//! - **Degrade, don't fail**: missing or low-visibility landmarks fall back to
//!   neutral values instead of producing errors.
//!
//! # Example
//!
//! ```ignore
//! use swing_phase::{DetectorConfig, LandmarkSnapshot, SwingPhaseDetector};
//!
//! let mut detector = SwingPhaseDetector::new(DetectorConfig::default());
//! for snapshot in frames {
//!     let result = detector.process_frame(&snapshot);
//!     if let Some(transition) = result.transition {
//!         println!("{} -> {}", transition.from, transition.to);
//!     }
//! }
//! ```

pub mod classifier;
pub mod config;
pub mod detector;
pub mod error;
pub mod export;
pub mod features;
pub mod hysteresis;
pub mod smoothing;
pub mod types;
pub mod validation;


// Re-export commonly used types
pub use classifier::{Classification, PhaseClassifier};
pub use config::DetectorConfig;
pub use detector::{FrameResult, SwingPhaseDetector};
pub use error::{Result, SwingError};
pub use export::{StreamingExporter, SwingSummary, SwingTimeline};
pub use hysteresis::{GateDecision, Rejection};
pub use types::{
    BodyRotation, ClubPosition, FrameFeatures, Landmark, LandmarkSnapshot, PhaseName,
    PhaseTransition, SwingPhase, WeightDistribution,
};
pub use validation::{validate_phase_sequence, SequenceReport};
