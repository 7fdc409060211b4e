/// Basic usage example: feed landmark frames, get swing phases
///
/// Run with `RUST_LOG=swing_phase=debug` to see accepted transitions, or
/// `trace` to see every held frame. An optional argument names a TOML config.
use swing_phase::hysteresis::VelocityGates;
use swing_phase::types::{
    LEFT_ANKLE, LEFT_HIP, LEFT_SHOULDER, LEFT_WRIST, RIGHT_ANKLE, RIGHT_HIP, RIGHT_SHOULDER,
    RIGHT_WRIST,
};
use swing_phase::{
    DetectorConfig, Landmark, LandmarkSnapshot, Result, SwingPhaseDetector, SwingTimeline,
};
use tracing_subscriber::EnvFilter;

/// (left ankle y, right ankle y, shoulders, wrists) for each key pose.
type Pose = (f32, f32, [(f32, f32); 2], [(f32, f32); 2]);

const POSES: [(&str, Pose); 6] = [
    ("address", (0.9, 0.9, [(0.58, 0.3), (0.42, 0.3)], [(0.5, 0.5), (0.5, 0.5)])),
    ("backswing", (0.9, 0.9, [(0.55, 0.25), (0.45, 0.35)], [(0.34, 0.32), (0.36, 0.30)])),
    ("top", (0.9, 0.7, [(0.5, 0.2), (0.51, 0.35)], [(0.5, 0.2), (0.54, 0.2)])),
    ("downswing", (0.9, 0.7, [(0.55, 0.3), (0.45, 0.32)], [(0.53, 0.45), (0.57, 0.45)])),
    ("impact", (0.99, 0.5, [(0.55, 0.3), (0.45, 0.32)], [(0.48, 0.7), (0.52, 0.7)])),
    ("follow-through", (0.99, 0.5, [(0.55, 0.3), (0.45, 0.32)], [(0.68, 0.4), (0.72, 0.4)])),
];

fn snapshot(pose: &Pose) -> LandmarkSnapshot {
    let (left_ankle, right_ankle, shoulders, wrists) = pose;
    LandmarkSnapshot::empty()
        .with(LEFT_HIP, Landmark::new(0.55, 0.55))
        .with(RIGHT_HIP, Landmark::new(0.45, 0.55))
        .with(LEFT_ANKLE, Landmark::new(0.56, *left_ankle))
        .with(RIGHT_ANKLE, Landmark::new(0.44, *right_ankle))
        .with(LEFT_SHOULDER, Landmark::new(shoulders[0].0, shoulders[0].1))
        .with(RIGHT_SHOULDER, Landmark::new(shoulders[1].0, shoulders[1].1))
        .with(LEFT_WRIST, Landmark::new(wrists[0].0, wrists[0].1))
        .with(RIGHT_WRIST, Landmark::new(wrists[1].0, wrists[1].1))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Swing Phase Detection: Basic Example ===\n");

    let config = match std::env::args().nth(1) {
        Some(path) => DetectorConfig::load(path)?,
        // The synthetic poses are a few frames apart, so run without smoothing
        // and with velocity gates sized to their motion.
        None => DetectorConfig {
            velocity_gates: VelocityGates {
                downswing_min_velocity: 0.2,
                impact_min_velocity: 0.2,
                ..VelocityGates::default()
            },
            ..DetectorConfig::unsmoothed()
        },
    };
    let mut detector = SwingPhaseDetector::new(config);

    let frames: Vec<LandmarkSnapshot> = POSES
        .iter()
        .enumerate()
        .flat_map(|(i, (_, pose))| {
            let repeats = if i == 0 { 3 } else { 1 };
            std::iter::repeat(snapshot(pose)).take(repeats)
        })
        .collect();

    let names: Vec<&str> = POSES.iter().map(|(name, _)| *name).collect();
    println!("Poses: {}", names.join(" -> "));
    println!("Processing {} frames...\n", frames.len());

    for (frame, landmarks) in frames.iter().enumerate() {
        let result = detector.process_frame(landmarks);
        println!(
            "frame {:>2}: raw={:<15} held={:<15} conf={:.2} weight={}/{}",
            frame,
            result.raw.phase,
            result.phase.name,
            result.phase.confidence,
            result.phase.weight_distribution.left,
            result.phase.weight_distribution.right,
        );
        if let Some(t) = result.transition {
            println!("          transition {} -> {} at {:.0} ms", t.from, t.to, t.time_ms);
        }
    }

    let timeline = SwingTimeline::from_detector(&detector);
    println!("\n=== Timeline ===");
    println!("{}", timeline.to_json_pretty()?);

    Ok(())
}
