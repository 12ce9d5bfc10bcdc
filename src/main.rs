// src/main.rs
use anyhow::{Context, Result};
use jump_tracker::analysis::JumpAnalyzer;
use jump_tracker::config::Configs;
use jump_tracker::data::{read_session, SessionRecorder};
use jump_tracker::joints::JointId;
use jump_tracker::skeleton::SkeletonPosition;
use jump_tracker::smoother::Smoother;
use jump_tracker::validity::{JumpSegment, JumpValidator, ValidationResult};
use nalgebra::Vector3;
use std::collections::HashMap;

fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let config_path = args.next();
    let session_path = args.next();

    let configs = match &config_path {
        Some(path) => Configs::load_or_default(path),
        None => Configs::default(),
    };

    if let Err(e) = run(&configs, session_path.as_deref()) {
        eprintln!("Error running jump analysis: {e:?}");
        std::process::exit(1);
    }
}

fn run(configs: &Configs, session_path: Option<&str>) -> Result<()> {
    let frames = match session_path {
        Some(path) => {
            println!("Replaying recorded session: {path}");
            read_session(path).with_context(|| format!("cannot read session file {path}"))?
        }
        None => {
            println!("No session file given, using a simulated jump");
            simulate_jump_session()
        }
    };
    println!("Loaded {} frames", frames.len());

    let mut smoother = Smoother::new(configs.number_smoothing_frames);
    let mut recorder = SessionRecorder::new("output", None);

    let smoothed: Vec<SkeletonPosition> = frames
        .into_iter()
        .map(|frame| {
            let out = smoother.process(frame, true);
            recorder.add_frame(out.clone());
            out
        })
        .collect();

    let segment = JumpSegment::new(smoothed);
    let validator = JumpValidator::new(configs);
    let verdict = validator.classify(&segment);

    println!("-----------------------------------------");
    let metrics = match &verdict {
        ValidationResult::Valid => {
            let analyzer = JumpAnalyzer::new(configs);
            match analyzer.analyze(&segment) {
                Ok(metrics) => {
                    println!("Jump Analysis:");
                    println!("   Height (cm): {:.1}", metrics.height_m * 100.0);
                    println!(
                        "   Countermovement (cm): {:.1}",
                        -metrics.preparation_squat_depth_m * 100.0
                    );
                    println!(
                        "   Push-off Velocity (m/second): {:.2}",
                        metrics.push_off_velocity_mps
                    );
                    if let Some(knee) = metrics.knee_angle_deg {
                        println!("   Knee Angle (degree): {knee:.1}");
                    }
                    Some(metrics)
                }
                Err(e) => {
                    println!("Jump was valid but analysis failed: {e}");
                    None
                }
            }
        }
        ValidationResult::Invalid { message, .. } => {
            println!("Jump Analysis Failed! {message}");
            None
        }
    };
    println!("-----------------------------------------");

    if configs.raw_data_collection.logging {
        recorder.set_outcome(verdict, metrics);
        let csv_path = recorder.export_csv()?;
        let report_path = recorder.generate_report()?;
        println!("Exported session data to {}", csv_path.display());
        println!("Exported session report to {}", report_path.display());
    }

    Ok(())
}

// Synthesizes three seconds of a clean counter-movement jump at 30 fps:
// stand, squat, push off, land, settle. Used when no recorded session is
// available.
fn simulate_jump_session() -> Vec<SkeletonPosition> {
    const FPS: f64 = 30.0;
    let frame_interval_ms = 1000.0 / FPS;

    (0..=90)
        .map(|i| {
            let rise = match i {
                0..=29 => 0.0,
                30..=35 => -0.1 * (i - 30) as f64 / 6.0,
                36..=41 => -0.1 + 0.5 * (i - 36) as f64 / 6.0,
                42..=47 => 0.4 - 0.45 * (i - 42) as f64 / 6.0,
                48..=53 => -0.05 + 0.05 * (i - 48) as f64 / 6.0,
                _ => 0.0,
            };

            let mut joints: HashMap<JointId, Vector3<f64>> = HashMap::new();
            joints.insert(JointId::Pelvis, Vector3::new(0.0, 0.9 + rise, 2.5));
            joints.insert(JointId::SpineNavel, Vector3::new(0.0, 1.1 + rise, 2.5));
            joints.insert(JointId::Neck, Vector3::new(0.0, 1.4 + rise, 2.5));
            for (hip, knee, ankle, wrist, side) in [
                (
                    JointId::HipLeft,
                    JointId::KneeLeft,
                    JointId::AnkleLeft,
                    JointId::WristLeft,
                    -1.0,
                ),
                (
                    JointId::HipRight,
                    JointId::KneeRight,
                    JointId::AnkleRight,
                    JointId::WristRight,
                    1.0,
                ),
            ] {
                let x = side * 0.1;
                joints.insert(hip, Vector3::new(x, 0.85 + rise, 2.5));
                joints.insert(knee, Vector3::new(x, 0.45 + rise, 2.5));
                joints.insert(ankle, Vector3::new(x, 0.08 + rise, 2.5));
                // Hands resting on the hips.
                joints.insert(wrist, Vector3::new(x + side * 0.04, 0.88 + rise, 2.5));
            }

            SkeletonPosition::new(i as f64 * frame_interval_ms, joints)
        })
        .collect()
}
