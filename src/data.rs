// src/data.rs
use crate::analysis::JumpMetrics;
use crate::joints::JointId;
use crate::skeleton::SkeletonPosition;
use crate::validity::ValidationResult;
use anyhow::Result;
use chrono::Local;
use csv::Writer;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Boundary representation of one frame in a recorded session file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedFrame {
    pub timestamp_ms: f64,
    pub joints: HashMap<JointId, [f64; 3]>,
}

impl RecordedFrame {
    pub fn from_skeleton(skeleton: &SkeletonPosition) -> Self {
        let joints = skeleton
            .joints()
            .iter()
            .map(|(id, p)| (*id, [p.x, p.y, p.z]))
            .collect();
        Self {
            timestamp_ms: skeleton.timestamp_ms,
            joints,
        }
    }

    pub fn into_skeleton(self) -> SkeletonPosition {
        let joints = self
            .joints
            .into_iter()
            .map(|(id, p)| (id, Vector3::new(p[0], p[1], p[2])))
            .collect();
        SkeletonPosition::new(self.timestamp_ms, joints)
    }
}

/// Reads a recorded session (JSON array of frames) back into pipeline frames.
pub fn read_session(path: impl AsRef<Path>) -> Result<Vec<SkeletonPosition>> {
    let data = std::fs::read_to_string(path)?;
    let recorded: Vec<RecordedFrame> = serde_json::from_str(&data)?;
    Ok(recorded.into_iter().map(RecordedFrame::into_skeleton).collect())
}

#[derive(Debug, Serialize)]
struct JumpTrackingRecord {
    timestamp_ms: f64,
    frame: i32,

    pelvis_x: Option<f64>,
    pelvis_y: Option<f64>,
    pelvis_z: Option<f64>,

    spine_navel_x: Option<f64>,
    spine_navel_y: Option<f64>,
    spine_navel_z: Option<f64>,

    neck_x: Option<f64>,
    neck_y: Option<f64>,
    neck_z: Option<f64>,

    hip_left_x: Option<f64>,
    hip_left_y: Option<f64>,
    hip_left_z: Option<f64>,

    hip_right_x: Option<f64>,
    hip_right_y: Option<f64>,
    hip_right_z: Option<f64>,

    knee_left_x: Option<f64>,
    knee_left_y: Option<f64>,
    knee_left_z: Option<f64>,

    knee_right_x: Option<f64>,
    knee_right_y: Option<f64>,
    knee_right_z: Option<f64>,

    ankle_left_x: Option<f64>,
    ankle_left_y: Option<f64>,
    ankle_left_z: Option<f64>,

    ankle_right_x: Option<f64>,
    ankle_right_y: Option<f64>,
    ankle_right_z: Option<f64>,

    wrist_left_x: Option<f64>,
    wrist_left_y: Option<f64>,
    wrist_left_z: Option<f64>,

    wrist_right_x: Option<f64>,
    wrist_right_y: Option<f64>,
    wrist_right_z: Option<f64>,
}

const EXPORTED_JOINTS: [JointId; 11] = [
    JointId::Pelvis,
    JointId::SpineNavel,
    JointId::Neck,
    JointId::HipLeft,
    JointId::HipRight,
    JointId::KneeLeft,
    JointId::KneeRight,
    JointId::AnkleLeft,
    JointId::AnkleRight,
    JointId::WristLeft,
    JointId::WristRight,
];

/// Collects processed frames and the session verdict, then exports them as
/// a per-frame CSV and a small HTML report.
pub struct SessionRecorder {
    output_dir: PathBuf,
    session_name: String,
    frames: Vec<SkeletonPosition>,
    verdict: Option<ValidationResult>,
    metrics: Option<JumpMetrics>,
}

impl SessionRecorder {
    pub fn new(output_dir: impl AsRef<Path>, session_name: Option<String>) -> Self {
        let session_name = session_name
            .unwrap_or_else(|| format!("session_{}", Local::now().format("%Y%m%d_%H%M%S")));

        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            session_name,
            frames: Vec::new(),
            verdict: None,
            metrics: None,
        }
    }

    pub fn add_frame(&mut self, frame: SkeletonPosition) {
        self.frames.push(frame);
    }

    pub fn set_outcome(&mut self, verdict: ValidationResult, metrics: Option<JumpMetrics>) {
        self.verdict = Some(verdict);
        self.metrics = metrics;
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn export_csv(&self) -> Result<PathBuf> {
        let csv_path = self
            .output_dir
            .join(&self.session_name)
            .join("jump_data.csv");

        if let Some(parent) = csv_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = File::create(&csv_path)?;
        let mut writer = Writer::from_writer(file);

        for (i, frame) in self.frames.iter().enumerate() {
            let record = Self::create_record(i as i32, frame);
            writer.serialize(record)?;
        }

        writer.flush()?;
        Ok(csv_path)
    }

    fn create_record(frame_index: i32, frame: &SkeletonPosition) -> JumpTrackingRecord {
        let mut record = JumpTrackingRecord {
            timestamp_ms: frame.timestamp_ms,
            frame: frame_index,
            pelvis_x: None,
            pelvis_y: None,
            pelvis_z: None,
            spine_navel_x: None,
            spine_navel_y: None,
            spine_navel_z: None,
            neck_x: None,
            neck_y: None,
            neck_z: None,
            hip_left_x: None,
            hip_left_y: None,
            hip_left_z: None,
            hip_right_x: None,
            hip_right_y: None,
            hip_right_z: None,
            knee_left_x: None,
            knee_left_y: None,
            knee_left_z: None,
            knee_right_x: None,
            knee_right_y: None,
            knee_right_z: None,
            ankle_left_x: None,
            ankle_left_y: None,
            ankle_left_z: None,
            ankle_right_x: None,
            ankle_right_y: None,
            ankle_right_z: None,
            wrist_left_x: None,
            wrist_left_y: None,
            wrist_left_z: None,
            wrist_right_x: None,
            wrist_right_y: None,
            wrist_right_z: None,
        };

        for joint in EXPORTED_JOINTS {
            let Some(p) = frame.joint(joint) else { continue };
            let slot: (&mut Option<f64>, &mut Option<f64>, &mut Option<f64>) = match joint {
                JointId::Pelvis => (&mut record.pelvis_x, &mut record.pelvis_y, &mut record.pelvis_z),
                JointId::SpineNavel => (
                    &mut record.spine_navel_x,
                    &mut record.spine_navel_y,
                    &mut record.spine_navel_z,
                ),
                JointId::Neck => (&mut record.neck_x, &mut record.neck_y, &mut record.neck_z),
                JointId::HipLeft => (
                    &mut record.hip_left_x,
                    &mut record.hip_left_y,
                    &mut record.hip_left_z,
                ),
                JointId::HipRight => (
                    &mut record.hip_right_x,
                    &mut record.hip_right_y,
                    &mut record.hip_right_z,
                ),
                JointId::KneeLeft => (
                    &mut record.knee_left_x,
                    &mut record.knee_left_y,
                    &mut record.knee_left_z,
                ),
                JointId::KneeRight => (
                    &mut record.knee_right_x,
                    &mut record.knee_right_y,
                    &mut record.knee_right_z,
                ),
                JointId::AnkleLeft => (
                    &mut record.ankle_left_x,
                    &mut record.ankle_left_y,
                    &mut record.ankle_left_z,
                ),
                JointId::AnkleRight => (
                    &mut record.ankle_right_x,
                    &mut record.ankle_right_y,
                    &mut record.ankle_right_z,
                ),
                JointId::WristLeft => (
                    &mut record.wrist_left_x,
                    &mut record.wrist_left_y,
                    &mut record.wrist_left_z,
                ),
                JointId::WristRight => (
                    &mut record.wrist_right_x,
                    &mut record.wrist_right_y,
                    &mut record.wrist_right_z,
                ),
                _ => continue,
            };
            *slot.0 = Some(p.x);
            *slot.1 = Some(p.y);
            *slot.2 = Some(p.z);
        }

        record
    }

    pub fn generate_report(&self) -> Result<PathBuf> {
        let report_path = self
            .output_dir
            .join(&self.session_name)
            .join("report.html");

        if let Some(parent) = report_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&report_path, self.create_html_report())?;
        Ok(report_path)
    }

    fn create_html_report(&self) -> String {
        let verdict_text = match &self.verdict {
            Some(ValidationResult::Valid) => "Valid jump".to_string(),
            Some(ValidationResult::Invalid { message, .. }) => format!("Invalid: {message}"),
            None => "Not evaluated".to_string(),
        };

        let metrics_rows = match &self.metrics {
            Some(m) => format!(
                r#"        <div class="stat-item">
            <span class="stat-label">Jump Height:</span>
            <span class="stat-value">{:.1} cm</span>
        </div>
        <div class="stat-item">
            <span class="stat-label">Countermovement:</span>
            <span class="stat-value">{:.1} cm</span>
        </div>
        <div class="stat-item">
            <span class="stat-label">Push-off Velocity:</span>
            <span class="stat-value">{:.2} m/s</span>
        </div>"#,
                m.height_m * 100.0,
                -m.preparation_squat_depth_m * 100.0,
                m.push_off_velocity_mps
            ),
            None => String::new(),
        };

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <title>Jump Tracking Report - {}</title>
    <style>
        body {{ font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; margin: 40px; background: #f5f5f5; }}
        h1 {{ color: #333; }}
        .stats {{ background: white; padding: 20px; border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }}
        .stat-item {{ margin: 10px 0; }}
        .stat-label {{ font-weight: bold; color: #666; }}
        .stat-value {{ color: #4682EA; font-size: 1.2em; }}
    </style>
</head>
<body>
    <h1>Jump Tracking Session Report</h1>
    <div class="stats">
        <h2>Session: {}</h2>
        <div class="stat-item">
            <span class="stat-label">Total Frames:</span>
            <span class="stat-value">{}</span>
        </div>
        <div class="stat-item">
            <span class="stat-label">Verdict:</span>
            <span class="stat-value">{}</span>
        </div>
{}
    </div>
</body>
</html>
"#,
            self.session_name,
            self.session_name,
            self.frames.len(),
            verdict_text,
            metrics_rows
        )
    }
}
