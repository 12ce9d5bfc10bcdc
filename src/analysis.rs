// src/analysis.rs
use crate::config::Configs;
use crate::dsp;
use crate::joints::JointId;
use crate::validity::JumpSegment;
use thiserror::Error;

// Frames below this count cannot produce meaningful phase estimates.
const MINIMUM_FRAME_COUNT: usize = 10;

// Window for the height-signal moving average, in frames.
const AVERAGE_FILTER_WINDOW: usize = 5;

// The jump start is the last sample before push-off where vertical
// velocity is still under this fraction of the peak velocity.
const JUMP_START_VELOCITY_FRACTION: f64 = 0.03;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("jump segment does not contain enough frames to analyze")]
    NotEnoughFrames,
    #[error("center-of-mass joint missing from a segment frame")]
    MissingCenterOfMass,
    #[error("jump segment data is degenerate")]
    DegenerateData,
}

/// Descriptive results for a jump that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct JumpMetrics {
    /// Peak center-of-mass rise above the pre-jump rest height, meters.
    pub height_m: f64,
    /// Lowest squat depth before push-off, relative to rest height, meters
    /// (negative when the squat dips below rest).
    pub preparation_squat_depth_m: f64,
    /// Lowest point of the landing recovery, relative to rest height, meters.
    pub landing_squat_depth_m: f64,
    /// Peak upward center-of-mass velocity during push-off, m/s.
    pub push_off_velocity_mps: f64,
    /// Worst-leg interior knee angle at the preparation squat, degrees.
    /// Absent when leg joints are not tracked.
    pub knee_angle_deg: Option<f64>,
    /// Frame index of the peak height within the segment.
    pub peak_index: usize,
    /// Frame index of the preparation squat within the segment.
    pub squat_index: usize,
}

/// Computes jump phase metrics from a validated segment.
pub struct JumpAnalyzer {
    center_of_mass: JointId,
    stable_time_in_ms: f64,
}

impl JumpAnalyzer {
    pub fn new(configs: &Configs) -> Self {
        Self {
            center_of_mass: configs.center_of_mass_joint,
            stable_time_in_ms: configs
                .jump_validity
                .initial_and_end_stability
                .stable_time_in_ms,
        }
    }

    pub fn analyze(&self, segment: &JumpSegment) -> Result<JumpMetrics, AnalysisError> {
        let frames = segment.frames();
        if frames.len() <= MINIMUM_FRAME_COUNT {
            return Err(AnalysisError::NotEnoughFrames);
        }

        let height: Vec<f64> = frames
            .iter()
            .map(|f| f.joint(self.center_of_mass).map(|p| p.y))
            .collect::<Option<_>>()
            .ok_or(AnalysisError::MissingCenterOfMass)?;
        let timestamps: Vec<f64> = frames.iter().map(|f| f.timestamp_ms).collect();

        let filtered = dsp::moving_average(&height, AVERAGE_FILTER_WINDOW);

        // Key phases from the height profile.
        let peak = dsp::find_maximum(&filtered, 0, filtered.len())
            .ok_or(AnalysisError::DegenerateData)?;
        let preparation_squat =
            dsp::find_minimum(&filtered, 0, peak.index).ok_or(AnalysisError::DegenerateData)?;
        let landing_squat = dsp::find_minimum(&filtered, peak.index, filtered.len())
            .ok_or(AnalysisError::DegenerateData)?;

        // Vertical velocity as dH/dt, in meters per millisecond.
        let height_derivative = dsp::first_derivative(&filtered);
        let time_derivative = dsp::first_derivative(&timestamps);
        let velocity = dsp::divide_arrays(&height_derivative, &time_derivative);
        let max_velocity = dsp::find_maximum(&velocity, 0, velocity.len())
            .ok_or(AnalysisError::DegenerateData)?;

        let start_index = self.jump_starting_point(&velocity, max_velocity)?;
        let window = self.calculation_window_width(start_index, &timestamps)?;
        let start_height = mean(&height[start_index - window..start_index]);

        let knee_angle_deg = min_knee_angle(&frames[preparation_squat.index]);

        Ok(JumpMetrics {
            height_m: peak.value - start_height,
            preparation_squat_depth_m: preparation_squat.value - start_height,
            landing_squat_depth_m: landing_squat.value - start_height,
            push_off_velocity_mps: max_velocity.value * 1000.0,
            knee_angle_deg,
            peak_index: peak.index,
            squat_index: preparation_squat.index,
        })
    }

    // Walks back from the peak-velocity sample to the last quiet sample
    // before push-off.
    fn jump_starting_point(
        &self,
        velocity: &[f64],
        max_velocity: dsp::IndexValue,
    ) -> Result<usize, AnalysisError> {
        let mut index = max_velocity.index;
        while velocity[index] > JUMP_START_VELOCITY_FRACTION * max_velocity.value {
            if index == 0 {
                return Err(AnalysisError::DegenerateData);
            }
            index -= 1;
        }
        Ok(index)
    }

    // Number of frames covering one stable-time span before the jump start.
    fn calculation_window_width(
        &self,
        start_index: usize,
        timestamps: &[f64],
    ) -> Result<usize, AnalysisError> {
        let mut index = start_index;
        while timestamps[start_index] - timestamps[index] < self.stable_time_in_ms {
            if index == 0 {
                return Err(AnalysisError::DegenerateData);
            }
            index -= 1;
        }
        Ok(start_index - index)
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn min_knee_angle(frame: &crate::skeleton::SkeletonPosition) -> Option<f64> {
    let legs = [
        (JointId::HipLeft, JointId::KneeLeft, JointId::AnkleLeft),
        (JointId::HipRight, JointId::KneeRight, JointId::AnkleRight),
    ];
    let mut min_angle: Option<f64> = None;
    for (hip, knee, ankle) in legs {
        if let (Some(h), Some(k), Some(a)) =
            (frame.joint(hip), frame.joint(knee), frame.joint(ankle))
        {
            let angle = dsp::angle_deg(h, k, a);
            min_angle = Some(min_angle.map_or(angle, |m: f64| m.min(angle)));
        }
    }
    min_angle
}
