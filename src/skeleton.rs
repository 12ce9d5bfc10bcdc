// src/skeleton.rs
use crate::joints::{ConfidenceLevel, JointId};
use nalgebra::Vector3;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SkeletonError {
    /// Pointwise arithmetic requires both frames to carry the same joints.
    #[error("mismatched joint sets between skeleton frames")]
    MismatchedJointSet,
}

/// Joint positions of one tracked body in one frame.
///
/// Positions are in meters in a stable reference frame. Frames are created
/// by the sample source, consumed by the smoother and never retained beyond
/// the smoothing window.
#[derive(Debug, Clone, PartialEq)]
pub struct SkeletonPosition {
    pub timestamp_ms: f64,
    joints: HashMap<JointId, Vector3<f64>>,
}

impl SkeletonPosition {
    pub fn new(timestamp_ms: f64, joints: HashMap<JointId, Vector3<f64>>) -> Self {
        Self {
            timestamp_ms,
            joints,
        }
    }

    /// Builds a frame from raw sensor joint positions.
    ///
    /// Only joints named by `mapper` are populated. The sensor Y axis points
    /// down, so Y is inverted before the referent camera position is added.
    pub fn from_sensor_frame(
        timestamp_ms: f64,
        sensor_positions: &HashMap<JointId, Vector3<f64>>,
        mapper: &[JointId],
        referent_camera_position: Vector3<f64>,
    ) -> Self {
        let mut joints = HashMap::with_capacity(mapper.len());
        for joint in mapper {
            if let Some(point) = sensor_positions.get(joint) {
                let delta = Vector3::new(point.x, -point.y, point.z);
                joints.insert(*joint, referent_camera_position + delta);
            }
        }
        Self {
            timestamp_ms,
            joints,
        }
    }

    /// Same as [`from_sensor_frame`](Self::from_sensor_frame) but drops
    /// joints tracked below `min_confidence`.
    pub fn from_sensor_frame_filtered(
        timestamp_ms: f64,
        sensor_positions: &HashMap<JointId, Vector3<f64>>,
        confidences: &HashMap<JointId, ConfidenceLevel>,
        min_confidence: ConfidenceLevel,
        mapper: &[JointId],
        referent_camera_position: Vector3<f64>,
    ) -> Self {
        let usable: Vec<JointId> = mapper
            .iter()
            .copied()
            .filter(|j| {
                confidences
                    .get(j)
                    .map(|c| *c >= min_confidence)
                    .unwrap_or(false)
            })
            .collect();
        Self::from_sensor_frame(
            timestamp_ms,
            sensor_positions,
            &usable,
            referent_camera_position,
        )
    }

    pub fn joint(&self, id: JointId) -> Option<&Vector3<f64>> {
        self.joints.get(&id)
    }

    pub fn joints(&self) -> &HashMap<JointId, Vector3<f64>> {
        &self.joints
    }

    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// True when both frames carry exactly the same joint keys.
    pub fn same_joint_set(&self, other: &Self) -> bool {
        self.joints.len() == other.joints.len()
            && self.joints.keys().all(|k| other.joints.contains_key(k))
    }

    /// Per-joint sum of two frames. The result keeps `self`'s timestamp.
    pub fn add_pointwise(&self, other: &Self) -> Result<Self, SkeletonError> {
        if !self.same_joint_set(other) {
            return Err(SkeletonError::MismatchedJointSet);
        }
        let joints = self
            .joints
            .iter()
            .map(|(k, v)| (*k, v + other.joints[k]))
            .collect();
        Ok(Self {
            timestamp_ms: self.timestamp_ms,
            joints,
        })
    }

    /// Per-joint difference of two frames. The result keeps `self`'s timestamp.
    pub fn sub_pointwise(&self, other: &Self) -> Result<Self, SkeletonError> {
        if !self.same_joint_set(other) {
            return Err(SkeletonError::MismatchedJointSet);
        }
        let joints = self
            .joints
            .iter()
            .map(|(k, v)| (*k, v - other.joints[k]))
            .collect();
        Ok(Self {
            timestamp_ms: self.timestamp_ms,
            joints,
        })
    }

    /// Per-joint scalar division, used to turn a running sum into an average.
    pub fn scale_divide(&self, divisor: f64) -> Self {
        let joints = self.joints.iter().map(|(k, v)| (*k, v / divisor)).collect();
        Self {
            timestamp_ms: self.timestamp_ms,
            joints,
        }
    }
}
