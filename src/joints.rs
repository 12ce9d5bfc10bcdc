// src/joints.rs
use serde::{Deserialize, Serialize};

/// Skeletal landmarks reported by the body tracking sensor.
///
/// This set is defined by the sensor SDK and is closed: the pipeline never
/// invents members, it only decides which of them it follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JointId {
    Pelvis,
    SpineNavel,
    SpineChest,
    Neck,
    ClavicleLeft,
    ShoulderLeft,
    ElbowLeft,
    WristLeft,
    HandLeft,
    HandTipLeft,
    ThumbLeft,
    ClavicleRight,
    ShoulderRight,
    ElbowRight,
    WristRight,
    HandRight,
    HandTipRight,
    ThumbRight,
    HipLeft,
    KneeLeft,
    AnkleLeft,
    FootLeft,
    HipRight,
    KneeRight,
    AnkleRight,
    FootRight,
    Head,
    Nose,
    EyeLeft,
    EarLeft,
    EyeRight,
    EarRight,
}

/// Tracking confidence the sensor attaches to each joint estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    None,
    Low,
    Medium,
    High,
}

// Joints represented in the tracked model. Not all sensor joints are
// followed by this pipeline; fingers and face detail are left out.
const MAPPED_JOINTS: [JointId; 18] = [
    JointId::Pelvis,
    JointId::EarRight,
    JointId::EarLeft,
    JointId::Head,
    JointId::Neck,
    JointId::ShoulderRight,
    JointId::ShoulderLeft,
    JointId::ElbowRight,
    JointId::ElbowLeft,
    JointId::WristRight,
    JointId::WristLeft,
    JointId::SpineNavel,
    JointId::HipRight,
    JointId::HipLeft,
    JointId::KneeRight,
    JointId::KneeLeft,
    JointId::AnkleRight,
    JointId::AnkleLeft,
];

/// Default subset of sensor joints populated in pipeline frames.
pub fn mapped_joints() -> &'static [JointId] {
    &MAPPED_JOINTS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapped_subset_has_no_duplicates() {
        let mut seen = std::collections::HashSet::new();
        for joint in mapped_joints() {
            assert!(seen.insert(*joint), "{joint:?} listed twice");
        }
        assert_eq!(mapped_joints().len(), 18);
    }

    #[test]
    fn confidence_levels_are_ordered() {
        assert!(ConfidenceLevel::Low < ConfidenceLevel::Medium);
        assert!(ConfidenceLevel::Medium < ConfidenceLevel::High);
        assert!(ConfidenceLevel::None < ConfidenceLevel::Low);
    }

    #[test]
    fn joint_id_serializes_by_name() {
        let json = serde_json::to_string(&JointId::SpineNavel).unwrap();
        assert_eq!(json, "\"SpineNavel\"");
        let back: JointId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, JointId::SpineNavel);
    }
}
