// src/validity.rs
use crate::config::{Configs, JumpValidity};
use crate::dsp;
use crate::joints::JointId;
use crate::skeleton::SkeletonPosition;
use nalgebra::Vector3;
use tracing::debug;

/// Why a jump segment was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    NotEnoughPoints,
    InitialStateStability,
    EndingStateStability,
    MovementDisplacementHorizontal,
    MovementDisplacementVertical,
    HandsDisplacement,
    AngleDisplacement,
    MaximalHeight,
}

impl FailureReason {
    /// Fixed user-facing feedback string for this rejection.
    pub fn message(&self) -> &'static str {
        match self {
            FailureReason::NotEnoughPoints => "Jump does not have sufficient number of points",
            FailureReason::InitialStateStability => {
                "Please stand upright in the beginning of the jump"
            }
            FailureReason::EndingStateStability => "Please stand upright in the end of the jump",
            FailureReason::MovementDisplacementHorizontal => {
                "Oops, you need to land where you started"
            }
            FailureReason::MovementDisplacementVertical => "Please stand upright during the jump",
            FailureReason::HandsDisplacement => "Please keep hands on hips while you jump",
            FailureReason::AngleDisplacement => {
                "Please stand upright in the beginning of the jump"
            }
            FailureReason::MaximalHeight => "Please jump again",
        }
    }
}

/// Outcome of classifying one jump segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    Invalid {
        reason: FailureReason,
        message: &'static str,
    },
}

impl ValidationResult {
    fn fail(reason: FailureReason) -> Self {
        ValidationResult::Invalid {
            reason,
            message: reason.message(),
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }
}

/// Ordered, time-bounded sequence of smoothed frames believed to span one
/// jump attempt. Segmentation happens upstream; this type only carries the
/// already delimited data.
#[derive(Debug, Clone)]
pub struct JumpSegment {
    frames: Vec<SkeletonPosition>,
}

impl JumpSegment {
    pub fn new(frames: Vec<SkeletonPosition>) -> Self {
        Self { frames }
    }

    pub fn frames(&self) -> &[SkeletonPosition] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Rule-based jump validity classifier.
///
/// Stateless and pure given a segment: the same segment and config always
/// produce the same verdict, so one validator can serve concurrent bodies.
pub struct JumpValidator {
    center_of_mass: JointId,
    config: JumpValidity,
}

impl JumpValidator {
    pub fn new(configs: &Configs) -> Self {
        Self {
            center_of_mass: configs.center_of_mass_joint,
            config: configs.jump_validity.clone(),
        }
    }

    /// Evaluates the rules in fixed order; the first failed rule wins.
    pub fn classify(&self, segment: &JumpSegment) -> ValidationResult {
        let frames = segment.frames();
        let stability = &self.config.initial_and_end_stability;

        // Rule 1: enough frames to evaluate a stability window at the
        // segment's observed frame interval.
        if frames.len() < 2 {
            return ValidationResult::fail(FailureReason::NotEnoughPoints);
        }
        let first_ts = frames[0].timestamp_ms;
        let last_ts = frames[frames.len() - 1].timestamp_ms;
        let interval = (last_ts - first_ts) / (frames.len() - 1) as f64;
        if interval <= 0.0 {
            return ValidationResult::fail(FailureReason::NotEnoughPoints);
        }
        let required = (stability.stable_time_in_ms / interval).ceil() as usize;
        if frames.len() < required.max(2) {
            return ValidationResult::fail(FailureReason::NotEnoughPoints);
        }

        // The rules below track the body through its center-of-mass joint.
        let Some(com) = self.com_positions(frames) else {
            return ValidationResult::fail(FailureReason::NotEnoughPoints);
        };

        let initial_end = first_ts + stability.stable_time_in_ms;
        let ending_start = last_ts - stability.stable_time_in_ms;
        let initial: Vec<usize> = (0..frames.len())
            .filter(|&i| frames[i].timestamp_ms <= initial_end)
            .collect();
        let ending: Vec<usize> = (0..frames.len())
            .filter(|&i| frames[i].timestamp_ms >= ending_start)
            .collect();
        if initial.is_empty() || ending.is_empty() {
            return ValidationResult::fail(FailureReason::NotEnoughPoints);
        }

        // Rule 2: rest before and after the jump.
        let allowed = stability.initial_allowed_movement_deviation_in_meters;
        let start_rest = window_mean(&com, &initial);
        if max_deviation(&com, &initial, &start_rest) > allowed {
            return ValidationResult::fail(FailureReason::InitialStateStability);
        }
        let end_rest = window_mean(&com, &ending);
        if max_deviation(&com, &ending, &end_rest) > allowed {
            return ValidationResult::fail(FailureReason::EndingStateStability);
        }

        // Rule 3: land where you started, stand upright while settling.
        let displacement = &self.config.movement_displacement;
        let dx = end_rest.x - start_rest.x;
        let dz = end_rest.z - start_rest.z;
        if (dx * dx + dz * dz).sqrt() > displacement.horizontal_threshold_in_meters {
            return ValidationResult::fail(FailureReason::MovementDisplacementHorizontal);
        }
        for &i in &ending {
            if (com[i].y - start_rest.y).abs() > displacement.vertical_threshold_in_meters {
                return ValidationResult::fail(FailureReason::MovementDisplacementVertical);
            }
        }

        // Rule 4: hands kept on hips through the landing.
        if !self.hands_on_hips(frames) {
            return ValidationResult::fail(FailureReason::HandsDisplacement);
        }

        // Rule 5: knees and torso straight at rest.
        if !self.angles_upright(frames, &initial) {
            return ValidationResult::fail(FailureReason::AngleDisplacement);
        }

        // Rule 6: plausibility ceiling on the measured height. A peak above
        // it signals a tracking glitch, not a record jump.
        let peak = com.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
        if peak - start_rest.y > self.config.height.maximal_possible_value_in_meters {
            return ValidationResult::fail(FailureReason::MaximalHeight);
        }

        ValidationResult::Valid
    }

    fn com_positions(&self, frames: &[SkeletonPosition]) -> Option<Vec<Vector3<f64>>> {
        frames
            .iter()
            .map(|f| f.joint(self.center_of_mass).copied())
            .collect()
    }

    // Mean hand-to-hip distance over the trailing window must stay under the
    // configured threshold and may not wobble beyond the allowed deviation.
    // Sides whose joints the frames do not carry are skipped.
    fn hands_on_hips(&self, frames: &[SkeletonPosition]) -> bool {
        let hands = &self.config.hands_displacement;
        let window = hands.frame_count_threshold.min(frames.len());
        let trailing = &frames[frames.len() - window..];

        let sides = [
            (JointId::HandLeft, JointId::WristLeft, JointId::HipLeft),
            (JointId::HandRight, JointId::WristRight, JointId::HipRight),
        ];
        for (hand, wrist, hip) in sides {
            let distances: Vec<f64> = trailing
                .iter()
                .filter_map(|frame| {
                    let hand_pos = frame.joint(hand).or_else(|| frame.joint(wrist))?;
                    let hip_pos = frame.joint(hip)?;
                    Some((hand_pos - hip_pos).norm())
                })
                .collect();
            if distances.len() < 2 {
                debug!(?hand, ?hip, "hand joints not tracked, skipping hands rule");
                continue;
            }

            let mean = distances.iter().sum::<f64>() / distances.len() as f64;
            if mean > hands.distance_threshold_in_meters {
                return false;
            }
            let variance = distances
                .iter()
                .map(|d| (d - mean) * (d - mean))
                .sum::<f64>()
                / distances.len() as f64;
            if variance.sqrt() > hands.allowed_standard_deviation_in_meters {
                return false;
            }
        }
        true
    }

    // Interior knee angle (hip-knee-ankle, worst leg) and torso angle
    // (pelvis-spine navel-neck) over the rest window must stay above their
    // thresholds minus the allowed deviation.
    fn angles_upright(&self, frames: &[SkeletonPosition], rest: &[usize]) -> bool {
        let angles = &self.config.angle_displacement;

        let legs = [
            (JointId::HipLeft, JointId::KneeLeft, JointId::AnkleLeft),
            (JointId::HipRight, JointId::KneeRight, JointId::AnkleRight),
        ];
        let mut min_knee: Option<f64> = None;
        for &i in rest {
            for (hip, knee, ankle) in legs {
                if let (Some(h), Some(k), Some(a)) = (
                    frames[i].joint(hip),
                    frames[i].joint(knee),
                    frames[i].joint(ankle),
                ) {
                    let angle = dsp::angle_deg(h, k, a);
                    min_knee = Some(min_knee.map_or(angle, |m: f64| m.min(angle)));
                }
            }
        }
        match min_knee {
            Some(angle) => {
                let bound =
                    angles.knee_angle_threshold_in_deg - angles.knee_angle_allowed_deviation;
                if angle < bound {
                    return false;
                }
            }
            None => debug!("knee joints not tracked, skipping knee angle rule"),
        }

        let mut min_torso: Option<f64> = None;
        for &i in rest {
            if let (Some(pelvis), Some(navel), Some(neck)) = (
                frames[i].joint(JointId::Pelvis),
                frames[i].joint(JointId::SpineNavel),
                frames[i].joint(JointId::Neck),
            ) {
                let angle = dsp::angle_deg(pelvis, navel, neck);
                min_torso = Some(min_torso.map_or(angle, |m: f64| m.min(angle)));
            }
        }
        match min_torso {
            Some(angle) => {
                let bound =
                    angles.torso_angle_threshold_in_deg - angles.torso_angle_allowed_deviation;
                if angle < bound {
                    return false;
                }
            }
            None => debug!("torso joints not tracked, skipping torso angle rule"),
        }

        true
    }
}

fn window_mean(positions: &[Vector3<f64>], window: &[usize]) -> Vector3<f64> {
    let sum = window
        .iter()
        .fold(Vector3::zeros(), |acc, &i| acc + positions[i]);
    sum / window.len() as f64
}

fn max_deviation(positions: &[Vector3<f64>], window: &[usize], mean: &Vector3<f64>) -> f64 {
    window
        .iter()
        .map(|&i| (positions[i] - mean).norm())
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::f64::consts::PI;

    const FRAME_INTERVAL_MS: f64 = 2000.0 / 60.0;

    fn frame(timestamp_ms: f64, entries: &[(JointId, [f64; 3])]) -> SkeletonPosition {
        let joints: HashMap<_, _> = entries
            .iter()
            .map(|(id, p)| (*id, Vector3::new(p[0], p[1], p[2])))
            .collect();
        SkeletonPosition::new(timestamp_ms, joints)
    }

    // Two seconds of pelvis motion at 30 fps: rest, an arc up to `peak_y`,
    // then rest again at `end_x`.
    fn jump_segment(peak_y: f64, end_x: f64) -> JumpSegment {
        let frames = (0..=60)
            .map(|i| {
                let t = i as f64 * FRAME_INTERVAL_MS;
                let y = if (16..=44).contains(&i) {
                    peak_y * (PI * (i - 16) as f64 / 28.0).sin()
                } else {
                    0.0
                };
                let x = if i >= 49 { end_x } else { 0.0 };
                frame(t, &[(JointId::Pelvis, [x, y, 0.0])])
            })
            .collect();
        JumpSegment::new(frames)
    }

    fn validator() -> JumpValidator {
        JumpValidator::new(&Configs::default())
    }

    fn reason(result: ValidationResult) -> FailureReason {
        match result {
            ValidationResult::Invalid { reason, .. } => reason,
            ValidationResult::Valid => panic!("expected an invalid verdict"),
        }
    }

    #[test]
    fn small_jump_returning_near_start_is_valid() {
        let segment = jump_segment(0.5, 0.02);
        assert_eq!(validator().classify(&segment), ValidationResult::Valid);
    }

    #[test]
    fn landing_away_from_start_fails_horizontal_rule() {
        let segment = jump_segment(0.5, 0.3);
        assert_eq!(
            reason(validator().classify(&segment)),
            FailureReason::MovementDisplacementHorizontal
        );
    }

    #[test]
    fn two_frames_are_not_enough_points() {
        let frames = vec![
            frame(0.0, &[(JointId::Pelvis, [0.0; 3])]),
            frame(1000.0 / 30.0, &[(JointId::Pelvis, [0.0; 3])]),
        ];
        let result = validator().classify(&JumpSegment::new(frames));
        assert_eq!(reason(result), FailureReason::NotEnoughPoints);
    }

    #[test]
    fn horizontal_boundary_is_inclusive() {
        // 0.125 is exactly representable, so the window means are exact and
        // the comparison lands exactly on the threshold.
        let mut configs = Configs::default();
        configs
            .jump_validity
            .movement_displacement
            .horizontal_threshold_in_meters = 0.125;
        let validator = JumpValidator::new(&configs);

        let at_boundary = jump_segment(0.5, 0.125);
        assert_eq!(validator.classify(&at_boundary), ValidationResult::Valid);

        let past_boundary = jump_segment(0.5, 0.125 + 1e-6);
        assert_eq!(
            reason(validator.classify(&past_boundary)),
            FailureReason::MovementDisplacementHorizontal
        );
    }

    #[test]
    fn settling_above_start_height_fails_vertical_rule() {
        let frames = (0..=60)
            .map(|i| {
                let t = i as f64 * FRAME_INTERVAL_MS;
                let y = if (16..=44).contains(&i) {
                    0.5 * (PI * (i - 16) as f64 / 28.0).sin()
                } else if i >= 49 {
                    0.2
                } else {
                    0.0
                };
                frame(t, &[(JointId::Pelvis, [0.0, y, 0.0])])
            })
            .collect();
        let result = validator().classify(&JumpSegment::new(frames));
        assert_eq!(reason(result), FailureReason::MovementDisplacementVertical);
    }

    #[test]
    fn wobbly_start_fails_initial_stability() {
        let frames = (0..=60)
            .map(|i| {
                let t = i as f64 * FRAME_INTERVAL_MS;
                let y = if i <= 6 && i % 2 == 1 { 0.15 } else { 0.0 };
                frame(t, &[(JointId::Pelvis, [0.0, y, 0.0])])
            })
            .collect();
        let result = validator().classify(&JumpSegment::new(frames));
        assert_eq!(reason(result), FailureReason::InitialStateStability);
    }

    #[test]
    fn wobbly_landing_fails_ending_stability() {
        let frames = (0..=60)
            .map(|i| {
                let t = i as f64 * FRAME_INTERVAL_MS;
                let y = if i >= 54 && i % 2 == 1 { 0.15 } else { 0.0 };
                frame(t, &[(JointId::Pelvis, [0.0, y, 0.0])])
            })
            .collect();
        let result = validator().classify(&JumpSegment::new(frames));
        assert_eq!(reason(result), FailureReason::EndingStateStability);
    }

    #[test]
    fn implausible_peak_fails_height_ceiling() {
        let segment = jump_segment(1.2, 0.0);
        assert_eq!(
            reason(validator().classify(&segment)),
            FailureReason::MaximalHeight
        );
    }

    #[test]
    fn hands_off_hips_fail_hands_rule() {
        let frames = (0..=60)
            .map(|i| {
                let t = i as f64 * FRAME_INTERVAL_MS;
                frame(
                    t,
                    &[
                        (JointId::Pelvis, [0.0, 0.0, 0.0]),
                        (JointId::HipLeft, [-0.1, 0.0, 0.0]),
                        // Arm held out to the side, half a meter from the hip.
                        (JointId::WristLeft, [-0.6, 0.0, 0.0]),
                    ],
                )
            })
            .collect();
        let result = validator().classify(&JumpSegment::new(frames));
        assert_eq!(reason(result), FailureReason::HandsDisplacement);
    }

    #[test]
    fn hand_joint_is_preferred_over_wrist() {
        let frames = (0..=60)
            .map(|i| {
                let t = i as f64 * FRAME_INTERVAL_MS;
                frame(
                    t,
                    &[
                        (JointId::Pelvis, [0.0, 0.0, 0.0]),
                        (JointId::HipLeft, [-0.1, 0.0, 0.0]),
                        // Hand rests on the hip even though the wrist tracker
                        // has drifted far away.
                        (JointId::HandLeft, [-0.15, 0.0, 0.0]),
                        (JointId::WristLeft, [-0.9, 0.0, 0.0]),
                    ],
                )
            })
            .collect();
        let result = validator().classify(&JumpSegment::new(frames));
        assert_eq!(result, ValidationResult::Valid);
    }

    #[test]
    fn bent_knees_at_rest_fail_angle_rule() {
        let frames = (0..=60)
            .map(|i| {
                let t = i as f64 * FRAME_INTERVAL_MS;
                frame(
                    t,
                    &[
                        (JointId::Pelvis, [0.0, 1.0, 0.0]),
                        (JointId::HipLeft, [-0.1, 1.0, 0.0]),
                        (JointId::KneeLeft, [-0.1, 0.5, 0.0]),
                        // Shin perpendicular to the thigh: 90 degree knee.
                        (JointId::AnkleLeft, [-0.6, 0.5, 0.0]),
                    ],
                )
            })
            .collect();
        let result = validator().classify(&JumpSegment::new(frames));
        assert_eq!(reason(result), FailureReason::AngleDisplacement);
    }

    #[test]
    fn straight_legs_pass_angle_rule() {
        let frames = (0..=60)
            .map(|i| {
                let t = i as f64 * FRAME_INTERVAL_MS;
                frame(
                    t,
                    &[
                        (JointId::Pelvis, [0.0, 1.0, 0.0]),
                        (JointId::HipLeft, [-0.1, 1.0, 0.0]),
                        (JointId::KneeLeft, [-0.1, 0.5, 0.0]),
                        (JointId::AnkleLeft, [-0.1, 0.1, 0.0]),
                    ],
                )
            })
            .collect();
        let result = validator().classify(&JumpSegment::new(frames));
        assert_eq!(result, ValidationResult::Valid);
    }

    #[test]
    fn bent_torso_at_rest_fails_angle_rule() {
        let frames = (0..=60)
            .map(|i| {
                let t = i as f64 * FRAME_INTERVAL_MS;
                frame(
                    t,
                    &[
                        (JointId::Pelvis, [0.0, 0.9, 0.0]),
                        (JointId::SpineNavel, [0.0, 1.1, 0.0]),
                        // Leaning far forward: 90 degrees at the spine.
                        (JointId::Neck, [0.3, 1.1, 0.0]),
                    ],
                )
            })
            .collect();
        let result = validator().classify(&JumpSegment::new(frames));
        assert_eq!(reason(result), FailureReason::AngleDisplacement);
    }

    #[test]
    fn classification_is_idempotent() {
        let validator = validator();
        let segment = jump_segment(0.5, 0.3);
        let first = validator.classify(&segment);
        let second = validator.classify(&segment);
        assert_eq!(first, second);
    }

    #[test]
    fn center_of_mass_joint_is_configurable() {
        let mut configs = Configs::default();
        configs.center_of_mass_joint = JointId::SpineNavel;
        let validator = JumpValidator::new(&configs);

        let frames = (0..=60)
            .map(|i| {
                let t = i as f64 * FRAME_INTERVAL_MS;
                frame(t, &[(JointId::SpineNavel, [0.0, 0.0, 0.0])])
            })
            .collect();
        assert_eq!(
            validator.classify(&JumpSegment::new(frames)),
            ValidationResult::Valid
        );
    }

    #[test]
    fn missing_center_of_mass_is_not_enough_points() {
        let frames = (0..=60)
            .map(|i| {
                let t = i as f64 * FRAME_INTERVAL_MS;
                frame(t, &[(JointId::Head, [0.0, 1.7, 0.0])])
            })
            .collect();
        let result = validator().classify(&JumpSegment::new(frames));
        assert_eq!(reason(result), FailureReason::NotEnoughPoints);
    }

    #[test]
    fn failure_reasons_carry_fixed_messages() {
        assert_eq!(
            FailureReason::MovementDisplacementHorizontal.message(),
            "Oops, you need to land where you started"
        );
        assert_eq!(
            FailureReason::HandsDisplacement.message(),
            "Please keep hands on hips while you jump"
        );
        assert_eq!(FailureReason::MaximalHeight.message(), "Please jump again");
        match validator().classify(&jump_segment(0.5, 0.3)) {
            ValidationResult::Invalid { reason, message } => {
                assert_eq!(message, reason.message());
            }
            ValidationResult::Valid => panic!("expected an invalid verdict"),
        }
    }
}
