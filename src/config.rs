// src/config.rs
use crate::joints::JointId;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("config threshold `{name}` must be positive, got {value}")]
    NonPositive { name: &'static str, value: f64 },
    #[error("config angle `{name}` must be within [0, 180] degrees, got {value}")]
    AngleOutOfRange { name: &'static str, value: f64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialAndEndStability {
    pub stable_time_in_ms: f64,
    pub initial_allowed_movement_deviation_in_meters: f64,
}

impl Default for InitialAndEndStability {
    fn default() -> Self {
        Self {
            stable_time_in_ms: 200.0,
            initial_allowed_movement_deviation_in_meters: 0.05,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementDisplacement {
    pub horizontal_threshold_in_meters: f64,
    pub vertical_threshold_in_meters: f64,
}

impl Default for MovementDisplacement {
    fn default() -> Self {
        Self {
            horizontal_threshold_in_meters: 0.15,
            vertical_threshold_in_meters: 0.05,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HandsDisplacement {
    pub frame_count_threshold: usize,
    pub distance_threshold_in_meters: f64,
    pub allowed_standard_deviation_in_meters: f64,
}

impl Default for HandsDisplacement {
    fn default() -> Self {
        Self {
            frame_count_threshold: 5,
            distance_threshold_in_meters: 0.3,
            allowed_standard_deviation_in_meters: 0.03,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AngleDisplacement {
    pub knee_angle_threshold_in_deg: f64,
    pub knee_angle_allowed_deviation: f64,
    pub torso_angle_threshold_in_deg: f64,
    pub torso_angle_allowed_deviation: f64,
}

impl Default for AngleDisplacement {
    fn default() -> Self {
        Self {
            knee_angle_threshold_in_deg: 150.0,
            knee_angle_allowed_deviation: 30.0,
            torso_angle_threshold_in_deg: 170.0,
            torso_angle_allowed_deviation: 30.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Height {
    pub maximal_possible_value_in_meters: f64,
}

impl Default for Height {
    fn default() -> Self {
        Self {
            maximal_possible_value_in_meters: 0.8,
        }
    }
}

/// Thresholds parameterizing the jump validity rules. Loaded once and
/// treated as read-only for the rest of the session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JumpValidity {
    pub initial_and_end_stability: InitialAndEndStability,
    pub movement_displacement: MovementDisplacement,
    pub hands_displacement: HandsDisplacement,
    pub angle_displacement: AngleDisplacement,
    pub height: Height,
}

impl JumpValidity {
    fn validate(&self) -> Result<(), ConfigError> {
        let positives = [
            (
                "stable_time_in_ms",
                self.initial_and_end_stability.stable_time_in_ms,
            ),
            (
                "initial_allowed_movement_deviation_in_meters",
                self.initial_and_end_stability
                    .initial_allowed_movement_deviation_in_meters,
            ),
            (
                "horizontal_threshold_in_meters",
                self.movement_displacement.horizontal_threshold_in_meters,
            ),
            (
                "vertical_threshold_in_meters",
                self.movement_displacement.vertical_threshold_in_meters,
            ),
            (
                "distance_threshold_in_meters",
                self.hands_displacement.distance_threshold_in_meters,
            ),
            (
                "allowed_standard_deviation_in_meters",
                self.hands_displacement.allowed_standard_deviation_in_meters,
            ),
            (
                "maximal_possible_value_in_meters",
                self.height.maximal_possible_value_in_meters,
            ),
        ];
        for (name, value) in positives {
            if value <= 0.0 {
                return Err(ConfigError::NonPositive { name, value });
            }
        }
        if self.hands_displacement.frame_count_threshold == 0 {
            return Err(ConfigError::NonPositive {
                name: "frame_count_threshold",
                value: 0.0,
            });
        }

        let angles = [
            (
                "knee_angle_threshold_in_deg",
                self.angle_displacement.knee_angle_threshold_in_deg,
            ),
            (
                "knee_angle_allowed_deviation",
                self.angle_displacement.knee_angle_allowed_deviation,
            ),
            (
                "torso_angle_threshold_in_deg",
                self.angle_displacement.torso_angle_threshold_in_deg,
            ),
            (
                "torso_angle_allowed_deviation",
                self.angle_displacement.torso_angle_allowed_deviation,
            ),
        ];
        for (name, value) in angles {
            if !(0.0..=180.0).contains(&value) {
                return Err(ConfigError::AngleOutOfRange { name, value });
            }
        }
        Ok(())
    }
}

/// Raw data recording options for the replay binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RawDataCollection {
    pub logging: bool,
    pub logging_file_name_prefix: String,
}

impl Default for RawDataCollection {
    fn default() -> Self {
        Self {
            logging: false,
            logging_file_name_prefix: "log".to_string(),
        }
    }
}

/// Top-level configuration of a tracking session.
///
/// There is no ambient singleton: each session owns its config value and
/// passes it into the smoother and validator constructors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Configs {
    /// Joint used as a proxy for whole-body position in jump analysis.
    pub center_of_mass_joint: JointId,
    pub number_smoothing_frames: usize,
    pub jump_validity: JumpValidity,
    pub raw_data_collection: RawDataCollection,
}

impl Default for Configs {
    fn default() -> Self {
        Self {
            center_of_mass_joint: JointId::Pelvis,
            number_smoothing_frames: 5,
            jump_validity: JumpValidity::default(),
            raw_data_collection: RawDataCollection::default(),
        }
    }
}

impl Configs {
    /// Loads configuration from a JSON file, rejecting invalid thresholds.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path)?;
        let configs: Configs = serde_json::from_str(&data)?;
        configs.jump_validity.validate()?;
        info!("successfully loaded config file");
        Ok(configs)
    }

    /// Loads configuration, falling back to documented defaults when the
    /// file is missing or malformed.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path.as_ref()) {
            Ok(configs) => configs,
            Err(err) => {
                error!(path = %path.as_ref().display(), %err, "cannot load config, using defaults");
                Self::default()
            }
        }
    }
}
