// src/lib.rs
//
// Jump analysis pipeline for RGB-D body tracking data: temporal smoothing
// of per-frame joint positions, rule-based jump validity classification and
// jump phase metrics. Camera capture, skeletal tracking inference and
// rendering live outside this crate; it consumes already tracked frames.

pub mod analysis;
pub mod config;
pub mod data;
pub mod dsp;
pub mod exchange;
pub mod joints;
pub mod skeleton;
pub mod smoother;
pub mod validity;

pub use analysis::{AnalysisError, JumpAnalyzer, JumpMetrics};
pub use config::{ConfigError, Configs, JumpValidity};
pub use exchange::FrameExchange;
pub use joints::{mapped_joints, ConfidenceLevel, JointId};
pub use skeleton::{SkeletonError, SkeletonPosition};
pub use smoother::Smoother;
pub use validity::{FailureReason, JumpSegment, JumpValidator, ValidationResult};
