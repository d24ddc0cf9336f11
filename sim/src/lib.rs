//! `sim` - Crowd simulator: walker trajectories, detection frames, replay.

pub mod replay;
pub mod scenarios;
pub mod sensor;
pub mod target;

pub use replay::{load_replay, save_replay, GroundTruthFrame, ReplayLog};
pub use scenarios::{Scenario, ScenarioKind};
pub use sensor::{DetectionSimulator, SensorFrame, SensorParams};
pub use target::{MotionSpec, Walker};
