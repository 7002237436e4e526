// src/lib.rs

pub mod config;
pub mod error;
pub mod math;
pub mod models;
pub mod simulation;

pub use config::{Scenario, SimConfig, TargetManeuver};
pub use error::SimError;
pub use models::{AgentState, Controller, ControllerKind, MpcController, PdController};
pub use simulation::{run_episode, EpisodeLog, EpisodeMetrics, StepRecord};
