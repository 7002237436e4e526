// src/config/mod.rs

pub mod parameters;
pub mod scenario;

pub use parameters::{MpcWeights, PdGains, SimConfig};
pub use scenario::{Scenario, TargetManeuver};
