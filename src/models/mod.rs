// src/models/mod.rs

pub mod agent;
pub mod controller;
pub mod mpc;
pub mod pd;

pub use agent::{distance, is_captured, AgentState, RelativeState};
pub use controller::{Controller, ControllerKind};
pub use mpc::{build_problem, fallback_command, HorizonLayout, MpcController};
pub use pd::{pd_command, PdController};
