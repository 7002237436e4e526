// src/math/mod.rs

pub mod clarabel_qp;
pub mod constraints;
pub mod discrete;
pub mod error;
pub mod integrator;
pub mod qp;

pub use clarabel_qp::ClarabelSolver;
pub use constraints::{clip_box, clip_slew, clip_slew_then_box};
pub use discrete::RelativeDynamics;
pub use error::SolverError;
pub use integrator::Integrator;
pub use qp::{QpProblem, QpSolution, QpSolver};
