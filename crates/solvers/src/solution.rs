use std::time::Duration;

use ndarray::{Array1, Array2};
use serde::Serialize;

/// Outcome reported by an external solver.
///
/// Codes follow the structured solver's convention; the generic adapter only
/// reports [`Status::Success`] (0) or [`Status::Failure`] (1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    Success,
    /// Generic failure, or NaN detected.
    Failure,
    MaxIterations,
    MinStep,
    QpFailure,
    Ready,
    Unbounded,
    Timeout,
    QpScaling,
    Infeasible,
    Unknown(i32),
}

impl Status {
    #[must_use]
    pub fn code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
            Self::MaxIterations => 2,
            Self::MinStep => 3,
            Self::QpFailure => 4,
            Self::Ready => 5,
            Self::Unbounded => 6,
            Self::Timeout => 7,
            Self::QpScaling => 8,
            Self::Infeasible => 9,
            Self::Unknown(code) => code,
        }
    }

    #[must_use]
    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

impl From<i32> for Status {
    fn from(code: i32) -> Self {
        match code {
            0 => Self::Success,
            1 => Self::Failure,
            2 => Self::MaxIterations,
            3 => Self::MinStep,
            4 => Self::QpFailure,
            5 => Self::Ready,
            6 => Self::Unbounded,
            7 => Self::Timeout,
            8 => Self::QpScaling,
            9 => Self::Infeasible,
            other => Self::Unknown(other),
        }
    }
}

/// Optimized trajectories of one phase.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseTrajectory {
    /// `nx × (N + 1)`, one column per node.
    pub states: Array2<f64>,

    /// `nu × N`, one column per shooting node.
    pub controls: Array2<f64>,
}

/// Lagrange multipliers of a generic solve, reusable as a warm start.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Multipliers {
    /// Multipliers of the decision-variable bounds.
    pub lam_x: Array1<f64>,

    /// Multipliers of the constraints.
    pub lam_g: Array1<f64>,
}

/// The result of one solve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolutionRecord {
    pub phases: Vec<PhaseTrajectory>,
    pub parameters: Array1<f64>,
    pub objective: f64,
    pub iterations: usize,
    pub wall_time: Duration,
    pub status: Status,

    /// Present after a generic solve.
    pub multipliers: Option<Multipliers>,

    /// Every decision vector visited, when iteration history was requested.
    pub iterates: Option<Vec<Array1<f64>>>,
}
