use std::{fmt, time::Duration};

use ndarray::Array1;

use crate::OptionValue;

use super::Definition;

/// A per-node bound array of the structured solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintField {
    Lbu,
    Ubu,
    Lbx,
    Ubx,
    Lh,
    Uh,
}

impl fmt::Display for ConstraintField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Lbu => "lbu",
            Self::Ubu => "ubu",
            Self::Lbx => "lbx",
            Self::Ubx => "ubx",
            Self::Lh => "lh",
            Self::Uh => "uh",
        })
    }
}

/// A per-node iterate of the structured solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IterateField {
    X,
    U,
}

impl fmt::Display for IterateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::X => "x",
            Self::U => "u",
        })
    }
}

/// Statistics of the last structured solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveStats {
    pub cost: f64,
    pub sqp_iterations: usize,
    pub wall_time: Duration,
}

/// A constructed structured solver.
///
/// Nodes run from `0` to `N`; node `N` has no control.
pub trait OcpSolver {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Sets the least-squares reference `yref` of `node`.
    fn set_reference(&mut self, node: usize, values: &Array1<f64>) -> Result<(), Self::Error>;

    fn set_constraint(
        &mut self,
        node: usize,
        field: ConstraintField,
        values: &Array1<f64>,
    ) -> Result<(), Self::Error>;

    /// Sets the initial iterate of `node`.
    fn set_iterate(
        &mut self,
        node: usize,
        field: IterateField,
        values: &Array1<f64>,
    ) -> Result<(), Self::Error>;

    /// Reads the current iterate of `node`.
    fn iterate(&self, node: usize, field: IterateField) -> Result<Array1<f64>, Self::Error>;

    /// Changes a solver option after construction.
    fn set_option(&mut self, key: &str, value: &OptionValue) -> Result<(), Self::Error>;

    /// Runs the solver and returns its status code.
    fn solve(&mut self) -> Result<i32, Self::Error>;

    fn stats(&self) -> Result<SolveStats, Self::Error>;
}

/// Builds structured solvers from problem definitions.
pub trait OcpBackend<E> {
    type Solver: OcpSolver;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Generates and constructs a solver for `definition`.
    fn create(&mut self, definition: &Definition<E>) -> Result<Self::Solver, Self::Error>;
}
