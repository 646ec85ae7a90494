//! Core types for describing optimal control programs in Stride.
//!
//! This crate defines the solver-agnostic problem description that the
//! transcription layer in `stride-solvers` reads:
//!
//! - [`Expr`]: the symbolic column-vector capability every description is
//!   generic over
//! - [`Phase`]: one horizon with its dimensions, dynamics, bounds, initial
//!   guesses, objectives and constraints
//! - [`Objective`], [`ObjectiveTerm`], [`Constraint`] and [`ConstraintTerm`]:
//!   declared terms and their per-node [`Instance`]s
//! - [`Bounds`], [`Interval`] and [`InitialGuess`]: node-varying numeric
//!   profiles
//! - [`Ocp`]: the ordered phases plus free parameters
//! - [`Observer`]: receives solver events and optionally returns control
//!   actions

mod bounds;
mod constraint;
mod dynamics;
mod error;
mod expr;
mod node;
mod objective;
mod observer;
mod ocp;
mod parameter;
mod phase;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use bounds::{Bounds, InitialGuess, Interpolation, Interval};
pub use constraint::{Constraint, ConstraintTerm, Defect};
pub use dynamics::Dynamics;
pub use error::Error;
pub use expr::Expr;
pub use node::Node;
pub use objective::{Instance, Objective, ObjectiveKind, ObjectiveTerm, Penalty, Quantity};
pub use observer::Observer;
pub use ocp::Ocp;
pub use parameter::Parameter;
pub use phase::{Phase, PhaseSymbols};
