//! Capability traits for cross-solver observers.
//!
//! These traits abstract over adapter-specific event and action types, so an
//! observer can be written once and used with any adapter whose events carry
//! the data it needs.
//!
//! # Event traits
//!
//! - [`HasIteration`]: events numbered by solver iteration
//! - [`HasObjective`]: events that carry an objective value
//!
//! # Action traits
//!
//! - [`CanStopEarly`]: actions that can signal early termination
//!
//! # Example
//!
//! ```rust
//! use stride_core::Observer;
//! use stride_observers::traits::{CanStopEarly, HasObjective};
//!
//! struct GoodEnough {
//!     tolerance: f64,
//! }
//!
//! impl<E: HasObjective, A: CanStopEarly> Observer<E, A> for GoodEnough {
//!     fn observe(&mut self, event: &E) -> Option<A> {
//!         (event.objective() < self.tolerance).then(A::stop_early)
//!     }
//! }
//! ```

use stride_solvers::nlp;

/// An event numbered by solver iteration.
pub trait HasIteration {
    /// Returns the zero-based iteration this event belongs to.
    fn iteration(&self) -> usize;
}

/// An event that carries an objective value.
pub trait HasObjective {
    /// Returns the objective for this event.
    ///
    /// Returns `f64::NAN` when no objective is available.
    fn objective(&self) -> f64;
}

/// An action type that can signal early termination.
pub trait CanStopEarly {
    /// Returns the action that stops the solver early.
    fn stop_early() -> Self;
}

impl HasIteration for nlp::Event {
    fn iteration(&self) -> usize {
        self.iteration
    }
}

impl HasObjective for nlp::Event {
    fn objective(&self) -> f64 {
        self.objective
    }
}

impl CanStopEarly for nlp::Action {
    fn stop_early() -> Self {
        Self::StopEarly
    }
}
