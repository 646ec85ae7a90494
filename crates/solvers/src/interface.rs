use stride_core::{Expr, Ocp};

use crate::{Multipliers, Options, SolutionRecord};

/// The contract shared by every solver adapter.
///
/// An adapter is configured, then solves a problem any number of times. Each
/// solve re-reads the problem, so targets and initial guesses may change
/// between calls.
pub trait SolverInterface<E: Expr> {
    /// The adapter's error type.
    type Error: std::error::Error;

    /// Applies solver options.
    ///
    /// # Errors
    ///
    /// Returns an error if an option is invalid or cannot be set now.
    fn configure(&mut self, options: Options) -> Result<(), Self::Error>;

    /// Transcribes `ocp`, runs the external solver and records the result.
    ///
    /// A solver that finishes without success still returns a record; see
    /// [`SolutionRecord::status`].
    ///
    /// # Errors
    ///
    /// Returns an error if the problem cannot be transcribed for this solver
    /// or if the external solver cannot be run at all.
    fn solve(&mut self, ocp: &Ocp<E>) -> Result<&SolutionRecord, Self::Error>;

    /// The record of the last successful call to [`SolverInterface::solve`].
    fn result(&self) -> Option<&SolutionRecord>;

    /// Seeds the next solve with previous multipliers.
    ///
    /// # Errors
    ///
    /// Returns an error if the adapter cannot warm start.
    fn warm_start(&mut self, multipliers: Multipliers) -> Result<(), Self::Error>;

    /// The decision vectors visited by the last solve.
    ///
    /// # Errors
    ///
    /// Returns an error if the adapter does not record iterations, or did not
    /// record them for the last solve.
    fn iterations(&self) -> Result<&[ndarray::Array1<f64>], Self::Error>;
}
