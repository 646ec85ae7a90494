use std::time::Duration;

use ndarray::Array1;

use stride_core::Observer;

use crate::Options;

use super::{Action, Event};

/// The symbolic problem `min f(x) s.t. lbg <= g(x) <= ubg, lbx <= x <= ubx`.
#[derive(Debug, Clone)]
pub struct NlpProblem<E> {
    pub x: E,
    pub f: E,
    pub g: E,
}

/// Numeric bounds, start point and optional warm-start multipliers.
#[derive(Debug, Clone, PartialEq)]
pub struct NlpLimits {
    pub lbx: Array1<f64>,
    pub ubx: Array1<f64>,
    pub lbg: Array1<f64>,
    pub ubg: Array1<f64>,
    pub x0: Array1<f64>,
    pub lam_x0: Option<Array1<f64>>,
    pub lam_g0: Option<Array1<f64>>,
}

/// What an NLP backend returns.
#[derive(Debug, Clone, PartialEq)]
pub struct NlpOutput {
    pub x: Array1<f64>,
    pub f: f64,
    pub lam_x: Array1<f64>,
    pub lam_g: Array1<f64>,
    pub stats: NlpStats,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NlpStats {
    pub success: bool,
    pub iterations: usize,
    pub wall_time: Duration,
}

/// An external nonlinear-programming solver.
pub trait NlpBackend<E> {
    /// Prefix of the backend's own options, for example `"ipopt."`.
    const OPTION_PREFIX: &'static str;

    type Error: std::error::Error + Send + Sync + 'static;

    /// Solves `problem` once.
    ///
    /// The backend reports every iterate to `observer` and stops as soon as
    /// the observer returns [`Action::StopEarly`].
    ///
    /// # Errors
    ///
    /// Returns an error only if the backend cannot run; an unsuccessful
    /// solve is reported through [`NlpStats::success`].
    fn solve<Obs>(
        &mut self,
        problem: &NlpProblem<E>,
        limits: &NlpLimits,
        options: &Options,
        observer: Obs,
    ) -> Result<NlpOutput, Self::Error>
    where
        Obs: Observer<Event, Action>;
}
