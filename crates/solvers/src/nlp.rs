//! Adapter for generic nonlinear-programming solvers.
//!
//! The whole program becomes one NLP: a flat decision vector of parameters,
//! node states and node controls, the sum of every flat cost as objective,
//! and the flat constraint stack. The solver itself sits behind
//! [`NlpBackend`].
//!
//! # Iteration history
//!
//! With `return_iterations` set, every iterate is spooled to a JSON-lines
//! file under the adapter's scratch directory and returned in
//! [`SolutionRecord::iterates`](crate::SolutionRecord::iterates).
//!
//! # Observer
//!
//! [`Adapter::solve_observed`] forwards every [`Event`] to a caller observer,
//! which can return [`Action::StopEarly`].

mod action;
mod backend;
mod config;
mod error;
mod event;
mod history;
mod layout;

#[cfg(test)]
mod tests;

use std::{
    marker::PhantomData,
    path::{Path, PathBuf},
};

use stride_core::{Expr, Observer, Ocp};

use crate::{
    Multipliers, Options, SolutionRecord, SolverInterface, Status,
    aggregate::{constraint, objective},
};

pub use action::Action;
pub use backend::{NlpBackend, NlpLimits, NlpOutput, NlpProblem, NlpStats};
pub use config::Config;
pub use error::{Error, SolutionLength};
pub use event::Event;

use history::History;
use layout::Layout;

/// The generic solver adapter.
pub struct Adapter<E, B> {
    backend: B,
    config: Config,
    warm_start: Option<Multipliers>,
    record: Option<SolutionRecord>,
    scratch_dir: PathBuf,
    _expr: PhantomData<fn() -> E>,
}

impl<E: Expr, B: NlpBackend<E>> Adapter<E, B> {
    /// Creates an adapter with the backend's default options.
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            config: Config::defaults(B::OPTION_PREFIX),
            warm_start: None,
            record: None,
            scratch_dir: std::env::temp_dir().join("stride"),
            _expr: PhantomData,
        }
    }

    /// Sets the directory iteration histories are spooled to.
    #[must_use]
    pub fn with_scratch_dir(mut self, directory: impl Into<PathBuf>) -> Self {
        self.scratch_dir = directory.into();
        self
    }

    #[must_use]
    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Solves `ocp`, forwarding every backend iterate to `observer`.
    ///
    /// # Errors
    ///
    /// Returns an error if the problem's profiles cannot be evaluated, if the
    /// backend cannot run, or if the iteration history cannot be written.
    pub fn solve_observed<Obs>(
        &mut self,
        ocp: &Ocp<E>,
        mut observer: Obs,
    ) -> Result<&SolutionRecord, Error>
    where
        Obs: Observer<Event, Action>,
    {
        let layout = Layout::new(ocp);
        let bounds = Layout::bounds(ocp)?;
        let x0 = Layout::initial_guess(ocp)?;
        let constraints = constraint::flat(ocp);
        let problem = NlpProblem {
            x: Layout::decision_vector(ocp),
            f: objective::flat(ocp).total(),
            g: constraints.values,
        };
        let limits = NlpLimits {
            lbx: bounds.lower().clone(),
            ubx: bounds.upper().clone(),
            lbg: constraints.bounds.lower().clone(),
            ubg: constraints.bounds.upper().clone(),
            x0,
            lam_x0: self.warm_start.as_ref().map(|m| m.lam_x.clone()),
            lam_g0: self.warm_start.as_ref().map(|m| m.lam_g.clone()),
        };
        log::debug!(
            "nlp has {} variables and {} constraints",
            layout.len(),
            limits.lbg.len()
        );

        let mut history = if self.config.return_iterations() {
            Some(History::create(&self.scratch_dir)?)
        } else {
            None
        };
        let mut history_error = None;

        let relay = |event: &Event| {
            if let Some(history) = history.as_mut() {
                if let Err(error) = history.append(&event.x) {
                    history_error.get_or_insert(error);
                }
            }
            observer.observe(event)
        };

        let output = self
            .backend
            .solve(&problem, &limits, self.config.solver_options(), relay)
            .map_err(|error| Error::Backend(Box::new(error)))?;

        if let Some(error) = history_error {
            return Err(error.into());
        }
        let iterates = history.map(History::finish).transpose()?;

        if output.x.len() != layout.len() {
            return Err(Error::Backend(Box::new(SolutionLength {
                expected: layout.len(),
                found: output.x.len(),
            })));
        }
        let (parameters, phases) = layout.unpack(&output.x);
        let status = if output.stats.success {
            Status::Success
        } else {
            Status::Failure
        };
        if status.is_success() {
            log::info!(
                "nlp solved in {} iterations, objective {:e}",
                output.stats.iterations,
                output.f
            );
        } else {
            log::warn!(
                "nlp stopped without success after {} iterations",
                output.stats.iterations
            );
        }

        Ok(self.record.insert(SolutionRecord {
            phases,
            parameters,
            objective: output.f,
            iterations: output.stats.iterations,
            wall_time: output.stats.wall_time,
            status,
            multipliers: Some(Multipliers {
                lam_x: output.lam_x,
                lam_g: output.lam_g,
            }),
            iterates,
        }))
    }
}

impl<E: Expr, B: NlpBackend<E>> SolverInterface<E> for Adapter<E, B> {
    type Error = Error;

    fn configure(&mut self, options: Options) -> Result<(), Error> {
        self.config = Config::new(options, B::OPTION_PREFIX)?;
        Ok(())
    }

    fn solve(&mut self, ocp: &Ocp<E>) -> Result<&SolutionRecord, Error> {
        self.solve_observed(ocp, ())
    }

    fn result(&self) -> Option<&SolutionRecord> {
        self.record.as_ref()
    }

    fn warm_start(&mut self, multipliers: Multipliers) -> Result<(), Error> {
        self.warm_start = Some(multipliers);
        Ok(())
    }

    fn iterations(&self) -> Result<&[ndarray::Array1<f64>], Error> {
        self.record
            .as_ref()
            .and_then(|record| record.iterates.as_deref())
            .ok_or(Error::IterationsNotRecorded)
    }
}
