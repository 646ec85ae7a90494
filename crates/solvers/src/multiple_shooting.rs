//! Adapter for structure-exploiting multiple-shooting solvers.
//!
//! The program is handed to the solver node by node: a model over the
//! augmented state `[p; x]` (parameters are states with zero derivative),
//! least-squares costs, path and terminal constraints, and per-node bounds.
//!
//! The solver is generated from a [`Definition`] on the first solve and
//! reused afterwards. Later solves only push per-node data (references,
//! bounds and initial iterates), so the problem's dimensions must not change.
//!
//! Only single-phase problems are supported. Phase-duration parameters,
//! warm starting and iteration history are not.

mod backend;
mod config;
mod definition;
mod error;


use std::{
    marker::PhantomData,
    time::{SystemTime, UNIX_EPOCH},
};

use ndarray::{Array1, Array2, s};

use stride_core::{Expr, Ocp};

use crate::{
    ConfigurationError, Multipliers, Options, PhaseTrajectory, SolutionRecord, SolverInterface,
    Status,
};

pub use backend::{ConstraintField, IterateField, OcpBackend, OcpSolver, SolveStats};
pub use config::{Construction, EDITABLE_OPTIONS, default_solver_options};
pub use definition::{
    CostDefinition, Definition, Dimensions, Model, NodeData, Transcription, transcribe,
};
pub use error::Error;

/// A constructed solver and the dimensions it was generated for.
struct Handle<S> {
    solver: S,
    dimensions: Dimensions,
}

/// The multiple-shooting solver adapter.
pub struct Adapter<E, B: OcpBackend<E>> {
    backend: B,
    construction: Construction,
    solver_options: Options,
    handle: Option<Handle<B::Solver>>,
    record: Option<SolutionRecord>,
    _expr: PhantomData<fn() -> E>,
}

impl<E: Expr, B: OcpBackend<E>> Adapter<E, B> {
    /// Creates an adapter with construction options `cost_type`,
    /// `constr_type` and `acados_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown or unsupported cost type.
    pub fn new(backend: B, options: Options) -> Result<Self, Error> {
        Ok(Self {
            backend,
            construction: Construction::new(options)?,
            solver_options: default_solver_options(),
            handle: None,
            record: None,
            _expr: PhantomData,
        })
    }

    #[must_use]
    pub fn construction(&self) -> &Construction {
        &self.construction
    }

    /// The options the solver is (or will be) generated with.
    #[must_use]
    pub fn solver_options(&self) -> &Options {
        &self.solver_options
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Whether the solver has been generated.
    #[must_use]
    pub fn is_constructed(&self) -> bool {
        self.handle.is_some()
    }

    fn check_supported(ocp: &Ocp<E>) -> Result<(), ConfigurationError> {
        if ocp.phase_count() != 1 {
            return Err(ConfigurationError::PhaseCount {
                supported: 1,
                found: ocp.phase_count(),
            });
        }
        match ocp.parameters().iter().find(|p| p.is_phase_time()) {
            Some(parameter) => Err(ConfigurationError::TimeParameter(parameter.name().to_owned())),
            None => Ok(()),
        }
    }

    /// Returns the solver for `definition`, generating it on first use.
    fn solver(&mut self, definition: &Definition<E>) -> Result<&mut B::Solver, Error> {
        let handle = match self.handle.take() {
            Some(handle) => match handle.dimensions.first_difference(&definition.dimensions) {
                None => handle,
                Some((what, expected, found)) => {
                    self.handle = Some(handle);
                    return Err(ConfigurationError::DimensionChanged {
                        what,
                        expected,
                        found,
                    }
                    .into());
                }
            },
            None => {
                log::debug!("generating solver {}", definition.model.name);
                Handle {
                    solver: self.backend.create(definition).map_err(Error::backend)?,
                    dimensions: definition.dimensions,
                }
            }
        };
        Ok(&mut self.handle.insert(handle).solver)
    }
}

impl<E: Expr, B: OcpBackend<E>> SolverInterface<E> for Adapter<E, B> {
    type Error = Error;

    /// Before the solver exists, overlays `options` on the solver defaults.
    /// Afterwards only the tolerances in [`EDITABLE_OPTIONS`] can change, and
    /// a set with any other key is rejected as a whole.
    fn configure(&mut self, options: Options) -> Result<(), Error> {
        let options = config::without_construction_keys(options);
        match self.handle.as_mut() {
            None => self.solver_options.merge(options),
            Some(handle) => {
                let edits = options
                    .iter()
                    .map(|(key, value)| Ok((config::editable_key(key)?, value)))
                    .collect::<Result<Vec<_>, ConfigurationError>>()?;
                for (short, value) in edits {
                    handle
                        .solver
                        .set_option(short, value)
                        .map_err(Error::backend)?;
                }
            }
        }
        Ok(())
    }

    fn solve(&mut self, ocp: &Ocp<E>) -> Result<&SolutionRecord, Error> {
        Self::check_supported(ocp)?;

        let name = model_name();
        let Transcription { definition, nodes } =
            transcribe(ocp, &self.construction, &self.solver_options, &name)?;
        let dimensions = definition.dimensions;

        let solver = self.solver(&definition)?;
        push(solver, &definition, &nodes).map_err(Error::backend)?;

        let status = Status::from(solver.solve().map_err(Error::backend)?);
        let stats = solver.stats().map_err(Error::backend)?;
        let (parameters, trajectory) = read_back(solver, &dimensions).map_err(Error::backend)?;

        if status.is_success() {
            log::info!(
                "structured solve finished in {} SQP iterations, cost {:e}",
                stats.sqp_iterations,
                stats.cost
            );
        } else {
            log::warn!("structured solve finished with status {status:?}");
        }

        Ok(self.record.insert(SolutionRecord {
            phases: vec![trajectory],
            parameters,
            objective: stats.cost,
            iterations: stats.sqp_iterations,
            wall_time: stats.wall_time,
            status,
            multipliers: None,
            iterates: None,
        }))
    }

    fn result(&self) -> Option<&SolutionRecord> {
        self.record.as_ref()
    }

    fn warm_start(&mut self, _multipliers: Multipliers) -> Result<(), Error> {
        Err(Error::NotImplemented("warm starting"))
    }

    fn iterations(&self) -> Result<&[Array1<f64>], Error> {
        Err(Error::NotImplemented("iteration history"))
    }
}

/// A model name unique to this construction.
fn model_name() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();
    format!("model_{millis}")
}

/// Pushes references, bounds and initial iterates to every node.
fn push<E, S: OcpSolver>(
    solver: &mut S,
    definition: &Definition<E>,
    nodes: &NodeData,
) -> Result<(), S::Error> {
    let n = definition.dimensions.shooting_nodes;
    let bounds = &definition.bounds;

    for node in 0..n {
        if let Some(reference) = nodes.references.get(node) {
            solver.set_reference(node, reference)?;
        }
        solver.set_iterate(node, IterateField::X, &nodes.x_init[node])?;
        solver.set_iterate(node, IterateField::U, &nodes.u_init[node])?;
        solver.set_constraint(node, ConstraintField::Lbu, bounds.controls.lower())?;
        solver.set_constraint(node, ConstraintField::Ubu, bounds.controls.upper())?;
        solver.set_constraint(node, ConstraintField::Uh, definition.path_bounds.upper())?;
        solver.set_constraint(node, ConstraintField::Lh, definition.path_bounds.lower())?;

        let states = bounds.states.at(node, n);
        solver.set_constraint(node, ConstraintField::Lbx, states.lower())?;
        solver.set_constraint(node, ConstraintField::Ubx, states.upper())?;
    }

    if let Some(reference) = &nodes.terminal_reference {
        solver.set_reference(n, reference)?;
    }
    solver.set_constraint(n, ConstraintField::Lbx, bounds.states.terminal.lower())?;
    solver.set_constraint(n, ConstraintField::Ubx, bounds.states.terminal.upper())?;
    if !definition.terminal_bounds.is_empty() {
        solver.set_constraint(n, ConstraintField::Uh, definition.terminal_bounds.upper())?;
        solver.set_constraint(n, ConstraintField::Lh, definition.terminal_bounds.lower())?;
    }
    solver.set_iterate(n, IterateField::X, &nodes.x_init[n])?;

    log::debug!("pushed node data to {} nodes", n + 1);
    Ok(())
}

/// Reads the augmented states and controls back, splitting off the
/// parameters from the first node.
fn read_back<S: OcpSolver>(
    solver: &S,
    dimensions: &Dimensions,
) -> Result<(Array1<f64>, PhaseTrajectory), S::Error> {
    let n = dimensions.shooting_nodes;
    let np = dimensions.np;

    let mut augmented = Array2::zeros((dimensions.nx, n + 1));
    for node in 0..=n {
        augmented
            .column_mut(node)
            .assign(&solver.iterate(node, IterateField::X)?);
    }
    let mut controls = Array2::zeros((dimensions.nu, n));
    for node in 0..n {
        controls
            .column_mut(node)
            .assign(&solver.iterate(node, IterateField::U)?);
    }

    let parameters = augmented.slice(s![..np, 0]).to_owned();
    let states = augmented.slice(s![np.., ..]).to_owned();
    Ok((parameters, PhaseTrajectory { states, controls }))
}
