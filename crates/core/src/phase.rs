use std::fmt;

use crate::{
    Bounds, Constraint, ConstraintTerm, Dynamics, Error, Expr, InitialGuess, Instance, Objective,
    ObjectiveTerm, Penalty, Quantity,
};

/// The symbols a phase is written in.
///
/// `state` and `control` are the node-agnostic model symbols that residuals
/// and dynamics are expressed in. `node_states` (`N + 1` of them) and
/// `node_controls` (`N`) are the per-node decision variables of the flat
/// problem.
#[derive(Debug, Clone)]
pub struct PhaseSymbols<E> {
    pub state: E,
    pub control: E,
    pub node_states: Vec<E>,
    pub node_controls: Vec<E>,
}

/// One contiguous horizon of an optimal control program.
pub struct Phase<E> {
    symbols: PhaseSymbols<E>,
    dynamics: Box<dyn Dynamics<E>>,
    final_time: f64,
    x_bounds: Bounds,
    u_bounds: Bounds,
    x_init: InitialGuess,
    u_init: InitialGuess,
    objectives: Vec<ObjectiveTerm<E>>,
    constraints: Vec<ConstraintTerm<E>>,
}

impl<E: Expr> Phase<E> {
    /// Creates a phase with no objectives or constraints.
    ///
    /// The number of shooting intervals `N` is the number of node controls.
    ///
    /// # Errors
    ///
    /// Returns an error if the symbols are inconsistent (node counts or row
    /// counts) or if a bound or initial-guess profile does not match the
    /// state/control dimension and node count.
    pub fn new(
        symbols: PhaseSymbols<E>,
        dynamics: impl Dynamics<E> + 'static,
        final_time: f64,
        x_bounds: Bounds,
        u_bounds: Bounds,
        x_init: InitialGuess,
        u_init: InitialGuess,
    ) -> Result<Self, Error> {
        let shooting_nodes = symbols.node_controls.len();
        if shooting_nodes == 0 {
            return Err(Error::NoShootingInterval);
        }
        if symbols.node_states.len() != shooting_nodes + 1 {
            return Err(Error::Columns {
                what: "node states",
                expected: shooting_nodes + 1,
                found: symbols.node_states.len(),
            });
        }

        let nx = symbols.state.numel();
        let nu = symbols.control.numel();
        for state in &symbols.node_states {
            check_rows("node state", nx, state.numel())?;
        }
        for control in &symbols.node_controls {
            check_rows("node control", nu, control.numel())?;
        }

        check_rows("state bounds", nx, x_bounds.dimension())?;
        check_rows("control bounds", nu, u_bounds.dimension())?;
        check_rows("state initial guess", nx, x_init.dimension())?;
        check_rows("control initial guess", nu, u_init.dimension())?;
        x_bounds.check_nodes(shooting_nodes + 1)?;
        u_bounds.check_nodes(shooting_nodes)?;
        x_init.check_nodes(shooting_nodes + 1)?;
        u_init.check_nodes(shooting_nodes)?;

        Ok(Self {
            symbols,
            dynamics: Box::new(dynamics),
            final_time,
            x_bounds,
            u_bounds,
            x_init,
            u_init,
            objectives: Vec::new(),
            constraints: Vec::new(),
        })
    }

    /// Resolves `objective` against this phase and appends it.
    ///
    /// State and control penalties become the (indexed) state or control
    /// symbol; one instance is evaluated per node the term applies to. Terms
    /// that depend on the control have no terminal instance.
    ///
    /// # Errors
    ///
    /// Returns an error for out-of-range indices or nodes and for mismatched
    /// targets.
    pub fn add_objective(&mut self, objective: Objective<E>) -> Result<(), Error> {
        let (quantity, residual) = match &objective.penalty {
            Penalty::MinimizeStates => (
                Quantity::States,
                select(&self.symbols.state, objective.index.as_deref())?,
            ),
            Penalty::MinimizeControls => (
                Quantity::Controls,
                select(&self.symbols.control, objective.index.as_deref())?,
            ),
            Penalty::Custom(expr) => (Quantity::Expression, expr.clone()),
        };

        let reaches_terminal =
            quantity != Quantity::Controls && !residual.depends_on(&self.symbols.control);
        let nodes = objective.node.resolve(self.shooting_nodes(), reaches_terminal)?;
        let instances = self.instantiate(&residual, &nodes);

        let term = ObjectiveTerm::new(objective, quantity, residual, instances)?;
        self.objectives.push(term);
        Ok(())
    }

    /// Resolves `constraint` against this phase and appends it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NodeOutOfRange`] if the constraint names a node past
    /// the terminal one, or the terminal node itself for a constraint on the
    /// control.
    pub fn add_constraint(&mut self, constraint: Constraint<E>) -> Result<(), Error> {
        let reaches_terminal = !constraint.residual.depends_on(&self.symbols.control);
        let nodes = constraint.node.resolve(self.shooting_nodes(), reaches_terminal)?;
        let instances = self.instantiate(&constraint.residual, &nodes);
        self.constraints.push(ConstraintTerm::new(constraint, instances));
        Ok(())
    }

    /// Evaluates `residual` at each node by substituting the node's decision
    /// variables for the model symbols. The terminal node has no control, so
    /// only the state is substituted there.
    fn instantiate(&self, residual: &E, nodes: &[usize]) -> Vec<Instance<E>> {
        let symbols = &self.symbols;
        nodes
            .iter()
            .map(|&node| {
                let value = match symbols.node_controls.get(node) {
                    Some(control) => residual.substitute(
                        &[symbols.state.clone(), symbols.control.clone()],
                        &[symbols.node_states[node].clone(), control.clone()],
                    ),
                    None => residual.substitute(
                        std::slice::from_ref(&symbols.state),
                        std::slice::from_ref(&symbols.node_states[node]),
                    ),
                };
                Instance {
                    node,
                    value,
                    target: None,
                }
            })
            .collect()
    }

    /// Replaces the state initial guess.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile does not match the state dimension or
    /// node count.
    pub fn set_x_init(&mut self, x_init: InitialGuess) -> Result<(), Error> {
        check_rows("state initial guess", self.nx(), x_init.dimension())?;
        x_init.check_nodes(self.shooting_nodes() + 1)?;
        self.x_init = x_init;
        Ok(())
    }

    /// Replaces the control initial guess.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile does not match the control dimension or
    /// node count.
    pub fn set_u_init(&mut self, u_init: InitialGuess) -> Result<(), Error> {
        check_rows("control initial guess", self.nu(), u_init.dimension())?;
        u_init.check_nodes(self.shooting_nodes())?;
        self.u_init = u_init;
        Ok(())
    }

    /// Number of shooting intervals `N`.
    #[must_use]
    pub fn shooting_nodes(&self) -> usize {
        self.symbols.node_controls.len()
    }

    #[must_use]
    pub fn nx(&self) -> usize {
        self.symbols.state.numel()
    }

    #[must_use]
    pub fn nu(&self) -> usize {
        self.symbols.control.numel()
    }

    #[must_use]
    pub fn final_time(&self) -> f64 {
        self.final_time
    }

    #[must_use]
    pub fn symbols(&self) -> &PhaseSymbols<E> {
        &self.symbols
    }

    /// The state derivative in the model symbols.
    #[must_use]
    pub fn dynamics(&self, parameters: &E) -> E {
        self.dynamics
            .derivative(&self.symbols.state, &self.symbols.control, parameters)
    }

    #[must_use]
    pub fn x_bounds(&self) -> &Bounds {
        &self.x_bounds
    }

    #[must_use]
    pub fn u_bounds(&self) -> &Bounds {
        &self.u_bounds
    }

    #[must_use]
    pub fn x_init(&self) -> &InitialGuess {
        &self.x_init
    }

    #[must_use]
    pub fn u_init(&self) -> &InitialGuess {
        &self.u_init
    }

    #[must_use]
    pub fn objectives(&self) -> &[ObjectiveTerm<E>] {
        &self.objectives
    }

    /// Mutable access to the resolved objectives, e.g. to move targets
    /// between solves.
    pub fn objectives_mut(&mut self) -> &mut [ObjectiveTerm<E>] {
        &mut self.objectives
    }

    #[must_use]
    pub fn constraints(&self) -> &[ConstraintTerm<E>] {
        &self.constraints
    }
}

impl<E: Expr> fmt::Debug for Phase<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Phase")
            .field("nx", &self.nx())
            .field("nu", &self.nu())
            .field("shooting_nodes", &self.shooting_nodes())
            .field("final_time", &self.final_time)
            .field("objectives", &self.objectives.len())
            .field("constraints", &self.constraints.len())
            .finish_non_exhaustive()
    }
}

fn select<E: Expr>(symbol: &E, index: Option<&[usize]>) -> Result<E, Error> {
    let Some(index) = index else {
        return Ok(symbol.clone());
    };
    let dimension = symbol.numel();
    if let Some(&bad) = index.iter().find(|&&i| i >= dimension) {
        return Err(Error::IndexOutOfRange {
            index: bad,
            dimension,
        });
    }
    Ok(symbol.select(index))
}

fn check_rows(what: &'static str, expected: usize, found: usize) -> Result<(), Error> {
    if expected != found {
        return Err(Error::Rows {
            what,
            expected,
            found,
        });
    }
    Ok(())
}
