//! In-memory backends for exercising the adapters without a numerical
//! library.
//!
//! Both work with the reference expression type [`Sx`].

use std::{cell::RefCell, collections::HashMap, rc::Rc, time::Duration};

use ndarray::Array1;
use thiserror::Error;

use stride_core::{
    Expr, Observer,
    testing::{Env, Sx},
};

use crate::{
    OptionValue, Options,
    multiple_shooting::{
        ConstraintField, Definition, IterateField, OcpBackend, OcpSolver, SolveStats,
    },
    nlp::{Action, Event, NlpBackend, NlpLimits, NlpOutput, NlpProblem, NlpStats},
};

#[derive(Debug, Error, PartialEq)]
pub enum FakeError {
    #[error("expression has free symbols at iteration {0}")]
    Unbound(usize),

    #[error("iterate has {found} entries, the problem has {expected}")]
    Length { expected: usize, found: usize },

    #[error("node {node} has no {field} iterate")]
    MissingIterate { node: usize, field: IterateField },

    #[error("backend refused to run")]
    Refused,
}

/// What [`FakeNlp`] was asked to solve.
#[derive(Debug, Clone, PartialEq)]
pub struct NlpCall {
    pub variables: usize,
    pub constraints: usize,
    pub limits: NlpLimits,
    pub options: Options,
    /// Objective at the start point.
    pub initial_objective: f64,
}

/// A scripted NLP backend.
///
/// Visits the start point, then each scripted iterate, reporting every one
/// to the observer, and returns the last visited point. Lagrange multipliers
/// are echoed from the warm start, or zero.
#[derive(Debug, Clone)]
pub struct FakeNlp {
    pub script: Vec<Array1<f64>>,
    pub success: bool,
    pub refuse: bool,
    /// Drop the last value of the returned solution.
    pub truncate: bool,
    pub calls: Vec<NlpCall>,
}

impl Default for FakeNlp {
    fn default() -> Self {
        Self {
            script: Vec::new(),
            success: true,
            refuse: false,
            truncate: false,
            calls: Vec::new(),
        }
    }
}

impl FakeNlp {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_script(mut self, script: Vec<Array1<f64>>) -> Self {
        self.script = script;
        self
    }

    #[must_use]
    pub fn failing(mut self) -> Self {
        self.success = false;
        self
    }

    #[must_use]
    pub fn refusing(mut self) -> Self {
        self.refuse = true;
        self
    }

    #[must_use]
    pub fn truncating(mut self) -> Self {
        self.truncate = true;
        self
    }
}

/// Evaluates a scalar expression with `x` bound to `values`.
fn evaluate(
    problem: &NlpProblem<Sx>,
    values: &Array1<f64>,
    iteration: usize,
) -> Result<f64, FakeError> {
    let env = Env::new().bind(&problem.x, &values.to_vec());
    problem
        .f
        .eval(&env)
        .and_then(|f| f.first().copied())
        .ok_or(FakeError::Unbound(iteration))
}

impl NlpBackend<Sx> for FakeNlp {
    const OPTION_PREFIX: &'static str = "ipopt.";

    type Error = FakeError;

    fn solve<Obs>(
        &mut self,
        problem: &NlpProblem<Sx>,
        limits: &NlpLimits,
        options: &Options,
        mut observer: Obs,
    ) -> Result<NlpOutput, FakeError>
    where
        Obs: Observer<Event, Action>,
    {
        if self.refuse {
            return Err(FakeError::Refused);
        }
        let variables = problem.x.numel();
        self.calls.push(NlpCall {
            variables,
            constraints: problem.g.numel(),
            limits: limits.clone(),
            options: options.clone(),
            initial_objective: evaluate(problem, &limits.x0, 0)?,
        });

        let mut last = (limits.x0.clone(), 0.0);
        let mut iterations = 0;
        let iterates = std::iter::once(&limits.x0).chain(&self.script);
        for (iteration, x) in iterates.enumerate() {
            if x.len() != variables {
                return Err(FakeError::Length {
                    expected: variables,
                    found: x.len(),
                });
            }
            let objective = evaluate(problem, x, iteration)?;
            last = (x.clone(), objective);
            iterations = iteration;

            let event = Event {
                iteration,
                objective,
                x: x.clone(),
            };
            if let Some(Action::StopEarly) = observer.observe(&event) {
                break;
            }
        }

        let (mut x, f) = last;
        if self.truncate {
            x = x.slice(ndarray::s![..variables.saturating_sub(1)]).to_owned();
        }
        Ok(NlpOutput {
            x,
            f,
            lam_x: limits
                .lam_x0
                .clone()
                .unwrap_or_else(|| Array1::zeros(variables)),
            lam_g: limits
                .lam_g0
                .clone()
                .unwrap_or_else(|| Array1::zeros(problem.g.numel())),
            stats: NlpStats {
                success: self.success,
                iterations,
                wall_time: Duration::from_millis(1),
            },
        })
    }
}

/// One call made on a [`FakeOcpSolver`].
#[derive(Debug, Clone, PartialEq)]
pub enum Push {
    Reference {
        node: usize,
        values: Array1<f64>,
    },
    Constraint {
        node: usize,
        field: ConstraintField,
        values: Array1<f64>,
    },
    Iterate {
        node: usize,
        field: IterateField,
        values: Array1<f64>,
    },
    Option {
        key: String,
        value: OptionValue,
    },
    Solve,
}

/// Everything the fake structured backend and its solvers saw.
#[derive(Debug, Default)]
pub struct Journal {
    pub definitions: Vec<Definition<Sx>>,
    pub pushes: Vec<Push>,
}

impl Journal {
    /// Pushes addressed to `node`, in order.
    #[must_use]
    pub fn pushes_for_node(&self, node: usize) -> Vec<&Push> {
        self.pushes
            .iter()
            .filter(|push| match push {
                Push::Reference { node: n, .. }
                | Push::Constraint { node: n, .. }
                | Push::Iterate { node: n, .. } => *n == node,
                Push::Option { .. } | Push::Solve => false,
            })
            .collect()
    }
}

/// A structured backend that records definitions and pushes.
#[derive(Debug, Clone, Default)]
pub struct FakeOcpBackend {
    pub journal: Rc<RefCell<Journal>>,
    pub status: i32,
    pub refuse: bool,
}

impl FakeOcpBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend whose solver always returns `status`.
    #[must_use]
    pub fn with_status(status: i32) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }
}

impl OcpBackend<Sx> for FakeOcpBackend {
    type Solver = FakeOcpSolver;
    type Error = FakeError;

    fn create(&mut self, definition: &Definition<Sx>) -> Result<FakeOcpSolver, FakeError> {
        if self.refuse {
            return Err(FakeError::Refused);
        }
        self.journal.borrow_mut().definitions.push(definition.clone());
        Ok(FakeOcpSolver {
            journal: Rc::clone(&self.journal),
            status: self.status,
            iterates: HashMap::new(),
        })
    }
}

/// A structured solver whose solution is its initial iterate.
#[derive(Debug)]
pub struct FakeOcpSolver {
    journal: Rc<RefCell<Journal>>,
    status: i32,
    iterates: HashMap<(usize, IterateField), Array1<f64>>,
}

impl OcpSolver for FakeOcpSolver {
    type Error = FakeError;

    fn set_reference(&mut self, node: usize, values: &Array1<f64>) -> Result<(), FakeError> {
        self.journal.borrow_mut().pushes.push(Push::Reference {
            node,
            values: values.clone(),
        });
        Ok(())
    }

    fn set_constraint(
        &mut self,
        node: usize,
        field: ConstraintField,
        values: &Array1<f64>,
    ) -> Result<(), FakeError> {
        self.journal.borrow_mut().pushes.push(Push::Constraint {
            node,
            field,
            values: values.clone(),
        });
        Ok(())
    }

    fn set_iterate(
        &mut self,
        node: usize,
        field: IterateField,
        values: &Array1<f64>,
    ) -> Result<(), FakeError> {
        self.iterates.insert((node, field), values.clone());
        self.journal.borrow_mut().pushes.push(Push::Iterate {
            node,
            field,
            values: values.clone(),
        });
        Ok(())
    }

    fn iterate(&self, node: usize, field: IterateField) -> Result<Array1<f64>, FakeError> {
        self.iterates
            .get(&(node, field))
            .cloned()
            .ok_or(FakeError::MissingIterate { node, field })
    }

    fn set_option(&mut self, key: &str, value: &OptionValue) -> Result<(), FakeError> {
        self.journal.borrow_mut().pushes.push(Push::Option {
            key: key.to_owned(),
            value: value.clone(),
        });
        Ok(())
    }

    fn solve(&mut self) -> Result<i32, FakeError> {
        self.journal.borrow_mut().pushes.push(Push::Solve);
        Ok(self.status)
    }

    fn stats(&self) -> Result<SolveStats, FakeError> {
        Ok(SolveStats {
            cost: 0.0,
            sqp_iterations: 3,
            wall_time: Duration::from_millis(2),
        })
    }
}
