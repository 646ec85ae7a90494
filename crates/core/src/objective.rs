use ndarray::{Array1, Array2};

use crate::{Error, Expr, Node};

/// When an objective term is accumulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectiveKind {
    /// A running cost, accumulated over shooting nodes.
    Lagrange,

    /// A terminal cost, evaluated at the last node.
    Mayer,

    /// A cost on the free parameters of the whole problem.
    Parameter,
}

/// What an objective term penalizes.
#[derive(Debug, Clone)]
pub enum Penalty<E> {
    /// The (optionally indexed) state components.
    MinimizeStates,

    /// The (optionally indexed) control components.
    MinimizeControls,

    /// An arbitrary expression in the phase's state, control and parameter
    /// symbols.
    Custom(E),
}

/// The decision variables a resolved term acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    /// A pure selection of state components.
    States,

    /// A pure selection of control components.
    Controls,

    /// Any other expression.
    Expression,
}

/// A declared objective, before it is resolved against a phase.
#[derive(Debug, Clone)]
pub struct Objective<E> {
    pub(crate) kind: ObjectiveKind,
    pub(crate) penalty: Penalty<E>,
    pub(crate) weight: f64,
    pub(crate) index: Option<Vec<usize>>,
    pub(crate) node: Node,
    pub(crate) target: Option<Array2<f64>>,
}

impl<E> Objective<E> {
    /// A running objective, applied at [`Node::All`] with unit weight.
    #[must_use]
    pub fn lagrange(penalty: Penalty<E>) -> Self {
        Self::declare(ObjectiveKind::Lagrange, penalty, Node::All)
    }

    /// A terminal objective, applied at [`Node::End`] with unit weight.
    #[must_use]
    pub fn mayer(penalty: Penalty<E>) -> Self {
        Self::declare(ObjectiveKind::Mayer, penalty, Node::End)
    }

    /// An objective on free parameters, `residual` being an expression of the
    /// parameter symbols only.
    #[must_use]
    pub fn parameter(residual: E) -> Self {
        Self::declare(ObjectiveKind::Parameter, Penalty::Custom(residual), Node::End)
    }

    fn declare(kind: ObjectiveKind, penalty: Penalty<E>, node: Node) -> Self {
        Self {
            kind,
            penalty,
            weight: 1.0,
            index: None,
            node,
            target: None,
        }
    }

    #[must_use]
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Restricts a state or control penalty to the listed components.
    #[must_use]
    pub fn with_index(mut self, index: Vec<usize>) -> Self {
        self.index = Some(index);
        self
    }

    #[must_use]
    pub fn at(mut self, node: Node) -> Self {
        self.node = node;
        self
    }

    /// Sets one target column per node the term applies to.
    #[must_use]
    pub fn with_target(mut self, target: Array2<f64>) -> Self {
        self.target = Some(target);
        self
    }

    #[must_use]
    pub fn kind(&self) -> ObjectiveKind {
        self.kind
    }
}

/// A term evaluated at one node.
#[derive(Debug, Clone)]
pub struct Instance<E> {
    /// The node this instance belongs to.
    pub node: usize,

    /// The term's expression in that node's decision variables.
    pub value: E,

    /// The reference the value is driven towards, if any.
    pub target: Option<Array1<f64>>,
}

/// An objective resolved against a phase (or against the problem parameters).
///
/// `residual` is written in the node-agnostic model symbols; each instance is
/// that residual evaluated at one node.
#[derive(Debug, Clone)]
pub struct ObjectiveTerm<E> {
    kind: ObjectiveKind,
    quantity: Quantity,
    weight: f64,
    index: Option<Vec<usize>>,
    node: Node,
    residual: E,
    instances: Vec<Instance<E>>,
}

impl<E: Expr> ObjectiveTerm<E> {
    pub(crate) fn new(
        objective: Objective<E>,
        quantity: Quantity,
        residual: E,
        instances: Vec<Instance<E>>,
    ) -> Result<Self, Error> {
        let mut term = Self {
            kind: objective.kind,
            quantity,
            weight: objective.weight,
            index: objective.index,
            node: objective.node,
            residual,
            instances,
        };
        if let Some(target) = objective.target {
            term.retarget(target)?;
        }
        Ok(term)
    }

    /// Replaces the targets, one column per instance.
    ///
    /// # Errors
    ///
    /// Returns an error if `target` does not have one row per residual row
    /// and one column per instance.
    pub fn retarget(&mut self, target: Array2<f64>) -> Result<(), Error> {
        if target.nrows() != self.residual.numel() {
            return Err(Error::Rows {
                what: "objective target",
                expected: self.residual.numel(),
                found: target.nrows(),
            });
        }
        if target.ncols() != self.instances.len() {
            return Err(Error::Columns {
                what: "objective target",
                expected: self.instances.len(),
                found: target.ncols(),
            });
        }
        for (instance, column) in self.instances.iter_mut().zip(target.columns()) {
            instance.target = Some(column.to_owned());
        }
        Ok(())
    }

    #[must_use]
    pub fn kind(&self) -> ObjectiveKind {
        self.kind
    }

    #[must_use]
    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    #[must_use]
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// The selected components, `None` meaning all of them.
    #[must_use]
    pub fn index(&self) -> Option<&[usize]> {
        self.index.as_deref()
    }

    #[must_use]
    pub fn node(&self) -> &Node {
        &self.node
    }

    /// The node-agnostic residual expression.
    #[must_use]
    pub fn residual(&self) -> &E {
        &self.residual
    }

    #[must_use]
    pub fn instances(&self) -> &[Instance<E>] {
        &self.instances
    }

    #[must_use]
    pub fn is_targeted(&self) -> bool {
        self.instances.iter().any(|instance| instance.target.is_some())
    }
}
