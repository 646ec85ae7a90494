use crate::{Error, Expr, Instance, Interval, Node};

/// A declared path or terminal constraint `lower <= residual <= upper`.
#[derive(Debug, Clone)]
pub struct Constraint<E> {
    pub(crate) residual: E,
    pub(crate) node: Node,
    pub(crate) bounds: Interval,
}

impl<E: Expr> Constraint<E> {
    /// Declares a constraint on `residual`, an expression in the phase's
    /// state, control and parameter symbols.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Rows`] if `bounds` does not have one row per residual
    /// row.
    pub fn new(residual: E, node: Node, bounds: Interval) -> Result<Self, Error> {
        check_rows(&residual, &bounds)?;
        Ok(Self {
            residual,
            node,
            bounds,
        })
    }

    /// Declares an equality constraint `residual == 0`.
    ///
    /// # Errors
    ///
    /// See [`Constraint::new`].
    pub fn equality(residual: E, node: Node) -> Result<Self, Error> {
        let rows = residual.numel();
        Self::new(residual, node, Interval::fixed(vec![0.0; rows]))
    }
}

/// A constraint resolved against a phase.
#[derive(Debug, Clone)]
pub struct ConstraintTerm<E> {
    node: Node,
    residual: E,
    bounds: Interval,
    instances: Vec<Instance<E>>,
}

impl<E> ConstraintTerm<E> {
    pub(crate) fn new(constraint: Constraint<E>, instances: Vec<Instance<E>>) -> Self {
        Self {
            node: constraint.node,
            residual: constraint.residual,
            bounds: constraint.bounds,
            instances,
        }
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

    /// The bounds shared by every instance.
    #[must_use]
    pub fn bounds(&self) -> &Interval {
        &self.bounds
    }

    #[must_use]
    pub fn instances(&self) -> &[Instance<E>] {
        &self.instances
    }
}

/// A transcription defect, such as a multiple-shooting continuity gap,
/// already expressed in the decision variables of the flat problem.
///
/// Structured solvers integrate the dynamics themselves, so only the generic
/// NLP path consumes defects.
#[derive(Debug, Clone)]
pub struct Defect<E> {
    value: E,
    bounds: Interval,
}

impl<E: Expr> Defect<E> {
    /// # Errors
    ///
    /// Returns [`Error::Rows`] if `bounds` does not have one row per value row.
    pub fn new(value: E, bounds: Interval) -> Result<Self, Error> {
        check_rows(&value, &bounds)?;
        Ok(Self { value, bounds })
    }

    #[must_use]
    pub fn value(&self) -> &E {
        &self.value
    }

    #[must_use]
    pub fn bounds(&self) -> &Interval {
        &self.bounds
    }
}

fn check_rows<E: Expr>(residual: &E, bounds: &Interval) -> Result<(), Error> {
    if bounds.len() != residual.numel() {
        return Err(Error::Rows {
            what: "constraint bounds",
            expected: residual.numel(),
            found: bounds.len(),
        });
    }
    Ok(())
}
