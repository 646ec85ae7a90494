//! Constraint aggregation.

use stride_core::{Expr, Interval, Node, Ocp};

use crate::{
    ConfigurationError,
    aggregate::{at_model_state, single_phase},
    assemble::concatenate_bounds,
};

/// The requested constraint representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintMode {
    Flat,
    Structured,
}

/// An aggregated constraint set.
#[derive(Debug, Clone)]
pub enum ConstraintRepresentation<E> {
    Flat(FlatConstraints<E>),
    Structured(StructuredConstraints<E>),
}

/// Every constraint instance stacked with its bounds.
#[derive(Debug, Clone)]
pub struct FlatConstraints<E> {
    pub values: E,
    pub bounds: Interval,
}

/// The path constraint shared by every shooting node and the terminal
/// constraint, both in the phase's model symbols.
#[derive(Debug, Clone)]
pub struct StructuredConstraints<E> {
    pub path: E,
    pub path_bounds: Interval,
    pub terminal: E,
    pub terminal_bounds: Interval,
}

/// Aggregates the constraints of `ocp` in the requested representation.
///
/// # Errors
///
/// See [`structured`]. The flat form never fails.
pub fn aggregate<E: Expr>(
    ocp: &Ocp<E>,
    mode: ConstraintMode,
) -> Result<ConstraintRepresentation<E>, ConfigurationError> {
    match mode {
        ConstraintMode::Flat => Ok(ConstraintRepresentation::Flat(flat(ocp))),
        ConstraintMode::Structured => structured(ocp).map(ConstraintRepresentation::Structured),
    }
}

/// Stacks transcription defects, then every instance of every phase
/// constraint in declaration order.
#[must_use]
pub fn flat<E: Expr>(ocp: &Ocp<E>) -> FlatConstraints<E> {
    let mut values = Vec::new();
    let mut bounds = Interval::empty();

    for defect in ocp.defects() {
        values.push(defect.value().clone());
        bounds = concatenate_bounds(&bounds, defect.bounds());
    }
    for term in ocp.phases().iter().flat_map(|phase| phase.constraints()) {
        for instance in term.instances() {
            values.push(instance.value.clone());
            bounds = concatenate_bounds(&bounds, term.bounds());
        }
    }

    log::debug!("flat constraints have {} rows", bounds.len());
    FlatConstraints {
        values: E::vertcat(&values),
        bounds,
    }
}

/// Splits the constraints of a single-phase problem into the shared path
/// constraint and the terminal constraint.
///
/// Terms on all nodes feed the path constraint. When they also reach the
/// terminal node, that last instance is appended to the terminal constraint
/// too. Terms on the last node feed the terminal constraint only.
///
/// # Errors
///
/// Returns [`ConfigurationError::PhaseCount`] for multi-phase problems and
/// [`ConfigurationError::UnsupportedConstraintNode`] for terms declared on
/// any other node set.
pub fn structured<E: Expr>(ocp: &Ocp<E>) -> Result<StructuredConstraints<E>, ConfigurationError> {
    let phase = single_phase(ocp)?;
    let shooting_nodes = phase.shooting_nodes();

    let mut path = Vec::new();
    let mut path_bounds = Interval::empty();
    let mut terminal = Vec::new();
    let mut terminal_bounds = Interval::empty();

    for (index, term) in phase.constraints().iter().enumerate() {
        let terminal_instance = match term.node() {
            Node::All | Node::AllShooting => {
                path.push(term.residual().clone());
                path_bounds = concatenate_bounds(&path_bounds, term.bounds());
                term.instances().get(shooting_nodes)
            }
            Node::End => term.instances().last(),
            node @ Node::Specific(_) => {
                return Err(ConfigurationError::UnsupportedConstraintNode {
                    phase: 0,
                    term: index,
                    node: node.clone(),
                });
            }
        };

        if let Some(instance) = terminal_instance {
            terminal.push(at_model_state(phase, &instance.value));
            terminal_bounds = concatenate_bounds(&terminal_bounds, term.bounds());
        }
    }

    log::debug!(
        "structured constraints: {} path rows, {} terminal rows",
        path_bounds.len(),
        terminal_bounds.len()
    );
    Ok(StructuredConstraints {
        path: E::vertcat(&path),
        path_bounds,
        terminal: E::vertcat(&terminal),
        terminal_bounds,
    })
}
