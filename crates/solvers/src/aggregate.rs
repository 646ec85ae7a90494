//! Objective and constraint aggregation.
//!
//! The aggregators walk an [`Ocp`]'s terms in declaration order and produce
//! either a flat stack of expressions (for the [`nlp`](crate::nlp) adapter) or
//! the per-node least-squares and bound form of the
//! [`multiple_shooting`](crate::multiple_shooting) adapter.
//!
//! They are re-run on every solve, since targets may change between solves.

mod bounds;
mod ledger;

pub mod constraint;
pub mod objective;

pub use bounds::{BoundProfile, StructuredBounds, Variable, structured_bounds};
pub use ledger::{CostBlock, CostLedger, Selection};

use stride_core::{Expr, Ocp, Phase};

use crate::ConfigurationError;

/// Returns the only phase of a single-phase problem.
pub(crate) fn single_phase<E: Expr>(ocp: &Ocp<E>) -> Result<&Phase<E>, ConfigurationError> {
    match ocp.phases() {
        [phase] => Ok(phase),
        phases => Err(ConfigurationError::PhaseCount {
            supported: 1,
            found: phases.len(),
        }),
    }
}

/// Rewrites a terminal-node instance in the phase's model state symbol.
///
/// Structured solvers evaluate terminal costs and constraints on the model
/// state, so the last node's decision state is substituted back.
pub(crate) fn at_model_state<E: Expr>(phase: &Phase<E>, value: &E) -> E {
    let symbols = phase.symbols();
    let last = &symbols.node_states[phase.shooting_nodes()];
    value.substitute(
        std::slice::from_ref(last),
        std::slice::from_ref(&symbols.state),
    )
}
