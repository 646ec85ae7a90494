use std::fmt;

use stride_core::{Bounds, Expr, Interval, Ocp};

use crate::{ConfigurationError, aggregate::single_phase};

/// The decision variables a numeric bound applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variable {
    States,
    Controls,
    Parameters,
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::States => "state",
            Self::Controls => "control",
            Self::Parameters => "parameter",
        })
    }
}

/// State bounds split by node: the first node, the interior nodes and the
/// last node.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundProfile {
    pub initial: Interval,
    pub path: Interval,
    pub terminal: Interval,
}

impl BoundProfile {
    /// The slot that applies at `node` of a horizon with `shooting_nodes`
    /// intervals.
    #[must_use]
    pub fn at(&self, node: usize, shooting_nodes: usize) -> &Interval {
        if node == 0 {
            &self.initial
        } else if node >= shooting_nodes {
            &self.terminal
        } else {
            &self.path
        }
    }
}

/// Numeric bounds in the structured solver's form.
///
/// `states` covers the augmented state `[p; x]`, with the parameter bounds
/// ahead of the state bounds in every slot. `controls` is shared by every
/// shooting node.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredBounds {
    pub states: BoundProfile,
    pub controls: Interval,
}

/// Builds the structured bound arrays of a single-phase problem.
///
/// # Errors
///
/// Returns a [`ConfigurationError`] if the problem does not have exactly one
/// phase, if any bound is infinite, if control bounds differ between shooting
/// nodes, or if state bounds differ between interior nodes.
pub fn structured_bounds<E: Expr>(ocp: &Ocp<E>) -> Result<StructuredBounds, ConfigurationError> {
    let phase = single_phase(ocp)?;
    let shooting_nodes = phase.shooting_nodes();

    let parameters = ocp.parameter_bounds();
    if !parameters.is_finite() {
        return Err(ConfigurationError::NonFiniteBounds {
            variable: Variable::Parameters,
        });
    }

    let states = profile(phase.x_bounds(), shooting_nodes + 1, Variable::States)?;
    let controls = profile(phase.u_bounds(), shooting_nodes, Variable::Controls)?;

    check_uniform(&controls, Variable::Controls, "shooting node")?;
    let interior = states.get(1..shooting_nodes).unwrap_or_default();
    check_uniform(interior, Variable::States, "interior node")?;

    let path = interior.first().unwrap_or(&states[0]);
    let with_parameters = |slot: &Interval| parameters.concatenate(slot);
    Ok(StructuredBounds {
        states: BoundProfile {
            initial: with_parameters(&states[0]),
            path: with_parameters(path),
            terminal: with_parameters(&states[shooting_nodes]),
        },
        controls: controls[0].clone(),
    })
}

/// Evaluates `bounds` at every node and checks they are finite.
fn profile(
    bounds: &Bounds,
    node_count: usize,
    variable: Variable,
) -> Result<Vec<Interval>, ConfigurationError> {
    let intervals = (0..node_count)
        .map(|node| bounds.at(node, node_count))
        .collect::<Result<Vec<_>, _>>()?;
    if intervals.iter().any(|interval| !interval.is_finite()) {
        return Err(ConfigurationError::NonFiniteBounds { variable });
    }
    Ok(intervals)
}

fn check_uniform(
    intervals: &[Interval],
    variable: Variable,
    scope: &'static str,
) -> Result<(), ConfigurationError> {
    match intervals.split_first() {
        Some((first, rest)) if !rest.iter().all(|interval| interval.bitwise_eq(first)) => {
            Err(ConfigurationError::NonUniformBounds { variable, scope })
        }
        _ => Ok(()),
    }
}
