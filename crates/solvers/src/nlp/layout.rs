use ndarray::{Array1, Array2, s};

use stride_core::{Expr, Interval, Ocp, Phase};

use crate::{PhaseTrajectory, assemble::concatenate_bounds};

/// Where each phase's variables sit in the flat decision vector.
///
/// The vector is the parameters, then for each phase its `N + 1` node states
/// followed by its `N` node controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Layout {
    parameters: usize,
    phases: Vec<PhaseSlots>,
    len: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PhaseSlots {
    nx: usize,
    nu: usize,
    shooting_nodes: usize,
    states: usize,
    controls: usize,
}

impl Layout {
    pub(crate) fn new<E: Expr>(ocp: &Ocp<E>) -> Self {
        let parameters = ocp.parameter_count();
        let mut offset = parameters;
        let phases = ocp
            .phases()
            .iter()
            .map(|phase| {
                let (nx, nu, n) = (phase.nx(), phase.nu(), phase.shooting_nodes());
                let slots = PhaseSlots {
                    nx,
                    nu,
                    shooting_nodes: n,
                    states: offset,
                    controls: offset + nx * (n + 1),
                };
                offset = slots.controls + nu * n;
                slots
            })
            .collect();

        Self {
            parameters,
            phases,
            len: offset,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// The symbolic decision vector.
    pub(crate) fn decision_vector<E: Expr>(ocp: &Ocp<E>) -> E {
        let mut parts = vec![ocp.parameter_symbol()];
        for phase in ocp.phases() {
            let symbols = phase.symbols();
            parts.extend(symbols.node_states.iter().cloned());
            parts.extend(symbols.node_controls.iter().cloned());
        }
        E::vertcat(&parts)
    }

    /// Bounds of the decision vector, node by node.
    pub(crate) fn bounds<E: Expr>(ocp: &Ocp<E>) -> Result<Interval, stride_core::Error> {
        let mut bounds = ocp.parameter_bounds();
        for phase in ocp.phases() {
            let n = phase.shooting_nodes();
            for node in 0..=n {
                bounds = concatenate_bounds(&bounds, &phase.x_bounds().at(node, n + 1)?);
            }
            for node in 0..n {
                bounds = concatenate_bounds(&bounds, &phase.u_bounds().at(node, n)?);
            }
        }
        Ok(bounds)
    }

    /// The start point, from the parameters' and phases' initial guesses.
    pub(crate) fn initial_guess<E: Expr>(ocp: &Ocp<E>) -> Result<Array1<f64>, stride_core::Error> {
        let mut values: Vec<f64> = ocp
            .parameters()
            .iter()
            .flat_map(|parameter| parameter.initial_guess().iter().copied())
            .collect();
        for phase in ocp.phases() {
            append_guess(&mut values, phase)?;
        }
        Ok(Array1::from(values))
    }

    /// Splits a solution vector into parameters and per-phase trajectories.
    pub(crate) fn unpack(&self, x: &Array1<f64>) -> (Array1<f64>, Vec<PhaseTrajectory>) {
        let parameters = x.slice(s![..self.parameters]).to_owned();
        let phases = self
            .phases
            .iter()
            .map(|slots| PhaseTrajectory {
                states: columns(x, slots.states, slots.nx, slots.shooting_nodes + 1),
                controls: columns(x, slots.controls, slots.nu, slots.shooting_nodes),
            })
            .collect();
        (parameters, phases)
    }
}

fn append_guess<E: Expr>(values: &mut Vec<f64>, phase: &Phase<E>) -> Result<(), stride_core::Error> {
    let n = phase.shooting_nodes();
    for node in 0..=n {
        values.extend(phase.x_init().evaluate_at(node, n + 1)?);
    }
    for node in 0..n {
        values.extend(phase.u_init().evaluate_at(node, n)?);
    }
    Ok(())
}

/// Reads `count` consecutive column vectors of length `rows` from `x`.
fn columns(x: &Array1<f64>, start: usize, rows: usize, count: usize) -> Array2<f64> {
    Array2::from_shape_fn((rows, count), |(row, column)| x[start + column * rows + row])
}
