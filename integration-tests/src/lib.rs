//! Shared problems and numeric helpers for the cross-crate scenarios.
//!
//! Everything here uses the reference [`Sx`] expression from
//! `stride_core::testing`, so transcribed expressions can be evaluated at a
//! concrete trajectory and compared across representations.

use ndarray::{Array1, Array2, array};

use stride_core::{
    Bounds, Expr, InitialGuess, Objective, Ocp, Penalty, Phase, PhaseSymbols,
    testing::{self, Env, Sx},
};
use stride_solvers::aggregate::{CostLedger, objective::CostFamily};

/// One phase, `nx = 4, nu = 2, N = 3`: controls penalized on every shooting
/// node with weight 1, states 0 and 1 driven to zero at the end.
#[must_use]
pub fn reference_ocp() -> Ocp<Sx> {
    let mut phase = testing::phase(4, 2, 3);
    phase
        .add_objective(Objective::lagrange(Penalty::MinimizeControls))
        .expect("control penalty fits the phase");
    phase
        .add_objective(
            Objective::mayer(Penalty::MinimizeStates)
                .with_index(vec![0, 1])
                .with_target(array![[0.0], [0.0]]),
        )
        .expect("terminal penalty fits the phase");
    Ocp::new(vec![phase]).expect("one phase")
}

/// Like [`testing::phase`], with explicit state and control bounds.
///
/// # Panics
///
/// Panics if the bounds do not match the dimensions or node counts.
#[must_use]
pub fn bounded_phase(nx: usize, nu: usize, n: usize, x_bounds: Bounds, u_bounds: Bounds) -> Phase<Sx> {
    let symbols = PhaseSymbols {
        state: Sx::sym("x", nx),
        control: Sx::sym("u", nu),
        node_states: (0..=n).map(|k| Sx::sym(&format!("X{k}"), nx)).collect(),
        node_controls: (0..n).map(|k| Sx::sym(&format!("U{k}"), nu)).collect(),
    };
    Phase::new(
        symbols,
        |x: &Sx, _u: &Sx, _p: &Sx| x.scale(-1.0),
        1.0,
        x_bounds,
        u_bounds,
        InitialGuess::constant(&vec![0.0; nx]),
        InitialGuess::constant(&vec![0.0; nu]),
    )
    .expect("bounds match the phase")
}

/// A deterministic, non-trivial trajectory for `phase`.
///
/// States are `nx × (N + 1)`, controls `nu × N`.
#[must_use]
pub fn trajectory(phase: &Phase<Sx>) -> (Array2<f64>, Array2<f64>) {
    let n = phase.shooting_nodes();
    #[allow(clippy::cast_precision_loss)]
    let states = Array2::from_shape_fn((phase.nx(), n + 1), |(i, k)| {
        0.5 + i as f64 - 0.75 * k as f64
    });
    #[allow(clippy::cast_precision_loss)]
    let controls = Array2::from_shape_fn((phase.nu(), n), |(i, k)| 1.0 - i as f64 + 0.25 * k as f64);
    (states, controls)
}

/// Binds every node variable of `phase` to the trajectory.
#[must_use]
pub fn node_env(phase: &Phase<Sx>, states: &Array2<f64>, controls: &Array2<f64>) -> Env {
    let symbols = phase.symbols();
    let env = symbols
        .node_states
        .iter()
        .zip(states.columns())
        .fold(Env::new(), |env, (symbol, column)| env.bind(symbol, &column.to_vec()));
    symbols
        .node_controls
        .iter()
        .zip(controls.columns())
        .fold(env, |env, (symbol, column)| env.bind(symbol, &column.to_vec()))
}

/// Binds the model symbols of `phase` to one node's state and control.
#[must_use]
pub fn model_env(phase: &Phase<Sx>, state: &Array1<f64>, control: &Array1<f64>) -> Env {
    let symbols = phase.symbols();
    Env::new()
        .bind(&symbols.state, &state.to_vec())
        .bind(&symbols.control, &control.to_vec())
}

/// Which nodes a cost ledger is evaluated on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Every shooting node.
    Running,

    /// The last node.
    Terminal,
}

/// Evaluates `Σ (y − y_ref)ᵀ W (y − y_ref)` of one ledger over the
/// trajectory.
///
/// Linear ledgers use their selection matrices, nonlinear ones their
/// residual expression.
///
/// # Panics
///
/// Panics if the residual has unbound symbols or a linear ledger has no
/// selection.
#[must_use]
pub fn ledger_cost(
    ledger: &CostLedger<Sx>,
    stage: Stage,
    family: CostFamily,
    phase: &Phase<Sx>,
    states: &Array2<f64>,
    controls: &Array2<f64>,
) -> f64 {
    if ledger.is_empty() {
        return 0.0;
    }

    let n = phase.shooting_nodes();
    let nodes: Vec<usize> = match stage {
        Stage::Running => (0..n).collect(),
        Stage::Terminal => vec![n],
    };
    let weights = ledger.weights();

    nodes
        .iter()
        .enumerate()
        .map(|(slot, &node)| {
            let state = states.column(node).to_owned();
            let control = if node < n {
                controls.column(node).to_owned()
            } else {
                Array1::zeros(phase.nu())
            };
            let y = match family {
                CostFamily::LinearLs => {
                    let vx = ledger.vx().expect("linear ledger has selections");
                    let vu = ledger.vu().expect("linear ledger has selections");
                    vx.dot(&state) + vu.dot(&control)
                }
                CostFamily::NonlinearLs => {
                    let env = model_env(phase, &state, &control);
                    Array1::from(ledger.residual().eval(&env).expect("residual is bound"))
                }
            };
            let error = y - ledger.reference(slot);
            error.dot(&weights.dot(&error))
        })
        .sum()
}
