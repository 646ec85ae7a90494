use ndarray::{Array1, Array2};

use stride_core::{Expr, Interval, Ocp};

use crate::{
    ConfigurationError, Options,
    aggregate::{
        CostLedger, StructuredBounds,
        constraint,
        objective::{self, CostFamily},
        single_phase, structured_bounds,
    },
};

use super::Construction;

/// Sizes that fix a constructed solver.
///
/// `nx` counts the augmented state `[p; x]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub nx: usize,
    pub nu: usize,
    pub np: usize,
    pub shooting_nodes: usize,
    pub ny: usize,
    pub ny_e: usize,
    pub nh: usize,
    pub nh_e: usize,
}

impl Dimensions {
    /// The first size that differs from `other`, as `(name, self, other)`.
    #[must_use]
    pub fn first_difference(&self, other: &Self) -> Option<(&'static str, usize, usize)> {
        [
            ("state dimension", self.nx, other.nx),
            ("control dimension", self.nu, other.nu),
            ("parameter dimension", self.np, other.np),
            ("shooting node count", self.shooting_nodes, other.shooting_nodes),
            ("running residual size", self.ny, other.ny),
            ("terminal residual size", self.ny_e, other.ny_e),
            ("path constraint size", self.nh, other.nh),
            ("terminal constraint size", self.nh_e, other.nh_e),
        ]
        .into_iter()
        .find(|(_, mine, theirs)| mine != theirs)
    }
}

/// The explicit ODE `x' = f_expl(x, u)` over the augmented state.
#[derive(Debug, Clone)]
pub struct Model<E> {
    pub name: String,
    pub x: E,
    pub u: E,
    pub f_expl: E,
}

/// Least-squares residuals, either as selections or as expressions.
#[derive(Debug, Clone)]
pub enum CostDefinition<E> {
    LinearLs {
        vx: Array2<f64>,
        vu: Array2<f64>,
        vx_e: Array2<f64>,
    },
    NonlinearLs {
        y_expr: E,
        y_expr_e: E,
    },
}

/// Everything the backend needs to generate a solver.
#[derive(Debug, Clone)]
pub struct Definition<E> {
    pub dimensions: Dimensions,
    pub final_time: f64,
    pub model: Model<E>,
    pub cost: CostDefinition<E>,
    pub w: Array2<f64>,
    pub w_e: Array2<f64>,
    pub constr_type: String,
    pub h: E,
    pub h_e: E,
    pub path_bounds: Interval,
    pub terminal_bounds: Interval,
    pub bounds: StructuredBounds,
    pub solver_options: Options,
    pub acados_dir: Option<String>,
}

/// The data pushed to each node before every solve.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeData {
    /// One running reference per shooting node, empty without running costs.
    pub references: Vec<Array1<f64>>,
    pub terminal_reference: Option<Array1<f64>>,
    /// Initial augmented states, `N + 1` of them.
    pub x_init: Vec<Array1<f64>>,
    pub u_init: Vec<Array1<f64>>,
}

/// A single-phase problem in the structured solver's form.
#[derive(Debug, Clone)]
pub struct Transcription<E> {
    pub definition: Definition<E>,
    pub nodes: NodeData,
}

/// Aggregates costs, constraints and bounds of `ocp` and lays them out for
/// the structured solver.
///
/// # Errors
///
/// Returns a [`ConfigurationError`] if any part of the problem cannot be
/// expressed in the structured form.
pub fn transcribe<E: Expr>(
    ocp: &Ocp<E>,
    construction: &Construction,
    solver_options: &Options,
    model_name: &str,
) -> Result<Transcription<E>, ConfigurationError> {
    let phase = single_phase(ocp)?;
    let n = phase.shooting_nodes();
    let np = ocp.parameter_count();
    let symbols = phase.symbols();

    let costs = objective::least_squares(ocp, construction.cost)?;
    let constraints = constraint::structured(ocp)?;
    let bounds = structured_bounds(ocp)?;

    let parameters = ocp.parameter_symbol();
    let model = Model {
        name: model_name.to_owned(),
        x: E::vertcat(&[parameters.clone(), symbols.state.clone()]),
        u: symbols.control.clone(),
        f_expl: E::vertcat(&[E::zeros(np), phase.dynamics(&parameters)]),
    };

    let (cost, w, w_e) = match construction.cost {
        CostFamily::LinearLs => (
            CostDefinition::LinearLs {
                vx: selection(costs.running.vx(), phase.nx()),
                vu: selection(costs.running.vu(), phase.nu()),
                vx_e: selection(costs.terminal.vx(), phase.nx()),
            },
            costs.running.weights(),
            costs.terminal.weights(),
        ),
        CostFamily::NonlinearLs => {
            let (y_expr, w) = residual_or_placeholder(&costs.running);
            let (y_expr_e, w_e) = residual_or_placeholder(&costs.terminal);
            (CostDefinition::NonlinearLs { y_expr, y_expr_e }, w, w_e)
        }
    };

    let dimensions = Dimensions {
        nx: phase.nx() + np,
        nu: phase.nu(),
        np,
        shooting_nodes: n,
        ny: w.nrows(),
        ny_e: w_e.nrows(),
        nh: constraints.path.numel(),
        nh_e: constraints.terminal.numel(),
    };

    let parameter_init = parameter_initial_guess(ocp);
    let x_init = (0..=n)
        .map(|node| {
            let state = phase.x_init().evaluate_at(node, n + 1)?;
            Ok(parameter_init.iter().chain(&state).copied().collect())
        })
        .collect::<Result<Vec<Array1<f64>>, stride_core::Error>>()?;
    let u_init = (0..n)
        .map(|node| phase.u_init().evaluate_at(node, n))
        .collect::<Result<Vec<_>, _>>()?;

    let nodes = NodeData {
        references: if costs.running.is_empty() {
            Vec::new()
        } else {
            (0..n).map(|node| costs.running.reference(node)).collect()
        },
        terminal_reference: (!costs.terminal.is_empty()).then(|| costs.terminal.reference(0)),
        x_init,
        u_init,
    };

    log::debug!(
        "structured problem: nx {}, nu {}, N {}, ny {}, ny_e {}, nh {}, nh_e {}",
        dimensions.nx,
        dimensions.nu,
        n,
        dimensions.ny,
        dimensions.ny_e,
        dimensions.nh,
        dimensions.nh_e
    );

    Ok(Transcription {
        definition: Definition {
            dimensions,
            final_time: phase.final_time(),
            model,
            cost,
            w,
            w_e,
            constr_type: construction.constr_type.clone(),
            h: constraints.path,
            h_e: constraints.terminal,
            path_bounds: constraints.path_bounds,
            terminal_bounds: constraints.terminal_bounds,
            bounds,
            solver_options: solver_options.clone(),
            acados_dir: construction.acados_dir.clone(),
        },
        nodes,
    })
}

/// Every block of a linear ledger carries a selection.
fn selection(stacked: Option<Array2<f64>>, columns: usize) -> Array2<f64> {
    stacked.unwrap_or_else(|| Array2::zeros((0, columns)))
}

/// The ledger's residual and weights, or a one-row zero residual with zero
/// weight when the ledger is empty.
fn residual_or_placeholder<E: Expr>(ledger: &CostLedger<E>) -> (E, Array2<f64>) {
    if ledger.is_empty() {
        (E::zeros(1), Array2::zeros((1, 1)))
    } else {
        (ledger.residual(), ledger.weights())
    }
}

fn parameter_initial_guess<E: Expr>(ocp: &Ocp<E>) -> Array1<f64> {
    ocp.parameters()
        .iter()
        .flat_map(|parameter| parameter.initial_guess().iter().copied())
        .collect()
}
