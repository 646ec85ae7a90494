use crate::{ConfigurationError, Options, aggregate::objective::CostFamily};

use super::Error;

/// Solver options that may still change once the solver exists.
pub const EDITABLE_OPTIONS: &[&str] = &[
    "nlp_solver_tol_comp",
    "nlp_solver_tol_eq",
    "nlp_solver_tol_ineq",
    "nlp_solver_tol_stat",
];

/// Options only meaningful when the adapter is created.
const CONSTRUCTION_KEYS: &[&str] = &["acados_dir", "cost_type", "constr_type"];

/// How the structured solver is built: cost family, constraint type and
/// where the solver's code generator lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Construction {
    pub cost: CostFamily,
    pub constr_type: String,
    pub acados_dir: Option<String>,
}

impl Default for Construction {
    fn default() -> Self {
        Self {
            cost: CostFamily::NonlinearLs,
            constr_type: "BGH".to_owned(),
            acados_dir: None,
        }
    }
}

impl Construction {
    /// Reads `cost_type`, `constr_type` and `acados_dir` from `options`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotImplemented`] for the `EXTERNAL` cost type and a
    /// configuration error for any other unknown cost type or for a value
    /// that is not text.
    pub fn new(mut options: Options) -> Result<Self, Error> {
        let defaults = Self::default();
        let cost = match options.take_text("cost_type")?.as_deref() {
            None | Some("NONLINEAR_LS") => CostFamily::NonlinearLs,
            Some("LINEAR_LS") => CostFamily::LinearLs,
            Some("EXTERNAL") => return Err(Error::NotImplemented("the EXTERNAL cost type")),
            Some(other) => return Err(ConfigurationError::UnknownCostType(other.to_owned()).into()),
        };
        Ok(Self {
            cost,
            constr_type: options.take_text("constr_type")?.unwrap_or(defaults.constr_type),
            acados_dir: options.take_text("acados_dir")?,
        })
    }

    /// The cost type name the solver expects.
    #[must_use]
    pub fn cost_type(&self) -> &'static str {
        match self.cost {
            CostFamily::LinearLs => "LINEAR_LS",
            CostFamily::NonlinearLs => "NONLINEAR_LS",
        }
    }
}

/// Solver options applied when the solver is created.
#[must_use]
pub fn default_solver_options() -> Options {
    Options::new()
        .with("qp_solver", "PARTIAL_CONDENSING_HPIPM")
        .with("hessian_approx", "GAUSS_NEWTON")
        .with("integrator_type", "IRK")
        .with("nlp_solver_type", "SQP")
        .with("nlp_solver_tol_comp", 1e-6)
        .with("nlp_solver_tol_eq", 1e-6)
        .with("nlp_solver_tol_ineq", 1e-6)
        .with("nlp_solver_tol_stat", 1e-6)
        .with("nlp_solver_max_iter", 200)
        .with("sim_method_newton_iter", 5)
        .with("sim_method_num_stages", 4)
        .with("sim_method_num_steps", 1)
        .with("print_level", 1)
}

/// Drops construction-only keys, which `configure` ignores.
pub(crate) fn without_construction_keys(mut options: Options) -> Options {
    for key in CONSTRUCTION_KEYS {
        options.remove(key);
    }
    options
}

/// Maps an editable option to the key the constructed solver expects.
///
/// # Errors
///
/// Returns [`ConfigurationError::UnsupportedOption`] for keys that cannot
/// change after construction.
pub(crate) fn editable_key(key: &str) -> Result<&str, ConfigurationError> {
    if EDITABLE_OPTIONS.contains(&key) {
        Ok(key.strip_prefix("nlp_solver_").unwrap_or(key))
    } else {
        Err(ConfigurationError::UnsupportedOption {
            key: key.to_owned(),
            allowed: EDITABLE_OPTIONS,
        })
    }
}
