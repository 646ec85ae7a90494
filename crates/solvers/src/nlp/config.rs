use crate::{ConfigurationError, OptionValue, Options};

/// Adapter-level key that turns on iteration history.
const RETURN_ITERATIONS: &str = "return_iterations";

/// Resolved options of the NLP adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    solver_options: Options,
    return_iterations: bool,
}

impl Config {
    /// The backend defaults, with every key under `prefix`.
    #[must_use]
    pub fn defaults(prefix: &str) -> Self {
        let solver_options = [
            ("tol", OptionValue::Float(1e-6)),
            ("max_iter", OptionValue::Int(1000)),
            ("hessian_approximation", OptionValue::from("exact")),
            ("limited_memory_max_history", OptionValue::Int(50)),
            ("linear_solver", OptionValue::from("mumps")),
        ]
        .into_iter()
        .map(|(key, value)| (format!("{prefix}{key}"), value))
        .collect();

        Self {
            solver_options,
            return_iterations: false,
        }
    }

    /// Overlays user options on the defaults.
    ///
    /// Keys without `prefix` are moved under it. `return_iterations` is kept
    /// by the adapter and never forwarded.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidOption`] if `return_iterations`
    /// is not a boolean.
    pub fn new(mut options: Options, prefix: &str) -> Result<Self, ConfigurationError> {
        let return_iterations = options.take_bool(RETURN_ITERATIONS)?.unwrap_or(false);

        let mut config = Self::defaults(prefix);
        for (key, value) in options {
            let key = if key.starts_with(prefix) {
                key
            } else {
                format!("{prefix}{key}")
            };
            config.solver_options.insert(key, value);
        }
        config.return_iterations = return_iterations;
        Ok(config)
    }

    /// The options forwarded to the backend.
    #[must_use]
    pub fn solver_options(&self) -> &Options {
        &self.solver_options
    }

    #[must_use]
    pub fn return_iterations(&self) -> bool {
        self.return_iterations
    }
}
