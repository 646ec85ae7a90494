use ndarray::Array1;

use crate::{Error, Expr, Interval};

/// A free parameter optimized alongside the trajectories, shared by every
/// phase (a segment mass, a stiffness, ...).
#[derive(Debug, Clone)]
pub struct Parameter<E> {
    name: String,
    symbol: E,
    bounds: Interval,
    initial_guess: Array1<f64>,
}

impl<E: Expr> Parameter<E> {
    /// # Errors
    ///
    /// Returns [`Error::Rows`] if `bounds` or `initial_guess` do not have one
    /// row per symbol row.
    pub fn new(
        name: impl Into<String>,
        symbol: E,
        bounds: Interval,
        initial_guess: impl Into<Array1<f64>>,
    ) -> Result<Self, Error> {
        let initial_guess = initial_guess.into();
        let rows = symbol.numel();
        if bounds.len() != rows {
            return Err(Error::Rows {
                what: "parameter bounds",
                expected: rows,
                found: bounds.len(),
            });
        }
        if initial_guess.len() != rows {
            return Err(Error::Rows {
                what: "parameter initial guess",
                expected: rows,
                found: initial_guess.len(),
            });
        }
        Ok(Self {
            name: name.into(),
            symbol,
            bounds,
            initial_guess,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn symbol(&self) -> &E {
        &self.symbol
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.symbol.numel()
    }

    #[must_use]
    pub fn bounds(&self) -> &Interval {
        &self.bounds
    }

    #[must_use]
    pub fn initial_guess(&self) -> &Array1<f64> {
        &self.initial_guess
    }

    /// Returns `true` for the phase-duration parameters of free-time
    /// problems, named `time_phase_<n>`.
    #[must_use]
    pub fn is_phase_time(&self) -> bool {
        self.name
            .strip_prefix("time_phase_")
            .is_some_and(|phase| !phase.is_empty() && phase.bytes().all(|b| b.is_ascii_digit()))
    }
}
