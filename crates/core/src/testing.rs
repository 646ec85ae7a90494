//! A small reference [`Expr`] implementation and problem fixtures.
//!
//! [`Sx`] is a column of scalar expression trees with just enough constant
//! folding to keep substituted terms readable. It is meant for tests: it can
//! be compared structurally, and evaluated numerically once every symbol is
//! bound in an [`Env`].

use std::{collections::BTreeSet, collections::HashMap, rc::Rc};

use crate::{Bounds, Expr, InitialGuess, Phase, PhaseSymbols};

/// One scalar expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Const(f64),
    Sym(String),
    Add(Rc<Scalar>, Rc<Scalar>),
    Mul(Rc<Scalar>, Rc<Scalar>),
}

impl Scalar {
    fn eval(&self, env: &Env) -> Option<f64> {
        match self {
            Self::Const(value) => Some(*value),
            Self::Sym(name) => env.values.get(name).copied(),
            Self::Add(a, b) => Some(a.eval(env)? + b.eval(env)?),
            Self::Mul(a, b) => Some(a.eval(env)? * b.eval(env)?),
        }
    }

    fn collect_symbols(&self, into: &mut BTreeSet<String>) {
        match self {
            Self::Const(_) => {}
            Self::Sym(name) => {
                into.insert(name.clone());
            }
            Self::Add(a, b) | Self::Mul(a, b) => {
                a.collect_symbols(into);
                b.collect_symbols(into);
            }
        }
    }
}

fn add(a: &Rc<Scalar>, b: &Rc<Scalar>) -> Rc<Scalar> {
    match (a.as_ref(), b.as_ref()) {
        (Scalar::Const(x), Scalar::Const(y)) => Rc::new(Scalar::Const(x + y)),
        (Scalar::Const(zero), _) if *zero == 0.0 => Rc::clone(b),
        (_, Scalar::Const(zero)) if *zero == 0.0 => Rc::clone(a),
        _ => Rc::new(Scalar::Add(Rc::clone(a), Rc::clone(b))),
    }
}

fn mul(a: &Rc<Scalar>, b: &Rc<Scalar>) -> Rc<Scalar> {
    match (a.as_ref(), b.as_ref()) {
        (Scalar::Const(x), Scalar::Const(y)) => Rc::new(Scalar::Const(x * y)),
        (Scalar::Const(zero), _) | (_, Scalar::Const(zero)) if *zero == 0.0 => {
            Rc::new(Scalar::Const(0.0))
        }
        (Scalar::Const(one), _) if *one == 1.0 => Rc::clone(b),
        (_, Scalar::Const(one)) if *one == 1.0 => Rc::clone(a),
        _ => Rc::new(Scalar::Mul(Rc::clone(a), Rc::clone(b))),
    }
}

fn constant(value: f64) -> Rc<Scalar> {
    Rc::new(Scalar::Const(value))
}

fn replace(scalar: &Rc<Scalar>, map: &HashMap<String, Rc<Scalar>>) -> Rc<Scalar> {
    match scalar.as_ref() {
        Scalar::Const(_) => Rc::clone(scalar),
        Scalar::Sym(name) => map.get(name).map_or_else(|| Rc::clone(scalar), Rc::clone),
        Scalar::Add(a, b) => add(&replace(a, map), &replace(b, map)),
        Scalar::Mul(a, b) => mul(&replace(a, map), &replace(b, map)),
    }
}

/// A column of scalar expression trees.
#[derive(Debug, Clone, PartialEq)]
pub struct Sx(Vec<Rc<Scalar>>);

impl Sx {
    /// A column of `rows` free symbols named `{name}_0`, `{name}_1`, ...
    #[must_use]
    pub fn sym(name: &str, rows: usize) -> Self {
        Self(
            (0..rows)
                .map(|row| Rc::new(Scalar::Sym(format!("{name}_{row}"))))
                .collect(),
        )
    }

    /// A column of constants.
    #[must_use]
    pub fn constant(values: &[f64]) -> Self {
        Self(values.iter().map(|&v| constant(v)).collect())
    }

    /// Row-wise sum.
    ///
    /// # Panics
    ///
    /// Panics if the row counts differ.
    #[must_use]
    pub fn add(&self, other: &Self) -> Self {
        assert_eq!(self.0.len(), other.0.len(), "row count mismatch");
        Self(self.0.iter().zip(&other.0).map(|(a, b)| add(a, b)).collect())
    }

    /// Row-wise product.
    ///
    /// # Panics
    ///
    /// Panics if the row counts differ.
    #[must_use]
    pub fn mul(&self, other: &Self) -> Self {
        assert_eq!(self.0.len(), other.0.len(), "row count mismatch");
        Self(self.0.iter().zip(&other.0).map(|(a, b)| mul(a, b)).collect())
    }

    /// Evaluates every row, or `None` if a symbol is unbound.
    #[must_use]
    pub fn eval(&self, env: &Env) -> Option<Vec<f64>> {
        self.0.iter().map(|row| row.eval(env)).collect()
    }

    /// The names of the free symbols the column depends on.
    #[must_use]
    pub fn symbols(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        for row in &self.0 {
            row.collect_symbols(&mut names);
        }
        names
    }
}

impl Expr for Sx {
    fn zeros(rows: usize) -> Self {
        Self(vec![constant(0.0); rows])
    }

    fn numel(&self) -> usize {
        self.0.len()
    }

    fn vertcat(parts: &[Self]) -> Self {
        Self(parts.iter().flat_map(|part| part.0.iter().cloned()).collect())
    }

    fn select(&self, rows: &[usize]) -> Self {
        Self(rows.iter().map(|&row| Rc::clone(&self.0[row])).collect())
    }

    fn substitute(&self, symbols: &[Self], values: &[Self]) -> Self {
        let mut map = HashMap::new();
        for (symbol, value) in symbols.iter().zip(values) {
            for (row, replacement) in symbol.0.iter().zip(&value.0) {
                if let Scalar::Sym(name) = row.as_ref() {
                    map.insert(name.clone(), Rc::clone(replacement));
                }
            }
        }
        Self(self.0.iter().map(|row| replace(row, &map)).collect())
    }

    fn offset(&self, values: &[f64]) -> Self {
        Self(
            self.0
                .iter()
                .zip(values)
                .map(|(row, &value)| add(row, &constant(-value)))
                .collect(),
        )
    }

    fn sum(&self) -> Self {
        let total = self.0.iter().fold(constant(0.0), |acc, row| add(&acc, row));
        Self(vec![total])
    }

    fn sum_squares(&self) -> Self {
        let total = self
            .0
            .iter()
            .fold(constant(0.0), |acc, row| add(&acc, &mul(row, row)));
        Self(vec![total])
    }

    fn scale(&self, factor: f64) -> Self {
        let factor = constant(factor);
        Self(self.0.iter().map(|row| mul(&factor, row)).collect())
    }

    fn depends_on(&self, symbol: &Self) -> bool {
        let names = symbol.symbols();
        !names.is_empty() && !self.symbols().is_disjoint(&names)
    }
}

/// Numeric values bound to symbol names.
#[derive(Debug, Clone, Default)]
pub struct Env {
    values: HashMap<String, f64>,
}

impl Env {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds each row of `symbol` to the matching entry of `values`.
    ///
    /// Rows of `symbol` that are not free symbols are skipped.
    #[must_use]
    pub fn bind(mut self, symbol: &Sx, values: &[f64]) -> Self {
        for (row, &value) in symbol.0.iter().zip(values) {
            if let Scalar::Sym(name) = row.as_ref() {
                self.values.insert(name.clone(), value);
            }
        }
        self
    }
}

/// A phase with `nx` states, `nu` controls and `n` shooting intervals.
///
/// The model symbols are `x` and `u`, the node variables `X{k}` and `U{k}`.
/// Dynamics are `x' = -x`, every bound is `[-10, 10]` and guesses are zero.
///
/// # Panics
///
/// Panics if `n` is zero.
#[must_use]
pub fn phase(nx: usize, nu: usize, n: usize) -> Phase<Sx> {
    named_phase("", nx, nu, n)
}

/// Like [`phase`], with every node variable name prefixed by `prefix`.
///
/// Phases of one multi-phase problem need distinct prefixes so an [`Env`]
/// can bind them all.
///
/// # Panics
///
/// Panics if `n` is zero.
#[must_use]
pub fn named_phase(prefix: &str, nx: usize, nu: usize, n: usize) -> Phase<Sx> {
    let symbols = PhaseSymbols {
        state: Sx::sym(&format!("{prefix}x"), nx),
        control: Sx::sym(&format!("{prefix}u"), nu),
        node_states: (0..=n).map(|k| Sx::sym(&format!("{prefix}X{k}"), nx)).collect(),
        node_controls: (0..n).map(|k| Sx::sym(&format!("{prefix}U{k}"), nu)).collect(),
    };
    let box_bounds = |rows: usize| {
        Bounds::constant(&vec![-10.0; rows], &vec![10.0; rows]).expect("equal lengths")
    };

    Phase::new(
        symbols,
        |x: &Sx, _u: &Sx, _p: &Sx| x.scale(-1.0),
        1.0,
        box_bounds(nx),
        box_bounds(nu),
        InitialGuess::constant(&vec![0.0; nx]),
        InitialGuess::constant(&vec![0.0; nu]),
    )
    .expect("fixture phase is consistent")
}
