//! Numeric bound and initial-guess profiles.
//!
//! A profile stores a few columns of values and an [`Interpolation`] that says
//! how those columns map onto the nodes of a horizon.

use ndarray::{Array1, Array2, Zip};

use crate::Error;

/// How the columns of a profile map onto nodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Interpolation {
    /// One column used at every node.
    #[default]
    Constant,

    /// Three columns: the first node, every interior node, the last node.
    ConstantWithFirstAndLastDifferent,

    /// Two columns linearly interpolated from the first to the last node.
    Linear,

    /// One column per node.
    EachNode,
}

impl Interpolation {
    /// Returns the number of columns a profile needs over `node_count` nodes.
    #[must_use]
    pub fn columns(self, node_count: usize) -> usize {
        match self {
            Self::Constant => 1,
            Self::Linear => 2,
            Self::ConstantWithFirstAndLastDifferent => 3,
            Self::EachNode => node_count,
        }
    }

    /// Evaluates `values` at `node` of a horizon with `node_count` nodes.
    ///
    /// `values` must have [`Interpolation::columns`] columns and `node` must be
    /// below `node_count`.
    fn evaluate(self, values: &Array2<f64>, node: usize, node_count: usize) -> Array1<f64> {
        match self {
            Self::Constant => values.column(0).to_owned(),
            Self::ConstantWithFirstAndLastDifferent => {
                let column = if node == 0 {
                    0
                } else if node + 1 == node_count {
                    2
                } else {
                    1
                };
                values.column(column).to_owned()
            }
            Self::Linear => {
                if node_count <= 1 {
                    return values.column(0).to_owned();
                }
                #[allow(clippy::cast_precision_loss)]
                let fraction = node as f64 / (node_count - 1) as f64;
                let first = values.column(0);
                let last = values.column(1);
                Zip::from(&first)
                    .and(&last)
                    .map_collect(|a, b| a + (b - a) * fraction)
            }
            Self::EachNode => values.column(node).to_owned(),
        }
    }

    fn check(self, what: &'static str, values: &Array2<f64>, node_count: usize) -> Result<(), Error> {
        let expected = self.columns(node_count);
        if values.ncols() != expected {
            return Err(Error::Columns {
                what,
                expected,
                found: values.ncols(),
            });
        }
        Ok(())
    }
}

/// A `(lower, upper)` pair of equal-length vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct Interval {
    lower: Array1<f64>,
    upper: Array1<f64>,
}

impl Interval {
    /// Creates an interval.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Rows`] if `lower` and `upper` differ in length.
    pub fn new(lower: impl Into<Array1<f64>>, upper: impl Into<Array1<f64>>) -> Result<Self, Error> {
        let lower = lower.into();
        let upper = upper.into();
        if lower.len() != upper.len() {
            return Err(Error::Rows {
                what: "upper bound",
                expected: lower.len(),
                found: upper.len(),
            });
        }
        Ok(Self { lower, upper })
    }

    /// An interval with no rows.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            lower: Array1::zeros(0),
            upper: Array1::zeros(0),
        }
    }

    /// An interval pinning every row to `values`.
    #[must_use]
    pub fn fixed(values: impl Into<Array1<f64>>) -> Self {
        let values = values.into();
        Self {
            lower: values.clone(),
            upper: values,
        }
    }

    /// An interval with `rows` unbounded rows.
    #[must_use]
    pub fn unbounded(rows: usize) -> Self {
        Self {
            lower: Array1::from_elem(rows, f64::NEG_INFINITY),
            upper: Array1::from_elem(rows, f64::INFINITY),
        }
    }

    #[must_use]
    pub fn lower(&self) -> &Array1<f64> {
        &self.lower
    }

    #[must_use]
    pub fn upper(&self) -> &Array1<f64> {
        &self.upper
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lower.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }

    /// Returns `true` if every lower and upper value is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.lower.iter().chain(self.upper.iter()).all(|v| v.is_finite())
    }

    /// Returns `self` stacked on top of `other`.
    #[must_use]
    pub fn concatenate(&self, other: &Self) -> Self {
        Self {
            lower: stack(&self.lower, &other.lower),
            upper: stack(&self.upper, &other.upper),
        }
    }

    /// Returns `true` if both intervals hold bit-identical values.
    #[must_use]
    pub fn bitwise_eq(&self, other: &Self) -> bool {
        let same = |a: &Array1<f64>, b: &Array1<f64>| {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
        };
        same(&self.lower, &other.lower) && same(&self.upper, &other.upper)
    }
}

fn stack(top: &Array1<f64>, bottom: &Array1<f64>) -> Array1<f64> {
    top.iter().chain(bottom).copied().collect()
}

/// Node-varying lower and upper bounds of a state or control vector.
///
/// Both matrices have one row per component and
/// [`Interpolation::columns`] columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    lower: Array2<f64>,
    upper: Array2<f64>,
    interpolation: Interpolation,
}

impl Bounds {
    /// Creates bounds from column profiles.
    ///
    /// # Errors
    ///
    /// Returns an error if `lower` and `upper` differ in shape, or if a
    /// fixed-width interpolation receives the wrong number of columns.
    pub fn new(
        lower: Array2<f64>,
        upper: Array2<f64>,
        interpolation: Interpolation,
    ) -> Result<Self, Error> {
        if lower.nrows() != upper.nrows() {
            return Err(Error::Rows {
                what: "upper bounds",
                expected: lower.nrows(),
                found: upper.nrows(),
            });
        }
        if lower.ncols() != upper.ncols() {
            return Err(Error::Columns {
                what: "upper bounds",
                expected: lower.ncols(),
                found: upper.ncols(),
            });
        }
        if interpolation != Interpolation::EachNode {
            interpolation.check("bounds", &lower, 0)?;
        }
        Ok(Self {
            lower,
            upper,
            interpolation,
        })
    }

    /// The same `(lower, upper)` at every node.
    ///
    /// # Errors
    ///
    /// Returns an error if `lower` and `upper` differ in length.
    pub fn constant(lower: &[f64], upper: &[f64]) -> Result<Self, Error> {
        Self::new(column(lower), column(upper), Interpolation::Constant)
    }

    /// Returns the number of components.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.lower.nrows()
    }

    #[must_use]
    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    /// Checks that the profile covers a horizon of `node_count` nodes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Columns`] on a column count mismatch.
    pub fn check_nodes(&self, node_count: usize) -> Result<(), Error> {
        self.interpolation.check("bounds", &self.lower, node_count)
    }

    /// Returns the interval that applies at `node`.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile does not cover `node_count` nodes or if
    /// `node` is past the last node.
    pub fn at(&self, node: usize, node_count: usize) -> Result<Interval, Error> {
        self.check_nodes(node_count)?;
        check_node(node, node_count)?;
        Ok(Interval {
            lower: self.interpolation.evaluate(&self.lower, node, node_count),
            upper: self.interpolation.evaluate(&self.upper, node, node_count),
        })
    }
}

/// A node-varying initial guess of a state or control vector.
#[derive(Debug, Clone, PartialEq)]
pub struct InitialGuess {
    values: Array2<f64>,
    interpolation: Interpolation,
}

impl InitialGuess {
    /// Creates an initial guess from column profiles.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Columns`] if a fixed-width interpolation receives the
    /// wrong number of columns.
    pub fn new(values: Array2<f64>, interpolation: Interpolation) -> Result<Self, Error> {
        if interpolation != Interpolation::EachNode {
            interpolation.check("initial guess", &values, 0)?;
        }
        Ok(Self {
            values,
            interpolation,
        })
    }

    /// The same values at every node.
    #[must_use]
    pub fn constant(values: &[f64]) -> Self {
        Self {
            values: column(values),
            interpolation: Interpolation::Constant,
        }
    }

    #[must_use]
    pub fn dimension(&self) -> usize {
        self.values.nrows()
    }

    /// Checks that the profile covers a horizon of `node_count` nodes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Columns`] on a column count mismatch.
    pub fn check_nodes(&self, node_count: usize) -> Result<(), Error> {
        self.interpolation.check("initial guess", &self.values, node_count)
    }

    /// Returns the guess at `node`.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile does not cover `node_count` nodes or if
    /// `node` is past the last node.
    pub fn evaluate_at(&self, node: usize, node_count: usize) -> Result<Array1<f64>, Error> {
        self.check_nodes(node_count)?;
        check_node(node, node_count)?;
        Ok(self.interpolation.evaluate(&self.values, node, node_count))
    }
}

fn column(values: &[f64]) -> Array2<f64> {
    Array2::from_shape_fn((values.len(), 1), |(row, _)| values[row])
}

fn check_node(node: usize, node_count: usize) -> Result<(), Error> {
    if node >= node_count {
        return Err(Error::NodeOutOfRange {
            node,
            last: node_count.saturating_sub(1),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn interval_rejects_mismatched_lengths() {
        assert!(Interval::new(vec![0.0, 1.0], vec![1.0]).is_err());
    }

    #[test]
    fn interval_concatenation_preserves_order() {
        let top = Interval::new(vec![-1.0], vec![1.0]).unwrap();
        let bottom = Interval::new(vec![-2.0, -3.0], vec![2.0, 3.0]).unwrap();

        let both = top.concatenate(&bottom);

        assert_eq!(both.lower(), &array![-1.0, -2.0, -3.0]);
        assert_eq!(both.upper(), &array![1.0, 2.0, 3.0]);
        assert!(both.is_finite());
        assert!(!Interval::unbounded(2).is_finite());
    }

    #[test]
    fn first_and_last_different_selects_slot_by_node() {
        let lower = array![[0.0, -1.0, 5.0]];
        let upper = array![[0.0, 1.0, 5.0]];
        let bounds = Bounds::new(
            lower,
            upper,
            Interpolation::ConstantWithFirstAndLastDifferent,
        )
        .unwrap();

        assert_eq!(bounds.at(0, 5).unwrap().upper(), &array![0.0]);
        assert_eq!(bounds.at(2, 5).unwrap().upper(), &array![1.0]);
        assert_eq!(bounds.at(4, 5).unwrap().upper(), &array![5.0]);
        assert!(bounds.at(5, 5).is_err());
    }

    #[test]
    fn each_node_checks_column_count() {
        let bounds = Bounds::new(
            Array2::zeros((2, 4)),
            Array2::ones((2, 4)),
            Interpolation::EachNode,
        )
        .unwrap();

        assert!(bounds.at(3, 4).is_ok());
        assert_eq!(
            bounds.check_nodes(5),
            Err(Error::Columns {
                what: "bounds",
                expected: 5,
                found: 4
            })
        );
    }

    #[test]
    fn linear_guess_interpolates_between_ends() {
        let guess = InitialGuess::new(array![[0.0, 10.0]], Interpolation::Linear).unwrap();

        assert_relative_eq!(guess.evaluate_at(0, 6).unwrap()[0], 0.0);
        assert_relative_eq!(guess.evaluate_at(1, 6).unwrap()[0], 2.0);
        assert_relative_eq!(guess.evaluate_at(5, 6).unwrap()[0], 10.0);
    }

    #[test]
    fn constant_guess_ignores_node() {
        let guess = InitialGuess::constant(&[1.0, 2.0]);

        assert_eq!(guess.dimension(), 2);
        assert_eq!(guess.evaluate_at(7, 8).unwrap(), array![1.0, 2.0]);
    }
}
