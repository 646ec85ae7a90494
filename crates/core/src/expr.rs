use std::fmt::Debug;

/// A symbolic, column-vector valued expression.
///
/// Stride never looks inside an expression. Everything the transcription
/// layer needs is expressed through these operations, so any expression graph
/// library (with its own automatic differentiation) can back a problem as long
/// as it provides them.
///
/// Symbols are expressions too: a phase's state symbol is an `nx`-row column
/// whose rows are free symbols, and [`Expr::substitute`] replaces such symbol
/// columns by other expressions row by row.
pub trait Expr: Clone + Debug {
    /// Returns a column of `rows` constant zeros.
    fn zeros(rows: usize) -> Self;

    /// Returns the number of rows.
    fn numel(&self) -> usize;

    /// Stacks `parts` vertically, preserving their order.
    fn vertcat(parts: &[Self]) -> Self;

    /// Returns the listed rows, in the listed order.
    fn select(&self, rows: &[usize]) -> Self;

    /// Replaces every symbol column in `symbols` by the matching entry of
    /// `values`.
    ///
    /// Each `values[i]` has the same number of rows as `symbols[i]`.
    fn substitute(&self, symbols: &[Self], values: &[Self]) -> Self;

    /// Returns `self - constant`, row by row.
    fn offset(&self, constant: &[f64]) -> Self;

    /// Returns the one-row sum of all rows.
    fn sum(&self) -> Self;

    /// Returns the one-row sum of squared rows.
    fn sum_squares(&self) -> Self;

    /// Multiplies every row by `factor`.
    fn scale(&self, factor: f64) -> Self;

    /// Returns `true` if any row references a free symbol of `symbol`.
    fn depends_on(&self, symbol: &Self) -> bool;

    /// Returns an expression with no rows.
    fn empty() -> Self {
        Self::zeros(0)
    }

    /// Returns `true` if the expression has no rows.
    fn is_empty(&self) -> bool {
        self.numel() == 0
    }
}
