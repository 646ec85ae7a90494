//! Stateless matrix and bound transforms shared by the aggregators.

use ndarray::{Array2, s};
use thiserror::Error;

use stride_core::Interval;

/// Errors raised by the assembler.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AssembleError {
    #[error("index {index} is out of range for a dimension of {dimension}")]
    IndexOutOfRange { index: usize, dimension: usize },
}

/// Builds a `dimension × dimension` matrix that is the identity on `active`
/// and zero elsewhere. `None` selects every index.
///
/// # Errors
///
/// Returns [`AssembleError::IndexOutOfRange`] for an index past `dimension`.
pub fn diagonal_selection(
    dimension: usize,
    active: Option<&[usize]>,
) -> Result<Array2<f64>, AssembleError> {
    let mut selection = Array2::zeros((dimension, dimension));
    for index in active_indices(dimension, active)? {
        selection[[index, index]] = 1.0;
    }
    Ok(selection)
}

/// Builds one one-hot row per active index, in `active` order.
///
/// These are the non-zero rows of [`diagonal_selection`]: multiplying a
/// vector by them yields exactly the selected components.
///
/// # Errors
///
/// Returns [`AssembleError::IndexOutOfRange`] for an index past `dimension`.
pub fn selection_rows(
    dimension: usize,
    active: Option<&[usize]>,
) -> Result<Array2<f64>, AssembleError> {
    let indices = active_indices(dimension, active)?;
    let mut rows = Array2::zeros((indices.len(), dimension));
    for (row, index) in indices.into_iter().enumerate() {
        rows[[row, index]] = 1.0;
    }
    Ok(rows)
}

fn active_indices(dimension: usize, active: Option<&[usize]>) -> Result<Vec<usize>, AssembleError> {
    let Some(active) = active else {
        return Ok((0..dimension).collect());
    };
    if let Some(&index) = active.iter().find(|&&index| index >= dimension) {
        return Err(AssembleError::IndexOutOfRange { index, dimension });
    }
    Ok(active.to_vec())
}

/// Appends `block` on the diagonal of `existing`, zero-padding the rest.
#[must_use]
pub fn block_diagonal_append(existing: &Array2<f64>, block: &Array2<f64>) -> Array2<f64> {
    let (rows, cols) = existing.dim();
    let (block_rows, block_cols) = block.dim();

    let mut out = Array2::zeros((rows + block_rows, cols + block_cols));
    out.slice_mut(s![..rows, ..cols]).assign(existing);
    out.slice_mut(s![rows.., cols..]).assign(block);
    out
}

/// Stacks `new` below `existing`, preserving row order.
#[must_use]
pub fn concatenate_bounds(existing: &Interval, new: &Interval) -> Interval {
    existing.concatenate(new)
}

/// Returns `weight · I` of size `rows`.
#[must_use]
pub fn broadcast_weight(weight: f64, rows: usize) -> Array2<f64> {
    Array2::<f64>::eye(rows) * weight
}

#[cfg(test)]
mod tests {
    use super::*;

    use ndarray::array;

    #[test]
    fn diagonal_selection_defaults_to_identity() {
        assert_eq!(diagonal_selection(3, None).unwrap(), Array2::<f64>::eye(3));
        assert_eq!(
            diagonal_selection(3, Some(&[2, 0])).unwrap(),
            array![[1.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 0.0, 1.0]]
        );
    }

    #[test]
    fn selection_rows_follow_index_order() {
        assert_eq!(
            selection_rows(4, Some(&[3, 1])).unwrap(),
            array![[0.0, 0.0, 0.0, 1.0], [0.0, 1.0, 0.0, 0.0]]
        );
        assert_eq!(selection_rows(0, None).unwrap().dim(), (0, 0));
    }

    #[test]
    fn out_of_range_indices_are_rejected() {
        assert_eq!(
            selection_rows(2, Some(&[0, 2])),
            Err(AssembleError::IndexOutOfRange {
                index: 2,
                dimension: 2
            })
        );
    }

    #[test]
    fn block_diagonal_append_is_associative() {
        let a = array![[1.0]];
        let b = array![[2.0, 3.0], [4.0, 5.0]];
        let c = broadcast_weight(7.0, 2);

        let left = block_diagonal_append(&block_diagonal_append(&a, &b), &c);
        let right = block_diagonal_append(&a, &block_diagonal_append(&b, &c));

        assert_eq!(left, right);
        assert_eq!(left.dim(), (5, 5));
        assert_eq!(left[[1, 2]], 3.0);
        assert_eq!(left[[4, 4]], 7.0);
        assert_eq!(left[[0, 4]], 0.0);
    }

    #[test]
    fn appending_to_empty_yields_block() {
        let block = broadcast_weight(2.0, 3);
        assert_eq!(block_diagonal_append(&Array2::zeros((0, 0)), &block), block);
    }

    #[test]
    fn bounds_concatenate_in_order() {
        let first = Interval::new(vec![0.0], vec![1.0]).unwrap();
        let second = Interval::fixed(vec![5.0, 6.0]);

        let both = concatenate_bounds(&first, &second);

        assert_eq!(both.lower(), &array![0.0, 5.0, 6.0]);
        assert_eq!(both.upper(), &array![1.0, 5.0, 6.0]);
    }
}
