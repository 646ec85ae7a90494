use thiserror::Error;

/// Errors raised while building a problem description.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("{what} has {found} rows, expected {expected}")]
    Rows {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("{what} has {found} columns, expected {expected}")]
    Columns {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("index {index} is out of range for a dimension of {dimension}")]
    IndexOutOfRange { index: usize, dimension: usize },

    #[error("node {node} is past the last available node {last}")]
    NodeOutOfRange { node: usize, last: usize },

    #[error("a phase needs at least one shooting interval")]
    NoShootingInterval,

    #[error("a problem needs at least one phase")]
    NoPhase,

    #[error("{0} objectives cannot be added here")]
    MisplacedObjective(&'static str),
}
