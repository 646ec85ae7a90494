use thiserror::Error;

use stride_core::{Node, ObjectiveKind};

use crate::{aggregate::Variable, assemble::AssembleError};

/// A problem or option set the chosen solver cannot accept.
///
/// Always raised before the external solver is called.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("this solver handles {supported} phase(s), the problem has {found}")]
    PhaseCount { supported: usize, found: usize },

    #[error(
        "phase {phase}: constraint {term} applies to {node}; only constraints on all nodes or on the last node are supported"
    )]
    UnsupportedConstraintNode {
        phase: usize,
        term: usize,
        node: Node,
    },

    #[error("phase {phase}: {kind:?} objective {term} cannot apply to {node}")]
    UnsupportedObjectiveNode {
        phase: usize,
        term: usize,
        kind: ObjectiveKind,
        node: Node,
    },

    #[error("{variable} bounds must be finite, use a large value instead of infinity")]
    NonFiniteBounds { variable: Variable },

    #[error("{variable} bounds must be the same on every {scope}")]
    NonUniformBounds {
        variable: Variable,
        scope: &'static str,
    },

    #[error("option `{key}` cannot be set once the solver exists, editable options are {allowed:?}")]
    UnsupportedOption {
        key: String,
        allowed: &'static [&'static str],
    },

    #[error("option `{key}` must be {expected}")]
    InvalidOption { key: String, expected: &'static str },

    #[error("unknown cost type `{0}`, expected LINEAR_LS, NONLINEAR_LS or EXTERNAL")]
    UnknownCostType(String),

    #[error("phase {phase}: objective {term} is incompatible with linear least squares: {reason}")]
    IncompatibleObjective {
        phase: usize,
        term: usize,
        reason: &'static str,
    },

    #[error("phase {phase}: objective {term} is neither a running nor a terminal cost")]
    UnclassifiedObjective { phase: usize, term: usize },

    #[error("free parameters are not supported with linear least-squares costs")]
    ParametersWithLinearLs,

    #[error("phase duration parameter `{0}` is not supported by this solver")]
    TimeParameter(String),

    #[error("{what} changed from {expected} to {found} after the solver was created")]
    DimensionChanged {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("cost block has {found} {what}, expected {expected}")]
    MisalignedCostBlock {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error(transparent)]
    Assemble(#[from] AssembleError),

    #[error(transparent)]
    Description(#[from] stride_core::Error),
}
