use crate::ConfigurationError;

/// Errors that can occur in the NLP adapter.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("backend error: {0}")]
    Backend(Box<dyn std::error::Error + Send + Sync>),

    #[error("iteration history: {0}")]
    History(#[from] std::io::Error),

    #[error("iterations were not recorded, set `return_iterations` before solving")]
    IterationsNotRecorded,
}

/// A backend returned a solution that does not cover the decision vector.
#[derive(Debug, thiserror::Error)]
#[error("solution has {found} values, expected {expected}")]
pub struct SolutionLength {
    pub expected: usize,
    pub found: usize,
}

impl From<stride_core::Error> for Error {
    fn from(error: stride_core::Error) -> Self {
        Self::Configuration(error.into())
    }
}
