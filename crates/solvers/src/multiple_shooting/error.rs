use crate::ConfigurationError;

/// Errors that can occur in the multiple-shooting adapter.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("{0} is not implemented for the multiple-shooting solver")]
    NotImplemented(&'static str),

    #[error("backend error: {0}")]
    Backend(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    pub(crate) fn backend(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Box::new(error))
    }
}

impl From<stride_core::Error> for Error {
    fn from(error: stride_core::Error) -> Self {
        Self::Configuration(error.into())
    }
}
