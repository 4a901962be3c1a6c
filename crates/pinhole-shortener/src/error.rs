use pinhole_core::StoreError;
use pinhole_generator::GeneratorError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ShortenerError {
    #[error("url cannot be empty")]
    EmptyUrl,
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("short id list cannot be empty")]
    EmptyIdList,
    #[error("batch cannot be empty")]
    EmptyBatch,
    #[error("failed to generate a short id: {0}")]
    IdGeneration(String),
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl From<GeneratorError> for ShortenerError {
    fn from(value: GeneratorError) -> Self {
        match value {
            GeneratorError::RandomnessUnavailable(message) => Self::IdGeneration(message),
        }
    }
}
