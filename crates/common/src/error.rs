use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorklogError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("authentication error: {0}")]
    Authentication(String),

    #[error("external service error: {0}")]
    ExternalService(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type WorklogResult<T> = Result<T, WorklogError>;
