use thiserror::Error;

#[derive(Error, Debug)]
pub enum CqlError {
    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),

    #[error("Malformed statement: {0}")]
    MalformedStatement(String),

    #[error("Execution failed: {0}")]
    ExecutionFailure(String),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<anyhow::Error> for CqlError {
    fn from(err: anyhow::Error) -> Self {
        CqlError::ConfigError(err.to_string())
    }
}
