use thiserror::Error;

#[derive(Error, Debug)]
pub enum IdentityPoolError {
    #[error("Schema validation error: {0}")]
    SchemaValidation(String),

    #[error("Storage access error: {0}")]
    StorageAccess(String),

    #[error("Storage access denied: {0}")]
    StorageAccessDenied(String),

    #[error("Identity service error: {0}")]
    IdentityService(String),

    #[error("Stack metadata error: {0}")]
    StackMetadata(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Response delivery failed: {0}")]
    ResponseDelivery(String),
}

impl From<serde_json::Error> for IdentityPoolError {
    fn from(err: serde_json::Error) -> Self {
        IdentityPoolError::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for IdentityPoolError {
    fn from(err: reqwest::Error) -> Self {
        IdentityPoolError::ResponseDelivery(err.to_string())
    }
}

pub type IdentityPoolResult<T> = Result<T, IdentityPoolError>;
