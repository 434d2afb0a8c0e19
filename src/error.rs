//! Error types for the villa search service.

use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the service and its collaborators.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read, parsed or applied
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem or socket failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON or TOML (de)serialization failure
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Request could not be parsed at all
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request passed schema checks but carries an unusable value
    #[error("Validation error: {0}")]
    Validation(String),

    /// The embedding model failed or returned a malformed vector
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// The vector store rejected a call or returned an undecodable result
    #[error("Vector store error: {0}")]
    VectorStore(String),

    /// HTTP server or client failure
    #[error("API error: {0}")]
    Api(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<qdrant_client::QdrantError> for Error {
    fn from(err: qdrant_client::QdrantError) -> Self {
        Error::VectorStore(err.to_string())
    }
}

impl Error {
    /// Whether the failure originated in an external collaborator.
    pub fn is_upstream(&self) -> bool {
        matches!(self, Error::Embedding(_) | Error::VectorStore(_))
    }
}
