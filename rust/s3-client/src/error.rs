//! Error types of the S3 client.

use s3_presign::{PresignError, SigningError};
use thiserror::Error;

use crate::TransportError;

/// Failure reported by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerError {
    /// HTTP status code
    pub status: u16,
    /// S3 error code, e.g. `NoSuchUpload`
    pub code: Option<String>,
    /// Human readable message
    pub message: Option<String>,
    /// Resource the error refers to
    pub resource: Option<String>,
    /// Request ID for support cases
    pub request_id: Option<String>,
}

impl ServerError {
    /// Error with only a status code, for responses without an error document.
    pub fn status(status: u16) -> Self {
        Self {
            status,
            code: None,
            message: None,
            resource: None,
            request_id: None,
        }
    }

    /// Whether the error carries the given S3 error code.
    pub fn has_code(&self, code: &str) -> bool {
        self.code.as_deref() == Some(code)
    }
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "status {}", self.status)?;
        if let Some(code) = &self.code {
            write!(f, " {}", code)?;
        }
        if let Some(message) = &self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

/// Errors that can occur during S3 operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum S3Error {
    /// A presigned URL could not be built
    #[error(transparent)]
    Presign(#[from] PresignError),

    /// A request could not be signed
    #[error(transparent)]
    Signing(#[from] SigningError),

    /// The service answered with a failure status
    #[error("S3 request failed with {0}")]
    Server(ServerError),

    /// CompleteMultipartUpload rejected the submitted parts
    #[error("Incomplete upload, server rejected parts with {0}")]
    IncompleteUpload(ServerError),

    /// The request never produced a response
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Error that occurs during serialization or deserialization of data
    #[error("Failed to serialize/deserialize data: {0}")]
    Serialization(String),

    /// Part number outside of `1..=10000`
    #[error("Invalid part number: {0}")]
    InvalidPartNumber(u16),

    /// A listing claimed more results without advancing its marker
    #[error("Pagination did not advance: {0}")]
    Pagination(String),
}

impl S3Error {
    /// The service failure, for both [`Server`](Self::Server) and
    /// [`IncompleteUpload`](Self::IncompleteUpload).
    pub fn server_error(&self) -> Option<&ServerError> {
        match self {
            Self::Server(error) | Self::IncompleteUpload(error) => Some(error),
            _ => None,
        }
    }
}
