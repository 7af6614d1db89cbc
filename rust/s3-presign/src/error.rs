//! Errors raised while signing requests or building presigned URLs.

use thiserror::Error;

/// Errors that can occur while preparing a request for signing.
///
/// These are local and fatal to the call; nothing is sent anywhere.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SigningError {
    /// A required credential field is empty or missing.
    #[error("missing credential: {0} must not be empty")]
    MissingCredential(&'static str),
    /// The endpoint cannot be used to address a bucket (e.g., missing host).
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    /// Failed to parse the endpoint URL.
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// Errors that can occur while building a presigned URL.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PresignError {
    /// Expiry is outside of the `1..=604800` seconds window.
    #[error("invalid expiry: {0} seconds is outside of 1..=604800")]
    InvalidExpiry(u64),
    /// Part number is outside of the `1..=10000` range.
    #[error("invalid part number: {0} is outside of 1..=10000")]
    InvalidPartNumber(u16),
    /// The request could not be signed.
    #[error(transparent)]
    Signing(#[from] SigningError),
}
