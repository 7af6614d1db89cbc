//! Transport boundary.
//!
//! The [`Executor`] trait is the only place where requests leave the process.
//! Signing and sequencing happen before a request reaches it, so an executor
//! must transmit the URL and headers exactly as given. Timeouts and retries
//! are the executor's concern.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::ConditionalSync;

/// A fully signed request ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// HTTP method (GET, PUT, POST, DELETE)
    pub method: &'static str,
    /// Absolute URL, already percent-encoded
    pub url: String,
    /// Headers to send, including `authorization`
    pub headers: Vec<(String, String)>,
    /// Request body, if any
    pub body: Option<Vec<u8>>,
}

/// Raw response of an executed request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: Vec<(String, String)>,
    /// Response body
    pub body: Vec<u8>,
}

impl Response {
    /// Create a response with the given status and body.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First header with the given name, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Errors that occur before a response is received.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Error that occurs when connection to the service fails
    #[error("Failed to connect: {0}")]
    ConnectionFailed(String),

    /// Error that occurs when the request could not be built or sent
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Error that occurs while reading the response
    #[error("Failed to read response: {0}")]
    ResponseFailed(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        #[cfg(not(target_arch = "wasm32"))]
        {
            if error.is_connect() {
                TransportError::ConnectionFailed(error.to_string())
            } else if error.is_request() || error.is_builder() {
                TransportError::RequestFailed(error.to_string())
            } else {
                TransportError::ResponseFailed(error.to_string())
            }
        }
        #[cfg(target_arch = "wasm32")]
        {
            // WASM doesn't have is_connect() or is_request() methods
            TransportError::RequestFailed(error.to_string())
        }
    }
}

/// Sends signed requests and returns raw responses.
///
/// Implement this to plug in a different transport or to test against an
/// in-memory service.
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait Executor: ConditionalSync + std::fmt::Debug {
    /// Send the request and return the response, whatever its status.
    async fn execute(&self, request: Request) -> Result<Response, TransportError>;
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl<E: Executor + ?Sized> Executor for Arc<E> {
    async fn execute(&self, request: Request) -> Result<Response, TransportError> {
        self.as_ref().execute(request).await
    }
}

/// [`Executor`] backed by a [`reqwest::Client`].
#[derive(Debug, Clone, Default)]
pub struct ReqwestExecutor {
    client: reqwest::Client,
}

impl ReqwestExecutor {
    /// Use the given client, e.g. one configured with timeouts.
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl Executor for ReqwestExecutor {
    async fn execute(&self, request: Request) -> Result<Response, TransportError> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|e| TransportError::RequestFailed(e.to_string()))?;

        let mut builder = self.client.request(method, request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response.bytes().await?.to_vec();

        Ok(Response {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_finds_headers_case_insensitively() {
        let mut response = Response::new(200, Vec::new());
        response.headers.push(("ETag".into(), "\"abc\"".into()));
        assert_eq!(response.header("etag"), Some("\"abc\""));
        assert_eq!(response.header("x-missing"), None);
    }

    #[test]
    fn it_classifies_statuses() {
        assert!(Response::new(200, Vec::new()).is_success());
        assert!(Response::new(204, Vec::new()).is_success());
        assert!(!Response::new(404, Vec::new()).is_success());
        assert!(!Response::new(500, Vec::new()).is_success());
    }
}
