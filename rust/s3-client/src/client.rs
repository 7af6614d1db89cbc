//! Public client facade.

use chrono::{DateTime, Utc};
use s3_presign::{
    Address, Credentials, Payload, PresignError, PresignRequest, Presigner, Signer,
    SigningRequest,
};

use crate::xml::parse_error;
use crate::{Executor, ReqwestExecutor, Request, Response, S3Error, ServerError};

/// Client for an S3-compatible service.
///
/// Presigned URLs are computed locally and synchronously. Multipart upload
/// operations are signed with the `Authorization` header and sent through the
/// [`Executor`]. The client keeps no upload state between calls, so it can be
/// cloned and shared across tasks freely.
///
/// # Example
///
/// ```no_run
/// use s3_client::Client;
/// use s3_presign::{Address, Credentials};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = Client::new(
///     Credentials::new("minioadmin", "minioadmin")?,
///     Address::new("http://localhost:9000"),
/// );
///
/// let upload_id = client.initiate_upload("bucket", "video.mp4", &[], None).await?;
/// let url = client.presigned_upload_part_url("bucket", "video.mp4", &upload_id, 1, 3600, None)?;
/// println!("PUT part 1 to {url}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Client<E = ReqwestExecutor> {
    presigner: Presigner,
    executor: E,
}

impl Client<ReqwestExecutor> {
    /// Create a client that sends requests with `reqwest`.
    pub fn new(credentials: Credentials, address: Address) -> Self {
        Self::with_executor(credentials, address, ReqwestExecutor::default())
    }

    /// Create a client from `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`,
    /// `AWS_SESSION_TOKEN`, `S3_ENDPOINT` and `S3_REGION`.
    pub fn from_env() -> Result<Self, S3Error> {
        Ok(Self::new(Credentials::from_env()?, Address::from_env()?))
    }
}

impl<E: Executor> Client<E> {
    /// Create a client that sends requests through `executor`.
    pub fn with_executor(credentials: Credentials, address: Address, executor: E) -> Self {
        Self {
            presigner: Presigner::new(credentials, address),
            executor,
        }
    }

    /// The presigner sharing this client's credentials and address.
    pub fn presigner(&self) -> &Presigner {
        &self.presigner
    }

    /// The executor requests are sent through.
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// See [`Presigner::build_presigned_url`].
    pub fn build_presigned_url(&self, request: &PresignRequest) -> Result<String, PresignError> {
        self.presigner.build_presigned_url(request)
    }

    /// See [`Presigner::presigned_upload_part_url`].
    pub fn presigned_upload_part_url(
        &self,
        bucket: &str,
        object: &str,
        upload_id: &str,
        part_number: u16,
        expires: u64,
        time: Option<DateTime<Utc>>,
    ) -> Result<String, PresignError> {
        self.presigner
            .presigned_upload_part_url(bucket, object, upload_id, part_number, expires, time)
    }

    /// See [`Presigner::presigned_put_object_url`].
    pub fn presigned_put_object_url(
        &self,
        bucket: &str,
        object: &str,
        headers: &[(String, String)],
        content_type: Option<&str>,
        expires: u64,
        time: Option<DateTime<Utc>>,
    ) -> Result<String, PresignError> {
        self.presigner
            .presigned_put_object_url(bucket, object, headers, content_type, expires, time)
    }

    /// See [`Presigner::presigned_get_object_url`].
    pub fn presigned_get_object_url(
        &self,
        bucket: &str,
        object: &str,
        overrides: &[(String, String)],
        expires: u64,
        time: Option<DateTime<Utc>>,
    ) -> Result<String, PresignError> {
        self.presigner
            .presigned_get_object_url(bucket, object, overrides, expires, time)
    }

    /// Sign a request with the `Authorization` header and execute it.
    ///
    /// The body is signed with its SHA-256. The response is returned whatever
    /// its status.
    pub(crate) async fn send(
        &self,
        method: &'static str,
        bucket: &str,
        object: &str,
        query: Vec<(String, String)>,
        headers: Vec<(String, String)>,
        body: Option<Vec<u8>>,
    ) -> Result<Response, S3Error> {
        let address = self.presigner.address();
        let location = address.locate(bucket, object)?;
        let payload = body
            .as_deref()
            .map(Payload::of)
            .unwrap_or_else(Payload::empty);

        let signing = SigningRequest::new(method, &location.host, &location.path)
            .with_payload(payload);
        let signing = query
            .iter()
            .fold(signing, |signing, (k, v)| signing.with_query(k, v));
        let signing = headers
            .into_iter()
            .fold(signing, |signing, (k, v)| signing.with_header(k, v));
        let headers = Signer::new(self.presigner.credentials(), address.region()).authorize(signing);

        let request = Request {
            method,
            url: location.url(query.iter().map(|(k, v)| (k.as_str(), v.as_str()))),
            headers,
            body,
        };

        Ok(self.executor.execute(request).await?)
    }
}

/// Pass 2xx responses through, turn anything else into [`S3Error::Server`].
pub(crate) fn check(response: Response) -> Result<Response, S3Error> {
    if response.is_success() {
        return Ok(response);
    }
    let error = server_error(&response);
    tracing::warn!(status = error.status, code = ?error.code, "S3 request failed");
    Err(S3Error::Server(error))
}

/// The service error described by a response.
pub(crate) fn server_error(response: &Response) -> ServerError {
    parse_error(response.status, &response.body)
        .unwrap_or_else(|| ServerError::status(response.status))
}
