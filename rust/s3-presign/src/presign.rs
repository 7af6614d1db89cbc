//! Presigned URL generation using [query string authentication].
//!
//! A presigned URL embeds the credential scope, expiry and signature in its
//! query string, granting time-limited access to exactly one operation
//! without sharing credentials. The body is never signed
//! (`UNSIGNED-PAYLOAD`), so the holder of the URL chooses what to upload.
//!
//! [query string authentication]: https://docs.aws.amazon.com/AmazonS3/latest/API/sigv4-query-string-auth.html

use chrono::{DateTime, Utc};

use crate::signer::is_ignored_header;
use crate::{
    ALGORITHM_IDENTIFIER, Address, Credentials, Payload, PresignError, Signer, SigningRequest,
    current_time,
};

/// Default URL expiration: 1 hour.
pub const DEFAULT_EXPIRES: u64 = 3600;

/// Shortest accepted expiry in seconds.
pub const MIN_EXPIRES: u64 = 1;

/// Longest accepted expiry in seconds (7 days).
pub const MAX_EXPIRES: u64 = 604_800;

/// Highest part number of a multipart upload.
pub const MAX_PART_NUMBER: u16 = 10_000;

const AMZ_ALGORITHM: &str = "X-Amz-Algorithm";
const AMZ_CREDENTIAL: &str = "X-Amz-Credential";
const AMZ_DATE: &str = "X-Amz-Date";
const AMZ_EXPIRES: &str = "X-Amz-Expires";
const AMZ_SECURITY_TOKEN: &str = "X-Amz-Security-Token";
const AMZ_SIGNED_HEADERS: &str = "X-Amz-SignedHeaders";
const AMZ_SIGNATURE: &str = "X-Amz-Signature";

/// Validated URL lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Expires(u64);

impl Expires {
    /// Validate an expiry of `seconds`, which must be within `1..=604800`.
    pub fn seconds(seconds: u64) -> Result<Self, PresignError> {
        if (MIN_EXPIRES..=MAX_EXPIRES).contains(&seconds) {
            Ok(Self(seconds))
        } else {
            Err(PresignError::InvalidExpiry(seconds))
        }
    }

    /// Lifetime in seconds.
    pub fn as_secs(&self) -> u64 {
        self.0
    }
}

impl Default for Expires {
    fn default() -> Self {
        Self(DEFAULT_EXPIRES)
    }
}

/// Check that a part number is within `1..=10000`.
pub fn validate_part_number(part_number: u16) -> Result<u16, PresignError> {
    if (1..=MAX_PART_NUMBER).contains(&part_number) {
        Ok(part_number)
    } else {
        Err(PresignError::InvalidPartNumber(part_number))
    }
}

/// Description of a presigned operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignRequest {
    method: String,
    bucket: String,
    object: String,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    expires: u64,
    time: Option<DateTime<Utc>>,
}

impl PresignRequest {
    /// Presign `method` on `object` in `bucket`, valid for [`DEFAULT_EXPIRES`].
    pub fn new(
        method: impl Into<String>,
        bucket: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            method: method.into(),
            bucket: bucket.into(),
            object: object.into(),
            query: Vec::new(),
            headers: Vec::new(),
            expires: DEFAULT_EXPIRES,
            time: None,
        }
    }

    /// Append a query parameter. These lead the query string in the order added.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Add a header the URL is bound to. It is carried in the query string
    /// under its lower-cased name.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the lifetime in seconds. It is validated when the URL is built.
    pub fn with_expires(mut self, seconds: u64) -> Self {
        self.expires = seconds;
        self
    }

    /// Sign as of `time` instead of now.
    pub fn with_time(mut self, time: DateTime<Utc>) -> Self {
        self.time = Some(time);
        self
    }

    /// Sign as of `time`, or now when `None`.
    pub fn with_optional_time(mut self, time: Option<DateTime<Utc>>) -> Self {
        self.time = time;
        self
    }
}

/// Builds presigned URLs for one service and one set of credentials.
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use s3_presign::{Address, Credentials, PresignRequest, Presigner};
///
/// let presigner = Presigner::new(
///     Credentials::new("my-access-key", "my-secret-key").unwrap(),
///     Address::new("localhost:9001"),
/// );
///
/// let request = PresignRequest::new("GET", "bucket", "object-name")
///     .with_expires(600)
///     .with_time(Utc.with_ymd_and_hms(2020, 5, 1, 15, 45, 33).unwrap());
/// let url = presigner.build_presigned_url(&request).unwrap();
/// assert!(url.starts_with("http://localhost:9001/bucket/object-name?X-Amz-Algorithm="));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presigner {
    credentials: Credentials,
    address: Address,
}

impl Presigner {
    /// Create a presigner.
    pub fn new(credentials: Credentials, address: Address) -> Self {
        Self {
            credentials,
            address,
        }
    }

    /// Credentials used for signing.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Address of the service.
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Region used for signing.
    pub fn region(&self) -> &str {
        self.address.region()
    }

    /// Build the presigned URL for a request.
    ///
    /// The query string holds the caller's parameters in insertion order,
    /// then the `X-Amz-*` parameters, then the caller's headers (lower-cased,
    /// sorted by name), and finally `X-Amz-Signature`. Identical inputs and
    /// time always produce the same URL.
    ///
    /// # Errors
    ///
    /// [`PresignError::InvalidExpiry`] is returned before any signing work
    /// when the expiry is outside of `1..=604800` seconds.
    pub fn build_presigned_url(&self, request: &PresignRequest) -> Result<String, PresignError> {
        let expires = Expires::seconds(request.expires)?;
        let time = request.time.unwrap_or_else(current_time);
        let location = self.address.locate(&request.bucket, &request.object)?;
        let signer = Signer::new(&self.credentials, self.address.region());

        let mut query = request.query.clone();
        query.push((AMZ_ALGORITHM.into(), ALGORITHM_IDENTIFIER.into()));
        query.push((
            AMZ_CREDENTIAL.into(),
            format!("{}/{}", self.credentials.access_key_id(), signer.scope(time)),
        ));
        query.push((AMZ_DATE.into(), time.format("%Y%m%dT%H%M%SZ").to_string()));
        query.push((AMZ_EXPIRES.into(), expires.as_secs().to_string()));
        if let Some(token) = self.credentials.session_token() {
            query.push((AMZ_SECURITY_TOKEN.into(), token.to_string()));
        }
        query.push((AMZ_SIGNED_HEADERS.into(), "host".into()));
        query.extend(hoisted_headers(&request.headers));

        let signing = query.iter().fold(
            SigningRequest::new(&request.method, &location.host, &location.path)
                .with_payload(Payload::Unsigned)
                .with_time(time),
            |signing, (k, v)| signing.with_query(k, v),
        );
        let signature = signer.sign(&signing);
        query.push((AMZ_SIGNATURE.into(), signature.to_string()));

        Ok(location.url(query.iter().map(|(k, v)| (k.as_str(), v.as_str()))))
    }

    /// Presigned `PUT` for one part of a multipart upload.
    pub fn presigned_upload_part_url(
        &self,
        bucket: &str,
        object: &str,
        upload_id: &str,
        part_number: u16,
        expires: u64,
        time: Option<DateTime<Utc>>,
    ) -> Result<String, PresignError> {
        Expires::seconds(expires)?;
        let part_number = validate_part_number(part_number)?;

        let request = PresignRequest::new("PUT", bucket, object)
            .with_query("uploadId", upload_id)
            .with_query("partNumber", part_number.to_string())
            .with_expires(expires)
            .with_optional_time(time);
        self.build_presigned_url(&request)
    }

    /// Presigned `PUT` of a whole object.
    ///
    /// `headers` bind the URL to those header values. The content type is
    /// passed along with them but is never signed, so uploaders may send any.
    pub fn presigned_put_object_url(
        &self,
        bucket: &str,
        object: &str,
        headers: &[(String, String)],
        content_type: Option<&str>,
        expires: u64,
        time: Option<DateTime<Utc>>,
    ) -> Result<String, PresignError> {
        let mut request = headers.iter().fold(
            PresignRequest::new("PUT", bucket, object),
            |request, (name, value)| request.with_header(name, value),
        );
        if let Some(content_type) = content_type {
            request = request.with_header("Content-Type", content_type);
        }
        self.build_presigned_url(&request.with_expires(expires).with_optional_time(time))
    }

    /// Presigned `GET` of an object.
    ///
    /// `overrides` are `response-*` parameters (e.g. `response-content-type`)
    /// that change the headers of the response.
    pub fn presigned_get_object_url(
        &self,
        bucket: &str,
        object: &str,
        overrides: &[(String, String)],
        expires: u64,
        time: Option<DateTime<Utc>>,
    ) -> Result<String, PresignError> {
        let request = overrides.iter().fold(
            PresignRequest::new("GET", bucket, object),
            |request, (key, value)| request.with_query(key, value),
        );
        self.build_presigned_url(&request.with_expires(expires).with_optional_time(time))
    }
}

/// Headers carried as query parameters: lower-cased, trimmed, sorted by name,
/// never including `host` or the headers that are not signed.
fn hoisted_headers(headers: &[(String, String)]) -> Vec<(String, String)> {
    let mut hoisted: Vec<(String, String)> = headers
        .iter()
        .map(|(name, value)| (name.trim().to_ascii_lowercase(), value.trim().to_string()))
        .filter(|(name, _)| name != "host" && !is_ignored_header(name))
        .collect();
    hoisted.sort();
    hoisted
}
