//! S3 endpoint addressing.
//!
//! This module provides the [`Address`] type describing where an
//! S3-compatible service lives, and the [`Location`] of a bucket or object
//! on that service.

use serde::{Deserialize, Serialize};
use url::{Host, Url};

use crate::SigningError;
use crate::encoding::{encode_query, percent_encode_path};

/// Region used for signing when none is configured or detectable.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Environment variable holding the endpoint.
pub const ENDPOINT_VAR: &str = "S3_ENDPOINT";
/// Environment variable holding the optional region.
pub const REGION_VAR: &str = "S3_REGION";

/// Address of an S3-compatible service.
///
/// This is a plain data type - the endpoint is only parsed when a bucket or
/// object is located. An endpoint without a scheme (e.g. `localhost:9001`)
/// is treated as `http`.
///
/// # Examples
///
/// ```
/// use s3_presign::Address;
///
/// // AWS S3, region detected from the host
/// let aws = Address::new("https://s3.eu-west-1.amazonaws.com");
/// assert_eq!(aws.region(), "eu-west-1");
///
/// // MinIO (local development)
/// let minio = Address::new("localhost:9000").with_region("us-east-1");
/// assert!(minio.is_path_style().unwrap());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Address {
    /// The endpoint, with or without scheme (e.g., "https://s3.amazonaws.com")
    endpoint: String,
    /// Region used for signing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    region: Option<String>,
    /// Explicit addressing style, detected from the endpoint when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    path_style: Option<bool>,
}

impl Address {
    /// Create an address for the given endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            region: None,
            path_style: None,
        }
    }

    /// Load the address from `S3_ENDPOINT` and the optional `S3_REGION`.
    pub fn from_env() -> Result<Self, SigningError> {
        let endpoint = std::env::var(ENDPOINT_VAR)
            .map_err(|_| SigningError::InvalidEndpoint(format!("{} is not set", ENDPOINT_VAR)))?;
        let address = Self::new(endpoint);
        Ok(match std::env::var(REGION_VAR) {
            Ok(region) if !region.is_empty() => address.with_region(region),
            _ => address,
        })
    }

    /// Set the region used for signing.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Set whether to use path-style URLs.
    ///
    /// - `true`: Use path-style URLs (`https://endpoint/bucket/key`)
    /// - `false`: Use virtual-hosted style URLs (`https://bucket.endpoint/key`)
    ///
    /// By default, virtual-hosted style is used for AWS hosts only.
    pub fn with_path_style(mut self, path_style: bool) -> Self {
        self.path_style = Some(path_style);
        self
    }

    /// Get the endpoint as configured.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Get the region used for signing.
    ///
    /// An explicitly configured region wins, then the region embedded in an
    /// AWS host name, then [`DEFAULT_REGION`].
    pub fn region(&self) -> &str {
        if let Some(region) = &self.region {
            return region;
        }
        detect_region(endpoint_host(&self.endpoint)).unwrap_or(DEFAULT_REGION)
    }

    /// Whether buckets are addressed path-style.
    pub fn is_path_style(&self) -> Result<bool, SigningError> {
        match self.path_style {
            Some(path_style) => Ok(path_style),
            None => Ok(is_path_style_default(&self.endpoint_url()?)),
        }
    }

    /// Parse the endpoint, assuming `http` when no scheme is given.
    pub fn endpoint_url(&self) -> Result<Url, SigningError> {
        let endpoint = self.endpoint.trim_end_matches('/');
        let url = if endpoint.contains("://") {
            Url::parse(endpoint)?
        } else {
            Url::parse(&format!("http://{}", endpoint))?
        };
        if url.host_str().is_none() {
            return Err(SigningError::InvalidEndpoint("URL missing host".into()));
        }
        Ok(url)
    }

    /// Locate an object (or the bucket itself, when `object` is empty).
    ///
    /// The key is used exactly as given, so a key starting with `/` keeps it.
    pub fn locate(&self, bucket: &str, object: &str) -> Result<Location, SigningError> {
        if bucket.is_empty() {
            return Err(SigningError::InvalidEndpoint("bucket name is empty".into()));
        }

        let endpoint = self.endpoint_url()?;
        let host = extract_host(&endpoint)?;

        // Dotted bucket names break wildcard certificates, so fall back to path-style
        let path_style =
            self.is_path_style()? || (bucket.contains('.') && endpoint.scheme() == "https");

        Ok(if path_style {
            Location {
                scheme: endpoint.scheme().to_string(),
                host,
                path: format!("/{}/{}", bucket, object),
            }
        } else {
            Location {
                scheme: endpoint.scheme().to_string(),
                host: format!("{}.{}", bucket, host),
                path: format!("/{}", object),
            }
        })
    }
}

/// Where a request is sent: scheme, host (with explicit port) and raw path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// URL scheme, `http` or `https`
    pub scheme: String,
    /// Host as signed, including the port when it is not the default
    pub host: String,
    /// Unencoded path, always starting with `/`
    pub path: String,
}

impl Location {
    /// Render the absolute URL with the query pairs in the given order.
    ///
    /// Keys and values are percent-encoded per RFC 3986 so the URL matches
    /// what was signed byte-for-byte.
    pub fn url<'a, I>(&self, query: I) -> String
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut url = format!(
            "{}://{}{}",
            self.scheme,
            self.host,
            percent_encode_path(&self.path)
        );
        let query = encode_query(query);
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }
        url
    }
}

/// Determine if path-style URLs should be used by default for this endpoint.
///
/// Only AWS hosts resolve `{bucket}.{host}`; everything else (IP addresses,
/// localhost, self-hosted services) uses path-style.
pub fn is_path_style_default(endpoint: &Url) -> bool {
    match endpoint.host() {
        Some(Host::Ipv4(_)) | Some(Host::Ipv6(_)) => true,
        Some(Host::Domain(domain)) => !domain.ends_with("amazonaws.com"),
        None => true,
    }
}

/// Extract host string from URL, including port for non-standard ports.
pub fn extract_host(url: &Url) -> Result<String, SigningError> {
    let hostname = url
        .host_str()
        .ok_or_else(|| SigningError::InvalidEndpoint("URL missing host".into()))?;

    Ok(match url.port() {
        Some(port) => format!("{}:{}", hostname, port),
        None => hostname.to_string(),
    })
}

/// Host portion of a raw endpoint string, without scheme, port or path.
fn endpoint_host(endpoint: &str) -> &str {
    let rest = endpoint
        .split_once("://")
        .map_or(endpoint, |(_, rest)| rest);
    let end = rest.find(['/', ':']).unwrap_or(rest.len());
    &rest[..end]
}

/// Region embedded in `s3.<region>.amazonaws.com` or `s3-<region>.amazonaws.com`.
fn detect_region(host: &str) -> Option<&str> {
    let rest = host.strip_suffix(".amazonaws.com")?;
    let rest = rest
        .strip_prefix("s3.")
        .or_else(|| rest.strip_prefix("s3-"))
        .or_else(|| rest.split_once(".s3.").map(|(_, region)| region))?;
    let region = rest.rsplit('.').next()?;
    (!region.is_empty() && region != "dualstack").then_some(region)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use testresult::TestResult;

    #[test]
    fn it_defaults_to_http_without_scheme() -> TestResult {
        let location = Address::new("localhost:9001").locate("bucket", "object-name")?;
        assert_eq!(
            location,
            Location {
                scheme: "http".into(),
                host: "localhost:9001".into(),
                path: "/bucket/object-name".into(),
            }
        );
        Ok(())
    }

    #[test]
    fn it_detects_aws_regions() {
        assert_eq!(
            Address::new("https://s3.us-west-2.amazonaws.com").region(),
            "us-west-2"
        );
        assert_eq!(
            Address::new("https://s3-eu-west-1.amazonaws.com").region(),
            "eu-west-1"
        );
        assert_eq!(
            Address::new("https://s3.dualstack.ap-south-1.amazonaws.com").region(),
            "ap-south-1"
        );
        assert_eq!(Address::new("https://s3.amazonaws.com").region(), DEFAULT_REGION);
        assert_eq!(Address::new("localhost:9000").region(), DEFAULT_REGION);
    }

    #[test]
    fn it_prefers_explicit_region() {
        let address = Address::new("https://s3.us-west-2.amazonaws.com").with_region("auto");
        assert_eq!(address.region(), "auto");
    }

    #[test]
    fn it_builds_virtual_hosted_location_for_aws() -> TestResult {
        let location = Address::new("https://s3.amazonaws.com").locate("bucket", "my-key")?;
        assert_eq!(location.url([]), "https://bucket.s3.amazonaws.com/my-key");
        Ok(())
    }

    #[test]
    fn it_builds_path_style_location_for_localhost() -> TestResult {
        let location = Address::new("http://localhost:9000").locate("bucket", "my-key")?;
        assert_eq!(location.url([]), "http://localhost:9000/bucket/my-key");
        Ok(())
    }

    #[test]
    fn it_forces_path_style() -> TestResult {
        let location = Address::new("https://s3.amazonaws.com")
            .with_path_style(true)
            .locate("bucket", "my-key")?;
        assert_eq!(location.url([]), "https://s3.amazonaws.com/bucket/my-key");
        Ok(())
    }

    #[test]
    fn it_uses_path_style_for_dotted_buckets_over_https() -> TestResult {
        let location = Address::new("https://s3.amazonaws.com").locate("my.bucket", "key")?;
        assert_eq!(location.host, "s3.amazonaws.com");
        assert_eq!(location.path, "/my.bucket/key");
        Ok(())
    }

    #[test]
    fn it_locates_buckets() -> TestResult {
        let location = Address::new("http://127.0.0.1:9000").locate("bucket", "")?;
        assert_eq!(location.url([("uploads", "")]), "http://127.0.0.1:9000/bucket/?uploads=");
        Ok(())
    }

    #[test]
    fn it_encodes_object_keys() -> TestResult {
        let location = Address::new("localhost:9000").locate("bucket", "dir/a file+1.txt")?;
        assert_eq!(
            location.url([("uploadId", "a/b")]),
            "http://localhost:9000/bucket/dir/a%20file%2B1.txt?uploadId=a%2Fb"
        );
        Ok(())
    }

    #[test]
    fn it_keeps_leading_slashes_in_keys() -> TestResult {
        let location = Address::new("localhost:9000").locate("bucket", "/rooted/key")?;
        assert_eq!(location.path, "/bucket//rooted/key");

        let location = Address::new("https://s3.amazonaws.com").locate("bucket", "/rooted")?;
        assert_eq!(location.host, "bucket.s3.amazonaws.com");
        assert_eq!(location.path, "//rooted");
        Ok(())
    }

    #[test]
    fn it_omits_default_ports() -> TestResult {
        let location = Address::new("https://minio.example.com:443").locate("bucket", "key")?;
        assert_eq!(location.host, "minio.example.com");
        Ok(())
    }

    #[test]
    fn it_rejects_empty_bucket() {
        assert!(Address::new("localhost:9000").locate("", "key").is_err());
    }

    #[test]
    fn it_round_trips_through_json() -> TestResult {
        let address = Address::new("localhost:9000")
            .with_region("auto")
            .with_path_style(true);
        let json = serde_json::to_string(&address)?;
        assert_eq!(
            json,
            r#"{"endpoint":"localhost:9000","region":"auto","path_style":true}"#
        );
        let parsed: Address = serde_json::from_str(&json)?;
        assert_eq!(parsed, address);
        Ok(())
    }
}
