//! XML documents exchanged with the multipart upload API.

use serde::{Deserialize, Serialize};

use crate::{S3Error, ServerError};

/// Response of CreateMultipartUpload.
#[derive(Debug, Deserialize)]
#[serde(rename = "InitiateMultipartUploadResult")]
pub(crate) struct InitiateMultipartUploadResult {
    #[serde(rename = "UploadId")]
    pub upload_id: String,
}

/// One page of ListParts.
#[derive(Debug, Deserialize)]
#[serde(rename = "ListPartsResult")]
pub(crate) struct ListPartsResult {
    #[serde(rename = "IsTruncated", default)]
    pub is_truncated: bool,
    #[serde(rename = "NextPartNumberMarker")]
    pub next_part_number_marker: Option<u16>,
    #[serde(rename = "Part", default)]
    pub parts: Vec<PartEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PartEntry {
    #[serde(rename = "PartNumber")]
    pub part_number: u16,
    #[serde(rename = "ETag")]
    pub etag: String,
    #[serde(rename = "Size", default)]
    pub size: u64,
    #[serde(rename = "LastModified")]
    pub last_modified: Option<String>,
}

/// One page of ListMultipartUploads.
#[derive(Debug, Deserialize)]
#[serde(rename = "ListMultipartUploadsResult")]
pub(crate) struct ListMultipartUploadsResult {
    #[serde(rename = "IsTruncated", default)]
    pub is_truncated: bool,
    #[serde(rename = "NextKeyMarker")]
    pub next_key_marker: Option<String>,
    #[serde(rename = "NextUploadIdMarker")]
    pub next_upload_id_marker: Option<String>,
    #[serde(rename = "Upload", default)]
    pub uploads: Vec<UploadEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UploadEntry {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "UploadId")]
    pub upload_id: String,
    #[serde(rename = "Initiated")]
    pub initiated: Option<String>,
}

/// Request body of CompleteMultipartUpload.
#[derive(Debug, Serialize)]
#[serde(rename = "CompleteMultipartUpload")]
pub(crate) struct CompleteMultipartUpload {
    #[serde(rename = "Part")]
    pub parts: Vec<CompletedPart>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CompletedPart {
    #[serde(rename = "PartNumber")]
    pub part_number: u16,
    #[serde(rename = "ETag")]
    pub etag: String,
}

/// S3 error response XML structure.
///
/// S3 returns `<Error>` documents for failed requests, and CompleteMultipartUpload
/// may return one with a 200 status after it has started streaming its response.
#[derive(Debug, Deserialize)]
#[serde(rename = "Error")]
pub(crate) struct ErrorDocument {
    #[serde(rename = "Code")]
    pub code: Option<String>,
    #[serde(rename = "Message")]
    pub message: Option<String>,
    #[serde(rename = "Resource")]
    pub resource: Option<String>,
    #[serde(rename = "RequestId")]
    pub request_id: Option<String>,
}

impl ErrorDocument {
    pub fn into_server_error(self, status: u16) -> ServerError {
        ServerError {
            status,
            code: self.code,
            message: self.message,
            resource: self.resource,
            request_id: self.request_id,
        }
    }
}

/// Parse a response body, reporting malformed XML as a serialization error.
pub(crate) fn parse<T: for<'de> Deserialize<'de>>(body: &[u8]) -> Result<T, S3Error> {
    let text = std::str::from_utf8(body).map_err(|e| S3Error::Serialization(e.to_string()))?;
    quick_xml::de::from_str(text).map_err(|e| S3Error::Serialization(e.to_string()))
}

/// Parse an `<Error>` document if the body holds one.
///
/// A body with an `<Error>` element that cannot be decoded still reports an
/// error, carrying only the status.
pub(crate) fn parse_error(status: u16, body: &[u8]) -> Option<ServerError> {
    let text = String::from_utf8_lossy(body);
    if !has_error_element(&text) {
        return None;
    }
    Some(match quick_xml::de::from_str::<ErrorDocument>(&text) {
        Ok(document) => document.into_server_error(status),
        Err(error) => {
            tracing::warn!(status, %error, "undecodable S3 error document");
            ServerError::status(status)
        }
    })
}

/// Whether `text` opens an `Error` element, with or without attributes.
fn has_error_element(text: &str) -> bool {
    text.match_indices("<Error").any(|(at, tag)| {
        text[at + tag.len()..]
            .chars()
            .next()
            .is_some_and(|c| c == '>' || c == '/' || c.is_whitespace())
    })
}

/// Render the CompleteMultipartUpload body.
pub(crate) fn render(document: &CompleteMultipartUpload) -> Result<String, S3Error> {
    quick_xml::se::to_string(document).map_err(|e| S3Error::Serialization(e.to_string()))
}
