//! Multipart upload coordination.
//!
//! Every operation is a single stateless call keyed by
//! `(bucket, object, upload_id)`. The service is the only record of which
//! parts exist and whether an upload is still open; nothing is cached here,
//! since concurrent uploaders may change that state at any time.
//!
//! See [Uploading and copying objects using multipart upload].
//!
//! [Uploading and copying objects using multipart upload]: https://docs.aws.amazon.com/AmazonS3/latest/userguide/mpuoverview.html

use std::collections::BTreeMap;

use async_stream::try_stream;
use futures_util::Stream;
use s3_presign::MAX_PART_NUMBER;

use crate::client::{check, server_error};
use crate::xml::{
    self, CompleteMultipartUpload, CompletedPart, InitiateMultipartUploadResult,
    ListMultipartUploadsResult, ListPartsResult,
};
use crate::{Client, Encryption, Executor, S3Error, ServerError};

/// Error codes CompleteMultipartUpload uses when the submitted parts do not
/// match the stored ones.
const PART_MISMATCH_CODES: [&str; 2] = ["InvalidPart", "InvalidPartOrder"];

/// A part stored by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    /// Part number, `1..=10000`
    pub number: u16,
    /// Opaque entity tag, compared only for equality
    pub etag: String,
    /// Size in bytes
    pub size: u64,
    /// When the part was uploaded, as reported by the service
    pub last_modified: Option<String>,
}

impl From<xml::PartEntry> for Part {
    fn from(entry: xml::PartEntry) -> Self {
        Self {
            number: entry.part_number,
            etag: entry.etag,
            size: entry.size,
            last_modified: entry.last_modified,
        }
    }
}

/// A multipart upload that was initiated but not yet completed or aborted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    /// Object key
    pub key: String,
    /// Upload identifier
    pub upload_id: String,
    /// When the upload was initiated, as reported by the service
    pub initiated: Option<String>,
}

impl From<xml::UploadEntry> for Upload {
    fn from(entry: xml::UploadEntry) -> Self {
        Self {
            key: entry.key,
            upload_id: entry.upload_id,
            initiated: entry.initiated,
        }
    }
}

fn upload_id_param(upload_id: &str) -> (String, String) {
    ("uploadId".into(), upload_id.into())
}

impl<E: Executor> Client<E> {
    /// Start a multipart upload and return its upload id.
    ///
    /// `metadata` is sent as request headers exactly as given (e.g.
    /// `x-amz-meta-owner` or `Content-Type`).
    #[tracing::instrument(level = "debug", skip(self, metadata, encryption))]
    pub async fn initiate_upload(
        &self,
        bucket: &str,
        object: &str,
        metadata: &[(String, String)],
        encryption: Option<&Encryption>,
    ) -> Result<String, S3Error> {
        let mut headers = metadata.to_vec();
        if let Some(encryption) = encryption {
            headers.extend(encryption.headers()?);
        }

        let response = self
            .send(
                "POST",
                bucket,
                object,
                vec![("uploads".into(), String::new())],
                headers,
                None,
            )
            .await?;
        let response = check(response)?;
        let result: InitiateMultipartUploadResult = xml::parse(&response.body)?;

        tracing::debug!(upload_id = %result.upload_id, "initiated multipart upload");
        Ok(result.upload_id)
    }

    /// Stream the parts stored for an upload, in ascending part number order.
    ///
    /// Pages are fetched lazily, following `NextPartNumberMarker` until the
    /// service reports no more results. Each call starts again from the first
    /// page. A page that claims more results without advancing the marker
    /// ends the stream with [`S3Error::Pagination`].
    pub fn list_parts<'a>(
        &'a self,
        bucket: &'a str,
        object: &'a str,
        upload_id: &'a str,
    ) -> impl Stream<Item = Result<Part, S3Error>> + 'a {
        try_stream! {
            let mut marker: Option<u16> = None;
            let mut last_yielded: u16 = 0;

            loop {
                let mut query = vec![upload_id_param(upload_id)];
                if let Some(marker) = marker {
                    query.push(("part-number-marker".into(), marker.to_string()));
                }

                tracing::debug!(bucket, object, upload_id, ?marker, "listing parts");
                let response = check(self.send("GET", bucket, object, query, Vec::new(), None).await?)?;
                let page: ListPartsResult = xml::parse(&response.body)?;

                let mut parts = page.parts;
                parts.sort_by_key(|part| part.part_number);
                for part in parts {
                    // Pages may overlap when parts are uploaded concurrently
                    if part.part_number <= last_yielded {
                        continue;
                    }
                    last_yielded = part.part_number;
                    yield Part::from(part);
                }

                if !page.is_truncated {
                    break;
                }

                let next = page.next_part_number_marker.unwrap_or(last_yielded);
                if next <= marker.unwrap_or(0) {
                    Err::<(), S3Error>(S3Error::Pagination(format!(
                        "part number marker stuck at {}",
                        next
                    )))?;
                }
                marker = Some(next);
            }
        }
    }

    /// Assemble the uploaded parts into the final object.
    ///
    /// Parts are submitted in ascending part number order whatever order
    /// they are given in. A part number given twice keeps its last ETag.
    ///
    /// # Errors
    ///
    /// [`S3Error::IncompleteUpload`] when the service rejects the submitted
    /// parts (`InvalidPart`, `InvalidPartOrder`), [`S3Error::Server`] for any
    /// other failure, including an `<Error>` document in a 200 response.
    #[tracing::instrument(level = "debug", skip(self, parts))]
    pub async fn complete_upload<I>(
        &self,
        bucket: &str,
        object: &str,
        upload_id: &str,
        parts: I,
    ) -> Result<(), S3Error>
    where
        I: IntoIterator<Item = (u16, String)>,
    {
        let parts: BTreeMap<u16, String> = parts.into_iter().collect();
        if let Some((&number, _)) = parts
            .iter()
            .find(|(number, _)| **number == 0 || **number > MAX_PART_NUMBER)
        {
            return Err(S3Error::InvalidPartNumber(number));
        }

        let body = xml::render(&CompleteMultipartUpload {
            parts: parts
                .into_iter()
                .map(|(part_number, etag)| CompletedPart { part_number, etag })
                .collect(),
        })?;

        let response = self
            .send(
                "POST",
                bucket,
                object,
                vec![upload_id_param(upload_id)],
                vec![("Content-Type".into(), "application/xml".into())],
                Some(body.into_bytes()),
            )
            .await?;

        // The service may fail after sending a 200 status
        let error = match xml::parse_error(response.status, &response.body) {
            Some(error) => error,
            None if response.is_success() => {
                tracing::debug!("completed multipart upload");
                return Ok(());
            }
            None => ServerError::status(response.status),
        };

        tracing::warn!(status = error.status, code = ?error.code, "failed to complete multipart upload");
        if PART_MISMATCH_CODES.iter().any(|code| error.has_code(code)) {
            Err(S3Error::IncompleteUpload(error))
        } else {
            Err(S3Error::Server(error))
        }
    }

    /// Abort an upload and discard its parts.
    ///
    /// Aborting an upload that no longer exists (already aborted or
    /// completed) succeeds, so this is safe to repeat.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn abort_upload(
        &self,
        bucket: &str,
        object: &str,
        upload_id: &str,
    ) -> Result<(), S3Error> {
        let response = self
            .send(
                "DELETE",
                bucket,
                object,
                vec![upload_id_param(upload_id)],
                Vec::new(),
                None,
            )
            .await?;

        if response.is_success() {
            tracing::debug!("aborted multipart upload");
            return Ok(());
        }

        let error = server_error(&response);
        if error.has_code("NoSuchUpload") || (error.status == 404 && error.code.is_none()) {
            tracing::debug!(code = ?error.code, "upload already gone, nothing to abort");
            return Ok(());
        }

        tracing::warn!(status = error.status, code = ?error.code, "failed to abort multipart upload");
        Err(S3Error::Server(error))
    }

    /// Stream the uploads in `bucket` that were initiated but never
    /// completed or aborted, optionally limited to keys under `prefix`.
    ///
    /// Use this to find and abort uploads orphaned by interrupted callers.
    pub fn list_uploads<'a>(
        &'a self,
        bucket: &'a str,
        prefix: Option<&'a str>,
    ) -> impl Stream<Item = Result<Upload, S3Error>> + 'a {
        try_stream! {
            let mut markers: Option<(String, String)> = None;

            loop {
                let mut query = vec![("uploads".to_string(), String::new())];
                if let Some(prefix) = prefix {
                    query.push(("prefix".into(), prefix.into()));
                }
                if let Some((key_marker, upload_id_marker)) = &markers {
                    query.push(("key-marker".into(), key_marker.clone()));
                    query.push(("upload-id-marker".into(), upload_id_marker.clone()));
                }

                tracing::debug!(bucket, ?prefix, ?markers, "listing multipart uploads");
                let response = check(self.send("GET", bucket, "", query, Vec::new(), None).await?)?;
                let page: ListMultipartUploadsResult = xml::parse(&response.body)?;

                for upload in page.uploads {
                    yield Upload::from(upload);
                }

                if !page.is_truncated {
                    break;
                }

                let next = (
                    page.next_key_marker.unwrap_or_default(),
                    page.next_upload_id_marker.unwrap_or_default(),
                );
                if next.0.is_empty() || markers.as_ref() == Some(&next) {
                    Err::<(), S3Error>(S3Error::Pagination(format!(
                        "upload markers stuck at {:?}",
                        next
                    )))?;
                }
                markers = Some(next);
            }
        }
    }
}
