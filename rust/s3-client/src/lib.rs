//! Presigned URLs and multipart uploads for S3-compatible storage.
//!
//! [`Client`] combines the signing of [`s3_presign`] with the four remote
//! operations of a multipart upload:
//!
//! 1. [`Client::initiate_upload`] returns an upload id
//! 2. parts are uploaded, typically through URLs from
//!    [`Client::presigned_upload_part_url`]
//! 3. [`Client::list_parts`] streams what the service has stored
//! 4. [`Client::complete_upload`] assembles the object, or
//!    [`Client::abort_upload`] discards the parts
//!
//! Network calls go through an [`Executor`], which defaults to
//! [`ReqwestExecutor`] and can be replaced for testing.

mod client;
mod encryption;
mod error;
mod executor;
mod multipart;
mod sync;
mod xml;

pub use client::Client;
pub use encryption::Encryption;
pub use error::{S3Error, ServerError};
pub use executor::{Executor, ReqwestExecutor, Request, Response, TransportError};
pub use multipart::{Part, Upload};
pub use sync::ConditionalSync;

pub use s3_presign;

#[cfg(test)]
mod helpers;
