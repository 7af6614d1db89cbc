//! Server-side encryption settings applied when an upload is initiated.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::S3Error;

const SSE: &str = "x-amz-server-side-encryption";
const SSE_KMS_KEY_ID: &str = "x-amz-server-side-encryption-aws-kms-key-id";
const SSE_CONTEXT: &str = "x-amz-server-side-encryption-context";
const SSE_C_ALGORITHM: &str = "x-amz-server-side-encryption-customer-algorithm";
const SSE_C_KEY: &str = "x-amz-server-side-encryption-customer-key";
const SSE_C_KEY_MD5: &str = "x-amz-server-side-encryption-customer-key-MD5";

/// How the service encrypts the assembled object at rest.
#[derive(Clone, PartialEq, Eq)]
pub enum Encryption {
    /// Keys managed by the service (SSE-S3).
    S3,
    /// Keys managed by a key management service (SSE-KMS).
    Kms {
        /// Key ID or ARN
        key_id: String,
        /// Encryption context, sent as base64 encoded JSON
        context: Option<BTreeMap<String, String>>,
    },
    /// A 256-bit key supplied with every request (SSE-C).
    Customer {
        /// Raw key bytes
        key: [u8; 32],
    },
}

impl Encryption {
    /// Headers to send with the request.
    pub fn headers(&self) -> Result<Vec<(String, String)>, S3Error> {
        Ok(match self {
            Self::S3 => vec![(SSE.into(), "AES256".into())],
            Self::Kms { key_id, context } => {
                let mut headers = vec![
                    (SSE.into(), "aws:kms".into()),
                    (SSE_KMS_KEY_ID.into(), key_id.clone()),
                ];
                if let Some(context) = context {
                    let json = serde_json::to_vec(context)
                        .map_err(|e| S3Error::Serialization(e.to_string()))?;
                    headers.push((SSE_CONTEXT.into(), STANDARD.encode(json)));
                }
                headers
            }
            Self::Customer { key } => vec![
                (SSE_C_ALGORITHM.into(), "AES256".into()),
                (SSE_C_KEY.into(), STANDARD.encode(key)),
                (SSE_C_KEY_MD5.into(), STANDARD.encode(md5::compute(key).0)),
            ],
        })
    }
}

impl std::fmt::Debug for Encryption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::S3 => f.write_str("S3"),
            Self::Kms { key_id, context } => f
                .debug_struct("Kms")
                .field("key_id", key_id)
                .field("context", context)
                .finish(),
            Self::Customer { .. } => f.write_str("Customer(<redacted>)"),
        }
    }
}
