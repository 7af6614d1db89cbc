//! Access credentials for S3-compatible services.

use serde::{Deserialize, Serialize};

use crate::SigningError;

/// Environment variable holding the access key ID.
pub const ACCESS_KEY_ID_VAR: &str = "AWS_ACCESS_KEY_ID";
/// Environment variable holding the secret access key.
pub const SECRET_ACCESS_KEY_VAR: &str = "AWS_SECRET_ACCESS_KEY";
/// Environment variable holding the optional session token.
pub const SESSION_TOKEN_VAR: &str = "AWS_SESSION_TOKEN";

/// Access key, secret key and optional session token used to sign requests.
///
/// Credentials are immutable once constructed and can be shared freely between
/// concurrent signing calls. The [`Debug`](std::fmt::Debug) output never
/// includes the secret key or the session token.
///
/// # Example
///
/// ```
/// use s3_presign::Credentials;
///
/// let credentials = Credentials::new("my-access-key", "my-secret-key")
///     .unwrap()
///     .with_session_token("session");
/// assert_eq!(credentials.access_key_id(), "my-access-key");
/// ```
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    access_key_id: String,
    secret_access_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_token: Option<String>,
}

impl Credentials {
    /// Create credentials from an access key ID and a secret access key.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError::MissingCredential`] if either key is empty or
    /// only whitespace.
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Result<Self, SigningError> {
        let access_key_id = access_key_id.into();
        let secret_access_key = secret_access_key.into();

        if access_key_id.trim().is_empty() {
            return Err(SigningError::MissingCredential("access key"));
        }
        if secret_access_key.trim().is_empty() {
            return Err(SigningError::MissingCredential("secret key"));
        }

        Ok(Self {
            access_key_id,
            secret_access_key,
            session_token: None,
        })
    }

    /// Attach a temporary session token. Empty tokens are ignored.
    pub fn with_session_token(mut self, session_token: impl Into<String>) -> Self {
        let token = session_token.into();
        self.session_token = (!token.is_empty()).then_some(token);
        self
    }

    /// Load credentials from `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`
    /// and the optional `AWS_SESSION_TOKEN`.
    pub fn from_env() -> Result<Self, SigningError> {
        let access_key_id = std::env::var(ACCESS_KEY_ID_VAR)
            .map_err(|_| SigningError::MissingCredential(ACCESS_KEY_ID_VAR))?;
        let secret_access_key = std::env::var(SECRET_ACCESS_KEY_VAR)
            .map_err(|_| SigningError::MissingCredential(SECRET_ACCESS_KEY_VAR))?;

        let credentials = Self::new(access_key_id, secret_access_key)?;
        Ok(match std::env::var(SESSION_TOKEN_VAR) {
            Ok(token) => credentials.with_session_token(token),
            Err(_) => credentials,
        })
    }

    /// Get the access key ID.
    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    pub(crate) fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }

    /// Get the session token, if any.
    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

#[derive(Deserialize)]
struct RawCredentials {
    access_key_id: String,
    secret_access_key: String,
    #[serde(default)]
    session_token: Option<String>,
}

impl<'de> Deserialize<'de> for Credentials {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RawCredentials::deserialize(deserializer)?;
        let credentials = Credentials::new(raw.access_key_id, raw.secret_access_key)
            .map_err(serde::de::Error::custom)?;
        Ok(match raw.session_token {
            Some(token) => credentials.with_session_token(token),
            None => credentials,
        })
    }
}
