//! Request signing for the CloudBridge public API
//!
//! Every request carries the access key in cleartext plus a proof of
//! possession of the secret key: the hex encoded HMAC-SHA256 of the access key,
//! keyed by the secret key. The secret itself never leaves the process.

use crate::error::{Error, Result};
use hmac::{Hmac, Mac};
use http::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use sha2::Sha256;
use std::fmt;

/// Header carrying the raw access key
pub const ACCESS_KEY_HEADER: &str = "x-access-key";

/// Header carrying the hex signature
pub const SIGNATURE_HEADER: &str = "x-signature";

/// Access key / secret key pair used to sign requests
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    access_key: String,
    secret_key: String,
}

impl Credentials {
    /// Create a new credential pair
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }

    /// The public access key
    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    /// The secret key
    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }

    /// Whether both halves are empty, i.e. nothing was configured anywhere
    pub fn is_empty(&self) -> bool {
        self.access_key.is_empty() && self.secret_key.is_empty()
    }

    /// Hex encoded HMAC-SHA256 of the access key, keyed by the secret key
    pub fn signature(&self) -> String {
        hex_hmac_sha256(self.secret_key.as_bytes(), self.access_key.as_bytes())
    }

    /// Build the authentication headers attached to every upload.
    ///
    /// Fails with [`Error::InvalidInput`] when the access key contains bytes
    /// that cannot travel in an HTTP header.
    pub fn auth_headers(&self) -> Result<HeaderMap> {
        let access_key = HeaderValue::from_str(&self.access_key).map_err(|_| {
            Error::InvalidInput("Access key contains characters not allowed in an HTTP header".to_string())
        })?;
        // Hex output is always a valid header value.
        let signature = HeaderValue::from_str(&self.signature())
            .map_err(|e| Error::InvalidInput(format!("Invalid signature header: {}", e)))?;

        let mut headers = HeaderMap::with_capacity(3);
        headers.insert(HeaderName::from_static(ACCESS_KEY_HEADER), access_key);
        headers.insert(HeaderName::from_static(SIGNATURE_HEADER), signature);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        Ok(headers)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &redact(&self.secret_key))
            .finish()
    }
}

/// Hex encoded HMAC with SHA256 hash.
pub fn hex_hmac_sha256(key: &[u8], content: &[u8]) -> String {
    // HMAC accepts keys of any length, so this cannot fail.
    let mut h = Hmac::<Sha256>::new_from_slice(key).expect("hmac accepts any key length");
    h.update(content);

    hex::encode(h.finalize().into_bytes())
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<empty>"
    } else {
        "<redacted>"
    }
}
