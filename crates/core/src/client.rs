//! CloudBridge upload client

use crate::config::{trim_base_url, ClientConfig, ClientOptions, Env, OsEnv};
use crate::error::{Error, Result};
use crate::request::{validate_paths, UploadRequest};
use crate::result::UploadResult;
use crate::signer::Credentials;
use crate::transport::{RawResponse, ReqwestTransport, Transport};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Message used when the API signals a credential failure without one
const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid API credentials";

/// Client for the CloudBridge public upload API
///
/// Credentials, base URL and timeout are the only state kept between calls.
/// Setters take `&mut self`, so they can never race an upload running
/// through `&self`.
#[derive(Debug, Clone)]
pub struct UploadClient {
    credentials: Credentials,
    config: ClientConfig,
    transport: Arc<dyn Transport>,
}

impl UploadClient {
    /// Create a client. Unset options fall back to the `CLOUDBRIDGE_*`
    /// environment variables, then to the built-in defaults.
    pub fn new(options: ClientOptions) -> Result<Self> {
        Self::with_env(options, &OsEnv)
    }

    /// Create a client from the environment alone
    pub fn from_env() -> Result<Self> {
        Self::new(ClientOptions::default())
    }

    /// Create a client, resolving unset options against `env`
    pub fn with_env(options: ClientOptions, env: &dyn Env) -> Result<Self> {
        let (credentials, config) = ClientConfig::resolve(options, env)?;
        let transport = ReqwestTransport::new()?;

        debug!(base_url = %config.base_url, timeout_secs = config.timeout.as_secs(), "created upload client");

        Ok(Self {
            credentials,
            config,
            transport: Arc::new(transport),
        })
    }

    /// Replace the transport used to send requests
    pub fn with_transport(mut self, transport: impl Transport) -> Self {
        self.transport = Arc::new(transport);
        self
    }

    /// Replace the credentials used for subsequent uploads
    pub fn set_credentials(&mut self, access_key: impl Into<String>, secret_key: impl Into<String>) {
        self.credentials = Credentials::new(access_key, secret_key);
    }

    /// Replace the base URL, trimming trailing slashes
    pub fn set_base_url(&mut self, base_url: &str) {
        self.config.base_url = trim_base_url(base_url);
    }

    /// Replace the request timeout
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.config.timeout = timeout;
    }

    /// Credentials used to sign requests
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Base URL, without trailing slash
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Request timeout
    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }

    /// Full URL uploads are POSTed to
    pub fn upload_url(&self) -> String {
        self.config.upload_url()
    }

    /// Upload a single file to `folder`.
    ///
    /// Same as [`upload_files`](Self::upload_files) with a one element list.
    pub async fn upload_file(&self, file_path: impl AsRef<Path>, folder: &str) -> Result<UploadResult> {
        self.upload_files([file_path], folder).await
    }

    /// Upload several files to `folder`, as `files[0]`, `files[1]`, ...
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidInput`] if a path is malformed or is not an existing,
    ///   readable regular file. Nothing is sent in that case.
    /// * [`Error::InvalidCredentials`] if the API answers 401, or its message
    ///   mentions invalid API credentials.
    ///
    /// Network failures and undecodable responses are *not* errors: they come
    /// back as an [`UploadResult`] with `success: false`.
    pub async fn upload_files<I, P>(&self, file_paths: I, folder: &str) -> Result<UploadResult>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let request = self.build_request(file_paths, folder)?;
        let file_count = request.files.len();

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "upload request failed");
                return check_credentials(0, UploadResult::transport_failure(err.detail()));
            }
        };

        let result = interpret_response(response)?;
        info!(files = file_count, folder, success = result.is_success(), "upload finished");

        Ok(result)
    }

    /// Validate the inputs and assemble the signed request.
    pub fn build_request<I, P>(&self, file_paths: I, folder: &str) -> Result<UploadRequest>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let files = validate_paths(file_paths)?;
        let headers = self.credentials.auth_headers()?;

        Ok(UploadRequest {
            url: self.upload_url(),
            headers,
            folder: folder.to_string(),
            files,
            timeout: self.config.timeout,
        })
    }
}

/// Decode a raw response and apply the credential check.
pub fn interpret_response(response: RawResponse) -> Result<UploadResult> {
    let RawResponse { status, body } = response;

    let result = match serde_json::from_str::<Value>(&body) {
        Ok(Value::Object(map)) => UploadResult::from_map(map),
        _ => {
            warn!(status, "upload response is not a JSON object");
            UploadResult::invalid_json(body)
        }
    };

    check_credentials(status, result)
}

/// Turn a 401, or a message mentioning invalid credentials, into an error.
fn check_credentials(status: u16, result: UploadResult) -> Result<UploadResult> {
    let message = result.message().unwrap_or_default();

    if status == 401 || mentions_invalid_credentials(message) {
        let message = if message.is_empty() {
            INVALID_CREDENTIALS_MESSAGE.to_string()
        } else {
            message.to_string()
        };
        return Err(Error::InvalidCredentials(message));
    }

    Ok(result)
}

fn mentions_invalid_credentials(message: &str) -> bool {
    message
        .to_ascii_lowercase()
        .contains(&INVALID_CREDENTIALS_MESSAGE.to_ascii_lowercase())
}
