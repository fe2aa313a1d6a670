//! HTTP transport for upload requests

use crate::error::{Error, Result};
use crate::request::{UploadRequest, FOLDER_FIELD};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use std::fmt::Debug;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::debug;

/// Status code plus body text of an HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Sends an assembled [`UploadRequest`].
///
/// Any error returned here is reported to the caller as a failed
/// [`UploadResult`](crate::UploadResult), not as an `Err`.
#[async_trait::async_trait]
pub trait Transport: Debug + Send + Sync + 'static {
    /// POST the request as `multipart/form-data` and return the raw response.
    async fn send(&self, request: UploadRequest) -> Result<RawResponse>;
}

/// [`Transport`] backed by a `reqwest` client
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http_client: Client,
}

impl ReqwestTransport {
    /// Create a transport with a fresh `reqwest` client
    pub fn new() -> Result<Self> {
        let http_client = Client::builder()
            .build()
            .map_err(|e| Error::HttpClient(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http_client })
    }

    /// Reuse an existing `reqwest` client
    pub fn with_client(http_client: Client) -> Self {
        Self { http_client }
    }

    /// Build the multipart body. Each file is streamed from an open handle
    /// owned by the body, so handles close once the body is dropped.
    async fn build_form(request: &UploadRequest) -> Result<Form> {
        let mut form = Form::new().text(FOLDER_FIELD, request.folder.clone());

        for (field, entry) in request.file_parts() {
            let file = File::open(&entry.local_path).await?;
            let length = file.metadata().await?.len();

            let part = Part::stream_with_length(Body::wrap_stream(ReaderStream::new(file)), length)
                .file_name(entry.file_name.clone())
                .mime_str(&entry.mime_type)?;

            form = form.part(field, part);
        }

        Ok(form)
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: UploadRequest) -> Result<RawResponse> {
        let form = Self::build_form(&request).await?;

        debug!(url = %request.url, files = request.files.len(), "sending upload request");

        let response = self
            .http_client
            .post(&request.url)
            .headers(request.headers)
            .timeout(request.timeout)
            .multipart(form)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(RawResponse { status, body })
    }
}
