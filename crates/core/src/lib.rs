//! cloudbridge-core - Core library for the CloudBridge upload API
//!
//! This library uploads local files to a CloudBridge folder through the public
//! multipart upload endpoint, signing each request with an access key and an
//! HMAC-SHA256 signature derived from the secret key.
//!
//! ```no_run
//! use cloudbridge_core::{ClientOptions, Error, UploadClient};
//!
//! # async fn run() -> cloudbridge_core::Result<()> {
//! let client = UploadClient::new(ClientOptions::default().access_key("ak").secret_key("sk"))?;
//!
//! match client.upload_files(["report.pdf", "photo.jpg"], "team/reports").await {
//!     Ok(result) if result.is_success() => println!("uploaded {} files", result.files().len()),
//!     Ok(result) => eprintln!("upload failed: {:?}", result.message()),
//!     Err(Error::InvalidCredentials(msg)) => eprintln!("bad credentials: {}", msg),
//!     Err(e) => return Err(e),
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod request;
pub mod result;
pub mod signer;
pub mod transport;

// Re-export commonly used types
pub use client::{interpret_response, UploadClient};
pub use config::{
    config_exists, get_config_path, load_config, load_config_from, load_config_or_default,
    save_config, save_config_to,
};
pub use config::{
    ApiConfig, ClientConfig, ClientOptions, ConfigFile, CredentialsConfig, Env, OsEnv, StaticEnv,
    DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, UPLOAD_PATH,
};
pub use error::{Error, Result};
pub use request::{FileEntry, UploadRequest};
pub use result::{UploadOutcome, UploadResult, UploadedFile};
pub use signer::{hex_hmac_sha256, Credentials};
pub use transport::{RawResponse, ReqwestTransport, Transport};
