//! Error types for cloudbridge-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for cloudbridge-core
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for cloudbridge-core
///
/// Only [`Error::InvalidInput`] and [`Error::InvalidCredentials`] ever escape an
/// upload call. Transport and server-side failures are reported through the
/// returned [`UploadResult`](crate::UploadResult) instead.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid input (missing file, malformed path, unusable header value)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The API rejected the access key / signature pair
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file not found
    #[error("Configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    /// Invalid configuration format
    #[error("Invalid configuration format: {0}")]
    InvalidConfig(String),

    /// Network error
    #[error("Network error: {0}")]
    Network(String),

    /// HTTP client error
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// Timeout
    #[error("Operation timed out")]
    Timeout,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),
}

impl Error {
    /// Whether this error came from the API refusing our credentials.
    pub fn is_invalid_credentials(&self) -> bool {
        matches!(self, Error::InvalidCredentials(_))
    }

    /// The underlying cause, without the category prefix of `Display`.
    ///
    /// This is the text reported in a failed upload's `message`.
    pub fn detail(&self) -> String {
        match self {
            Error::InvalidInput(msg)
            | Error::InvalidCredentials(msg)
            | Error::Config(msg)
            | Error::InvalidConfig(msg)
            | Error::Network(msg)
            | Error::HttpClient(msg) => msg.clone(),
            Error::ConfigNotFound(path) => path.display().to_string(),
            Error::Timeout => self.to_string(),
            Error::Io(err) => error_chain(err),
            Error::Serialization(err) => error_chain(err),
        }
    }
}

/// An error's message followed by each of its sources, joined with `": "`.
///
/// Sources whose text is already part of the message are skipped.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();

    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !text.contains(&cause_text) {
            text.push_str(": ");
            text.push_str(&cause_text);
        }
        source = cause.source();
    }

    text
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        // reqwest's own message omits the cause (refused, DNS, TLS...)
        let text = error_chain(&err);
        if err.is_timeout() {
            Error::Timeout
        } else if err.is_connect() {
            Error::Network(text)
        } else if err.is_builder() || err.is_request() {
            Error::HttpClient(text)
        } else {
            Error::Network(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidInput("File not found: /tmp/x".to_string());
        assert_eq!(err.to_string(), "Invalid input: File not found: /tmp/x");

        let err = Error::InvalidCredentials("Invalid API credentials".to_string());
        assert_eq!(err.to_string(), "Invalid credentials: Invalid API credentials");
        assert!(err.is_invalid_credentials());

        assert_eq!(Error::Timeout.to_string(), "Operation timed out");
        assert!(!Error::Timeout.is_invalid_credentials());
    }

    #[derive(Error, Debug)]
    #[error("error sending request")]
    struct Outer(#[source] Middle);

    #[derive(Error, Debug)]
    #[error("tcp connect error")]
    struct Middle(#[source] std::io::Error);

    #[test]
    fn test_error_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "Connection refused");
        let err = Outer(Middle(io));
        assert_eq!(
            error_chain(&err),
            "error sending request: tcp connect error: Connection refused"
        );
    }

    #[test]
    fn test_detail_drops_prefix() {
        let err = Error::Network("error sending request: Connection refused".to_string());
        assert_eq!(err.detail(), "error sending request: Connection refused");
        assert!(err.to_string().starts_with("Network error: "));

        let err: Error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
        assert_eq!(err.detail(), "denied");
        assert_eq!(Error::Timeout.detail(), "Operation timed out");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.to_string(), "IO error: gone");
    }
}
