// Core types and errors

use serde::{Deserialize, Serialize};
use thiserror::Error;
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;
use std::sync::Arc;

/// The result type used throughout the SDK
pub type ApiResult<T> = Result<T, ApiError>;

/// Shared, cloneable error cause
pub type ErrorSource = Arc<dyn std::error::Error + Send + Sync>;

/// Convert reqwest::Error to our ApiError
///
/// Anything reqwest reports (connect, DNS, timeout, body read) happened on the
/// wire, so it is classified as a transport failure. The URL is stripped first:
/// query strings carry tokens and signatures.
impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        let err = err.without_url();
        let message = if err.is_timeout() {
            format!("request timed out: {}", err)
        } else if err.is_connect() {
            format!("connection failed: {}", err)
        } else {
            err.to_string()
        };

        let error = ApiError::Transport {
            message,
            location: None,
            source: Some(Arc::new(err) as ErrorSource),
        };
        error.log();
        error
    }
}

/// A secure container for the app secret that zeroes memory when dropped
pub struct SecureAppSecret {
    secret: String,
}

impl SecureAppSecret {
    /// Create a new secure app secret
    pub fn new(secret: impl Into<String>) -> Self {
        Self { secret: secret.into() }
    }

    /// Get a reference to the underlying secret
    pub fn as_str(&self) -> &str {
        &self.secret
    }

    pub fn is_empty(&self) -> bool {
        self.secret.is_empty()
    }
}

impl Deref for SecureAppSecret {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.secret
    }
}

impl Drop for SecureAppSecret {
    fn drop(&mut self) {
        // Zero bytes are valid UTF-8, so the String stays well formed
        unsafe {
            let bytes = self.secret.as_bytes_mut();
            bytes.iter_mut().for_each(|b| *b = 0);
        }
    }
}

// Prevent accidental printing of secrets in logs/debug output
impl fmt::Debug for SecureAppSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecureAppSecret([REDACTED])")
    }
}

impl fmt::Display for SecureAppSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED APP SECRET]")
    }
}

impl Clone for SecureAppSecret {
    fn clone(&self) -> Self {
        Self {
            secret: self.secret.clone(),
        }
    }
}

/// Classification of a failed call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or colliding input, detected before any network activity
    ConfigurationError,
    /// Connection, DNS or timeout failure
    TransportError,
    /// The remote answered with a failure status or an unparseable payload
    ProtocolError,
    /// The caller abandoned the call while it was in flight
    Cancelled,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::ConfigurationError => "ConfigurationError",
            ErrorKind::TransportError => "TransportError",
            ErrorKind::ProtocolError => "ProtocolError",
            ErrorKind::Cancelled => "Cancelled",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, Clone)]
pub enum ApiError {
    #[error("Invalid configuration: {message}")]
    Configuration {
        message: String,
        location: Option<String>,
    },

    #[error("Transport failure: {message}")]
    Transport {
        message: String,
        location: Option<String>,
        #[source]
        source: Option<ErrorSource>,
    },

    #[error("Protocol error{}: {message}", status_suffix(.status))]
    Protocol {
        message: String,
        status: Option<u16>,
        response_body: Option<String>,
        location: Option<String>,
        #[source]
        source: Option<ErrorSource>,
    },

    #[error("Request cancelled: {message}")]
    Cancelled {
        message: String,
    },
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default()
}

impl ApiError {
    pub fn configuration_error<T: Into<String>>(message: T, location: Option<&str>) -> Self {
        let error = Self::Configuration {
            message: message.into(),
            location: location.map(String::from),
        };
        error.log();
        error
    }

    pub fn transport_error<T: Into<String>>(
        message: T,
        source: Option<impl std::error::Error + Send + Sync + 'static>,
        location: Option<&str>,
    ) -> Self {
        let error = Self::Transport {
            message: message.into(),
            location: location.map(String::from),
            source: source.map(|e| Arc::new(e) as ErrorSource),
        };
        error.log();
        error
    }

    pub fn protocol_error<T: Into<String>>(
        message: T,
        status: Option<u16>,
        response_body: Option<String>,
        source: Option<impl std::error::Error + Send + Sync + 'static>,
        location: Option<&str>,
    ) -> Self {
        let error = Self::Protocol {
            message: message.into(),
            status,
            response_body,
            location: location.map(String::from),
            source: source.map(|e| Arc::new(e) as ErrorSource),
        };
        error.log();
        error
    }

    pub fn cancelled<T: Into<String>>(message: T) -> Self {
        Self::Cancelled {
            message: message.into(),
        }
    }

    // Simpler overloads
    pub fn simple_configuration_error<T: Into<String>>(message: T) -> Self {
        Self::configuration_error(message, None)
    }

    pub fn simple_protocol_error<T: Into<String>>(message: T, status: Option<u16>) -> Self {
        Self::protocol_error(message, status, None, None::<serde_json::Error>, None)
    }

    fn log(&self) {
        if let Some(loc) = self.location() {
            log::error!("{} at {}", self, loc);
        } else {
            log::error!("{}", self);
        }
    }

    /// The failure classification
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration { .. } => ErrorKind::ConfigurationError,
            Self::Transport { .. } => ErrorKind::TransportError,
            Self::Protocol { .. } => ErrorKind::ProtocolError,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }

    /// Human-readable message without the kind prefix
    pub fn message(&self) -> &str {
        match self {
            Self::Configuration { message, .. }
            | Self::Transport { message, .. }
            | Self::Protocol { message, .. }
            | Self::Cancelled { message } => message,
        }
    }

    /// HTTP status for protocol failures that carried one
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Protocol { status, .. } => *status,
            _ => None,
        }
    }

    pub fn response_body(&self) -> Option<&str> {
        match self {
            Self::Protocol { response_body, .. } => response_body.as_deref(),
            _ => None,
        }
    }

    pub fn location(&self) -> Option<&str> {
        match self {
            Self::Configuration { location, .. } => location.as_deref(),
            Self::Transport { location, .. } => location.as_deref(),
            Self::Protocol { location, .. } => location.as_deref(),
            Self::Cancelled { .. } => None,
        }
    }

    pub fn source_error(&self) -> Option<&(dyn std::error::Error + Send + Sync)> {
        match self {
            Self::Transport { source, .. } => source.as_ref().map(|s| s.as_ref()),
            Self::Protocol { source, .. } => source.as_ref().map(|s| s.as_ref()),
            _ => None,
        }
    }

    /// Only transport failures are worth retrying; the client never does it itself
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::TransportError
    }
}

/// Create a configuration error carrying the call site
#[macro_export]
macro_rules! configuration_error {
    ($message:expr) => {
        $crate::ApiError::configuration_error($message, Some(concat!(file!(), ":", line!())))
    };
}

/// Create a protocol error carrying the call site
#[macro_export]
macro_rules! protocol_error {
    ($message:expr, $status:expr) => {
        $crate::ApiError::protocol_error($message, $status, None, None::<serde_json::Error>, Some(concat!(file!(), ":", line!())))
    };
    ($message:expr, $status:expr, $body:expr) => {
        $crate::ApiError::protocol_error($message, $status, $body, None::<serde_json::Error>, Some(concat!(file!(), ":", line!())))
    };
    ($message:expr, $status:expr, $body:expr, $source:expr) => {
        $crate::ApiError::protocol_error($message, $status, $body, Some($source), Some(concat!(file!(), ":", line!())))
    };
}

/// HTTP methods accepted by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            other => Err(ApiError::simple_configuration_error(format!(
                "unsupported HTTP method '{}', expected GET or POST",
                other
            ))),
        }
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
        }
    }
}

/// Keyed hash used to sign requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SignMethod {
    #[default]
    HmacSha256,
    HmacSha1,
}

impl SignMethod {
    /// Value sent in the `sign_method` protocol field
    pub fn tag(&self) -> &'static str {
        match self {
            SignMethod::HmacSha256 => "sha256",
            SignMethod::HmacSha1 => "sha1",
        }
    }
}

impl FromStr for SignMethod {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sha256" | "hmac-sha256" => Ok(SignMethod::HmacSha256),
            "sha1" | "hmac-sha1" => Ok(SignMethod::HmacSha1),
            other => Err(ApiError::simple_configuration_error(format!(
                "unsupported sign method '{}'",
                other
            ))),
        }
    }
}

/// Helper function to sanitize error messages to prevent leaking sensitive information
pub fn sanitize_error_message(message: &str) -> String {
    lazy_static::lazy_static! {
        static ref TOKEN_PATTERN: regex::Regex = regex::Regex::new(r"[A-Za-z0-9_-]{32,}")
            .expect("token pattern is valid");
    }
    TOKEN_PATTERN.replace_all(message, "[REDACTED]").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_method_parses_case_insensitively() {
        assert_eq!("get".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!(" Post ".parse::<HttpMethod>().unwrap(), HttpMethod::Post);
    }

    #[test]
    fn http_method_rejects_other_verbs() {
        let err = "DELETE".parse::<HttpMethod>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigurationError);
        assert!(err.message().contains("DELETE"));
    }

    #[test]
    fn secret_is_redacted_in_debug_and_display() {
        let secret = SecureAppSecret::new("super-secret-value");
        assert!(!format!("{:?}", secret).contains("super-secret-value"));
        assert!(!format!("{}", secret).contains("super-secret-value"));
        assert_eq!(secret.as_str(), "super-secret-value");
    }

    #[test]
    fn protocol_error_display_includes_status() {
        let err = ApiError::simple_protocol_error("server exploded", Some(500));
        assert_eq!(err.to_string(), "Protocol error (HTTP 500): server exploded");
        assert_eq!(err.status(), Some(500));
        assert!(!err.is_retryable());
    }

    #[test]
    fn sanitize_redacts_long_tokens() {
        let token = "a".repeat(40);
        let sanitized = sanitize_error_message(&format!("bad token {}", token));
        assert_eq!(sanitized, "bad token [REDACTED]");
    }
}
