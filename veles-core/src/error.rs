//! Error types for veles
//!
//! This module defines two kinds of error values:
//!
//! - **Error**: Local failures raised by the codecs, proxies and transports (uses thiserror)
//! - **ErrorData**: The `{code, message}` object carried inside an error envelope on the wire
//!
//! # Propagation
//!
//! Encode-time structural problems (`Validation`, `Protocol`) fail before any
//! bytes reach a transport. Decode-time tag problems (`Translation`) abort the
//! whole decode. Transport failures are passed through untouched; retrying is
//! the caller's business.
//!
//! A server-reported error is *data* at the codec layers: `loads` hands back
//! the envelope and the caller inspects its `error` key. Only the server proxy
//! lifts it into `Error::Fault`.
//!
//! # Examples
//!
//! ```rust
//! use veles_core::{Error, ErrorData};
//!
//! let error = Error::Translation("Unknown class or module Point.".into());
//! assert!(error.to_string().contains("Point"));
//!
//! let data = ErrorData::new(-32001, "boom");
//! assert_eq!(data.to_string(), "[-32001] boom");
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for veles operations
pub type Result<T> = std::result::Result<T, Error>;

/// Application-level error type for veles operations
///
/// # Error Categories
///
/// - **Encode errors**: Validation, Protocol
/// - **Decode errors**: Translation, Serialization
/// - **Remote errors**: Fault
/// - **Transport errors**: Transport, WebSocket, UnsupportedScheme, ConnectionClosed
/// - **Setup errors**: Internal
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Malformed method name or params shape at encode time
    ///
    /// Always raised locally; never sent over the wire.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Call construction violates the dialect
    ///
    /// Raised when positional and keyword arguments are mixed in one call,
    /// or when a batch response cannot be matched to the submitted jobs.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Object codec decode failure
    ///
    /// Empty or invalid type tag, unresolvable type, or malformed
    /// constructor arguments.
    #[error("Translation error: {0}")]
    Translation(String),

    /// JSON text could not be produced or parsed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Error envelope returned by the server for a single call
    #[error("Server fault: {0}")]
    Fault(ErrorData),

    /// Failure reported by a transport implementation
    #[error("Transport error: {0}")]
    Transport(String),

    /// WebSocket handshake or frame error
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// The server proxy was given a URL with a scheme it cannot map to a transport
    #[error("Unsupported RPC protocol: {0}")]
    UnsupportedScheme(String),

    /// The proxy or its transport has been closed
    #[error("Connection closed")]
    ConnectionClosed,

    /// Setup failure outside the call path, e.g. telemetry initialization
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// The `error` object of an error envelope
///
/// This is exactly what appears on the wire:
///
/// ```json
/// {"result": null, "error": {"code": -32000, "message": "Server error"}}
/// ```
///
/// The dialect has no `data` member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorData {
    /// Numeric error code
    pub code: i64,
    /// Human-readable error message
    pub message: String,
}

impl ErrorData {
    /// Create a new error object with code and message
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ErrorData {
    /// Formats as "[code] message"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ErrorData {}
