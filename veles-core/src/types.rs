//! Wire envelopes of the veles dialect
//!
//! The dialect is a JSON-RPC variant with a reduced envelope. There is no
//! `jsonrpc` version member and no `id`; the only envelope keys are
//! `method`, `params`, `result` and `error`.
//!
//! # Message Types
//!
//! 1. **Request**: `{"method": "add", "params": [1, 2]}`. `params` is
//!    omitted entirely when the call has no arguments.
//! 2. **Response**: `{"result": 3}`. `result` is always present, `null` included.
//! 3. **Error response**: `{"result": null, "error": {"code": -32000, "message": "Server error"}}`.
//!
//! A notify call has the same shape as a request. Whether a reply is
//! expected is a property of the caller, not of the envelope.

use crate::error::ErrorData;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Default fault code for a generic server error
pub const SERVER_ERROR_CODE: i64 = -32000;

/// Default fault message
pub const SERVER_ERROR_MESSAGE: &str = "Server error";

/// Request (and notify) envelope
///
/// # Examples
///
/// ```rust
/// use veles_core::Request;
/// use serde_json::json;
///
/// let req = Request::new("add", Some(json!([1, 2])));
/// assert_eq!(serde_json::to_value(&req).unwrap(), json!({"method": "add", "params": [1, 2]}));
///
/// let ping = Request::new("ping", None);
/// assert_eq!(serde_json::to_value(&ping).unwrap(), json!({"method": "ping"}));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Dotted name of the remote method
    pub method: String,
    /// Positional (array) or keyword (object) arguments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Request {
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }
}

/// Response envelope, successful or not
///
/// `result` is always serialized. An error response carries `result: null`
/// next to the `error` object, so both shapes deserialize into this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub result: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorData>,
}

impl Response {
    /// Successful response carrying `result`
    pub fn success(result: Value) -> Self {
        Self {
            result,
            error: None,
        }
    }

    /// Error response; `result` is forced to null
    pub fn error(error: ErrorData) -> Self {
        Self {
            result: Value::Null,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// In-memory error value that renders as an error envelope
///
/// A handler that wants to signal failure builds a `Fault` and hands it to
/// the message codec. Decoding never turns an envelope back into a `Fault`.
///
/// # Examples
///
/// ```rust
/// use veles_core::Fault;
///
/// let fault = Fault::new(-32001, "boom");
/// assert_eq!(fault.response().unwrap(), r#"{"result":null,"error":{"code":-32001,"message":"boom"}}"#);
/// assert_eq!(fault.to_string(), "<Fault -32001: boom>");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Fault {
    pub code: i64,
    pub message: String,
    /// Correlation id of the call that failed, if the caller tracks one
    pub rpc_id: Option<String>,
}

impl Fault {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            rpc_id: None,
        }
    }

    pub fn with_rpc_id(mut self, rpc_id: impl Into<String>) -> Self {
        self.rpc_id = Some(rpc_id.into());
        self
    }

    /// The `{code, message}` object for this fault
    pub fn error(&self) -> ErrorData {
        ErrorData::new(self.code, self.message.clone())
    }

    /// Render this fault as error envelope text
    pub fn response(&self) -> crate::Result<String> {
        crate::codec::encode_fault(self)
    }
}

impl Default for Fault {
    fn default() -> Self {
        Self::new(SERVER_ERROR_CODE, SERVER_ERROR_MESSAGE)
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Fault {}: {}>", self.code, self.message)
    }
}

impl From<Fault> for ErrorData {
    fn from(fault: Fault) -> Self {
        ErrorData::new(fault.code, fault.message)
    }
}
