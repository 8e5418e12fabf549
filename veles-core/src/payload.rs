//! Envelope construction
//!
//! These builders produce the three wire shapes from already JSON-safe
//! values. They do not run the object codec; `codec::dumps` does that before
//! calling in here.

use crate::error::{Error, ErrorData, Result};
use crate::types::{Request, Response};
use serde_json::Value;

/// True when `params` is falsy
///
/// Null, `false`, zero, the empty string and empty containers all count as
/// "no params", which drops the `params` key from the request envelope.
pub fn is_empty_params(params: &Value) -> bool {
    match params {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

/// Build a request envelope
///
/// Fails with `Error::Validation` for an empty method name. Empty params
/// are omitted from the envelope instead of being sent as `[]`.
///
/// ```rust
/// use veles_core::payload;
/// use serde_json::json;
///
/// let req = payload::request("ping", json!([])).unwrap();
/// assert!(req.params.is_none());
///
/// let req = payload::request("add", json!([1, 2])).unwrap();
/// assert_eq!(req.params, Some(json!([1, 2])));
/// ```
pub fn request(method: &str, params: Value) -> Result<Request> {
    if method.is_empty() {
        return Err(Error::Validation("Method name must be a non-empty string.".into()));
    }
    let params = if is_empty_params(&params) {
        None
    } else {
        Some(params)
    };
    Ok(Request::new(method, params))
}

/// Build a notify envelope
///
/// Same wire shape as `request`; the dialect carries no id to tell them apart.
pub fn notify(method: &str, params: Value) -> Result<Request> {
    request(method, params)
}

/// Build a successful response envelope; `result` may be null
pub fn response(result: Value) -> Response {
    Response::success(result)
}

/// Build an error response envelope with `result: null`
pub fn error(code: i64, message: impl Into<String>) -> Response {
    Response::error(ErrorData::new(code, message))
}
