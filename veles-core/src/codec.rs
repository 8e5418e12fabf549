//! Message codec: `dumps`, `loads` and batch helpers
//!
//! `dumps` is the single entry point for producing wire text. It checks the
//! call shape, runs params through the jsonclass encoder when enabled, and
//! hands the result to the payload builders. A [`Fault`] short-circuits all
//! of that and always renders as an error envelope.
//!
//! `loads` only parses. It never reconstructs tagged objects; callers that
//! want instances back run `jsonclass::load` (or `Context::load`) on the
//! parts they care about.
//!
//! # Examples
//!
//! ```rust
//! use veles_core::codec::{self, MessageKind};
//! use veles_core::{Config, Fault, Object};
//!
//! let config = Config::default();
//!
//! let text = codec::dumps(&Object::tuple([1, 2]), Some("add"), MessageKind::Request, &config).unwrap();
//! assert_eq!(text, r#"{"method":"add","params":[1,2]}"#);
//!
//! let text = codec::dumps(&Fault::new(-32001, "boom"), Some("add"), MessageKind::Request, &config).unwrap();
//! assert_eq!(text, r#"{"result":null,"error":{"code":-32001,"message":"boom"}}"#);
//! ```

use crate::config::Config;
use crate::error::{Error, Result};
use crate::jsonclass::{self, DumpOptions};
use crate::object::Object;
use crate::payload;
use crate::types::Fault;
use serde::Serialize;
use serde_json::Value;

/// Which envelope `dumps` should produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageKind {
    /// A call that expects a result
    #[default]
    Request,
    /// A call whose result the caller will not read
    Notify,
    /// A result going back to a caller; no method name needed
    Response,
}

/// What `dumps` encodes: call params / a result, or a fault
#[derive(Debug, Clone, Copy)]
pub enum Params<'a> {
    Object(&'a Object),
    Fault(&'a Fault),
}

impl<'a> From<&'a Object> for Params<'a> {
    fn from(obj: &'a Object) -> Self {
        Params::Object(obj)
    }
}

impl<'a> From<&'a Fault> for Params<'a> {
    fn from(fault: &'a Fault) -> Self {
        Params::Fault(fault)
    }
}

/// Serialize any value to compact JSON text
pub fn encode<T: Serialize>(msg: &T) -> Result<String> {
    serde_json::to_string(msg).map_err(|e| Error::Serialization(e.to_string()))
}

/// Encode params (or a result, or a fault) into envelope text
///
/// # Errors
///
/// - `Error::Validation` if a request or notify has no method name, an empty
///   one, or params that are not a list, tuple, map or null
/// - `Error::Serialization` if jsonclass is disabled and an instance is reached
pub fn dumps<'a>(
    params: impl Into<Params<'a>>,
    method_name: Option<&str>,
    kind: MessageKind,
    config: &Config,
) -> Result<String> {
    let obj = match params.into() {
        Params::Fault(fault) => return encode_fault(fault),
        Params::Object(obj) => obj,
    };

    if kind != MessageKind::Response {
        let method = method_name.ok_or_else(|| {
            Error::Validation(
                "Method name must be a string or the message must be a response.".into(),
            )
        })?;
        if !matches!(obj, Object::Null | Object::List(_) | Object::Tuple(_) | Object::Map(_)) {
            return Err(Error::Validation(format!(
                "Params must be a dict, list, tuple or Fault instance, got {}.",
                obj.kind()
            )));
        }
        let value = encode_params(obj, config)?;
        let envelope = match kind {
            MessageKind::Notify => payload::notify(method, value)?,
            _ => payload::request(method, value)?,
        };
        tracing::trace!(method = %method, ?kind, "Encoded call envelope");
        return encode(&envelope);
    }

    let value = encode_params(obj, config)?;
    encode(&payload::response(value))
}

fn encode_params(obj: &Object, config: &Config) -> Result<Value> {
    if config.use_jsonclass {
        jsonclass::dump(
            obj,
            DumpOptions {
                serialize_method: &config.serialize_method,
                ignore_attribute: &config.ignore_attribute,
                ignore: &[],
            },
        )
    } else {
        obj.to_plain()
    }
}

/// Render a fault as an error envelope
pub fn encode_fault(fault: &Fault) -> Result<String> {
    encode(&payload::error(fault.code, fault.message.clone()))
}

/// Parse envelope text
///
/// Empty text means "no response" and yields `None`. Tagged objects are left
/// as plain JSON.
pub fn loads(data: &str) -> Result<Option<Value>> {
    if data.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(data)
        .map(Some)
        .map_err(|e| Error::Serialization(e.to_string()))
}

/// True if `value` looks like an array of envelopes
///
/// That is: a non-empty array whose first element is an object.
pub fn is_batch(value: &Value) -> bool {
    matches!(value.as_array().and_then(|items| items.first()), Some(Value::Object(_)))
}

/// Join already-encoded envelopes into one batch array text
pub fn encode_batch<S: AsRef<str>>(parts: &[S]) -> String {
    let joined: Vec<&str> = parts.iter().map(AsRef::as_ref).collect();
    format!("[ {} ]", joined.join(","))
}
