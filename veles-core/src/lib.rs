//! Core envelopes and codecs for veles
//!
//! veles speaks a compact JSON-RPC dialect: requests are
//! `{"method", "params"}`, responses are `{"result"}` or
//! `{"result": null, "error": {"code", "message"}}`, and there are no ids.
//! On top of that it carries arbitrary object graphs through the
//! `__jsonclass__` tagging extension.
//!
//! This crate is transport-agnostic. It includes:
//!
//! - **Types**: wire envelopes and the in-memory `Fault`
//! - **Payload**: builders for the three envelope shapes
//! - **Codec**: `dumps`/`loads` with call-shape validation and batch helpers
//! - **jsonclass**: the object codec, its value model and the type registry
//! - **Context**: configuration, registry and call history shared by proxies
//! - **Observability**: `tracing` subscriber and OpenTelemetry setup
//!
//! # Example
//!
//! ```rust
//! use veles_core::codec::{self, MessageKind};
//! use veles_core::{Context, Object};
//!
//! let ctx = Context::default();
//! let text = codec::dumps(&Object::map([("a", 5), ("b", 3)]), Some("math.add"), MessageKind::Request, ctx.config()).unwrap();
//! assert_eq!(text, r#"{"method":"math.add","params":{"a":5,"b":3}}"#);
//!
//! let reply = codec::loads(r#"{"result": 8}"#).unwrap().unwrap();
//! assert_eq!(ctx.load(&reply["result"]).unwrap().as_i64(), Some(8));
//! ```

pub mod codec;
pub mod config;
pub mod context;
pub mod error;
pub mod history;
pub mod jsonclass;
pub mod object;
pub mod observability;
pub mod payload;
pub mod registry;
pub mod types;

pub use codec::MessageKind;
pub use config::Config;
pub use context::Context;
pub use error::{Error, ErrorData, Result};
pub use history::History;
pub use object::{Construct, ConstructorArgs, Instance, JsonClass, Object, Serialized};
pub use observability::{init_observability, shutdown_observability, ObservabilityConfig};
pub use registry::TypeRegistry;
pub use types::{Fault, Request, Response};
