//! veles - a compact JSON-RPC dialect with tagged object graphs
//!
//! This is the convenience crate that re-exports the veles sub-crates.
//!
//! # Architecture
//!
//! - **veles-core**: envelopes, message codec, jsonclass object codec,
//!   type registry, call history, configuration, errors, observability
//! - **veles-client**: server proxy, call proxy, multicall batching, transports
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use veles::client::{Args, ServerProxy};
//! use veles::core::{Config, Context, ObservabilityConfig};
//!
//! #[tokio::main]
//! async fn main() -> veles::core::Result<()> {
//!     veles::core::init_observability(ObservabilityConfig::new("calc-client"))
//!         .map_err(|e| veles::core::Error::Internal(e.to_string()))?;
//!
//!     let proxy = ServerProxy::builder("http://localhost:8080")
//!         .context(Context::new(Config::from_env()))
//!         .build()?;
//!
//!     let sum = proxy.method("math.add").call(Args::positional([5, 3])).await?;
//!     assert_eq!(sum, serde_json::json!(8));
//!
//!     let mut batch = proxy.multicall();
//!     batch.method("math.add").call(Args::positional([1, 2]))?;
//!     batch.notify().method("audit.log").call(Args::positional(["added"]))?;
//!     if let Some(results) = batch.request().await? {
//!         println!("{}", results[0]);
//!     }
//!
//!     proxy.close().await?;
//!     veles::core::shutdown_observability();
//!     Ok(())
//! }
//! ```

pub use veles_client as client;
pub use veles_core as core;

pub use veles_client::ServerProxy;
pub use veles_core::{Context, Object};
