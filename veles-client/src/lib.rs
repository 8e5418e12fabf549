//! Client side of the veles JSON-RPC dialect
//!
//! This crate puts a call-shaped API on top of `veles-core`:
//!
//! - **ServerProxy**: owns a transport and a resolved URL, sends single calls
//! - **Method / Args**: builds dotted method names and call arguments
//! - **MultiCall**: aggregates calls and notifications into one batch
//! - **Transport**: the send/receive seam, with a WebSocket implementation
//! - **ClientMetrics**: optional OpenTelemetry instruments
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use veles_client::{Args, ServerProxy};
//!
//! #[tokio::main]
//! async fn main() -> veles_core::Result<()> {
//!     let proxy = ServerProxy::new("http://localhost:8080")?;
//!
//!     let sum: i64 = proxy
//!         .method("math")
//!         .attr("add")
//!         .call_as(Args::positional([5, 3]))
//!         .await?;
//!     println!("5 + 3 = {sum}");
//!
//!     let mut batch = proxy.multicall();
//!     batch.method("math.add").call(Args::positional([1, 1]))?;
//!     batch.method("math.mul").call(Args::keyword([("a", 2), ("b", 4)]))?;
//!     if let Some(results) = batch.request().await? {
//!         println!("{} {}", results[0], results[1]);
//!     }
//!
//!     proxy.close().await
//! }
//! ```

mod builder;
mod method;
mod metrics;
mod multicall;
mod server_proxy;
mod transport;

pub use builder::ServerProxyBuilder;
pub use method::{Args, Method, RequestRunner};
pub use metrics::ClientMetrics;
pub use multicall::{MultiCall, MultiCallIterator, MultiCallMethod, MultiCallNotify};
pub use server_proxy::ServerProxy;
pub use transport::{Transport, WsTransport};
