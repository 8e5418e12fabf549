//! Server proxy
//!
//! A [`ServerProxy`] owns one transport and one resolved WebSocket URL. Calls
//! go through [`ServerProxy::method`] (single calls) or
//! [`ServerProxy::multicall`] (batches). Every outbound and inbound text is
//! appended to the context's call history.
//!
//! # URL resolution
//!
//! | given                        | WebSocket URL                 |
//! |------------------------------|-------------------------------|
//! | `http://host:8080`           | `ws://host:8080/ws/`          |
//! | `http://host:8080/rpc`       | `ws://host:8080/rpc`          |
//! | `https://host`               | `wss://host/ws/`              |
//! | anything else                | `Error::UnsupportedScheme`    |
//!
//! # Examples
//!
//! ```rust,no_run
//! use veles_client::{Args, ServerProxy};
//!
//! # async fn example() -> veles_core::Result<()> {
//! let proxy = ServerProxy::new("http://localhost:8080")?;
//! let greeting: String = proxy.method("greet").call_as(Args::positional(["Ada"])).await?;
//! proxy.close().await?;
//! # Ok(())
//! # }
//! ```

use crate::metrics::{error_kind, ClientMetrics};
use crate::method::{Method, RequestRunner};
use crate::multicall::MultiCall;
use crate::transport::Transport;
use crate::ServerProxyBuilder;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use veles_core::codec::{self, MessageKind};
use veles_core::{Context, Error, Object, Response, Result};

/// Proxy for one remote endpoint
pub struct ServerProxy {
    host: String,
    handler: String,
    url: String,
    transport: Box<dyn Transport>,
    context: Context,
    closed: AtomicBool,
    metrics: Option<Arc<ClientMetrics>>,
}

/// Split `uri` into host, path and the WebSocket URL to dial
pub(crate) fn resolve_url(uri: &str) -> Result<(String, String, String)> {
    let unsupported = || Error::UnsupportedScheme(uri.to_string());
    let (scheme, rest) = uri.split_once("://").ok_or_else(unsupported)?;
    let ws_scheme = match scheme.to_ascii_lowercase().as_str() {
        "http" => "ws",
        "https" => "wss",
        _ => return Err(unsupported()),
    };

    let (host, handler) = match rest.find('/') {
        Some(idx) => rest.split_at(idx),
        None => (rest, ""),
    };
    if host.is_empty() {
        return Err(Error::Validation(format!("No host in {uri}")));
    }

    let path = if handler.is_empty() { "/ws/" } else { handler };
    let url = format!("{ws_scheme}://{host}{path}");
    Ok((host.to_string(), handler.to_string(), url))
}

impl ServerProxy {
    /// Proxy with the default WebSocket transport and a fresh context
    pub fn new(uri: &str) -> Result<Self> {
        ServerProxyBuilder::new(uri).build()
    }

    pub fn builder(uri: impl Into<String>) -> ServerProxyBuilder {
        ServerProxyBuilder::new(uri)
    }

    pub(crate) fn from_parts(
        uri: &str,
        transport: Box<dyn Transport>,
        context: Context,
        metrics: Option<Arc<ClientMetrics>>,
    ) -> Result<Self> {
        let (host, handler, url) = resolve_url(uri)?;
        tracing::debug!(host = %host, url = %url, "Server proxy created");
        Ok(Self {
            host,
            handler,
            url,
            transport,
            context,
            closed: AtomicBool::new(false),
            metrics,
        })
    }

    /// Start a call proxy for `name`
    pub fn method(&self, name: &str) -> Method<'_> {
        Method::new(self, name)
    }

    /// Start an empty batch against this proxy
    pub fn multicall(&self) -> MultiCall<'_> {
        MultiCall::new(self)
    }

    /// Send one call and return its `result`
    ///
    /// # Errors
    ///
    /// - `Error::Fault` if the server answered with an error envelope
    /// - `Error::Protocol` if the server sent no body
    /// - encode and transport errors, unchanged
    #[tracing::instrument(skip(self, params), fields(url = %self.url))]
    pub async fn request(&self, method: &str, params: Object) -> Result<Value> {
        let start = Instant::now();
        let outcome = self.request_inner(method, &params).await;

        if let Some(metrics) = &self.metrics {
            let status = if outcome.is_ok() { "success" } else { "error" };
            metrics.record_request(method, status, start.elapsed().as_secs_f64());
            if let Err(e) = &outcome {
                metrics.record_error(error_kind(e));
            }
        }
        outcome
    }

    async fn request_inner(&self, method: &str, params: &Object) -> Result<Value> {
        let body = codec::dumps(params, Some(method), MessageKind::Request, self.context.config())?;
        let reply = self
            .run_request(method, &body)
            .await?
            .ok_or_else(|| Error::Protocol(format!("No response for {method}")))?;

        let response: Response = serde_json::from_value(reply)?;
        match response.error {
            Some(error) => {
                tracing::debug!(method = %method, code = error.code, "Server returned a fault");
                Err(Error::Fault(error))
            }
            None => Ok(response.result),
        }
    }

    /// Send envelope text and parse the reply
    ///
    /// Both texts are recorded in the call history; a missing reply is
    /// recorded as an empty string.
    pub(crate) async fn run_request(&self, label: &str, body: &str) -> Result<Option<Value>> {
        if self.is_closed() {
            return Err(Error::ConnectionClosed);
        }

        tracing::debug!(label = %label, "Sending envelope");
        self.context.record_request(body);
        let reply = self.transport.send(&self.url, body).await?;
        self.context.record_response(reply.as_deref().unwrap_or(""));

        match reply.as_deref() {
            None | Some("") => Ok(None),
            Some(text) => codec::loads(text),
        }
    }

    /// Decode a result with this proxy's type registry
    pub fn load(&self, value: &Value) -> Result<Object> {
        self.context.load(value)
    }

    /// Close the transport; later calls fail with `Error::ConnectionClosed`
    ///
    /// Closing twice is a no-op.
    pub async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        tracing::info!(host = %self.host, "Closing server proxy");
        self.transport.close().await
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// The WebSocket URL requests are sent to
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub(crate) fn metrics(&self) -> Option<&ClientMetrics> {
        self.metrics.as_deref()
    }
}

#[async_trait]
impl RequestRunner for ServerProxy {
    async fn run(&self, method: &str, params: Object) -> Result<Value> {
        self.request(method, params).await
    }
}

impl fmt::Display for ServerProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<ServerProxy for {}{}>", self.host, self.handler)
    }
}

impl fmt::Debug for ServerProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerProxy")
            .field("host", &self.host)
            .field("url", &self.url)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_url_without_path() {
        let (host, handler, url) = resolve_url("http://localhost:8080").unwrap();
        assert_eq!(host, "localhost:8080");
        assert_eq!(handler, "");
        assert_eq!(url, "ws://localhost:8080/ws/");
    }

    #[test]
    fn test_resolve_url_keeps_path() {
        let (host, handler, url) = resolve_url("http://example.com/rpc/v2").unwrap();
        assert_eq!(host, "example.com");
        assert_eq!(handler, "/rpc/v2");
        assert_eq!(url, "ws://example.com/rpc/v2");
    }

    #[test]
    fn test_resolve_url_https() {
        let (_, _, url) = resolve_url("HTTPS://secure.example.com").unwrap();
        assert_eq!(url, "wss://secure.example.com/ws/");
    }

    #[test]
    fn test_resolve_url_rejects_other_schemes() {
        for uri in ["ftp://example.com", "ws://example.com", "example.com"] {
            let err = resolve_url(uri).unwrap_err();
            assert!(matches!(err, Error::UnsupportedScheme(_)), "{uri}");
        }
    }

    #[test]
    fn test_resolve_url_requires_host() {
        assert!(matches!(resolve_url("http:///ws/"), Err(Error::Validation(_))));
    }

    #[test]
    fn test_display() {
        let proxy = ServerProxy::new("http://example.com/rpc").unwrap();
        assert_eq!(proxy.to_string(), "<ServerProxy for example.com/rpc>");
        assert_eq!(proxy.url(), "ws://example.com/rpc");
        assert_eq!(proxy.method("a").attr("b").name(), "a.b");
    }
}
