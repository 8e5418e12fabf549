//! Transports
//!
//! A [`Transport`] moves one envelope text to a URL and hands back whatever
//! text came back, if any. The proxies never look inside a transport error;
//! it is returned to the caller as-is.
//!
//! [`WsTransport`] is the default. It opens a fresh WebSocket connection per
//! request, sends one text frame and waits for one text frame in reply. A
//! close or a binary frame before that means no body. The previous connection
//! is closed when the next request starts or when the transport is closed.
//! When a user agent is set it goes out as the `User-Agent` handshake header.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::{HeaderValue, USER_AGENT};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use veles_core::{Error, Result};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// One request/response round-trip over some wire
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `body` to `url` and return the reply text
    ///
    /// `Ok(None)` means the peer answered with no body.
    async fn send(&self, url: &str, body: &str) -> Result<Option<String>>;

    /// Release any held connection
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// WebSocket transport: one connection per request
#[derive(Default)]
pub struct WsTransport {
    user_agent: Option<String>,
    last: Mutex<Option<WsStream>>,
}

impl WsTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Send `user_agent` as the `User-Agent` header on every handshake
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    async fn read_reply(stream: &mut WsStream) -> Result<Option<String>> {
        while let Some(msg) = stream.next().await {
            match msg.map_err(|e| Error::WebSocket(e.to_string()))? {
                Message::Text(text) => return Ok(Some(text)),
                Message::Binary(bytes) => {
                    tracing::debug!(len = bytes.len(), "Binary frame instead of a text reply");
                    return Ok(None);
                }
                Message::Close(_) => return Ok(None),
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
            }
        }
        Ok(None)
    }
}

impl std::fmt::Debug for WsTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsTransport")
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Transport for WsTransport {
    #[tracing::instrument(skip(self, body), fields(body_len = body.len()))]
    async fn send(&self, url: &str, body: &str) -> Result<Option<String>> {
        let mut last = self.last.lock().await;
        if let Some(mut previous) = last.take() {
            // The old peer may already be gone.
            let _ = previous.close(None).await;
        }

        let mut request = url
            .into_client_request()
            .map_err(|e| Error::WebSocket(e.to_string()))?;
        if let Some(agent) = &self.user_agent {
            let value = HeaderValue::from_str(agent).map_err(|e| Error::Transport(e.to_string()))?;
            request.headers_mut().insert(USER_AGENT, value);
        }

        let (mut stream, response) = connect_async(request)
            .await
            .map_err(|e| Error::WebSocket(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 101 {
            tracing::warn!(url = %url, status, "Handshake did not switch protocols");
            return Ok(None);
        }
        tracing::debug!(url = %url, "Connected");

        stream
            .send(Message::Text(body.to_string()))
            .await
            .map_err(|e| Error::WebSocket(e.to_string()))?;

        let reply = Self::read_reply(&mut stream).await?;
        *last = Some(stream);
        Ok(reply)
    }

    async fn close(&self) -> Result<()> {
        if let Some(mut stream) = self.last.lock().await.take() {
            tracing::info!("Closing WebSocket connection");
            match stream.close(None).await {
                Ok(()) | Err(WsError::ConnectionClosed) | Err(WsError::AlreadyClosed) => {}
                Err(e) => return Err(Error::WebSocket(e.to_string())),
            }
        }
        Ok(())
    }
}
