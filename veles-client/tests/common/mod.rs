//! Common test utilities for veles-client integration tests
//!
//! - `MockWsServer`: a WebSocket server on a random port that answers each
//!   text frame through a handler closure and records what it received,
//!   including handshake user agents
//! - `ScriptedTransport`: an in-memory transport that replays canned replies
//!   and records every body it was asked to send

#![allow(dead_code)]

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::header::USER_AGENT;
use tokio_tungstenite::tungstenite::Message;
use veles_client::Transport;
use veles_core::{Error, Result};

/// Mock WebSocket server for client testing
pub struct MockWsServer {
    addr: SocketAddr,
    shutdown_tx: mpsc::Sender<()>,
    message_rx: mpsc::Receiver<String>,
    user_agents: Arc<Mutex<Vec<String>>>,
}

impl MockWsServer {
    /// Server that echoes every frame back
    pub async fn new() -> Self {
        Self::with_handler(|msg| async move { Some(msg) }).await
    }

    /// Server that answers text frames through `handler`; `None` closes the connection
    pub async fn with_handler<F, Fut>(handler: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Option<String>> + Send,
    {
        Self::with_frame_handler(move |msg| {
            let reply = handler(msg);
            async move { reply.await.map(Message::Text) }
        })
        .await
    }

    /// Like `with_handler`, but the reply can be any frame
    pub async fn with_frame_handler<F, Fut>(handler: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Option<Message>> + Send,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handler = Arc::new(handler);
        let user_agents = Arc::new(Mutex::new(Vec::new()));
        let agents = Arc::clone(&user_agents);

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let (msg_tx, msg_rx) = mpsc::channel::<String>(100);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    accepted = listener.accept() => {
                        let Ok((stream, _)) = accepted else { continue };
                        let msg_tx = msg_tx.clone();
                        let handler = Arc::clone(&handler);
                        let agents = Arc::clone(&agents);

                        tokio::spawn(async move {
                            let record_agent = move |req: &Request,
                                                     resp: Response|
                                  -> std::result::Result<Response, ErrorResponse> {
                                let agent = req
                                    .headers()
                                    .get(USER_AGENT)
                                    .and_then(|value| value.to_str().ok())
                                    .unwrap_or_default()
                                    .to_string();
                                agents.lock().unwrap().push(agent);
                                Ok(resp)
                            };
                            let Ok(ws_stream) = accept_hdr_async(stream, record_agent).await else { return };
                            let (mut write, mut read) = ws_stream.split();

                            while let Some(Ok(msg)) = read.next().await {
                                match msg {
                                    Message::Text(text) => {
                                        let _ = msg_tx.send(text.clone()).await;
                                        match handler(text).await {
                                            Some(reply) => {
                                                let _ = write.send(reply).await;
                                            }
                                            None => {
                                                let _ = write.send(Message::Close(None)).await;
                                            }
                                        }
                                    }
                                    Message::Close(_) => break,
                                    _ => {}
                                }
                            }
                        });
                    }
                }
            }
        });

        Self {
            addr,
            shutdown_tx,
            message_rx: msg_rx,
            user_agents,
        }
    }

    /// `User-Agent` header of every handshake so far (empty when absent)
    pub fn user_agents(&self) -> Vec<String> {
        self.user_agents.lock().unwrap().clone()
    }

    /// URL to hand to `ServerProxy`; resolves to `ws://addr/ws/`
    pub fn http_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Raw WebSocket URL
    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws/", self.addr)
    }

    /// Next frame the server received, or `None` after 5 seconds
    pub async fn wait_for_message(&mut self) -> Option<String> {
        tokio::time::timeout(tokio::time::Duration::from_secs(5), self.message_rx.recv())
            .await
            .ok()
            .flatten()
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
    }
}

#[derive(Default)]
struct Script {
    replies: VecDeque<Result<Option<String>>>,
    sent: Vec<(String, String)>,
    closes: usize,
}

/// In-memory transport with canned replies
///
/// Clones share state, so a test can keep one handle and give the other to
/// the proxy.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply body
    pub fn reply(self, body: impl Into<String>) -> Self {
        self.script.lock().unwrap().replies.push_back(Ok(Some(body.into())));
        self
    }

    /// Queue a reply with no body
    pub fn no_reply(self) -> Self {
        self.script.lock().unwrap().replies.push_back(Ok(None));
        self
    }

    /// Queue a transport failure
    pub fn fail(self, error: Error) -> Self {
        self.script.lock().unwrap().replies.push_back(Err(error));
        self
    }

    /// Bodies sent so far
    pub fn sent(&self) -> Vec<String> {
        self.script
            .lock()
            .unwrap()
            .sent
            .iter()
            .map(|(_, body)| body.clone())
            .collect()
    }

    /// URLs dialed so far
    pub fn urls(&self) -> Vec<String> {
        self.script
            .lock()
            .unwrap()
            .sent
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    pub fn closes(&self) -> usize {
        self.script.lock().unwrap().closes
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, url: &str, body: &str) -> Result<Option<String>> {
        let mut script = self.script.lock().unwrap();
        script.sent.push((url.to_string(), body.to_string()));
        script.replies.pop_front().unwrap_or(Ok(None))
    }

    async fn close(&self) -> Result<()> {
        self.script.lock().unwrap().closes += 1;
        Ok(())
    }
}
