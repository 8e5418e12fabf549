//! Multicall example: single calls through the proxy, then one batch
//!
//! Starts a small WebSocket server in-process that understands `add`,
//! `multiply` and `log`, and talks to it through `ServerProxy`.

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::sleep;
use tokio_tungstenite::tungstenite::Message;
use veles::client::Args;
use veles::ServerProxy;

/// Answer one call object; `None` for notifications
fn answer(call: &Value) -> Option<Value> {
    let params = call["params"].as_array().cloned().unwrap_or_default();
    let numbers: Vec<i64> = params.iter().filter_map(Value::as_i64).collect();
    match call["method"].as_str().unwrap_or_default() {
        "add" => Some(json!({"result": numbers.iter().sum::<i64>()})),
        "multiply" => Some(json!({"result": numbers.iter().product::<i64>()})),
        "log" => {
            println!("[SERVER] Log: {}", params.first().unwrap_or(&Value::Null));
            None
        }
        other => Some(json!({
            "result": null,
            "error": {"code": -32601, "message": format!("Method not found: {}", other)}
        })),
    }
}

/// Start the server
async fn start_server() -> Result<u16, Box<dyn std::error::Error>> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let Ok(ws) = tokio_tungstenite::accept_async(stream).await else { return };
                let (mut write, mut read) = ws.split();
                while let Some(Ok(Message::Text(text))) = read.next().await {
                    let Ok(body) = serde_json::from_str::<Value>(&text) else { break };
                    let reply = match body {
                        Value::Array(calls) => {
                            Value::Array(calls.iter().filter_map(answer).collect())
                        }
                        call => answer(&call).unwrap_or(Value::Null),
                    };
                    let _ = write.send(Message::Text(reply.to_string())).await;
                }
            });
        }
    });

    println!("[SERVER] Started on ws://127.0.0.1:{}/ws/", port);
    Ok(port)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let port = start_server().await?;
    sleep(Duration::from_millis(100)).await; // Wait for server

    let proxy = ServerProxy::new(&format!("http://127.0.0.1:{}", port))?;
    println!("[CLIENT] Proxy for {}", proxy.url());

    // Single calls
    let sum: i64 = proxy.method("add").call_as(Args::positional([10, 20])).await?;
    println!("[CLIENT] add(10, 20) = {}", sum);

    let product: i64 = proxy.method("multiply").call_as(Args::positional([3, 4])).await?;
    println!("[CLIENT] multiply(3, 4) = {}", product);

    // One batch: two calls and a notification
    let mut batch = proxy.multicall();
    batch.method("add").call(Args::positional([5, 15]))?;
    batch.notify().method("log").call(Args::positional(["batch of two sums"]))?;
    batch.method("multiply").call(Args::positional([7, 8]))?;
    batch.method("divide").call(Args::positional([1, 0]))?;

    println!("[CLIENT] Sending batch with {} jobs", batch.len());
    if let Some(results) = batch.request().await? {
        println!("[CLIENT] Received {} results", results.len());
        for (index, value) in results.iter().enumerate() {
            match results.error(index) {
                Some(error) => println!("  [{}] error {}: {}", index, error.code, error.message),
                None => println!("  [{}] {}", index, value),
            }
        }
        assert_eq!(results[0], json!(20));
        assert_eq!(results[1], json!(56));
    }

    // The last exchange stays inspectable
    let history = proxy.context().history();
    println!("[CLIENT] Last request: {}", history.last_request().unwrap_or_default());

    proxy.close().await?;
    println!("[CLIENT] Done");
    Ok(())
}
