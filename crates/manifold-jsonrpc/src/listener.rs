// crates/manifold-jsonrpc/src/listener.rs
//
// WebSocket listener: accept loop, per-connection tasks, frame handling.
// The listener owns every suspension point; the dispatcher only runs
// between a complete frame arriving and its reply being handed back.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;

use manifold_core::Dispatcher;

use crate::codec::handle_frame;

/// Configuration for the JSON-RPC listener.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcConfig {
    /// Host to bind to (e.g., "127.0.0.1" or "0.0.0.0").
    pub host: String,
    /// Port to listen on.
    pub port: u16,
}

impl Default for JsonRpcConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9001,
        }
    }
}

#[derive(Debug, Error)]
pub enum JsonRpcError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// JSON-RPC 2.0 WebSocket listener.
pub struct JsonRpcListener {
    config: JsonRpcConfig,
    dispatcher: Arc<Dispatcher>,
}

impl JsonRpcListener {
    pub fn new(config: JsonRpcConfig, dispatcher: Arc<Dispatcher>) -> Self {
        Self { config, dispatcher }
    }

    /// Accept connections until the task is aborted. Each connection runs
    /// in its own task; a failing connection never affects the others.
    pub async fn serve(self) -> Result<(), JsonRpcError> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        tracing::info!("JSON-RPC listener on ws://{}", addr);

        loop {
            let (stream, peer) = listener.accept().await?;
            let dispatcher = self.dispatcher.clone();
            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, dispatcher).await {
                    // A dropped connection also lands here; any in-flight
                    // reply for it is discarded with the task.
                    tracing::debug!("connection from {} closed: {}", peer, e);
                }
            });
        }
    }
}

async fn handle_connection(
    stream: TcpStream,
    dispatcher: Arc<Dispatcher>,
) -> Result<(), JsonRpcError> {
    let ws = tokio_tungstenite::accept_async(stream).await?;
    let (mut sink, mut source) = ws.split();

    while let Some(frame) = source.next().await {
        match frame? {
            Message::Text(text) => {
                if let Some(reply) = handle_frame(&dispatcher, text.as_ref()).await {
                    sink.send(Message::text(reply)).await?;
                }
            }
            Message::Ping(payload) => {
                sink.send(Message::Pong(payload)).await?;
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    Ok(())
}
