use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures::stream::StreamExt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

/// A bidirectional text-frame channel to one client
#[async_trait]
pub trait SocketWrapper: Send {
    async fn send_message(&mut self, frame: String) -> Result<(), SocketError>;

    /// Next text frame, or `None` once the peer has gone away
    async fn receive_message(&mut self) -> Result<Option<String>, SocketError>;

    async fn close(&mut self) -> Result<(), SocketError>;
}

/// Consumer of the text frames a client sends
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle_message(&self, connection_id: &str, message: String);
}

#[derive(Error, Debug)]
pub enum SocketError {
    #[error("socket already closed")]
    ConnectionClosed,

    #[error("send failed: {0}")]
    SendFailed(String),

    #[error("receive failed: {0}")]
    ReceiveFailed(String),
}

#[async_trait]
impl SocketWrapper for WebSocket {
    async fn send_message(&mut self, frame: String) -> Result<(), SocketError> {
        self.send(Message::Text(frame))
            .await
            .map_err(|e| SocketError::SendFailed(e.to_string()))
    }

    async fn receive_message(&mut self) -> Result<Option<String>, SocketError> {
        while let Some(frame) = self.next().await {
            match frame.map_err(|e| SocketError::ReceiveFailed(e.to_string()))? {
                Message::Text(text) => return Ok(Some(text)),
                Message::Close(_) => return Ok(None),
                // Ping/pong are answered by axum, binary carries nothing here
                Message::Binary(_) | Message::Ping(_) | Message::Pong(_) => {}
            }
        }
        Ok(None)
    }

    async fn close(&mut self) -> Result<(), SocketError> {
        self.send(Message::Close(None))
            .await
            .map_err(|_| SocketError::ConnectionClosed)
    }
}

/// Why a connection loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shutdown {
    PeerClosed,
    OutboundDropped,
}

/// One live client: pumps inbound frames into the handler and outbound frames
/// from the connection manager's channel into the socket
pub struct Connection {
    pub connection_id: String,
    socket: Box<dyn SocketWrapper>,
    outbound: mpsc::UnboundedReceiver<String>,
    handler: Arc<dyn MessageHandler>,
}

impl Connection {
    pub fn new(
        connection_id: String,
        socket: Box<dyn SocketWrapper>,
        outbound: mpsc::UnboundedReceiver<String>,
        handler: Arc<dyn MessageHandler>,
    ) -> Self {
        Self {
            connection_id,
            socket,
            outbound,
            handler,
        }
    }

    /// Drive the connection until either side goes away
    pub async fn run(mut self) -> Result<(), SocketError> {
        let shutdown = loop {
            tokio::select! {
                frame = self.outbound.recv() => match frame {
                    Some(frame) => self.socket.send_message(frame).await?,
                    None => break Shutdown::OutboundDropped,
                },
                frame = self.socket.receive_message() => match frame? {
                    Some(frame) => self.handler.handle_message(&self.connection_id, frame).await,
                    None => break Shutdown::PeerClosed,
                },
            }
        };

        debug!(connection_id = %self.connection_id, reason = ?shutdown, "Connection loop finished");
        if shutdown == Shutdown::OutboundDropped {
            let _ = self.socket.close().await;
        }
        Ok(())
    }
}
