//! PushChannel port - サーバーからクライアントへの通知経路（WebSocket 等）

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("channel already closed")]
    Closed,

    #[error("payload serialization failed: {0}")]
    Serialize(String),

    #[error("transport error: {0}")]
    Transport(String),
}

/// Server-to-client message connection.
///
/// A channel is owned by the connection registry once connected and is only
/// driven from the delivery loop.
#[async_trait]
pub trait PushChannel: Send {
    async fn send_json(&mut self, payload: &serde_json::Value) -> Result<(), ChannelError>;

    async fn close(&mut self) -> Result<(), ChannelError>;
}
