//! MemoryChannel - プロセス内の PushChannel 実装
//!
//! WebSocket の代わりに tokio mpsc で client 側へ JSON を流します。
//! テストと CLI デモで使用。

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::ports::{ChannelError, PushChannel};

/// Server side of an in-memory push channel.
pub struct MemoryChannel {
    tx: Option<mpsc::UnboundedSender<serde_json::Value>>,
}

/// Client side: receives the JSON frames, then `None` once the server closed.
pub struct MemoryReceiver {
    rx: mpsc::UnboundedReceiver<serde_json::Value>,
}

impl MemoryChannel {
    pub fn pair() -> (MemoryChannel, MemoryReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (MemoryChannel { tx: Some(tx) }, MemoryReceiver { rx })
    }
}

#[async_trait]
impl PushChannel for MemoryChannel {
    async fn send_json(&mut self, payload: &serde_json::Value) -> Result<(), ChannelError> {
        let tx = self.tx.as_ref().ok_or(ChannelError::Closed)?;
        tx.send(payload.clone())
            .map_err(|_| ChannelError::Transport("receiver dropped".to_string()))
    }

    async fn close(&mut self) -> Result<(), ChannelError> {
        // sender を drop すると受信側の recv() が None を返す
        self.tx.take().map(drop).ok_or(ChannelError::Closed)
    }
}

impl MemoryReceiver {
    pub async fn recv(&mut self) -> Option<serde_json::Value> {
        self.rx.recv().await
    }

    /// Non-blocking receive; `None` if nothing is queued right now.
    pub fn try_recv(&mut self) -> Option<serde_json::Value> {
        self.rx.try_recv().ok()
    }
}
