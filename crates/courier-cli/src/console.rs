use async_trait::async_trait;
use courier_core::impls::MemoryChannel;
use courier_core::ports::{ChannelError, PushChannel};
use serde_json::Value;

/// Prints every pushed frame, then hands it to an in-memory channel.
pub struct ConsoleChannel {
    inner: MemoryChannel,
}

impl ConsoleChannel {
    pub fn new(inner: MemoryChannel) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl PushChannel for ConsoleChannel {
    async fn send_json(&mut self, payload: &Value) -> Result<(), ChannelError> {
        println!("<< push {payload}");
        self.inner.send_json(payload).await
    }

    async fn close(&mut self) -> Result<(), ChannelError> {
        println!("<< push channel closed by server");
        self.inner.close().await
    }
}
