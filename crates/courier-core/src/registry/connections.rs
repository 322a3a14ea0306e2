//! ConnectionRegistry - client id ごとに一本の push channel を管理
//!
//! # 状態
//! - `ClientId -> Registration` の map を一つの Mutex で守る
//! - Registration は世代番号（generation）を持つ。同じ client id で再接続すると
//!   新しい世代に置き換わり、古い接続からの disconnect は無視される
//!
//! # 一回限りの配送
//! `deliver_once` は map から registration を「取り出して」から送信する。
//! そのため同じ client id への二回目の呼び出しは必ず `NotFound` になる。

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::handoff::{DeliveryRequest, Handoff, run_dispatcher};
use crate::domain::{ClientId, Notification};
use crate::ports::{ChannelError, PushChannel};

/// Result of one delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Message sent and channel closed.
    Delivered,
    /// No channel registered, or the send failed and the registration was dropped.
    NotFound,
    /// The delivery loop did not answer within the hand-off timeout.
    TimedOut,
}

/// Token returned by `connect`, needed to disconnect exactly that registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    client_id: ClientId,
    generation: u64,
}

impl Connection {
    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }
}

struct Registration {
    generation: u64,
    channel: Box<dyn PushChannel>,
}

#[derive(Default)]
struct RegistryState {
    channels: HashMap<ClientId, Registration>,
    next_generation: u64,
}

pub(super) struct RegistryInner {
    state: Mutex<RegistryState>,
    /// 最初の connect 時に一度だけ起動される配送ループへの入口
    mailbox: OnceLock<mpsc::UnboundedSender<DeliveryRequest>>,
    shutdown: CancellationToken,
}

/// Shared handle to the registry. Cloning is cheap.
#[derive(Clone)]
pub struct ConnectionRegistry {
    inner: Arc<RegistryInner>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                state: Mutex::new(RegistryState::default()),
                mailbox: OnceLock::new(),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// Register `channel` as reachable at `client_id`.
    ///
    /// Replaces any previous registration for the same id; the replaced
    /// channel is closed best-effort. Must be called from inside the tokio
    /// runtime: the first call starts the delivery loop on it.
    pub async fn connect(&self, client_id: ClientId, channel: Box<dyn PushChannel>) -> Connection {
        self.ensure_dispatcher();

        let (generation, replaced) = {
            let mut state = self.inner.state.lock().await;
            state.next_generation += 1;
            let generation = state.next_generation;
            let replaced = state
                .channels
                .insert(client_id.clone(), Registration { generation, channel });
            (generation, replaced)
        };

        if let Some(mut old) = replaced {
            debug!(%client_id, old_generation = old.generation, "replacing notification channel");
            if let Err(e) = old.channel.close().await {
                debug!(%client_id, error = %e, "closing replaced channel failed");
            }
        }

        info!(%client_id, generation, "notification channel connected");
        Connection {
            client_id,
            generation,
        }
    }

    /// Drop the registration behind `connection` without sending anything.
    ///
    /// A no-op when the registration was already delivered or replaced.
    pub async fn disconnect(&self, connection: &Connection) {
        let mut state = self.inner.state.lock().await;
        let current = state
            .channels
            .get(&connection.client_id)
            .map(|r| r.generation);
        if current == Some(connection.generation) {
            state.channels.remove(&connection.client_id);
            info!(client_id = %connection.client_id, "notification channel disconnected");
        }
    }

    pub async fn is_connected(&self, client_id: &ClientId) -> bool {
        self.inner.state.lock().await.channels.contains_key(client_id)
    }

    pub async fn connected_clients(&self) -> usize {
        self.inner.state.lock().await.channels.len()
    }

    /// Send `notification` to `client_id`, then close and forget the channel.
    pub async fn deliver_once(
        &self,
        client_id: &ClientId,
        notification: &Notification,
    ) -> DeliveryOutcome {
        self.inner.deliver_once(client_id, notification).await
    }

    /// Thread-safe entry point for blocking worker code.
    pub fn handoff(&self) -> Handoff {
        Handoff::new(Arc::clone(&self.inner))
    }

    /// Stop the delivery loop. Pending hand-offs observe `NotFound`.
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
    }

    fn ensure_dispatcher(&self) {
        self.inner.mailbox.get_or_init(|| {
            let (tx, rx) = mpsc::unbounded_channel();
            let inner = Arc::clone(&self.inner);
            let shutdown = self.inner.shutdown.clone();
            tokio::spawn(run_dispatcher(inner, rx, shutdown));
            debug!("delivery loop started");
            tx
        });
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryInner {
    pub(super) fn mailbox(&self) -> Option<&mpsc::UnboundedSender<DeliveryRequest>> {
        self.mailbox.get()
    }

    pub(super) async fn deliver_once(
        &self,
        client_id: &ClientId,
        notification: &Notification,
    ) -> DeliveryOutcome {
        // 取り出してからロックを離す（送信中の await でロックを持たない）
        let registration = self.state.lock().await.channels.remove(client_id);
        let Some(mut registration) = registration else {
            info!(%client_id, "no notification channel registered, message dropped");
            return DeliveryOutcome::NotFound;
        };

        match send_and_close(registration.channel.as_mut(), notification).await {
            Ok(()) => {
                info!(%client_id, status = ?notification.status, "notification delivered");
                DeliveryOutcome::Delivered
            }
            Err(e) => {
                warn!(%client_id, error = %e, "notification delivery failed");
                DeliveryOutcome::NotFound
            }
        }
    }
}

async fn send_and_close(
    channel: &mut dyn PushChannel,
    notification: &Notification,
) -> Result<(), ChannelError> {
    let payload =
        serde_json::to_value(notification).map_err(|e| ChannelError::Serialize(e.to_string()))?;
    let sent = channel.send_json(&payload).await;
    // 送信に失敗しても close は試みる
    let closed = channel.close().await;
    sent?;
    if let Err(e) = closed {
        debug!(error = %e, "closing channel after delivery failed");
    }
    Ok(())
}
