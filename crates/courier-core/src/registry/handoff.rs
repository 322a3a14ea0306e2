//! Handoff - worker スレッドから配送ループへの受け渡し
//!
//! push channel は event loop 側の所有物なので、blocking worker は直接送信しない。
//! worker は `DeliveryRequest` を mailbox に入れ、返答を上限付きで待つ。
//! event loop が詰まっていても worker スレッドが永久に止まることはない。

use std::sync::Arc;
use std::sync::mpsc as std_mpsc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::connections::{DeliveryOutcome, RegistryInner};
use crate::domain::{ClientId, Notification};

pub(super) struct DeliveryRequest {
    client_id: ClientId,
    notification: Notification,
    reply: std_mpsc::SyncSender<DeliveryOutcome>,
}

/// Blocking-side handle onto the registry's delivery loop.
#[derive(Clone)]
pub struct Handoff {
    inner: Arc<RegistryInner>,
}

impl Handoff {
    pub(super) fn new(inner: Arc<RegistryInner>) -> Self {
        Self { inner }
    }

    /// Deliver from a blocking context, waiting at most `timeout` for the loop.
    ///
    /// Must not be called on a runtime worker thread; use
    /// [`ConnectionRegistry::deliver_once`](super::ConnectionRegistry::deliver_once) there.
    pub fn deliver_blocking(
        &self,
        client_id: &ClientId,
        notification: Notification,
        timeout: Duration,
    ) -> DeliveryOutcome {
        // 一度も connect されていなければ配送ループも登録もない
        let Some(mailbox) = self.inner.mailbox() else {
            debug!(%client_id, "delivery loop not started, no channel was ever connected");
            return DeliveryOutcome::NotFound;
        };

        let (reply, answer) = std_mpsc::sync_channel(1);
        let request = DeliveryRequest {
            client_id: client_id.clone(),
            notification,
            reply,
        };
        if mailbox.send(request).is_err() {
            warn!(%client_id, "delivery loop is gone");
            return DeliveryOutcome::NotFound;
        }

        match answer.recv_timeout(timeout) {
            Ok(outcome) => outcome,
            Err(std_mpsc::RecvTimeoutError::Timeout) => {
                warn!(%client_id, timeout_ms = timeout.as_millis() as u64, "delivery hand-off timed out");
                DeliveryOutcome::TimedOut
            }
            Err(std_mpsc::RecvTimeoutError::Disconnected) => {
                warn!(%client_id, "delivery loop dropped the request");
                DeliveryOutcome::NotFound
            }
        }
    }
}

/// Event-loop side: drain the mailbox, one spawned delivery per request.
pub(super) async fn run_dispatcher(
    inner: Arc<RegistryInner>,
    mut rx: mpsc::UnboundedReceiver<DeliveryRequest>,
    shutdown: CancellationToken,
) {
    loop {
        let request = tokio::select! {
            _ = shutdown.cancelled() => break,
            request = rx.recv() => request,
        };
        let Some(request) = request else {
            break;
        };

        let inner = Arc::clone(&inner);
        tokio::spawn(async move {
            let outcome = inner
                .deliver_once(&request.client_id, &request.notification)
                .await;
            // worker がもう待っていなくても構わない
            let _ = request.reply.try_send(outcome);
        });
    }
    debug!("delivery loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::MemoryChannel;
    use crate::ports::{ChannelError, PushChannel};
    use crate::registry::ConnectionRegistry;
    use async_trait::async_trait;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn blocking_worker_delivers_through_the_loop() {
        let registry = ConnectionRegistry::new();
        let (channel, mut rx) = MemoryChannel::pair();
        registry.connect(ClientId::new("abc"), Box::new(channel)).await;

        let handoff = registry.handoff();
        let outcome = tokio::task::spawn_blocking(move || {
            handoff.deliver_blocking(
                &ClientId::new("abc"),
                Notification::ready("x.zip"),
                Duration::from_secs(5),
            )
        })
        .await
        .unwrap();

        assert_eq!(outcome, DeliveryOutcome::Delivered);
        assert_eq!(rx.recv().await.unwrap()["file_name"], "x.zip");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn never_connected_registry_reports_not_found() {
        let registry = ConnectionRegistry::new();
        let handoff = registry.handoff();

        let outcome = tokio::task::spawn_blocking(move || {
            handoff.deliver_blocking(
                &ClientId::new("abc"),
                Notification::error("", "x"),
                Duration::from_secs(1),
            )
        })
        .await
        .unwrap();

        assert_eq!(outcome, DeliveryOutcome::NotFound);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn stopped_loop_does_not_hang_the_worker() {
        let registry = ConnectionRegistry::new();
        let (channel, _rx) = MemoryChannel::pair();
        registry.connect(ClientId::new("abc"), Box::new(channel)).await;
        registry.shutdown();
        // ループが cancel を観測するまで少し待つ
        tokio::time::sleep(Duration::from_millis(50)).await;

        let handoff = registry.handoff();
        let outcome = tokio::task::spawn_blocking(move || {
            handoff.deliver_blocking(
                &ClientId::new("abc"),
                Notification::ready("x.zip"),
                Duration::from_millis(200),
            )
        })
        .await
        .unwrap();

        assert_ne!(outcome, DeliveryOutcome::Delivered);
    }

    /// A transport that accepts the frame but never finishes sending it.
    struct StalledChannel;

    #[async_trait]
    impl PushChannel for StalledChannel {
        async fn send_json(&mut self, _payload: &serde_json::Value) -> Result<(), ChannelError> {
            std::future::pending().await
        }

        async fn close(&mut self) -> Result<(), ChannelError> {
            Ok(())
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn stalled_send_times_out_within_bound() {
        let registry = ConnectionRegistry::new();
        registry
            .connect(ClientId::new("abc"), Box::new(StalledChannel))
            .await;

        let handoff = registry.handoff();
        let started = std::time::Instant::now();
        let outcome = tokio::task::spawn_blocking(move || {
            handoff.deliver_blocking(
                &ClientId::new("abc"),
                Notification::ready("x.zip"),
                Duration::from_millis(200),
            )
        })
        .await
        .unwrap();

        assert_eq!(outcome, DeliveryOutcome::TimedOut);
        assert!(started.elapsed() < Duration::from_secs(2));
        registry.shutdown();
    }
}
