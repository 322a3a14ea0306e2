//! Reclaimer - artifact の遅延削除
//!
//! # 実装
//! 削除ごとにスレッドを眠らせるのではなく、一本のバックグラウンドタスクが
//! 期限順の BinaryHeap（min-heap）を見て、期限が来たものから削除します。
//! `schedule_delete` は同期関数なので blocking worker からも呼べます。
//!
//! 削除は best-effort。既に消えている、権限がない等はログに残すだけ。

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::{ErrorKind, ReclaimTicket};
use crate::ports::IdGenerator;

/// Roughly thirty years; stands in for delays too large to represent.
const FAR_FUTURE_SECS: u64 = 30 * 365 * 24 * 60 * 60;

/// Scheduled deletion entry. Reverse ordering turns BinaryHeap into a min-heap.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ScheduledDeletion {
    due: Instant,
    ticket: ReclaimTicket,
    path: PathBuf,
}

impl PartialOrd for ScheduledDeletion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledDeletion {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.ticket.cmp(&self.ticket))
    }
}

#[derive(Default)]
struct ReclaimState {
    scheduled: BinaryHeap<ScheduledDeletion>,
    /// Tickets still live. Cancelled entries stay in the heap and are skipped.
    pending: HashSet<ReclaimTicket>,
}

struct ReclaimerInner {
    state: Mutex<ReclaimState>,
    notify: Notify,
    shutdown: CancellationToken,
    ids: Arc<dyn IdGenerator>,
}

/// Handle to the deletion scheduler. Cloning is cheap.
#[derive(Clone)]
pub struct Reclaimer {
    inner: Arc<ReclaimerInner>,
}

impl Reclaimer {
    /// Start the background task on the current tokio runtime.
    pub fn start(ids: Arc<dyn IdGenerator>) -> Self {
        let inner = Arc::new(ReclaimerInner {
            state: Mutex::new(ReclaimState::default()),
            notify: Notify::new(),
            shutdown: CancellationToken::new(),
            ids,
        });
        tokio::spawn(run_reclaimer(Arc::clone(&inner)));
        Self { inner }
    }

    /// Delete `path` (file or directory tree) once `delay` has passed.
    pub fn schedule_delete(&self, path: impl Into<PathBuf>, delay: Duration) -> ReclaimTicket {
        let path = path.into();
        let ticket = self.inner.ids.generate_ticket();
        {
            let mut state = self.inner.lock();
            state.pending.insert(ticket);
            state.scheduled.push(ScheduledDeletion {
                due: deadline_after(delay),
                ticket,
                path: path.clone(),
            });
        }
        // ロックの外で通知（待機中でなくても permit が残る）
        self.inner.notify.notify_one();
        debug!(%ticket, path = %path.display(), delay_secs = delay.as_secs_f64(), "deletion scheduled");
        ticket
    }

    /// Withdraw a pending deletion. Returns false when it already ran or was unknown.
    pub fn cancel(&self, ticket: ReclaimTicket) -> bool {
        let removed = self.inner.lock().pending.remove(&ticket);
        if removed {
            debug!(%ticket, "deletion cancelled");
        }
        removed
    }

    pub fn pending(&self) -> usize {
        self.inner.lock().pending.len()
    }

    /// Stop the scheduler. Deletions that have not come due are abandoned.
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
    }
}

/// `now + delay`, clamped to a distant deadline instead of overflowing.
fn deadline_after(delay: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(delay)
        .unwrap_or_else(|| now + Duration::from_secs(FAR_FUTURE_SECS))
}

impl ReclaimerInner {
    fn lock(&self) -> MutexGuard<'_, ReclaimState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Pop every live entry whose time has come; return them and the next wake-up.
    fn take_due(&self, now: Instant) -> (Vec<ScheduledDeletion>, Option<Instant>) {
        let mut state = self.lock();
        let mut due = Vec::new();
        while let Some(entry) = state.scheduled.peek() {
            if entry.due > now {
                break;
            }
            let Some(entry) = state.scheduled.pop() else {
                break;
            };
            if state.pending.remove(&entry.ticket) {
                due.push(entry);
            }
        }
        let next = state.scheduled.peek().map(|entry| entry.due);
        (due, next)
    }
}

async fn run_reclaimer(inner: Arc<ReclaimerInner>) {
    loop {
        let (due, next_wake) = inner.take_due(Instant::now());
        for entry in due {
            tokio::spawn(async move {
                delete_path(&entry.path).await;
            });
        }

        if let Some(wake_time) = next_wake {
            tokio::select! {
                _ = inner.shutdown.cancelled() => break,
                _ = inner.notify.notified() => {},
                _ = tokio::time::sleep_until(wake_time) => {},
            }
        } else {
            tokio::select! {
                _ = inner.shutdown.cancelled() => break,
                _ = inner.notify.notified() => {},
            }
        }
    }

    let abandoned = inner.lock().pending.len();
    info!(abandoned, "reclaimer stopped");
}

/// Remove a file or a directory tree. Never fails; problems are logged.
pub async fn delete_path(path: &Path) {
    match remove_path(path).await {
        Ok(()) => info!(path = %path.display(), "artifact reclaimed"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "artifact already gone");
        }
        Err(e) => warn!(
            path = %path.display(),
            kind = ?ErrorKind::Infrastructure,
            error = %e,
            "artifact deletion failed"
        ),
    }
}

async fn remove_path(path: &Path) -> io::Result<()> {
    let meta = tokio::fs::symlink_metadata(path).await?;
    if meta.is_dir() {
        tokio::fs::remove_dir_all(path).await
    } else {
        tokio::fs::remove_file(path).await
    }
}
