//! JobRunner - ダウンロードジョブを event loop の外で実行する
//!
//! # フロー
//! 1. `submit()` が JobId を払い出し、`spawn_blocking` にジョブを投げてすぐ返る
//! 2. worker スレッドで album source を呼ぶ（数分 block することもある）
//! 3. 結果を Notification にして Handoff 経由で一回だけ配送
//! 4. ジョブの出力ディレクトリを Reclaimer に登録
//!
//! リトライはしない。失敗は一度だけ通知して終わり。

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::reclaimer::Reclaimer;
use crate::domain::{
    AlbumId, AlbumSummary, ClientId, ErrorKind, FetchOptions, JobId, Notification, ReclaimTicket,
    SourceError, sanitize_title,
};
use crate::ports::{AlbumSource, IdGenerator};
use crate::registry::{DeliveryOutcome, Handoff};

/// Knobs of the job runner.
#[derive(Debug, Clone)]
pub struct JobSettings {
    /// Shared artifact root. Every job writes into `<root>/<job-id>/`.
    pub artifact_root: PathBuf,
    pub fetch_options: FetchOptions,
    /// How long a produced artifact stays on disk.
    pub reclaim_delay: Duration,
    /// Upper bound a worker waits for the delivery loop.
    pub handoff_timeout: Duration,
}

/// What happened to one job, for callers that want to wait on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub job_id: JobId,
    pub notification: Notification,
    pub delivery: DeliveryOutcome,
    pub reclaim: Option<ReclaimTicket>,
}

/// Handle of a submitted job. Dropping it does not cancel the job.
pub struct JobHandle {
    job_id: JobId,
    join: JoinHandle<JobReport>,
}

impl JobHandle {
    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    /// Wait for the job. `None` if the worker task itself died.
    pub async fn wait(self) -> Option<JobReport> {
        match self.join.await {
            Ok(report) => Some(report),
            Err(e) => {
                error!(job_id = %self.job_id, error = %e, "job worker task failed");
                None
            }
        }
    }
}

struct RunnerShared {
    source: Arc<dyn AlbumSource>,
    handoff: Handoff,
    reclaimer: Reclaimer,
    settings: JobSettings,
}

/// Runs download jobs on the blocking pool and reports through the registry.
#[derive(Clone)]
pub struct JobRunner {
    shared: Arc<RunnerShared>,
    ids: Arc<dyn IdGenerator>,
}

impl JobRunner {
    pub fn new(
        source: Arc<dyn AlbumSource>,
        handoff: Handoff,
        reclaimer: Reclaimer,
        ids: Arc<dyn IdGenerator>,
        settings: JobSettings,
    ) -> Self {
        Self {
            shared: Arc::new(RunnerShared {
                source,
                handoff,
                reclaimer,
                settings,
            }),
            ids,
        }
    }

    pub fn settings(&self) -> &JobSettings {
        &self.shared.settings
    }

    /// Start a job and return immediately.
    ///
    /// Accepts unconditionally; if `client_id` has no channel when the job
    /// finishes, the delivery is a logged no-op.
    pub fn submit(&self, album_id: AlbumId, client_id: ClientId) -> JobHandle {
        let job = DownloadJob {
            job_id: self.ids.generate_job_id(),
            album_id,
            client_id,
        };
        let job_id = job.job_id;
        info!(%job_id, album_id = %job.album_id, client_id = %job.client_id, "download job submitted");

        let shared = Arc::clone(&self.shared);
        let join = tokio::task::spawn_blocking(move || job.run(&shared));
        JobHandle { job_id, join }
    }
}

struct DownloadJob {
    job_id: JobId,
    album_id: AlbumId,
    client_id: ClientId,
}

/// Result of the fetch stage, before delivery.
enum Produced {
    Artifact { file_name: String },
    Failed { kind: ErrorKind, message: String },
}

impl DownloadJob {
    fn output_dir(&self, settings: &JobSettings) -> PathBuf {
        settings.artifact_root.join(self.job_id.to_string())
    }

    fn run(self, shared: &RunnerShared) -> JobReport {
        let settings = &shared.settings;
        let output_dir = self.output_dir(settings);
        let produced = self.produce(shared.source.as_ref(), settings, &output_dir);

        let (notification, delay) = match produced {
            Produced::Artifact { file_name } => {
                info!(job_id = %self.job_id, %file_name, "artifact ready");
                (Notification::ready(file_name), settings.reclaim_delay)
            }
            Produced::Failed { kind, message } => {
                warn!(job_id = %self.job_id, album_id = %self.album_id, ?kind, %message, "download job failed");
                // 途中まで書かれたファイルはすぐに片付ける
                (Notification::error("", message), Duration::ZERO)
            }
        };

        let delivery = shared.handoff.deliver_blocking(
            &self.client_id,
            notification.clone(),
            settings.handoff_timeout,
        );
        if delivery != DeliveryOutcome::Delivered {
            info!(job_id = %self.job_id, client_id = %self.client_id, ?delivery, "job outcome not delivered");
        }

        // 配送できたかどうかに関係なく出力は回収する（ディスク使用量を抑える）
        let reclaim = output_dir
            .exists()
            .then(|| shared.reclaimer.schedule_delete(&output_dir, delay));

        JobReport {
            job_id: self.job_id,
            notification,
            delivery,
            reclaim,
        }
    }

    fn produce(
        &self,
        source: &dyn AlbumSource,
        settings: &JobSettings,
        output_dir: &Path,
    ) -> Produced {
        if let Err(e) = std::fs::create_dir_all(output_dir) {
            error!(job_id = %self.job_id, path = %output_dir.display(), error = %e, "cannot create job directory");
            return Produced::Failed {
                kind: ErrorKind::Infrastructure,
                message: format!("id={} could not be prepared for download.", self.album_id),
            };
        }

        let options = settings.fetch_options.clone().with_output_dir(output_dir);
        let subject = format!("id={}", self.album_id);
        let albums = match fetch_guarded(source, &self.album_id, &options) {
            Ok(albums) => albums,
            Err(e) => {
                return Produced::Failed {
                    kind: e.kind(),
                    message: e.user_message(&subject),
                };
            }
        };

        let Some(first) = albums.first() else {
            return Produced::Failed {
                kind: ErrorKind::Domain,
                message: format!("{subject} download returned no results."),
            };
        };

        let archive = format!("{}.zip", sanitize_title(&first.title));
        if !output_dir.join(&archive).is_file() {
            return Produced::Failed {
                kind: ErrorKind::Infrastructure,
                message: format!("{subject} finished but '{archive}' was not produced."),
            };
        }

        Produced::Artifact {
            file_name: format!("{}/{archive}", self.job_id),
        }
    }
}

/// Call the source, turning a panic inside it into an ordinary failure.
fn fetch_guarded(
    source: &dyn AlbumSource,
    album_id: &AlbumId,
    options: &FetchOptions,
) -> Result<Vec<AlbumSummary>, SourceError> {
    catch_unwind(AssertUnwindSafe(|| source.download_album(album_id, options))).unwrap_or_else(
        |_| {
            error!(%album_id, "album source panicked");
            Err(SourceError::Other("album source crashed".to_string()))
        },
    )
}
