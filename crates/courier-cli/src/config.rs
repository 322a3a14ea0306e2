//! コマンドライン / 環境変数による設定
//!
//! ```bash
//! courier --artifact-root ./temp --artifact-ttl-secs 600 --album 422866
//! COURIER_ARTIFACT_ROOT=/var/lib/courier courier
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use courier_core::ServiceConfig;
use courier_core::domain::FetchOptions;

#[derive(Debug, Clone, Parser)]
#[command(name = "courier")]
#[command(about = "Album download service: run one job end-to-end against the demo source")]
#[command(version)]
pub struct Config {
    /// Name reported by the health probe
    #[arg(long, default_value = "courier", env = "COURIER_APP_NAME")]
    pub app_name: String,

    /// Directory for job outputs and cover images
    #[arg(long, default_value = "temp", env = "COURIER_ARTIFACT_ROOT")]
    pub artifact_root: PathBuf,

    // === 回収 ===
    /// Seconds a packaged archive stays downloadable
    #[arg(long, default_value = "600", env = "COURIER_ARTIFACT_TTL_SECS")]
    pub artifact_ttl_secs: u64,

    /// Seconds a served cover image is kept on disk
    #[arg(long, default_value = "60", env = "COURIER_COVER_TTL_SECS")]
    pub cover_ttl_secs: u64,

    // === キャッシュ ===
    #[arg(long, default_value = "300", env = "COURIER_SEARCH_CACHE_TTL_SECS")]
    pub search_cache_ttl_secs: u64,

    /// Used for ranking and album info
    #[arg(long, default_value = "3600", env = "COURIER_DETAIL_CACHE_TTL_SECS")]
    pub detail_cache_ttl_secs: u64,

    /// Milliseconds a worker waits for the delivery loop
    #[arg(long, default_value = "10000", env = "COURIER_HANDOFF_TIMEOUT_MS")]
    pub handoff_timeout_ms: u64,

    // === 取得 ===
    #[arg(long, default_value = "30", env = "COURIER_IMAGE_CONCURRENCY")]
    pub image_concurrency: usize,

    #[arg(long, default_value = "8", env = "COURIER_PHOTO_CONCURRENCY")]
    pub photo_concurrency: usize,

    #[arg(long, default_value = "5", env = "COURIER_RETRY_TIMES")]
    pub retry_times: u32,

    // === デモ ===
    /// Album to download in the demo run
    #[arg(long, default_value = "422866")]
    pub album: String,

    /// Client id the demo opens its notification channel with
    #[arg(long, default_value = "demo-client")]
    pub client_id: String,
}

impl Config {
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            app_name: self.app_name.clone(),
            artifact_root: self.artifact_root.clone(),
            artifact_ttl: Duration::from_secs(self.artifact_ttl_secs),
            cover_ttl: Duration::from_secs(self.cover_ttl_secs),
            search_cache_ttl: Duration::from_secs(self.search_cache_ttl_secs),
            detail_cache_ttl: Duration::from_secs(self.detail_cache_ttl_secs),
            handoff_timeout: Duration::from_millis(self.handoff_timeout_ms),
            fetch_options: FetchOptions {
                output_dir: self.artifact_root.clone(),
                image_concurrency: self.image_concurrency,
                photo_concurrency: self.photo_concurrency,
                retry_times: self.retry_times,
                ..FetchOptions::default()
            },
        }
    }

    /// Upper bound for the demo to wait on its notification.
    pub fn notification_wait(&self) -> Duration {
        Duration::from_millis(self.handoff_timeout_ms) * 3
    }
}
