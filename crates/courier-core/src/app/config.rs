//! ServiceConfig - サービス全体の設定値

use std::path::PathBuf;
use std::time::Duration;

use crate::domain::FetchOptions;

/// Process-wide settings, built once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    /// Reported by the health probe.
    pub app_name: String,
    /// Shared directory for job outputs and covers.
    pub artifact_root: PathBuf,
    /// Lifetime of a produced album archive.
    pub artifact_ttl: Duration,
    /// Lifetime of a served cover image.
    pub cover_ttl: Duration,
    pub search_cache_ttl: Duration,
    /// Used for both ranking and album info caches.
    pub detail_cache_ttl: Duration,
    /// Upper bound a worker waits for the delivery loop.
    pub handoff_timeout: Duration,
    pub fetch_options: FetchOptions,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            app_name: "courier".to_string(),
            artifact_root: PathBuf::from("temp"),
            artifact_ttl: Duration::from_secs(600),
            cover_ttl: Duration::from_secs(60),
            search_cache_ttl: Duration::from_secs(300),
            detail_cache_ttl: Duration::from_secs(3600),
            handoff_timeout: Duration::from_secs(10),
            fetch_options: FetchOptions::default(),
        }
    }
}
