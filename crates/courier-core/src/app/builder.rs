//! ServiceBuilder - CourierService の構築とワイヤリング
//!
//! # Fail-fast 設計
//! - album source が設定されていなければ `BuildError::MissingSource`
//! - artifact root が作れなければ `BuildError::ArtifactRoot`

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::app::{CourierService, LookupCaches, ServiceConfig};
use crate::cache::TtlCache;
use crate::jobs::{JobRunner, JobSettings, Reclaimer};
use crate::ports::{AlbumSource, Clock, IdGenerator, SystemClock, UlidGenerator};
use crate::registry::ConnectionRegistry;

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("no album source configured")]
    MissingSource,

    #[error("cannot prepare artifact root {path}: {source}")]
    ArtifactRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Builds a [`CourierService`].
///
/// # 使用例
/// ```ignore
/// let service = ServiceBuilder::new(config)
///     .source(Arc::new(StaticAlbumSource::new()))
///     .build()?;
/// ```
pub struct ServiceBuilder {
    config: ServiceConfig,
    source: Option<Arc<dyn AlbumSource>>,
    clock: Arc<dyn Clock>,
}

impl ServiceBuilder {
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            config,
            source: None,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn source(mut self, source: Arc<dyn AlbumSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Wire everything. Must run inside a tokio runtime (starts the reclaimer).
    pub fn build(self) -> Result<Arc<CourierService>, BuildError> {
        let source = self.source.ok_or(BuildError::MissingSource)?;
        let config = self.config;

        std::fs::create_dir_all(&config.artifact_root).map_err(|source| {
            BuildError::ArtifactRoot {
                path: config.artifact_root.clone(),
                source,
            }
        })?;

        let ids: Arc<dyn IdGenerator> = Arc::new(UlidGenerator::new(Arc::clone(&self.clock)));
        let registry = ConnectionRegistry::new();
        let reclaimer = Reclaimer::start(Arc::clone(&ids));
        let runner = JobRunner::new(
            Arc::clone(&source),
            registry.handoff(),
            reclaimer.clone(),
            ids,
            JobSettings {
                artifact_root: config.artifact_root.clone(),
                fetch_options: config.fetch_options.clone(),
                reclaim_delay: config.artifact_ttl,
                handoff_timeout: config.handoff_timeout,
            },
        );
        let caches = LookupCaches {
            search: TtlCache::with_clock(config.search_cache_ttl, Arc::clone(&self.clock)),
            rank: TtlCache::with_clock(config.detail_cache_ttl, Arc::clone(&self.clock)),
            info: TtlCache::with_clock(config.detail_cache_ttl, Arc::clone(&self.clock)),
        };

        info!(
            app = %config.app_name,
            artifact_root = %config.artifact_root.display(),
            artifact_ttl_secs = config.artifact_ttl.as_secs(),
            "service built"
        );

        Ok(Arc::new(CourierService {
            config,
            clock: self.clock,
            source,
            registry,
            runner,
            reclaimer,
            caches,
        }))
    }
}
