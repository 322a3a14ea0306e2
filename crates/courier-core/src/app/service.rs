//! CourierService - サービスコンテキスト
//!
//! 起動時に一度だけ構築し、`Arc` で全 handler に渡します。
//! モジュールレベルのグローバル状態は持たない。

use std::sync::Arc;

use serde_json::Value;

use crate::app::ServiceConfig;
use crate::cache::TtlCache;
use crate::jobs::{JobRunner, Reclaimer};
use crate::ports::{AlbumSource, Clock};
use crate::registry::ConnectionRegistry;

/// Read-through caches, one per lookup endpoint.
pub struct LookupCaches {
    pub search: TtlCache<Value>,
    pub rank: TtlCache<Value>,
    pub info: TtlCache<Value>,
}

impl LookupCaches {
    pub fn clear(&self) {
        self.search.clear();
        self.rank.clear();
        self.info.clear();
    }
}

pub struct CourierService {
    pub(crate) config: ServiceConfig,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) source: Arc<dyn AlbumSource>,
    pub(crate) registry: ConnectionRegistry,
    pub(crate) runner: JobRunner,
    pub(crate) reclaimer: Reclaimer,
    pub(crate) caches: LookupCaches,
}

impl CourierService {
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn runner(&self) -> &JobRunner {
        &self.runner
    }

    pub fn reclaimer(&self) -> &Reclaimer {
        &self.reclaimer
    }

    pub fn caches(&self) -> &LookupCaches {
        &self.caches
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn source(&self) -> &Arc<dyn AlbumSource> {
        &self.source
    }

    /// Stop the background loops (delivery, reclamation).
    pub fn shutdown(&self) {
        self.registry.shutdown();
        self.reclaimer.shutdown();
    }
}
