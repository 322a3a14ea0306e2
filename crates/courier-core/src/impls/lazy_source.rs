//! LazySource - album source を初回利用時に一度だけ構築する
//!
//! 起動時にネットワークへ触れないためのラッパー。
//! 構築は `OnceLock` で守られ、並行した初回呼び出しでも factory は一度しか走らない。

use std::path::Path;
use std::sync::{Arc, OnceLock};

use tracing::info;

use crate::domain::{AlbumId, AlbumInfo, AlbumSummary, FetchOptions, RankPeriod, SourceError};
use crate::ports::AlbumSource;

type SourceFactory = Box<dyn Fn() -> Arc<dyn AlbumSource> + Send + Sync>;

pub struct LazySource {
    factory: SourceFactory,
    source: OnceLock<Arc<dyn AlbumSource>>,
}

impl LazySource {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Arc<dyn AlbumSource> + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
            source: OnceLock::new(),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.source.get().is_some()
    }

    fn get(&self) -> &dyn AlbumSource {
        self.source
            .get_or_init(|| {
                info!("initializing album source");
                (self.factory)()
            })
            .as_ref()
    }
}

impl AlbumSource for LazySource {
    fn download_album(
        &self,
        album_id: &AlbumId,
        options: &FetchOptions,
    ) -> Result<Vec<AlbumSummary>, SourceError> {
        self.get().download_album(album_id, options)
    }

    fn search(&self, tag: &str, page: u32) -> Result<Vec<AlbumSummary>, SourceError> {
        self.get().search(tag, page)
    }

    fn ranking(&self, period: RankPeriod, page: u32) -> Result<Vec<AlbumSummary>, SourceError> {
        self.get().ranking(period, page)
    }

    fn album_info(&self, album_id: &AlbumId) -> Result<AlbumInfo, SourceError> {
        self.get().album_info(album_id)
    }

    fn download_cover(&self, album_id: &AlbumId, dest: &Path) -> Result<(), SourceError> {
        self.get().download_cover(album_id, dest)
    }
}
