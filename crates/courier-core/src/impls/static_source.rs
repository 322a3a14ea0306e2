//! StaticAlbumSource - 固定データを返す AlbumSource
//!
//! 本物の取得ライブラリの代わりに、登録済みの album を返し、
//! download では `<title>.zip` を出力ディレクトリに書きます。
//! 呼び出し回数を数えるので、キャッシュのテストにも使えます。

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::domain::{
    AlbumId, AlbumInfo, AlbumSummary, FetchOptions, RankPeriod, SourceError, sanitize_title,
};
use crate::ports::AlbumSource;

/// Which source operation a call counter refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceCall {
    Download,
    Search,
    Ranking,
    Info,
    Cover,
}

#[derive(Default)]
struct Fixtures {
    albums: HashMap<AlbumId, AlbumInfo>,
    failures: HashMap<AlbumId, SourceError>,
    ranking: HashMap<RankPeriod, Vec<AlbumId>>,
}

/// In-process album source backed by registered fixtures.
#[derive(Default)]
pub struct StaticAlbumSource {
    fixtures: Mutex<Fixtures>,
    calls: Mutex<HashMap<SourceCall, usize>>,
    downloads_in_flight: AtomicUsize,
    /// Artificial latency for `download_album`, to mimic a slow remote.
    download_latency: Duration,
    /// Produce the album but skip writing the archive.
    skip_archive: bool,
}

impl StaticAlbumSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_album(self, info: AlbumInfo) -> Self {
        self.fixtures().albums.insert(info.album_id.clone(), info);
        self
    }

    /// Every call touching `album_id` fails with `error`.
    pub fn with_failure(self, album_id: AlbumId, error: SourceError) -> Self {
        self.fixtures().failures.insert(album_id, error);
        self
    }

    pub fn with_ranking(self, period: RankPeriod, album_ids: Vec<AlbumId>) -> Self {
        self.fixtures().ranking.insert(period, album_ids);
        self
    }

    pub fn with_download_latency(mut self, latency: Duration) -> Self {
        self.download_latency = latency;
        self
    }

    pub fn without_archive(mut self) -> Self {
        self.skip_archive = true;
        self
    }

    pub fn calls(&self, call: SourceCall) -> usize {
        self.call_counts().get(&call).copied().unwrap_or(0)
    }

    pub fn downloads_in_flight(&self) -> usize {
        self.downloads_in_flight.load(Ordering::SeqCst)
    }

    fn fixtures(&self) -> MutexGuard<'_, Fixtures> {
        self.fixtures.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn call_counts(&self) -> MutexGuard<'_, HashMap<SourceCall, usize>> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, call: SourceCall) {
        *self.call_counts().entry(call).or_insert(0) += 1;
    }

    fn lookup(&self, album_id: &AlbumId) -> Result<AlbumInfo, SourceError> {
        let fixtures = self.fixtures();
        if let Some(err) = fixtures.failures.get(album_id) {
            return Err(err.clone());
        }
        fixtures
            .albums
            .get(album_id)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(format!("album {album_id}")))
    }

    fn summary(info: &AlbumInfo) -> AlbumSummary {
        AlbumSummary {
            album_id: info.album_id.clone(),
            title: info.title.clone(),
        }
    }

    fn produce_archive(
        &self,
        album_id: &AlbumId,
        options: &FetchOptions,
    ) -> Result<Vec<AlbumSummary>, SourceError> {
        let info = self.lookup(album_id)?;
        if !self.download_latency.is_zero() {
            std::thread::sleep(self.download_latency);
        }
        if options.package_zip && !self.skip_archive {
            let archive = options
                .output_dir
                .join(format!("{}.zip", sanitize_title(&info.title)));
            std::fs::write(&archive, info.title.as_bytes())
                .map_err(|e| SourceError::Other(format!("write {}: {e}", archive.display())))?;
        }
        Ok(vec![Self::summary(&info)])
    }
}

impl AlbumSource for StaticAlbumSource {
    fn download_album(
        &self,
        album_id: &AlbumId,
        options: &FetchOptions,
    ) -> Result<Vec<AlbumSummary>, SourceError> {
        self.record(SourceCall::Download);
        self.downloads_in_flight.fetch_add(1, Ordering::SeqCst);
        let result = self.produce_archive(album_id, options);
        self.downloads_in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn search(&self, tag: &str, page: u32) -> Result<Vec<AlbumSummary>, SourceError> {
        self.record(SourceCall::Search);
        if page == 0 {
            return Err(SourceError::ParseFailure(format!("page {page} out of range")));
        }
        let fixtures = self.fixtures();
        let mut hits: Vec<AlbumSummary> = fixtures
            .albums
            .values()
            .filter(|info| info.tags.iter().any(|t| t == tag) || info.title.contains(tag))
            .map(Self::summary)
            .collect();
        hits.sort_by(|a, b| a.album_id.as_str().cmp(b.album_id.as_str()));
        Ok(hits)
    }

    fn ranking(&self, period: RankPeriod, _page: u32) -> Result<Vec<AlbumSummary>, SourceError> {
        self.record(SourceCall::Ranking);
        let fixtures = self.fixtures();
        let ids = fixtures
            .ranking
            .get(&period)
            .ok_or_else(|| SourceError::NotFound(format!("{period} ranking")))?;
        Ok(ids
            .iter()
            .filter_map(|id| fixtures.albums.get(id))
            .map(Self::summary)
            .collect())
    }

    fn album_info(&self, album_id: &AlbumId) -> Result<AlbumInfo, SourceError> {
        self.record(SourceCall::Info);
        self.lookup(album_id)
    }

    fn download_cover(&self, album_id: &AlbumId, dest: &Path) -> Result<(), SourceError> {
        self.record(SourceCall::Cover);
        self.lookup(album_id)?;
        // JPEG の SOI/EOI マーカーだけのダミー画像
        std::fs::write(dest, [0xFF, 0xD8, 0xFF, 0xD9])
            .map_err(|e| SourceError::Other(format!("write {}: {e}", dest.display())))
    }
}
