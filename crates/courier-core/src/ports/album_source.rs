//! AlbumSource port - 外部の取得ライブラリ
//!
//! album id を解決してファイル群をダウンロードし、必要なら zip にまとめる
//! ライブラリへのインターフェースです。呼び出しは同期（blocking）で、
//! 数分かかることもあるため event loop 上では決して呼ばないこと。
//! 呼び出し側は `tokio::task::spawn_blocking` 経由で実行します。

use std::path::Path;

use crate::domain::{AlbumId, AlbumInfo, AlbumSummary, FetchOptions, RankPeriod, SourceError};

/// Blocking album collaborator.
///
/// Implementations map their own failures into the closed [`SourceError`] set.
pub trait AlbumSource: Send + Sync {
    /// Download the album into `options.output_dir` and package it.
    ///
    /// With `package_zip` set, a successful run leaves `<sanitized title>.zip`
    /// in the output directory for the first returned album.
    fn download_album(
        &self,
        album_id: &AlbumId,
        options: &FetchOptions,
    ) -> Result<Vec<AlbumSummary>, SourceError>;

    fn search(&self, tag: &str, page: u32) -> Result<Vec<AlbumSummary>, SourceError>;

    fn ranking(&self, period: RankPeriod, page: u32) -> Result<Vec<AlbumSummary>, SourceError>;

    fn album_info(&self, album_id: &AlbumId) -> Result<AlbumInfo, SourceError>;

    /// Write the album cover (JPEG) to `dest`.
    fn download_cover(&self, album_id: &AlbumId, dest: &Path) -> Result<(), SourceError>;
}
