mod common;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{TimeDelta, TimeZone, Utc};
use courier_core::api::{self, ApiResponse, Body};
use courier_core::domain::{
    AlbumId, AlbumInfo, AlbumSummary, FetchOptions, RankPeriod, SourceError,
};
use courier_core::impls::{SourceCall, StaticAlbumSource};
use courier_core::ports::{AlbumSource, FixedClock};
use courier_core::{ServiceBuilder, ServiceConfig};
use tempfile::TempDir;

use common::{default_source, service_with};

#[tokio::test]
async fn search_twice_within_ttl_hits_source_once() {
    let source = Arc::new(default_source());
    let t = service_with(source.clone(), |_| {});

    let first = api::lookup::search(&t.service, "foo", "1").await;
    let second = api::lookup::search(&t.service, "foo", "1").await;

    assert_eq!(first.status, ApiResponse::OK);
    assert_eq!(first, second);
    assert_eq!(first.json_body().unwrap().as_array().unwrap().len(), 2);
    assert_eq!(source.calls(SourceCall::Search), 1);

    // 別の key は別のエントリ
    api::lookup::search(&t.service, "foo", "2").await;
    assert_eq!(source.calls(SourceCall::Search), 2);
}

#[tokio::test]
async fn search_refetches_after_ttl() {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
    let source = Arc::new(default_source());
    let service = ServiceBuilder::new(ServiceConfig {
        artifact_root: dir.path().to_path_buf(),
        search_cache_ttl: Duration::from_secs(300),
        ..ServiceConfig::default()
    })
    .source(source.clone())
    .clock(clock.clone())
    .build()
    .unwrap();

    api::lookup::search(&service, "foo", "1").await;
    clock.advance(TimeDelta::seconds(299));
    api::lookup::search(&service, "foo", "1").await;
    assert_eq!(source.calls(SourceCall::Search), 1);

    clock.advance(TimeDelta::seconds(2));
    api::lookup::search(&service, "foo", "1").await;
    assert_eq!(source.calls(SourceCall::Search), 2);
}

#[tokio::test]
async fn info_not_found_is_reported_and_not_cached() {
    let source = Arc::new(default_source());
    let t = service_with(source.clone(), |_| {});

    for _ in 0..2 {
        let resp = api::lookup::info(&t.service, "999").await;
        assert_eq!(resp.status, ApiResponse::NOT_FOUND);
        let body = resp.json_body().unwrap();
        assert_eq!(body["status"], "error");
        assert!(body["message"].as_str().unwrap().starts_with("id=999 "));
    }
    assert_eq!(source.calls(SourceCall::Info), 2);
    assert!(t.service.caches().info.is_empty());
}

#[tokio::test]
async fn info_success_is_flat_and_cached() {
    let source = Arc::new(default_source());
    let t = service_with(source.clone(), |_| {});

    let resp = api::lookup::info(&t.service, "42").await;
    let body = resp.json_body().unwrap();
    assert_eq!(body["status"], "success");
    assert_eq!(body["album_id"], "42");
    assert!(body["tag"].as_array().unwrap().iter().any(|t| t == "full color"));
    assert!(body["view_count"].as_u64().unwrap() > 0);

    api::lookup::info(&t.service, "42").await;
    assert_eq!(source.calls(SourceCall::Info), 1);
}

#[tokio::test]
async fn rank_validates_period_and_caches() {
    let source = Arc::new(default_source().with_ranking(
        RankPeriod::Week,
        vec![AlbumId::parse("43").unwrap(), AlbumId::parse("42").unwrap()],
    ));
    let t = service_with(source.clone(), |_| {});

    let bad = api::lookup::rank(&t.service, "year").await;
    assert_eq!(bad.status, ApiResponse::BAD_REQUEST);

    let ok = api::lookup::rank(&t.service, "week").await;
    let list = ok.json_body().unwrap().as_array().unwrap().clone();
    assert_eq!(list[0]["album_id"], "43");
    api::lookup::rank(&t.service, "WEEK").await;
    assert_eq!(source.calls(SourceCall::Ranking), 1);

    let missing = api::lookup::rank(&t.service, "day").await;
    assert_eq!(missing.status, ApiResponse::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cover_is_served_then_reclaimed() {
    let source = Arc::new(default_source());
    let t = service_with(source.clone(), |c| {
        c.cover_ttl = Duration::from_millis(300);
    });

    let resp = api::lookup::cover(&t.service, "42").await;
    let Body::File { path, content_type } = resp.body.clone() else {
        panic!("expected a file body");
    };
    assert_eq!(content_type, api::CONTENT_TYPE_JPEG);
    assert_eq!(path, t.root.path().join("cover-42.jpg"));
    assert!(path.is_file());

    // まだ残っているうちはディスクから返す
    api::lookup::cover(&t.service, "42").await;
    assert_eq!(source.calls(SourceCall::Cover), 1);

    tokio::time::sleep(Duration::from_millis(900)).await;
    assert!(!path.exists());
}

#[tokio::test]
async fn cover_for_unknown_album_is_error() {
    let t = service_with(Arc::new(default_source()), |_| {});
    let resp = api::lookup::cover(&t.service, "999").await;
    assert_eq!(resp.status, ApiResponse::NOT_FOUND);
    assert!(!t.root.path().join("cover-999.jpg").exists());
}

/// Cover downloads write a truncated JPEG and then give up.
struct TruncatedCoverSource {
    inner: StaticAlbumSource,
    cover_calls: AtomicUsize,
}

impl AlbumSource for TruncatedCoverSource {
    fn download_album(
        &self,
        album_id: &AlbumId,
        options: &FetchOptions,
    ) -> Result<Vec<AlbumSummary>, SourceError> {
        self.inner.download_album(album_id, options)
    }

    fn search(&self, tag: &str, page: u32) -> Result<Vec<AlbumSummary>, SourceError> {
        self.inner.search(tag, page)
    }

    fn ranking(&self, period: RankPeriod, page: u32) -> Result<Vec<AlbumSummary>, SourceError> {
        self.inner.ranking(period, page)
    }

    fn album_info(&self, album_id: &AlbumId) -> Result<AlbumInfo, SourceError> {
        self.inner.album_info(album_id)
    }

    fn download_cover(&self, _album_id: &AlbumId, dest: &Path) -> Result<(), SourceError> {
        self.cover_calls.fetch_add(1, Ordering::SeqCst);
        std::fs::write(dest, [0xFF, 0xD8]).unwrap();
        Err(SourceError::RetriesExhausted("connection reset".into()))
    }
}

#[tokio::test]
async fn failed_cover_download_leaves_nothing_behind() {
    let source = Arc::new(TruncatedCoverSource {
        inner: default_source(),
        cover_calls: AtomicUsize::new(0),
    });
    let t = service_with(source.clone(), |c| {
        c.cover_ttl = Duration::from_millis(100);
    });

    let first = api::lookup::cover(&t.service, "42").await;
    assert_eq!(first.status, ApiResponse::UNAVAILABLE);
    assert_eq!(first.json_body().unwrap()["status"], "error");

    // 失敗した取得は次のリクエストで成功扱いにならない
    let second = api::lookup::cover(&t.service, "42").await;
    assert_eq!(second.status, ApiResponse::UNAVAILABLE);
    assert_eq!(source.cover_calls.load(Ordering::SeqCst), 2);

    let leftovers: Vec<_> = std::fs::read_dir(t.root.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert!(leftovers.is_empty(), "left on disk: {leftovers:?}");
    assert_eq!(t.service.reclaimer().pending(), 0);
}
