#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use courier_core::domain::{AlbumId, AlbumInfo};
use courier_core::impls::StaticAlbumSource;
use courier_core::ports::AlbumSource;
use courier_core::{CourierService, ServiceBuilder, ServiceConfig};
use tempfile::TempDir;

pub const TITLE: &str = "［酸菜鱼ゅ°］ヒルチャールに败北した胡桃 表情、台词差分";

pub fn album(id: &str, title: &str, tags: &[&str]) -> AlbumInfo {
    AlbumInfo {
        album_id: AlbumId::parse(id).unwrap(),
        title: title.to_string(),
        authors: vec!["someone".to_string()],
        tags: tags.iter().map(|t| t.to_string()).collect(),
        view_count: 120,
        like_count: 7,
        page_count: 0,
    }
}

pub fn default_source() -> StaticAlbumSource {
    StaticAlbumSource::new()
        .with_album(album("42", TITLE, &["full color", "foo"]))
        .with_album(album("43", "another", &["foo"]))
}

pub struct TestService {
    pub root: TempDir,
    pub service: Arc<CourierService>,
}

pub fn service_with(source: Arc<dyn AlbumSource>, tweak: impl FnOnce(&mut ServiceConfig)) -> TestService {
    let root = TempDir::new().unwrap();
    let mut config = ServiceConfig {
        artifact_root: root.path().to_path_buf(),
        handoff_timeout: Duration::from_secs(5),
        ..ServiceConfig::default()
    };
    tweak(&mut config);
    let service = ServiceBuilder::new(config).source(source).build().unwrap();
    TestService { root, service }
}
