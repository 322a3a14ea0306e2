mod config;
mod console;
mod logging;

use std::sync::Arc;

use anyhow::{Context, bail};
use clap::Parser;
use courier_core::api::{self, ApiResponse, Body};
use courier_core::domain::{AlbumId, AlbumInfo, ClientId, RankPeriod};
use courier_core::impls::{LazySource, MemoryChannel, StaticAlbumSource};
use courier_core::ports::AlbumSource;
use courier_core::{CourierService, ServiceBuilder};
use serde_json::json;
use tokio::time::{Duration, timeout};
use tracing::info;

use crate::config::Config;
use crate::console::ConsoleChannel;

fn demo_album(id: &str, title: &str, tags: &[&str], views: u64) -> anyhow::Result<AlbumInfo> {
    Ok(AlbumInfo {
        album_id: AlbumId::parse(id)?,
        title: title.to_string(),
        authors: vec!["demo".to_string()],
        tags: tags.iter().map(|t| t.to_string()).collect(),
        view_count: views,
        like_count: views / 10,
        page_count: 12,
    })
}

fn demo_source(album: &str) -> anyhow::Result<StaticAlbumSource> {
    let requested = demo_album(
        album,
        "ヒルチャールに败北した胡桃 表情、台词差分",
        &["full color", "genshin"],
        5400,
    )?;
    let other = demo_album("350234", "another album", &["full color"], 880)?;
    let ranking = vec![requested.album_id.clone(), other.album_id.clone()];
    Ok(StaticAlbumSource::new()
        .with_album(requested)
        .with_album(other)
        .with_ranking(RankPeriod::Week, ranking)
        .with_download_latency(Duration::from_millis(200)))
}

fn print_response(route: &str, resp: &ApiResponse) {
    match &resp.body {
        Body::Json(value) => println!(">> {route} {} {value}", resp.status),
        Body::File { path, content_type } => {
            println!(">> {route} {} <{content_type}> {}", resp.status, path.display())
        }
    }
}

async fn run(config: &Config, service: &CourierService) -> anyhow::Result<()> {
    let now_ms = service.clock().now().timestamp_millis();
    print_response(&format!("GET /health/{now_ms}"), &api::health::health(service, now_ms));
    print_response("GET /search/full color/1", &api::lookup::search(service, "full color", "1").await);
    print_response("GET /rank/week", &api::lookup::rank(service, "week").await);
    print_response(
        &format!("GET /info/{}", config.album),
        &api::lookup::info(service, &config.album).await,
    );
    print_response(
        &format!("GET /cover/{}", config.album),
        &api::lookup::cover(service, &config.album).await,
    );

    let (channel, mut rx) = MemoryChannel::pair();
    let client_id = ClientId::new(config.client_id.clone());
    api::notifications::open(service, client_id, Box::new(ConsoleChannel::new(channel))).await;

    let body = serde_json::to_vec(&json!({ "client_id": config.client_id }))?;
    let accepted = api::download::submit(service, &config.album, &body).await;
    print_response(&format!("POST /download/album/{}", config.album), &accepted);
    if !accepted.is_success() {
        bail!("download request rejected");
    }

    let frame = timeout(config.notification_wait(), rx.recv())
        .await
        .context("no notification arrived in time")?
        .context("channel closed without a notification")?;
    if frame["status"] != "download_ready" {
        bail!("download failed: {}", frame["message"]);
    }
    let file_name = frame["file_name"]
        .as_str()
        .context("notification without file name")?;

    let pulled = api::download::pull(service, file_name).await;
    print_response(&format!("GET /download/{file_name}"), &pulled);
    info!(
        pending_reclaims = service.reclaimer().pending(),
        "demo run finished"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    logging::init_logging();

    let source = demo_source(&config.album)?;
    let source: Arc<dyn AlbumSource> = Arc::new(source);
    let lazy = LazySource::new(move || Arc::clone(&source));

    let service = ServiceBuilder::new(config.service_config())
        .source(Arc::new(lazy))
        .build()
        .context("building service")?;
    info!(app = %service.config().app_name, "courier ready");

    let result = run(&config, &service).await;
    service.shutdown();
    result
}
