//! courier-core
//!
//! Asynchronous album download service: accept a job, run it off the request
//! path, notify the client exactly once over its push channel, and reclaim the
//! produced artifact after a delay.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, album, client, notification, errors）
//! - **ports**: 抽象化レイヤー（AlbumSource, PushChannel, Clock, IdGenerator）
//! - **impls**: プロセス内の実装（MemoryChannel, StaticAlbumSource, LazySource）
//! - **cache**: TTL 付き read-through cache
//! - **registry**: client ごとの push channel と一回限りの配送
//! - **jobs**: ダウンロードジョブの実行と artifact の遅延削除
//! - **app**: 設定、サービスコンテキスト、builder
//! - **api**: framework 非依存の HTTP handler

pub mod api;
pub mod app;
pub mod cache;
pub mod domain;
pub mod impls;
pub mod jobs;
pub mod ports;
pub mod registry;

pub use app::{CourierService, ServiceBuilder, ServiceConfig};
