//! Impls - ports の実装（プロセス内・テスト用）
//!
//! # 含まれる実装
//! - **MemoryChannel**: tokio mpsc による PushChannel
//! - **StaticAlbumSource**: 固定データの AlbumSource
//! - **LazySource**: 初回利用時に構築する AlbumSource ラッパー
//!
//! 本物の取得ライブラリや WebSocket の adapter は別クレートで実装します。

pub mod lazy_source;
pub mod memory_channel;
pub mod static_source;

pub use self::lazy_source::LazySource;
pub use self::memory_channel::{MemoryChannel, MemoryReceiver};
pub use self::static_source::{SourceCall, StaticAlbumSource};
