//! App - アプリケーション層
//!
//! # 主要コンポーネント
//! - **ServiceConfig**: 設定値
//! - **ServiceBuilder**: 構築とワイヤリング
//! - **CourierService**: 全 handler が共有するサービスコンテキスト

pub mod builder;
pub mod config;
pub mod service;

pub use self::builder::{BuildError, ServiceBuilder};
pub use self::config::ServiceConfig;
pub use self::service::{CourierService, LookupCaches};
