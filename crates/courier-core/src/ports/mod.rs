//! Ports - 抽象化レイヤー
//!
//! 外部システム（取得ライブラリ、WebSocket、時計）への境界を trait で定義します。

pub mod album_source;
pub mod clock;
pub mod id_generator;
pub mod push_channel;

pub use self::album_source::AlbumSource;
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::push_channel::{ChannelError, PushChannel};
