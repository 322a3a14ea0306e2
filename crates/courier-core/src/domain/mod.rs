//! Domain model (IDs, album types, notifications, errors).

pub mod album;
pub mod client;
pub mod errors;
pub mod ids;
pub mod notification;

pub use album::{AlbumId, AlbumInfo, AlbumSummary, FetchOptions, RankPeriod, sanitize_title};
pub use client::ClientId;
pub use errors::{AdmissionError, ErrorKind, SourceError};
pub use ids::{JobId, ReclaimTicket};
pub use notification::{Notification, NotificationStatus};
