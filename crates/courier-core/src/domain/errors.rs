//! Errors - エラー型と分類
//!
//! 失敗は三つに分類されます。
//! - Admission: リクエストが受け付けられない（4xx、ジョブは開始しない）
//! - Domain: album source が報告した失敗（not-found など）
//! - Infrastructure: 配送先が消えた、artifact がない、削除に失敗した等。
//!   境界でログに落とし、呼び出し元へは伝播させない。

use thiserror::Error;

use super::client::ClientId;

/// ErrorKind は失敗の運用分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Admission,
    Domain,
    Infrastructure,
}

/// Failure reported by the album source, mapped once at the adapter boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("parse failure: {0}")]
    ParseFailure(String),

    #[error("retries exhausted: {0}")]
    RetriesExhausted(String),

    #[error("{0}")]
    Other(String),
}

impl SourceError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Domain
    }

    /// Short user-facing message about `subject` (e.g. `id=42`, `tag=foo page=1`).
    pub fn user_message(&self, subject: &str) -> String {
        match self {
            SourceError::NotFound(_) => format!("{subject} was not found."),
            SourceError::ParseFailure(_) => {
                format!("{subject} could not be parsed from the remote response.")
            }
            SourceError::RetriesExhausted(_) => {
                format!("{subject} request failed after all retries.")
            }
            SourceError::Other(detail) => format!("{subject} request failed: {detail}"),
        }
    }
}

/// A request rejected before any work starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmissionError {
    #[error("malformed request body: {0}")]
    MalformedBody(String),

    #[error("client_id is required")]
    MissingClientId,

    #[error("client '{0}' has no open notification channel")]
    UnknownClient(ClientId),

    #[error("invalid album id '{0}'")]
    InvalidAlbumId(String),

    #[error("invalid ranking period '{0}', expected day, week or month")]
    InvalidPeriod(String),

    #[error("invalid page '{0}'")]
    InvalidPage(String),
}

impl AdmissionError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Admission
    }
}
