//! API - HTTP surface independent of any web framework
//!
//! 各 handler は `CourierService` を受け取り `ApiResponse` を返すだけです。
//! ルーティングやソケットの扱いは transport 側の adapter が担当します。
//!
//! | route                          | handler                   |
//! |--------------------------------|---------------------------|
//! | `GET /health/{timestamp}`      | [`health::health`]        |
//! | `WS /notifications/{clientId}` | [`notifications::open`]   |
//! | `POST /download/album/{id}`    | [`download::submit`]      |
//! | `GET /download/{fileName}`     | [`download::pull`]        |
//! | `GET /search/{tag}/{page}`     | [`lookup::search`]        |
//! | `GET /rank/{period}`           | [`lookup::rank`]          |
//! | `GET /info/{albumId}`          | [`lookup::info`]          |
//! | `GET /cover/{albumId}`         | [`lookup::cover`]         |

pub mod download;
pub mod health;
pub mod lookup;
pub mod notifications;

use std::path::PathBuf;

use serde_json::{Value, json};

use crate::domain::{AdmissionError, SourceError};

pub const CONTENT_TYPE_ZIP: &str = "application/zip";
pub const CONTENT_TYPE_JPEG: &str = "image/jpeg";

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(Value),
    /// Stream this file back with the given content type.
    File {
        path: PathBuf,
        content_type: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Body,
}

impl ApiResponse {
    pub const OK: u16 = 200;
    pub const ACCEPTED: u16 = 202;
    pub const BAD_REQUEST: u16 = 400;
    pub const NOT_FOUND: u16 = 404;
    pub const INTERNAL_ERROR: u16 = 500;
    pub const BAD_GATEWAY: u16 = 502;
    pub const UNAVAILABLE: u16 = 503;

    pub fn json(status: u16, value: Value) -> Self {
        Self {
            status,
            body: Body::Json(value),
        }
    }

    pub fn file(path: PathBuf, content_type: &'static str) -> Self {
        Self {
            status: Self::OK,
            body: Body::File { path, content_type },
        }
    }

    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self::json(status, json!({ "status": "error", "message": message.into() }))
    }

    pub(crate) fn admission(err: &AdmissionError) -> Self {
        Self::error(Self::BAD_REQUEST, err.to_string())
    }

    pub(crate) fn source(err: &SourceError, subject: &str) -> Self {
        let status = match err {
            SourceError::NotFound(_) => Self::NOT_FOUND,
            SourceError::ParseFailure(_) => Self::BAD_GATEWAY,
            SourceError::RetriesExhausted(_) => Self::UNAVAILABLE,
            SourceError::Other(_) => Self::INTERNAL_ERROR,
        };
        Self::error(status, err.user_message(subject))
    }

    pub fn json_body(&self) -> Option<&Value> {
        match &self.body {
            Body::Json(v) => Some(v),
            Body::File { .. } => None,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(SourceError::NotFound("x".into()), 404)]
    #[case(SourceError::ParseFailure("x".into()), 502)]
    #[case(SourceError::RetriesExhausted("x".into()), 503)]
    #[case(SourceError::Other("x".into()), 500)]
    fn source_errors_map_to_status(#[case] err: SourceError, #[case] status: u16) {
        let resp = ApiResponse::source(&err, "id=1");
        assert_eq!(resp.status, status);
        assert_eq!(resp.json_body().unwrap()["status"], "error");
        assert!(!resp.is_success());
    }
}
