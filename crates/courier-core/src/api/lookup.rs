//! Read-through endpoints: search, rank, info, cover.
//!
//! # キャッシュ
//! - key は endpoint の入力から決まる（`search:{tag}:{page}`, `rank:{period}`, `album_info:{id}`）
//! - 成功した結果だけを保存する。エラーはキャッシュしない
//! - album source 呼び出しは blocking なので `spawn_blocking` で event loop から外す

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, warn};

use super::{ApiResponse, CONTENT_TYPE_JPEG};
use crate::app::CourierService;
use crate::cache::TtlCache;
use crate::domain::{AdmissionError, AlbumId, RankPeriod, SourceError};
use crate::jobs::reclaimer::delete_path;
use crate::ports::AlbumSource;

/// Ranking is always served from its first page.
const RANK_PAGE: u32 = 1;

/// `GET /search/{tag}/{page}`: list of `{album_id, title}`.
pub async fn search(service: &CourierService, tag: &str, page: &str) -> ApiResponse {
    let page = match parse_page(page) {
        Ok(page) => page,
        Err(err) => return ApiResponse::admission(&err),
    };
    let tag = tag.to_string();
    let key = format!("search:{tag}:{page}");
    let subject = format!("tag={tag} page={page}");
    read_through(service, &service.caches().search, key, &subject, move |source| {
        source.search(&tag, page)
    })
    .await
}

/// `GET /rank/{period}` with period one of `day`, `week`, `month`.
pub async fn rank(service: &CourierService, period: &str) -> ApiResponse {
    let period: RankPeriod = match period.parse() {
        Ok(period) => period,
        Err(err) => return ApiResponse::admission(&err),
    };
    let key = format!("rank:{period}");
    let subject = format!("rank={period}");
    read_through(service, &service.caches().rank, key, &subject, move |source| {
        source.ranking(period, RANK_PAGE)
    })
    .await
}

/// `GET /info/{albumId}`: album detail with `"status": "success"`.
pub async fn info(service: &CourierService, album_id: &str) -> ApiResponse {
    let album_id = match AlbumId::parse(album_id) {
        Ok(id) => id,
        Err(err) => return ApiResponse::admission(&err),
    };
    let key = format!("album_info:{album_id}");
    let subject = format!("id={album_id}");
    read_through(service, &service.caches().info, key, &subject, move |source| {
        source.album_info(&album_id).map(|info| InfoView {
            status: "success",
            info,
        })
    })
    .await
}

/// `GET /cover/{albumId}`: the cover JPEG, deleted again after `cover_ttl`.
pub async fn cover(service: &CourierService, album_id: &str) -> ApiResponse {
    let album_id = match AlbumId::parse(album_id) {
        Ok(id) => id,
        Err(err) => return ApiResponse::admission(&err),
    };
    let path = service
        .config()
        .artifact_root
        .join(format!("cover-{album_id}.jpg"));

    // 既にある（まだ回収されていない）なら再ダウンロードしない
    if tokio::fs::metadata(&path).await.is_ok_and(|m| m.is_file()) {
        debug!(%album_id, "cover served from disk");
        return ApiResponse::file(path, CONTENT_TYPE_JPEG);
    }

    let subject = format!("id={album_id}");
    // source は `.part` に書き、成功したときだけ本来の名前へ rename する
    let staging = path.with_extension("jpg.part");
    let source = Arc::clone(service.source());
    let dest = staging.clone();
    let fetched = run_blocking(move || source.download_cover(&album_id, &dest)).await;
    let promoted = match fetched {
        Ok(()) => tokio::fs::rename(&staging, &path).await.map_err(|e| {
            SourceError::Other(format!("store cover {}: {e}", path.display()))
        }),
        Err(err) => Err(err),
    };

    match promoted {
        Ok(()) => {
            service
                .reclaimer()
                .schedule_delete(&path, service.config().cover_ttl);
            ApiResponse::file(path, CONTENT_TYPE_JPEG)
        }
        Err(err) => {
            warn!(%subject, kind = ?err.kind(), error = %err, "cover download failed");
            delete_path(&staging).await;
            ApiResponse::source(&err, &subject)
        }
    }
}

#[derive(Serialize)]
struct InfoView {
    status: &'static str,
    #[serde(flatten)]
    info: crate::domain::AlbumInfo,
}

fn parse_page(raw: &str) -> Result<u32, AdmissionError> {
    match raw.trim().parse::<u32>() {
        Ok(page) if page > 0 => Ok(page),
        _ => Err(AdmissionError::InvalidPage(raw.to_string())),
    }
}

async fn read_through<T, F>(
    service: &CourierService,
    cache: &TtlCache<Value>,
    key: String,
    subject: &str,
    fetch: F,
) -> ApiResponse
where
    T: Serialize + Send + 'static,
    F: FnOnce(&dyn AlbumSource) -> Result<T, SourceError> + Send + 'static,
{
    if let Some(hit) = cache.get(&key) {
        debug!(%key, "cache hit");
        return ApiResponse::json(ApiResponse::OK, hit);
    }

    let source = Arc::clone(service.source());
    let fetched = run_blocking(move || fetch(source.as_ref())).await;
    let value = fetched.and_then(|v| {
        serde_json::to_value(v).map_err(|e| SourceError::Other(format!("encode response: {e}")))
    });

    match value {
        Ok(value) => {
            cache.set(key, value.clone());
            ApiResponse::json(ApiResponse::OK, value)
        }
        Err(err) => {
            warn!(%key, kind = ?err.kind(), error = %err, "lookup failed");
            ApiResponse::source(&err, subject)
        }
    }
}

/// Run a blocking source call off the event loop.
async fn run_blocking<T, F>(f: F) -> Result<T, SourceError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, SourceError> + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result,
        Err(e) => {
            error!(error = %e, "album source task failed");
            Err(SourceError::Other("album source crashed".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_must_be_positive_integer() {
        assert_eq!(parse_page("1").unwrap(), 1);
        assert!(parse_page("0").is_err());
        assert!(parse_page("-1").is_err());
        assert!(parse_page("x").is_err());
    }
}
