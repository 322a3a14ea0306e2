//! Liveness and clock-skew probe.

use serde_json::json;

use super::ApiResponse;
use crate::app::CourierService;

/// `timestamp_ms` is the client's clock in Unix milliseconds.
///
/// A timestamp from the future reports zero latency.
pub fn health(service: &CourierService, timestamp_ms: i64) -> ApiResponse {
    let now_ms = service.clock().now().timestamp_millis();
    let latency_ms = now_ms.saturating_sub(timestamp_ms).max(0);
    ApiResponse::json(
        ApiResponse::OK,
        json!({
            "status": "ok",
            "app": service.config().app_name,
            "latency_ms": latency_ms,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{ServiceBuilder, ServiceConfig};
    use crate::impls::StaticAlbumSource;
    use crate::ports::FixedClock;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn reports_latency_against_service_clock() {
        let dir = TempDir::new().unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let service = ServiceBuilder::new(ServiceConfig {
            artifact_root: dir.path().to_path_buf(),
            ..ServiceConfig::default()
        })
        .source(Arc::new(StaticAlbumSource::new()))
        .clock(Arc::new(FixedClock::new(now)))
        .build()
        .unwrap();

        let resp = health(&service, now.timestamp_millis() - 250);
        let body = resp.json_body().unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["app"], "courier");
        assert_eq!(body["latency_ms"], 250);

        let resp = health(&service, now.timestamp_millis() + 1000);
        assert_eq!(resp.json_body().unwrap()["latency_ms"], 0);
    }
}
