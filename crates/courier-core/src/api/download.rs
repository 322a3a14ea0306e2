//! Job submission and artifact retrieval.

use std::path::{Component, Path, PathBuf};

use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use super::{ApiResponse, CONTENT_TYPE_ZIP};
use crate::app::CourierService;
use crate::domain::{AdmissionError, AlbumId, ClientId};

pub const PROCESSING_MESSAGE: &str =
    "Download started in the background; listen for 'download_ready' on your notification channel.";
pub const EXPIRED_MESSAGE: &str = "File not found or has expired.";

#[derive(Debug, Deserialize)]
struct DownloadRequest {
    #[serde(default)]
    client_id: Option<ClientId>,
}

/// `POST /download/album/{albumId}` with body `{"client_id": "..."}`.
///
/// The client must already hold an open notification channel; otherwise
/// the job is rejected with 400 and never starts.
pub async fn submit(service: &CourierService, album_id: &str, body: &[u8]) -> ApiResponse {
    match admit(service, album_id, body).await {
        Ok((album_id, client_id)) => {
            // JobHandle を drop してもジョブは走り続ける
            let handle = service.runner().submit(album_id, client_id);
            debug!(job_id = %handle.job_id(), "job detached from request");
            ApiResponse::json(
                ApiResponse::ACCEPTED,
                json!({ "status": "processing", "message": PROCESSING_MESSAGE }),
            )
        }
        Err(err) => {
            info!(kind = ?err.kind(), error = %err, "download request rejected");
            ApiResponse::admission(&err)
        }
    }
}

async fn admit(
    service: &CourierService,
    album_id: &str,
    body: &[u8],
) -> Result<(AlbumId, ClientId), AdmissionError> {
    let album_id = AlbumId::parse(album_id)?;
    let request: DownloadRequest = serde_json::from_slice(body)
        .map_err(|e| AdmissionError::MalformedBody(e.to_string()))?;
    let client_id = request
        .client_id
        .filter(|id| !id.is_blank())
        .ok_or(AdmissionError::MissingClientId)?;
    if !service.registry().is_connected(&client_id).await {
        return Err(AdmissionError::UnknownClient(client_id));
    }
    Ok((album_id, client_id))
}

/// `GET /download/{fileName}`: the packaged archive, or 404 once reclaimed.
pub async fn pull(service: &CourierService, file_name: &str) -> ApiResponse {
    let found = match resolve_artifact(&service.config().artifact_root, file_name) {
        Some(path) => tokio::fs::metadata(&path)
            .await
            .is_ok_and(|meta| meta.is_file())
            .then_some(path),
        None => None,
    };

    match found {
        Some(path) => ApiResponse::file(path, CONTENT_TYPE_ZIP),
        None => {
            debug!(%file_name, "artifact not available");
            ApiResponse::json(
                ApiResponse::NOT_FOUND,
                json!({ "status": "error", "msg": EXPIRED_MESSAGE }),
            )
        }
    }
}

/// Join `file_name` onto `root` if it only consists of plain components.
fn resolve_artifact(root: &Path, file_name: &str) -> Option<PathBuf> {
    let relative = Path::new(file_name);
    let mut components = relative.components().peekable();
    components.peek()?;
    if components.all(|c| matches!(c, Component::Normal(_))) {
        Some(root.join(relative))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("job-01/title.zip", true)]
    #[case("title.zip", true)]
    #[case("", false)]
    #[case("../etc/passwd", false)]
    #[case("job-01/../../x", false)]
    #[case("/etc/passwd", false)]
    fn only_plain_relative_names_resolve(#[case] name: &str, #[case] ok: bool) {
        assert_eq!(resolve_artifact(Path::new("/srv/artifacts"), name).is_some(), ok);
    }
}
