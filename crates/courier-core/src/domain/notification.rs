//! Push message sent exactly once per channel registration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    DownloadReady,
    Error,
}

/// `{status, file_name, message}` as received by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub status: NotificationStatus,
    pub file_name: String,
    pub message: String,
}

impl Notification {
    pub fn ready(file_name: impl Into<String>) -> Self {
        let file_name = file_name.into();
        let message = format!("File '{file_name}' is ready and can be downloaded.");
        Self {
            status: NotificationStatus::DownloadReady,
            file_name,
            message,
        }
    }

    pub fn error(file_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: NotificationStatus::Error,
            file_name: file_name.into(),
            message: message.into(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == NotificationStatus::DownloadReady
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_snake_case_status() {
        let v = serde_json::to_value(Notification::ready("job-x/title.zip")).unwrap();
        assert_eq!(v["status"], "download_ready");
        assert_eq!(v["file_name"], "job-x/title.zip");
        assert!(v["message"].as_str().unwrap().contains("job-x/title.zip"));

        let v = serde_json::to_value(Notification::error("", "boom")).unwrap();
        assert_eq!(v["status"], "error");
        assert_eq!(v["message"], "boom");
    }
}
