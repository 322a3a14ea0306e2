//! Album model: what the album source resolves and returns.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::errors::AdmissionError;

/// Numeric album identifier, kept in its textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlbumId(String);

impl AlbumId {
    /// Parse an album id from a path segment. Only ASCII digits are accepted.
    pub fn parse(raw: &str) -> Result<Self, AdmissionError> {
        let raw = raw.trim();
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AdmissionError::InvalidAlbumId(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AlbumId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One album as returned by a download or a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumSummary {
    pub album_id: AlbumId,
    pub title: String,
}

/// Detail view of an album, served by the info endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumInfo {
    pub album_id: AlbumId,
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    /// Serialized as `tag`, the key existing clients read.
    #[serde(default, rename = "tag", alias = "tags")]
    pub tags: Vec<String>,
    pub view_count: u64,
    pub like_count: u64,
    pub page_count: u32,
}

/// Ranking window for the rank endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankPeriod {
    Day,
    Week,
    Month,
}

impl RankPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RankPeriod::Day => "day",
            RankPeriod::Week => "week",
            RankPeriod::Month => "month",
        }
    }
}

impl FromStr for RankPeriod {
    type Err = AdmissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "day" => Ok(RankPeriod::Day),
            "week" => Ok(RankPeriod::Week),
            "month" => Ok(RankPeriod::Month),
            other => Err(AdmissionError::InvalidPeriod(other.to_string())),
        }
    }
}

impl fmt::Display for RankPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options handed to the album source for one fetch-and-package run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchOptions {
    /// Directory the source writes into. One per job.
    pub output_dir: PathBuf,
    /// Concurrent image downloads inside one chapter.
    pub image_concurrency: usize,
    /// Concurrent chapter downloads.
    pub photo_concurrency: usize,
    /// Retries the source performs internally before giving up.
    pub retry_times: u32,
    /// Zip the downloaded album into `<title>.zip` and drop the loose files.
    pub package_zip: bool,
}

impl FetchOptions {
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("temp"),
            image_concurrency: 30,
            photo_concurrency: 8,
            retry_times: 5,
            package_zip: true,
        }
    }
}

/// Turn an album title into a single, file-system-safe path component.
///
/// Path separators and characters rejected by common file systems become `_`.
/// Empty results (or `.`/`..`) fall back to `album`.
pub fn sanitize_title(title: &str) -> String {
    let cleaned: String = title
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim_matches(|c: char| c == '.' || c.is_whitespace());
    if cleaned.is_empty() {
        "album".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("42", true)]
    #[case(" 1225432 ", true)]
    #[case("", false)]
    #[case("12a", false)]
    #[case("../1", false)]
    fn album_id_accepts_digits_only(#[case] raw: &str, #[case] ok: bool) {
        assert_eq!(AlbumId::parse(raw).is_ok(), ok);
    }

    #[test]
    fn rank_period_parses_case_insensitively() {
        assert_eq!("Week".parse::<RankPeriod>().unwrap(), RankPeriod::Week);
        assert!("year".parse::<RankPeriod>().is_err());
    }

    #[rstest]
    #[case("plain title", "plain title")]
    #[case("a/b\\c", "a_b_c")]
    #[case("..", "album")]
    #[case("  ", "album")]
    #[case("what?", "what_")]
    fn sanitize_title_produces_one_component(#[case] title: &str, #[case] expected: &str) {
        assert_eq!(sanitize_title(title), expected);
    }

    #[test]
    fn sanitize_title_keeps_unicode() {
        let title = "［酸菜鱼ゅ°］ヒルチャールに败北した胡桃";
        assert_eq!(sanitize_title(title), title);
    }

    #[test]
    fn info_tags_travel_under_tag_key() {
        let info = AlbumInfo {
            album_id: AlbumId::parse("7").unwrap(),
            title: "t".to_string(),
            authors: vec![],
            tags: vec!["full color".to_string()],
            view_count: 1,
            like_count: 0,
            page_count: 0,
        };

        let value = serde_json::to_value(&info).unwrap();
        assert_eq!(value["tag"], serde_json::json!(["full color"]));
        assert!(value.get("tags").is_none());

        let legacy: AlbumInfo = serde_json::from_value(serde_json::json!({
            "album_id": "7", "title": "t", "tags": ["x"],
            "view_count": 1, "like_count": 0, "page_count": 0
        }))
        .unwrap();
        assert_eq!(legacy.tags, vec!["x".to_string()]);
    }
}
