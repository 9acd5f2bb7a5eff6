//! Common types used throughout portfolio-core

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use tracing::warn;

/// Timestamp format served by the portfolio backend
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Shown in place of a missing description
pub const MISSING_DESCRIPTION: &str = "N/A";

/// Repository metadata from the portfolio backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    /// Unique identifier within one fetched set
    pub id: u64,

    /// Repository name
    pub name: String,

    /// Description, as served
    #[serde(default)]
    pub description: Option<String>,

    /// Primary language; empty when unspecified
    #[serde(default, deserialize_with = "null_as_empty")]
    pub language: String,

    /// Web URL
    pub html_url: String,

    /// Archive download URL
    #[serde(default, deserialize_with = "null_as_empty")]
    pub zip_url: String,

    /// Creation timestamp
    #[serde(default, deserialize_with = "null_as_empty")]
    pub created_at: String,

    /// Last pushed timestamp
    #[serde(default, deserialize_with = "null_as_empty")]
    pub pushed_at: String,

    /// Last updated timestamp
    #[serde(default, deserialize_with = "null_as_empty")]
    pub updated_at: String,
}

impl RepositoryRecord {
    /// Description for display, falling back to "N/A" when absent or empty
    pub fn display_description(&self) -> &str {
        match self.description.as_deref() {
            Some(d) if !d.is_empty() => d,
            _ => MISSING_DESCRIPTION,
        }
    }

    /// Parsed `pushed_at`, epoch when unparsable
    pub fn pushed_at_timestamp(&self) -> DateTime<Utc> {
        parse_timestamp(&self.pushed_at)
    }

    /// Web URL, if not blank
    pub fn web_url(&self) -> Option<&str> {
        non_blank(&self.html_url)
    }

    /// Archive download URL, if not blank
    pub fn download_url(&self) -> Option<&str> {
        non_blank(&self.zip_url)
    }
}

fn non_blank(s: &str) -> Option<&str> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parse a backend timestamp.
///
/// Never fails: anything that does not match [`TIMESTAMP_FORMAT`] yields the
/// Unix epoch, so orderings built on it stay total.
pub fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    match NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT) {
        Ok(naive) => naive.and_utc(),
        Err(e) => {
            warn!("Date parsing error for {:?}: {}", raw, e);
            DateTime::<Utc>::UNIX_EPOCH
        }
    }
}

/// Ordering applied to the derived view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// Most recently pushed first
    #[default]
    Recent,

    /// Least recently pushed first
    Oldest,

    /// By name, ignoring case
    Alphabetical,
}

impl SortMode {
    /// Next mode in the Recent -> Oldest -> Alphabetical cycle
    pub fn next(self) -> Self {
        match self {
            SortMode::Recent => SortMode::Oldest,
            SortMode::Oldest => SortMode::Alphabetical,
            SortMode::Alphabetical => SortMode::Recent,
        }
    }

    /// Label shown on the sort control
    pub fn label(self) -> &'static str {
        match self {
            SortMode::Recent => "Most recent",
            SortMode::Oldest => "Oldest",
            SortMode::Alphabetical => "A-Z",
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SortMode::Recent => "recent",
            SortMode::Oldest => "oldest",
            SortMode::Alphabetical => "alphabetical",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for SortMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "recent" => Ok(SortMode::Recent),
            "oldest" => Ok(SortMode::Oldest),
            "alphabetical" | "az" | "a-z" => Ok(SortMode::Alphabetical),
            other => Err(format!("unknown sort mode: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_deserialize_backend_record() {
        let json = r#"{
            "id": 42,
            "name": "portfolio-api",
            "description": null,
            "language": null,
            "html_url": "https://github.com/soarescrf/portfolio-api",
            "created_at": "2023-04-01T14:30:00Z",
            "pushed_at": "2024-01-02T03:04:05Z",
            "updated_at": "2024-01-02T03:04:05Z",
            "zip_url": "https://github.com/soarescrf/portfolio-api/archive/main.zip"
        }"#;

        let repo: RepositoryRecord = serde_json::from_str(json).unwrap();
        assert_eq!(repo.id, 42);
        assert_eq!(repo.description, None);
        assert_eq!(repo.language, "");
        assert_eq!(repo.display_description(), "N/A");
        assert!(repo.download_url().is_some());
    }

    #[test]
    fn test_display_description_keeps_raw_value() {
        let mut repo: RepositoryRecord = serde_json::from_value(serde_json::json!({
            "id": 1,
            "name": "a",
            "description": "",
            "language": "Rust",
            "html_url": "https://example.com/a"
        }))
        .unwrap();

        assert_eq!(repo.display_description(), "N/A");
        assert_eq!(repo.description.as_deref(), Some(""));

        repo.description = Some("Kotlin app".to_string());
        assert_eq!(repo.display_description(), "Kotlin app");
    }

    #[test]
    fn test_blank_urls() {
        let repo: RepositoryRecord = serde_json::from_value(serde_json::json!({
            "id": 1,
            "name": "a",
            "html_url": "   ",
            "zip_url": ""
        }))
        .unwrap();

        assert_eq!(repo.web_url(), None);
        assert_eq!(repo.download_url(), None);
    }

    #[test]
    fn test_parse_timestamp() {
        let ts = parse_timestamp("2023-04-01T14:30:00Z");
        assert_eq!(ts.year(), 2023);
        assert_eq!(ts.month(), 4);
        assert_eq!(ts.hour(), 14);
    }

    #[test]
    fn test_parse_timestamp_fallback() {
        assert_eq!(parse_timestamp(""), DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(parse_timestamp("yesterday"), DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(
            parse_timestamp("2023-04-01 14:30:00"),
            DateTime::<Utc>::UNIX_EPOCH
        );
    }

    #[test]
    fn test_sort_mode_cycle() {
        let mode = SortMode::default();
        assert_eq!(mode, SortMode::Recent);
        assert_eq!(mode.next(), SortMode::Oldest);
        assert_eq!(mode.next().next(), SortMode::Alphabetical);
        assert_eq!(mode.next().next().next(), SortMode::Recent);
    }

    #[test]
    fn test_sort_mode_from_str() {
        assert_eq!("Oldest".parse::<SortMode>().unwrap(), SortMode::Oldest);
        assert_eq!("a-z".parse::<SortMode>().unwrap(), SortMode::Alphabetical);
        assert!("stars".parse::<SortMode>().is_err());
    }
}
