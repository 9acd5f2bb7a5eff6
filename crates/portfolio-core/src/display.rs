//! Formatting helpers for presenting repositories

use crate::types::TIMESTAMP_FORMAT;
use chrono::NaiveDateTime;
use tracing::error;

/// Colour for languages missing from the table
pub const DEFAULT_LANGUAGE_COLOR: &str = "#546E7A";

const LANGUAGE_COLORS: &[(&str, &str)] = &[
    ("Java", "#b07219"),
    ("Python", "#3572A5"),
    ("JavaScript", "#f1e05a"),
    ("TypeScript", "#3178c6"),
    ("HTML", "#e34c26"),
    ("CSS", "#563d7c"),
    ("C", "#555555"),
    ("C++", "#f34b7d"),
    ("C#", "#178600"),
    ("PHP", "#4F5D95"),
    ("Swift", "#ffac45"),
    ("Kotlin", "#A97BFF"),
    ("Go", "#00ADD8"),
    ("Ruby", "#701516"),
    ("Shell", "#89e051"),
];

/// Hex colour associated with a language
pub fn language_color(language: &str) -> &'static str {
    LANGUAGE_COLORS
        .iter()
        .find(|(name, _)| *name == language)
        .map(|(_, color)| *color)
        .unwrap_or(DEFAULT_LANGUAGE_COLOR)
}

/// Format a backend timestamp as `dd/mm/yyyy`.
///
/// Input that does not parse is returned as-is.
pub fn format_date(raw: &str) -> String {
    match NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT) {
        Ok(dt) => dt.format("%d/%m/%Y").to_string(),
        Err(e) => {
            error!("Failed to parse date {:?}: {}", raw, e);
            raw.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_color() {
        assert_eq!(language_color("Kotlin"), "#A97BFF");
        assert_eq!(language_color("C++"), "#f34b7d");
        assert_eq!(language_color("Rust"), DEFAULT_LANGUAGE_COLOR);
        assert_eq!(language_color(""), DEFAULT_LANGUAGE_COLOR);
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2023-04-01T14:30:00Z"), "01/04/2023");
        assert_eq!(format_date("soon"), "soon");
    }
}
