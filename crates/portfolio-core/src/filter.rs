//! Repository filtering and sorting logic

use crate::types::{RepositoryRecord, SortMode};
use std::cmp::Reverse;
use std::collections::BTreeSet;

/// Entry shown first in a language picker; selecting it clears the filter
pub const ALL_LANGUAGES: &str = "All";

/// Compute the derived view: search and language filters, then sort.
///
/// Pure: the same arguments always produce the same output.
pub fn derive_view(
    all: &[RepositoryRecord],
    query: &str,
    language: &str,
    sort_mode: SortMode,
) -> Vec<RepositoryRecord> {
    let query_lower = query.to_lowercase();

    let mut view: Vec<RepositoryRecord> = all
        .iter()
        .filter(|r| matches_query(r, &query_lower))
        .filter(|r| matches_language(r, language))
        .cloned()
        .collect();

    sort_repositories(&mut view, sort_mode);
    view
}

/// Sort in place; stable, so ties keep their fetched order
pub fn sort_repositories(repos: &mut [RepositoryRecord], sort_mode: SortMode) {
    match sort_mode {
        SortMode::Recent => repos.sort_by_cached_key(|r| Reverse(r.pushed_at_timestamp())),
        SortMode::Oldest => repos.sort_by_cached_key(|r| r.pushed_at_timestamp()),
        SortMode::Alphabetical => repos.sort_by_cached_key(|r| r.name.to_lowercase()),
    }
}

/// `query_lower` must already be lowercased; empty matches everything
fn matches_query(repo: &RepositoryRecord, query_lower: &str) -> bool {
    query_lower.is_empty() || repo.name.to_lowercase().contains(query_lower)
}

/// Exact match; an empty selection matches everything
fn matches_language(repo: &RepositoryRecord, language: &str) -> bool {
    language.is_empty() || repo.language == language
}

/// Distinct languages of the unfiltered list, including "" when present
pub fn available_languages(all: &[RepositoryRecord]) -> BTreeSet<String> {
    all.iter().map(|r| r.language.clone()).collect()
}

/// Picker entries: [`ALL_LANGUAGES`] followed by the sorted non-empty languages
pub fn language_options(all: &[RepositoryRecord]) -> Vec<String> {
    std::iter::once(ALL_LANGUAGES.to_string())
        .chain(
            available_languages(all)
                .into_iter()
                .filter(|l| !l.is_empty()),
        )
        .collect()
}

/// Map a picker entry back to a language filter value
pub fn language_filter_from_option(option: &str) -> &str {
    if option == ALL_LANGUAGES {
        ""
    } else {
        option
    }
}
