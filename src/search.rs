//! Query engine: case-insensitive substring match over entry titles.
//!
//! Matches are ordered by ascending title length, so shorter, closer titles
//! come first. The sort is stable: equal lengths keep index order, which puts
//! site entries before local ones after a merge.

use serde::Serialize;

use crate::models::{Category, IndexEntry};

/// Hard cap on the number of results of a single query.
pub const MAX_RESULTS: usize = 10;

/// Searches `index` for `query`, returning at most [`MAX_RESULTS`] entries.
///
/// A blank query returns nothing rather than everything.
pub fn search(query: &str, index: &[IndexEntry]) -> Vec<IndexEntry> {
    search_with_limit(query, index, MAX_RESULTS)
}

/// Like [`search`] with a smaller cap; `limit` is clamped to [`MAX_RESULTS`].
pub fn search_with_limit(query: &str, index: &[IndexEntry], limit: usize) -> Vec<IndexEntry> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    let mut matches: Vec<&IndexEntry> = index
        .iter()
        .filter(|e| e.title().to_lowercase().contains(&needle))
        .collect();

    matches.sort_by_key(|e| e.title_len());
    matches.truncate(limit.min(MAX_RESULTS));
    matches.into_iter().cloned().collect()
}

/// Serializable search hit, used by the CLI's JSON output and the server.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResultItem {
    pub rank: usize,
    pub title: String,
    pub href: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

impl SearchResultItem {
    pub fn from_results(results: &[IndexEntry]) -> Vec<Self> {
        results
            .iter()
            .enumerate()
            .map(|(i, e)| SearchResultItem {
                rank: i + 1,
                title: e.title().to_string(),
                href: e.href().map(str::to_string),
                category: e.category(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(title: &str) -> IndexEntry {
        IndexEntry::new(title, Some(format!("/{}", title.len())), None, Category::Link).unwrap()
    }

    fn titles(results: &[IndexEntry]) -> Vec<&str> {
        results.iter().map(|e| e.title()).collect()
    }

    #[test]
    fn test_blank_query_returns_nothing() {
        let index = vec![entry("Pricing"), entry("Contact Us")];
        assert!(search("", &index).is_empty());
        assert!(search("   \t", &index).is_empty());
    }

    #[test]
    fn test_case_insensitive_substring() {
        let index = vec![entry("Pricing"), entry("Contact Us"), entry("PRICE list")];
        let results = search("  PRIC ", &index);
        assert_eq!(titles(&results), vec!["Pricing", "PRICE list"]);
        for r in &results {
            assert!(r.title().to_lowercase().contains("pric"));
        }
    }

    #[test]
    fn test_no_match_is_empty() {
        let index = vec![entry("Pricing")];
        assert!(search("zzz-no-match", &index).is_empty());
    }

    #[test]
    fn test_sorted_by_length_and_stable() {
        let index = vec![
            entry("docs: long title"),
            entry("docs b"),
            entry("docs a"),
            entry("docs"),
        ];
        let results = search("docs", &index);
        assert_eq!(titles(&results), vec!["docs", "docs b", "docs a", "docs: long title"]);
        for pair in results.windows(2) {
            assert!(pair[0].title_len() <= pair[1].title_len());
        }
    }

    #[test]
    fn test_capped_at_ten() {
        let index: Vec<IndexEntry> = (0..25).map(|i| entry(&format!("item {}", i))).collect();
        let results = search("item", &index);
        assert_eq!(results.len(), MAX_RESULTS);
        // single-digit items are shorter and all ten fit
        assert_eq!(results[0].title(), "item 0");
        assert_eq!(results[9].title(), "item 9");
    }

    #[test]
    fn test_limit_clamped() {
        let index: Vec<IndexEntry> = (0..25).map(|i| entry(&format!("item {}", i))).collect();
        assert_eq!(search_with_limit("item", &index, 3).len(), 3);
        assert_eq!(search_with_limit("item", &index, 50).len(), MAX_RESULTS);
    }

    #[test]
    fn test_length_counts_characters() {
        // 11 chars vs 8 chars (14 bytes)
        let index = vec![entry("abcdefghi x"), entry("éééééé x")];
        let results = search("X", &index);
        assert_eq!(titles(&results), vec!["éééééé x", "abcdefghi x"]);
    }

    #[test]
    fn test_result_items_ranked_from_one() {
        let results = search("pric", &[entry("Pricing")]);
        let items = SearchResultItem::from_results(&results);
        assert_eq!(items[0].rank, 1);
        assert_eq!(items[0].title, "Pricing");
    }
}
