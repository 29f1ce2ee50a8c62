//! Local index construction.
//!
//! Scans a page for links, headings and explicitly marked elements and turns
//! them into [`IndexEntry`] values, in that fixed source order.

use std::collections::HashSet;

use crate::models::{Category, IndexEntry};
use crate::page::{PageContent, PageElement};

/// Default minimum title length (in characters) for an entry to be kept.
pub const DEFAULT_MIN_TITLE_CHARS: usize = 2;

/// Builds the local index of `page`.
///
/// Titles shorter than `min_title_chars` after trimming are dropped.
/// Duplicates by `(title, target, category)` are removed, first occurrence
/// wins. A page with nothing to index yields an empty vector.
pub fn build_local_index(page: &dyn PageContent, min_title_chars: usize) -> Vec<IndexEntry> {
    let mut entries = Vec::new();

    for link in page.links() {
        push_entry(
            &mut entries,
            min_title_chars,
            &link.text,
            link.href.clone(),
            &link,
            Category::Link,
        );
    }

    for heading in page.headings() {
        let href = heading
            .enclosing_href
            .clone()
            .or_else(|| heading.id.as_deref().map(|id| page.fragment_href(id)));
        push_entry(
            &mut entries,
            min_title_chars,
            &heading.text,
            href,
            &heading,
            Category::Heading,
        );
    }

    for marked in page.marked() {
        let title = marked
            .search_label
            .as_deref()
            .filter(|label| !label.trim().is_empty())
            .unwrap_or(&marked.text);
        let href = marked.id.as_deref().map(|id| page.fragment_href(id));
        push_entry(
            &mut entries,
            min_title_chars,
            title,
            href,
            &marked,
            Category::Custom,
        );
    }

    dedup_by_source(entries)
}

fn push_entry(
    entries: &mut Vec<IndexEntry>,
    min_title_chars: usize,
    title: &str,
    href: Option<String>,
    element: &PageElement,
    category: Category,
) {
    let title = title.trim();
    if title.chars().count() < min_title_chars {
        return;
    }
    if let Some(entry) = IndexEntry::new(title, href, Some(element.node), category) {
        entries.push(entry);
    }
}

fn dedup_by_source(entries: Vec<IndexEntry>) -> Vec<IndexEntry> {
    let mut seen: HashSet<(String, String, Option<Category>)> = HashSet::new();
    entries
        .into_iter()
        .filter(|e| {
            seen.insert((
                e.title().to_string(),
                e.target_key().to_string(),
                e.category(),
            ))
        })
        .collect()
}
