//! Merging of the site index with the local page index.

use std::collections::HashSet;

use crate::models::IndexEntry;

/// Concatenates `remote` and `local`, remote first.
///
/// A local entry is dropped when an entry with the same `(title, target)`
/// is already in the output. Unlike the indexer's own dedup, the category is
/// not part of this key.
pub fn merge(remote: &[IndexEntry], local: &[IndexEntry]) -> Vec<IndexEntry> {
    let mut merged: Vec<IndexEntry> = remote.to_vec();
    let mut keys: HashSet<(String, String)> = remote.iter().map(merge_key).collect();

    for entry in local {
        if keys.insert(merge_key(entry)) {
            merged.push(entry.clone());
        }
    }

    merged
}

fn merge_key(entry: &IndexEntry) -> (String, String) {
    (entry.title().to_string(), entry.target_key().to_string())
}
