//! `psearch index` and `psearch search`.
//!
//! Both commands read a page from disk, index it the way the widget does on
//! open, and print the outcome. `search` also merges in the site index, from
//! a local file or fetched over HTTP.

use anyhow::{Context, Result};
use reqwest::Url;
use std::path::Path;

use crate::config::Config;
use crate::indexer::build_local_index;
use crate::merge::merge;
use crate::models::IndexEntry;
use crate::page::HtmlPage;
use crate::remote::{build_client, load_site_index_file, RemoteIndexHandle, RemoteIndexLoader};
use crate::search::{search_with_limit, SearchResultItem};

/// Reads and parses a page. Without `url`, the page is assumed to live at
/// `site.base_url` joined with its file name.
pub fn load_page(config: &Config, path: &Path, url: Option<&str>) -> Result<HtmlPage> {
    let html = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read page: {}", path.display()))?;

    let url = match url {
        Some(u) => Url::parse(u).with_context(|| format!("Invalid page URL: {}", u))?,
        None => {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            config
                .base_url()?
                .join(&name)
                .with_context(|| format!("Cannot build a URL for {}", path.display()))?
        }
    };

    Ok(HtmlPage::parse(&html, url))
}

/// Sets up the site index source for a page load.
///
/// A local file wins over fetching; fetching only happens when asked for and
/// `[remote].enabled` is true. Must be called inside a tokio runtime when
/// `fetch` is set.
pub fn open_remote(config: &Config, remote_file: Option<&Path>, fetch: bool) -> Result<RemoteIndexHandle> {
    if let Some(path) = remote_file {
        return Ok(RemoteIndexHandle::fixed(load_site_index_file(path)));
    }
    if fetch && config.remote.enabled {
        let client = build_client(&config.remote)?;
        let url = config.remote_index_url()?;
        return Ok(RemoteIndexLoader::spawn(client, url));
    }
    Ok(RemoteIndexHandle::disabled())
}

pub fn run_index(config: &Config, page_path: &Path, url: Option<&str>, json: bool) -> Result<()> {
    let page = load_page(config, page_path, url)?;
    let entries = build_local_index(&page, config.search.min_title_chars);

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("Nothing to index.");
        return Ok(());
    }

    println!("{:<8} {:<40} TARGET", "KIND", "TITLE");
    for entry in &entries {
        println!(
            "{:<8} {:<40} {}",
            entry.meta().unwrap_or("site"),
            entry.title(),
            entry.href().unwrap_or("(element)")
        );
    }
    println!();
    println!("{} entries", entries.len());
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub async fn run_search(
    config: &Config,
    page_path: &Path,
    query: &str,
    url: Option<&str>,
    remote_file: Option<&Path>,
    fetch: bool,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let page = load_page(config, page_path, url)?;
    let mut remote = open_remote(config, remote_file, fetch)?;
    // a one-shot command has nothing to do before the fetch settles
    remote.settled().await;

    let local = build_local_index(&page, config.search.min_title_chars);
    let merged = merge(&remote.entries(), &local);
    let limit = limit.unwrap_or(config.search.max_results);
    let results = search_with_limit(query, &merged, limit);

    if json {
        let items = SearchResultItem::from_results(&results);
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    print_results(query, &results);
    Ok(())
}

fn print_results(query: &str, results: &[IndexEntry]) {
    if query.trim().is_empty() {
        return;
    }
    if results.is_empty() {
        println!("No results.");
        return;
    }
    for (i, entry) in results.iter().enumerate() {
        println!(
            "{}. [{}] {}",
            i + 1,
            entry.meta().unwrap_or("site"),
            entry.title()
        );
        if let Some(href) = entry.href() {
            println!("    href: {}", href);
        }
    }
}
