//! Export the site-wide search index as JSON.
//!
//! Walks the site root for HTML pages and produces the array of
//! `{title, href}` records that the widget fetches from
//! `/search-index.json`: one record per page (its `<title>`, or first `h1`)
//! plus one per heading or marked element that carries an `id`.

use anyhow::{bail, Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::HashSet;
use std::path::Path;
use walkdir::WalkDir;

use crate::config::{Config, ExportConfig};
use crate::models::{Category, SiteRecord};
use crate::page::{HtmlPage, PageContent};

/// Scans `export.root` and builds the site index, pages in path order.
pub fn build_site_index(config: &Config) -> Result<Vec<SiteRecord>> {
    let export = &config.export;
    let root = &export.root;
    if !root.exists() {
        bail!("Export root does not exist: {}", root.display());
    }

    let base = config.base_url()?;
    let min_chars = config.search.min_title_chars;

    let mut pages = scan_pages(export)?;
    pages.sort();

    let mut records = Vec::new();
    for rel in &pages {
        let path = root.join(rel);
        let html = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read page: {}", path.display()))?;
        let href = format!("/{}", rel);
        let url = base
            .join(&href)
            .with_context(|| format!("Cannot build a URL for {}", rel))?;
        let page = HtmlPage::parse(&html, url);
        records.extend(page_records(&page, &href, min_chars));
    }

    Ok(dedup_records(records))
}

fn page_records(page: &HtmlPage, href: &str, min_chars: usize) -> Vec<SiteRecord> {
    let long_enough = |t: &str| t.chars().count() >= min_chars;
    let mut records = Vec::new();

    let headings = page.headings();
    let page_title = page.document_title().or_else(|| {
        headings
            .first()
            .map(|h| h.text.trim().to_string())
            .filter(|t| !t.is_empty())
    });
    if let Some(title) = page_title.filter(|t| long_enough(t.as_str())) {
        records.push(SiteRecord {
            title,
            href: href.to_string(),
            category: Some(Category::Link),
        });
    }

    let anchored = headings
        .into_iter()
        .map(|h| (h, Category::Heading))
        .chain(page.marked().into_iter().map(|m| (m, Category::Custom)));
    for (element, category) in anchored {
        let Some(id) = element.id.as_deref() else {
            continue;
        };
        let title = match category {
            Category::Custom => element
                .search_label
                .as_deref()
                .filter(|l| !l.trim().is_empty())
                .unwrap_or(element.text.as_str()),
            _ => element.text.as_str(),
        }
        .trim();
        if !long_enough(title) {
            continue;
        }
        records.push(SiteRecord {
            title: title.to_string(),
            href: format!("{}#{}", href, id),
            category: Some(category),
        });
    }

    records
}

fn dedup_records(records: Vec<SiteRecord>) -> Vec<SiteRecord> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert((r.title.clone(), r.href.clone())))
        .collect()
}

/// Relative paths (forward slashes) of the pages to index.
fn scan_pages(export: &ExportConfig) -> Result<Vec<String>> {
    let include_set = build_globset(&export.include_globs)?;

    let mut default_excludes = vec![
        "**/.git/**".to_string(),
        "**/node_modules/**".to_string(),
    ];
    default_excludes.extend(export.exclude_globs.clone());
    let exclude_set = build_globset(&default_excludes)?;

    let mut pages = Vec::new();
    for entry in WalkDir::new(&export.root).follow_links(export.follow_symlinks) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let relative = path.strip_prefix(&export.root).unwrap_or(path);
        let rel_str = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if exclude_set.is_match(&rel_str) || !include_set.is_match(&rel_str) {
            continue;
        }
        pages.push(rel_str);
    }
    Ok(pages)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

/// Builds the site index and writes it as JSON.
///
/// If `output` is `Some`, writes to that file path. Otherwise writes
/// to stdout for piping.
pub fn run_export(config: &Config, output: Option<&Path>) -> Result<()> {
    let records = build_site_index(config)?;
    let json = serde_json::to_string_pretty(&records)?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!(entries = records.len(), path = %path.display(), "site index exported");
            eprintln!("Exported {} entries to {}", records.len(), path.display());
        }
        None => {
            println!("{}", json);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn site() -> (TempDir, Config) {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("public");
        fs::create_dir_all(root.join("docs")).unwrap();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::write(
            root.join("index.html"),
            r#"<html><head><title>Home</title></head><body>
               <h2 id="pricing">Pricing</h2><h2>No anchor</h2>
               <div id="faq" data-search="Questions">...</div></body></html>"#,
        )
        .unwrap();
        fs::write(
            root.join("docs/setup.html"),
            "<h1 id=\"setup\">Setup guide</h1><p>text</p>",
        )
        .unwrap();
        fs::write(root.join("docs/notes.txt"), "<h1>Not a page</h1>").unwrap();
        fs::write(root.join("node_modules/pkg/readme.html"), "<title>Vendored</title>").unwrap();

        let mut config = Config::minimal();
        config.site.base_url = "https://example.com/".to_string();
        config.export.root = root;
        (tmp, config)
    }

    #[test]
    fn test_build_site_index() {
        let (_tmp, config) = site();
        let records = build_site_index(&config).unwrap();
        let pairs: Vec<(&str, &str)> = records
            .iter()
            .map(|r| (r.title.as_str(), r.href.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("Setup guide", "/docs/setup.html"),
                ("Setup guide", "/docs/setup.html#setup"),
                ("Home", "/index.html"),
                ("Pricing", "/index.html#pricing"),
                ("Questions", "/index.html#faq"),
            ]
        );
    }

    #[test]
    fn test_exclude_globs() {
        let (_tmp, mut config) = site();
        config.export.exclude_globs = vec!["docs/**".to_string()];
        let records = build_site_index(&config).unwrap();
        assert!(records.iter().all(|r| !r.href.starts_with("/docs/")));
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let mut config = Config::minimal();
        config.export.root = "/definitely/not/here".into();
        assert!(build_site_index(&config).is_err());
    }

    #[test]
    fn test_export_output_parses_as_site_index() {
        let (tmp, config) = site();
        let out = tmp.path().join("out/search-index.json");
        run_export(&config, Some(&out)).unwrap();
        let body = fs::read_to_string(&out).unwrap();
        let entries = crate::remote::parse_site_index(&body).unwrap();
        assert_eq!(entries.len(), 5);
    }
}
