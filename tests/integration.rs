use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::TempDir;

fn psearch_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("psearch");
    path
}

const INDEX_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Acme Home</title></head>
<body>
  <div id="pm-search-widget">
    <button id="pm-search-btn">Search</button>
    <div id="pm-search-panel">
      <input id="pm-search-input" type="search">
      <div id="pm-search-suggestions"></div>
    </div>
  </div>
  <nav><a href="/contact">Contact Us</a> <a href="/">X</a></nav>
  <h2 id="pricing">Pricing</h2>
  <h3>Our team</h3>
  <section id="faq" data-search="Frequently asked questions"><p>...</p></section>
</body>
</html>"#;

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let public = root.join("public");
    fs::create_dir_all(public.join("docs")).unwrap();
    fs::write(public.join("index.html"), INDEX_PAGE).unwrap();
    fs::write(
        public.join("docs/setup.html"),
        "<html><head><title>Setup guide</title></head><body><h2 id=\"install\">Installing</h2></body></html>",
    )
    .unwrap();

    let config_content = format!(
        r#"[site]
base_url = "https://example.com/"

[search]
max_results = 10

[server]
bind = "127.0.0.1:7349"

[export]
root = "{}/public"
include_globs = ["**/*.html"]
"#,
        root.display()
    );

    let config_path = config_dir.join("psearch.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_psearch(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = psearch_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run psearch binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn run_session(config_path: &Path, args: &[&str], script: &str) -> (String, bool) {
    let binary = psearch_binary();
    let mut child = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .arg("session")
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap_or_else(|e| panic!("Failed to run psearch binary at {:?}: {}", binary, e));

    child
        .stdin
        .take()
        .unwrap()
        .write_all(script.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();
    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        output.status.success(),
    )
}

fn page_path(config_path: &Path, rel: &str) -> String {
    let root = config_path.parent().unwrap().parent().unwrap();
    root.join("public").join(rel).to_string_lossy().to_string()
}

#[test]
fn test_index_lists_page_entries() {
    let (_tmp, config_path) = setup_test_env();
    let page = page_path(&config_path, "index.html");

    let (stdout, stderr, success) = run_psearch(&config_path, &["index", &page]);
    assert!(success, "index failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Contact Us"));
    assert!(stdout.contains("https://example.com/index.html#pricing"));
    assert!(stdout.contains("Frequently asked questions"));
    assert!(stdout.contains("(element)"), "untargeted heading keeps its element");
    assert!(stdout.contains("4 entries"), "single-char link is dropped: {}", stdout);
}

#[test]
fn test_index_json() {
    let (_tmp, config_path) = setup_test_env();
    let page = page_path(&config_path, "index.html");

    let (stdout, _, success) = run_psearch(&config_path, &["index", &page, "--json"]);
    assert!(success);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let arr = parsed.as_array().unwrap();
    assert_eq!(arr.len(), 4);
    assert_eq!(arr[0]["category"], "link");
    assert_eq!(arr[0]["title"], "Contact Us");
}

#[test]
fn test_search_pricing() {
    let (_tmp, config_path) = setup_test_env();
    let page = page_path(&config_path, "index.html");

    let (stdout, stderr, success) = run_psearch(&config_path, &["search", &page, "pric"]);
    assert!(success, "search failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("1. [heading] Pricing"));
    assert!(!stdout.contains("2."));
}

#[test]
fn test_search_no_results() {
    let (_tmp, config_path) = setup_test_env();
    let page = page_path(&config_path, "index.html");

    let (stdout, _, success) = run_psearch(&config_path, &["search", &page, "zzz-no-match"]);
    assert!(success);
    assert!(stdout.contains("No results."));
}

#[test]
fn test_search_blank_query_prints_nothing() {
    let (_tmp, config_path) = setup_test_env();
    let page = page_path(&config_path, "index.html");

    let (stdout, _, success) = run_psearch(&config_path, &["search", &page, "   "]);
    assert!(success);
    assert!(stdout.trim().is_empty());
}

#[test]
fn test_search_merges_remote_file_first() {
    let (tmp, config_path) = setup_test_env();
    let page = page_path(&config_path, "index.html");
    let remote = tmp.path().join("search-index.json");
    fs::write(&remote, r#"[{"title":"Pricing","href":"/pricing"}]"#).unwrap();

    let (stdout, _, success) = run_psearch(
        &config_path,
        &[
            "search",
            &page,
            "pricing",
            "--remote-file",
            remote.to_str().unwrap(),
            "--json",
        ],
    );
    assert!(success);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let arr = parsed.as_array().unwrap();
    assert_eq!(arr[0]["href"], "/pricing");
    assert_eq!(arr[0]["rank"], 1);
}

#[test]
fn test_search_with_broken_remote_file() {
    let (tmp, config_path) = setup_test_env();
    let page = page_path(&config_path, "index.html");
    let remote = tmp.path().join("search-index.json");
    fs::write(&remote, "<html>404 Not Found</html>").unwrap();

    let (stdout, stderr, success) = run_psearch(
        &config_path,
        &["search", &page, "contact", "--remote-file", remote.to_str().unwrap()],
    );
    assert!(success, "broken site index must not fail: {}", stderr);
    assert!(stdout.contains("Contact Us"));
}

#[test]
fn test_export_writes_site_index() {
    let (tmp, config_path) = setup_test_env();
    let out = tmp.path().join("dist/search-index.json");

    let (_, stderr, success) = run_psearch(&config_path, &["export", "--out", out.to_str().unwrap()]);
    assert!(success, "export failed: {}", stderr);

    let body = fs::read_to_string(&out).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
    let hrefs: Vec<&str> = parsed
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["href"].as_str().unwrap())
        .collect();
    assert!(hrefs.contains(&"/docs/setup.html"));
    assert!(hrefs.contains(&"/docs/setup.html#install"));
    assert!(hrefs.contains(&"/index.html"));
    assert!(hrefs.contains(&"/index.html#pricing"));
    assert!(hrefs.contains(&"/index.html#faq"));
}

#[test]
fn test_session_pricing_scroll_and_close() {
    let (_tmp, config_path) = setup_test_env();
    let page = page_path(&config_path, "index.html");

    let (stdout, success) = run_session(&config_path, &[&page], "toggle\ntype pric\nenter\n");
    assert!(success);
    assert!(stdout.contains("set-open true"));
    assert!(stdout.contains("render 1 suggestion(s)"));
    assert!(stdout.contains("[0] Pricing (heading)"));
    assert!(stdout.contains("scroll-into-view"));
    assert!(stdout.contains("set-open false"));
}

#[test]
fn test_session_no_results_html() {
    let (_tmp, config_path) = setup_test_env();
    let page = page_path(&config_path, "index.html");

    let (stdout, success) = run_session(
        &config_path,
        &[&page, "--html"],
        "open\ntype zzz-no-match\nesc\n",
    );
    assert!(success);
    assert!(stdout.contains("render no-results"));
    assert!(stdout.contains("<div class=\"pm-no-results\">No results</div>"));
}

#[test]
fn test_session_without_widget_root() {
    let (tmp, config_path) = setup_test_env();
    let bare = tmp.path().join("bare.html");
    fs::write(&bare, "<h1>No widget</h1>").unwrap();

    let (stdout, success) = run_session(&config_path, &[bare.to_str().unwrap()], "open\n");
    assert!(success);
    assert!(stdout.contains("No search widget on page."));
}

#[test]
fn test_invalid_config_rejected() {
    let (_tmp, config_path) = setup_test_env();
    fs::write(&config_path, "[search]\nmax_results = 50\n").unwrap();
    let page = page_path(&config_path, "index.html");

    let (_, stderr, success) = run_psearch(&config_path, &["search", &page, "pric"]);
    assert!(!success);
    assert!(stderr.contains("max_results"));
}

#[test]
fn test_session_html_drops_selection_after_typing() {
    let (tmp, config_path) = setup_test_env();
    let docs = tmp.path().join("docs.html");
    fs::write(
        &docs,
        r#"<div id="pm-search-widget"></div>
<a href="/one">Docs one</a><a href="/two">Docs two</a><a href="/three">Docs three</a>"#,
    )
    .unwrap();

    let (stdout, success) = run_session(
        &config_path,
        &[docs.to_str().unwrap(), "--html"],
        "open\ntype docs\ndown\ntype docs t\n",
    );
    assert!(success);
    assert!(stdout.contains("highlight 0"));
    let last = stdout.split("> type docs t").nth(1).unwrap();
    assert!(last.contains("Docs two"));
    assert!(!last.contains("pm-suggestion active"), "stale selection: {}", last);
}

#[test]
fn test_serve_rejects_relative_index_path() {
    let (_tmp, config_path) = setup_test_env();
    fs::write(&config_path, "[remote]\nindex_path = \"search-index.json\"\n").unwrap();

    let (_, stderr, success) = run_psearch(&config_path, &["serve"]);
    assert!(!success);
    assert!(stderr.contains("must start with '/'"), "stderr: {}", stderr);
}
