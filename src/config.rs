use anyhow::{Context, Result};
use reqwest::Url;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::indexer::DEFAULT_MIN_TITLE_CHARS;
use crate::search::MAX_RESULTS;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub widget: WidgetConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SiteConfig {
    /// Address pages are assumed to be served from when no `--url` is given.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost/".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default = "default_min_title_chars")]
    pub min_title_chars: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            min_title_chars: default_min_title_chars(),
        }
    }
}

fn default_max_results() -> usize {
    MAX_RESULTS
}
fn default_min_title_chars() -> usize {
    DEFAULT_MIN_TITLE_CHARS
}

#[derive(Debug, Deserialize, Clone)]
pub struct RemoteConfig {
    #[serde(default = "default_remote_enabled")]
    pub enabled: bool,
    #[serde(default = "default_index_path")]
    pub index_path: String,
    /// No timeout unless set.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: default_remote_enabled(),
            index_path: default_index_path(),
            timeout_secs: None,
        }
    }
}

fn default_remote_enabled() -> bool {
    true
}
fn default_index_path() -> String {
    "/search-index.json".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct WidgetConfig {
    #[serde(default = "default_root_id")]
    pub root_id: String,
    #[serde(default = "default_active_class")]
    pub active_class: String,
    #[serde(default = "default_focus_delay_ms")]
    pub focus_delay_ms: u64,
    #[serde(default = "default_no_results_text")]
    pub no_results_text: String,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            root_id: default_root_id(),
            active_class: default_active_class(),
            focus_delay_ms: default_focus_delay_ms(),
            no_results_text: default_no_results_text(),
        }
    }
}

fn default_root_id() -> String {
    "pm-search-widget".to_string()
}
fn default_active_class() -> String {
    "active".to_string()
}
fn default_focus_delay_ms() -> u64 {
    120
}
fn default_no_results_text() -> String {
    "No results".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7341".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExportConfig {
    #[serde(default = "default_export_root")]
    pub root: PathBuf,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            root: default_export_root(),
            include_globs: default_include_globs(),
            exclude_globs: Vec::new(),
            follow_symlinks: false,
        }
    }
}

fn default_export_root() -> PathBuf {
    PathBuf::from("./public")
}
fn default_include_globs() -> Vec<String> {
    vec!["**/*.html".to_string(), "**/*.htm".to_string()]
}

impl Config {
    /// All-defaults configuration, used when no config file exists.
    pub fn minimal() -> Self {
        Self::default()
    }

    /// Parsed `site.base_url`.
    pub fn base_url(&self) -> Result<Url> {
        Url::parse(&self.site.base_url)
            .with_context(|| format!("site.base_url is not a valid URL: {}", self.site.base_url))
    }

    /// Absolute address of the site index.
    pub fn remote_index_url(&self) -> Result<Url> {
        self.base_url()?
            .join(&self.remote.index_path)
            .with_context(|| format!("invalid remote.index_path: {}", self.remote.index_path))
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if !(1..=MAX_RESULTS).contains(&config.search.max_results) {
        anyhow::bail!("search.max_results must be in [1, {}]", MAX_RESULTS);
    }

    if config.search.min_title_chars == 0 {
        anyhow::bail!("search.min_title_chars must be >= 1");
    }

    let base = config.base_url()?;
    if base.cannot_be_a_base() {
        anyhow::bail!("site.base_url must be an absolute URL");
    }

    if config.remote.index_path.trim().is_empty() {
        anyhow::bail!("remote.index_path must not be empty");
    }
    if !config.remote.index_path.starts_with('/') {
        anyhow::bail!(
            "remote.index_path must start with '/': {}",
            config.remote.index_path
        );
    }

    if config.widget.root_id.trim().is_empty() {
        anyhow::bail!("widget.root_id must not be empty");
    }

    Ok(())
}
