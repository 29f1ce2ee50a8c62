//! Site index loading.
//!
//! The site index is a JSON array of `{ "title", "href" }` records served at a
//! well-known path (`/search-index.json` by default). It is fetched at most
//! once per page load, in the background, and its outcome is published on a
//! `watch` channel that the widget reads whenever it opens.
//!
//! Every failure (transport error, non-2xx status, malformed body) degrades to
//! an empty index. Failures are kept apart from "not loaded yet" in
//! [`RemoteIndex`], but [`RemoteIndex::entries`] treats both as empty.

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::{Client, Url};
use tokio::sync::watch;

use crate::config::RemoteConfig;
use crate::models::{IndexEntry, SiteRecord};

/// Outcome of the site index fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteIndex {
    /// The fetch has not completed.
    Pending,
    Loaded(Vec<IndexEntry>),
    /// The fetch failed; the reason is for diagnostics only.
    Failed(String),
}

impl RemoteIndex {
    /// Entries to merge; empty unless loaded.
    pub fn entries(&self) -> &[IndexEntry] {
        match self {
            RemoteIndex::Loaded(entries) => entries,
            RemoteIndex::Pending | RemoteIndex::Failed(_) => &[],
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, RemoteIndex::Pending)
    }
}

/// Parses a site index body. Records with a blank title are skipped; any
/// other deviation from an array of `{title, href}` objects is an error.
pub fn parse_site_index(body: &str) -> Result<Vec<IndexEntry>> {
    let records: Vec<SiteRecord> =
        serde_json::from_str(body).context("site index is not an array of {title, href}")?;
    Ok(records
        .into_iter()
        .filter_map(SiteRecord::into_entry)
        .collect())
}

/// Builds the HTTP client used for the fetch. No timeout unless configured.
pub fn build_client(config: &RemoteConfig) -> Result<Client> {
    let mut builder = Client::builder();
    if let Some(secs) = config.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder.build().context("Failed to build HTTP client")
}

/// Fetches the site index once. Never fails: errors become
/// [`RemoteIndex::Failed`].
pub async fn fetch_remote_index(client: &Client, url: Url) -> RemoteIndex {
    match try_fetch(client, url.clone()).await {
        Ok(entries) => {
            tracing::debug!(%url, entries = entries.len(), "site index loaded");
            RemoteIndex::Loaded(entries)
        }
        Err(e) => {
            tracing::debug!(%url, "site index unavailable: {:#}", e);
            RemoteIndex::Failed(format!("{:#}", e))
        }
    }
}

async fn try_fetch(client: &Client, url: Url) -> Result<Vec<IndexEntry>> {
    let resp = client.get(url).send().await?;
    let status = resp.status();
    if !status.is_success() {
        bail!("site index request returned HTTP {}", status);
    }
    let body = resp.text().await?;
    parse_site_index(&body)
}

/// Reads a site index from a local file, with the same silent-failure rules
/// as the HTTP fetch.
pub fn load_site_index_file(path: &Path) -> RemoteIndex {
    let loaded = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read site index: {}", path.display()))
        .and_then(|body| parse_site_index(&body));
    match loaded {
        Ok(entries) => RemoteIndex::Loaded(entries),
        Err(e) => {
            tracing::debug!("site index unavailable: {:#}", e);
            RemoteIndex::Failed(format!("{:#}", e))
        }
    }
}

/// Starts the one-shot background fetch.
pub struct RemoteIndexLoader;

impl RemoteIndexLoader {
    /// Spawns the fetch on the current tokio runtime and returns at once.
    ///
    /// The handle reports [`RemoteIndex::Pending`] until the fetch settles.
    /// There is no retry and the task cannot be cancelled.
    pub fn spawn(client: Client, url: Url) -> RemoteIndexHandle {
        let (tx, rx) = watch::channel(RemoteIndex::Pending);
        tokio::spawn(async move {
            let outcome = fetch_remote_index(&client, url).await;
            tx.send_replace(outcome);
        });
        RemoteIndexHandle { rx }
    }
}

/// Read side of the site index; cheap to clone.
#[derive(Debug, Clone)]
pub struct RemoteIndexHandle {
    rx: watch::Receiver<RemoteIndex>,
}

impl RemoteIndexHandle {
    /// A handle that already holds `index` and never changes.
    pub fn fixed(index: RemoteIndex) -> Self {
        let (_tx, rx) = watch::channel(index);
        Self { rx }
    }

    /// Wraps an existing channel, for hosts that run the fetch themselves.
    pub fn from_receiver(rx: watch::Receiver<RemoteIndex>) -> Self {
        Self { rx }
    }

    /// A handle for pages without a site index.
    pub fn disabled() -> Self {
        Self::fixed(RemoteIndex::Loaded(Vec::new()))
    }

    /// Current state of the fetch.
    pub fn state(&self) -> RemoteIndex {
        self.rx.borrow().clone()
    }

    /// Entries currently available for merging.
    pub fn entries(&self) -> Vec<IndexEntry> {
        self.rx.borrow().entries().to_vec()
    }

    /// Waits until the fetch has settled and returns its outcome.
    pub async fn settled(&mut self) -> RemoteIndex {
        if let Ok(state) = self.rx.wait_for(|state| !state.is_pending()).await {
            return state.clone();
        }
        // sender dropped before settling
        self.state()
    }
}
