//! # page-search CLI (`psearch`)
//!
//! ## Usage
//!
//! ```bash
//! psearch --config ./config/psearch.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `psearch index <page>` | Print the local index of a page |
//! | `psearch search <page> "<query>"` | Query a page, optionally merged with the site index |
//! | `psearch export` | Build the site index from `[export].root` |
//! | `psearch serve` | Serve the site index over HTTP |
//! | `psearch session <page>` | Drive the search widget from stdin |
//!
//! ## Examples
//!
//! ```bash
//! # What would the widget find on this page?
//! psearch index public/about.html --url https://example.com/about.html
//!
//! # Query with the site index merged in
//! psearch search public/about.html "pricing" --remote-file public/search-index.json
//!
//! # Script the widget
//! printf 'open\ntype pric\nenter\n' | psearch session public/index.html
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use page_search::{config, export, logging, search_cmd, server, session_cmd};

/// page-search CLI — in-page search indexing, querying and site index tools.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. When the file does not exist, built-in defaults are used.
#[derive(Parser)]
#[command(
    name = "psearch",
    about = "page-search — index pages, query them, and build the site-wide search index",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/psearch.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Print the local index of a page.
    ///
    /// Lists every link, heading and marked element the widget would index,
    /// in index order.
    Index {
        /// HTML file to index.
        page: PathBuf,

        /// Address the page is served from (defaults to `site.base_url` + file name).
        #[arg(long)]
        url: Option<String>,

        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Query a page the way the widget does.
    Search {
        /// HTML file to search.
        page: PathBuf,

        /// The search query string.
        query: String,

        /// Address the page is served from (defaults to `site.base_url` + file name).
        #[arg(long)]
        url: Option<String>,

        /// Site index JSON file to merge in.
        #[arg(long)]
        remote_file: Option<PathBuf>,

        /// Fetch the site index from `site.base_url` + `remote.index_path`.
        #[arg(long)]
        fetch: bool,

        /// Maximum number of results (at most 10).
        #[arg(long)]
        limit: Option<usize>,

        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Build the site index from the HTML pages under `[export].root`.
    Export {
        /// Override `[export].root`.
        #[arg(long)]
        root: Option<PathBuf>,

        /// Output file; stdout when omitted.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Serve the site index and a query API over HTTP.
    Serve {
        /// Serve this site index file instead of building one at startup.
        #[arg(long)]
        index: Option<PathBuf>,
    },

    /// Drive the search widget with commands read from stdin.
    Session {
        /// HTML file hosting the widget.
        page: PathBuf,

        /// Address the page is served from (defaults to `site.base_url` + file name).
        #[arg(long)]
        url: Option<String>,

        /// Site index JSON file to merge in.
        #[arg(long)]
        remote_file: Option<PathBuf>,

        /// Fetch the site index in the background.
        #[arg(long)]
        fetch: bool,

        /// Also print the rendered suggestion markup.
        #[arg(long)]
        html: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let cli = Cli::parse();

    let mut cfg = if cli.config.exists() {
        config::load_config(&cli.config)?
    } else {
        tracing::debug!(path = %cli.config.display(), "no config file, using defaults");
        config::Config::minimal()
    };

    match cli.command {
        Commands::Index { page, url, json } => {
            search_cmd::run_index(&cfg, &page, url.as_deref(), json)?;
        }
        Commands::Search {
            page,
            query,
            url,
            remote_file,
            fetch,
            limit,
            json,
        } => {
            search_cmd::run_search(
                &cfg,
                &page,
                &query,
                url.as_deref(),
                remote_file.as_deref(),
                fetch,
                limit,
                json,
            )
            .await?;
        }
        Commands::Export { root, out } => {
            if let Some(root) = root {
                cfg.export.root = root;
            }
            export::run_export(&cfg, out.as_deref())?;
        }
        Commands::Serve { index } => {
            server::run_server(&cfg, index.as_deref()).await?;
        }
        Commands::Session {
            page,
            url,
            remote_file,
            fetch,
            html,
        } => {
            session_cmd::run_session(
                &cfg,
                &page,
                url.as_deref(),
                remote_file.as_deref(),
                fetch,
                html,
            )
            .await?;
        }
    }

    Ok(())
}
