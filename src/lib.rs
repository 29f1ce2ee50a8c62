//! # page-search
//!
//! In-page search for static sites: index what a page shows, merge it with a
//! precomputed site-wide index, match queries by case-insensitive substring,
//! and drive a keyboard-friendly search widget.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐
//! │ PageContent │──▶│   Indexer   │──┐
//! │  (HtmlPage) │   └─────────────┘  │   ┌────────┐   ┌──────────────┐   ┌──────────────┐
//! └─────────────┘                    ├──▶│ Merger │──▶│ Query engine │──▶│    Widget    │
//! ┌─────────────┐   ┌─────────────┐  │   └────────┘   └──────────────┘   │  controller  │
//! │ /search-    │──▶│ Site index  │──┘                                    └──────┬───────┘
//! │ index.json  │   │   loader    │                                              ▼
//! └─────────────┘   └─────────────┘                                         Effects (host)
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! psearch export --out public/search-index.json   # build the site index
//! psearch search public/index.html "pricing" --remote-file public/search-index.json
//! psearch serve                                   # serve /search-index.json
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Index entries and site index records |
//! | [`page`] | Page content scanner and HTML implementation |
//! | [`indexer`] | Local index from page content |
//! | [`remote`] | Site index loading |
//! | [`merge`] | Site + local index merging |
//! | [`search`] | Substring query engine |
//! | [`widget`] | Search widget controller |
//! | [`export`] | Site index generation |
//! | [`server`] | Site index HTTP server |

pub mod config;
pub mod export;
pub mod indexer;
pub mod logging;
pub mod merge;
pub mod models;
pub mod page;
pub mod remote;
pub mod search;
pub mod search_cmd;
pub mod server;
pub mod session_cmd;
pub mod widget;
