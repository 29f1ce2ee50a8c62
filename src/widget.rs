//! Search widget controller.
//!
//! [`SearchWidget`] owns the widget's open/closed state, the per-open
//! [`WidgetSession`] (merged index, query, results, keyboard selection) and
//! the navigation rules. It does not touch a page directly: every call to
//! [`SearchWidget::handle`] takes an input event and returns the [`Effect`]s
//! the host must apply, in order.
//!
//! # States
//!
//! ```text
//!              open / toggle
//!   Closed ───────────────────▶ OpenEmpty ◀──── blank input ────┐
//!     ▲                             │                           │
//!     │ close / toggle / Escape     │ non-blank input           │
//!     │ outside click               ▼                           │
//!     │ in-page navigation      OpenResults ────────────────────┘
//!     └─────────────────────────────┘
//! ```
//!
//! Opening rebuilds the local index and merges it with whatever the site
//! index handle holds at that moment. A site index that arrives while the
//! widget is open becomes visible on the next open.

use std::fmt;

use quick_xml::escape::escape;

use crate::config::{Config, SearchConfig, WidgetConfig};
use crate::indexer::build_local_index;
use crate::merge::merge;
use crate::models::{IndexEntry, NodeRef};
use crate::page::PageContent;
use crate::remote::RemoteIndexHandle;
use crate::search::search_with_limit;

/// Keys the widget reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    Enter,
    Escape,
}

/// Input events delivered by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetEvent {
    /// The search button was clicked.
    Toggle,
    Open,
    Close,
    /// The input's value changed.
    Input(String),
    Key(Key),
    /// A click anywhere in the document. Clicks inside the widget (button,
    /// panel, suggestion list) never close it.
    DocumentClick { inside_widget: bool },
    /// A rendered suggestion was clicked.
    Click(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetState {
    Closed,
    OpenEmpty,
    OpenResults,
}

/// One rendered result row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub index: usize,
    pub title: String,
    /// Category label; site index records without one have no meta line.
    pub meta: Option<&'static str>,
}

/// Content of the suggestion list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Panel {
    /// Nothing typed.
    Blank,
    /// A query matched nothing.
    NoResults,
    Suggestions(Vec<Suggestion>),
}

impl Panel {
    fn for_results(query: &str, results: &[IndexEntry]) -> Self {
        if query.trim().is_empty() {
            Panel::Blank
        } else if results.is_empty() {
            Panel::NoResults
        } else {
            Panel::Suggestions(
                results
                    .iter()
                    .enumerate()
                    .map(|(index, e)| Suggestion {
                        index,
                        title: e.title().to_string(),
                        meta: e.meta(),
                    })
                    .collect(),
            )
        }
    }

    /// Markup for the suggestion container's children.
    pub fn to_html(&self, config: &WidgetConfig, active: Option<usize>) -> String {
        match self {
            Panel::Blank => String::new(),
            Panel::NoResults => format!(
                "<div class=\"pm-no-results\">{}</div>",
                escape(config.no_results_text.as_str())
            ),
            Panel::Suggestions(items) => items
                .iter()
                .map(|s| {
                    let class = if active == Some(s.index) {
                        format!("pm-suggestion {}", config.active_class)
                    } else {
                        "pm-suggestion".to_string()
                    };
                    let meta = s
                        .meta
                        .map(|m| format!("<div class=\"meta\">{}</div>", m))
                        .unwrap_or_default();
                    format!(
                        "<div class=\"{}\" role=\"option\" data-idx=\"{}\" tabindex=\"0\"><div>{}</div>{}</div>",
                        escape(class.as_str()),
                        s.index,
                        escape(s.title.as_str()),
                        meta
                    )
                })
                .collect(),
        }
    }
}

/// Changes the host must apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Add or remove the open class on the widget root.
    SetOpen(bool),
    FocusInput { delay_ms: u64 },
    ClearInput,
    Render(Panel),
    /// Mark the row active and scroll it into view (block `nearest`).
    Highlight { index: usize },
    /// Smooth-scroll the element into the center of the viewport.
    ScrollIntoView { node: NodeRef },
    /// Full page navigation.
    Navigate(String),
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::SetOpen(open) => write!(f, "set-open {}", open),
            Effect::FocusInput { delay_ms } => write!(f, "focus-input after {}ms", delay_ms),
            Effect::ClearInput => write!(f, "clear-input"),
            Effect::Render(Panel::Blank) => write!(f, "render blank"),
            Effect::Render(Panel::NoResults) => write!(f, "render no-results"),
            Effect::Render(Panel::Suggestions(items)) => {
                write!(f, "render {} suggestion(s)", items.len())?;
                for s in items {
                    write!(f, "\n  [{}] {}", s.index, s.title)?;
                    if let Some(meta) = s.meta {
                        write!(f, " ({})", meta)?;
                    }
                }
                Ok(())
            }
            Effect::Highlight { index } => write!(f, "highlight {}", index),
            Effect::ScrollIntoView { node } => write!(f, "scroll-into-view node#{}", node.0),
            Effect::Navigate(url) => write!(f, "navigate {}", url),
        }
    }
}

/// State of one open widget; dropped on close.
#[derive(Debug, Clone)]
pub struct WidgetSession {
    merged: Vec<IndexEntry>,
    query: String,
    results: Vec<IndexEntry>,
    active: Option<usize>,
}

impl WidgetSession {
    fn new(merged: Vec<IndexEntry>) -> Self {
        Self {
            merged,
            query: String::new(),
            results: Vec::new(),
            active: None,
        }
    }

    pub fn merged(&self) -> &[IndexEntry] {
        &self.merged
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn results(&self) -> &[IndexEntry] {
        &self.results
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }
}

/// The search widget of one page load.
#[derive(Debug)]
pub struct SearchWidget {
    widget: WidgetConfig,
    search: SearchConfig,
    remote: RemoteIndexHandle,
    session: Option<WidgetSession>,
}

impl SearchWidget {
    /// Attaches to `page`, or returns `None` when the page has no widget root.
    pub fn attach(page: &dyn PageContent, config: &Config, remote: RemoteIndexHandle) -> Option<Self> {
        if page.element_by_id(&config.widget.root_id).is_none() {
            tracing::debug!(root_id = %config.widget.root_id, "no search widget root on page");
            return None;
        }
        Some(Self {
            widget: config.widget.clone(),
            search: config.search.clone(),
            remote,
            session: None,
        })
    }

    pub fn state(&self) -> WidgetState {
        match &self.session {
            None => WidgetState::Closed,
            Some(s) if s.query.trim().is_empty() => WidgetState::OpenEmpty,
            Some(_) => WidgetState::OpenResults,
        }
    }

    pub fn session(&self) -> Option<&WidgetSession> {
        self.session.as_ref()
    }

    /// Applies one event and returns the effects to perform.
    pub fn handle(&mut self, event: WidgetEvent, page: &dyn PageContent) -> Vec<Effect> {
        match event {
            WidgetEvent::Toggle => {
                if self.session.is_some() {
                    self.close()
                } else {
                    self.open(page)
                }
            }
            WidgetEvent::Open if self.session.is_none() => self.open(page),
            WidgetEvent::Open => Vec::new(),
            WidgetEvent::Close | WidgetEvent::Key(Key::Escape) => self.close(),
            WidgetEvent::DocumentClick { inside_widget } => {
                if inside_widget {
                    Vec::new()
                } else {
                    self.close()
                }
            }
            WidgetEvent::Input(text) => self.input(text),
            WidgetEvent::Key(Key::ArrowDown) => self.move_active(1),
            WidgetEvent::Key(Key::ArrowUp) => self.move_active(-1),
            WidgetEvent::Key(Key::Enter) => self.enter(page),
            WidgetEvent::Click(index) => self.select(index, page),
        }
    }

    fn open(&mut self, page: &dyn PageContent) -> Vec<Effect> {
        let local = build_local_index(page, self.search.min_title_chars);
        let merged = merge(&self.remote.entries(), &local);
        tracing::debug!(
            local = local.len(),
            merged = merged.len(),
            "search widget opened"
        );
        self.session = Some(WidgetSession::new(merged));
        vec![
            Effect::SetOpen(true),
            Effect::FocusInput {
                delay_ms: self.widget.focus_delay_ms,
            },
        ]
    }

    fn close(&mut self) -> Vec<Effect> {
        if self.session.take().is_none() {
            return Vec::new();
        }
        vec![
            Effect::SetOpen(false),
            Effect::ClearInput,
            Effect::Render(Panel::Blank),
        ]
    }

    fn input(&mut self, text: String) -> Vec<Effect> {
        let limit = self.search.max_results;
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        session.results = search_with_limit(&text, &session.merged, limit);
        session.query = text;
        session.active = None;
        vec![Effect::Render(Panel::for_results(
            &session.query,
            &session.results,
        ))]
    }

    fn move_active(&mut self, step: isize) -> Vec<Effect> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        let count = session.results.len();
        if count == 0 {
            return Vec::new();
        }
        let next = match (session.active, step) {
            (None, _) => 0,
            (Some(i), s) if s > 0 => (i + 1).min(count - 1),
            (Some(i), _) => i.saturating_sub(1),
        };
        session.active = Some(next);
        vec![Effect::Highlight { index: next }]
    }

    fn enter(&mut self, page: &dyn PageContent) -> Vec<Effect> {
        let Some(session) = self.session.as_ref() else {
            return Vec::new();
        };
        match session.active {
            Some(i) if i < session.results.len() => self.select(i, page),
            _ if session.query.trim().is_empty() => Vec::new(),
            _ => self.select(0, page),
        }
    }

    fn select(&mut self, index: usize, page: &dyn PageContent) -> Vec<Effect> {
        let entry = match self.session.as_ref().and_then(|s| s.results.get(index)) {
            Some(entry) => entry.clone(),
            None => return Vec::new(),
        };
        self.navigate(&entry, page)
    }

    fn navigate(&mut self, entry: &IndexEntry, page: &dyn PageContent) -> Vec<Effect> {
        if let Some(href) = entry.href() {
            if let Some(node) = same_page_target(href, page) {
                let mut effects = vec![Effect::ScrollIntoView { node }];
                effects.extend(self.close());
                return effects;
            }
            return vec![Effect::Navigate(page.resolve(href))];
        }
        if let Some(node) = entry.node() {
            let mut effects = vec![Effect::ScrollIntoView { node }];
            effects.extend(self.close());
            return effects;
        }
        Vec::new()
    }
}

/// Element targeted by `href` when it is a fragment address on this page.
///
/// The origin check is a plain string prefix test against the page origin.
fn same_page_target(href: &str, page: &dyn PageContent) -> Option<NodeRef> {
    if !href.starts_with(&page.origin()) || !href.contains('#') {
        return None;
    }
    let id = href.split('#').nth(1).filter(|id| !id.is_empty())?;
    page.element_by_id(id)
}
