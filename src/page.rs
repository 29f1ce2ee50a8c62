//! Page content scanning.
//!
//! The indexer and the widget never touch markup directly; they read a page
//! through the [`PageContent`] capability. [`HtmlPage`] is the HTML-backed
//! implementation: a lenient, single-pass parse with `quick-xml` into a flat
//! element table that keeps document order, parent links, attributes and the
//! visible text of every element.
//!
//! Parsing never fails. Unclosed elements are closed by the nearest matching
//! end tag, void elements never open a scope, stray end tags are ignored, and
//! entities that cannot be decoded are kept verbatim.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use reqwest::Url;

use crate::models::NodeRef;

/// Attribute marking an element as searchable; its value, when non-empty,
/// overrides the visible text as the entry title.
pub const SEARCH_MARKER_ATTR: &str = "data-search";

const HEADING_TAGS: [&str; 5] = ["h1", "h2", "h3", "h4", "h5"];

const VOID_TAGS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose content is raw text and never visible.
const RAW_TEXT_TAGS: [&str; 2] = ["script", "style"];

/// One element as seen by the indexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageElement {
    pub node: NodeRef,
    /// Visible text with whitespace runs collapsed; not trimmed.
    pub text: String,
    pub id: Option<String>,
    /// The element's own `href`, resolved against the page URL.
    pub href: Option<String>,
    /// `href` of the nearest enclosing `<a href>` ancestor, resolved.
    pub enclosing_href: Option<String>,
    /// Value of the [`SEARCH_MARKER_ATTR`] attribute, if present.
    pub search_label: Option<String>,
}

/// Read-only view of a page, as needed by indexing and navigation.
pub trait PageContent {
    /// Address of the page, including any fragment.
    fn url(&self) -> &Url;

    /// All `<a href>` elements in document order.
    fn links(&self) -> Vec<PageElement>;

    /// All `h1`..`h5` elements in document order.
    fn headings(&self) -> Vec<PageElement>;

    /// All elements carrying the search marker, in document order.
    fn marked(&self) -> Vec<PageElement>;

    /// First element whose `id` equals `id`.
    fn element_by_id(&self, id: &str) -> Option<NodeRef>;

    /// ASCII serialization of the page origin, e.g. `https://example.com`.
    fn origin(&self) -> String {
        self.url().origin().ascii_serialization()
    }

    /// Page address without its fragment, followed by `#id`.
    fn fragment_href(&self, id: &str) -> String {
        let mut base = self.url().clone();
        base.set_fragment(None);
        format!("{}#{}", base, id)
    }

    /// Resolves a possibly relative address against the page URL. Addresses
    /// that cannot be resolved are returned unchanged.
    fn resolve(&self, href: &str) -> String {
        self.url()
            .join(href)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| href.to_string())
    }
}

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    attrs: Vec<(String, String)>,
    parent: Option<usize>,
    text: String,
}

impl Node {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// A parsed HTML document.
#[derive(Debug, Clone)]
pub struct HtmlPage {
    url: Url,
    nodes: Vec<Node>,
}

impl HtmlPage {
    /// Parses `html` as the page found at `url`.
    pub fn parse(html: &str, url: Url) -> Self {
        let cleaned = strip_raw_text(html);
        let mut reader = Reader::from_str(&cleaned);
        {
            let config = reader.config_mut();
            config.check_end_names = false;
            config.allow_unmatched_ends = true;
            config.check_comments = false;
        }

        let mut nodes: Vec<Node> = Vec::new();
        let mut open: Vec<usize> = Vec::new();

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    let idx = push_node(&mut nodes, &e, open.last().copied());
                    if !VOID_TAGS.contains(&nodes[idx].tag.as_str()) {
                        open.push(idx);
                    }
                }
                Ok(Event::Empty(e)) => {
                    push_node(&mut nodes, &e, open.last().copied());
                }
                Ok(Event::End(e)) => {
                    let tag = lowercase_name(e.name().as_ref());
                    if let Some(pos) = open.iter().rposition(|&i| nodes[i].tag == tag) {
                        open.truncate(pos);
                    }
                }
                Ok(Event::Text(e)) => {
                    let raw = String::from_utf8_lossy(&e);
                    let text = decode_entities(&raw);
                    for &i in &open {
                        nodes[i].text.push_str(&text);
                    }
                }
                Ok(Event::CData(e)) => {
                    let text = String::from_utf8_lossy(&e).to_string();
                    for &i in &open {
                        nodes[i].text.push_str(&text);
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(
                        position = reader.buffer_position(),
                        "stopping page parse at malformed markup: {}",
                        e
                    );
                    break;
                }
            }
        }

        Self { url, nodes }
    }

    /// Text of the document's `<title>`, trimmed, if non-empty.
    pub fn document_title(&self) -> Option<String> {
        self.nodes
            .iter()
            .find(|n| n.tag == "title")
            .map(|n| collapse_whitespace(&n.text).trim().to_string())
            .filter(|t| !t.is_empty())
    }

    fn element(&self, idx: usize) -> PageElement {
        let node = &self.nodes[idx];
        PageElement {
            node: NodeRef(idx),
            text: collapse_whitespace(&node.text),
            id: node.attr("id").filter(|v| !v.is_empty()).map(str::to_string),
            href: node.attr("href").map(|h| self.resolve(h)),
            enclosing_href: self.enclosing_link(idx).map(|h| self.resolve(h)),
            search_label: node.attr(SEARCH_MARKER_ATTR).map(str::to_string),
        }
    }

    fn enclosing_link(&self, idx: usize) -> Option<&str> {
        let mut cur = self.nodes[idx].parent;
        while let Some(i) = cur {
            let node = &self.nodes[i];
            if node.tag == "a" {
                if let Some(href) = node.attr("href") {
                    return Some(href);
                }
            }
            cur = node.parent;
        }
        None
    }

    fn select(&self, pred: impl Fn(&Node) -> bool) -> Vec<PageElement> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| pred(n))
            .map(|(i, _)| self.element(i))
            .collect()
    }
}

impl PageContent for HtmlPage {
    fn url(&self) -> &Url {
        &self.url
    }

    fn links(&self) -> Vec<PageElement> {
        self.select(|n| n.tag == "a" && n.attr("href").is_some())
    }

    fn headings(&self) -> Vec<PageElement> {
        self.select(|n| HEADING_TAGS.contains(&n.tag.as_str()))
    }

    fn marked(&self) -> Vec<PageElement> {
        self.select(|n| n.attr(SEARCH_MARKER_ATTR).is_some())
    }

    fn element_by_id(&self, id: &str) -> Option<NodeRef> {
        self.nodes
            .iter()
            .position(|n| n.attr("id") == Some(id))
            .map(NodeRef)
    }
}

fn push_node(nodes: &mut Vec<Node>, start: &BytesStart<'_>, parent: Option<usize>) -> usize {
    let attrs = start
        .html_attributes()
        .filter_map(|a| a.ok())
        .map(|a| {
            let key = lowercase_name(a.key.as_ref());
            let raw = String::from_utf8_lossy(&a.value);
            (key, decode_entities(&raw))
        })
        .collect();
    nodes.push(Node {
        tag: lowercase_name(start.name().as_ref()),
        attrs,
        parent,
        text: String::new(),
    });
    nodes.len() - 1
}

fn lowercase_name(name: &[u8]) -> String {
    String::from_utf8_lossy(name).to_ascii_lowercase()
}

/// Decodes XML and numeric entities plus `&nbsp;`; entities that cannot be
/// decoded are kept as written.
fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let semi = tail.find(';').filter(|&i| i <= 12);
        let Some(semi) = semi else {
            out.push('&');
            rest = &tail[1..];
            continue;
        };
        let entity = &tail[..=semi];
        if entity == "&nbsp;" {
            out.push('\u{a0}');
        } else {
            match quick_xml::escape::unescape(entity) {
                Ok(text) => out.push_str(&text),
                Err(_) => out.push_str(entity),
            }
        }
        rest = &tail[semi + 1..];
    }
    out.push_str(rest);
    out
}

/// Collapses every whitespace run (including non-breaking spaces) into one
/// space, the way rendered text reads.
pub fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

/// Removes the content of `<script>` and `<style>` elements, which is not
/// markup and would otherwise derail the parser.
fn strip_raw_text(html: &str) -> String {
    let lower = html.to_ascii_lowercase();
    let mut out = String::with_capacity(html.len());
    let mut pos = 0;

    while pos < html.len() {
        let next = RAW_TEXT_TAGS
            .iter()
            .filter_map(|tag| find_open_tag(&lower, pos, tag).map(|at| (at, *tag)))
            .min_by_key(|(at, _)| *at);

        let Some((start, tag)) = next else {
            out.push_str(&html[pos..]);
            break;
        };

        let Some(open_end) = lower[start..].find('>').map(|i| start + i + 1) else {
            out.push_str(&html[pos..]);
            break;
        };
        out.push_str(&html[pos..open_end]);

        let close = format!("</{}", tag);
        match lower[open_end..].find(&close) {
            Some(i) => pos = open_end + i,
            None => break,
        }
    }

    out
}

fn find_open_tag(lower: &str, from: usize, tag: &str) -> Option<usize> {
    let needle = format!("<{}", tag);
    let mut search = from;
    while let Some(i) = lower[search..].find(&needle) {
        let at = search + i;
        let after = lower[at + needle.len()..].chars().next();
        if matches!(after, Some(c) if c == '>' || c == '/' || c.is_ascii_whitespace()) {
            return Some(at);
        }
        search = at + needle.len();
    }
    None
}
