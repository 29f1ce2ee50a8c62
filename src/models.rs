//! Core data models used throughout page-search.
//!
//! These types represent the searchable entries that flow from the page
//! scanner and the site index through the merger and the query engine.

use serde::{Deserialize, Serialize};

/// Opaque handle to an element of the page that produced it.
///
/// Handles are only meaningful for the [`PageContent`](crate::page::PageContent)
/// that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct NodeRef(pub(crate) usize);

/// Where a searchable entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Link,
    Heading,
    Custom,
}

impl Category {
    /// Label shown under the title of a rendered suggestion.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Link => "link",
            Category::Heading => "heading",
            Category::Custom => "data",
        }
    }
}

/// One searchable unit.
///
/// An entry always has a non-blank title and at least one navigation target
/// (an address, an element, or both). Entries cannot be modified once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexEntry {
    title: String,
    href: Option<String>,
    #[serde(skip)]
    node: Option<NodeRef>,
    /// Absent for site index records that do not name one.
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<Category>,
}

impl IndexEntry {
    /// Builds an entry, or `None` if the title is blank or there is nothing
    /// to navigate to.
    pub fn new(
        title: impl Into<String>,
        href: Option<String>,
        node: Option<NodeRef>,
        category: Category,
    ) -> Option<Self> {
        Self::build(title.into(), href, node, Some(category))
    }

    fn build(
        title: String,
        href: Option<String>,
        node: Option<NodeRef>,
        category: Option<Category>,
    ) -> Option<Self> {
        let title = title.trim().to_string();
        if title.is_empty() || (href.is_none() && node.is_none()) {
            return None;
        }
        Some(Self {
            title,
            href,
            node,
            category,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn href(&self) -> Option<&str> {
        self.href.as_deref()
    }

    pub fn node(&self) -> Option<NodeRef> {
        self.node
    }

    pub fn category(&self) -> Option<Category> {
        self.category
    }

    /// Label rendered under the title; `None` hides the meta line.
    pub fn meta(&self) -> Option<&'static str> {
        self.category.as_ref().map(Category::label)
    }

    /// Title length in characters, the ranking key of the query engine.
    pub fn title_len(&self) -> usize {
        self.title.chars().count()
    }

    /// Navigation target as used in dedup keys; a missing address keys as "".
    pub fn target_key(&self) -> &str {
        self.href.as_deref().unwrap_or("")
    }
}

/// Wire shape of one record of the site-wide index (`/search-index.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteRecord {
    pub title: String,
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

impl SiteRecord {
    /// Converts to an entry; blank titles are rejected. A record without a
    /// category yields an entry without one.
    pub fn into_entry(self) -> Option<IndexEntry> {
        IndexEntry::build(self.title, Some(self.href), None, self.category)
    }
}
