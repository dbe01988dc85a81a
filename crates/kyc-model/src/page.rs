//! Spring-style paginated responses.

use serde::{Deserialize, Serialize};

/// One page of a paginated listing.
///
/// Mirrors the Spring Data `Page` JSON shape; unknown fields such as
/// `pageable` and `sort` are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    /// Items on this page.
    pub content: Vec<T>,
    /// Total number of items across all pages.
    #[serde(default)]
    pub total_elements: u64,
    /// Total number of pages.
    #[serde(default)]
    pub total_pages: u32,
    /// Requested page size.
    #[serde(default)]
    pub size: u32,
    /// Zero-based page index.
    #[serde(default)]
    pub number: u32,
    /// Whether this is the first page.
    #[serde(default)]
    pub first: bool,
    /// Whether this is the last page.
    #[serde(default)]
    pub last: bool,
}

impl<T> PageResponse<T> {
    /// Returns whether the page holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// One-line summary, e.g. `page 1/3 (45 total)`.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "page {}/{} ({} total)",
            self.number + 1,
            self.total_pages.max(1),
            self.total_elements
        )
    }
}
