//! PaperRecord struct - one paper as read from the search feed.

use serde::{Deserialize, Serialize};

/// A single paper extracted from a feed entry.
///
/// Every field is plain text; anything the feed omits is an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PaperRecord {
    /// Paper title, trimmed
    pub title: String,
    /// Abstract with HTML entities decoded and simple tags removed
    pub summary: String,
    /// Link to the abstract page
    pub link: String,
    /// Author names joined with ", "
    pub authors: String,
    /// Publication timestamp as given by the feed
    pub published: String,
    /// Feed identifier (the arXiv abs URL)
    pub id: String,
}

impl PaperRecord {
    /// Create a new record from its display fields
    pub fn new(
        title: impl Into<String>,
        summary: impl Into<String>,
        link: impl Into<String>,
        authors: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            summary: summary.into(),
            link: link.into(),
            authors: authors.into(),
            ..Self::default()
        }
    }
}
