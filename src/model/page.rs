//! Page identifiers and page records

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::utils::{ReaderError, Result};

/// Tag carried by every external page identifier
pub const EXTERNAL_PAGE_PREFIX: &str = "ext-";

/// Where a chapter's pages come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// The system's own catalog
    Local,
    /// Third-party aggregator
    External,
}

/// Identifier of a page within a reading session
///
/// Local pages keep their stable database id. External pages have no id of
/// their own, so they are identified by their 1-based list position and
/// rendered with the `ext-` tag, which keeps the two spaces disjoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PageId {
    Local(u64),
    External(u32),
}

impl PageId {
    /// Parse an identifier from its textual (URL segment) form
    ///
    /// Returns `None` for anything that is not a positive integer or a
    /// tagged positive position.
    pub fn parse(segment: &str) -> Option<Self> {
        let segment = segment.trim();
        if let Some(position) = segment.strip_prefix(EXTERNAL_PAGE_PREFIX) {
            return match position.parse::<u32>() {
                Ok(n) if n > 0 && is_plain_digits(position) => Some(Self::External(n)),
                _ => None,
            };
        }
        match segment.parse::<u64>() {
            Ok(n) if n > 0 && is_plain_digits(segment) => Some(Self::Local(n)),
            _ => None,
        }
    }

    /// The source this identifier belongs to
    pub fn source_kind(&self) -> SourceKind {
        match self {
            Self::Local(_) => SourceKind::Local,
            Self::External(_) => SourceKind::External,
        }
    }
}

fn is_plain_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(id) => write!(f, "{}", id),
            Self::External(position) => write!(f, "{}{}", EXTERNAL_PAGE_PREFIX, position),
        }
    }
}

impl FromStr for PageId {
    type Err = ReaderError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| ReaderError::InvalidRoute(format!("bad page id '{}'", s)))
    }
}

/// Reference the image-delivery collaborator can resolve
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    /// Served by our own API, addressed by chapter and stored page number
    Local { chapter_id: u64, page_number: u32 },
    /// Direct URL handed out by the aggregator
    Remote(Url),
}

impl ImageRef {
    /// Resolve to a fetchable URL against the API base
    pub fn resolve(&self, api_base: &Url) -> Result<Url> {
        match self {
            Self::Local {
                chapter_id,
                page_number,
            } => Ok(api_base.join(&format!(
                "chapters/{}/pages/{}/image",
                chapter_id, page_number
            ))?),
            Self::Remote(url) => Ok(url.clone()),
        }
    }
}

/// A single renderable page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Session-unique identifier
    pub id: PageId,
    /// 1-based display ordinal
    pub ordinal: u32,
    /// Image reference
    pub image: ImageRef,
}

impl Page {
    /// Create a page
    pub fn new(id: PageId, ordinal: u32, image: ImageRef) -> Self {
        Self { id, ordinal, image }
    }
}
