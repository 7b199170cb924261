//! Chapter route parameters

use std::fmt;

use super::SourceKind;
use crate::utils::{ReaderError, Result};

/// Prefix that marks a chapter route parameter as external
pub const EXTERNAL_CHAPTER_PREFIX: &str = "ext-";

/// Key of the chapter a reading session is bound to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChapterKey {
    /// Numeric chapter id in the local catalog
    Local(u64),
    /// Opaque chapter id issued by the aggregator
    External(String),
}

impl ChapterKey {
    /// Resolve a route parameter into a chapter key
    ///
    /// A bare positive integer is a local chapter; `ext-<id>` is external.
    pub fn from_route(param: &str) -> Result<Self> {
        let param = param.trim();
        if let Some(id) = param.strip_prefix(EXTERNAL_CHAPTER_PREFIX) {
            if id.is_empty() || id.contains('/') {
                return Err(ReaderError::InvalidRoute(param.to_string()));
            }
            return Ok(Self::External(id.to_string()));
        }
        match param.parse::<u64>() {
            Ok(id) if id > 0 && param.bytes().all(|b| b.is_ascii_digit()) => Ok(Self::Local(id)),
            _ => Err(ReaderError::InvalidRoute(param.to_string())),
        }
    }

    /// The source that serves this chapter
    pub fn source_kind(&self) -> SourceKind {
        match self {
            Self::Local(_) => SourceKind::Local,
            Self::External(_) => SourceKind::External,
        }
    }

    /// Source-native id without the route tag
    pub fn raw_id(&self) -> String {
        match self {
            Self::Local(id) => id.to_string(),
            Self::External(id) => id.clone(),
        }
    }
}

/// Renders the route-segment form (`42` or `ext-<id>`)
impl fmt::Display for ChapterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(id) => write!(f, "{}", id),
            Self::External(id) => write!(f, "{}{}", EXTERNAL_CHAPTER_PREFIX, id),
        }
    }
}
