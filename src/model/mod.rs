//! Core data model shared by every reader component
//!
//! Pages and chapters from both content sources are expressed with the same
//! types; only the identifier variants remember where they came from.

mod page;
mod route;

pub use page::{ImageRef, Page, PageId, SourceKind, EXTERNAL_PAGE_PREFIX};
pub use route::{ChapterKey, EXTERNAL_CHAPTER_PREFIX};
