//! Content sources and out-of-band chapter context
//!
//! The reader pulls page lists from one of two sources. Everything past
//! [`ChapterContent::pages`] works on the common [`Page`](crate::model::Page)
//! shape and never branches on the source again.

mod source;
mod storage;

pub use source::{
    AdjacentChapters, ChapterContent, ChapterSource, ExternalChapter, LocalChapter, LocalPage,
};
pub use storage::{ExternalChapterContext, MemorySessionStorage, SessionStorage};
