//! Page list retrieval and page assembly

use std::collections::HashSet;

use async_trait::async_trait;
use url::Url;

use crate::model::{ChapterKey, ImageRef, Page, PageId};
use crate::utils::{ReaderError, Result};

/// A page row returned by the local catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalPage {
    /// Stable database id
    pub id: u64,
    /// Stored page number, independent of list position
    pub page_number: u32,
}

/// Chapter payload from the local catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalChapter {
    pub chapter_id: u64,
    pub manga_id: u64,
    pub pages: Vec<LocalPage>,
    pub prev_chapter: Option<u64>,
    pub next_chapter: Option<u64>,
}

/// Chapter payload from the aggregator: image references only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalChapter {
    pub chapter_id: String,
    pub images: Vec<Url>,
}

/// Previous/next chapter keys for navigation controls
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdjacentChapters {
    pub previous: Option<ChapterKey>,
    pub next: Option<ChapterKey>,
}

/// Fetched chapter, tagged by source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChapterContent {
    Local(LocalChapter),
    External(ExternalChapter),
}

impl ChapterContent {
    /// The chapter key this payload belongs to
    pub fn key(&self) -> ChapterKey {
        match self {
            Self::Local(chapter) => ChapterKey::Local(chapter.chapter_id),
            Self::External(chapter) => ChapterKey::External(chapter.chapter_id.clone()),
        }
    }

    /// Assemble the display sequence
    ///
    /// Local ordinals come from the stored page number; external ordinals
    /// are list positions. Duplicate identifiers reject the whole chapter.
    pub fn pages(&self) -> Result<Vec<Page>> {
        match self {
            Self::Local(chapter) => assemble_local(chapter),
            Self::External(chapter) => Ok(chapter
                .images
                .iter()
                .enumerate()
                .map(|(index, url)| {
                    let position = index as u32 + 1;
                    Page::new(
                        PageId::External(position),
                        position,
                        ImageRef::Remote(url.clone()),
                    )
                })
                .collect()),
        }
    }

    /// Local manga id, when the source supplies one
    pub fn manga_id(&self) -> Option<u64> {
        match self {
            Self::Local(chapter) => Some(chapter.manga_id),
            Self::External(_) => None,
        }
    }

    /// Neighbouring chapters (external chapters carry none)
    pub fn adjacent(&self) -> AdjacentChapters {
        match self {
            Self::Local(chapter) => AdjacentChapters {
                previous: chapter.prev_chapter.map(ChapterKey::Local),
                next: chapter.next_chapter.map(ChapterKey::Local),
            },
            Self::External(_) => AdjacentChapters::default(),
        }
    }
}

fn assemble_local(chapter: &LocalChapter) -> Result<Vec<Page>> {
    let mut seen = HashSet::with_capacity(chapter.pages.len());
    let mut pages = Vec::with_capacity(chapter.pages.len());

    for row in &chapter.pages {
        if row.id == 0 || row.page_number == 0 {
            return Err(ReaderError::InvalidChapter(format!(
                "chapter {} has page id {} with page number {}",
                chapter.chapter_id, row.id, row.page_number
            )));
        }
        if !seen.insert(row.id) {
            return Err(ReaderError::InvalidChapter(format!(
                "chapter {} repeats page id {}",
                chapter.chapter_id, row.id
            )));
        }
        pages.push(Page::new(
            PageId::Local(row.id),
            row.page_number,
            ImageRef::Local {
                chapter_id: chapter.chapter_id,
                page_number: row.page_number,
            },
        ));
    }

    let mut numbers: Vec<u32> = pages.iter().map(|p| p.ordinal).collect();
    numbers.sort_unstable();
    if numbers.iter().enumerate().any(|(i, n)| *n != i as u32 + 1) {
        log::warn!(
            "chapter {} page numbers are not contiguous 1..{}",
            chapter.chapter_id,
            numbers.len()
        );
    }

    Ok(pages)
}

/// Page list retrieval collaborator
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChapterSource: Send + Sync {
    /// Fetch the page list for a chapter
    async fn fetch_chapter(&self, key: &ChapterKey) -> Result<ChapterContent>;
}
