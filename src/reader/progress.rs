//! Reading progress: one record per chapter load

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::content::ExternalChapterContext;
use crate::model::ChapterKey;
use crate::utils::Result;

/// Progress record sent to the tracking sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum ProgressRecord {
    #[serde(rename_all = "camelCase")]
    Local { manga_id: u64, chapter_id: u64 },
    #[serde(rename_all = "camelCase")]
    External {
        manga_id: String,
        chapter_id: String,
        chapter_number: String,
        manga_title: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        cover_url: Option<String>,
    },
}

impl ProgressRecord {
    /// Build a record when every required field is present
    ///
    /// Local chapters need the manga id from the chapter payload; external
    /// chapters need the out-of-band context.
    pub fn for_chapter(
        chapter: &ChapterKey,
        manga_id: Option<u64>,
        context: Option<&ExternalChapterContext>,
    ) -> Option<Self> {
        match chapter {
            ChapterKey::Local(chapter_id) => Some(Self::Local {
                manga_id: manga_id?,
                chapter_id: *chapter_id,
            }),
            ChapterKey::External(chapter_id) => {
                let context = context?;
                Some(Self::External {
                    manga_id: context.manga_id.clone(),
                    chapter_id: chapter_id.clone(),
                    chapter_number: context.chapter_number.clone(),
                    manga_title: context.manga_title.clone(),
                    cover_url: context.cover_url.clone(),
                })
            }
        }
    }

    /// The (source, chapter) pair this record covers
    pub fn chapter(&self) -> ChapterKey {
        match self {
            Self::Local { chapter_id, .. } => ChapterKey::Local(*chapter_id),
            Self::External { chapter_id, .. } => ChapterKey::External(chapter_id.clone()),
        }
    }
}

/// Progress-tracking collaborator
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn record_progress(&self, record: &ProgressRecord) -> Result<()>;
}

/// Send a record, logging instead of propagating failure
pub async fn dispatch(sink: Arc<dyn ProgressSink>, record: ProgressRecord) {
    match sink.record_progress(&record).await {
        Ok(()) => log::debug!("Recorded progress for chapter {}", record.chapter()),
        Err(e) => log::warn!(
            "Progress tracking failed for chapter {}: {}",
            record.chapter(),
            e
        ),
    }
}

/// Emits at most one record per chapter key
#[derive(Debug, Default)]
pub struct ProgressRecorder {
    emitted_for: Option<ChapterKey>,
}

impl ProgressRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a candidate; returns it only the first time its pair is seen
    pub fn observe(&mut self, candidate: Option<ProgressRecord>) -> Option<ProgressRecord> {
        let record = candidate?;
        let chapter = record.chapter();
        if self.emitted_for.as_ref() == Some(&chapter) {
            return None;
        }
        self.emitted_for = Some(chapter);
        Some(record)
    }

    pub fn has_emitted(&self) -> bool {
        self.emitted_for.is_some()
    }
}
