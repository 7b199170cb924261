//! Wire payloads of the chapter endpoints

use serde::Deserialize;
use url::Url;

use crate::content::{ExternalChapter, LocalChapter, LocalPage};
use crate::utils::Result;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PageDto {
    pub id: u64,
    pub page_number: u32,
}

/// `GET chapters/{id}/pages`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LocalPagesDto {
    pub manga_id: u64,
    #[serde(default)]
    pub prev_chapter_id: Option<u64>,
    #[serde(default)]
    pub next_chapter_id: Option<u64>,
    pub pages: Vec<PageDto>,
}

impl LocalPagesDto {
    pub fn into_chapter(self, chapter_id: u64) -> LocalChapter {
        LocalChapter {
            chapter_id,
            manga_id: self.manga_id,
            pages: self
                .pages
                .into_iter()
                .map(|p| LocalPage {
                    id: p.id,
                    page_number: p.page_number,
                })
                .collect(),
            prev_chapter: self.prev_chapter_id,
            next_chapter: self.next_chapter_id,
        }
    }
}

/// `GET external/chapters/{id}/pages`
#[derive(Debug, Deserialize)]
pub(crate) struct ExternalPagesDto {
    pub images: Vec<String>,
}

impl ExternalPagesDto {
    pub fn into_chapter(self, chapter_id: &str) -> Result<ExternalChapter> {
        let images = self
            .images
            .iter()
            .map(|raw| Url::parse(raw))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ExternalChapter {
            chapter_id: chapter_id.to_string(),
            images,
        })
    }
}
