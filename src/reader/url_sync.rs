//! Address-bar synchronisation
//!
//! The reader's URL has the shape `.../<chapter>/<page>`. The page segment is
//! rewritten in place as the user scrolls so the address is always a valid
//! deep link, without adding history entries or triggering navigation.

use std::cell::RefCell;
use std::rc::Rc;

use url::Url;

use crate::model::{ChapterKey, PageId};

/// Browser history as seen by the reader
pub trait History {
    /// Current location
    fn location(&self) -> Url;

    /// Replace the current entry's URL, keeping its state object and
    /// without creating a new entry or notifying the router
    fn replace_url(&mut self, url: Url);
}

/// Shared handle, for hosts that keep inspecting history after handing it over
impl<T: History> History for Rc<RefCell<T>> {
    fn location(&self) -> Url {
        self.borrow().location()
    }

    fn replace_url(&mut self, url: Url) {
        self.borrow_mut().replace_url(url);
    }
}

/// A history entry
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub url: Url,
    pub state: Option<serde_json::Value>,
}

/// In-memory history stack for native shells and tests
#[derive(Debug, Clone)]
pub struct MemoryHistory {
    back: Vec<HistoryEntry>,
    current: HistoryEntry,
    replacements: usize,
}

impl MemoryHistory {
    pub fn new(url: Url) -> Self {
        Self {
            back: Vec::new(),
            current: HistoryEntry { url, state: None },
            replacements: 0,
        }
    }

    /// Navigate: push a new entry
    pub fn push(&mut self, url: Url, state: Option<serde_json::Value>) {
        let previous = std::mem::replace(&mut self.current, HistoryEntry { url, state });
        self.back.push(previous);
    }

    /// Number of entries, including the current one
    pub fn len(&self) -> usize {
        self.back.len() + 1
    }

    pub fn current(&self) -> &HistoryEntry {
        &self.current
    }

    /// Number of in-place URL replacements performed
    pub fn replacements(&self) -> usize {
        self.replacements
    }
}

impl History for MemoryHistory {
    fn location(&self) -> Url {
        self.current.url.clone()
    }

    fn replace_url(&mut self, url: Url) {
        self.current.url = url;
        self.replacements += 1;
    }
}

/// Narrow port over ambient URL state
pub trait DeepLinkPort {
    /// Page identifier encoded in the URL at mount time
    fn read_initial_page_id(&self, chapter: &ChapterKey) -> Option<PageId>;

    /// Encode the current page in the URL
    fn write_current_page_id(&mut self, chapter: &ChapterKey, id: PageId);
}

/// Path segments of `url`, undecoded; empty for cannot-be-a-base URLs
fn segments(url: &Url) -> Vec<&str> {
    url.path_segments().map(|s| s.collect()).unwrap_or_default()
}

/// The chapter's route parameter as it appears in a serialized path
fn chapter_segment(chapter: &ChapterKey) -> Option<String> {
    let mut scratch = Url::parse("http://localhost/").ok()?;
    scratch
        .path_segments_mut()
        .ok()?
        .pop_if_empty()
        .push(&chapter.to_string());
    scratch.path_segments()?.next_back().map(str::to_owned)
}

/// Read the segment following the chapter segment
pub fn page_segment(url: &Url, chapter: &ChapterKey) -> Option<PageId> {
    let chapter = chapter_segment(chapter)?;
    let segments = segments(url);
    let position = segments.iter().rposition(|s| *s == chapter)?;
    segments.get(position + 1).and_then(|s| PageId::parse(s))
}

/// `url` with the page segment set to `id`; query and fragment are kept
///
/// Returns `None` when the path does not contain the chapter segment.
pub fn with_page_segment(url: &Url, chapter: &ChapterKey, id: PageId) -> Option<Url> {
    let chapter = chapter_segment(chapter)?;
    let segments = segments(url);
    let position = segments.iter().rposition(|s| *s == chapter)?;
    let path = format!("/{}/{}", segments[..=position].join("/"), id);

    let mut next = url.clone();
    next.set_path(&path);
    Some(next)
}

/// Keeps the address bar in step with the current page
pub struct UrlPageSync<H: History> {
    history: H,
}

impl<H: History> UrlPageSync<H> {
    pub fn new(history: H) -> Self {
        Self { history }
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    /// Rewrite the page segment of the current entry
    pub fn sync(&mut self, chapter: &ChapterKey, id: PageId) {
        let location = self.history.location();
        match with_page_segment(&location, chapter, id) {
            Some(next) if next != location => {
                log::debug!("URL page sync: {} -> {}", location.path(), next.path());
                self.history.replace_url(next);
            }
            Some(_) => {}
            None => log::debug!(
                "URL {} has no segment for chapter {}; not syncing",
                location.path(),
                chapter
            ),
        }
    }
}

impl<H: History> DeepLinkPort for UrlPageSync<H> {
    fn read_initial_page_id(&self, chapter: &ChapterKey) -> Option<PageId> {
        page_segment(&self.history.location(), chapter)
    }

    fn write_current_page_id(&mut self, chapter: &ChapterKey, id: PageId) {
        self.sync(chapter, id);
    }
}
