//! Reading session composition root
//!
//! [`ReaderController`] is the mounted reader shell. Each chapter route
//! creates a fresh [`ReadingSession`]; the previous one is torn down first
//! (subscription released, timers cancelled, registry cleared) so nothing
//! from chapter A can act on chapter B.

use crate::config::ReaderConfig;
use crate::content::{AdjacentChapters, ChapterContent, ExternalChapterContext, SessionStorage};
use crate::model::{ChapterKey, Page, PageId};
use crate::utils::{ReaderError, Result};

use super::chrome::{ChromeController, ChromeVisibility};
use super::deep_link::{DeepLinkRestorer, ScrollPort};
use super::events::{ActivityEvent, ReaderEvent};
use super::progress::{ProgressRecord, ProgressRecorder};
use super::registry::{ElementHandle, PageElementRegistry};
use super::timers::{millis, Millis, TimerKind, TimerOwner, TimerQueue};
use super::url_sync::DeepLinkPort;
use super::visibility::{IntersectionSource, SubscriptionId, VisibilityObservation, VisibilityTracker};

/// Host mechanisms the controller drives
pub struct ReaderPorts {
    pub deep_link: Box<dyn DeepLinkPort>,
    pub scroll: Box<dyn ScrollPort>,
    pub intersections: Box<dyn IntersectionSource>,
    pub storage: Box<dyn SessionStorage>,
}

/// Load state presented to the surrounding UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    /// No chapter opened
    Idle,
    Loading,
    Ready,
    /// Route or fetch failure; the UI shows an error with a way back
    Failed(String),
}

/// Identifies the fetch a response belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub generation: u64,
    pub chapter: ChapterKey,
}

/// Async work requested by the controller
#[derive(Debug, Clone, PartialEq)]
pub enum ReaderEffect {
    FetchChapter(LoadTicket),
    RecordProgress(ProgressRecord),
}

/// State owned by one chapter load
struct ReadingSession {
    generation: u64,
    chapter: ChapterKey,
    state: LoadState,
    pages: Vec<Page>,
    manga_id: Option<u64>,
    adjacent: AdjacentChapters,
    external_context: Option<ExternalChapterContext>,
    registry: PageElementRegistry,
    tracker: VisibilityTracker,
    deep_link: DeepLinkRestorer,
    progress: ProgressRecorder,
}

impl ReadingSession {
    fn owner(&self) -> TimerOwner {
        TimerOwner::Session(self.generation)
    }

    fn contains(&self, id: &PageId) -> bool {
        self.pages.iter().any(|p| p.id == *id)
    }
}

/// The reading session controller
pub struct ReaderController {
    config: ReaderConfig,
    ports: ReaderPorts,
    timers: TimerQueue,
    chrome: ChromeController,
    session: Option<ReadingSession>,
    route_error: Option<String>,
    next_generation: u64,
    effects: Vec<ReaderEffect>,
}

impl ReaderController {
    pub fn new(config: ReaderConfig, ports: ReaderPorts) -> Self {
        let chrome = ChromeController::new(
            millis(config.hide_delay),
            config.scroll_hide_threshold_px,
        );
        Self {
            config,
            ports,
            timers: TimerQueue::new(),
            chrome,
            session: None,
            route_error: None,
            next_generation: 0,
            effects: Vec::new(),
        }
    }

    /// Attach activity listeners; chrome shows, then auto-hides
    pub fn mount(&mut self, now: Millis, scroll_y: f64) {
        self.chrome.mount(now, scroll_y, &mut self.timers);
    }

    /// Release every listener, subscription and timer
    pub fn unmount(&mut self) {
        self.teardown_session();
        self.chrome.unmount(&mut self.timers);
        self.route_error = None;
    }

    /// Start a session for a chapter route parameter
    ///
    /// The previous session is torn down before anything else happens. An
    /// unresolvable route leaves the reader in [`LoadState::Failed`].
    pub fn open(&mut self, route: &str) -> Option<LoadTicket> {
        self.teardown_session();
        self.route_error = None;

        let chapter = match ChapterKey::from_route(route) {
            Ok(chapter) => chapter,
            Err(e) => {
                log::warn!("Cannot open reader: {}", e);
                self.route_error = Some(e.to_string());
                return None;
            }
        };

        self.next_generation += 1;
        let generation = self.next_generation;
        let initial_page = self.ports.deep_link.read_initial_page_id(&chapter);
        let external_context = match &chapter {
            ChapterKey::Local(_) => None,
            ChapterKey::External(id) => {
                let context = ExternalChapterContext::load(
                    self.ports.storage.as_ref(),
                    &self.config.context_storage_prefix,
                    id,
                );
                if context.is_none() {
                    log::debug!("No stored context for chapter {}; progress will not be recorded", chapter);
                }
                context
            }
        };

        log::info!(
            "Opening chapter {} (session {}, deep link {:?})",
            chapter,
            generation,
            initial_page.map(|p| p.to_string())
        );
        self.session = Some(ReadingSession {
            generation,
            chapter: chapter.clone(),
            state: LoadState::Loading,
            pages: Vec::new(),
            manga_id: None,
            adjacent: AdjacentChapters::default(),
            external_context,
            registry: PageElementRegistry::new(),
            tracker: VisibilityTracker::new(&[]),
            deep_link: DeepLinkRestorer::new(initial_page),
            progress: ProgressRecorder::new(),
        });

        let ticket = LoadTicket {
            generation,
            chapter,
        };
        self.effects.push(ReaderEffect::FetchChapter(ticket.clone()));
        Some(ticket)
    }

    /// Deliver the page-list response for a ticket
    ///
    /// Responses for a superseded session are dropped. A repeated delivery
    /// for the live session is ignored once it is no longer loading.
    pub fn on_chapter_loaded(&mut self, ticket: &LoadTicket, result: Result<ChapterContent>) {
        let Some(session) = self.session.as_mut() else {
            log::warn!("Ignoring response for chapter {}: reader closed", ticket.chapter);
            return;
        };
        if session.generation != ticket.generation || session.chapter != ticket.chapter {
            log::warn!(
                "Ignoring stale response for chapter {} (active: {})",
                ticket.chapter,
                session.chapter
            );
            return;
        }
        if session.state != LoadState::Loading {
            log::debug!("Chapter {} already loaded; ignoring repeat", ticket.chapter);
            return;
        }

        let assembled = result.and_then(|content| {
            if content.key() != ticket.chapter {
                return Err(ReaderError::InvalidChapter(format!(
                    "requested {}, received {}",
                    ticket.chapter,
                    content.key()
                )));
            }
            let pages = content.pages()?;
            Ok((content, pages))
        });

        match assembled {
            Err(e) => {
                log::warn!("Failed to load chapter {}: {}", ticket.chapter, e);
                session.state = LoadState::Failed(e.to_string());
            }
            Ok((content, pages)) => {
                log::info!("Chapter {} ready with {} pages", session.chapter, pages.len());
                session.manga_id = content.manga_id();
                session.adjacent = content.adjacent();
                session.tracker = VisibilityTracker::new(&pages);
                session.pages = pages;
                session.state = LoadState::Ready;
                session.tracker.resubscribe(
                    self.ports.intersections.as_mut(),
                    &session.registry,
                    self.config.band,
                );
            }
        }
        self.refresh_progress();
    }

    /// A page element mounted or unmounted
    pub fn register_page(&mut self, id: PageId, element: Option<ElementHandle>, now: Millis) {
        self.register_pages([(id, element)], now);
    }

    /// Register a batch of elements, resubscribing once
    ///
    /// The first render after load also starts the deep-link settle delay.
    pub fn register_pages(
        &mut self,
        elements: impl IntoIterator<Item = (PageId, Option<ElementHandle>)>,
        now: Millis,
    ) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.state != LoadState::Ready {
            return;
        }

        let mut changed = false;
        for (id, element) in elements {
            if !session.contains(&id) {
                log::debug!("Ignoring element for page {} outside chapter {}", id, session.chapter);
                continue;
            }
            changed |= session.registry.register(id, element);
        }
        if changed {
            session.tracker.resubscribe(
                self.ports.intersections.as_mut(),
                &session.registry,
                self.config.band,
            );
            let owner = session.owner();
            session.deep_link.on_rendered(
                &session.registry,
                now,
                millis(self.config.deep_link_settle),
                owner,
                &mut self.timers,
            );
        }
    }

    /// An intersection batch arrived
    pub fn on_intersections(&mut self, subscription: SubscriptionId, batch: &[VisibilityObservation]) {
        if let Some(session) = self.session.as_mut() {
            if let Some(current) = session.tracker.on_batch(subscription, batch) {
                self.ports.deep_link.write_current_page_id(&session.chapter, current);
            }
        }
        self.refresh_progress();
    }

    /// Pointer, touch or scroll activity
    pub fn on_activity(&mut self, event: ActivityEvent, now: Millis) {
        self.chrome.on_activity(event, now, &mut self.timers);
        self.refresh_progress();
    }

    /// Fire every timer due at `now`
    pub fn advance(&mut self, now: Millis) {
        while let Some(fired) = self.timers.pop_next_due(now) {
            match fired.kind {
                TimerKind::HideChrome => self.chrome.on_hide_timer(fired.id),
                TimerKind::DeepLinkSettle => {
                    let Some(session) = self.session.as_mut() else {
                        continue;
                    };
                    if fired.owner != session.owner() {
                        continue;
                    }
                    if let Some(restored) = session.deep_link.on_settled(
                        fired.id,
                        &session.pages,
                        &session.registry,
                        self.ports.scroll.as_mut(),
                    ) {
                        session.tracker.set_current(restored);
                    }
                }
            }
        }
        self.refresh_progress();
    }

    /// Dispatch a host event; `Open` returns nothing here, the fetch is
    /// queued as an effect
    pub fn handle_event(&mut self, event: ReaderEvent, now: Millis) {
        match event {
            ReaderEvent::Open(route) => {
                self.open(&route);
            }
            ReaderEvent::PageElement(id, element) => self.register_page(id, element, now),
            ReaderEvent::Intersections(subscription, batch) => {
                self.on_intersections(subscription, &batch)
            }
            ReaderEvent::Activity(activity) => self.on_activity(activity, now),
            ReaderEvent::Unmount => self.unmount(),
        }
    }

    /// Take the effects queued since the last call
    pub fn drain_effects(&mut self) -> Vec<ReaderEffect> {
        std::mem::take(&mut self.effects)
    }

    pub fn next_deadline(&self) -> Option<Millis> {
        self.timers.next_deadline()
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn chapter(&self) -> Option<&ChapterKey> {
        self.session.as_ref().map(|s| &s.chapter)
    }

    /// Generation of the live session
    pub fn generation(&self) -> Option<u64> {
        self.session.as_ref().map(|s| s.generation)
    }

    pub fn load_state(&self) -> LoadState {
        match (&self.session, &self.route_error) {
            (Some(session), _) => session.state.clone(),
            (None, Some(message)) => LoadState::Failed(message.clone()),
            (None, None) => LoadState::Idle,
        }
    }

    pub fn pages(&self) -> &[Page] {
        self.session.as_ref().map(|s| s.pages.as_slice()).unwrap_or(&[])
    }

    pub fn page_count(&self) -> usize {
        self.pages().len()
    }

    pub fn current_page(&self) -> Option<PageId> {
        self.session.as_ref().and_then(|s| s.tracker.current())
    }

    /// Display ordinal of the current page, looked up rather than inferred
    /// from list position
    pub fn current_ordinal(&self) -> Option<u32> {
        let current = self.current_page()?;
        self.pages()
            .iter()
            .find(|p| p.id == current)
            .map(|p| p.ordinal)
    }

    pub fn adjacent_chapters(&self) -> AdjacentChapters {
        self.session
            .as_ref()
            .map(|s| s.adjacent.clone())
            .unwrap_or_default()
    }

    pub fn chrome(&self) -> ChromeVisibility {
        self.chrome.state()
    }

    pub fn subscribe_chrome(&self) -> tokio::sync::watch::Receiver<ChromeVisibility> {
        self.chrome.subscribe()
    }

    pub fn active_subscription(&self) -> Option<SubscriptionId> {
        self.session.as_ref().and_then(|s| s.tracker.subscription())
    }

    pub fn pending_timers(&self, owner: TimerOwner) -> usize {
        self.timers.pending_for(owner)
    }

    fn teardown_session(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        session.tracker.unsubscribe(self.ports.intersections.as_mut());
        session.deep_link.cancel(&mut self.timers);
        self.timers.cancel_owner(session.owner());
        session.registry.clear();
        log::info!("Closed session {} for chapter {}", session.generation, session.chapter);
    }

    fn refresh_progress(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.state != LoadState::Ready {
            return;
        }
        let candidate = ProgressRecord::for_chapter(
            &session.chapter,
            session.manga_id,
            session.external_context.as_ref(),
        );
        if let Some(record) = session.progress.observe(candidate) {
            log::info!("Recording progress for chapter {}", session.chapter);
            self.effects.push(ReaderEffect::RecordProgress(record));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ExternalChapter, LocalChapter, LocalPage, MemorySessionStorage};
    use crate::reader::deep_link::{MockScrollPort, ScrollAlign, ScrollBehavior};
    use crate::reader::url_sync::{History, MemoryHistory, UrlPageSync};
    use crate::reader::visibility::ObservationBand;
    use crate::utils::NetworkError;
    use mockall::predicate::eq;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;
    use url::Url;

    #[derive(Default)]
    struct Subscriptions {
        next: u64,
        active: Vec<SubscriptionId>,
    }

    #[derive(Clone, Default)]
    struct FakeIntersections(Rc<RefCell<Subscriptions>>);

    impl IntersectionSource for FakeIntersections {
        fn subscribe(&mut self, _: &[(PageId, ElementHandle)], _: ObservationBand) -> SubscriptionId {
            let mut inner = self.0.borrow_mut();
            inner.next += 1;
            let id = SubscriptionId(inner.next);
            inner.active.push(id);
            id
        }

        fn unsubscribe(&mut self, subscription: SubscriptionId) {
            self.0.borrow_mut().active.retain(|s| *s != subscription);
        }
    }

    struct Harness {
        reader: ReaderController,
        history: Rc<RefCell<MemoryHistory>>,
        intersections: FakeIntersections,
    }

    fn harness_with(url: &str, scroll: MockScrollPort, storage: MemorySessionStorage) -> Harness {
        let history = Rc::new(RefCell::new(MemoryHistory::new(Url::parse(url).unwrap())));
        let intersections = FakeIntersections::default();
        let ports = ReaderPorts {
            deep_link: Box::new(UrlPageSync::new(Rc::clone(&history))),
            scroll: Box::new(scroll),
            intersections: Box::new(intersections.clone()),
            storage: Box::new(storage),
        };
        let mut reader = ReaderController::new(ReaderConfig::new().unwrap(), ports);
        reader.mount(0, 0.0);
        Harness {
            reader,
            history,
            intersections,
        }
    }

    fn harness(url: &str) -> Harness {
        harness_with(url, MockScrollPort::new(), MemorySessionStorage::new())
    }

    fn local_content(chapter_id: u64, rows: &[(u64, u32)]) -> ChapterContent {
        ChapterContent::Local(LocalChapter {
            chapter_id,
            manga_id: 3,
            pages: rows
                .iter()
                .map(|&(id, page_number)| LocalPage { id, page_number })
                .collect(),
            prev_chapter: None,
            next_chapter: Some(chapter_id + 1),
        })
    }

    fn mount_all(reader: &mut ReaderController, now: Millis) {
        let ids: Vec<PageId> = reader.pages().iter().map(|p| p.id).collect();
        let elements = ids.into_iter().map(|id| {
            let handle = match id {
                PageId::Local(n) => n,
                PageId::External(n) => n as u64,
            };
            (id, Some(ElementHandle(handle)))
        });
        reader.register_pages(elements, now);
    }

    fn fetch_ticket(reader: &mut ReaderController) -> LoadTicket {
        reader
            .drain_effects()
            .into_iter()
            .find_map(|effect| match effect {
                ReaderEffect::FetchChapter(ticket) => Some(ticket),
                _ => None,
            })
            .expect("fetch effect")
    }

    fn progress_records(effects: &[ReaderEffect]) -> usize {
        effects
            .iter()
            .filter(|e| matches!(e, ReaderEffect::RecordProgress(_)))
            .count()
    }

    #[test]
    fn test_local_ordinal_follows_stored_page_number() {
        let mut h = harness("https://r.example.com/reader/10");
        h.reader.open("10");
        let ticket = fetch_ticket(&mut h.reader);
        h.reader
            .on_chapter_loaded(&ticket, Ok(local_content(10, &[(501, 2), (502, 3), (503, 1)])));
        mount_all(&mut h.reader, 0);

        let sub = h.reader.active_subscription().unwrap();
        h.reader.on_intersections(
            sub,
            &[VisibilityObservation::new(PageId::Local(501), 0.9, true)],
        );
        assert_eq!(h.reader.current_page(), Some(PageId::Local(501)));
        assert_eq!(h.reader.current_ordinal(), Some(2));
        assert_eq!(h.history.borrow().location().path(), "/reader/10/501");
        assert_eq!(h.reader.adjacent_chapters().next, Some(ChapterKey::Local(11)));
    }

    #[test]
    fn test_single_progress_record_across_rerenders() {
        let mut h = harness("https://r.example.com/reader/10");
        h.reader.open("10");
        let ticket = fetch_ticket(&mut h.reader);
        h.reader.on_chapter_loaded(&ticket, Ok(local_content(10, &[(1, 1)])));

        let mut effects = h.reader.drain_effects();
        for t in 0..20u64 {
            let now = t * 3000;
            h.reader.on_activity(ActivityEvent::TouchStart, now);
            h.reader.on_activity(ActivityEvent::Scroll { y: (t * 50) as f64 }, now + 5);
            h.reader.advance(now + 2500);
        }
        effects.extend(h.reader.drain_effects());
        assert_eq!(progress_records(&effects), 1);
        assert!(effects.contains(&ReaderEffect::RecordProgress(ProgressRecord::Local {
            manga_id: 3,
            chapter_id: 10
        })));
    }

    #[test]
    fn test_deep_link_scrolls_once() {
        let mut scroll = MockScrollPort::new();
        scroll
            .expect_scroll_into_view()
            .with(eq(ElementHandle(7)), eq(ScrollAlign::Start), eq(ScrollBehavior::Instant))
            .times(1)
            .return_const(());
        let mut h = harness_with(
            "https://r.example.com/reader/10/7",
            scroll,
            MemorySessionStorage::new(),
        );
        h.reader.open("10");
        let ticket = fetch_ticket(&mut h.reader);
        let content = local_content(10, &[(6, 1), (7, 2), (8, 3)]);
        h.reader.on_chapter_loaded(&ticket, Ok(content.clone()));
        mount_all(&mut h.reader, 0);

        h.reader.advance(50);
        assert_eq!(h.reader.current_page(), None);
        h.reader.advance(100);
        assert_eq!(h.reader.current_page(), Some(PageId::Local(7)));

        // A refreshed delivery and remounted elements must not scroll again.
        h.reader.on_chapter_loaded(&ticket, Ok(content));
        h.reader.register_page(PageId::Local(7), Some(ElementHandle(70)), 200);
        h.reader.advance(10_000);
    }

    #[test]
    fn test_deep_link_waits_for_late_elements() {
        let mut scroll = MockScrollPort::new();
        scroll
            .expect_scroll_into_view()
            .with(eq(ElementHandle(2)), eq(ScrollAlign::Start), eq(ScrollBehavior::Instant))
            .times(1)
            .return_const(());
        let mut h = harness_with(
            "https://r.example.com/reader/10/2",
            scroll,
            MemorySessionStorage::new(),
        );
        h.reader.open("10");
        let ticket = fetch_ticket(&mut h.reader);
        h.reader
            .on_chapter_loaded(&ticket, Ok(local_content(10, &[(1, 1), (2, 2), (3, 3)])));
        h.reader.advance(120);
        assert_eq!(h.reader.current_page(), None);

        mount_all(&mut h.reader, 120);
        h.reader.advance(10_000);
        assert_eq!(h.reader.current_page(), Some(PageId::Local(2)));
    }

    #[test]
    fn test_deep_link_target_rendered_after_first_settle() {
        let mut scroll = MockScrollPort::new();
        scroll
            .expect_scroll_into_view()
            .with(eq(ElementHandle(3)), eq(ScrollAlign::Start), eq(ScrollBehavior::Instant))
            .times(1)
            .return_const(());
        let mut h = harness_with(
            "https://r.example.com/reader/10/3",
            scroll,
            MemorySessionStorage::new(),
        );
        h.reader.open("10");
        let ticket = fetch_ticket(&mut h.reader);
        h.reader
            .on_chapter_loaded(&ticket, Ok(local_content(10, &[(1, 1), (2, 2), (3, 3)])));
        h.reader.register_page(PageId::Local(1), Some(ElementHandle(1)), 10);
        h.reader.advance(500);
        assert_eq!(h.reader.current_page(), None);

        h.reader.register_page(PageId::Local(3), Some(ElementHandle(3)), 600);
        h.reader.advance(700);
        assert_eq!(h.reader.current_page(), Some(PageId::Local(3)));
    }

    #[test]
    fn test_missing_or_unknown_deep_link_is_silent() {
        for url in [
            "https://r.example.com/reader/10",
            "https://r.example.com/reader/10/999",
            "https://r.example.com/reader/10/garbage",
        ] {
            let mut scroll = MockScrollPort::new();
            scroll.expect_scroll_into_view().times(0);
            let mut h = harness_with(url, scroll, MemorySessionStorage::new());
            h.reader.open("10");
            let ticket = fetch_ticket(&mut h.reader);
            h.reader.on_chapter_loaded(&ticket, Ok(local_content(10, &[(1, 1)])));
            mount_all(&mut h.reader, 0);
            h.reader.advance(5_000);
            assert_eq!(h.reader.load_state(), LoadState::Ready);
        }
    }

    #[test]
    fn test_unmounted_page_stops_being_current() {
        let mut h = harness("https://r.example.com/reader/10");
        h.reader.open("10");
        let ticket = fetch_ticket(&mut h.reader);
        h.reader.on_chapter_loaded(&ticket, Ok(local_content(10, &[(1, 1), (2, 2)])));
        mount_all(&mut h.reader, 0);

        let first = h.reader.active_subscription().unwrap();
        h.reader.on_intersections(first, &[VisibilityObservation::new(PageId::Local(2), 0.9, true)]);
        assert_eq!(h.history.borrow().location().path(), "/reader/10/2");

        h.reader.register_page(PageId::Local(2), None, 50);
        let second = h.reader.active_subscription().unwrap();
        assert_ne!(second, first);
        h.reader.on_intersections(second, &[VisibilityObservation::new(PageId::Local(1), 0.3, true)]);
        assert_eq!(h.reader.current_page(), Some(PageId::Local(1)));
        assert_eq!(h.history.borrow().location().path(), "/reader/10/1");
    }

    #[test]
    fn test_chapter_switch_tears_down_previous_session() {
        let mut h = harness("https://r.example.com/reader/10/2");
        h.reader.open("10");
        let first = fetch_ticket(&mut h.reader);
        h.reader.on_chapter_loaded(&first, Ok(local_content(10, &[(1, 1), (2, 2)])));
        mount_all(&mut h.reader, 0);
        let old_subscription = h.reader.active_subscription().unwrap();
        assert_eq!(h.reader.pending_timers(TimerOwner::Session(1)), 1);

        h.history
            .borrow_mut()
            .push(Url::parse("https://r.example.com/reader/11").unwrap(), None);
        h.reader.open("11");
        let second = fetch_ticket(&mut h.reader);

        assert!(h.intersections.0.borrow().active.is_empty());
        assert_eq!(h.reader.pending_timers(TimerOwner::Session(1)), 0);

        // Late batch and late response for chapter 10 change nothing.
        h.reader.on_intersections(
            old_subscription,
            &[VisibilityObservation::new(PageId::Local(2), 1.0, true)],
        );
        h.reader.on_chapter_loaded(&first, Ok(local_content(10, &[(1, 1)])));
        assert_eq!(h.reader.current_page(), None);
        assert_eq!(h.reader.load_state(), LoadState::Loading);
        assert_eq!(h.history.borrow().location().path(), "/reader/11");

        h.reader.on_chapter_loaded(&second, Ok(local_content(11, &[(9, 1)])));
        assert_eq!(h.reader.page_count(), 1);
    }

    #[test]
    fn test_fetch_failure_is_surfaced_without_progress() {
        let mut h = harness("https://r.example.com/reader/10");
        h.reader.open("10");
        let ticket = fetch_ticket(&mut h.reader);
        h.reader.on_chapter_loaded(
            &ticket,
            Err(NetworkError::Http {
                status: 500,
                message: "boom".into(),
            }
            .into()),
        );
        assert!(matches!(h.reader.load_state(), LoadState::Failed(_)));
        assert_eq!(progress_records(&h.reader.drain_effects()), 0);
    }

    #[test]
    fn test_mismatched_payload_fails() {
        let mut h = harness("https://r.example.com/reader/10");
        h.reader.open("10");
        let ticket = fetch_ticket(&mut h.reader);
        h.reader.on_chapter_loaded(&ticket, Ok(local_content(12, &[(1, 1)])));
        assert!(matches!(h.reader.load_state(), LoadState::Failed(_)));
    }

    #[test]
    fn test_invalid_route() {
        let mut h = harness("https://r.example.com/reader/oops");
        assert_eq!(h.reader.open("oops"), None);
        assert!(matches!(h.reader.load_state(), LoadState::Failed(_)));
        assert!(h.reader.drain_effects().is_empty());
    }

    #[test]
    fn test_external_progress_needs_stored_context() {
        let content = ChapterContent::External(ExternalChapter {
            chapter_id: "c-1".into(),
            images: vec![Url::parse("https://cdn.example.org/1.png").unwrap()],
        });

        let mut bare = harness("https://r.example.com/reader/ext-c-1");
        bare.reader.open("ext-c-1");
        let ticket = fetch_ticket(&mut bare.reader);
        bare.reader.on_chapter_loaded(&ticket, Ok(content.clone()));
        assert_eq!(progress_records(&bare.reader.drain_effects()), 0);

        let mut storage = MemorySessionStorage::new();
        ExternalChapterContext {
            manga_id: "m-1".into(),
            manga_title: "Night Ferry".into(),
            chapter_number: "1".into(),
            cover_url: None,
        }
        .store(&mut storage, "external-chapter", "c-1")
        .unwrap();
        let mut linked = harness_with(
            "https://r.example.com/reader/ext-c-1",
            MockScrollPort::new(),
            storage,
        );
        linked.reader.open("ext-c-1");
        let ticket = fetch_ticket(&mut linked.reader);
        linked.reader.on_chapter_loaded(&ticket, Ok(content));
        assert_eq!(progress_records(&linked.reader.drain_effects()), 1);
    }

    #[test]
    fn test_elements_before_load_are_ignored() {
        let mut h = harness("https://r.example.com/reader/10");
        h.reader.open("10");
        h.reader.register_page(PageId::Local(1), Some(ElementHandle(1)), 0);
        assert_eq!(h.reader.active_subscription(), None);
    }

    #[test]
    fn test_unmount_releases_everything() {
        let mut h = harness("https://r.example.com/reader/10/1");
        h.reader.open("10");
        let ticket = fetch_ticket(&mut h.reader);
        h.reader.on_chapter_loaded(&ticket, Ok(local_content(10, &[(1, 1)])));
        mount_all(&mut h.reader, 0);
        h.reader.unmount();

        assert_eq!(h.reader.next_deadline(), None);
        assert!(h.intersections.0.borrow().active.is_empty());
        assert_eq!(h.reader.load_state(), LoadState::Idle);
    }
}
