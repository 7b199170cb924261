//! Tokio event loop driving the reading session controller
//!
//! The ReaderEngine owns the controller and multiplexes three inputs:
//! 1. Host events arriving over an mpsc channel
//! 2. Completed chapter fetches
//! 3. The controller's next timer deadline
//!
//! After every step it drains the controller's effects, starting fetches
//! and spawning progress posts.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};

use crate::content::{ChapterContent, ChapterSource};
use crate::reader::{
    dispatch, millis, LoadTicket, Millis, ProgressSink, ReaderController, ReaderEffect, ReaderEvent,
};
use crate::utils::Result;

/// Capacity of the host event channel
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

type Fetch = BoxFuture<'static, (LoadTicket, Result<ChapterContent>)>;

/// Event loop around a [`ReaderController`]
pub struct ReaderEngine {
    controller: ReaderController,
    source: Arc<dyn ChapterSource>,
    sink: Arc<dyn ProgressSink>,
    events: mpsc::Receiver<ReaderEvent>,
    epoch: Instant,
}

impl ReaderEngine {
    /// Create an engine and the sender hosts use to feed it
    pub fn new(
        controller: ReaderController,
        source: Arc<dyn ChapterSource>,
        sink: Arc<dyn ProgressSink>,
    ) -> (Self, mpsc::Sender<ReaderEvent>) {
        let (tx, events) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let engine = Self {
            controller,
            source,
            sink,
            events,
            epoch: Instant::now(),
        };
        (engine, tx)
    }

    pub fn controller(&self) -> &ReaderController {
        &self.controller
    }

    /// Run until `Unmount` arrives or every sender is dropped
    ///
    /// Returns the unmounted controller.
    pub async fn run(mut self) -> ReaderController {
        let mut fetches: FuturesUnordered<Fetch> = FuturesUnordered::new();
        self.controller.mount(self.now(), 0.0);
        self.flush(&mut fetches);

        loop {
            let deadline = self
                .controller
                .next_deadline()
                .map(|ms| self.epoch + Duration::from_millis(ms));

            tokio::select! {
                event = self.events.recv() => match event {
                    Some(ReaderEvent::Unmount) | None => break,
                    Some(event) => {
                        let now = self.now();
                        self.controller.handle_event(event, now);
                    }
                },
                Some((ticket, result)) = fetches.next(), if !fetches.is_empty() => {
                    self.controller.on_chapter_loaded(&ticket, result);
                }
                _ = wait_until(deadline) => {
                    let now = self.now();
                    self.controller.advance(now);
                }
            }
            self.flush(&mut fetches);
        }

        log::info!("Reader engine stopping");
        self.controller.unmount();
        self.controller
    }

    fn now(&self) -> Millis {
        millis(self.epoch.elapsed())
    }

    fn flush(&mut self, fetches: &mut FuturesUnordered<Fetch>) {
        for effect in self.controller.drain_effects() {
            match effect {
                ReaderEffect::FetchChapter(ticket) => {
                    log::debug!("Fetching chapter {}", ticket.chapter);
                    let source = Arc::clone(&self.source);
                    fetches.push(
                        async move {
                            let result = source.fetch_chapter(&ticket.chapter).await;
                            (ticket, result)
                        }
                        .boxed(),
                    );
                }
                ReaderEffect::RecordProgress(record) => {
                    tokio::spawn(dispatch(Arc::clone(&self.sink), record));
                }
            }
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => futures::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReaderConfig;
    use crate::content::{LocalChapter, LocalPage, MemorySessionStorage};
    use crate::model::{ChapterKey, PageId};
    use crate::reader::{
        ChromeVisibility, DeepLinkPort, ElementHandle, IntersectionSource, LoadState,
        ObservationBand, ProgressRecord, ReaderPorts, ScrollAlign, ScrollBehavior, ScrollPort,
        SubscriptionId, VisibilityObservation,
    };
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct StubSource;

    #[async_trait]
    impl ChapterSource for StubSource {
        async fn fetch_chapter(&self, key: &ChapterKey) -> Result<ChapterContent> {
            tokio::time::sleep(Duration::from_millis(30)).await;
            let ChapterKey::Local(chapter_id) = key else {
                return Err(crate::utils::ReaderError::InvalidChapter(key.to_string()));
            };
            Ok(ChapterContent::Local(LocalChapter {
                chapter_id: *chapter_id,
                manga_id: 1,
                pages: vec![
                    LocalPage {
                        id: 10,
                        page_number: 1,
                    },
                    LocalPage {
                        id: 11,
                        page_number: 2,
                    },
                ],
                prev_chapter: None,
                next_chapter: None,
            }))
        }
    }

    #[derive(Default)]
    struct RecordingSink(Mutex<Vec<ProgressRecord>>);

    #[async_trait]
    impl ProgressSink for RecordingSink {
        async fn record_progress(&self, record: &ProgressRecord) -> Result<()> {
            if let Ok(mut records) = self.0.lock() {
                records.push(record.clone());
            }
            Ok(())
        }
    }

    struct NoDeepLink;

    impl DeepLinkPort for NoDeepLink {
        fn read_initial_page_id(&self, _: &ChapterKey) -> Option<PageId> {
            None
        }

        fn write_current_page_id(&mut self, _: &ChapterKey, _: PageId) {}
    }

    struct NoScroll;

    impl ScrollPort for NoScroll {
        fn scroll_into_view(&mut self, _: ElementHandle, _: ScrollAlign, _: ScrollBehavior) {}
    }

    struct SingleSubscription;

    impl IntersectionSource for SingleSubscription {
        fn subscribe(&mut self, _: &[(PageId, ElementHandle)], _: ObservationBand) -> SubscriptionId {
            SubscriptionId(1)
        }

        fn unsubscribe(&mut self, _: SubscriptionId) {}
    }

    fn controller() -> ReaderController {
        ReaderController::new(
            ReaderConfig::new().unwrap(),
            ReaderPorts {
                deep_link: Box::new(NoDeepLink),
                scroll: Box::new(NoScroll),
                intersections: Box::new(SingleSubscription),
                storage: Box::new(MemorySessionStorage::new()),
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_engine_loads_tracks_and_hides_chrome() {
        let sink = Arc::new(RecordingSink::default());
        let (engine, tx) = ReaderEngine::new(controller(), Arc::new(StubSource), sink.clone());

        let host = async move {
            tx.send(ReaderEvent::Open("5".into())).await.unwrap();
            tokio::time::sleep(Duration::from_millis(100)).await;
            tx.send(ReaderEvent::PageElement(PageId::Local(10), Some(ElementHandle(1))))
                .await
                .unwrap();
            tx.send(ReaderEvent::PageElement(PageId::Local(11), Some(ElementHandle(2))))
                .await
                .unwrap();
            tx.send(ReaderEvent::Intersections(
                SubscriptionId(1),
                vec![VisibilityObservation::new(PageId::Local(11), 0.7, true)],
            ))
            .await
            .unwrap();
            tokio::time::sleep(Duration::from_millis(2500)).await;
        };

        let (controller, ()) = tokio::join!(engine.run(), host);

        // The sender dropped, so the engine unmounted on exit.
        assert_eq!(controller.load_state(), LoadState::Idle);
        assert_eq!(controller.chrome(), ChromeVisibility::Hidden);
        let records = sink.0.lock().unwrap();
        assert_eq!(
            *records,
            vec![ProgressRecord::Local {
                manga_id: 1,
                chapter_id: 5
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_fetch_is_dropped() {
        let sink = Arc::new(RecordingSink::default());
        let (engine, tx) = ReaderEngine::new(controller(), Arc::new(StubSource), sink.clone());

        let host = async move {
            tx.send(ReaderEvent::Open("5".into())).await.unwrap();
            tx.send(ReaderEvent::Open("6".into())).await.unwrap();
            tokio::time::sleep(Duration::from_millis(100)).await;
            tx.send(ReaderEvent::Unmount).await.unwrap();
        };

        let (_controller, ()) = tokio::join!(engine.run(), host);
        tokio::task::yield_now().await;

        let records = sink.0.lock().unwrap();
        assert_eq!(
            *records,
            vec![ProgressRecord::Local {
                manga_id: 1,
                chapter_id: 6
            }]
        );
    }
}
