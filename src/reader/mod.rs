//! Reading session controller
//!
//! Tracks the page a reader is looking at in a vertically scrolled chapter,
//! mirrors it into the URL, restores deep links, auto-hides the chrome and
//! records progress once per chapter load.

mod chrome;
mod deep_link;
mod events;
mod progress;
mod registry;
mod session;
mod timers;
mod url_sync;
mod visibility;

pub use chrome::{ChromeController, ChromeVisibility};
pub use deep_link::{DeepLinkRestorer, ScrollAlign, ScrollBehavior, ScrollPort};
pub use events::{ActivityEvent, ReaderEvent};
pub use progress::{dispatch, ProgressRecord, ProgressRecorder, ProgressSink};
pub use registry::{ElementHandle, PageElementRegistry};
pub use session::{LoadState, LoadTicket, ReaderController, ReaderEffect, ReaderPorts};
pub use timers::{millis, FiredTimer, Millis, TimerId, TimerKind, TimerOwner, TimerQueue};
pub use url_sync::{
    page_segment, with_page_segment, DeepLinkPort, History, HistoryEntry, MemoryHistory,
    UrlPageSync,
};
pub use visibility::{
    most_visible, IntersectionSource, ObservationBand, Rect, SubscriptionId,
    VisibilityObservation, VisibilityTracker,
};
