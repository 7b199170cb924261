//! One-shot scroll restoration for deep links

use crate::model::{Page, PageId};

use super::registry::{ElementHandle, PageElementRegistry};
use super::timers::{Millis, TimerId, TimerKind, TimerOwner, TimerQueue};

/// Vertical alignment for `scroll_into_view`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollAlign {
    Start,
    Center,
    End,
}

/// Scroll animation behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Instant,
    Smooth,
}

/// Host scrolling mechanism
#[cfg_attr(test, mockall::automock)]
pub trait ScrollPort {
    fn scroll_into_view(&mut self, element: ElementHandle, align: ScrollAlign, behavior: ScrollBehavior);
}

/// Restores the page encoded in the URL once content has rendered
///
/// The target is read once at mount. Once page elements start registering a
/// settle timer gives layout time to stabilise; when it fires the target
/// element is scrolled to the top of the viewport, instantly. A target that
/// belongs to the chapter but has not rendered yet keeps the restorer waiting
/// for the next registration. Anything else finishes it for the session.
#[derive(Debug)]
pub struct DeepLinkRestorer {
    target: Option<PageId>,
    settle_timer: Option<TimerId>,
    done: bool,
}

impl DeepLinkRestorer {
    pub fn new(target: Option<PageId>) -> Self {
        Self {
            target,
            settle_timer: None,
            done: target.is_none(),
        }
    }

    pub fn target(&self) -> Option<PageId> {
        self.target
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn settle_timer(&self) -> Option<TimerId> {
        self.settle_timer
    }

    /// Arm the settle timer once page elements have rendered
    pub fn on_rendered(
        &mut self,
        registry: &PageElementRegistry,
        now: Millis,
        settle: Millis,
        owner: TimerOwner,
        timers: &mut TimerQueue,
    ) {
        if self.done || registry.is_empty() || self.settle_timer.is_some() {
            return;
        }
        self.settle_timer = Some(timers.schedule(
            owner,
            TimerKind::DeepLinkSettle,
            now.saturating_add(settle),
        ));
    }

    /// Settle timer fired: scroll to the target if it is mounted
    ///
    /// Returns the restored page. A target outside `pages` is a stale link
    /// and finishes the restorer silently.
    pub fn on_settled(
        &mut self,
        timer: TimerId,
        pages: &[Page],
        registry: &PageElementRegistry,
        scroller: &mut dyn ScrollPort,
    ) -> Option<PageId> {
        if self.settle_timer != Some(timer) || self.done {
            return None;
        }
        self.settle_timer = None;

        let Some(target) = self.target else {
            self.done = true;
            return None;
        };
        if let Some(element) = registry.get(&target) {
            log::debug!("Restoring deep link to page {}", target);
            scroller.scroll_into_view(element, ScrollAlign::Start, ScrollBehavior::Instant);
            self.done = true;
            return Some(target);
        }
        if pages.iter().any(|p| p.id == target) {
            log::debug!("Deep link page {} has not rendered yet; waiting", target);
        } else {
            log::debug!("Deep link page {} is not in this chapter; ignoring", target);
            self.done = true;
        }
        None
    }

    /// Release the settle timer
    pub fn cancel(&mut self, timers: &mut TimerQueue) {
        if let Some(timer) = self.settle_timer.take() {
            timers.cancel(timer);
        }
    }
}
