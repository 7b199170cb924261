//! Auto-hiding reader chrome
//!
//! Two states, `Visible` and `Hidden`:
//! - pointer/touch activity shows chrome and re-arms the hide timer
//! - the hide timer elapsing hides it
//! - scrolling more than the threshold hides it at once and disarms the timer

use tokio::sync::watch;

use super::events::ActivityEvent;
use super::timers::{Millis, TimerId, TimerKind, TimerOwner, TimerQueue};

/// Chrome visibility as seen by consumers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChromeVisibility {
    #[default]
    Visible,
    Hidden,
}

impl ChromeVisibility {
    pub fn is_visible(&self) -> bool {
        *self == Self::Visible
    }

    /// Hidden chrome must not intercept clicks
    pub fn accepts_pointer(&self) -> bool {
        self.is_visible()
    }

    /// Opacity for the overlay
    pub fn opacity(&self) -> f32 {
        match self {
            Self::Visible => 1.0,
            Self::Hidden => 0.0,
        }
    }
}

/// Timed state machine driving chrome visibility
pub struct ChromeController {
    state: watch::Sender<ChromeVisibility>,
    hide_timer: Option<TimerId>,
    last_scroll_y: f64,
    hide_delay: Millis,
    scroll_threshold: f64,
    mounted: bool,
}

impl ChromeController {
    pub fn new(hide_delay: Millis, scroll_threshold: f64) -> Self {
        let (state, _) = watch::channel(ChromeVisibility::Visible);
        Self {
            state,
            hide_timer: None,
            last_scroll_y: 0.0,
            hide_delay,
            scroll_threshold,
            mounted: false,
        }
    }

    /// Current state
    pub fn state(&self) -> ChromeVisibility {
        *self.state.borrow()
    }

    /// Subscribe to state changes
    pub fn subscribe(&self) -> watch::Receiver<ChromeVisibility> {
        self.state.subscribe()
    }

    pub fn hide_timer(&self) -> Option<TimerId> {
        self.hide_timer
    }

    /// Start listening: show chrome briefly, then auto-hide
    pub fn mount(&mut self, now: Millis, scroll_y: f64, timers: &mut TimerQueue) {
        self.mounted = true;
        self.last_scroll_y = scroll_y;
        self.show(now, timers);
    }

    /// Stop listening and release the pending timer
    pub fn unmount(&mut self, timers: &mut TimerQueue) {
        self.disarm(timers);
        self.mounted = false;
    }

    pub fn on_activity(&mut self, event: ActivityEvent, now: Millis, timers: &mut TimerQueue) {
        if !self.mounted {
            return;
        }
        if event.reveals_chrome() {
            self.show(now, timers);
        } else if let ActivityEvent::Scroll { y } = event {
            if (y - self.last_scroll_y).abs() > self.scroll_threshold {
                self.disarm(timers);
                self.set(ChromeVisibility::Hidden);
            }
            self.last_scroll_y = y;
        }
    }

    /// The hide timer fired
    pub fn on_hide_timer(&mut self, timer: TimerId) {
        if self.hide_timer != Some(timer) {
            return;
        }
        self.hide_timer = None;
        self.set(ChromeVisibility::Hidden);
    }

    fn show(&mut self, now: Millis, timers: &mut TimerQueue) {
        self.set(ChromeVisibility::Visible);
        self.disarm(timers);
        self.hide_timer = Some(timers.schedule(
            TimerOwner::Shell,
            TimerKind::HideChrome,
            now + self.hide_delay,
        ));
    }

    fn disarm(&mut self, timers: &mut TimerQueue) {
        if let Some(timer) = self.hide_timer.take() {
            timers.cancel(timer);
        }
    }

    fn set(&mut self, next: ChromeVisibility) {
        let changed = self.state.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
        if changed {
            log::debug!("Chrome -> {:?}", next);
        }
    }
}
