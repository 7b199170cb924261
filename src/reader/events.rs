//! Host events consumed by the reader
//!
//! Browser listeners (or a native shell) translate their raw input into these
//! values and hand them to the controller or the engine's event channel.

use crate::model::PageId;

use super::registry::ElementHandle;
use super::visibility::{SubscriptionId, VisibilityObservation};

/// User activity relevant to chrome visibility
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActivityEvent {
    /// Pointer moved over the reader
    PointerMove { x: f64, y: f64 },
    /// A touch started
    TouchStart,
    /// Document scrolled to a new vertical offset
    Scroll { y: f64 },
}

impl ActivityEvent {
    /// Whether the event asks for chrome to be shown
    pub fn reveals_chrome(&self) -> bool {
        matches!(self, Self::PointerMove { .. } | Self::TouchStart)
    }
}

/// Everything the engine can be told by its host
#[derive(Debug, Clone, PartialEq)]
pub enum ReaderEvent {
    /// The chapter route parameter changed
    Open(String),
    /// A page element mounted (`Some`) or unmounted (`None`)
    PageElement(PageId, Option<ElementHandle>),
    /// An intersection batch arrived
    Intersections(SubscriptionId, Vec<VisibilityObservation>),
    /// Pointer, touch or scroll activity
    Activity(ActivityEvent),
    /// The reader shell is going away
    Unmount,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reveals_chrome() {
        assert!(ActivityEvent::PointerMove { x: 1.0, y: 2.0 }.reveals_chrome());
        assert!(ActivityEvent::TouchStart.reveals_chrome());
        assert!(!ActivityEvent::Scroll { y: 40.0 }.reveals_chrome());
    }
}
