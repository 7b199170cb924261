//! Viewport visibility tracking
//!
//! Decides which page the user is most likely reading:
//! - Only the middle band of the viewport counts (top and bottom 40% excluded)
//! - The intersecting page with the highest ratio wins
//! - Equal ratios resolve to the lowest ordinal, independent of delivery order
//! - When nothing intersects the previous page is kept

use std::collections::HashMap;

use crate::model::{Page, PageId};

use super::registry::{ElementHandle, PageElementRegistry};

/// Axis-aligned rectangle in viewport coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Overlapping region, if any
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = (self.x + self.width).min(other.x + other.width);
        let bottom = (self.y + self.height).min(other.y + other.height);
        if right <= left || bottom <= top {
            return None;
        }
        Some(Rect::new(left, top, right - left, bottom - top))
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// One intersection sample for a registered element
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityObservation {
    pub id: PageId,
    /// Fraction of the element inside the band, in `[0, 1]`
    pub intersection_ratio: f64,
    pub is_intersecting: bool,
}

impl VisibilityObservation {
    pub fn new(id: PageId, intersection_ratio: f64, is_intersecting: bool) -> Self {
        Self {
            id,
            intersection_ratio,
            is_intersecting,
        }
    }
}

/// Vertical band of the viewport that counts as "in view"
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObservationBand {
    /// Fraction excluded from the top
    pub top: f64,
    /// Fraction excluded from the bottom
    pub bottom: f64,
}

impl Default for ObservationBand {
    fn default() -> Self {
        Self {
            top: crate::defaults::BAND_MARGIN,
            bottom: crate::defaults::BAND_MARGIN,
        }
    }
}

impl ObservationBand {
    /// Root margin string for a browser `IntersectionObserver`
    pub fn root_margin(&self) -> String {
        format!(
            "-{}% 0px -{}% 0px",
            (self.top * 100.0).round(),
            (self.bottom * 100.0).round()
        )
    }

    /// The band inside a viewport
    pub fn band_rect(&self, viewport: &Rect) -> Rect {
        let top = viewport.y + viewport.height * self.top;
        let bottom = viewport.y + viewport.height * (1.0 - self.bottom);
        Rect::new(viewport.x, top, viewport.width, (bottom - top).max(0.0))
    }

    /// Compute observations from element geometry
    ///
    /// For hosts without a native intersection API. The ratio is the share of
    /// the element's area that falls inside the band.
    pub fn observe(
        &self,
        viewport: &Rect,
        elements: &[(PageId, Rect)],
    ) -> Vec<VisibilityObservation> {
        let band = self.band_rect(viewport);
        elements
            .iter()
            .map(|(id, rect)| match band.intersection(rect) {
                Some(overlap) if !rect.is_empty() => {
                    VisibilityObservation::new(*id, (overlap.area() / rect.area()).min(1.0), true)
                }
                _ => VisibilityObservation::new(*id, 0.0, false),
            })
            .collect()
    }
}

/// Handle to an active intersection subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Event source delivering intersection batches
///
/// Implementations deliver batches back to the controller tagged with the
/// subscription they belong to.
pub trait IntersectionSource {
    fn subscribe(
        &mut self,
        targets: &[(PageId, ElementHandle)],
        band: ObservationBand,
    ) -> SubscriptionId;

    fn unsubscribe(&mut self, subscription: SubscriptionId);
}

/// Pick the most visible page among intersecting observations
pub fn most_visible<'a>(
    observations: impl IntoIterator<Item = &'a VisibilityObservation>,
    ordinals: &HashMap<PageId, u32>,
) -> Option<PageId> {
    observations
        .into_iter()
        .filter(|o| o.is_intersecting && !o.intersection_ratio.is_nan())
        .filter_map(|o| ordinals.get(&o.id).map(|ordinal| (o, *ordinal)))
        .max_by(|(a, a_ord), (b, b_ord)| {
            a.intersection_ratio
                .total_cmp(&b.intersection_ratio)
                .then_with(|| b_ord.cmp(a_ord))
                .then_with(|| b.id.cmp(&a.id))
        })
        .map(|(o, _)| o.id)
}

/// Tracks the current page for one reading session
#[derive(Debug, Default)]
pub struct VisibilityTracker {
    subscription: Option<SubscriptionId>,
    ordinals: HashMap<PageId, u32>,
    latest: HashMap<PageId, VisibilityObservation>,
    current: Option<PageId>,
}

impl VisibilityTracker {
    pub fn new(pages: &[Page]) -> Self {
        Self {
            ordinals: pages.iter().map(|p| (p.id, p.ordinal)).collect(),
            ..Self::default()
        }
    }

    pub fn current(&self) -> Option<PageId> {
        self.current
    }

    /// Override the current page (deep-link restoration)
    pub fn set_current(&mut self, id: PageId) {
        if self.ordinals.contains_key(&id) {
            self.current = Some(id);
        }
    }

    pub fn subscription(&self) -> Option<SubscriptionId> {
        self.subscription
    }

    /// Replace the subscription with one covering every registered element
    ///
    /// Nothing is observed until the session has pages and the registry has
    /// at least one element. Observations of pages whose element is gone are
    /// forgotten, since the new subscription will never report them again.
    pub fn resubscribe(
        &mut self,
        source: &mut dyn IntersectionSource,
        registry: &PageElementRegistry,
        band: ObservationBand,
    ) {
        self.unsubscribe(source);
        self.latest.retain(|id, _| registry.get(id).is_some());
        if self.ordinals.is_empty() || registry.is_empty() {
            return;
        }
        let targets = registry.snapshot();
        let subscription = source.subscribe(&targets, band);
        log::debug!(
            "Observing {} page elements ({:?})",
            targets.len(),
            subscription
        );
        self.subscription = Some(subscription);
    }

    /// Drop the active subscription, if any
    pub fn unsubscribe(&mut self, source: &mut dyn IntersectionSource) {
        if let Some(subscription) = self.subscription.take() {
            source.unsubscribe(subscription);
            log::debug!("Released intersection subscription {:?}", subscription);
        }
    }

    /// Apply a batch; returns the new current page when it changed
    ///
    /// Batches from any subscription other than the active one are stale and
    /// ignored, as are observations for pages outside this session.
    pub fn on_batch(
        &mut self,
        subscription: SubscriptionId,
        batch: &[VisibilityObservation],
    ) -> Option<PageId> {
        if self.subscription != Some(subscription) {
            log::debug!("Dropping batch from stale subscription {:?}", subscription);
            return None;
        }
        for observation in batch {
            if self.ordinals.contains_key(&observation.id) {
                self.latest.insert(observation.id, *observation);
            }
        }

        let next = most_visible(self.latest.values(), &self.ordinals)?;
        if self.current == Some(next) {
            return None;
        }
        self.current = Some(next);
        Some(next)
    }
}
