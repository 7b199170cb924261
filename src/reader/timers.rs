//! Cancellable one-shot timers on an injected monotonic clock
//!
//! The reader never sleeps. Components schedule deadlines here and the host
//! (or [`ReaderEngine`](crate::engine::ReaderEngine)) calls back with the
//! current time, which keeps every transition reproducible in tests.

use std::time::Duration;

/// Milliseconds on the host's monotonic clock
pub type Millis = u64;

/// `duration` in whole milliseconds, saturating at [`Millis::MAX`]
pub fn millis(duration: Duration) -> Millis {
    Millis::try_from(duration.as_millis()).unwrap_or(Millis::MAX)
}

/// Handle returned by [`TimerQueue::schedule`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Who is responsible for cancelling a timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerOwner {
    /// The mounted reader shell (chrome auto-hide)
    Shell,
    /// A reading session, by generation
    Session(u64),
}

/// What a timer does when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    HideChrome,
    DeepLinkSettle,
}

/// A timer that reached its deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiredTimer {
    pub id: TimerId,
    pub owner: TimerOwner,
    pub kind: TimerKind,
    pub deadline: Millis,
}

/// Pending timers, small enough that a flat list beats a heap
#[derive(Debug, Default)]
pub struct TimerQueue {
    next_id: u64,
    pending: Vec<FiredTimer>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a one-shot timer
    pub fn schedule(&mut self, owner: TimerOwner, kind: TimerKind, deadline: Millis) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.pending.push(FiredTimer {
            id,
            owner,
            kind,
            deadline,
        });
        id
    }

    /// Cancel a timer; returns false if it already fired or was cancelled
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|t| t.id != id);
        self.pending.len() != before
    }

    /// Cancel every timer held by `owner`
    pub fn cancel_owner(&mut self, owner: TimerOwner) -> usize {
        let before = self.pending.len();
        self.pending.retain(|t| t.owner != owner);
        before - self.pending.len()
    }

    /// Remove and return the earliest timer due at `now`
    ///
    /// Ties on the deadline fire in scheduling order.
    pub fn pop_next_due(&mut self, now: Millis) -> Option<FiredTimer> {
        let index = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, t)| t.deadline <= now)
            .min_by_key(|(_, t)| (t.deadline, t.id))
            .map(|(i, _)| i)?;
        Some(self.pending.swap_remove(index))
    }

    /// Earliest pending deadline
    pub fn next_deadline(&self) -> Option<Millis> {
        self.pending.iter().map(|t| t.deadline).min()
    }

    /// Number of pending timers held by `owner`
    pub fn pending_for(&self, owner: TimerOwner) -> usize {
        self.pending.iter().filter(|t| t.owner == owner).count()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
