//! Cancellable, guarded one-shot timers.
//!
//! Timers are plain data: the session polls for due entries and checks each
//! entry's guard against its own state before acting, so a timer that
//! outlived its phase is dropped instead of applied.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::session::Phase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimerKind {
    /// Stimulus time is over; move to answering.
    PresentationEnd,
    /// Response window ran out.
    ResponseLimit,
    /// Feedback pause is over; next round or completion.
    FeedbackEnd,
}

/// State a timer was scheduled for. It only fires if the session still
/// matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerGuard {
    pub epoch: u64,
    pub phase: Phase,
    pub round: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timer {
    pub id: u64,
    pub deadline_ms: u64,
    pub kind: TimerKind,
    pub guard: TimerGuard,
}

/// Pending timers ordered by deadline, then scheduling order.
#[derive(Debug, Clone, Default)]
pub struct TimerQueue {
    pending: BTreeMap<(u64, u64), Timer>,
    next_id: u64,
}

impl TimerQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a timer and return its id.
    pub fn schedule(&mut self, deadline_ms: u64, kind: TimerKind, guard: TimerGuard) -> u64 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.pending.insert(
            (deadline_ms, id),
            Timer {
                id,
                deadline_ms,
                kind,
                guard,
            },
        );
        id
    }

    /// Remove one timer; `false` if it already fired or never existed.
    pub fn cancel(&mut self, id: u64) -> bool {
        let key = self
            .pending
            .iter()
            .find_map(|(key, timer)| (timer.id == id).then_some(*key));
        key.is_some_and(|key| self.pending.remove(&key).is_some())
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    /// Earliest timer whose deadline is at or before `now_ms`.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<Timer> {
        let entry = self.pending.first_entry()?;
        if entry.key().0 > now_ms {
            return None;
        }
        Some(entry.remove())
    }

    #[must_use]
    pub fn next_deadline(&self) -> Option<u64> {
        self.pending.keys().next().map(|(deadline, _)| *deadline)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard(round: u32) -> TimerGuard {
        TimerGuard {
            epoch: 1,
            phase: Phase::Presenting,
            round,
        }
    }

    #[test]
    fn pops_in_deadline_then_schedule_order() {
        let mut queue = TimerQueue::new();
        let late = queue.schedule(500, TimerKind::FeedbackEnd, guard(0));
        let first = queue.schedule(100, TimerKind::PresentationEnd, guard(0));
        let second = queue.schedule(100, TimerKind::ResponseLimit, guard(0));
        assert_eq!(queue.next_deadline(), Some(100));
        assert_eq!(queue.pop_due(99), None);
        assert_eq!(queue.pop_due(100).map(|t| t.id), Some(first));
        assert_eq!(queue.pop_due(100).map(|t| t.id), Some(second));
        assert_eq!(queue.pop_due(100), None);
        assert_eq!(queue.pop_due(1_000).map(|t| t.id), Some(late));
        assert!(queue.is_empty());
    }

    #[test]
    fn cancelled_timers_never_pop() {
        let mut queue = TimerQueue::new();
        let id = queue.schedule(10, TimerKind::PresentationEnd, guard(0));
        queue.schedule(20, TimerKind::FeedbackEnd, guard(0));
        assert!(queue.cancel(id));
        assert!(!queue.cancel(id));
        assert_eq!(queue.len(), 1);
        queue.cancel_all();
        assert_eq!(queue.pop_due(u64::MAX), None);
    }
}
