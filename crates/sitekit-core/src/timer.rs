#![forbid(unsafe_code)]

//! Deadline-ordered timer queue.
//!
//! The queue never runs callbacks itself. The owner pops due keys with
//! [`TimerQueue::pop_due`] after the host advances time, and asks
//! [`TimerQueue::next_deadline`] when to be woken next.
//!
//! Timers with equal deadlines fire in scheduling order.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// Handle returned by [`TimerQueue::schedule`], used for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

/// A set of pending timers keyed by deadline.
#[derive(Debug, Clone)]
pub struct TimerQueue<K> {
    next_id: u64,
    pending: BTreeMap<(Duration, TimerId), K>,
    deadlines: HashMap<TimerId, Duration>,
}

impl<K> Default for TimerQueue<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> TimerQueue<K> {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: 0,
            pending: BTreeMap::new(),
            deadlines: HashMap::new(),
        }
    }

    /// Schedule `key` to fire at the absolute time `at`.
    pub fn schedule(&mut self, at: Duration, key: K) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.insert((at, id), key);
        self.deadlines.insert(id, at);
        id
    }

    /// Schedule `key` to fire `delay` after `now`.
    pub fn schedule_in(&mut self, now: Duration, delay: Duration, key: K) -> TimerId {
        self.schedule(now.saturating_add(delay), key)
    }

    /// Cancel a pending timer, returning its key if it had not fired yet.
    pub fn cancel(&mut self, id: TimerId) -> Option<K> {
        let at = self.deadlines.remove(&id)?;
        self.pending.remove(&(at, id))
    }

    /// Earliest pending deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.pending.keys().next().map(|(at, _)| *at)
    }

    /// Pop the earliest timer whose deadline is `<= now`.
    ///
    /// Popping one key at a time lets the caller schedule follow-up timers
    /// while draining.
    pub fn pop_due(&mut self, now: Duration) -> Option<K> {
        let (&(at, id), _) = self.pending.iter().next()?;
        if at > now {
            return None;
        }
        self.deadlines.remove(&id);
        self.pending.remove(&(at, id))
    }

    /// Number of pending timers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether no timers are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn pops_in_deadline_order() {
        let mut q = TimerQueue::new();
        q.schedule(ms(30), "c");
        q.schedule(ms(10), "a");
        q.schedule(ms(20), "b");

        assert_eq!(q.next_deadline(), Some(ms(10)));
        assert_eq!(q.pop_due(ms(25)), Some("a"));
        assert_eq!(q.pop_due(ms(25)), Some("b"));
        assert_eq!(q.pop_due(ms(25)), None);
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn equal_deadlines_fire_in_scheduling_order() {
        let mut q = TimerQueue::new();
        q.schedule(ms(5), 1);
        q.schedule(ms(5), 2);
        q.schedule(ms(5), 3);
        let fired: Vec<_> = std::iter::from_fn(|| q.pop_due(ms(5))).collect();
        assert_eq!(fired, vec![1, 2, 3]);
    }

    #[test]
    fn cancel_removes_pending_timer() {
        let mut q = TimerQueue::new();
        let id = q.schedule_in(ms(100), ms(50), "banner");
        assert_eq!(q.next_deadline(), Some(ms(150)));
        assert_eq!(q.cancel(id), Some("banner"));
        assert_eq!(q.cancel(id), None);
        assert!(q.is_empty());
    }

    #[test]
    fn cancel_after_fire_is_noop() {
        let mut q = TimerQueue::new();
        let id = q.schedule(ms(1), ());
        assert_eq!(q.pop_due(ms(1)), Some(()));
        assert_eq!(q.cancel(id), None);
    }
}
