//! Timer Queue: one-shot and repeating timers over a virtual clock.
//!
//! The scheduler runs on a single cooperative thread. Instead of sleeping,
//! it keeps its timers here and whoever owns the scheduler moves the clock
//! forward. Due timers pop out in `(due time, insertion order)` order, so
//! two timers armed for the same instant fire in the order they were armed.
//!
//! Cancellation is lazy: a cancelled timer's heap entry stays behind and is
//! skipped when it surfaces.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::time::Duration;

/// Handle to a scheduled timer.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug)]
struct Entry<E> {
    event: E,
    /// `Some` for repeating timers.
    interval: Option<Duration>,
}

/// A timer that came due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fired<E> {
    /// The timer that fired (still live if it repeats).
    pub id: TimerId,
    /// Clock time the timer was due at.
    pub at: Duration,
    /// The payload it was armed with.
    pub event: E,
}

/// Cooperative timer service.
#[derive(Debug)]
pub struct TimerQueue<E> {
    now: Duration,
    next_id: u64,
    next_seq: u64,
    heap: BinaryHeap<Reverse<(Duration, u64, TimerId)>>,
    entries: HashMap<TimerId, Entry<E>>,
}

impl<E: Clone> TimerQueue<E> {
    /// Create an empty queue at clock time zero.
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            next_seq: 0,
            heap: BinaryHeap::new(),
            entries: HashMap::new(),
        }
    }

    /// Current clock time.
    #[inline]
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Number of live timers.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no timers are live.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `id` is still armed.
    pub fn is_scheduled(&self, id: TimerId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Fire `event` once, `delay` from now.
    pub fn schedule_once(&mut self, delay: Duration, event: E) -> TimerId {
        self.insert(delay, event, None)
    }

    /// Fire `event` every `interval`, first time one interval from now.
    ///
    /// A zero interval is bumped to one nanosecond so the timer cannot starve
    /// the clock.
    pub fn schedule_repeating(&mut self, interval: Duration, event: E) -> TimerId {
        let interval = interval.max(Duration::from_nanos(1));
        self.insert(interval, event, Some(interval))
    }

    /// Cancel a timer. Returns `false` if it had already fired or been cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.entries.remove(&id).is_some()
    }

    /// Due time of the earliest live timer.
    pub fn next_due(&mut self) -> Option<Duration> {
        self.discard_cancelled();
        self.heap.peek().map(|Reverse((due, _, _))| *due)
    }

    /// Pop the earliest timer due at or before `until`.
    ///
    /// Moves the clock to the timer's due time. Repeating timers are
    /// re-armed one interval after their due time before returning.
    pub fn pop_due(&mut self, until: Duration) -> Option<Fired<E>> {
        loop {
            let Reverse((due, _, id)) = *self.heap.peek()?;
            if due > until {
                return None;
            }
            self.heap.pop();

            let Some(entry) = self.entries.get(&id) else {
                continue;
            };
            let event = entry.event.clone();
            let interval = entry.interval;

            self.now = self.now.max(due);
            match interval {
                Some(interval) => {
                    let seq = self.bump_seq();
                    self.heap.push(Reverse((due + interval, seq, id)));
                }
                None => {
                    self.entries.remove(&id);
                }
            }

            return Some(Fired { id, at: due, event });
        }
    }

    /// Move the clock forward without firing anything.
    ///
    /// The clock never moves backwards.
    pub fn advance_to(&mut self, time: Duration) {
        self.now = self.now.max(time);
    }

    fn insert(&mut self, delay: Duration, event: E, interval: Option<Duration>) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let seq = self.bump_seq();
        self.heap.push(Reverse((self.now + delay, seq, id)));
        self.entries.insert(id, Entry { event, interval });
        id
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    fn discard_cancelled(&mut self) {
        while let Some(Reverse((_, _, id))) = self.heap.peek() {
            if self.entries.contains_key(id) {
                break;
            }
            self.heap.pop();
        }
    }
}

impl<E: Clone> Default for TimerQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}
