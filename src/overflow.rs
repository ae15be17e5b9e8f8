//! Overflow Queue: messages waiting for a free lane.
//!
//! Entries leave strictly first-in, first-out. A drain loop ticks at a fixed
//! cadence and replays one entry per tick; replaying an entry that still
//! cannot be placed pushes it back on the tail, so a message can cycle
//! through the queue several times before it lands.
//!
//! The loop bounds its own lifetime: after more than
//! [`DRAIN_IDLE_LIMIT`] consecutive ticks with nothing to replay it stops,
//! and only a new deferral (or `play`) starts it again.

use crate::config::DRAIN_IDLE_LIMIT;
use crate::timer::TimerId;
use crate::travel::CompletionCallback;
use std::collections::VecDeque;

/// A deferred scrolling message.
pub struct OverflowEntry {
    /// Message body.
    pub body: String,
    /// Style class it was sent with.
    pub class: Option<String>,
    /// Completion callback, carried across replays.
    pub on_complete: Option<CompletionCallback>,
}

impl std::fmt::Debug for OverflowEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverflowEntry")
            .field("body", &self.body)
            .field("class", &self.class)
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

/// What one drain tick should do.
#[derive(Debug)]
pub enum DrainStep {
    /// Replay this entry through placement.
    Replay(OverflowEntry),
    /// Nothing queued; keep polling.
    Idle,
    /// Nothing queued for too long; the loop has stopped.
    Stop,
}

/// FIFO of deferred messages plus drain-loop bookkeeping.
#[derive(Debug, Default)]
pub struct OverflowQueue {
    entries: VecDeque<OverflowEntry>,
    timer: Option<TimerId>,
    idle_ticks: u32,
}

impl OverflowQueue {
    /// Create an empty queue with no drain loop.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry at the tail.
    pub fn enqueue(&mut self, entry: OverflowEntry) {
        self.entries.push_back(entry);
    }

    /// Drop every waiting entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of waiting entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bodies in queue order.
    pub fn bodies(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.body.as_str())
    }

    /// Whether a drain loop is running.
    pub const fn is_draining(&self) -> bool {
        self.timer.is_some()
    }

    /// Timer driving the drain loop.
    pub const fn timer(&self) -> Option<TimerId> {
        self.timer
    }

    /// Record a freshly armed drain loop, returning the one it replaces.
    pub fn start(&mut self, timer: TimerId) -> Option<TimerId> {
        self.idle_ticks = 0;
        self.timer.replace(timer)
    }

    /// Forget the drain loop, returning its timer for cancellation.
    pub fn stop(&mut self) -> Option<TimerId> {
        self.idle_ticks = 0;
        self.timer.take()
    }

    /// Advance the drain loop by one tick.
    pub fn tick(&mut self) -> DrainStep {
        if let Some(entry) = self.entries.pop_front() {
            self.idle_ticks = 0;
            return DrainStep::Replay(entry);
        }
        self.idle_ticks += 1;
        if self.idle_ticks > DRAIN_IDLE_LIMIT {
            DrainStep::Stop
        } else {
            DrainStep::Idle
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::TimerQueue;

    fn entry(body: &str) -> OverflowEntry {
        OverflowEntry {
            body: body.to_string(),
            class: None,
            on_complete: None,
        }
    }

    #[test]
    fn test_fifo_order() {
        let mut queue = OverflowQueue::new();
        for body in ["a", "b", "c"] {
            queue.enqueue(entry(body));
        }
        assert_eq!(queue.bodies().collect::<Vec<_>>(), vec!["a", "b", "c"]);

        let mut replayed = Vec::new();
        while let DrainStep::Replay(next) = queue.tick() {
            replayed.push(next.body);
        }
        assert_eq!(replayed, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_stops_after_idle_limit() {
        let mut timers: TimerQueue<()> = TimerQueue::new();
        let mut queue = OverflowQueue::new();
        queue.start(timers.schedule_repeating(std::time::Duration::from_millis(500), ()));
        assert!(queue.is_draining());

        for _ in 0..DRAIN_IDLE_LIMIT {
            assert!(matches!(queue.tick(), DrainStep::Idle));
        }
        assert!(matches!(queue.tick(), DrainStep::Stop));
    }

    #[test]
    fn test_replay_resets_idle_count() {
        let mut queue = OverflowQueue::new();
        for _ in 0..DRAIN_IDLE_LIMIT {
            queue.tick();
        }
        queue.enqueue(entry("late"));
        assert!(matches!(queue.tick(), DrainStep::Replay(_)));

        for _ in 0..DRAIN_IDLE_LIMIT {
            assert!(matches!(queue.tick(), DrainStep::Idle));
        }
        assert!(matches!(queue.tick(), DrainStep::Stop));
    }
}
