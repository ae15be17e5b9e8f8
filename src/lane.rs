//! Lane Registry: fixed set of horizontal lanes and their occupancy.
//!
//! Every lane carries two independent slots, one for scrolling traffic and
//! one for centered (priority) traffic. A slot is either free or held by
//! exactly one message.
//!
//! Scrolling acquisition samples a lane uniformly at random; centered
//! acquisition is first-fit from lane 0 so priority messages stack from the
//! top down.

use bitflags::bitflags;
use rand::Rng;

bitflags! {
    /// Occupied slots of a single lane.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct LaneFlags: u8 {
        /// A scrolling message holds the lane.
        const SCROLL_BUSY = 0b0000_0001;
        /// A centered message holds the lane.
        const PRIORITY_BUSY = 0b0000_0010;
    }
}

impl std::fmt::Debug for LaneFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        bitflags::parser::to_writer(self, f)
    }
}

/// Which slot of a lane a message competes for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LaneKind {
    /// Horizontally traveling messages.
    Scrolling,
    /// Centered priority messages.
    Centered,
}

impl LaneKind {
    const fn busy_flag(self) -> LaneFlags {
        match self {
            Self::Scrolling => LaneFlags::SCROLL_BUSY,
            Self::Centered => LaneFlags::PRIORITY_BUSY,
        }
    }
}

/// Occupancy for a fixed number of lanes.
#[derive(Debug, Clone)]
pub struct LaneRegistry {
    lanes: Vec<LaneFlags>,
}

impl LaneRegistry {
    /// Create `count` lanes, all free.
    pub fn new(count: usize) -> Self {
        Self {
            lanes: vec![LaneFlags::empty(); count],
        }
    }

    /// Number of lanes.
    #[inline]
    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    /// Whether the registry has no lanes at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    /// Occupancy of one lane.
    pub fn flags(&self, lane: usize) -> Option<LaneFlags> {
        self.lanes.get(lane).copied()
    }

    /// Whether the given slot of `lane` is free.
    pub fn is_free(&self, lane: usize, kind: LaneKind) -> bool {
        self.lanes
            .get(lane)
            .is_some_and(|flags| !flags.contains(kind.busy_flag()))
    }

    /// Make one acquisition attempt.
    ///
    /// Scrolling: a single uniform draw over `[0, len)`. A `None` only means
    /// the sampled lane was busy; use [`is_fully_occupied`](Self::is_fully_occupied)
    /// to tell that apart from saturation.
    ///
    /// Centered: first free priority slot in index order, `None` when every
    /// priority slot is held.
    pub fn try_acquire<R: Rng + ?Sized>(&mut self, kind: LaneKind, rng: &mut R) -> Option<usize> {
        if self.lanes.is_empty() {
            return None;
        }
        let lane = match kind {
            LaneKind::Scrolling => {
                let lane = rng.random_range(0..self.lanes.len());
                if !self.is_free(lane, kind) {
                    return None;
                }
                lane
            }
            LaneKind::Centered => (0..self.lanes.len()).find(|&lane| self.is_free(lane, kind))?,
        };
        self.lanes[lane].insert(kind.busy_flag());
        Some(lane)
    }

    /// Mark a slot as held. Returns `false` if it was already held.
    pub fn occupy(&mut self, lane: usize, kind: LaneKind) -> bool {
        match self.lanes.get_mut(lane) {
            Some(flags) if !flags.contains(kind.busy_flag()) => {
                flags.insert(kind.busy_flag());
                true
            }
            _ => false,
        }
    }

    /// Free a slot. Returns `false` if it was not held.
    pub fn release(&mut self, lane: usize, kind: LaneKind) -> bool {
        match self.lanes.get_mut(lane) {
            Some(flags) if flags.contains(kind.busy_flag()) => {
                flags.remove(kind.busy_flag());
                true
            }
            _ => false,
        }
    }

    /// Whether every lane's slot of this kind is held.
    pub fn is_fully_occupied(&self, kind: LaneKind) -> bool {
        self.lanes
            .iter()
            .all(|flags| flags.contains(kind.busy_flag()))
    }

    /// Number of held slots of this kind.
    pub fn occupied(&self, kind: LaneKind) -> usize {
        self.lanes
            .iter()
            .filter(|flags| flags.contains(kind.busy_flag()))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_registry_starts_free() {
        let registry = LaneRegistry::new(4);
        assert_eq!(registry.len(), 4);
        assert!(!registry.is_fully_occupied(LaneKind::Scrolling));
        assert!(!registry.is_fully_occupied(LaneKind::Centered));
        assert_eq!(registry.flags(2), Some(LaneFlags::empty()));
        assert_eq!(registry.flags(4), None);
    }

    #[test]
    fn test_slots_are_independent() {
        let mut registry = LaneRegistry::new(1);
        assert!(registry.occupy(0, LaneKind::Scrolling));
        assert!(registry.is_free(0, LaneKind::Centered));
        assert!(registry.occupy(0, LaneKind::Centered));
        assert_eq!(
            registry.flags(0),
            Some(LaneFlags::SCROLL_BUSY | LaneFlags::PRIORITY_BUSY)
        );

        assert!(registry.release(0, LaneKind::Scrolling));
        assert!(!registry.release(0, LaneKind::Scrolling));
        assert_eq!(registry.flags(0), Some(LaneFlags::PRIORITY_BUSY));
    }

    #[test]
    fn test_centered_first_fit() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut registry = LaneRegistry::new(3);
        registry.occupy(1, LaneKind::Centered);

        assert_eq!(registry.try_acquire(LaneKind::Centered, &mut rng), Some(0));
        assert_eq!(registry.try_acquire(LaneKind::Centered, &mut rng), Some(2));
        assert_eq!(registry.try_acquire(LaneKind::Centered, &mut rng), None);
        assert!(registry.is_fully_occupied(LaneKind::Centered));
    }

    #[test]
    fn test_scrolling_pick_never_double_books() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut registry = LaneRegistry::new(3);
        let mut acquired = Vec::new();

        while !registry.is_fully_occupied(LaneKind::Scrolling) {
            if let Some(lane) = registry.try_acquire(LaneKind::Scrolling, &mut rng) {
                assert!(!acquired.contains(&lane));
                acquired.push(lane);
            }
        }

        acquired.sort_unstable();
        assert_eq!(acquired, vec![0, 1, 2]);
        assert_eq!(registry.try_acquire(LaneKind::Scrolling, &mut rng), None);
    }

    #[test]
    fn test_scrolling_pick_is_uniform() {
        let mut rng = StdRng::seed_from_u64(1234);
        let mut registry = LaneRegistry::new(5);
        let mut hits = [0u32; 5];

        for _ in 0..10_000 {
            let lane = registry
                .try_acquire(LaneKind::Scrolling, &mut rng)
                .expect("all lanes free");
            hits[lane] += 1;
            registry.release(lane, LaneKind::Scrolling);
        }

        // Edge lanes get the same share as inner lanes.
        for count in hits {
            assert!((1700..=2300).contains(&count), "skewed: {hits:?}");
        }
    }
}
