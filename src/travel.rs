//! Travel: timing math and per-message flight records.
//!
//! A scrolling message rests with its left edge `margin` past the container's
//! right edge and travels left until its right edge clears the left edge:
//!
//! ```text
//!            distance = container + width + margin
//!   ◀──────────────────────────────────────────────────────▶
//!   ┌─────────────────────────────┐
//!   │          container          │  margin   [ message ]
//!   └─────────────────────────────┘
//! ```
//!
//! Its lane is released early, once a progress sampler has accumulated more
//! than `width * coefficient` of travel, so the next message can follow
//! without catching up to it.
//!
//! Each flight carries a tri-state tag. Completion timers only act on an
//! `Armed` flight, which is what keeps a timer that was already queued from
//! removing a message that has since been paused.

use crate::config::SAMPLE_HZ;
use crate::stage::Transition;
use crate::timer::TimerId;
use std::time::Duration;

/// Completion details handed to a message's callback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Completion {
    /// Travel time (scrolling) or hold time (centered).
    pub duration: Duration,
    /// The element that finished.
    pub element: crate::stage::ElementId,
    /// Its rendered width.
    pub width: f64,
}

/// Called once when a message finishes normally.
pub type CompletionCallback = Box<dyn FnOnce(&Completion) + Send>;

/// Seconds a message of `width` takes to cross a container of `container_width`.
///
/// Wider content gets more time so apparent speed stays roughly uniform.
pub fn travel_seconds(base_speed: f64, width: f64, container_width: f64) -> f64 {
    if container_width > 0.0 {
        (width / container_width).mul_add(2.0, base_speed)
    } else {
        base_speed
    }
}

/// Total distance from the resting position to fully off-screen left.
pub fn travel_distance(container_width: f64, width: f64, margin: f64) -> f64 {
    container_width + width + margin
}

/// Distance covered per progress sample.
pub fn sample_step(distance: f64, seconds: f64) -> f64 {
    if seconds > 0.0 {
        distance / seconds / SAMPLE_HZ
    } else {
        distance
    }
}

/// Progress past which a lane is released.
pub fn release_threshold(width: f64, coefficient: f64) -> f64 {
    width * coefficient
}

/// State tag of a scrolling flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TravelState {
    /// Moving, completion timer armed.
    Armed,
    /// Frozen in place, no completion timer.
    Paused,
    /// Removed from the stage.
    Completed,
}

/// Where a paused flight resumes to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResumePlan {
    /// Offset the message is frozen at.
    pub from: f64,
    /// Exit offset it travels to.
    pub to: f64,
    /// Distance left to cover.
    pub remaining: f64,
    /// Time left at the flight's original speed.
    pub duration: Duration,
}

/// Runtime state of one scrolling message.
pub struct Travel {
    /// Lane held in the scrolling slot.
    pub lane: usize,
    /// Rendered width.
    pub width: f64,
    /// Distance from rest to exit.
    pub distance_total: f64,
    /// Per-message travel time in seconds.
    pub speed_seconds: f64,
    /// Share of `distance_total` covered, captured on pause.
    pub elapsed_fraction: f64,
    /// State tag.
    pub state: TravelState,
    /// Whether the message has been paused at least once.
    pub interrupted: bool,
    /// Motion last handed to the stage.
    pub transition: Transition,
    /// Progress accumulated by the sampler.
    pub progress: f64,
    /// Sampler progress per tick.
    pub step: f64,
    /// Progress needed to free the lane.
    pub threshold: f64,
    /// Whether the lane has been released.
    pub lane_released: bool,
    /// Pending completion timer.
    pub arrive_timer: Option<TimerId>,
    /// Running progress sampler.
    pub sampler: Option<TimerId>,
    /// Callback for a normal finish.
    pub on_complete: Option<CompletionCallback>,
}

impl Travel {
    /// Start a flight at clock time `now`.
    pub fn launch(
        lane: usize,
        width: f64,
        container_width: f64,
        base_speed: f64,
        margin: f64,
        coefficient: f64,
        now: Duration,
    ) -> Self {
        let speed_seconds = travel_seconds(base_speed, width, container_width);
        let distance_total = travel_distance(container_width, width, margin);
        Self {
            lane,
            width,
            distance_total,
            speed_seconds,
            elapsed_fraction: 0.0,
            state: TravelState::Armed,
            interrupted: false,
            transition: Transition::new(
                0.0,
                -distance_total,
                now,
                Duration::from_secs_f64(speed_seconds),
            ),
            progress: 0.0,
            step: sample_step(distance_total, speed_seconds),
            threshold: release_threshold(width, coefficient),
            lane_released: false,
            arrive_timer: None,
            sampler: None,
            on_complete: None,
        }
    }

    /// Travel time as a duration.
    pub fn speed(&self) -> Duration {
        Duration::from_secs_f64(self.speed_seconds)
    }

    /// Offset on screen at `now`.
    pub fn offset_at(&self, now: Duration) -> f64 {
        self.transition.offset_at(now)
    }

    /// Freeze at the offset shown at `now`.
    ///
    /// Returns the frozen motion, or `None` unless the flight was `Armed`.
    pub fn pause(&mut self, now: Duration) -> Option<Transition> {
        if self.state != TravelState::Armed {
            return None;
        }
        let offset = self.offset_at(now);
        self.elapsed_fraction = if self.distance_total > 0.0 {
            (offset.abs() / self.distance_total).clamp(0.0, 1.0)
        } else {
            1.0
        };
        self.state = TravelState::Paused;
        self.interrupted = true;
        self.transition = Transition::hold(offset, now);
        Some(self.transition)
    }

    /// Where the flight goes from its frozen offset.
    pub fn resume_plan(&self) -> ResumePlan {
        let from = self.transition.to;
        let remaining = (self.distance_total - from.abs()).max(0.0);
        let seconds = if self.distance_total > 0.0 {
            self.speed_seconds * remaining / self.distance_total
        } else {
            0.0
        };
        ResumePlan {
            from,
            to: -self.distance_total,
            remaining,
            duration: Duration::from_secs_f64(seconds),
        }
    }

    /// Start moving again at `now`.
    ///
    /// The remaining distance is covered at the flight's original speed, so
    /// same-lane neighbours paused together keep their spacing.
    ///
    /// Returns the new motion, or `None` unless the flight was `Paused`.
    pub fn resume(&mut self, now: Duration) -> Option<Transition> {
        if self.state != TravelState::Paused {
            return None;
        }
        let plan = self.resume_plan();
        self.state = TravelState::Armed;
        self.transition = Transition::new(plan.from, plan.to, now, plan.duration);
        Some(self.transition)
    }

    /// Add one sampler step. Returns `true` the first time the lane should be released.
    pub fn sample(&mut self) -> bool {
        if self.lane_released || self.state != TravelState::Armed {
            return false;
        }
        self.progress += self.step;
        self.progress > self.threshold
    }
}

impl std::fmt::Debug for Travel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Travel")
            .field("lane", &self.lane)
            .field("width", &self.width)
            .field("distance_total", &self.distance_total)
            .field("speed_seconds", &self.speed_seconds)
            .field("state", &self.state)
            .field("progress", &self.progress)
            .field("lane_released", &self.lane_released)
            .finish_non_exhaustive()
    }
}

/// Runtime state of one centered message.
pub struct Hold {
    /// Lane held in the priority slot.
    pub lane: usize,
    /// Rendered width.
    pub width: f64,
    /// Time the message stays up.
    pub duration: Duration,
    /// Expiry timer.
    pub timer: TimerId,
    /// Callback on expiry.
    pub on_complete: Option<CompletionCallback>,
}

impl std::fmt::Debug for Hold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hold")
            .field("lane", &self.lane)
            .field("width", &self.width)
            .field("duration", &self.duration)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flight() -> Travel {
        // 1000 wide container, 100 wide message, 5s base speed.
        Travel::launch(2, 100.0, 1000.0, 5.0, 130.0, 1.38, Duration::ZERO)
    }

    #[test]
    fn test_timing_math() {
        assert!((travel_seconds(5.0, 100.0, 1000.0) - 5.2).abs() < 1e-9);
        assert!((travel_seconds(5.0, 100.0, 0.0) - 5.0).abs() < 1e-9);
        assert!((travel_distance(1000.0, 100.0, 130.0) - 1230.0).abs() < 1e-9);
        assert!((sample_step(1200.0, 5.0) - 4.0).abs() < 1e-9);
        assert!((release_threshold(100.0, 1.38) - 138.0).abs() < 1e-9);
    }

    #[test]
    fn test_launch_moves_to_exit() {
        let travel = flight();
        assert_eq!(travel.state, TravelState::Armed);
        assert_eq!(travel.speed(), Duration::from_secs_f64(5.2));
        assert!((travel.offset_at(Duration::from_secs(60)) + 1230.0).abs() < 1e-9);
    }

    #[test]
    fn test_sampler_releases_once_past_threshold() {
        let mut travel = flight();
        let mut samples = 0;
        while !travel.sample() {
            samples += 1;
            assert!(samples < 1000);
        }
        assert!(travel.progress > travel.threshold);
        // 138 / (1230 / 5.2 / 60) ≈ 35 samples.
        assert!((34..=36).contains(&samples));
    }

    #[test]
    fn test_pause_freezes_and_resume_conserves_distance() {
        let mut travel = flight();
        let at = Duration::from_secs_f64(2.6);

        let frozen = travel.pause(at).unwrap();
        assert!(frozen.is_frozen());
        assert!((frozen.to + 615.0).abs() < 1e-6);
        assert!((travel.elapsed_fraction - 0.5).abs() < 1e-6);
        assert!(travel.pause(at).is_none());
        assert!(!travel.sample());

        let plan = travel.resume_plan();
        assert!((plan.remaining - 615.0).abs() < 1e-6);
        assert!(plan.remaining < travel.distance_total);

        let motion = travel.resume(Duration::from_secs(10)).unwrap();
        assert!((motion.from + 615.0).abs() < 1e-6);
        assert!((motion.to + 1230.0).abs() < 1e-6);
        // Half the distance left, half the travel time.
        assert!((motion.duration.as_secs_f64() - 2.6).abs() < 1e-6);
        assert!((travel.step - sample_step(1230.0, 5.2)).abs() < 1e-9);
        assert!(travel.resume(Duration::from_secs(10)).is_none());
    }

    #[test]
    fn test_repeated_pauses_shrink_remaining() {
        let mut travel = flight();
        let mut now = Duration::ZERO;
        let mut last = travel.distance_total;

        let pace = travel.distance_total / travel.speed_seconds;

        for _ in 0..4 {
            now += Duration::from_secs(1);
            travel.pause(now).unwrap();
            let remaining = travel.resume_plan().remaining;
            assert!(remaining < last);
            last = remaining;
            let motion = travel.resume(now).unwrap();
            let resumed_pace = (motion.from - motion.to).abs() / motion.duration.as_secs_f64();
            assert!((resumed_pace - pace).abs() < 1e-6);
        }
        // One second per leg at constant pace.
        assert!((travel.offset_at(now) + 4.0 * pace).abs() < 1e-6);
    }

    #[test]
    fn test_resume_keeps_same_lane_spacing() {
        let mut ahead = flight();
        let mut behind = Travel::launch(2, 100.0, 1000.0, 5.0, 130.0, 1.38, Duration::from_millis(700));
        let paused = Duration::from_millis(2600);
        let gap = |a: &Travel, b: &Travel, at: Duration| b.offset_at(at) - (a.offset_at(at) + a.width);
        let before = gap(&ahead, &behind, paused);
        assert!(before > 0.0);

        ahead.pause(paused).unwrap();
        behind.pause(paused).unwrap();
        let resumed = Duration::from_secs(9);
        ahead.resume(resumed).unwrap();
        behind.resume(resumed).unwrap();

        let mut at = resumed;
        // The leader exits 2.6s after resuming.
        while at < resumed + Duration::from_millis(2500) {
            assert!((gap(&ahead, &behind, at) - before).abs() < 1e-6, "gap drifted at {at:?}");
            at += Duration::from_millis(10);
        }
    }
}
