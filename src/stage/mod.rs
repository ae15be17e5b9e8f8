//! Stage: the rendering backend messages are drawn on.
//!
//! The scheduler never draws anything itself. It talks to a [`Stage`], which
//! plays the part of the container element: it knows its own size, attaches
//! and removes message elements, measures them once attached, and moves them
//! along the [`Transition`]s it is handed.
//!
//! Two stages ship with the crate:
//! - [`MemoryStage`]: headless, records what it was told (tests, embedding)
//! - [`TerminalStage`]: draws lanes into a terminal area as ANSI output

mod memory;
mod output;
mod terminal;

pub use memory::{MemoryStage, StagedElement, REMOVED_HISTORY, TRANSITION_HISTORY};
pub use output::OutputBuffer;
pub use terminal::TerminalStage;

use std::time::Duration;

/// Identity of one attached message element.
///
/// Ids are handed out in attach order and never reused by a scheduler.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct ElementId(pub u64);

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// True-color RGB representation.
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Rgb {
    /// Red channel (0-255)
    pub r: u8,
    /// Green channel (0-255)
    pub g: u8,
    /// Blue channel (0-255)
    pub b: u8,
}

impl Rgb {
    /// Create a new RGB color.
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Create from a 24-bit hex color (e.g., 0xFF5500).
    #[inline]
    pub const fn from_u32(hex: u32) -> Self {
        Self::new(
            ((hex >> 16) & 0xFF) as u8,
            ((hex >> 8) & 0xFF) as u8,
            (hex & 0xFF) as u8,
        )
    }
}

impl std::fmt::Debug for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// What an element displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Content<'a> {
    /// Opaque renderable body.
    pub body: &'a str,
    /// Style class, if any.
    pub class: Option<&'a str>,
}

/// Resting position of an attached element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Anchor {
    /// A lane-bound element entering from the right.
    Scrolling {
        /// Lane index.
        lane: usize,
        /// Top edge of the lane.
        top: f64,
        /// Lane height.
        line_height: f64,
        /// Left edge of the element at offset zero (past the right edge).
        start_x: f64,
        /// Foreground color override.
        color: Option<Rgb>,
    },
    /// A priority element held in the middle of a lane.
    Centered {
        /// Lane index.
        lane: usize,
        /// Top edge of the lane.
        top: f64,
        /// Lane height.
        line_height: f64,
    },
}

impl Anchor {
    /// Lane the element sits in.
    pub const fn lane(&self) -> usize {
        match *self {
            Self::Scrolling { lane, .. } | Self::Centered { lane, .. } => lane,
        }
    }
}

/// Linear motion of an element's horizontal offset.
///
/// Offsets are negative-going: zero is the resting position and the element
/// moves left as the offset decreases. A zero `duration` sets `to`
/// instantly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    /// Offset at `start`.
    pub from: f64,
    /// Offset once `duration` has elapsed.
    pub to: f64,
    /// Clock time the motion began.
    pub start: Duration,
    /// Time the motion takes.
    pub duration: Duration,
}

impl Transition {
    /// A motion from `from` to `to`.
    pub const fn new(from: f64, to: f64, start: Duration, duration: Duration) -> Self {
        Self {
            from,
            to,
            start,
            duration,
        }
    }

    /// An instantaneous set to `offset` (frozen motion).
    pub const fn hold(offset: f64, at: Duration) -> Self {
        Self::new(offset, offset, at, Duration::ZERO)
    }

    /// Whether this transition does not move.
    pub fn is_frozen(&self) -> bool {
        self.duration.is_zero() || (self.from - self.to).abs() < f64::EPSILON
    }

    /// Offset displayed at clock time `now`.
    pub fn offset_at(&self, now: Duration) -> f64 {
        if self.duration.is_zero() || now >= self.start + self.duration {
            return self.to;
        }
        if now <= self.start {
            return self.from;
        }
        let t = (now - self.start).as_secs_f64() / self.duration.as_secs_f64();
        (self.to - self.from).mul_add(t, self.from)
    }
}

/// A rendering backend for one scheduler.
pub trait Stage {
    /// Container width.
    fn width(&self) -> f64;

    /// Container height.
    fn height(&self) -> f64;

    /// Attach a new element and return its rendered width.
    fn attach(&mut self, id: ElementId, content: &Content<'_>) -> f64;

    /// Place an attached element at its resting position.
    fn anchor(&mut self, id: ElementId, anchor: Anchor);

    /// Start moving an element.
    fn transition(&mut self, id: ElementId, transition: Transition);

    /// Draw an element above its neighbors (hover).
    fn raise(&mut self, _id: ElementId, _raised: bool) {}

    /// Detach an element.
    fn remove(&mut self, id: ElementId);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_interpolates_linearly() {
        let motion = Transition::new(0.0, -100.0, Duration::from_secs(1), Duration::from_secs(4));

        assert!((motion.offset_at(Duration::ZERO) - 0.0).abs() < 1e-9);
        assert!((motion.offset_at(Duration::from_secs(2)) + 25.0).abs() < 1e-9);
        assert!((motion.offset_at(Duration::from_secs(3)) + 50.0).abs() < 1e-9);
        assert!((motion.offset_at(Duration::from_secs(9)) + 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_hold_is_frozen() {
        let hold = Transition::hold(-42.0, Duration::from_secs(3));
        assert!(hold.is_frozen());
        assert!((hold.offset_at(Duration::from_secs(1)) + 42.0).abs() < 1e-9);
        assert!((hold.offset_at(Duration::from_secs(30)) + 42.0).abs() < 1e-9);
    }

    #[test]
    fn test_rgb_from_hex() {
        assert_eq!(Rgb::from_u32(0x00FF_5500), Rgb::new(255, 85, 0));
        assert_eq!(format!("{:?}", Rgb::new(1, 2, 255)), "#0102ff");
    }
}
