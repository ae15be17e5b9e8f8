//! # Danmaku
//!
//! A lane scheduler for bullet-comment overlays.
//!
//! Messages fly right to left across a fixed number of horizontal lanes, or
//! sit centered in a lane for a while. The scheduler decides which lane each
//! message gets, when the lane can take the next one, and what happens to
//! messages that arrive while every lane is busy.
//!
//! ## Core Concepts
//!
//! - **Lanes**: each lane has a scrolling slot and a priority (centered) slot
//! - **Early release**: a lane frees once its message has moved a multiple of its width
//! - **Overflow**: saturated sends queue up and drain on a fixed cadence
//! - **Pause/resume**: frozen messages pick up where they stopped
//! - **Stages**: rendering is behind the [`Stage`] trait; a terminal backend ships
//!
//! ## Example
//!
//! ```rust,ignore
//! use danmaku::{Danmaku, DanmakuConfig, MemoryStage};
//! use std::time::Duration;
//!
//! let stage = MemoryStage::new(1280.0, 720.0);
//! let mut danmaku = Danmaku::new(stage, DanmakuConfig::default())?;
//!
//! danmaku.send("first!");
//! danmaku.centered_send("welcome");
//! danmaku.advance_by(Duration::from_secs(1));
//! ```

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod actor;
pub mod batch;
pub mod config;
pub mod error;
pub mod lane;
pub mod layout;
pub mod overflow;
pub mod scheduler;
pub mod stage;
pub mod timer;
pub mod travel;

// Re-exports for convenience
pub use actor::{Command, DanmakuActor};
pub use batch::BatchItem;
pub use config::DanmakuConfig;
pub use error::{ConfigError, Result};
pub use lane::{LaneKind, LaneRegistry};
pub use layout::{LaneGeometry, Rect};
pub use scheduler::{Danmaku, Placement};
pub use stage::{Anchor, Content, ElementId, MemoryStage, OutputBuffer, Rgb, Stage, TerminalStage, Transition};
pub use travel::{Completion, CompletionCallback, TravelState};
