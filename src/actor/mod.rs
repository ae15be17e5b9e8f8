//! Actor Model: run a scheduler on its own thread.
//!
//! The scheduler is single-threaded and driven by `advance_to`. This module
//! wraps it in an actor that owns it, maps wall-clock time onto its clock
//! and takes requests over a crossbeam channel:
//!
//! ```text
//! ┌──────────────┐      Command       ┌──────────────────┐
//! │  App / Input │ ─────────────────▶ │ Danmaku thread   │
//! └──────────────┘                    │  advance_to(now) │
//!                                     │  apply(command)  │
//!                                     │  on_frame(&d)    │ ──▶ render
//!                                     └──────────────────┘
//! ```

mod driver;
mod messages;

pub use driver::DanmakuActor;
pub use messages::Command;
