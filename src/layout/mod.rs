//! Layout module: stage areas and lane geometry.
//!
//! Lanes are computed once when a scheduler is built. There is no tree
//! traversal at render time, only arithmetic on the lane index.

mod lanes;
mod rect;

pub use lanes::LaneGeometry;
pub use rect::Rect;
