//! Command protocol for the danmaku actor.

use crate::batch::BatchItem;
use crate::stage::ElementId;
use crate::travel::CompletionCallback;
use std::time::Duration;

/// A request for the thread that owns the scheduler.
pub enum Command {
    /// Send a scrolling message.
    Send {
        /// Message body.
        body: String,
        /// Style class; falls back to the configured wrapper class.
        class: Option<String>,
        /// Called when the message finishes normally.
        on_complete: Option<CompletionCallback>,
    },
    /// Send a centered message.
    Centered {
        /// Message body.
        body: String,
        /// Style class.
        class: Option<String>,
        /// Hold time; the configured default when `None`.
        duration: Option<Duration>,
        /// Called when the hold expires.
        on_complete: Option<CompletionCallback>,
    },
    /// Start batch playback, replacing any running batch.
    Batch {
        /// Items in send order.
        items: Vec<BatchItem>,
        /// Style class for every item.
        class: Option<String>,
    },
    /// Stop batch playback.
    StopBatch,
    /// Resume everything.
    Play,
    /// Pause everything.
    Pause,
    /// Pointer entered an element.
    PointerEnter(ElementId),
    /// Pointer left an element.
    PointerLeave(ElementId),
    /// Stop the actor thread.
    Shutdown,
}

impl Command {
    /// A plain scrolling message.
    pub fn send(body: impl Into<String>) -> Self {
        Self::Send {
            body: body.into(),
            class: None,
            on_complete: None,
        }
    }

    /// A centered message with the default hold time.
    pub fn centered(body: impl Into<String>) -> Self {
        Self::Centered {
            body: body.into(),
            class: None,
            duration: None,
            on_complete: None,
        }
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Send { body, class, .. } => f
                .debug_struct("Send")
                .field("body", body)
                .field("class", class)
                .finish_non_exhaustive(),
            Self::Centered {
                body,
                class,
                duration,
                ..
            } => f
                .debug_struct("Centered")
                .field("body", body)
                .field("class", class)
                .field("duration", duration)
                .finish_non_exhaustive(),
            Self::Batch { items, class } => f
                .debug_struct("Batch")
                .field("items", &items.len())
                .field("class", class)
                .finish(),
            Self::StopBatch => f.write_str("StopBatch"),
            Self::Play => f.write_str("Play"),
            Self::Pause => f.write_str("Pause"),
            Self::PointerEnter(id) => f.debug_tuple("PointerEnter").field(id).finish(),
            Self::PointerLeave(id) => f.debug_tuple("PointerLeave").field(id).finish(),
            Self::Shutdown => f.write_str("Shutdown"),
        }
    }
}
