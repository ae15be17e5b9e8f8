//! Batch playback: send a list of messages on a fixed cadence.
//!
//! A thin wrapper over `send`. One item goes out per tick; the tick after
//! the last item completes the batch, which either ends playback or, with
//! looping enabled, starts the same list over.

use crate::timer::TimerId;

/// One message in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchItem {
    /// A plain body.
    Text(String),
    /// A body with an avatar, optionally linking somewhere.
    Avatar {
        /// Avatar glyph or image reference.
        avatar: String,
        /// Message text.
        content: String,
        /// Link target.
        url: Option<String>,
    },
}

impl BatchItem {
    /// Flatten the item into a message body.
    pub fn body(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Avatar {
                avatar,
                content,
                url: None,
            } => format!("{avatar} {content}"),
            Self::Avatar {
                avatar,
                content,
                url: Some(url),
            } => format!("{avatar} {content} <{url}>"),
        }
    }
}

impl From<&str> for BatchItem {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for BatchItem {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// What a batch tick should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchStep {
    /// Send this body.
    Send(String),
    /// Every item went out; the cursor is back at the start.
    Finished,
}

/// A running batch.
#[derive(Debug)]
pub struct BatchPlayback {
    items: Vec<BatchItem>,
    class: Option<String>,
    index: usize,
    /// Timer driving the cadence.
    pub timer: TimerId,
}

impl BatchPlayback {
    /// Start playback of `items` driven by `timer`.
    pub const fn new(items: Vec<BatchItem>, class: Option<String>, timer: TimerId) -> Self {
        Self {
            items,
            class,
            index: 0,
            timer,
        }
    }

    /// Class the batch sends with.
    pub fn class(&self) -> Option<&str> {
        self.class.as_deref()
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the batch has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Index of the next item to send.
    pub const fn position(&self) -> usize {
        self.index
    }

    /// Advance by one tick.
    pub fn step(&mut self) -> BatchStep {
        match self.items.get(self.index) {
            Some(item) => {
                self.index += 1;
                BatchStep::Send(item.body())
            }
            None => {
                self.index = 0;
                BatchStep::Finished
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::TimerQueue;
    use std::time::Duration;

    #[test]
    fn test_avatar_body() {
        let item = BatchItem::Avatar {
            avatar: "@".into(),
            content: "hi there".into(),
            url: None,
        };
        assert_eq!(item.body(), "@ hi there");

        let item = BatchItem::Avatar {
            avatar: "@".into(),
            content: "docs".into(),
            url: Some("https://example.com".into()),
        };
        assert_eq!(item.body(), "@ docs <https://example.com>");
    }

    #[test]
    fn test_steps_then_finishes_and_rewinds() {
        let mut timers: TimerQueue<()> = TimerQueue::new();
        let timer = timers.schedule_repeating(Duration::from_secs(1), ());
        let mut batch = BatchPlayback::new(vec!["one".into(), "two".into()], None, timer);

        assert_eq!(batch.step(), BatchStep::Send("one".into()));
        assert_eq!(batch.step(), BatchStep::Send("two".into()));
        assert_eq!(batch.step(), BatchStep::Finished);
        assert_eq!(batch.position(), 0);
        assert_eq!(batch.step(), BatchStep::Send("one".into()));
    }
}
