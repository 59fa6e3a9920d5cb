//! Transient text notices with auto-dismiss
//!
//! Only one notice is visible at a time. Showing another replaces the text
//! and its timer. Timers are fired by the host through `tick`.

use crate::events::PlayerEvent;
use std::time::{Duration, Instant};

/// How long a notice stays up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeDuration {
    /// The board's configured default
    Default,
    For(Duration),
    /// Until replaced or hidden
    Persistent,
}

#[derive(Debug, Clone)]
struct ActiveNotice {
    text: String,
    hide_at: Option<Instant>,
}

#[derive(Debug, Clone)]
pub struct NoticeBoard {
    default_duration: Duration,
    current: Option<ActiveNotice>,
}

impl NoticeBoard {
    pub fn new(default_duration: Duration) -> Self {
        Self {
            default_duration,
            current: None,
        }
    }

    pub fn show(
        &mut self,
        text: impl Into<String>,
        duration: NoticeDuration,
        now: Instant,
    ) -> PlayerEvent {
        let hide_at = match duration {
            NoticeDuration::Default => Some(now + self.default_duration),
            NoticeDuration::For(d) => Some(now + d),
            NoticeDuration::Persistent => None,
        };
        let text = text.into();
        self.current = Some(ActiveNotice {
            text: text.clone(),
            hide_at,
        });
        PlayerEvent::NoticeShow { text }
    }

    /// Hides the visible notice, if any
    pub fn hide(&mut self) -> Option<PlayerEvent> {
        self.current.take().map(|_| PlayerEvent::NoticeHide)
    }

    /// Hides the notice if its timer has run out
    pub fn tick(&mut self, now: Instant) -> Option<PlayerEvent> {
        let due = self
            .current
            .as_ref()
            .and_then(|n| n.hide_at)
            .is_some_and(|at| now >= at);
        if due {
            self.hide()
        } else {
            None
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.current.as_ref().map(|n| n.text.as_str())
    }

    /// When the visible notice is due to hide
    pub fn deadline(&self) -> Option<Instant> {
        self.current.as_ref().and_then(|n| n.hide_at)
    }
}
