//! Logical events published to UI plumbing

use crate::timeline::Gap;
use crossbeam_channel::{unbounded, Receiver, Sender};
use seamline_core::Timestamp;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PlayerEvent {
    Progress {
        loaded_fraction: f64,
    },
    TimeUpdate {
        position_secs: f64,
        played_fraction: f64,
        wall_clock: Timestamp,
    },
    Ended,
    Error {
        has_media_error: bool,
    },
    Play,
    Pause,
    NoticeShow {
        text: String,
    },
    NoticeHide,
    Resize,
    Destroy,
    SegmentChanged {
        index: usize,
    },
    GapReached {
        gap: Gap,
    },
}

impl PlayerEvent {
    /// Event name as UI plumbing knows it
    pub fn name(&self) -> &'static str {
        match self {
            Self::Progress { .. } => "progress",
            Self::TimeUpdate { .. } => "timeupdate",
            Self::Ended => "ended",
            Self::Error { .. } => "error",
            Self::Play => "play",
            Self::Pause => "pause",
            Self::NoticeShow { .. } => "notice_show",
            Self::NoticeHide => "notice_hide",
            Self::Resize => "resize",
            Self::Destroy => "destroy",
            Self::SegmentChanged { .. } => "segment_changed",
            Self::GapReached { .. } => "gap_reached",
        }
    }
}

/// Fan-out of player events to any number of receivers
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Vec<Sender<PlayerEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> Receiver<PlayerEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Delivers to every live receiver and forgets the disconnected ones
    pub fn emit(&mut self, event: PlayerEvent) {
        log::trace!("event: {}", event.name());
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Drops every sender so receivers observe disconnection
    pub fn close(&mut self) {
        self.subscribers.clear();
    }
}
