//! Contract between the engine and the media collaborator
//!
//! The engine never decodes or renders anything. A host supplies a
//! [`MediaFactory`] that creates [`MediaHandle`]s inside its presentation
//! layer; each handle reports what happens to it by emitting
//! [`MediaSignal`]s into the [`SignalSink`] it was attached to. The sink only
//! enqueues, so a handle may emit from any thread. The player drains the
//! queue on its own thread in `process_signals`.

use crossbeam_channel::Sender;
use seamline_config::Preload;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Failure reported by the media collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct MediaError {
    pub message: String,
}

impl MediaError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Identifies one handle for the lifetime of a player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct HandleId(pub u64);

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handle#{}", self.0)
    }
}

/// Everything a handle can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaSignal {
    /// Enough data is available to start playback
    CanPlay,
    Ended,
    Error,
    Play,
    Pause,
    TimeUpdate,
    Progress,
}

impl MediaSignal {
    pub const ALL: [MediaSignal; 7] = [
        Self::CanPlay,
        Self::Ended,
        Self::Error,
        Self::Play,
        Self::Pause,
        Self::TimeUpdate,
        Self::Progress,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalEnvelope {
    pub handle: HandleId,
    pub signal: MediaSignal,
}

/// Where a handle delivers its signals
///
/// Goes quiet once the owning [`Subscription`] is dropped.
#[derive(Debug, Clone)]
pub struct SignalSink {
    handle: HandleId,
    sender: Sender<SignalEnvelope>,
    active: Arc<AtomicBool>,
}

impl SignalSink {
    /// Queues a signal; returns false if the binding is gone
    pub fn emit(&self, signal: MediaSignal) -> bool {
        if !self.active.load(Ordering::Acquire) {
            return false;
        }
        self.sender
            .send(SignalEnvelope {
                handle: self.handle,
                signal,
            })
            .is_ok()
    }

    pub fn handle(&self) -> HandleId {
        self.handle
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

/// Scoped binding between a handle and the player's signal queue
#[derive(Debug)]
pub struct Subscription {
    handle: HandleId,
    active: Arc<AtomicBool>,
}

impl Subscription {
    pub fn handle(&self) -> HandleId {
        self.handle
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.active.store(false, Ordering::Release);
    }
}

/// Attaches a fresh sink to `handle`
pub fn bind(
    handle: &mut dyn MediaHandle,
    id: HandleId,
    sender: Sender<SignalEnvelope>,
) -> Subscription {
    let active = Arc::new(AtomicBool::new(true));
    handle.attach(SignalSink {
        handle: id,
        sender,
        active: Arc::clone(&active),
    });
    Subscription { handle: id, active }
}

/// What the factory needs to create a handle
#[derive(Debug, Clone, PartialEq)]
pub struct LoadRequest {
    pub url: String,
    pub segment_index: usize,
    pub preload: Preload,
    pub container: Option<String>,
    pub duration_secs: f64,
    /// Whether the handle starts out as the visible one
    pub current: bool,
}

/// One media element in the presentation layer
pub trait MediaHandle {
    fn attach(&mut self, sink: SignalSink);

    /// Starts playback; the platform may refuse (autoplay policy and the like)
    fn play(&mut self) -> Result<(), MediaError>;

    fn pause(&mut self);

    fn is_paused(&self) -> bool;

    /// Moves the local position, in seconds from the start of the segment
    fn seek(&mut self, offset_secs: f64);

    fn current_time(&self) -> f64;

    fn duration(&self) -> Option<f64>;

    /// End of the buffered range that contains the current position
    fn buffered_end(&self) -> Option<f64>;

    fn playback_rate(&self) -> f64;

    fn set_playback_rate(&mut self, rate: f64);

    fn set_volume(&mut self, volume: f64);

    /// Distinguishes a real decode/network failure from an incidental one
    fn has_media_error(&self) -> bool;

    /// Marks the handle as the sole visible one, or hides it
    fn set_current(&mut self, current: bool);
}

/// Creates handles in, and removes them from, the presentation layer
pub trait MediaFactory {
    /// Inserts a new handle next to any existing ones
    fn create(&mut self, request: &LoadRequest) -> Result<Box<dyn MediaHandle>, MediaError>;

    fn remove(&mut self, handle: Box<dyn MediaHandle>);
}
