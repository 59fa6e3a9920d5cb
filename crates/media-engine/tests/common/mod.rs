//! Scriptable in-memory media backend for integration tests
//!
//! Handles never emit on their own. Tests push signals explicitly with
//! `MockBackend::emit`, the way a real element would report readiness,
//! native control presses, or the end of a segment.

#![allow(dead_code)]

use crossbeam_channel::Receiver;
use seamline_engine::{
    LoadRequest, MediaError, MediaFactory, MediaHandle, MediaSignal, PlayerConfig, PlayerEvent,
    Preload, SignalSink,
};
use seamline_core::SegmentDescriptor;
use std::cell::RefCell;
use std::rc::Rc;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Debug)]
pub struct MockMedia {
    pub request: LoadRequest,
    pub sink: Option<SignalSink>,
    pub paused: bool,
    pub time: f64,
    pub rate: f64,
    pub volume: f64,
    pub current: bool,
    pub buffered: Option<f64>,
    pub media_error: bool,
    pub reject_play: bool,
    pub removed: bool,
    pub play_calls: usize,
    pub seeks: Vec<f64>,
}

struct MockHandle {
    media: Rc<RefCell<MockMedia>>,
}

impl MediaHandle for MockHandle {
    fn attach(&mut self, sink: SignalSink) {
        self.media.borrow_mut().sink = Some(sink);
    }

    fn play(&mut self) -> Result<(), MediaError> {
        let mut media = self.media.borrow_mut();
        media.play_calls += 1;
        if media.reject_play {
            return Err(MediaError::new("play() request was rejected"));
        }
        media.paused = false;
        Ok(())
    }

    fn pause(&mut self) {
        self.media.borrow_mut().paused = true;
    }

    fn is_paused(&self) -> bool {
        self.media.borrow().paused
    }

    fn seek(&mut self, offset_secs: f64) {
        let mut media = self.media.borrow_mut();
        media.time = offset_secs;
        media.seeks.push(offset_secs);
    }

    fn current_time(&self) -> f64 {
        self.media.borrow().time
    }

    fn duration(&self) -> Option<f64> {
        Some(self.media.borrow().request.duration_secs)
    }

    fn buffered_end(&self) -> Option<f64> {
        self.media.borrow().buffered
    }

    fn playback_rate(&self) -> f64 {
        self.media.borrow().rate
    }

    fn set_playback_rate(&mut self, rate: f64) {
        self.media.borrow_mut().rate = rate;
    }

    fn set_volume(&mut self, volume: f64) {
        self.media.borrow_mut().volume = volume;
    }

    fn has_media_error(&self) -> bool {
        self.media.borrow().media_error
    }

    fn set_current(&mut self, current: bool) {
        self.media.borrow_mut().current = current;
    }
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        self.media.borrow_mut().removed = true;
    }
}

#[derive(Default)]
struct BackendState {
    handles: Vec<Rc<RefCell<MockMedia>>>,
    fail_next: bool,
}

/// Shared view of every handle the factory created
#[derive(Clone, Default)]
pub struct MockBackend {
    state: Rc<RefCell<BackendState>>,
}

struct MockFactory {
    state: Rc<RefCell<BackendState>>,
}

impl MediaFactory for MockFactory {
    fn create(&mut self, request: &LoadRequest) -> Result<Box<dyn MediaHandle>, MediaError> {
        let mut state = self.state.borrow_mut();
        if state.fail_next {
            state.fail_next = false;
            return Err(MediaError::new("no decoder for this source"));
        }

        let media = Rc::new(RefCell::new(MockMedia {
            request: request.clone(),
            sink: None,
            paused: true,
            time: 0.0,
            rate: 1.0,
            volume: 1.0,
            current: request.current,
            buffered: None,
            media_error: false,
            reject_play: false,
            removed: false,
            play_calls: 0,
            seeks: Vec::new(),
        }));
        state.handles.push(Rc::clone(&media));
        Ok(Box::new(MockHandle { media }))
    }

    fn remove(&mut self, handle: Box<dyn MediaHandle>) {
        drop(handle);
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn factory(&self) -> Box<dyn MediaFactory> {
        Box::new(MockFactory {
            state: Rc::clone(&self.state),
        })
    }

    pub fn created(&self) -> usize {
        self.state.borrow().handles.len()
    }

    /// Handles still in the presentation layer
    pub fn live(&self) -> usize {
        self.state
            .borrow()
            .handles
            .iter()
            .filter(|h| !h.borrow().removed)
            .count()
    }

    pub fn handle(&self, n: usize) -> Rc<RefCell<MockMedia>> {
        Rc::clone(&self.state.borrow().handles[n])
    }

    pub fn latest(&self) -> Rc<RefCell<MockMedia>> {
        let state = self.state.borrow();
        Rc::clone(state.handles.last().expect("no handle created yet"))
    }

    /// Queues `signal` from handle `n`; false if its binding is gone
    pub fn emit(&self, n: usize, signal: MediaSignal) -> bool {
        let sink = self.handle(n).borrow().sink.clone();
        sink.map(|s| s.emit(signal)).unwrap_or(false)
    }

    pub fn emit_latest(&self, signal: MediaSignal) -> bool {
        self.emit(self.created() - 1, signal)
    }

    pub fn fail_next_create(&self) {
        self.state.borrow_mut().fail_next = true;
    }
}

/// Segments at 0s, 10s and 25s, each 8s long
pub fn three_segments() -> Vec<SegmentDescriptor> {
    vec![
        SegmentDescriptor::new(0, 8000, "cam/000.mp4"),
        SegmentDescriptor::new(10_000, 8000, "cam/010.mp4"),
        SegmentDescriptor::new(25_000, 8000, "cam/025.mp4"),
    ]
}

/// Defaults without a poster, so handle 0 is the first loaded segment
pub fn test_config() -> PlayerConfig {
    PlayerConfig {
        preload: Preload::None,
        ..PlayerConfig::default()
    }
}

pub fn drain(rx: &Receiver<PlayerEvent>) -> Vec<PlayerEvent> {
    rx.try_iter().collect()
}

pub fn names(events: &[PlayerEvent]) -> Vec<&'static str> {
    events.iter().map(|e| e.name()).collect()
}
