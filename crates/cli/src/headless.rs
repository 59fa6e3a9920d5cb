//! Headless playback over a simulated media backend
//!
//! Simulated handles report ready on the first step after creation (unless
//! they were created for a poster) and then advance their local time by the
//! step length while playing.

use seamline_config::{PlayerConfig, Preload};
use seamline_core::SegmentDescriptor;
use seamline_engine::{
    EngineResult, InstanceRegistry, LoadRequest, MediaError, MediaFactory, MediaHandle,
    MediaSignal, PlayerEvent, SeekOutcome, SegmentedPlayer, SignalSink,
};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::{Duration, Instant};

struct SimMedia {
    sink: Option<SignalSink>,
    preload: Preload,
    duration: f64,
    time: f64,
    rate: f64,
    paused: bool,
    ready: bool,
    ended: bool,
    removed: bool,
}

impl SimMedia {
    fn emit(&self, signal: MediaSignal) {
        if let Some(sink) = &self.sink {
            sink.emit(signal);
        }
    }

    fn step(&mut self, secs: f64) {
        if !self.ready && self.preload == Preload::Auto {
            self.ready = true;
            self.emit(MediaSignal::Progress);
            self.emit(MediaSignal::CanPlay);
            return;
        }
        if self.paused || self.ended {
            return;
        }

        self.time = (self.time + secs * self.rate).min(self.duration);
        self.emit(MediaSignal::TimeUpdate);
        if self.time >= self.duration {
            self.ended = true;
            self.paused = true;
            self.emit(MediaSignal::Ended);
        }
    }
}

struct SimHandle {
    media: Rc<RefCell<SimMedia>>,
}

impl MediaHandle for SimHandle {
    fn attach(&mut self, sink: SignalSink) {
        self.media.borrow_mut().sink = Some(sink);
    }

    fn play(&mut self) -> Result<(), MediaError> {
        self.media.borrow_mut().paused = false;
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
        media.time = offset_secs.clamp(0.0, media.duration);
        media.ended = false;
    }

    fn current_time(&self) -> f64 {
        self.media.borrow().time
    }

    fn duration(&self) -> Option<f64> {
        Some(self.media.borrow().duration)
    }

    fn buffered_end(&self) -> Option<f64> {
        let media = self.media.borrow();
        media.ready.then_some(media.duration)
    }

    fn playback_rate(&self) -> f64 {
        self.media.borrow().rate
    }

    fn set_playback_rate(&mut self, rate: f64) {
        self.media.borrow_mut().rate = rate;
    }

    fn set_volume(&mut self, _volume: f64) {}

    fn has_media_error(&self) -> bool {
        false
    }

    fn set_current(&mut self, _current: bool) {}
}

impl Drop for SimHandle {
    fn drop(&mut self) {
        self.media.borrow_mut().removed = true;
    }
}

/// Every handle a simulated factory has created
#[derive(Clone, Default)]
pub struct SimulatedBackend {
    handles: Rc<RefCell<Vec<Rc<RefCell<SimMedia>>>>>,
}

struct SimulatedFactory {
    handles: Rc<RefCell<Vec<Rc<RefCell<SimMedia>>>>>,
}

impl MediaFactory for SimulatedFactory {
    fn create(&mut self, request: &LoadRequest) -> Result<Box<dyn MediaHandle>, MediaError> {
        log::debug!("Simulating {} ({} preload)", request.url, request.preload);
        let media = Rc::new(RefCell::new(SimMedia {
            sink: None,
            preload: request.preload,
            duration: request.duration_secs,
            time: 0.0,
            rate: 1.0,
            paused: true,
            ready: false,
            ended: false,
            removed: false,
        }));
        self.handles.borrow_mut().push(Rc::clone(&media));
        Ok(Box::new(SimHandle { media }))
    }

    fn remove(&mut self, handle: Box<dyn MediaHandle>) {
        drop(handle);
    }
}

impl SimulatedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn factory(&self) -> Box<dyn MediaFactory> {
        Box::new(SimulatedFactory {
            handles: Rc::clone(&self.handles),
        })
    }

    /// Moves every live handle forward by `secs` of media time
    pub fn advance(&self, secs: f64) {
        self.handles.borrow_mut().retain(|m| !m.borrow().removed);
        let live: Vec<_> = self.handles.borrow().iter().map(Rc::clone).collect();
        for media in live {
            media.borrow_mut().step(secs);
        }
    }

    pub fn live(&self) -> usize {
        self.handles
            .borrow()
            .iter()
            .filter(|m| !m.borrow().removed)
            .count()
    }
}

#[derive(Debug, Clone)]
pub struct SimulationOptions {
    /// Seeks issued in order, each once playback is running again
    pub seeks: Vec<f64>,
    /// Start a second player first so the mutex has someone to pause
    pub mutex_peer: bool,
    pub step_secs: f64,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            seeks: Vec::new(),
            mutex_peer: false,
            step_secs: 1.0,
        }
    }
}

#[derive(Debug, Default)]
pub struct SimulationReport {
    pub events: Vec<PlayerEvent>,
    pub steps: usize,
    pub finished: bool,
    pub peer_paused: Option<bool>,
}

/// Plays the segments until the timeline ends or the step budget runs out
pub fn run<F>(
    segments: &[SegmentDescriptor],
    config: &PlayerConfig,
    options: &SimulationOptions,
    mut on_event: F,
) -> EngineResult<SimulationReport>
where
    F: FnMut(&PlayerEvent),
{
    let registry = InstanceRegistry::shared();

    let peer = if options.mutex_peer {
        let backend = SimulatedBackend::new();
        let peer = SegmentedPlayer::new(segments, config, &registry, backend.factory())?;
        peer.play()?;
        Some((peer, backend))
    } else {
        None
    };

    let backend = SimulatedBackend::new();
    let player = SegmentedPlayer::new(segments, config, &registry, backend.factory())?;
    let events = player.subscribe();
    player.play()?;

    let step = if options.step_secs > 0.0 {
        options.step_secs
    } else {
        1.0
    };
    let rounds = options.seeks.len() + 2;
    let max_steps = (player.timeline().duration_secs() as f64 / step).ceil() as usize * rounds + 64;

    let mut pending: VecDeque<f64> = options.seeks.iter().copied().collect();
    let mut report = SimulationReport::default();
    let started = Instant::now();

    for n in 0..max_steps {
        report.steps = n + 1;

        if let Some((peer, peer_backend)) = &peer {
            peer_backend.advance(step);
            peer.process_signals();
        }
        backend.advance(step);
        player.process_signals();
        player.tick(started + Duration::from_secs_f64(n as f64 * step));

        if !player.is_loading() && !player.is_paused() {
            if let Some(target) = pending.pop_front() {
                log::info!("Seeking to {}s", target);
                if player.seek(target)? == SeekOutcome::Gap {
                    player.play()?;
                }
            }
        }

        for event in events.try_iter() {
            on_event(&event);
            if event == PlayerEvent::Ended {
                report.finished = true;
            }
            report.events.push(event);
        }

        if report.finished {
            break;
        }
    }

    report.peer_paused = peer.as_ref().map(|(p, _)| p.is_paused());
    log::debug!(
        "Simulation stopped after {} steps with {} live handles",
        report.steps,
        backend.live()
    );
    Ok(report)
}
