//! Playback Coordinator: one player over one virtual timeline
//!
//! Everything runs on the host's event loop thread. Media handles only queue
//! signals; the host drains them with [`SegmentedPlayer::process_signals`]
//! and fires timers with [`SegmentedPlayer::tick`]. Observers read
//! [`PlayerEvent`]s from the receivers handed out by
//! [`SegmentedPlayer::subscribe`].
//!
//! With the `mutex` option on, starting playback takes the registry token and
//! pauses every other registered player, including those built without the
//! option. Pausing, finishing, failing and destruction give the token back.

use crate::error::{EngineError, EngineResult};
use crate::events::{EventBus, PlayerEvent};
use crate::loader::{SegmentLoader, SwapOutcome};
use crate::mapper::{locate_forward, Location};
use crate::media::{MediaFactory, MediaSignal, SignalEnvelope};
use crate::notice::{NoticeBoard, NoticeDuration};
use crate::registry::{InstanceId, InstanceRegistry, Preemptible};
use crate::speed::Speed;
use crate::state::{PlaybackState, PlayerStatus};
use crate::timeline::{Gap, Timeline};
use crossbeam_channel::{unbounded, Receiver};
use seamline_config::{ConfigSection, PlayerConfig, Preload};
use seamline_core::{format_clock, SegmentDescriptor};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::{Duration, Instant};

const GAP_NOTICE: &str = "No footage";
const LOAD_FAILED_NOTICE: &str = "Video load failed";

/// What a seek ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekOutcome {
    /// The target is in the loaded segment; the handle was repositioned
    InPlace(usize),
    /// A swap to the target segment has started
    Swapping(usize),
    /// Dropped because a swap is already in flight
    Ignored,
    /// Landed in a gap; playback paused
    Gap,
    /// Outside the timeline; playback paused
    OutOfRange,
}

enum Target {
    Segment { index: usize, offset: f64, position: f64 },
    Gap(Gap),
    Nowhere,
}

pub struct SegmentedPlayer {
    shared: Rc<PlayerShared>,
}

struct PlayerShared {
    id: InstanceId,
    mutex: bool,
    timeline: Rc<Timeline>,
    registry: Rc<InstanceRegistry>,
    inner: RefCell<PlayerInner>,
}

struct PlayerInner {
    id: InstanceId,
    timeline: Rc<Timeline>,
    loop_playback: bool,
    loader: SegmentLoader,
    signals: Receiver<SignalEnvelope>,
    bus: EventBus,
    notices: NoticeBoard,
    state: PlaybackState,
}

impl SegmentedPlayer {
    /// Builds the timeline, registers with `registry` and, depending on the
    /// config, shows a poster and starts playing
    ///
    /// Invalid configuration and unusable segment lists are rejected here;
    /// nothing is registered in that case.
    pub fn new(
        descriptors: &[SegmentDescriptor],
        config: &PlayerConfig,
        registry: &Rc<InstanceRegistry>,
        factory: Box<dyn MediaFactory>,
    ) -> EngineResult<Self> {
        if let Err(errors) = config.validate() {
            let message = errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(EngineError::InvalidConfig(message));
        }

        let timeline = Rc::new(Timeline::build(descriptors, config.gap_deviation_ms)?);
        let (tx, rx) = unbounded();
        let mut loader = SegmentLoader::new(factory, tx, config.container.clone());

        if config.preload != Preload::None {
            if let Some(first) = timeline.segment(0) {
                if let Err(e) = loader.install_poster(first, config.preload, config.volume) {
                    log::warn!("Poster for {} unavailable: {}", first.url, e);
                }
            }
        }

        let notice_duration = Duration::from_millis(config.notice_duration_ms);
        let shared = Rc::new_cyclic(|weak: &Weak<PlayerShared>| {
            let peer: Weak<dyn Preemptible> = weak.clone();
            let id = registry.register(peer);
            PlayerShared {
                id,
                mutex: config.mutex,
                timeline: Rc::clone(&timeline),
                registry: Rc::clone(registry),
                inner: RefCell::new(PlayerInner {
                    id,
                    timeline: Rc::clone(&timeline),
                    loop_playback: config.loop_playback,
                    loader,
                    signals: rx,
                    bus: EventBus::new(),
                    notices: NoticeBoard::new(notice_duration),
                    state: PlaybackState::new(config.volume),
                }),
            }
        });

        log::info!(
            "{} ready: {} segments, {} gaps, {}",
            shared.id,
            timeline.len(),
            timeline.gaps().len(),
            format_clock(timeline.duration_secs() as f64)
        );

        let player = Self { shared };
        if config.autoplay {
            if let Err(e) = player.play() {
                log::warn!("{} autoplay failed: {}", player.id(), e);
            }
        }
        Ok(player)
    }

    /// Receiver for every event emitted from now on
    pub fn subscribe(&self) -> Receiver<PlayerEvent> {
        self.shared.inner.borrow_mut().bus.subscribe()
    }

    /// Resumes playback, loading the first segment if nothing is loaded
    ///
    /// Restarts from segment 0 once the timeline has been played to the end.
    /// From a gap, playback continues at the next segment.
    pub fn play(&self) -> EngineResult<()> {
        let mut inner = self.shared.inner.borrow_mut();
        inner.ensure_alive()?;
        self.shared.play_locked(&mut inner)
    }

    /// Pauses the current handle; calling it again changes nothing
    pub fn pause(&self) -> EngineResult<()> {
        let mut inner = self.shared.inner.borrow_mut();
        inner.ensure_alive()?;
        inner.pause_playback();
        self.shared.release_token();
        Ok(())
    }

    /// Plays or pauses depending on whether the current handle is paused
    ///
    /// While a swap is in flight the incoming handle has not started yet, so
    /// the player's own pause flag decides.
    pub fn toggle(&self) -> EngineResult<()> {
        let paused = {
            let inner = self.shared.inner.borrow();
            inner.ensure_alive()?;
            if inner.loader.is_loading() {
                inner.state.paused
            } else {
                inner.loader.media().map_or(true, |m| m.is_paused())
            }
        };
        if paused {
            self.play()
        } else {
            self.pause()
        }
    }

    /// Moves to a virtual second, clamped to the timeline
    pub fn seek(&self, second: f64) -> EngineResult<SeekOutcome> {
        let mut inner = self.shared.inner.borrow_mut();
        inner.ensure_alive()?;
        self.shared.seek_locked(&mut inner, second)
    }

    /// Sets the playback rate of the current handle only
    ///
    /// A later swap creates a handle at the default rate; callers re-apply.
    pub fn speed(&self, rate: f64) -> EngineResult<()> {
        let mut inner = self.shared.inner.borrow_mut();
        inner.ensure_alive()?;
        let speed = Speed::new(rate).map_err(|_| EngineError::InvalidSpeed(rate))?;
        let media = inner
            .loader
            .media_mut()
            .ok_or_else(|| {
                EngineError::InvalidState("no media handle to set speed on".to_string())
            })?;
        media.set_playback_rate(speed.value());
        log::debug!("{} speed set to {}", self.shared.id, speed);
        Ok(())
    }

    /// Clamps to `[0, 1]`, applies, and shows a `Volume n%` notice
    pub fn set_volume(&self, volume: f64) -> EngineResult<f64> {
        self.apply_volume(volume, true)
    }

    /// Like [`set_volume`](Self::set_volume) without the notice
    pub fn set_volume_quiet(&self, volume: f64) -> EngineResult<f64> {
        self.apply_volume(volume, false)
    }

    fn apply_volume(&self, volume: f64, announce: bool) -> EngineResult<f64> {
        let mut inner = self.shared.inner.borrow_mut();
        inner.ensure_alive()?;
        if volume.is_nan() {
            return Err(EngineError::InvalidState("volume is not a number".to_string()));
        }

        let volume = volume.clamp(0.0, 1.0);
        inner.state.volume = volume;
        if let Some(media) = inner.loader.media_mut() {
            media.set_volume(volume);
        }
        if announce {
            inner.notify(format!("Volume {:.0}%", volume * 100.0), NoticeDuration::Default);
        }
        Ok(volume)
    }

    /// Shows a notice; a later one replaces it
    pub fn notice(&self, text: &str, duration: NoticeDuration) -> EngineResult<()> {
        let mut inner = self.shared.inner.borrow_mut();
        inner.ensure_alive()?;
        inner.notify(text, duration);
        Ok(())
    }

    pub fn resize(&self) -> EngineResult<()> {
        let mut inner = self.shared.inner.borrow_mut();
        inner.ensure_alive()?;
        inner.bus.emit(PlayerEvent::Resize);
        Ok(())
    }

    /// Dispatches every queued media signal, returning how many were handled
    pub fn process_signals(&self) -> usize {
        let mut handled = 0;
        loop {
            let next = {
                let inner = self.shared.inner.borrow();
                if inner.state.destroyed {
                    break;
                }
                inner.signals.try_recv().ok()
            };
            let Some(envelope) = next else {
                break;
            };
            self.shared.dispatch(envelope);
            handled += 1;
        }
        handled
    }

    /// Fires due timers
    pub fn tick(&self, now: Instant) {
        let mut inner = self.shared.inner.borrow_mut();
        if inner.state.destroyed {
            return;
        }
        if let Some(event) = inner.notices.tick(now) {
            inner.bus.emit(event);
        }
    }

    /// Unregisters, pauses, and removes every handle; safe to call twice
    pub fn destroy(&self) {
        self.shared.destroy();
    }

    pub fn id(&self) -> InstanceId {
        self.shared.id
    }

    pub fn timeline(&self) -> &Timeline {
        &self.shared.timeline
    }

    pub fn status(&self) -> PlayerStatus {
        let inner = self.shared.inner.borrow();
        inner
            .state
            .status(inner.loader.current_segment(), inner.loader.is_loading())
    }

    /// Virtual position in seconds
    pub fn position(&self) -> f64 {
        self.shared.inner.borrow().state.position
    }

    pub fn played_fraction(&self) -> f64 {
        self.shared.inner.borrow().state.played
    }

    pub fn loaded_fraction(&self) -> f64 {
        self.shared.inner.borrow().state.loaded
    }

    pub fn current_segment(&self) -> Option<usize> {
        self.shared.inner.borrow().loader.current_segment()
    }

    pub fn is_paused(&self) -> bool {
        self.shared.inner.borrow().state.paused
    }

    pub fn is_loading(&self) -> bool {
        self.shared.inner.borrow().loader.is_loading()
    }

    pub fn volume(&self) -> f64 {
        self.shared.inner.borrow().state.volume
    }

    /// Text of the visible notice
    pub fn notice_text(&self) -> Option<String> {
        self.shared.inner.borrow().notices.text().map(str::to_string)
    }

    /// `position / duration` as UI clock text
    pub fn clock_text(&self) -> String {
        format!(
            "{} / {}",
            format_clock(self.position()),
            format_clock(self.shared.timeline.duration_secs() as f64)
        )
    }
}

impl Drop for SegmentedPlayer {
    fn drop(&mut self) {
        self.shared.destroy();
    }
}

impl fmt::Debug for SegmentedPlayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SegmentedPlayer")
            .field("id", &self.shared.id)
            .field("segments", &self.shared.timeline.len())
            .finish()
    }
}

impl PlayerShared {
    /// Takes the token and pauses every other live player
    fn claim_token(&self) {
        if !self.mutex {
            return;
        }
        self.registry.acquire(self.id);
        for peer in self.registry.peers(self.id) {
            peer.preempt();
        }
    }

    fn release_token(&self) {
        self.registry.release(self.id);
    }

    fn play_locked(&self, inner: &mut PlayerInner) -> EngineResult<()> {
        if let Some(gap) = inner.state.in_gap.clone() {
            match self.timeline.next_segment_after(gap.second_end) {
                Some(next) => {
                    self.seek_locked(inner, next.second_start)?;
                    return Ok(());
                }
                None => inner.leave_gap(),
            }
        }

        if inner.loader.is_loading() {
            self.claim_token();
            inner.set_paused(false);
            return Ok(());
        }

        match inner.loader.current_segment() {
            None => {
                self.claim_token();
                inner.set_paused(false);
                self.swap_locked(inner, 0, 0.0)?;
            }
            Some(_) if inner.state.finished || inner.state.at_end() => {
                log::debug!("{} restarting from the first segment", self.id);
                self.claim_token();
                inner.set_paused(false);
                self.swap_locked(inner, 0, 0.0)?;
            }
            Some(index) if inner.state.media_failed => {
                let offset = self
                    .timeline
                    .segment(index)
                    .map_or(0.0, |s| (inner.state.position - s.second_start).max(0.0));
                self.claim_token();
                inner.set_paused(false);
                self.swap_locked(inner, index, offset)?;
            }
            Some(_) => {
                self.claim_token();
                inner.set_paused(false);
                if !inner.start_current() {
                    self.release_token();
                }
            }
        }
        Ok(())
    }

    fn seek_locked(&self, inner: &mut PlayerInner, second: f64) -> EngineResult<SeekOutcome> {
        let target = second.clamp(0.0, self.timeline.duration_secs() as f64);

        let resolved = match locate_forward(&self.timeline, target) {
            Location::InSegment {
                segment,
                local_offset_secs,
            } => Target::Segment {
                index: segment.index,
                offset: local_offset_secs,
                position: segment.second_start + local_offset_secs,
            },
            Location::InGap { gap } => Target::Gap(gap.clone()),
            Location::OutOfRange => Target::Nowhere,
        };

        match resolved {
            Target::Nowhere => {
                log::debug!("{} seek to {} is out of range", self.id, second);
                inner.pause_playback();
                self.release_token();
                Ok(SeekOutcome::OutOfRange)
            }
            Target::Gap(gap) => {
                log::debug!(
                    "{} seek to {:.3}s landed in a gap of {}ms",
                    self.id,
                    target,
                    gap.duration_ms()
                );
                inner.pause_playback();
                self.release_token();
                inner.update_position(target);
                inner.notify(GAP_NOTICE, NoticeDuration::Persistent);
                inner.state.in_gap = Some(gap.clone());
                inner.bus.emit(PlayerEvent::GapReached { gap });
                Ok(SeekOutcome::Gap)
            }
            Target::Segment {
                index,
                offset,
                position,
            } => {
                let in_place =
                    inner.loader.current_segment() == Some(index) && !inner.state.media_failed;
                if !in_place && inner.loader.is_loading() {
                    log::debug!("{} seek to {:.3}s dropped, swap in flight", self.id, target);
                    return Ok(SeekOutcome::Ignored);
                }

                inner.leave_gap();
                inner.seek_notice(position);
                inner.state.finished = false;
                self.claim_token();
                inner.set_paused(false);

                if in_place {
                    if let Some(media) = inner.loader.media_mut() {
                        media.seek(offset);
                    }
                    inner.update_position(position);
                    if !inner.loader.is_loading() && !inner.start_current() {
                        self.release_token();
                    }
                    return Ok(SeekOutcome::InPlace(index));
                }

                match self.swap_locked(inner, index, offset)? {
                    SwapOutcome::Started(_) => Ok(SeekOutcome::Swapping(index)),
                    SwapOutcome::Rejected => Ok(SeekOutcome::Ignored),
                }
            }
        }
    }

    /// Starts a swap; a factory failure leaves the player paused with a notice
    fn swap_locked(
        &self,
        inner: &mut PlayerInner,
        index: usize,
        offset: f64,
    ) -> EngineResult<SwapOutcome> {
        match inner.swap(index, offset) {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                log::warn!("{} could not load segment {}: {}", self.id, index, e);
                inner.pause_playback();
                self.release_token();
                inner.bus.emit(PlayerEvent::Error {
                    has_media_error: true,
                });
                inner.notify(LOAD_FAILED_NOTICE, NoticeDuration::Persistent);
                Err(e)
            }
        }
    }

    fn dispatch(&self, envelope: SignalEnvelope) {
        let mut inner = self.inner.borrow_mut();
        if inner.loader.current_id() != Some(envelope.handle) {
            log::trace!(
                "{} dropping stale {:?} from {}",
                self.id,
                envelope.signal,
                envelope.handle
            );
            return;
        }

        match envelope.signal {
            MediaSignal::CanPlay => {
                let completed = inner.loader.complete(envelope.handle);
                if completed && !inner.state.paused && !inner.start_current() {
                    self.release_token();
                }
            }
            MediaSignal::Ended => self.on_segment_ended(&mut inner),
            MediaSignal::Error => self.on_media_error(&mut inner),
            MediaSignal::Play => {
                // A handle paused since it queued this echo is not being played by the user
                let handle_playing = inner.loader.media().is_some_and(|m| !m.is_paused());
                if handle_playing && inner.state.paused && !inner.loader.is_loading() {
                    if let Err(e) = self.play_locked(&mut inner) {
                        log::warn!("{} native play failed: {}", self.id, e);
                    }
                }
            }
            MediaSignal::Pause => {
                if !inner.state.paused && !inner.loader.is_loading() {
                    inner.pause_playback();
                    self.release_token();
                }
            }
            MediaSignal::TimeUpdate => inner.on_time_update(),
            MediaSignal::Progress => inner.on_progress(),
        }
    }

    fn on_segment_ended(&self, inner: &mut PlayerInner) {
        let Some(index) = inner.loader.current_segment() else {
            return;
        };
        if inner.loader.is_loading() {
            return;
        }

        let next = if index + 1 < self.timeline.len() {
            Some(index + 1)
        } else if inner.loop_playback {
            Some(0)
        } else {
            None
        };

        match next {
            Some(next) => {
                log::debug!("{} segment {} ended, continuing with {}", self.id, index, next);
                self.claim_token();
                inner.set_paused(false);
                if let Err(e) = self.swap_locked(inner, next, 0.0) {
                    log::warn!("{} stopped after segment {}: {}", self.id, index, e);
                }
            }
            None => {
                log::info!("{} reached the end of the timeline", self.id);
                inner.pause_playback();
                self.release_token();
                inner.state.finished = true;
                inner.state.position = self.timeline.segment(index).map_or(0.0, |s| s.second_end);
                inner.state.played = 1.0;
                inner.bus.emit(PlayerEvent::Ended);
            }
        }
    }

    fn on_media_error(&self, inner: &mut PlayerInner) {
        let has_media_error = inner.loader.media().is_some_and(|m| m.has_media_error());
        inner.bus.emit(PlayerEvent::Error { has_media_error });
        if !has_media_error {
            log::debug!("{} incidental media error ignored", self.id);
            return;
        }

        log::warn!(
            "{} media failure on segment {:?}",
            self.id,
            inner.loader.current_segment()
        );
        inner.state.media_failed = true;
        if inner.loader.is_loading() {
            inner.loader.abort();
        }
        inner.pause_playback();
        self.release_token();
        inner.notify(LOAD_FAILED_NOTICE, NoticeDuration::Persistent);
    }

    fn destroy(&self) {
        let Ok(mut inner) = self.inner.try_borrow_mut() else {
            log::error!("{} destroyed while busy, teardown skipped", self.id);
            return;
        };
        if inner.state.destroyed {
            return;
        }

        self.registry.unregister(self.id);
        inner.pause_playback();
        inner.loader.teardown();
        inner.notices.hide();
        inner.state.destroyed = true;
        inner.bus.emit(PlayerEvent::Destroy);
        inner.bus.close();
        log::info!("{} destroyed", self.id);
    }
}

impl Preemptible for PlayerShared {
    fn preempt(&self) {
        match self.inner.try_borrow_mut() {
            Ok(mut inner) => {
                if inner.state.destroyed {
                    return;
                }
                if !inner.state.paused {
                    log::debug!("{} preempted", self.id);
                }
                inner.pause_playback();
            }
            Err(_) => log::warn!("{} busy, could not be preempted", self.id),
        }
    }
}

impl PlayerInner {
    fn ensure_alive(&self) -> EngineResult<()> {
        if self.state.destroyed {
            Err(EngineError::Destroyed)
        } else {
            Ok(())
        }
    }

    /// Flips the logical pause flag, emitting only on a real transition
    fn set_paused(&mut self, paused: bool) {
        if self.state.paused == paused {
            return;
        }
        self.state.paused = paused;
        self.bus.emit(if paused {
            PlayerEvent::Pause
        } else {
            PlayerEvent::Play
        });
    }

    fn pause_playback(&mut self) {
        if let Some(media) = self.loader.media_mut() {
            media.pause();
        }
        self.set_paused(true);
    }

    /// Plays the current handle; a refusal pauses the player
    fn start_current(&mut self) -> bool {
        let Some(media) = self.loader.media_mut() else {
            return false;
        };
        match media.play() {
            Ok(()) => true,
            Err(e) => {
                log::warn!("{} play request rejected: {}", self.id, e);
                self.pause_playback();
                false
            }
        }
    }

    fn swap(&mut self, index: usize, offset: f64) -> EngineResult<SwapOutcome> {
        let segment = self
            .timeline
            .segment(index)
            .cloned()
            .ok_or_else(|| EngineError::InvalidState(format!("no segment {}", index)))?;

        let outcome = self.loader.swap_to(&segment, offset, self.state.volume)?;
        if let SwapOutcome::Started(_) = outcome {
            self.state.media_failed = false;
            self.state.finished = false;
            self.update_position(segment.second_start + offset);
            self.bus.emit(PlayerEvent::SegmentChanged { index });
        }
        Ok(outcome)
    }

    fn update_position(&mut self, position: f64) {
        self.state.position = position;
        self.state.played = self.timeline.fraction_of(position);
    }

    fn leave_gap(&mut self) {
        if self.state.in_gap.take().is_some() {
            if let Some(event) = self.notices.hide() {
                self.bus.emit(event);
            }
        }
    }

    fn notify(&mut self, text: impl Into<String>, duration: NoticeDuration) {
        let event = self.notices.show(text, duration, Instant::now());
        self.bus.emit(event);
    }

    fn seek_notice(&mut self, target: f64) {
        let delta = target - self.state.position;
        if delta > 0.0 {
            self.notify(format!("FF {:.0} s", delta), NoticeDuration::Default);
        } else if delta < 0.0 {
            self.notify(format!("REW {:.0} s", -delta), NoticeDuration::Default);
        }
    }

    fn on_time_update(&mut self) {
        if self.state.in_gap.is_some() {
            return;
        }
        let Some(index) = self.loader.current_segment() else {
            return;
        };
        let Some(local) = self.loader.media().map(|m| m.current_time()) else {
            return;
        };
        let Some((position, wall_clock)) = self
            .timeline
            .segment(index)
            .map(|s| (s.second_start + local, s.wall_clock_at(local)))
        else {
            return;
        };

        self.update_position(position);
        self.bus.emit(PlayerEvent::TimeUpdate {
            position_secs: position,
            played_fraction: self.state.played,
            wall_clock,
        });
    }

    fn on_progress(&mut self) {
        let Some(index) = self.loader.current_segment() else {
            return;
        };
        let Some(start) = self.timeline.segment(index).map(|s| s.second_start) else {
            return;
        };
        let buffered = self
            .loader
            .media()
            .and_then(|m| m.buffered_end())
            .unwrap_or(0.0);

        let loaded_fraction = self.timeline.fraction_of(start + buffered);
        self.state.loaded = loaded_fraction;
        self.bus.emit(PlayerEvent::Progress { loaded_fraction });
    }
}
