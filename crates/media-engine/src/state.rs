//! Per-player playback state

use crate::timeline::Gap;
use serde::Serialize;

/// Where a player sits in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "segment", rename_all = "snake_case")]
pub enum PlayerStatus {
    /// Nothing loaded yet (a poster may be showing)
    Idle,
    Loading(usize),
    Playing(usize),
    Paused(usize),
    /// Stopped on a seek into a gap
    GapPaused,
    Destroyed,
}

impl PlayerStatus {
    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing(_))
    }
}

#[derive(Debug, Clone)]
pub struct PlaybackState {
    /// Logical pause flag. A swap that completes while this is set does not start playback.
    pub paused: bool,
    /// Virtual position in seconds
    pub position: f64,
    pub played: f64,
    pub loaded: f64,
    pub volume: f64,
    pub in_gap: Option<Gap>,
    /// The current handle reported a media error; the next play or seek reloads it
    pub media_failed: bool,
    pub finished: bool,
    pub destroyed: bool,
}

impl PlaybackState {
    pub fn new(volume: f64) -> Self {
        Self {
            paused: true,
            position: 0.0,
            played: 0.0,
            loaded: 0.0,
            volume,
            in_gap: None,
            media_failed: false,
            finished: false,
            destroyed: false,
        }
    }

    /// Derives the lifecycle status from the flags plus the loader's view
    pub fn status(&self, segment: Option<usize>, loading: bool) -> PlayerStatus {
        if self.destroyed {
            return PlayerStatus::Destroyed;
        }
        if self.in_gap.is_some() {
            return PlayerStatus::GapPaused;
        }
        match segment {
            None => PlayerStatus::Idle,
            Some(index) if loading => PlayerStatus::Loading(index),
            Some(index) if self.paused => PlayerStatus::Paused(index),
            Some(index) => PlayerStatus::Playing(index),
        }
    }

    /// True once playback reached the end of the timeline
    pub fn at_end(&self) -> bool {
        self.played >= 0.999
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::new(0.7)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seamline_core::Timestamp;

    #[test]
    fn test_initial_state_is_idle_and_paused() {
        let state = PlaybackState::new(0.5);
        assert!(state.paused);
        assert_eq!(state.status(None, false), PlayerStatus::Idle);
    }

    #[test]
    fn test_status_derivation() {
        let mut state = PlaybackState::default();
        assert_eq!(state.status(Some(2), true), PlayerStatus::Loading(2));
        assert_eq!(state.status(Some(2), false), PlayerStatus::Paused(2));

        state.paused = false;
        assert_eq!(state.status(Some(2), false), PlayerStatus::Playing(2));
        assert!(state.status(Some(2), false).is_playing());
    }

    #[test]
    fn test_gap_and_destroyed_take_priority() {
        let mut state = PlaybackState::default();
        state.in_gap = Some(Gap {
            time_start: Timestamp::from_millis(1001),
            time_end: Timestamp::from_millis(4999),
            second_start: 1.001,
            second_end: 4.999,
        });
        assert_eq!(state.status(Some(0), false), PlayerStatus::GapPaused);

        state.destroyed = true;
        assert_eq!(state.status(Some(0), false), PlayerStatus::Destroyed);
    }

    #[test]
    fn test_at_end_threshold() {
        let mut state = PlaybackState::default();
        state.played = 0.9989;
        assert!(!state.at_end());
        state.played = 0.999;
        assert!(state.at_end());
    }
}
