//! Player configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How eagerly the initial (poster) media handle fetches its segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preload {
    /// Do not create a handle until playback is requested
    None,
    /// Fetch only enough to know dimensions and duration
    #[default]
    Metadata,
    /// Fetch as much as the media collaborator allows
    Auto,
}

impl fmt::Display for Preload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Metadata => write!(f, "metadata"),
            Self::Auto => write!(f, "auto"),
        }
    }
}

/// Every option a player instance recognizes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlayerConfig {
    /// Presentation container the media factory inserts handles into
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,

    /// Restart from the first segment when the last one ends
    #[serde(rename = "loop")]
    pub loop_playback: bool,

    /// Initial volume (0.0 - 1.0)
    pub volume: f64,

    /// Preload policy for the poster handle
    pub preload: Preload,

    /// Pause other registered players when this one starts playing
    pub mutex: bool,

    /// Idle time between two segments above which a gap is recorded
    pub gap_deviation_ms: u64,

    /// Start loading and playing as soon as the player is constructed
    pub autoplay: bool,

    /// How long transient notices stay visible
    pub notice_duration_ms: u64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            container: None,
            loop_playback: false,
            volume: 0.7,
            preload: Preload::Metadata,
            mutex: true,
            gap_deviation_ms: 3000,
            autoplay: false,
            notice_duration_ms: 2000,
        }
    }
}

impl ConfigSection for PlayerConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut results = vec![
            Validator::in_range(self.volume, 0.0..=1.0, "player.volume"),
            Validator::in_range(self.gap_deviation_ms, 0..=3_600_000, "player.gap_deviation_ms"),
            Validator::in_range(self.notice_duration_ms, 0..=60_000, "player.notice_duration_ms"),
        ];

        if let Some(ref container) = self.container {
            results.push(Validator::not_empty(container, "player.container"));
        }

        Validator::collect_errors(results)
    }

    fn merge(&mut self, other: Self) {
        if other.container.is_some() {
            self.container = other.container;
        }
        self.loop_playback = other.loop_playback;
        self.volume = other.volume;
        self.preload = other.preload;
        self.mutex = other.mutex;
        self.gap_deviation_ms = other.gap_deviation_ms;
        self.autoplay = other.autoplay;
        self.notice_duration_ms = other.notice_duration_ms;
    }

    fn section_name(&self) -> &'static str {
        "player"
    }
}
