//! Engine error kinds and the bridge into the application taxonomy

use seamline_core::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// Segment list empty or malformed
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A segment starts before the previous one ends. Reported for unsorted input too.
    #[error("Segment {index} overlaps the previous segment by {overlap_ms}ms")]
    OverlappingSegments { index: usize, overlap_ms: u64 },

    /// The media factory could not create a handle for a segment
    #[error("Media load failure for {url}: {reason}")]
    MediaLoadFailure { url: String, reason: String },

    #[error("Invalid speed: {0}")]
    InvalidSpeed(f64),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Player has been destroyed")]
    Destroyed,
}

impl EngineError {
    /// True for every kind that rejects the segment list at construction
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_) | Self::OverlappingSegments { .. }
        )
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidInput(reason) => AppError::InvalidInput { reason },
            EngineError::OverlappingSegments { index, overlap_ms } => {
                AppError::OverlappingSegments { index, overlap_ms }
            }
            EngineError::MediaLoadFailure { url, reason } => AppError::MediaLoadFailure {
                url,
                message: reason,
            },
            EngineError::InvalidSpeed(rate) => AppError::InvalidArgument {
                argument: "speed".to_string(),
                reason: format!("{} is not a usable playback rate", rate),
            },
            EngineError::InvalidConfig(reason) => AppError::InvalidConfiguration {
                setting: "player".to_string(),
                value: String::new(),
                reason,
            },
            EngineError::InvalidState(message) => AppError::InternalError { message },
            EngineError::Destroyed => AppError::PlayerDestroyed {
                operation: "player call after destroy".to_string(),
            },
        }
    }
}
