//! Error types and recovery strategies for Seamline
//!
//! Errors are classified in three severity tiers:
//! - **Recoverable**: the caller can simply try again
//! - **Degraded**: one session or feature is unusable, the rest continues
//! - **Fatal**: nothing can be built from the input; the caller must fix it
//!
//! Playback never retries on its own. Media failures always end in
//! `RecoveryAction::UserIntervention`.

use std::fmt;
use std::io;
use thiserror::Error;

/// Recovery actions that can be taken when an error occurs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Retry the same operation (e.g. re-issue a dropped seek)
    Retry,
    /// Fall back to default values and continue
    UseDefaults,
    /// Reject the input; nothing to recover
    RejectInput,
    /// No automatic recovery - user intervention required
    UserIntervention,
}

impl fmt::Display for RecoveryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Retry => write!(f, "Retrying"),
            Self::UseDefaults => write!(f, "Falling back to defaults"),
            Self::RejectInput => write!(f, "Rejecting input"),
            Self::UserIntervention => write!(f, "User intervention required"),
        }
    }
}

/// Error severity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Error can be recovered from by trying again
    Recoverable,
    /// Session degraded but the application can continue
    Degraded,
    /// Input unusable; requires the caller to fix it
    Fatal,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recoverable => write!(f, "Recoverable"),
            Self::Degraded => write!(f, "Degraded"),
            Self::Fatal => write!(f, "Fatal"),
        }
    }
}

/// Main error type for Seamline
#[derive(Error, Debug)]
pub enum AppError {
    // ===== Timeline Input Errors =====
    /// Segment list empty or malformed
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    /// A segment starts before the previous one ends (or input is unsorted)
    #[error("Segment {index} overlaps the previous segment by {overlap_ms}ms")]
    OverlappingSegments { index: usize, overlap_ms: u64 },

    // ===== Media Errors =====
    /// The media collaborator failed to load or play a segment
    #[error("Media load failure for {url}: {message}")]
    MediaLoadFailure { url: String, message: String },

    // ===== Configuration Errors =====
    /// Invalid configuration
    #[error("Invalid configuration: {setting} = '{value}' ({reason})")]
    InvalidConfiguration {
        setting: String,
        value: String,
        reason: String,
    },

    // ===== Generic Errors =====
    /// Invalid argument provided
    #[error("Invalid argument: {argument} - {reason}")]
    InvalidArgument { argument: String, reason: String },

    /// Operation on a player that has been torn down
    #[error("Player destroyed: {operation}")]
    PlayerDestroyed { operation: String },

    /// General I/O error
    #[error("I/O error: {message}")]
    IoError {
        message: String,
        #[source]
        source: io::Error,
    },

    /// Generic internal error
    #[error("Internal error: {message}")]
    InternalError { message: String },
}

impl AppError {
    /// Returns the severity level of this error
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::InvalidArgument { .. } => ErrorSeverity::Recoverable,

            Self::MediaLoadFailure { .. }
            | Self::InvalidConfiguration { .. }
            | Self::PlayerDestroyed { .. }
            | Self::IoError { .. } => ErrorSeverity::Degraded,

            Self::InvalidInput { .. }
            | Self::OverlappingSegments { .. }
            | Self::InternalError { .. } => ErrorSeverity::Fatal,
        }
    }

    /// Returns the recommended recovery action for this error
    pub fn recovery_action(&self) -> RecoveryAction {
        match self {
            Self::InvalidArgument { .. } | Self::IoError { .. } => RecoveryAction::Retry,
            Self::InvalidConfiguration { .. } => RecoveryAction::UseDefaults,
            Self::InvalidInput { .. } | Self::OverlappingSegments { .. } => {
                RecoveryAction::RejectInput
            }
            Self::MediaLoadFailure { .. }
            | Self::PlayerDestroyed { .. }
            | Self::InternalError { .. } => RecoveryAction::UserIntervention,
        }
    }

    /// Returns a user-friendly error message suitable for display in the UI
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidInput { .. } => "The recording list could not be read.".to_string(),
            Self::OverlappingSegments { index, .. } => {
                format!("Recording {} overlaps the one before it.", index)
            }
            Self::MediaLoadFailure { .. } => "Video load failed".to_string(),
            Self::InvalidConfiguration { setting, .. } => {
                format!("Invalid setting: {}. Please check your configuration.", setting)
            }
            Self::InvalidArgument { .. } => "Invalid input provided.".to_string(),
            Self::PlayerDestroyed { .. } => "The player has been closed.".to_string(),
            Self::IoError { .. } => "A file operation failed. Please try again.".to_string(),
            Self::InternalError { .. } => {
                "An unexpected error occurred. Please try again.".to_string()
            }
        }
    }

    /// Returns true if this error should be logged at ERROR level
    pub fn is_critical(&self) -> bool {
        self.severity() == ErrorSeverity::Fatal
    }

    /// Returns true if retrying the same call can succeed
    pub fn is_retryable(&self) -> bool {
        self.recovery_action() == RecoveryAction::Retry
    }
}

/// Convenience type alias for Results using AppError
pub type Result<T> = std::result::Result<T, AppError>;

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        Self::IoError {
            message: err.to_string(),
            source: err,
        }
    }
}
