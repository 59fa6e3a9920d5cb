//! Core domain types and error taxonomy shared by the Seamline crates

pub mod error;
pub mod types;

pub use error::{AppError, ErrorSeverity, RecoveryAction, Result};
pub use types::{format_clock, Duration, SegmentDescriptor, Timestamp, Validator};
