//! Domain types for Seamline
//!
//! - `common`: timestamps, durations, clock formatting and the `Validator` trait
//! - `segment`: raw segment descriptors supplied by a recording source

mod common;
mod segment;

pub use common::{format_clock, Duration, Timestamp, Validator};
pub use segment::SegmentDescriptor;
