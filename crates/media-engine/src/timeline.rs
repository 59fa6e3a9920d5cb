//! Segment Index: the immutable virtual timeline built from raw descriptors
//!
//! Segment 0 starts at virtual second 0. Every later segment is placed at its
//! wall-clock distance from segment 0, so idle time between recordings stays
//! on the axis. Idle stretches longer than the gap deviation are recorded as
//! [`Gap`]s; shorter ones are left as untracked holes.

use crate::error::{EngineError, EngineResult};
use crate::mapper::{self, Location};
use seamline_core::{SegmentDescriptor, Timestamp, Validator};
use serde::Serialize;

/// One playable segment placed on the virtual timeline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    pub index: usize,
    pub timestamp: Timestamp,
    pub duration_secs: f64,
    pub url: String,
    pub second_start: f64,
    pub second_end: f64,
}

impl Segment {
    /// Closed-interval membership test
    pub fn contains(&self, second: f64) -> bool {
        self.second_start <= second && second <= self.second_end
    }

    /// Wall-clock time of a local offset inside this segment
    pub fn wall_clock_at(&self, local_offset_secs: f64) -> Timestamp {
        self.timestamp
            .offset_by((local_offset_secs * 1000.0).round() as i64)
    }
}

/// A span of the timeline with no backing segment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Gap {
    pub time_start: Timestamp,
    pub time_end: Timestamp,
    pub second_start: f64,
    pub second_end: f64,
}

impl Gap {
    pub fn contains(&self, second: f64) -> bool {
        self.second_start <= second && second <= self.second_end
    }

    pub fn duration_ms(&self) -> i64 {
        self.time_end.millis_since(self.time_start)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Timeline {
    segments: Vec<Segment>,
    gaps: Vec<Gap>,
    time_start: Timestamp,
    time_end: Timestamp,
    duration_secs: u64,
}

impl Timeline {
    /// Builds the timeline from descriptors sorted by timestamp
    ///
    /// Fails with `InvalidInput` on an empty list or a malformed descriptor,
    /// and with `OverlappingSegments` when a segment starts before the one
    /// before it has ended. Unsorted input surfaces as an overlap.
    pub fn build(raw: &[SegmentDescriptor], gap_deviation_ms: u64) -> EngineResult<Self> {
        let first = raw
            .first()
            .ok_or_else(|| EngineError::InvalidInput("segment list is empty".to_string()))?;

        let time_start = first.timestamp;
        let mut segments = Vec::with_capacity(raw.len());
        let mut gaps = Vec::new();
        let mut prev_end: Option<Timestamp> = None;

        for (index, descriptor) in raw.iter().enumerate() {
            if let Err(errors) = descriptor.validate() {
                return Err(EngineError::InvalidInput(format!(
                    "segment {}: {}",
                    index,
                    errors.join("; ")
                )));
            }

            let start = descriptor.timestamp;

            if let Some(prev_end) = prev_end {
                let idle_ms = start.millis_since(prev_end);
                if idle_ms < 0 {
                    return Err(EngineError::OverlappingSegments {
                        index,
                        overlap_ms: idle_ms.unsigned_abs(),
                    });
                }

                if idle_ms as u64 > gap_deviation_ms {
                    let gap_start = prev_end.offset_by(1);
                    let gap_end = start.offset_by(-1);
                    // A one millisecond hole has nothing left once both edges are trimmed
                    if gap_start <= gap_end {
                        gaps.push(Gap {
                            time_start: gap_start,
                            time_end: gap_end,
                            second_start: virtual_seconds(gap_start, time_start),
                            second_end: virtual_seconds(gap_end, time_start),
                        });
                    }
                }
            }

            let second_start = virtual_seconds(start, time_start);
            let duration_secs = descriptor.duration_ms as f64 / 1000.0;

            segments.push(Segment {
                index,
                timestamp: start,
                duration_secs,
                url: descriptor.url.clone(),
                second_start,
                second_end: second_start + duration_secs,
            });

            prev_end = Some(descriptor.end());
        }

        let time_end = prev_end.unwrap_or(time_start);
        let span_ms = time_end.millis_since(time_start).max(0) as u64;
        let duration_secs = span_ms.div_ceil(1000);

        log::debug!(
            "Built timeline: {} segments, {} gaps, {}s",
            segments.len(),
            gaps.len(),
            duration_secs
        );

        Ok(Self {
            segments,
            gaps,
            time_start,
            time_end,
            duration_secs,
        })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn segment(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    pub fn gaps(&self) -> &[Gap] {
        &self.gaps
    }

    pub fn time_start(&self) -> Timestamp {
        self.time_start
    }

    pub fn time_end(&self) -> Timestamp {
        self.time_end
    }

    /// Virtual length in whole seconds, rounded up
    pub fn duration_secs(&self) -> u64 {
        self.duration_secs
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// First segment that starts strictly after `second`
    pub fn next_segment_after(&self, second: f64) -> Option<&Segment> {
        self.segments.iter().find(|s| s.second_start > second)
    }

    /// Shorthand for [`mapper::locate`]
    pub fn locate(&self, second: f64) -> Location<'_> {
        mapper::locate(self, second)
    }

    /// Played share of the timeline for a virtual position, clamped to `[0, 1]`
    pub fn fraction_of(&self, second: f64) -> f64 {
        if self.duration_secs == 0 {
            return 0.0;
        }
        (second / self.duration_secs as f64).clamp(0.0, 1.0)
    }
}

fn virtual_seconds(at: Timestamp, origin: Timestamp) -> f64 {
    at.millis_since(origin) as f64 / 1000.0
}
