//! Time Mapper: resolves a virtual second to a segment, a gap, or nothing

use crate::timeline::{Gap, Segment, Timeline};

/// Result of resolving one virtual second
#[derive(Debug, Clone, PartialEq)]
pub enum Location<'a> {
    InSegment {
        segment: &'a Segment,
        local_offset_secs: f64,
    },
    InGap {
        gap: &'a Gap,
    },
    OutOfRange,
}

/// Exact lookup with closed intervals; segments are tested before gaps
///
/// No clamping happens here. A second that falls between segments but outside
/// every recorded gap, or outside the timeline, is `OutOfRange`.
pub fn locate(timeline: &Timeline, second: f64) -> Location<'_> {
    if let Some(segment) = timeline.segments().iter().find(|s| s.contains(second)) {
        return Location::InSegment {
            segment,
            local_offset_secs: second - segment.second_start,
        };
    }

    match timeline.gaps().iter().find(|g| g.contains(second)) {
        Some(gap) => Location::InGap { gap },
        None => Location::OutOfRange,
    }
}

/// Like [`locate`], but an untracked hole between segments resolves to
/// whatever comes next on the axis
///
/// Holes exist where idle time stayed under the gap deviation, plus the
/// millisecond slivers trimmed off both edges of every gap.
pub fn locate_forward(timeline: &Timeline, second: f64) -> Location<'_> {
    let exact = locate(timeline, second);
    if exact != Location::OutOfRange || !(0.0..=timeline.duration_secs() as f64).contains(&second)
    {
        return exact;
    }

    let Some(next) = timeline.next_segment_after(second) else {
        return Location::OutOfRange;
    };

    if let Some(gap) = timeline
        .gaps()
        .iter()
        .find(|g| g.second_start > second && g.second_start <= next.second_start)
    {
        return Location::InGap { gap };
    }

    Location::InSegment {
        segment: next,
        local_offset_secs: 0.0,
    }
}
