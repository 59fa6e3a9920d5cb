//! Raw segment descriptors as supplied by a recording source

use crate::error::{AppError, Result};
use crate::types::{Duration, Timestamp, Validator};
use serde::{Deserialize, Serialize};

/// One recorded media unit, before it is placed on a virtual timeline
///
/// Serialized as `{"timestamp": <ms>, "durationMs": <ms>, "url": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentDescriptor {
    /// Wall-clock start of the recording
    pub timestamp: Timestamp,
    /// Recorded length
    pub duration_ms: u64,
    /// Location the media collaborator loads the segment from
    pub url: String,
}

impl SegmentDescriptor {
    pub fn new(timestamp_ms: i64, duration_ms: u64, url: impl Into<String>) -> Self {
        Self {
            timestamp: Timestamp::from_millis(timestamp_ms),
            duration_ms,
            url: url.into(),
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    /// Wall-clock end of the recording (exclusive)
    pub fn end(&self) -> Timestamp {
        self.timestamp
            .offset_by(i64::try_from(self.duration_ms).unwrap_or(i64::MAX))
    }

    /// Parses a JSON array of descriptors
    pub fn list_from_json(json: &str) -> Result<Vec<SegmentDescriptor>> {
        let list: Vec<SegmentDescriptor> =
            serde_json::from_str(json).map_err(|e| AppError::InvalidInput {
                reason: format!("segment list is not valid JSON: {}", e),
            })?;

        for (index, descriptor) in list.iter().enumerate() {
            if let Err(errors) = descriptor.validate() {
                return Err(AppError::InvalidInput {
                    reason: format!("segment {}: {}", index, errors.join("; ")),
                });
            }
        }

        Ok(list)
    }
}

impl Validator for SegmentDescriptor {
    fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.url.trim().is_empty() {
            errors.push("URL must not be empty".to_string());
        }

        if self.timestamp.as_millis() < 0 {
            errors.push("Timestamp must not precede the Unix epoch".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
