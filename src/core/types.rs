//! AdGenius Core Type Definitions
//!
//! Defines fundamental types used throughout the engine.

use serde::{Deserialize, Serialize};
use tracing::warn;

// =============================================================================
// ID Types
// =============================================================================

/// Scene identifier, unique within a script (stable ordering key)
pub type SceneId = u32;

/// Project unique identifier (UUID v4)
pub type ProjectId = String;

/// Generation job identifier (provider-assigned)
pub type JobId = String;

// =============================================================================
// Time Types
// =============================================================================

/// Time in seconds (floating point)
pub type TimeSec = f64;

/// Time range within the global timeline
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    pub start_sec: TimeSec,
    pub end_sec: TimeSec,
}

impl TimeRange {
    pub fn new(start_sec: TimeSec, end_sec: TimeSec) -> Self {
        if start_sec > end_sec {
            warn!(
                "TimeRange created with start > end ({} > {}), swapping",
                start_sec, end_sec
            );
            return Self {
                start_sec: end_sec,
                end_sec: start_sec,
            };
        }
        Self { start_sec, end_sec }
    }

    /// Returns duration in seconds
    pub fn duration(&self) -> TimeSec {
        self.end_sec - self.start_sec
    }

    /// Checks if a given time is within range
    pub fn contains(&self, time: TimeSec) -> bool {
        time >= self.start_sec && time <= self.end_sec
    }
}

// =============================================================================
// Spatial Types
// =============================================================================

/// 2D pixel size for surfaces and decoded frames
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size2D {
    pub width: u32,
    pub height: u32,
}

impl Size2D {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns width/height, or 0.0 for a degenerate size
    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            return 0.0;
        }
        self.width as f64 / self.height as f64
    }

    /// True when either dimension is zero
    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_range_swaps_inverted_bounds() {
        let range = TimeRange::new(10.0, 5.0);
        assert_eq!(range.start_sec, 5.0);
        assert_eq!(range.end_sec, 10.0);
        assert_eq!(range.duration(), 5.0);
    }

    #[test]
    fn test_time_range_contains() {
        let range = TimeRange::new(10.0, 20.0);
        assert!(range.contains(10.0));
        assert!(range.contains(15.0));
        assert!(range.contains(20.0));
        assert!(!range.contains(9.999));
        assert!(!range.contains(20.001));
    }

    #[test]
    fn test_size_aspect_ratio() {
        assert_eq!(Size2D::new(1280, 720).aspect_ratio(), 1280.0 / 720.0);
        assert_eq!(Size2D::new(100, 0).aspect_ratio(), 0.0);
    }

    #[test]
    fn test_size_degenerate() {
        assert!(Size2D::new(0, 720).is_degenerate());
        assert!(Size2D::new(1280, 0).is_degenerate());
        assert!(!Size2D::new(1280, 720).is_degenerate());
    }

    #[test]
    fn test_size_serialization() {
        let size = Size2D::new(1280, 720);
        let json = serde_json::to_string(&size).unwrap();
        assert!(json.contains("\"width\":1280"));
        let back: Size2D = serde_json::from_str(&json).unwrap();
        assert_eq!(back, size);
    }
}
