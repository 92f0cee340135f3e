//! Scene Timeline
//!
//! Derived mapping from scene order to global time: per-scene start offsets
//! as a running sum of scene durations, plus the total duration. The
//! timeline is a pure function of the scene list and is recomputed whenever
//! the list changes; it is never persisted.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::script::Scene;
use crate::core::{TimeRange, TimeSec};

// =============================================================================
// Playhead Position
// =============================================================================

/// A global time resolved into scene-relative coordinates
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayheadPosition {
    /// 0-based scene index
    pub scene_index: usize,
    /// Offset in seconds within that scene
    pub local_offset: TimeSec,
}

impl PlayheadPosition {
    pub fn new(scene_index: usize, local_offset: TimeSec) -> Self {
        Self {
            scene_index,
            local_offset,
        }
    }
}

// =============================================================================
// Scene Timeline
// =============================================================================

/// Per-scene start offsets and total duration for an ordered scene list
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneTimeline {
    start_offsets: Vec<TimeSec>,
    durations: Vec<TimeSec>,
    total_duration: TimeSec,
}

impl SceneTimeline {
    /// Builds the timeline for an ordered scene list
    pub fn from_scenes(scenes: &[Scene]) -> Self {
        Self::from_durations(scenes.iter().map(|s| s.estimated_duration))
    }

    /// Builds the timeline from raw durations.
    ///
    /// Negative or non-finite durations are treated as zero-width segments.
    pub fn from_durations<I>(durations: I) -> Self
    where
        I: IntoIterator<Item = TimeSec>,
    {
        let mut start_offsets = Vec::new();
        let mut clean = Vec::new();
        let mut running = 0.0;

        for duration in durations {
            let duration = if duration.is_finite() && duration >= 0.0 {
                duration
            } else {
                warn!("Invalid scene duration {}, treating as 0", duration);
                0.0
            };
            start_offsets.push(running);
            clean.push(duration);
            running += duration;
        }

        Self {
            start_offsets,
            durations: clean,
            total_duration: running,
        }
    }

    /// Number of scenes on the timeline
    pub fn scene_count(&self) -> usize {
        self.durations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.durations.is_empty()
    }

    /// Global start offset of a scene
    pub fn start_offset(&self, scene_index: usize) -> Option<TimeSec> {
        self.start_offsets.get(scene_index).copied()
    }

    /// Duration of a scene
    pub fn duration(&self, scene_index: usize) -> Option<TimeSec> {
        self.durations.get(scene_index).copied()
    }

    /// Sum of all scene durations
    pub fn total_duration(&self) -> TimeSec {
        self.total_duration
    }

    /// Global [start, end] range of a scene
    pub fn scene_bounds(&self, scene_index: usize) -> Option<TimeRange> {
        let start = self.start_offset(scene_index)?;
        let duration = self.duration(scene_index)?;
        Some(TimeRange::new(start, start + duration))
    }

    /// Resolves a global time into (scene index, local offset).
    ///
    /// The scene index is the greatest index whose start offset is at or
    /// before the global time, so a time exactly on a boundary belongs to
    /// the scene that starts there. Times outside [0, total] clamp: negative
    /// to the start, past-the-end to the last scene pinned at its full
    /// duration.
    pub fn resolve(&self, global_time: TimeSec) -> PlayheadPosition {
        if self.durations.is_empty() {
            return PlayheadPosition::new(0, 0.0);
        }
        if !global_time.is_finite() || global_time <= 0.0 {
            return PlayheadPosition::new(0, 0.0);
        }

        let last = self.durations.len() - 1;
        if global_time >= self.total_duration {
            return PlayheadPosition::new(last, self.durations[last]);
        }

        let scene_index = self
            .start_offsets
            .iter()
            .rposition(|&start| start <= global_time)
            .unwrap_or(0);
        PlayheadPosition::new(scene_index, global_time - self.start_offsets[scene_index])
    }

    /// Maps (scene index, local offset) back to a global time, clamped into
    /// the scene's bounds. The inverse of [`resolve`](Self::resolve).
    pub fn global_time(&self, scene_index: usize, local_offset: TimeSec) -> TimeSec {
        if self.durations.is_empty() {
            return 0.0;
        }
        let scene_index = scene_index.min(self.durations.len() - 1);
        let local = local_offset.clamp(0.0, self.durations[scene_index]);
        self.start_offsets[scene_index] + local
    }

    /// Progress through the whole ad as a percentage in [0, 100].
    ///
    /// A zero-length timeline reports 0 rather than NaN.
    pub fn progress_percent(&self, global_time: TimeSec) -> f64 {
        if self.total_duration <= 0.0 {
            return 0.0;
        }
        ((global_time / self.total_duration) * 100.0).clamp(0.0, 100.0)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn timeline(durations: &[TimeSec]) -> SceneTimeline {
        SceneTimeline::from_durations(durations.iter().copied())
    }

    // =========================================================================
    // Offset Computation Tests
    // =========================================================================

    #[test]
    fn test_offsets_are_running_sums() {
        let tl = timeline(&[10.0, 12.0, 8.0]);
        assert_eq!(tl.start_offset(0), Some(0.0));
        assert_eq!(tl.start_offset(1), Some(10.0));
        assert_eq!(tl.start_offset(2), Some(22.0));
        assert_eq!(tl.total_duration(), 30.0);
        assert_eq!(tl.scene_count(), 3);
    }

    #[test]
    fn test_from_scenes_matches_from_durations() {
        let scenes = vec![
            Scene::new(1, "One", "a", 10.0),
            Scene::new(2, "Two", "b", 12.0),
            Scene::new(3, "Three", "c", 8.0),
        ];
        assert_eq!(SceneTimeline::from_scenes(&scenes), timeline(&[10.0, 12.0, 8.0]));
    }

    #[test]
    fn test_empty_timeline() {
        let tl = timeline(&[]);
        assert!(tl.is_empty());
        assert_eq!(tl.total_duration(), 0.0);
        assert_eq!(tl.resolve(5.0), PlayheadPosition::new(0, 0.0));
        assert_eq!(tl.progress_percent(5.0), 0.0);
        assert_eq!(tl.global_time(3, 2.0), 0.0);
    }

    #[test]
    fn test_invalid_durations_become_zero_width() {
        let tl = timeline(&[10.0, -5.0, 8.0]);
        assert_eq!(tl.duration(1), Some(0.0));
        assert_eq!(tl.total_duration(), 18.0);
    }

    // =========================================================================
    // resolve() Tests
    // =========================================================================

    #[test]
    fn test_resolve_interior_points() {
        let tl = timeline(&[10.0, 12.0, 8.0]);
        assert_eq!(tl.resolve(0.0), PlayheadPosition::new(0, 0.0));
        assert_eq!(tl.resolve(9.9), PlayheadPosition::new(0, 9.9));
        assert_eq!(tl.resolve(29.999), PlayheadPosition::new(2, 7.999));
    }

    #[test]
    fn test_resolve_boundary_belongs_to_later_scene() {
        let tl = timeline(&[10.0, 12.0, 8.0]);
        assert_eq!(tl.resolve(10.0), PlayheadPosition::new(1, 0.0));
        assert_eq!(tl.resolve(22.0), PlayheadPosition::new(2, 0.0));
    }

    #[test]
    fn test_resolve_clamps_out_of_range() {
        let tl = timeline(&[10.0, 12.0, 8.0]);
        assert_eq!(tl.resolve(-1.0), PlayheadPosition::new(0, 0.0));
        assert_eq!(tl.resolve(30.0), PlayheadPosition::new(2, 8.0));
        assert_eq!(tl.resolve(1000.0), PlayheadPosition::new(2, 8.0));
    }

    #[test]
    fn test_resolve_skips_zero_width_scene_at_boundary() {
        // A zero-duration scene shares its boundary with the next scene;
        // the later scene wins the tie.
        let tl = timeline(&[10.0, 0.0, 10.0]);
        assert_eq!(tl.resolve(10.0), PlayheadPosition::new(2, 0.0));
    }

    #[test]
    fn test_resolve_scrub_midpoint() {
        let tl = timeline(&[10.0, 10.0, 10.0]);
        assert_eq!(tl.resolve(15.0), PlayheadPosition::new(1, 5.0));
        assert_eq!(tl.progress_percent(15.0), 50.0);
    }

    // =========================================================================
    // Inverse Mapping Tests
    // =========================================================================

    #[test]
    fn test_global_time_inverse_of_resolve() {
        let tl = timeline(&[10.0, 12.0, 8.0]);
        for t in [0.0, 3.5, 10.0, 15.0, 22.0, 29.0] {
            let pos = tl.resolve(t);
            assert_eq!(tl.global_time(pos.scene_index, pos.local_offset), t);
        }
    }

    #[test]
    fn test_global_time_clamps_inputs() {
        let tl = timeline(&[10.0, 12.0, 8.0]);
        assert_eq!(tl.global_time(99, 4.0), 26.0); // index clamps to last scene
        assert_eq!(tl.global_time(1, 100.0), 22.0); // offset clamps to duration
        assert_eq!(tl.global_time(1, -5.0), 10.0);
    }

    // =========================================================================
    // Percentage Tests
    // =========================================================================

    #[test]
    fn test_progress_percent_bounds() {
        let tl = timeline(&[10.0, 12.0, 8.0]);
        assert_eq!(tl.progress_percent(0.0), 0.0);
        assert_eq!(tl.progress_percent(15.0), 50.0);
        assert_eq!(tl.progress_percent(30.0), 100.0);
        assert_eq!(tl.progress_percent(45.0), 100.0);
        assert_eq!(tl.progress_percent(-5.0), 0.0);
    }

    #[test]
    fn test_progress_percent_zero_total_is_zero_not_nan() {
        let tl = timeline(&[0.0, 0.0]);
        assert_eq!(tl.progress_percent(0.0), 0.0);
        assert_eq!(tl.progress_percent(10.0), 0.0);
    }

    // =========================================================================
    // Bounds Tests
    // =========================================================================

    #[test]
    fn test_scene_bounds() {
        let tl = timeline(&[10.0, 12.0, 8.0]);
        let bounds = tl.scene_bounds(1).unwrap();
        assert_eq!(bounds.start_sec, 10.0);
        assert_eq!(bounds.end_sec, 22.0);
        assert!(tl.scene_bounds(3).is_none());
    }
}
