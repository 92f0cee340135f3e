//! Composition contract for the export path
//!
//! The pixel and encoder work lives behind [`CompositorBackend`]: a drawing
//! surface, an audio graph, and a continuous recorder owned by exactly one
//! export at a time. The engine-side geometry (cover fit) is pure math and
//! unit-tested here; everything device-specific is the backend's problem.

use std::collections::HashSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::{CoreError, CoreResult, SceneId, Size2D};

// =============================================================================
// Export Settings
// =============================================================================

/// Fixed output parameters for the compiled ad.
///
/// Quality is not adaptive: the bitrate stays constant regardless of scene
/// content or source resolution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSettings {
    /// Output surface width in pixels
    pub width: u32,
    /// Output surface height in pixels
    pub height: u32,
    /// Capture rate in frames per second
    pub fps: u32,
    /// Video bitrate in bits per second
    pub video_bitrate_bps: u32,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fps: 30,
            video_bitrate_bps: 2_500_000,
        }
    }
}

impl ExportSettings {
    pub fn surface(&self) -> Size2D {
        Size2D::new(self.width, self.height)
    }

    /// Validates the settings fields
    pub fn validate(&self) -> Result<(), String> {
        if self.surface().is_degenerate() {
            return Err(format!(
                "Output surface {}x{} is degenerate",
                self.width, self.height
            ));
        }
        if self.fps == 0 {
            return Err("Capture rate must be at least 1 fps".to_string());
        }
        if self.video_bitrate_bps == 0 {
            return Err("Video bitrate must be non-zero".to_string());
        }
        Ok(())
    }
}

// =============================================================================
// Recording Format Selection
// =============================================================================

/// Recording container formats in preference order
pub const RECORDING_FORMAT_PRIORITY: [&str; 3] = [
    "video/webm;codecs=vp9,opus",
    "video/webm;codecs=vp8,opus",
    "video/webm",
];

/// Picks the first recording format the backend supports.
///
/// Runs before any scene is processed so an unsupported host fails fast
/// instead of after minutes of compositing.
pub fn select_recording_format(backend: &dyn CompositorBackend) -> CoreResult<String> {
    RECORDING_FORMAT_PRIORITY
        .iter()
        .find(|mime| backend.supports_format(mime))
        .map(|mime| mime.to_string())
        .ok_or_else(|| {
            CoreError::RecorderUnsupported(format!(
                "None of [{}] are recordable on this host",
                RECORDING_FORMAT_PRIORITY.join(", ")
            ))
        })
}

// =============================================================================
// Cover-Fit Geometry
// =============================================================================

/// Placement of a decoded frame on the output surface, in surface pixels
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameLayout {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Scales a frame to cover the surface completely.
///
/// Uses the larger of the two axis ratios, so overflow on the other axis is
/// cropped evenly from both sides. The surface is never letterboxed and the
/// frame is never stretched non-uniformly. Degenerate frame dimensions fall
/// back to a full-surface rect.
pub fn cover_fit(frame: Size2D, surface: Size2D) -> FrameLayout {
    if frame.is_degenerate() || surface.is_degenerate() {
        return FrameLayout {
            x: 0.0,
            y: 0.0,
            width: surface.width as f64,
            height: surface.height as f64,
        };
    }

    let scale_x = surface.width as f64 / frame.width as f64;
    let scale_y = surface.height as f64 / frame.height as f64;
    let scale = scale_x.max(scale_y);

    let width = frame.width as f64 * scale;
    let height = frame.height as f64 * scale;
    FrameLayout {
        x: (surface.width as f64 - width) / 2.0,
        y: (surface.height as f64 - height) / 2.0,
        width,
        height,
    }
}

// =============================================================================
// Compositor Backend
// =============================================================================

/// One scene's worth of work handed to the backend
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneRenderRequest {
    pub scene_id: SceneId,
    /// 1-based position in the compiled ad
    pub position: usize,
    pub video_url: String,
    pub audio_url: String,
}

/// Device-facing half of the export path.
///
/// Contract for implementors:
/// - `begin` acquires the surface, audio graph and recorder once per export;
///   the recorder runs continuously across scenes,
/// - `composite_scene` loads both sources, waits for readiness, starts them
///   in lockstep, draws the current video frame with cover fit on every
///   capture tick, and returns when the scene's **audio** ends (the video
///   loops as filler underneath a longer voiceover), then detaches the
///   sources; a fetch/decode failure returns `MediaLoad`,
/// - `finish` stops the recorder and yields the encoded container bytes,
/// - `teardown` releases everything and must be safe to call at any point,
///   including after a failed `begin` or `composite_scene`.
#[async_trait]
pub trait CompositorBackend: Send {
    /// True when the backend can record the given MIME type
    fn supports_format(&self, mime_type: &str) -> bool;

    /// Acquires the surface and starts a continuous recording session
    async fn begin(&mut self, settings: &ExportSettings, mime_type: &str) -> CoreResult<()>;

    /// Plays one scene through the surface and audio graph
    async fn composite_scene(&mut self, request: &SceneRenderRequest) -> CoreResult<()>;

    /// Stops the recorder and returns the encoded bytes
    async fn finish(&mut self) -> CoreResult<Vec<u8>>;

    /// Releases the surface, audio graph and recorder
    async fn teardown(&mut self);
}

// =============================================================================
// Mock Backend
// =============================================================================

/// Deterministic in-memory backend for sequencer tests
pub struct MockCompositorBackend {
    supported_formats: Vec<String>,
    load_failures: HashSet<SceneId>,
    output: Vec<u8>,
    begun_mime: Option<String>,
    composited: Vec<SceneId>,
    finished: bool,
    torn_down: bool,
    events: Vec<String>,
}

impl Default for MockCompositorBackend {
    fn default() -> Self {
        Self {
            supported_formats: RECORDING_FORMAT_PRIORITY
                .iter()
                .map(|m| m.to_string())
                .collect(),
            load_failures: HashSet::new(),
            output: b"webm-bytes".to_vec(),
            begun_mime: None,
            composited: Vec::new(),
            finished: false,
            torn_down: false,
            events: Vec::new(),
        }
    }
}

impl MockCompositorBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the formats the support probe accepts
    pub fn with_supported_formats(mut self, formats: &[&str]) -> Self {
        self.supported_formats = formats.iter().map(|m| m.to_string()).collect();
        self
    }

    /// Makes `composite_scene` fail with `MediaLoad` for the given scene
    pub fn with_load_failure(mut self, scene_id: SceneId) -> Self {
        self.load_failures.insert(scene_id);
        self
    }

    /// Replaces the encoded bytes returned by `finish`
    pub fn with_output(mut self, bytes: Vec<u8>) -> Self {
        self.output = bytes;
        self
    }

    /// Scene ids composited so far, in call order
    pub fn composited_scene_ids(&self) -> Vec<SceneId> {
        self.composited.clone()
    }

    pub fn begun_mime(&self) -> Option<String> {
        self.begun_mime.clone()
    }

    pub fn was_finished(&self) -> bool {
        self.finished
    }

    pub fn was_torn_down(&self) -> bool {
        self.torn_down
    }

    fn record(&mut self, event: impl Into<String>) {
        self.events.push(event.into());
    }

    /// Call trace, for ordering assertions
    pub fn events(&self) -> Vec<String> {
        self.events.clone()
    }
}

#[async_trait]
impl CompositorBackend for MockCompositorBackend {
    fn supports_format(&self, mime_type: &str) -> bool {
        self.supported_formats.iter().any(|m| m == mime_type)
    }

    async fn begin(&mut self, settings: &ExportSettings, mime_type: &str) -> CoreResult<()> {
        settings
            .validate()
            .map_err(CoreError::ValidationError)?;
        self.begun_mime = Some(mime_type.to_string());
        self.record(format!("begin:{}", mime_type));
        Ok(())
    }

    async fn composite_scene(&mut self, request: &SceneRenderRequest) -> CoreResult<()> {
        if self.load_failures.contains(&request.scene_id) {
            self.record(format!("load_failed:{}", request.scene_id));
            return Err(CoreError::MediaLoad(format!(
                "Could not decode {}",
                request.video_url
            )));
        }
        self.composited.push(request.scene_id);
        self.record(format!("composite:{}", request.scene_id));
        Ok(())
    }

    async fn finish(&mut self) -> CoreResult<Vec<u8>> {
        self.finished = true;
        self.record("finish");
        Ok(self.output.clone())
    }

    async fn teardown(&mut self) {
        self.torn_down = true;
        self.record("teardown");
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Cover-Fit Tests
    // =========================================================================

    #[test]
    fn test_cover_fit_matching_aspect_fills_exactly() {
        let layout = cover_fit(Size2D::new(1920, 1080), Size2D::new(1280, 720));
        assert_eq!(
            layout,
            FrameLayout {
                x: 0.0,
                y: 0.0,
                width: 1280.0,
                height: 720.0
            }
        );
    }

    #[test]
    fn test_cover_fit_wide_frame_crops_sides() {
        // 32:9 frame on a 16:9 surface: height governs, width overflows.
        let layout = cover_fit(Size2D::new(2560, 720), Size2D::new(1280, 720));
        assert_eq!(layout.height, 720.0);
        assert_eq!(layout.width, 2560.0);
        assert_eq!(layout.x, (1280.0 - 2560.0) / 2.0);
        assert_eq!(layout.y, 0.0);
    }

    #[test]
    fn test_cover_fit_tall_frame_crops_top_and_bottom() {
        // 9:16 portrait frame on a 16:9 surface: width governs.
        let layout = cover_fit(Size2D::new(720, 1280), Size2D::new(1280, 720));
        assert_eq!(layout.width, 1280.0);
        assert!((layout.height - 2275.555).abs() < 0.01);
        assert_eq!(layout.x, 0.0);
        assert!(layout.y < 0.0);
        // Overflow is split evenly between top and bottom.
        assert!((layout.y * 2.0 + layout.height - 720.0).abs() < 1e-9);
    }

    #[test]
    fn test_cover_fit_never_letterboxes() {
        let surface = Size2D::new(1280, 720);
        for frame in [
            Size2D::new(640, 480),
            Size2D::new(3840, 2160),
            Size2D::new(1000, 1000),
        ] {
            let layout = cover_fit(frame, surface);
            assert!(layout.width >= surface.width as f64 - 1e-9);
            assert!(layout.height >= surface.height as f64 - 1e-9);
        }
    }

    #[test]
    fn test_cover_fit_degenerate_frame_fills_surface() {
        let layout = cover_fit(Size2D::new(0, 1080), Size2D::new(1280, 720));
        assert_eq!(
            layout,
            FrameLayout {
                x: 0.0,
                y: 0.0,
                width: 1280.0,
                height: 720.0
            }
        );
    }

    // =========================================================================
    // Settings Tests
    // =========================================================================

    #[test]
    fn test_default_settings_are_720p30_fixed_bitrate() {
        let settings = ExportSettings::default();
        assert_eq!(settings.width, 1280);
        assert_eq!(settings.height, 720);
        assert_eq!(settings.fps, 30);
        assert_eq!(settings.video_bitrate_bps, 2_500_000);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_settings_validation_rejects_degenerate() {
        let mut settings = ExportSettings::default();
        settings.height = 0;
        assert!(settings.validate().is_err());

        let mut settings = ExportSettings::default();
        settings.fps = 0;
        assert!(settings.validate().is_err());
    }

    // =========================================================================
    // Format Selection Tests
    // =========================================================================

    #[test]
    fn test_format_selection_prefers_vp9() {
        let backend = MockCompositorBackend::new();
        let mime = select_recording_format(&backend).unwrap();
        assert_eq!(mime, "video/webm;codecs=vp9,opus");
    }

    #[test]
    fn test_format_selection_falls_back_in_priority_order() {
        let backend =
            MockCompositorBackend::new().with_supported_formats(&["video/webm;codecs=vp8,opus"]);
        assert_eq!(
            select_recording_format(&backend).unwrap(),
            "video/webm;codecs=vp8,opus"
        );

        let backend = MockCompositorBackend::new().with_supported_formats(&["video/webm"]);
        assert_eq!(select_recording_format(&backend).unwrap(), "video/webm");
    }

    #[test]
    fn test_format_selection_fails_without_support() {
        let backend = MockCompositorBackend::new().with_supported_formats(&[]);
        assert!(matches!(
            select_recording_format(&backend),
            Err(CoreError::RecorderUnsupported(_))
        ));
    }
}
