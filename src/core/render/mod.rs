//! Render Module
//!
//! The export path: composition contract, recording format selection, and
//! the scene sequencer that compiles a produced script into one continuous
//! recording.

pub mod compositor;
pub mod export;

pub use compositor::{
    cover_fit, select_recording_format, CompositorBackend, ExportSettings, FrameLayout,
    MockCompositorBackend, SceneRenderRequest, RECORDING_FORMAT_PRIORITY,
};
pub use export::{
    compiled_filename, scene_audio_filename, scene_video_filename, ExportEngine, ExportOutput,
    ExportProgress,
};
