//! Export Engine
//!
//! Compiles a produced script into a single downloadable ad. Scenes are
//! composited strictly in script order into one continuous recording; a
//! scene without completed assets is skipped with a warning, while a load
//! failure on an eligible scene aborts the whole export. Partial output is
//! worse than none.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::Sender;
use tracing::{debug, info, warn};

use crate::core::assets::AssetBoard;
use crate::core::render::compositor::{
    select_recording_format, CompositorBackend, ExportSettings, SceneRenderRequest,
};
use crate::core::script::Scene;
use crate::core::{CoreError, CoreResult, SceneId};

// =============================================================================
// Types
// =============================================================================

/// Export progress update, sent after each scene settles
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportProgress {
    /// Scenes settled so far (composited or skipped)
    pub completed_scenes: usize,
    /// Total scenes in the script
    pub total_scenes: usize,
    /// Progress percentage (0-100)
    pub percent: f32,
    /// Current status message
    pub message: String,
}

/// Compiled export result
#[derive(Clone, Debug)]
pub struct ExportOutput {
    /// Encoded container bytes
    pub bytes: Vec<u8>,
    /// Container MIME type the recorder produced
    pub mime_type: String,
    /// Scene ids that made it into the output, in order
    pub scenes_composited: Vec<SceneId>,
    /// Scene ids skipped for missing assets
    pub scenes_skipped: Vec<SceneId>,
    /// Total encoding time in seconds
    pub encoding_time_sec: f64,
}

impl ExportOutput {
    /// Writes the encoded bytes to disk atomically (temp file + rename)
    pub async fn write_to(&self, path: &Path) -> CoreResult<()> {
        let path = path.to_path_buf();
        let bytes = self.bytes.clone();
        tokio::task::spawn_blocking(move || atomic_write_bytes(&path, &bytes))
            .await
            .map_err(|e| CoreError::Internal(format!("Export write task failed: {}", e)))?
    }
}

// =============================================================================
// Filename Helpers
// =============================================================================

/// Download filename for the compiled ad: the title with every
/// non-alphanumeric run replaced by underscores, lowercased.
pub fn compiled_filename(title: &str) -> String {
    let sanitized: String = title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("{}_full.webm", sanitized)
}

/// Fallback download name for one scene's video track (1-based position)
pub fn scene_video_filename(position: usize) -> String {
    format!("scene_{}_video.mp4", position)
}

/// Fallback download name for one scene's audio track (1-based position)
pub fn scene_audio_filename(position: usize) -> String {
    format!("scene_{}_audio.wav", position)
}

// =============================================================================
// Export Engine
// =============================================================================

/// Sequences scenes through a compositor backend into one recording
pub struct ExportEngine {
    settings: ExportSettings,
}

impl Default for ExportEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ExportEngine {
    pub fn new() -> Self {
        Self {
            settings: ExportSettings::default(),
        }
    }

    pub fn with_settings(settings: ExportSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    /// Compiles the given scenes into a single recording.
    ///
    /// Scenes run strictly in script order and each one is awaited to its
    /// end before the next begins; the recorder runs continuously across
    /// all of them. Progress (counting skipped scenes too, so the bar
    /// reaches 100) is reported over `progress_tx` after each scene.
    ///
    /// # Errors
    ///
    /// - `ValidationError` for an empty scene list,
    /// - `ExportFailed` when no scene has completed assets,
    /// - `RecorderUnsupported` when the backend records none of the
    ///   supported formats,
    /// - `ExportAborted` when an eligible scene's media fails to load;
    ///   recorded chunks are discarded and no output is returned.
    pub async fn export(
        &self,
        scenes: &[Scene],
        assets: &AssetBoard,
        backend: &mut dyn CompositorBackend,
        progress_tx: Option<Sender<ExportProgress>>,
    ) -> CoreResult<ExportOutput> {
        if scenes.is_empty() {
            return Err(CoreError::ValidationError(
                "Cannot export an empty scene list".to_string(),
            ));
        }
        let eligible = scenes
            .iter()
            .filter(|scene| Self::scene_sources(assets, scene.id).is_some())
            .count();
        if eligible == 0 {
            return Err(CoreError::ExportFailed(
                "No scenes have completed assets to export".to_string(),
            ));
        }

        let mime_type = select_recording_format(backend)?;
        info!(
            "Starting export: {} scenes ({} eligible), format {}",
            scenes.len(),
            eligible,
            mime_type
        );

        let started = Instant::now();
        if let Err(e) = backend.begin(&self.settings, &mime_type).await {
            backend.teardown().await;
            return Err(CoreError::ExportFailed(format!(
                "Recorder failed to start: {}",
                e
            )));
        }

        let total = scenes.len();
        let mut composited: Vec<SceneId> = Vec::new();
        let mut skipped: Vec<SceneId> = Vec::new();

        for (index, scene) in scenes.iter().enumerate() {
            let position = index + 1;
            let message = match Self::scene_sources(assets, scene.id) {
                None => {
                    warn!(
                        "Skipping scene {} (id {}): assets incomplete",
                        position, scene.id
                    );
                    skipped.push(scene.id);
                    format!("Skipped scene {} of {}", position, total)
                }
                Some((video_url, audio_url)) => {
                    let request = SceneRenderRequest {
                        scene_id: scene.id,
                        position,
                        video_url,
                        audio_url,
                    };
                    if let Err(e) = backend.composite_scene(&request).await {
                        warn!("Export aborted at scene {}: {}", position, e);
                        backend.teardown().await;
                        return Err(CoreError::ExportAborted(format!(
                            "Scene {} failed to load: {}",
                            position, e
                        )));
                    }
                    composited.push(scene.id);
                    format!("Rendered scene {} of {}", position, total)
                }
            };

            let completed = composited.len() + skipped.len();
            Self::report_progress(&progress_tx, completed, total, message).await;
        }

        let bytes = match backend.finish().await {
            Ok(bytes) => bytes,
            Err(e) => {
                backend.teardown().await;
                return Err(CoreError::ExportFailed(format!(
                    "Recorder failed to finalize: {}",
                    e
                )));
            }
        };
        backend.teardown().await;

        let encoding_time_sec = started.elapsed().as_secs_f64();
        info!(
            "Export complete: {} composited, {} skipped, {} bytes in {:.2}s",
            composited.len(),
            skipped.len(),
            bytes.len(),
            encoding_time_sec
        );

        Ok(ExportOutput {
            bytes,
            mime_type,
            scenes_composited: composited,
            scenes_skipped: skipped,
            encoding_time_sec,
        })
    }

    /// Both source URLs, present only when the scene is fully produced
    fn scene_sources(assets: &AssetBoard, scene_id: SceneId) -> Option<(String, String)> {
        let status = assets.status(scene_id)?;
        Some((
            status.video_url()?.to_string(),
            status.audio_url()?.to_string(),
        ))
    }

    async fn report_progress(
        progress_tx: &Option<Sender<ExportProgress>>,
        completed: usize,
        total: usize,
        message: String,
    ) {
        if let Some(tx) = progress_tx {
            let percent = ((completed as f32 / total as f32) * 100.0).round();
            let update = ExportProgress {
                completed_scenes: completed,
                total_scenes: total,
                percent,
                message,
            };
            if tx.send(update).await.is_err() {
                debug!("Export progress receiver dropped");
            }
        }
    }
}

// =============================================================================
// Atomic Write
// =============================================================================

/// Writes bytes through a temp sibling then renames into place, so a crash
/// mid-write never leaves a truncated output file.
fn atomic_write_bytes(path: &Path, bytes: &[u8]) -> CoreResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "export".to_string());
    let tmp_path: PathBuf = path.with_file_name(format!("{file_name}.tmp"));
    {
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(bytes)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }

    // Rename over an existing file can fail on some filesystems.
    std::fs::rename(&tmp_path, path).or_else(|_| {
        std::fs::remove_file(path)?;
        std::fs::rename(&tmp_path, path)
    })?;
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
