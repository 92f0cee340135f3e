//! Asset Production Pipeline
//!
//! Turns an approved script into playable media. Voiceover synthesis for all
//! scenes runs concurrently; video generation runs one scene at a time in
//! script order to stay inside provider rate expectations. Progress lands on
//! a shared asset board, with an event per track transition.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};

use crate::core::assets::{AssetBoard, TrackKind};
use crate::core::generative::{GenerativeEngine, SpeechParams, VideoGenerationParams};
use crate::core::script::{AdScript, Scene};
use crate::core::{CoreError, CoreResult, SceneId};

/// Asset board shared between the production run and its observers
pub type SharedAssetBoard = Arc<RwLock<AssetBoard>>;

// =============================================================================
// Production Events
// =============================================================================

/// Track transition notification emitted during a production run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ProductionEvent {
    /// A track entered the generating state
    #[serde(rename_all = "camelCase")]
    TrackStarted { scene_id: SceneId, kind: TrackKind },
    /// A track completed with a playable URL
    #[serde(rename_all = "camelCase")]
    TrackCompleted {
        scene_id: SceneId,
        kind: TrackKind,
        url: String,
    },
    /// A track failed; the run continues
    #[serde(rename_all = "camelCase")]
    TrackFailed {
        scene_id: SceneId,
        kind: TrackKind,
        error: String,
    },
}

// =============================================================================
// Production Summary
// =============================================================================

/// Per-track counts for one production run
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionSummary {
    /// Tracks generated during this run
    pub generated: usize,
    /// Tracks that ended in an error state
    pub failed: usize,
    /// Tracks skipped because they were already completed
    pub skipped: usize,
}

impl ProductionSummary {
    /// True when nothing failed
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

// =============================================================================
// Production Engine
// =============================================================================

/// Drives generative providers over a whole script
#[derive(Clone)]
pub struct ProductionEngine {
    generative: Arc<GenerativeEngine>,
    media_dir: PathBuf,
}

impl ProductionEngine {
    /// Creates an engine writing voiceover WAVs under `media_dir`
    pub fn new(generative: Arc<GenerativeEngine>, media_dir: impl Into<PathBuf>) -> Self {
        Self {
            generative,
            media_dir: media_dir.into(),
        }
    }

    /// Directory that receives synthesized voiceover files
    pub fn media_dir(&self) -> &Path {
        &self.media_dir
    }

    /// Produces every missing track for the script.
    ///
    /// Already-completed tracks are skipped, so re-running after a partial
    /// failure only touches the gaps. Per-track failures are recorded on the
    /// board and counted; only infrastructure failures (a lost task) abort
    /// the run itself.
    pub async fn produce(
        &self,
        script: &AdScript,
        board: SharedAssetBoard,
        events: Option<mpsc::Sender<ProductionEvent>>,
    ) -> CoreResult<ProductionSummary> {
        script.validate().map_err(CoreError::ValidationError)?;
        board.write().await.align_with(script);

        info!(
            "Producing assets for '{}' ({} scenes)",
            script.title,
            script.scenes.len()
        );
        let mut summary = ProductionSummary::default();

        // Voiceover lines are independent of each other, so they synthesize
        // in parallel while the video jobs below run one at a time.
        let mut voiceover_tasks = Vec::new();
        for scene in &script.scenes {
            if Self::is_track_completed(&board, scene.id, TrackKind::Audio).await {
                debug!("Scene {} audio already completed, skipping", scene.id);
                summary.skipped += 1;
                continue;
            }
            let engine = self.clone();
            let scene = scene.clone();
            let board = Arc::clone(&board);
            let events = events.clone();
            voiceover_tasks.push(tokio::spawn(async move {
                engine
                    .produce_track(&scene, TrackKind::Audio, board, events)
                    .await
            }));
        }

        // Video generation stays strictly sequential in script order.
        for scene in &script.scenes {
            if Self::is_track_completed(&board, scene.id, TrackKind::Video).await {
                debug!("Scene {} video already completed, skipping", scene.id);
                summary.skipped += 1;
                continue;
            }
            match self
                .produce_track(scene, TrackKind::Video, Arc::clone(&board), events.clone())
                .await
            {
                Ok(_) => summary.generated += 1,
                Err(_) => summary.failed += 1,
            }
        }

        for task in voiceover_tasks {
            match task.await {
                Ok(Ok(_)) => summary.generated += 1,
                Ok(Err(_)) => summary.failed += 1,
                Err(e) => {
                    return Err(CoreError::Internal(format!(
                        "Voiceover task failed to join: {}",
                        e
                    )))
                }
            }
        }

        info!(
            "Production finished: {} generated, {} failed, {} skipped",
            summary.generated, summary.failed, summary.skipped
        );
        Ok(summary)
    }

    /// Generates a single track, recording the transition on the board.
    ///
    /// This is also the retry path for a track that previously failed; it
    /// regenerates unconditionally, clearing any prior URL or error.
    pub async fn produce_track(
        &self,
        scene: &Scene,
        kind: TrackKind,
        board: SharedAssetBoard,
        events: Option<mpsc::Sender<ProductionEvent>>,
    ) -> CoreResult<String> {
        {
            let mut guard = board.write().await;
            let status = guard
                .status_mut(scene.id)
                .ok_or(CoreError::SceneNotFound(scene.id))?;
            status.mark_generating(kind);
        }
        Self::emit(
            &events,
            ProductionEvent::TrackStarted {
                scene_id: scene.id,
                kind,
            },
        )
        .await;

        match self.generate(scene, kind).await {
            Ok(url) => {
                if let Some(status) = board.write().await.status_mut(scene.id) {
                    status.mark_completed(kind, url.clone());
                }
                Self::emit(
                    &events,
                    ProductionEvent::TrackCompleted {
                        scene_id: scene.id,
                        kind,
                        url: url.clone(),
                    },
                )
                .await;
                Ok(url)
            }
            Err(e) => {
                warn!("Scene {} {} generation failed: {}", scene.id, kind, e);
                let message = e.to_string();
                if let Some(status) = board.write().await.status_mut(scene.id) {
                    status.mark_error(kind, message.clone());
                }
                Self::emit(
                    &events,
                    ProductionEvent::TrackFailed {
                        scene_id: scene.id,
                        kind,
                        error: message,
                    },
                )
                .await;
                Err(e)
            }
        }
    }

    async fn generate(&self, scene: &Scene, kind: TrackKind) -> CoreResult<String> {
        match kind {
            TrackKind::Video => {
                let params = VideoGenerationParams::new(scene.visual_prompt.as_str())
                    .with_duration(scene.estimated_duration);
                self.generative.generate_video(&params).await
            }
            TrackKind::Audio => {
                let params = SpeechParams::new(scene.voiceover_text.as_str());
                let path = self
                    .media_dir
                    .join(format!("voiceover_scene_{}.wav", scene.id));
                self.generative.generate_speech_wav(&params, &path).await?;
                Ok(path.to_string_lossy().to_string())
            }
        }
    }

    async fn is_track_completed(
        board: &SharedAssetBoard,
        scene_id: SceneId,
        kind: TrackKind,
    ) -> bool {
        board
            .read()
            .await
            .status(scene_id)
            .map(|status| status.slot(kind).is_completed())
            .unwrap_or(false)
    }

    async fn emit(events: &Option<mpsc::Sender<ProductionEvent>>, event: ProductionEvent) {
        if let Some(tx) = events {
            if let Err(e) = tx.send(event).await {
                debug!("Production event receiver dropped: {}", e);
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
