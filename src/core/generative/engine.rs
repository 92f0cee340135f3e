//! Generative Engine
//!
//! Drives providers end to end: validates parameters, runs the submit/poll
//! cycle for video jobs, and lands synthesized speech on disk as WAV.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::providers::{SpeechProvider, VideoGenerator};
use super::speech::{write_wav, PcmClip, SpeechParams};
use super::video::{VideoGenerationParams, VideoGenerationStatus};
use crate::core::{CoreError, CoreResult};

// =============================================================================
// Engine Configuration
// =============================================================================

/// Tuning for the video poll loop
#[derive(Debug, Clone)]
pub struct GenerativeEngineConfig {
    /// Delay between status polls
    pub video_poll_interval: Duration,
    /// Polls before a job is declared stuck
    pub max_video_polls: u32,
}

impl Default for GenerativeEngineConfig {
    fn default() -> Self {
        Self {
            video_poll_interval: Duration::from_secs(5),
            max_video_polls: 120,
        }
    }
}

// =============================================================================
// Generative Engine
// =============================================================================

/// Coordinates video and speech providers
pub struct GenerativeEngine {
    video: Arc<dyn VideoGenerator>,
    speech: Arc<dyn SpeechProvider>,
    config: GenerativeEngineConfig,
}

impl GenerativeEngine {
    pub fn new(video: Arc<dyn VideoGenerator>, speech: Arc<dyn SpeechProvider>) -> Self {
        Self {
            video,
            speech,
            config: GenerativeEngineConfig::default(),
        }
    }

    /// Overrides the poll loop tuning
    pub fn with_config(mut self, config: GenerativeEngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Generates a video clip and returns its download URL.
    ///
    /// Blocks (asynchronously) until the job reaches a terminal status or
    /// the poll budget runs out. A stuck job is cancelled best-effort before
    /// the error is returned.
    pub async fn generate_video(&self, params: &VideoGenerationParams) -> CoreResult<String> {
        params.validate().map_err(CoreError::ValidationError)?;
        if !self.video.is_available() {
            return Err(CoreError::ProviderUnavailable(
                self.video.name().to_string(),
            ));
        }

        let handle = self.video.submit(params).await?;
        info!(
            "Submitted video job {} to provider '{}'",
            handle.job_id, handle.provider
        );

        let mut polls = 0u32;
        loop {
            if polls >= self.config.max_video_polls {
                warn!("Video job {} exceeded poll budget, cancelling", handle.job_id);
                if let Err(e) = self.video.cancel(&handle).await {
                    debug!("Cancel after timeout failed: {}", e);
                }
                return Err(CoreError::GenerationFailed(format!(
                    "Video job {} did not finish after {} polls",
                    handle.job_id, polls
                )));
            }
            tokio::time::sleep(self.config.video_poll_interval).await;
            polls += 1;

            match self.video.poll(&handle).await? {
                VideoGenerationStatus::Completed { download_url, .. } => {
                    info!("Video job {} completed", handle.job_id);
                    return Ok(download_url);
                }
                VideoGenerationStatus::Failed { error, code } => {
                    return Err(CoreError::GenerationFailed(match code {
                        Some(code) => format!("Video generation failed ({}): {}", code, error),
                        None => format!("Video generation failed: {}", error),
                    }));
                }
                VideoGenerationStatus::Cancelled => {
                    return Err(CoreError::GenerationFailed(format!(
                        "Video job {} was cancelled",
                        handle.job_id
                    )));
                }
                VideoGenerationStatus::Queued => {
                    debug!("Video job {} queued", handle.job_id);
                }
                VideoGenerationStatus::Processing { progress, .. } => {
                    debug!(
                        "Video job {} processing ({:.0}%)",
                        handle.job_id,
                        progress.unwrap_or(0.0) * 100.0
                    );
                }
            }
        }
    }

    /// Synthesizes speech and returns the raw clip
    pub async fn generate_speech(&self, params: &SpeechParams) -> CoreResult<PcmClip> {
        params.validate().map_err(CoreError::ValidationError)?;
        if !self.speech.is_available() {
            return Err(CoreError::ProviderUnavailable(
                self.speech.name().to_string(),
            ));
        }
        self.speech.synthesize(params).await
    }

    /// Synthesizes speech and writes it to `path` as a WAV file
    pub async fn generate_speech_wav(
        &self,
        params: &SpeechParams,
        path: &Path,
    ) -> CoreResult<PcmClip> {
        let clip = self.generate_speech(params).await?;
        let write_clip = clip.clone();
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || write_wav(&write_clip, &path))
            .await
            .map_err(|e| CoreError::Internal(format!("WAV write task failed: {}", e)))??;
        Ok(clip)
    }
}

// =============================================================================
// Tests
// =============================================================================
