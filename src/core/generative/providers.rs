//! Generative Providers
//!
//! Provider abstraction for the asset generation services. Video generation
//! is job-based (submit, then poll to a terminal status); speech synthesis
//! is a single round trip returning raw PCM.

use std::collections::HashMap;
use std::f64::consts::TAU;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::speech::{PcmClip, SpeechParams};
use super::video::{VideoGenerationParams, VideoGenerationStatus, VideoJobHandle};
use crate::core::{CoreError, CoreResult};

// =============================================================================
// Provider Configuration
// =============================================================================

/// Configuration shared by remote provider implementations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    /// API key (if required)
    pub api_key: Option<String>,
    /// Base URL override
    pub base_url: Option<String>,
    /// Request timeout in seconds
    pub timeout_sec: u64,
    /// Maximum retries on transient failures
    pub max_retries: u32,
    /// Video model override
    pub video_model: Option<String>,
    /// Speech model override
    pub speech_model: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            timeout_sec: 60,
            max_retries: 3,
            video_model: None,
            speech_model: None,
        }
    }
}

impl ProviderConfig {
    /// Creates a config with an API key
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Default::default()
        }
    }

    /// Sets the base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the video model
    pub fn with_video_model(mut self, model: impl Into<String>) -> Self {
        self.video_model = Some(model.into());
        self
    }

    /// Sets the speech model
    pub fn with_speech_model(mut self, model: impl Into<String>) -> Self {
        self.speech_model = Some(model.into());
        self
    }
}

// =============================================================================
// Provider Traits
// =============================================================================

/// Job-based video generation service
#[async_trait]
pub trait VideoGenerator: Send + Sync {
    /// Returns the provider name
    fn name(&self) -> &str;

    /// Checks if the provider is configured correctly
    fn is_available(&self) -> bool;

    /// Submits a generation job
    async fn submit(&self, params: &VideoGenerationParams) -> CoreResult<VideoJobHandle>;

    /// Polls a submitted job's status
    async fn poll(&self, handle: &VideoJobHandle) -> CoreResult<VideoGenerationStatus>;

    /// Requests cancellation of a running job
    async fn cancel(&self, handle: &VideoJobHandle) -> CoreResult<()>;
}

/// Voiceover synthesis service
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Returns the provider name
    fn name(&self) -> &str;

    /// Checks if the provider is configured correctly
    fn is_available(&self) -> bool;

    /// Synthesizes speech, returning raw mono PCM
    async fn synthesize(&self, params: &SpeechParams) -> CoreResult<PcmClip>;
}

// =============================================================================
// Mock Provider
// =============================================================================

/// Deterministic provider for tests and offline development.
///
/// Video jobs complete after a configurable number of polls; speech returns
/// a short sine burst sized to the text length.
pub struct MockGenerativeProvider {
    name: String,
    available: bool,
    polls_until_complete: u32,
    video_failure: Option<String>,
    speech_failure: Option<String>,
    poll_counts: Mutex<HashMap<String, u32>>,
    submissions: Mutex<Vec<String>>,
}

impl MockGenerativeProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            available: true,
            polls_until_complete: 2,
            video_failure: None,
            speech_failure: None,
            poll_counts: Mutex::new(HashMap::new()),
            submissions: Mutex::new(Vec::new()),
        }
    }

    /// Sets availability
    pub fn with_available(mut self, available: bool) -> Self {
        self.available = available;
        self
    }

    /// Number of polls before a video job reports Completed
    pub fn with_polls_until_complete(mut self, polls: u32) -> Self {
        self.polls_until_complete = polls;
        self
    }

    /// Makes every video job end in a Failed status
    pub fn with_video_failure(mut self, error: impl Into<String>) -> Self {
        self.video_failure = Some(error.into());
        self
    }

    /// Makes every synthesis call fail
    pub fn with_speech_failure(mut self, error: impl Into<String>) -> Self {
        self.speech_failure = Some(error.into());
        self
    }

    /// Prompts submitted so far, in order
    pub fn submitted_prompts(&self) -> Vec<String> {
        self.submissions.lock().unwrap().clone()
    }
}

#[async_trait]
impl VideoGenerator for MockGenerativeProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_available(&self) -> bool {
        self.available
    }

    async fn submit(&self, params: &VideoGenerationParams) -> CoreResult<VideoJobHandle> {
        self.submissions.lock().unwrap().push(params.prompt.clone());
        let job_id = ulid::Ulid::new().to_string();
        self.poll_counts.lock().unwrap().insert(job_id.clone(), 0);
        Ok(VideoJobHandle {
            provider: self.name.clone(),
            job_id,
            submitted_at: chrono::Utc::now().timestamp(),
        })
    }

    async fn poll(&self, handle: &VideoJobHandle) -> CoreResult<VideoGenerationStatus> {
        if let Some(error) = &self.video_failure {
            return Ok(VideoGenerationStatus::Failed {
                error: error.clone(),
                code: None,
            });
        }

        let mut counts = self.poll_counts.lock().unwrap();
        let count = counts
            .get_mut(&handle.job_id)
            .ok_or_else(|| CoreError::GenerationFailed(format!("Unknown job {}", handle.job_id)))?;
        *count += 1;

        if *count >= self.polls_until_complete {
            Ok(VideoGenerationStatus::Completed {
                download_url: format!("mock://videos/{}.mp4", handle.job_id),
                duration_sec: 8.0,
                has_audio: false,
            })
        } else {
            Ok(VideoGenerationStatus::Processing {
                progress: Some(*count as f64 / self.polls_until_complete as f64),
                message: Some("Rendering".to_string()),
            })
        }
    }

    async fn cancel(&self, handle: &VideoJobHandle) -> CoreResult<()> {
        self.poll_counts.lock().unwrap().remove(&handle.job_id);
        Ok(())
    }
}

#[async_trait]
impl SpeechProvider for MockGenerativeProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_available(&self) -> bool {
        self.available
    }

    async fn synthesize(&self, params: &SpeechParams) -> CoreResult<PcmClip> {
        if let Some(error) = &self.speech_failure {
            return Err(CoreError::GenerationFailed(error.clone()));
        }

        // A 440 Hz burst roughly 50 ms per character, so longer lines yield
        // longer clips the way real narration does.
        let seconds = (params.text.chars().count() as f64 * 0.05).clamp(0.25, 30.0);
        let rate = params.sample_rate_hz;
        let total = (seconds * rate as f64) as usize;
        let samples = (0..total)
            .map(|i| {
                let t = i as f64 / rate as f64;
                ((TAU * 440.0 * t).sin() * 0.3 * i16::MAX as f64) as i16
            })
            .collect();
        Ok(PcmClip::new(samples, rate))
    }
}

// =============================================================================
// Tests
// =============================================================================
