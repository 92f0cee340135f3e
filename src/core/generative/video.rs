//! Video Generation Types
//!
//! Data models for AI-powered scene video generation. Generation is
//! asynchronous on the provider side: a submit returns a job handle that is
//! polled until it reaches a terminal status.

use serde::{Deserialize, Serialize};

use crate::core::JobId;

// =============================================================================
// Generation Parameters
// =============================================================================

/// Aspect ratios the generation models accept
pub const VALID_ASPECT_RATIOS: [&str; 3] = ["16:9", "9:16", "1:1"];

/// Resolution labels the generation models accept
pub const VALID_RESOLUTIONS: [&str; 2] = ["720p", "1080p"];

/// Parameters for generating one scene's video clip
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoGenerationParams {
    /// Text prompt describing the desired footage
    pub prompt: String,
    /// Desired clip duration in seconds (1-120)
    pub duration_sec: f64,
    /// Aspect ratio (e.g., "16:9", "9:16")
    pub aspect_ratio: String,
    /// Resolution label (e.g., "720p")
    pub resolution: String,
    /// Things the model should avoid
    pub negative_prompt: Option<String>,
    /// Random seed for reproducibility
    pub seed: Option<u64>,
}

impl VideoGenerationParams {
    /// Creates params with the product defaults (16:9, 720p, 8 seconds)
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            duration_sec: 8.0,
            aspect_ratio: "16:9".to_string(),
            resolution: "720p".to_string(),
            negative_prompt: None,
            seed: None,
        }
    }

    /// Sets duration in seconds, clamped into the supported range
    pub fn with_duration(mut self, duration_sec: f64) -> Self {
        self.duration_sec = duration_sec.clamp(1.0, 120.0);
        self
    }

    /// Sets aspect ratio
    pub fn with_aspect_ratio(mut self, ratio: impl Into<String>) -> Self {
        self.aspect_ratio = ratio.into();
        self
    }

    /// Sets resolution label
    pub fn with_resolution(mut self, resolution: impl Into<String>) -> Self {
        self.resolution = resolution.into();
        self
    }

    /// Sets negative prompt
    pub fn with_negative_prompt(mut self, negative: impl Into<String>) -> Self {
        self.negative_prompt = Some(negative.into());
        self
    }

    /// Sets random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates parameters
    pub fn validate(&self) -> Result<(), String> {
        let trimmed = self.prompt.trim();
        if trimmed.is_empty() {
            return Err("Prompt cannot be empty".to_string());
        }
        if trimmed.len() > 4096 {
            return Err("Prompt too long (max 4096 characters)".to_string());
        }

        if self.duration_sec < 1.0 {
            return Err(format!(
                "Duration too short: {:.1}s (minimum 1s)",
                self.duration_sec
            ));
        }
        if self.duration_sec > 120.0 {
            return Err(format!(
                "Duration too long: {:.1}s (maximum 120s)",
                self.duration_sec
            ));
        }

        if !VALID_ASPECT_RATIOS.contains(&self.aspect_ratio.as_str()) {
            return Err(format!(
                "Invalid aspect ratio '{}'. Valid: {}",
                self.aspect_ratio,
                VALID_ASPECT_RATIOS.join(", ")
            ));
        }
        if !VALID_RESOLUTIONS.contains(&self.resolution.as_str()) {
            return Err(format!(
                "Invalid resolution '{}'. Valid: {}",
                self.resolution,
                VALID_RESOLUTIONS.join(", ")
            ));
        }

        Ok(())
    }
}

// =============================================================================
// Job Handle & Status
// =============================================================================

/// Handle for tracking a submitted video generation job
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoJobHandle {
    /// Provider identifier (e.g., "gemini")
    pub provider: String,
    /// Provider-assigned job or operation id
    pub job_id: JobId,
    /// Unix timestamp when submitted
    pub submitted_at: i64,
}

/// Status of a video generation job
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VideoGenerationStatus {
    /// Job is queued but not yet started
    Queued,
    /// Job is actively being processed
    Processing {
        progress: Option<f64>,
        message: Option<String>,
    },
    /// Job completed successfully
    Completed {
        download_url: String,
        duration_sec: f64,
        has_audio: bool,
    },
    /// Job failed
    Failed { error: String, code: Option<String> },
    /// Job was cancelled
    Cancelled,
}

impl VideoGenerationStatus {
    /// Whether the job is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            VideoGenerationStatus::Completed { .. }
                | VideoGenerationStatus::Failed { .. }
                | VideoGenerationStatus::Cancelled
        )
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // VideoGenerationParams Tests
    // =========================================================================

    #[test]
    fn test_params_new_defaults() {
        let params = VideoGenerationParams::new("A sunrise over a city skyline");
        assert_eq!(params.prompt, "A sunrise over a city skyline");
        assert_eq!(params.duration_sec, 8.0);
        assert_eq!(params.aspect_ratio, "16:9");
        assert_eq!(params.resolution, "720p");
        assert!(params.negative_prompt.is_none());
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_params_builder() {
        let params = VideoGenerationParams::new("Ocean waves")
            .with_duration(12.0)
            .with_aspect_ratio("9:16")
            .with_resolution("1080p")
            .with_negative_prompt("text, watermarks")
            .with_seed(42);

        assert_eq!(params.duration_sec, 12.0);
        assert_eq!(params.aspect_ratio, "9:16");
        assert_eq!(params.resolution, "1080p");
        assert_eq!(params.negative_prompt.as_deref(), Some("text, watermarks"));
        assert_eq!(params.seed, Some(42));
    }

    #[test]
    fn test_params_duration_clamping() {
        let short = VideoGenerationParams::new("Test").with_duration(0.2);
        assert_eq!(short.duration_sec, 1.0);

        let long = VideoGenerationParams::new("Test").with_duration(999.0);
        assert_eq!(long.duration_sec, 120.0);
    }

    #[test]
    fn test_params_validate_empty_prompt() {
        let params = VideoGenerationParams::new("   ");
        assert_eq!(params.validate().unwrap_err(), "Prompt cannot be empty");
    }

    #[test]
    fn test_params_validate_prompt_too_long() {
        let params = VideoGenerationParams::new("x".repeat(4097));
        assert!(params.validate().unwrap_err().contains("too long"));
    }

    #[test]
    fn test_params_validate_duration_bounds() {
        let mut params = VideoGenerationParams::new("Test");
        params.duration_sec = 0.5;
        assert!(params.validate().unwrap_err().contains("too short"));

        params.duration_sec = 200.0;
        assert!(params.validate().unwrap_err().contains("too long"));
    }

    #[test]
    fn test_params_validate_aspect_and_resolution() {
        let params = VideoGenerationParams::new("Test").with_aspect_ratio("5:3");
        assert!(params
            .validate()
            .unwrap_err()
            .contains("Invalid aspect ratio"));

        let params = VideoGenerationParams::new("Test").with_resolution("480p");
        assert!(params.validate().unwrap_err().contains("Invalid resolution"));
    }

    // =========================================================================
    // VideoGenerationStatus Tests
    // =========================================================================

    #[test]
    fn test_status_is_terminal() {
        assert!(!VideoGenerationStatus::Queued.is_terminal());
        assert!(!VideoGenerationStatus::Processing {
            progress: Some(0.5),
            message: None
        }
        .is_terminal());
        assert!(VideoGenerationStatus::Completed {
            download_url: "https://example.com/v.mp4".to_string(),
            duration_sec: 8.0,
            has_audio: true,
        }
        .is_terminal());
        assert!(VideoGenerationStatus::Failed {
            error: "timeout".to_string(),
            code: None,
        }
        .is_terminal());
        assert!(VideoGenerationStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_status_serialization() {
        let status = VideoGenerationStatus::Completed {
            download_url: "https://cdn.example.com/clip.mp4".to_string(),
            duration_sec: 8.0,
            has_audio: true,
        };
        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"status\":\"completed\""));

        let back: VideoGenerationStatus = serde_json::from_str(&json).unwrap();
        match back {
            VideoGenerationStatus::Completed { download_url, .. } => {
                assert_eq!(download_url, "https://cdn.example.com/clip.mp4");
            }
            _ => panic!("Expected Completed status"),
        }
    }

    #[test]
    fn test_job_handle_serialization() {
        let handle = VideoJobHandle {
            provider: "gemini".to_string(),
            job_id: "operations/abc123".to_string(),
            submitted_at: 1700000000,
        };
        let json = serde_json::to_string(&handle).unwrap();
        assert!(json.contains("\"jobId\""));
        let back: VideoJobHandle = serde_json::from_str(&json).unwrap();
        assert_eq!(back.job_id, "operations/abc123");
    }
}
