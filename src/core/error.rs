//! AdGenius Error Definitions
//!
//! Defines error types used throughout the engine.

use thiserror::Error;

use super::SceneId;

/// Core engine error types
#[derive(Error, Debug)]
pub enum CoreError {
    // =========================================================================
    // Project Errors
    // =========================================================================
    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("Project has no script attached")]
    ScriptMissing,

    // =========================================================================
    // Script Errors
    // =========================================================================
    #[error("Scene not found: {0}")]
    SceneNotFound(SceneId),

    #[error("Script generation failed: {0}")]
    ScriptGeneration(String),

    // =========================================================================
    // Playback Errors
    // =========================================================================
    #[error("Scene {0} has incomplete assets")]
    AssetsIncomplete(SceneId),

    #[error("Media load failed: {0}")]
    MediaLoad(String),

    // =========================================================================
    // Render Errors
    // =========================================================================
    #[error("No supported recording format: {0}")]
    RecorderUnsupported(String),

    #[error("Export failed: {0}")]
    ExportFailed(String),

    #[error("Export aborted: {0}")]
    ExportAborted(String),

    // =========================================================================
    // Generative Errors
    // =========================================================================
    #[error("Generation request failed: {0}")]
    GenerationFailed(String),

    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Quota exhausted: {0}")]
    QuotaExhausted(String),

    // =========================================================================
    // General Errors
    // =========================================================================
    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Core engine result type
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// True for quota/rate-limit failures that a fallback model may absorb
    pub fn is_quota_exhausted(&self) -> bool {
        match self {
            CoreError::QuotaExhausted(_) => true,
            CoreError::GenerationFailed(msg)
            | CoreError::ScriptGeneration(msg)
            | CoreError::Internal(msg) => {
                let lowered = msg.to_ascii_lowercase();
                lowered.contains("429")
                    || lowered.contains("quota")
                    || lowered.contains("resource_exhausted")
            }
            _ => false,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::SceneNotFound(3);
        assert_eq!(err.to_string(), "Scene not found: 3");

        let err = CoreError::AssetsIncomplete(1);
        assert_eq!(err.to_string(), "Scene 1 has incomplete assets");
    }

    #[test]
    fn test_is_quota_exhausted() {
        assert!(CoreError::QuotaExhausted("monthly cap".to_string()).is_quota_exhausted());
        assert!(
            CoreError::ScriptGeneration("HTTP 429 Too Many Requests".to_string())
                .is_quota_exhausted()
        );
        assert!(
            CoreError::GenerationFailed("RESOURCE_EXHAUSTED: try later".to_string())
                .is_quota_exhausted()
        );
        assert!(!CoreError::MediaLoad("404".to_string()).is_quota_exhausted());
        assert!(!CoreError::ScriptGeneration("malformed JSON".to_string()).is_quota_exhausted());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: CoreError = io.into();
        assert!(matches!(err, CoreError::IoError(_)));
    }
}
