//! Generative Asset Production
//!
//! AI-powered raw material for the compositor: Veo-style video clips for
//! each scene's visual prompt and TTS voiceover rendered to WAV.

pub mod engine;
pub mod providers;
pub mod speech;
pub mod video;

#[cfg(feature = "ai-providers")]
pub mod provider_impls;

// Re-export main types
pub use engine::{GenerativeEngine, GenerativeEngineConfig};
pub use providers::{MockGenerativeProvider, ProviderConfig, SpeechProvider, VideoGenerator};
pub use speech::{write_wav, PcmClip, SpeechParams, DEFAULT_SAMPLE_RATE_HZ, DEFAULT_VOICE};
pub use video::{
    VideoGenerationParams, VideoGenerationStatus, VideoJobHandle, VALID_ASPECT_RATIOS,
    VALID_RESOLUTIONS,
};

#[cfg(feature = "ai-providers")]
pub use provider_impls::GeminiProvider;
