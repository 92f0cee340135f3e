//! Speech Synthesis
//!
//! Parameters and results for voiceover generation. Providers return raw
//! PCM; [`write_wav`] containerizes it as mono 16-bit WAV so media elements
//! and the compositor can play it directly.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::{CoreError, CoreResult, TimeSec};

/// Default voiceover voice preset
pub const DEFAULT_VOICE: &str = "Fenrir";

/// Default PCM sample rate the TTS models emit
pub const DEFAULT_SAMPLE_RATE_HZ: u32 = 24_000;

// =============================================================================
// Parameters
// =============================================================================

/// Parameters for synthesizing one scene's voiceover
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechParams {
    /// Text to speak
    pub text: String,
    /// Voice preset name
    pub voice: String,
    /// Expected PCM sample rate in Hz
    pub sample_rate_hz: u32,
}

impl SpeechParams {
    /// Creates params with the product defaults ("Fenrir" at 24 kHz)
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice: DEFAULT_VOICE.to_string(),
            sample_rate_hz: DEFAULT_SAMPLE_RATE_HZ,
        }
    }

    /// Sets the voice preset
    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }

    /// Sets the sample rate
    pub fn with_sample_rate(mut self, sample_rate_hz: u32) -> Self {
        self.sample_rate_hz = sample_rate_hz;
        self
    }

    /// Validates parameters
    pub fn validate(&self) -> Result<(), String> {
        let trimmed = self.text.trim();
        if trimmed.is_empty() {
            return Err("Text cannot be empty".to_string());
        }
        if trimmed.len() > 10_000 {
            return Err("Text too long (max 10000 characters)".to_string());
        }
        if self.voice.trim().is_empty() {
            return Err("Voice cannot be empty".to_string());
        }
        if !(8_000..=48_000).contains(&self.sample_rate_hz) {
            return Err(format!(
                "Sample rate {} Hz outside supported range (8000-48000)",
                self.sample_rate_hz
            ));
        }
        Ok(())
    }
}

// =============================================================================
// PCM Clip
// =============================================================================

/// Raw synthesized speech: mono 16-bit samples at a known rate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcmClip {
    pub samples: Vec<i16>,
    pub sample_rate_hz: u32,
}

impl PcmClip {
    pub fn new(samples: Vec<i16>, sample_rate_hz: u32) -> Self {
        Self {
            samples,
            sample_rate_hz,
        }
    }

    /// Clip length in seconds
    pub fn duration_sec(&self) -> TimeSec {
        if self.sample_rate_hz == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate_hz as f64
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Writes a clip to disk as a mono 16-bit WAV file
pub fn write_wav(clip: &PcmClip, path: &Path) -> CoreResult<()> {
    if clip.is_empty() {
        return Err(CoreError::ValidationError(
            "Cannot write an empty clip".to_string(),
        ));
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: clip.sample_rate_hz,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .map_err(|e| CoreError::GenerationFailed(format!("WAV create failed: {}", e)))?;
    for &sample in &clip.samples {
        writer
            .write_sample(sample)
            .map_err(|e| CoreError::GenerationFailed(format!("WAV write failed: {}", e)))?;
    }
    writer
        .finalize()
        .map_err(|e| CoreError::GenerationFailed(format!("WAV finalize failed: {}", e)))?;
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // =========================================================================
    // SpeechParams Tests
    // =========================================================================

    #[test]
    fn test_params_defaults() {
        let params = SpeechParams::new("Welcome to the future of skincare.");
        assert_eq!(params.voice, "Fenrir");
        assert_eq!(params.sample_rate_hz, 24_000);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_params_validation() {
        assert!(SpeechParams::new("   ").validate().is_err());
        assert!(SpeechParams::new("x".repeat(10_001)).validate().is_err());
        assert!(SpeechParams::new("ok")
            .with_voice("")
            .validate()
            .is_err());
        assert!(SpeechParams::new("ok")
            .with_sample_rate(96_000)
            .validate()
            .is_err());
    }

    // =========================================================================
    // PcmClip Tests
    // =========================================================================

    #[test]
    fn test_clip_duration() {
        let clip = PcmClip::new(vec![0i16; 24_000], 24_000);
        assert_eq!(clip.duration_sec(), 1.0);

        let clip = PcmClip::new(vec![0i16; 12_000], 24_000);
        assert_eq!(clip.duration_sec(), 0.5);

        let clip = PcmClip::new(Vec::new(), 0);
        assert_eq!(clip.duration_sec(), 0.0);
    }

    // =========================================================================
    // WAV Output Tests
    // =========================================================================

    #[test]
    fn test_write_wav_header_and_samples() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("voiceover.wav");
        let samples: Vec<i16> = (0..4800).map(|i| (i % 100) as i16).collect();
        let clip = PcmClip::new(samples.clone(), 24_000);

        write_wav(&clip, &path).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 24_000);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_format, hound::SampleFormat::Int);

        let read_back: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(read_back, samples);
        assert_eq!(reader.duration(), 4800);
    }

    #[test]
    fn test_write_wav_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("media").join("scene_1_audio.wav");
        let clip = PcmClip::new(vec![1i16; 100], 24_000);

        write_wav(&clip, &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_write_wav_rejects_empty_clip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.wav");
        let clip = PcmClip::new(Vec::new(), 24_000);
        assert!(matches!(
            write_wav(&clip, &path),
            Err(CoreError::ValidationError(_))
        ));
    }
}
