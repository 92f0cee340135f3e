//! Google Gemini Provider
//!
//! Adapter for the Gemini REST API covering all three generative concerns:
//! script drafting (`generateContent` with a JSON response), voiceover
//! synthesis (TTS models returning base64 PCM), and Veo video generation
//! (`predictLongRunning` plus operation polling).

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::generative::providers::{ProviderConfig, SpeechProvider, VideoGenerator};
use crate::core::generative::speech::{PcmClip, SpeechParams};
use crate::core::generative::video::{
    VideoGenerationParams, VideoGenerationStatus, VideoJobHandle,
};
use crate::core::script::provider::{strip_code_fences, SYSTEM_INSTRUCTION_SCRIPT};
use crate::core::script::{
    parse_script_json, AdScript, Scene, ScriptProvider, ScriptRequest, MODEL_SCRIPT_PRIMARY,
    SCRIPT_THINKING_BUDGET,
};
use crate::core::{CoreError, CoreResult};

// =============================================================================
// Constants
// =============================================================================

/// Provider name used in job handles and error messages
const PROVIDER_NAME: &str = "gemini";

/// Default base URL for the Gemini API
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default Veo model for video generation
const DEFAULT_VIDEO_MODEL: &str = "veo-3.1-fast-generate-preview";

/// Default TTS model for voiceover synthesis
const DEFAULT_SPEECH_MODEL: &str = "gemini-2.5-flash-preview-tts";

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SEC: u64 = 60;

/// Base delay for exponential backoff (milliseconds)
const BASE_RETRY_DELAY_MS: u64 = 1000;

/// Fast-preview Veo clips come back at a fixed length
const VEO_CLIP_SECONDS: f64 = 8.0;

// =============================================================================
// API Request/Response Types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

impl Part {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<ThinkingConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    speech_config: Option<SpeechConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechConfig {
    voice_config: VoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceConfig {
    prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrebuiltVoiceConfig {
    voice_name: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Serialize)]
struct PredictLongRunningRequest {
    instances: Vec<VideoInstance>,
    parameters: VideoParameters,
}

#[derive(Debug, Serialize)]
struct VideoInstance {
    prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VideoParameters {
    aspect_ratio: String,
    resolution: String,
    sample_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    negative_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct OperationResponse {
    name: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<OperationError>,
    #[serde(default)]
    response: Option<OperationResult>,
}

#[derive(Debug, Deserialize)]
struct OperationError {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationResult {
    #[serde(default)]
    generate_video_response: Option<GenerateVideoResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateVideoResponse {
    #[serde(default, alias = "generatedVideos")]
    generated_samples: Vec<GeneratedSample>,
}

#[derive(Debug, Deserialize)]
struct GeneratedSample {
    #[serde(default)]
    video: Option<VideoRef>,
}

#[derive(Debug, Deserialize)]
struct VideoRef {
    #[serde(default)]
    uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

// =============================================================================
// GeminiProvider
// =============================================================================

/// Gemini adapter for script, speech, and video generation
pub struct GeminiProvider {
    /// HTTP client with configured timeout
    client: reqwest::Client,
    /// API key for authentication
    api_key: String,
    /// Base URL for the API
    base_url: String,
    /// Veo model ID
    video_model: String,
    /// TTS model ID
    speech_model: String,
    /// Retry attempts for transient errors
    max_retries: u32,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("base_url", &self.base_url)
            .field("video_model", &self.video_model)
            .field("speech_model", &self.speech_model)
            .finish_non_exhaustive()
    }
}

impl GeminiProvider {
    /// Create a new Gemini provider
    pub fn new(api_key: impl Into<String>) -> CoreResult<Self> {
        Self::with_timeout(api_key, Duration::from_secs(DEFAULT_TIMEOUT_SEC))
    }

    /// Create a provider from a full configuration
    pub fn from_config(config: &ProviderConfig) -> CoreResult<Self> {
        let mut provider = Self::with_timeout(
            config.api_key.clone().unwrap_or_default(),
            Duration::from_secs(config.timeout_sec),
        )?;
        provider.max_retries = config.max_retries;
        if let Some(url) = &config.base_url {
            provider.base_url = url.clone();
        }
        if let Some(model) = &config.video_model {
            provider.video_model = model.clone();
        }
        if let Some(model) = &config.speech_model {
            provider.speech_model = model.clone();
        }
        Ok(provider)
    }

    fn with_timeout(api_key: impl Into<String>, timeout: Duration) -> CoreResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            video_model: DEFAULT_VIDEO_MODEL.to_string(),
            speech_model: DEFAULT_SPEECH_MODEL.to_string(),
            max_retries: 3,
        })
    }

    /// Set custom base URL
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set custom Veo model ID
    pub fn with_video_model(mut self, model: impl Into<String>) -> Self {
        self.video_model = model.into();
        self
    }

    /// Set custom TTS model ID
    pub fn with_speech_model(mut self, model: impl Into<String>) -> Self {
        self.speech_model = model.into();
        self
    }

    /// Build a generateContent URL for the given model
    fn generate_content_url(&self, model_id: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model_id)
    }

    /// Build the video submit URL
    fn predict_url(&self) -> String {
        format!(
            "{}/models/{}:predictLongRunning",
            self.base_url, self.video_model
        )
    }

    /// Build the poll URL from an operation name
    fn operation_url(&self, operation_name: &str) -> String {
        format!("{}/{}", self.base_url, operation_name)
    }

    /// Build the cancel URL from an operation name
    fn cancel_url(&self, operation_name: &str) -> String {
        format!("{}/{}:cancel", self.base_url, operation_name)
    }

    /// Appends the API key so the returned file URI is directly fetchable
    fn signed_download_url(&self, uri: &str) -> String {
        if uri.contains('?') {
            format!("{}&key={}", uri, self.api_key)
        } else {
            format!("{}?key={}", uri, self.api_key)
        }
    }

    /// Returns true when an error is likely transient and should be retried.
    fn is_retryable_error(error: &CoreError) -> bool {
        let message = match error {
            CoreError::Internal(msg) | CoreError::GenerationFailed(msg) => msg,
            _ => return false,
        };

        let lowered = message.to_ascii_lowercase();
        lowered.contains("502")
            || lowered.contains("503")
            || lowered.contains("504")
            || lowered.contains("timeout")
            || lowered.contains("overloaded")
            || lowered.contains("unavailable")
    }

    /// Execute an HTTP request with retries and exponential backoff
    async fn execute_with_retry<F, Fut, T>(&self, operation: &str, f: F) -> CoreResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = CoreResult<T>>,
    {
        let mut last_error = None;

        for attempt in 0..self.max_retries {
            match f().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    if !Self::is_retryable_error(&e) || attempt == self.max_retries - 1 {
                        return Err(e);
                    }

                    let delay = BASE_RETRY_DELAY_MS * 2u64.pow(attempt);
                    warn!(
                        "Gemini {} attempt {} failed, retrying in {}ms: {}",
                        operation,
                        attempt + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            CoreError::Internal(format!(
                "Gemini {} failed after {} retries",
                operation, self.max_retries
            ))
        }))
    }

    /// Send one request and return the response body on success
    async fn request(&self, method: Method, url: &str, body: Option<&str>) -> CoreResult<String> {
        let mut builder = self
            .client
            .request(method, url)
            .header("x-goog-api-key", &self.api_key);
        if let Some(body) = body {
            builder = builder
                .header("Content-Type", "application/json")
                .body(body.to_string());
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| CoreError::Internal(format!("Network error: {}", e)))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| CoreError::Internal(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(Self::parse_api_error(status, &text));
        }
        Ok(text)
    }

    /// Parse an error response body
    fn parse_api_error(status: StatusCode, body: &str) -> CoreError {
        let detail = serde_json::from_str::<ApiErrorResponse>(body)
            .ok()
            .and_then(|resp| resp.error);
        let api_status = detail
            .as_ref()
            .and_then(|d| d.status.clone())
            .unwrap_or_default();
        let message = detail
            .and_then(|d| d.message)
            .unwrap_or_else(|| body.chars().take(500).collect());

        if status == StatusCode::TOO_MANY_REQUESTS || api_status == "RESOURCE_EXHAUSTED" {
            return CoreError::QuotaExhausted(format!("Gemini API ({}): {}", status, message));
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return CoreError::ProviderUnavailable(format!(
                "Gemini API ({}): {}",
                status, message
            ));
        }
        CoreError::GenerationFailed(format!("Gemini API error ({}): {}", status, message))
    }

    fn script_request_body(prompt: &str, model_id: &str) -> GenerateContentRequest {
        // Only the primary model accepts a thinking budget.
        let thinking_config = (model_id == MODEL_SCRIPT_PRIMARY).then(|| ThinkingConfig {
            thinking_budget: SCRIPT_THINKING_BUDGET,
        });

        GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part::text(prompt)],
            }],
            system_instruction: Some(Content {
                parts: vec![Part::text(SYSTEM_INSTRUCTION_SCRIPT)],
            }),
            generation_config: Some(GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                thinking_config,
                ..Default::default()
            }),
        }
    }

    fn rewrite_request_body(prompt: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part::text(prompt)],
            }],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                ..Default::default()
            }),
        }
    }

    fn tts_request_body(params: &SpeechParams) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part::text(params.text.as_str())],
            }],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                response_modalities: Some(vec!["AUDIO".to_string()]),
                speech_config: Some(SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: params.voice.clone(),
                        },
                    },
                }),
                ..Default::default()
            }),
        }
    }

    fn video_request_body(&self, params: &VideoGenerationParams) -> PredictLongRunningRequest {
        PredictLongRunningRequest {
            instances: vec![VideoInstance {
                prompt: params.prompt.clone(),
            }],
            parameters: VideoParameters {
                aspect_ratio: params.aspect_ratio.clone(),
                resolution: params.resolution.clone(),
                sample_count: 1,
                negative_prompt: params.negative_prompt.clone(),
                seed: params.seed,
            },
        }
    }

    /// Map a polled operation to a job status
    fn operation_to_status(&self, operation: OperationResponse) -> VideoGenerationStatus {
        if let Some(error) = operation.error {
            return VideoGenerationStatus::Failed {
                error: error
                    .message
                    .unwrap_or_else(|| "Unknown error".to_string()),
                code: error.status.or_else(|| error.code.map(|c| c.to_string())),
            };
        }

        if !operation.done {
            return VideoGenerationStatus::Processing {
                progress: None,
                message: None,
            };
        }

        let uri = operation
            .response
            .and_then(|r| r.generate_video_response)
            .and_then(|r| r.generated_samples.into_iter().next())
            .and_then(|sample| sample.video)
            .and_then(|video| video.uri);

        match uri {
            Some(uri) => VideoGenerationStatus::Completed {
                download_url: self.signed_download_url(&uri),
                duration_sec: VEO_CLIP_SECONDS,
                has_audio: true,
            },
            None => VideoGenerationStatus::Failed {
                error: "Operation finished without a video URI".to_string(),
                code: None,
            },
        }
    }

    fn extract_text(response: &GenerateContentResponse) -> Option<String> {
        response
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|content| content.parts.iter().find_map(|part| part.text.clone()))
    }

    fn extract_inline_data(response: &GenerateContentResponse) -> Option<&InlineData> {
        response
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|content| {
                content
                    .parts
                    .iter()
                    .find_map(|part| part.inline_data.as_ref())
            })
    }

    /// Pull the sample rate out of a mime type like `audio/L16;codec=pcm;rate=24000`
    fn parse_pcm_rate(mime_type: &str) -> Option<u32> {
        mime_type
            .split(';')
            .find_map(|part| part.trim().strip_prefix("rate="))
            .and_then(|rate| rate.parse().ok())
    }

    /// Decode base64 16-bit little-endian PCM into samples
    fn decode_pcm_base64(data: &str) -> CoreResult<Vec<i16>> {
        let bytes = BASE64_STANDARD
            .decode(data)
            .map_err(|e| CoreError::GenerationFailed(format!("Invalid audio payload: {}", e)))?;
        Ok(bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect())
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

#[async_trait]
impl ScriptProvider for GeminiProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn generate_script(
        &self,
        request: &ScriptRequest,
        model_id: &str,
    ) -> CoreResult<AdScript> {
        let body = Self::script_request_body(&request.build_prompt(), model_id);
        let body = serde_json::to_string(&body)
            .map_err(|e| CoreError::Internal(format!("Serialization failed: {}", e)))?;
        let url = self.generate_content_url(model_id);

        let text = self
            .execute_with_retry("generate_script", || {
                self.request(Method::POST, &url, Some(&body))
            })
            .await?;

        let response: GenerateContentResponse = serde_json::from_str(&text)
            .map_err(|e| CoreError::Internal(format!("Failed to parse response: {}", e)))?;
        let script_json = Self::extract_text(&response).ok_or_else(|| {
            CoreError::ScriptGeneration("Gemini returned no script text".to_string())
        })?;

        info!("Gemini drafted a script with model {}", model_id);
        parse_script_json(&script_json)
    }

    async fn rewrite_scene(&self, scene: &Scene, model_id: &str) -> CoreResult<Scene> {
        let scene_json = serde_json::to_string(scene)
            .map_err(|e| CoreError::Internal(format!("Serialization failed: {}", e)))?;
        let prompt = format!(
            "You are a creative director. Rewrite this specific scene for a video \
             commercial to be more engaging, cinematic, and clear.\n\
             Maintain the same ID and approximate duration.\n\n\
             Current Scene JSON:\n{}\n\n\
             Return ONLY the raw JSON object for the updated scene.",
            scene_json
        );
        let body = Self::rewrite_request_body(&prompt);
        let body = serde_json::to_string(&body)
            .map_err(|e| CoreError::Internal(format!("Serialization failed: {}", e)))?;
        let url = self.generate_content_url(model_id);

        let text = self
            .execute_with_retry("rewrite_scene", || {
                self.request(Method::POST, &url, Some(&body))
            })
            .await?;

        let response: GenerateContentResponse = serde_json::from_str(&text)
            .map_err(|e| CoreError::Internal(format!("Failed to parse response: {}", e)))?;
        let scene_json = Self::extract_text(&response).ok_or_else(|| {
            CoreError::ScriptGeneration("Gemini returned no scene text".to_string())
        })?;

        serde_json::from_str(strip_code_fences(&scene_json))
            .map_err(|e| CoreError::ScriptGeneration(format!("Malformed scene JSON: {}", e)))
    }
}

#[async_trait]
impl SpeechProvider for GeminiProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn synthesize(&self, params: &SpeechParams) -> CoreResult<PcmClip> {
        let body = Self::tts_request_body(params);
        let body = serde_json::to_string(&body)
            .map_err(|e| CoreError::Internal(format!("Serialization failed: {}", e)))?;
        let url = self.generate_content_url(&self.speech_model);

        let text = self
            .execute_with_retry("synthesize", || {
                self.request(Method::POST, &url, Some(&body))
            })
            .await?;

        let response: GenerateContentResponse = serde_json::from_str(&text)
            .map_err(|e| CoreError::Internal(format!("Failed to parse response: {}", e)))?;
        let inline = Self::extract_inline_data(&response).ok_or_else(|| {
            CoreError::GenerationFailed("Gemini returned no audio data".to_string())
        })?;

        let rate = Self::parse_pcm_rate(&inline.mime_type).unwrap_or(params.sample_rate_hz);
        let samples = Self::decode_pcm_base64(&inline.data)?;
        debug!("Gemini synthesized {} PCM samples at {} Hz", samples.len(), rate);
        Ok(PcmClip::new(samples, rate))
    }
}

#[async_trait]
impl VideoGenerator for GeminiProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn submit(&self, params: &VideoGenerationParams) -> CoreResult<VideoJobHandle> {
        params.validate().map_err(CoreError::ValidationError)?;

        let body = self.video_request_body(params);
        let body = serde_json::to_string(&body)
            .map_err(|e| CoreError::Internal(format!("Serialization failed: {}", e)))?;
        let url = self.predict_url();

        let text = self
            .execute_with_retry("submit", || self.request(Method::POST, &url, Some(&body)))
            .await?;

        let operation: OperationResponse = serde_json::from_str(&text)
            .map_err(|e| CoreError::Internal(format!("Failed to parse response: {}", e)))?;

        info!(
            "Gemini video generation submitted: operation={}",
            operation.name
        );

        Ok(VideoJobHandle {
            provider: PROVIDER_NAME.to_string(),
            job_id: operation.name,
            submitted_at: chrono::Utc::now().timestamp(),
        })
    }

    async fn poll(&self, handle: &VideoJobHandle) -> CoreResult<VideoGenerationStatus> {
        let url = self.operation_url(&handle.job_id);

        let text = self
            .execute_with_retry("poll", || self.request(Method::GET, &url, None))
            .await?;

        let operation: OperationResponse = serde_json::from_str(&text)
            .map_err(|e| CoreError::Internal(format!("Failed to parse poll response: {}", e)))?;

        debug!(
            "Gemini poll for {}: done={}",
            handle.job_id, operation.done
        );
        Ok(self.operation_to_status(operation))
    }

    async fn cancel(&self, handle: &VideoJobHandle) -> CoreResult<()> {
        let url = self.cancel_url(&handle.job_id);

        self.execute_with_retry("cancel", || self.request(Method::POST, &url, Some("{}")))
            .await?;

        info!(
            "Gemini video generation cancelled: operation={}",
            handle.job_id
        );
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
