//! Script Provider Abstraction
//!
//! Provider seam for LLM-backed script drafting. The studio engine decides
//! which model id to request; providers only execute a single attempt.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

use super::models::{AdScript, Scene};
use crate::core::{CoreError, CoreResult, TimeSec};

// =============================================================================
// Model Constants
// =============================================================================

/// Primary scripting model (highest quality, quota-limited)
pub const MODEL_SCRIPT_PRIMARY: &str = "gemini-3-pro-preview";

/// Fallback scripting model used when the primary hits quota limits
pub const MODEL_SCRIPT_FALLBACK: &str = "gemini-2.5-flash";

/// Thinking budget for the primary model, in tokens
pub const SCRIPT_THINKING_BUDGET: u32 = 32_768;

/// System instruction sent with every script request
pub const SYSTEM_INSTRUCTION_SCRIPT: &str = "\
You are an award-winning Creative Director for a high-end advertising agency.
Your goal is to write a compelling, detailed commercial script for a video ad that is AT LEAST 60 seconds long.
Break the ad down into exactly 6 scenes. Each scene should be approximately 10-12 seconds.
Return the result strictly as a JSON object with keys: title, target_audience,
and scenes (each scene: id, visual_prompt, voiceover_text, estimated_duration).
ENSURE the 'visual_prompt' is descriptive and optimized for generative video.";

// =============================================================================
// Request Types
// =============================================================================

/// Brand identity folded into the scripting prompt
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandContext {
    pub name: String,
    pub category: String,
    pub target_audience: String,
    pub about: String,
}

/// A script drafting request
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptRequest {
    /// Product or campaign name
    pub product_name: String,
    /// What the campaign should achieve
    pub description: String,
    /// Requested voiceover tone (e.g. "professional", "energetic")
    pub voiceover_style: String,
    /// Optional brand identity context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<BrandContext>,
    /// Minimum length of the finished ad in seconds
    pub target_duration_sec: TimeSec,
}

impl ScriptRequest {
    /// Creates a request with default tone and duration
    pub fn new(product_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            product_name: product_name.into(),
            description: description.into(),
            voiceover_style: "professional".to_string(),
            brand: None,
            target_duration_sec: 60.0,
        }
    }

    /// Sets the voiceover tone
    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.voiceover_style = style.into();
        self
    }

    /// Attaches brand context
    pub fn with_brand(mut self, brand: BrandContext) -> Self {
        self.brand = Some(brand);
        self
    }

    /// Validates the request
    pub fn validate(&self) -> Result<(), String> {
        if self.product_name.trim().is_empty() {
            return Err("Product name cannot be empty".to_string());
        }
        if self.description.trim().is_empty() {
            return Err("Campaign description cannot be empty".to_string());
        }
        if self.description.len() > 4096 {
            return Err("Campaign description too long (max 4096 characters)".to_string());
        }
        Ok(())
    }

    /// Builds the user prompt sent to the model
    pub fn build_prompt(&self) -> String {
        let mut prompt = format!(
            "Product/Campaign: {}\nCampaign Goal: {}\nVOICEOVER STYLE: {}\n\n",
            self.product_name, self.description, self.voiceover_style
        );

        if let Some(brand) = &self.brand {
            prompt.push_str(&format!(
                "BRAND IDENTITY & CONTEXT:\nBrand Name: {}\nIndustry/Category: {}\nTarget Audience: {}\n\nAbout the Brand:\n{}\n\n",
                brand.name, brand.category, brand.target_audience, brand.about
            ));
        }

        prompt.push_str(&format!(
            "TASK: Create a {}+ second video ad script. The voiceover text must strictly follow the requested tone: {}.",
            self.target_duration_sec.round() as i64,
            self.voiceover_style
        ));
        prompt
    }
}

// =============================================================================
// Provider Trait
// =============================================================================

/// Trait for LLM script providers
#[async_trait]
pub trait ScriptProvider: Send + Sync {
    /// Returns the provider name
    fn name(&self) -> &str;

    /// Checks if the provider is configured and usable
    fn is_available(&self) -> bool;

    /// Drafts a full script with the given model
    async fn generate_script(&self, request: &ScriptRequest, model_id: &str)
        -> CoreResult<AdScript>;

    /// Rewrites one scene, keeping its id and approximate duration
    async fn rewrite_scene(&self, scene: &Scene, model_id: &str) -> CoreResult<Scene>;
}

/// Parses a script JSON payload, tolerating markdown code fences around it.
pub fn parse_script_json(raw: &str) -> CoreResult<AdScript> {
    let trimmed = strip_code_fences(raw);
    let script: AdScript = serde_json::from_str(trimmed)
        .map_err(|e| CoreError::ScriptGeneration(format!("Malformed script JSON: {}", e)))?;
    Ok(script)
}

/// Strips a leading/trailing markdown fence (``` or ```json) if present.
pub(crate) fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop an optional language tag on the opening fence line.
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

// =============================================================================
// Mock Provider for Testing
// =============================================================================

/// Deterministic script provider for tests.
///
/// Model ids listed in `quota_models` fail with a quota error; requests are
/// recorded so tests can assert the fallback order.
pub struct MockScriptProvider {
    name: String,
    quota_models: Vec<String>,
    failure: Option<String>,
    requests: Mutex<Vec<String>>,
}

impl MockScriptProvider {
    /// Creates a mock that succeeds on every model
    pub fn new() -> Self {
        Self {
            name: "mock-script".to_string(),
            quota_models: Vec::new(),
            failure: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Makes the given model ids fail with a quota error
    pub fn with_quota_models(mut self, models: &[&str]) -> Self {
        self.quota_models = models.iter().map(|m| m.to_string()).collect();
        self
    }

    /// Makes every request fail with a non-quota error
    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Model ids requested so far, in order
    pub fn requested_models(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn record(&self, model_id: &str) -> CoreResult<()> {
        self.requests.lock().unwrap().push(model_id.to_string());
        if let Some(message) = &self.failure {
            return Err(CoreError::ScriptGeneration(message.clone()));
        }
        if self.quota_models.iter().any(|m| m == model_id) {
            return Err(CoreError::QuotaExhausted(format!(
                "model {} is over quota",
                model_id
            )));
        }
        Ok(())
    }
}

impl Default for MockScriptProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScriptProvider for MockScriptProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn generate_script(
        &self,
        request: &ScriptRequest,
        model_id: &str,
    ) -> CoreResult<AdScript> {
        self.record(model_id)?;

        let mut script = AdScript::new(
            format!("{} Commercial", request.product_name),
            "General audience",
        );
        for id in 1..=6u32 {
            script.scenes.push(Scene::new(
                id,
                format!("Cinematic shot {} of {}", id, request.product_name),
                format!("Voiceover line {}.", id),
                10.0,
            ));
        }
        Ok(script)
    }

    async fn rewrite_scene(&self, scene: &Scene, model_id: &str) -> CoreResult<Scene> {
        self.record(model_id)?;

        Ok(Scene::new(
            scene.id,
            format!("{} (rewritten)", scene.visual_prompt),
            scene.voiceover_text.clone(),
            scene.estimated_duration,
        ))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // ScriptRequest Tests
    // =========================================================================

    #[test]
    fn test_request_validate() {
        let request = ScriptRequest::new("Aurora Lamp", "Launch our new smart lamp");
        assert!(request.validate().is_ok());

        let empty = ScriptRequest::new("", "desc");
        assert!(empty.validate().is_err());

        let long = ScriptRequest::new("X", "y".repeat(5000));
        assert!(long.validate().is_err());
    }

    #[test]
    fn test_request_prompt_includes_brand() {
        let request = ScriptRequest::new("Aurora Lamp", "Launch it").with_brand(BrandContext {
            name: "Lumen Co".to_string(),
            category: "Home".to_string(),
            target_audience: "Design lovers".to_string(),
            about: "We make light personal.".to_string(),
        });

        let prompt = request.build_prompt();
        assert!(prompt.contains("Aurora Lamp"));
        assert!(prompt.contains("Lumen Co"));
        assert!(prompt.contains("60+ second"));
    }

    // =========================================================================
    // JSON Parsing Tests
    // =========================================================================

    #[test]
    fn test_parse_script_json_plain() {
        let raw = r#"{"title":"T","target_audience":"A","scenes":[
            {"id":1,"visual_prompt":"Shot","voiceover_text":"Hi","estimated_duration":10}]}"#;
        let script = parse_script_json(raw).unwrap();
        assert_eq!(script.scenes.len(), 1);
    }

    #[test]
    fn test_parse_script_json_fenced() {
        let raw = "```json\n{\"title\":\"T\",\"target_audience\":\"A\",\"scenes\":[{\"id\":1,\"visual_prompt\":\"Shot\",\"voiceover_text\":\"Hi\",\"estimated_duration\":10}]}\n```";
        let script = parse_script_json(raw).unwrap();
        assert_eq!(script.title, "T");
    }

    #[test]
    fn test_parse_script_json_malformed() {
        let err = parse_script_json("not json").unwrap_err();
        assert!(matches!(err, CoreError::ScriptGeneration(_)));
    }

    #[test]
    fn test_strip_code_fences_variants() {
        assert_eq!(strip_code_fences("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
    }

    // =========================================================================
    // MockScriptProvider Tests
    // =========================================================================

    #[tokio::test]
    async fn test_mock_provider_generates_six_scenes() {
        let provider = MockScriptProvider::new();
        let request = ScriptRequest::new("Aurora Lamp", "Launch it");

        let script = provider
            .generate_script(&request, MODEL_SCRIPT_PRIMARY)
            .await
            .unwrap();

        assert_eq!(script.scenes.len(), 6);
        assert!(script.validate().is_ok());
        assert_eq!(provider.requested_models(), vec![MODEL_SCRIPT_PRIMARY]);
    }

    #[tokio::test]
    async fn test_mock_provider_quota_model() {
        let provider = MockScriptProvider::new().with_quota_models(&[MODEL_SCRIPT_PRIMARY]);
        let request = ScriptRequest::new("Aurora Lamp", "Launch it");

        let err = provider
            .generate_script(&request, MODEL_SCRIPT_PRIMARY)
            .await
            .unwrap_err();
        assert!(err.is_quota_exhausted());

        let ok = provider
            .generate_script(&request, MODEL_SCRIPT_FALLBACK)
            .await;
        assert!(ok.is_ok());
    }

    #[tokio::test]
    async fn test_mock_provider_rewrite_keeps_id() {
        let provider = MockScriptProvider::new();
        let scene = Scene::new(3, "Plain shot", "Line.", 10.0);

        let rewritten = provider
            .rewrite_scene(&scene, MODEL_SCRIPT_PRIMARY)
            .await
            .unwrap();
        assert_eq!(rewritten.id, 3);
        assert!(rewritten.visual_prompt.contains("rewritten"));
    }
}
