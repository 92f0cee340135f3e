//! Script Studio Engine
//!
//! Wraps a script provider with the model selection policy: try the primary
//! model, and absorb quota/rate failures by retrying once on the fallback
//! model. Any other failure propagates unchanged.

use std::sync::Arc;
use tracing::{info, warn};

use super::models::{AdScript, Scene};
use super::provider::{ScriptProvider, ScriptRequest, MODEL_SCRIPT_FALLBACK, MODEL_SCRIPT_PRIMARY};
use crate::core::{CoreError, CoreResult};

// =============================================================================
// Configuration
// =============================================================================

/// Script studio configuration
#[derive(Clone, Debug)]
pub struct ScriptStudioConfig {
    /// Model tried first
    pub primary_model: String,
    /// Model used when the primary reports quota exhaustion
    pub fallback_model: String,
}

impl Default for ScriptStudioConfig {
    fn default() -> Self {
        Self {
            primary_model: MODEL_SCRIPT_PRIMARY.to_string(),
            fallback_model: MODEL_SCRIPT_FALLBACK.to_string(),
        }
    }
}

// =============================================================================
// Studio
// =============================================================================

/// Drafting engine for ad scripts
pub struct ScriptStudio {
    provider: Arc<dyn ScriptProvider>,
    config: ScriptStudioConfig,
}

impl ScriptStudio {
    /// Creates a studio with the default model configuration
    pub fn new(provider: Arc<dyn ScriptProvider>) -> Self {
        Self {
            provider,
            config: ScriptStudioConfig::default(),
        }
    }

    /// Overrides the model configuration
    pub fn with_config(mut self, config: ScriptStudioConfig) -> Self {
        self.config = config;
        self
    }

    /// Drafts a complete script for the request.
    pub async fn generate(&self, request: &ScriptRequest) -> CoreResult<AdScript> {
        request.validate().map_err(CoreError::ValidationError)?;

        if !self.provider.is_available() {
            return Err(CoreError::ProviderUnavailable(
                self.provider.name().to_string(),
            ));
        }

        let script = match self
            .provider
            .generate_script(request, &self.config.primary_model)
            .await
        {
            Ok(script) => script,
            Err(e) if e.is_quota_exhausted() => {
                warn!(
                    "Primary model {} quota exceeded, falling back to {}",
                    self.config.primary_model, self.config.fallback_model
                );
                self.provider
                    .generate_script(request, &self.config.fallback_model)
                    .await?
            }
            Err(e) => return Err(e),
        };

        script
            .validate()
            .map_err(CoreError::ScriptGeneration)?;

        info!(
            "Generated script '{}' with {} scenes ({}s)",
            script.title,
            script.scenes.len(),
            script.total_estimated_duration()
        );
        Ok(script)
    }

    /// Rewrites one scene, preserving its id.
    pub async fn rewrite_scene(&self, scene: &Scene) -> CoreResult<Scene> {
        scene.validate().map_err(CoreError::ValidationError)?;

        let mut rewritten = match self
            .provider
            .rewrite_scene(scene, &self.config.primary_model)
            .await
        {
            Ok(rewritten) => rewritten,
            Err(e) if e.is_quota_exhausted() => {
                warn!(
                    "Primary model {} quota exceeded, falling back to {} for rewrite",
                    self.config.primary_model, self.config.fallback_model
                );
                self.provider
                    .rewrite_scene(scene, &self.config.fallback_model)
                    .await?
            }
            Err(e) => return Err(e),
        };

        if rewritten.id != scene.id {
            warn!(
                "Rewrite changed scene id {} to {}, restoring original",
                scene.id, rewritten.id
            );
            rewritten.id = scene.id;
        }

        rewritten.validate().map_err(CoreError::ScriptGeneration)?;
        Ok(rewritten)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::script::provider::MockScriptProvider;
    use async_trait::async_trait;

    fn request() -> ScriptRequest {
        ScriptRequest::new("Aurora Lamp", "Launch our new smart lamp")
    }

    #[tokio::test]
    async fn test_generate_uses_primary_model() {
        let provider = Arc::new(MockScriptProvider::new());
        let studio = ScriptStudio::new(provider.clone());

        let script = studio.generate(&request()).await.unwrap();
        assert_eq!(script.scenes.len(), 6);
        assert_eq!(provider.requested_models(), vec![MODEL_SCRIPT_PRIMARY]);
    }

    #[tokio::test]
    async fn test_generate_falls_back_on_quota() {
        let provider =
            Arc::new(MockScriptProvider::new().with_quota_models(&[MODEL_SCRIPT_PRIMARY]));
        let studio = ScriptStudio::new(provider.clone());

        let script = studio.generate(&request()).await.unwrap();
        assert!(script.validate().is_ok());
        assert_eq!(
            provider.requested_models(),
            vec![MODEL_SCRIPT_PRIMARY, MODEL_SCRIPT_FALLBACK]
        );
    }

    #[tokio::test]
    async fn test_generate_propagates_non_quota_errors() {
        let provider = Arc::new(MockScriptProvider::new().with_failure("schema mismatch"));
        let studio = ScriptStudio::new(provider.clone());

        let err = studio.generate(&request()).await.unwrap_err();
        assert!(matches!(err, CoreError::ScriptGeneration(_)));
        // No fallback attempt for non-quota failures.
        assert_eq!(provider.requested_models(), vec![MODEL_SCRIPT_PRIMARY]);
    }

    #[tokio::test]
    async fn test_generate_fails_when_both_models_over_quota() {
        let provider = Arc::new(
            MockScriptProvider::new()
                .with_quota_models(&[MODEL_SCRIPT_PRIMARY, MODEL_SCRIPT_FALLBACK]),
        );
        let studio = ScriptStudio::new(provider);

        let err = studio.generate(&request()).await.unwrap_err();
        assert!(err.is_quota_exhausted());
    }

    #[tokio::test]
    async fn test_generate_rejects_invalid_request() {
        let studio = ScriptStudio::new(Arc::new(MockScriptProvider::new()));
        let bad = ScriptRequest::new("", "");
        let err = studio.generate(&bad).await.unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_rewrite_restores_changed_id() {
        struct WrongIdProvider;

        #[async_trait]
        impl ScriptProvider for WrongIdProvider {
            fn name(&self) -> &str {
                "wrong-id"
            }
            fn is_available(&self) -> bool {
                true
            }
            async fn generate_script(
                &self,
                _request: &ScriptRequest,
                _model_id: &str,
            ) -> CoreResult<AdScript> {
                Err(CoreError::NotSupported("generate".to_string()))
            }
            async fn rewrite_scene(&self, scene: &Scene, _model_id: &str) -> CoreResult<Scene> {
                let mut out = scene.clone();
                out.id = 999;
                Ok(out)
            }
        }

        let studio = ScriptStudio::new(Arc::new(WrongIdProvider));
        let scene = Scene::new(2, "Plain shot", "Line.", 10.0);
        let rewritten = studio.rewrite_scene(&scene).await.unwrap();
        assert_eq!(rewritten.id, 2);
    }
}
