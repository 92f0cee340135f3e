//! Ad Script Models
//!
//! Scene and script structures shared between the LLM wire schema and the
//! rest of the engine. Field names stay snake_case to match the JSON the
//! script provider returns.

use serde::{Deserialize, Serialize};

use crate::core::{SceneId, TimeSec};

// =============================================================================
// Scene
// =============================================================================

/// One shot of the advertisement: visual description, voiceover line, and a
/// target duration that drives all timeline math.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Unique within a script, stable ordering key
    pub id: SceneId,
    /// Visual description for the video generation model
    pub visual_prompt: String,
    /// Spoken words for this scene
    pub voiceover_text: String,
    /// Target duration in seconds, authoritative for the timeline
    pub estimated_duration: TimeSec,
}

impl Scene {
    /// Creates a new scene
    pub fn new(
        id: SceneId,
        visual_prompt: impl Into<String>,
        voiceover_text: impl Into<String>,
        estimated_duration: TimeSec,
    ) -> Self {
        Self {
            id,
            visual_prompt: visual_prompt.into(),
            voiceover_text: voiceover_text.into(),
            estimated_duration,
        }
    }

    /// Validates the scene fields
    pub fn validate(&self) -> Result<(), String> {
        if self.visual_prompt.trim().is_empty() {
            return Err(format!("Scene {} has an empty visual prompt", self.id));
        }
        if !self.estimated_duration.is_finite() || self.estimated_duration < 0.0 {
            return Err(format!(
                "Scene {} has an invalid duration: {}",
                self.id, self.estimated_duration
            ));
        }
        Ok(())
    }
}

// =============================================================================
// AdScript
// =============================================================================

/// A complete multi-scene commercial script
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdScript {
    /// Ad title
    pub title: String,
    /// Summary of who the ad speaks to
    pub target_audience: String,
    /// Ordered scenes
    pub scenes: Vec<Scene>,
}

impl AdScript {
    /// Creates a new script
    pub fn new(title: impl Into<String>, target_audience: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            target_audience: target_audience.into(),
            scenes: Vec::new(),
        }
    }

    /// Appends a scene (builder style)
    pub fn with_scene(mut self, scene: Scene) -> Self {
        self.scenes.push(scene);
        self
    }

    /// Sum of all scene durations in seconds
    pub fn total_estimated_duration(&self) -> TimeSec {
        self.scenes.iter().map(|s| s.estimated_duration).sum()
    }

    /// Looks up a scene by id
    pub fn scene(&self, id: SceneId) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.id == id)
    }

    /// Returns the ordinal position of a scene id
    pub fn scene_index(&self, id: SceneId) -> Option<usize> {
        self.scenes.iter().position(|s| s.id == id)
    }

    /// Replaces a scene in place by id. Returns false if the id is unknown.
    pub fn replace_scene(&mut self, scene: Scene) -> bool {
        match self.scene_index(scene.id) {
            Some(idx) => {
                self.scenes[idx] = scene;
                true
            }
            None => false,
        }
    }

    /// Validates the whole script
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Script title cannot be empty".to_string());
        }
        if self.scenes.is_empty() {
            return Err("Script must contain at least one scene".to_string());
        }
        let mut seen = std::collections::HashSet::new();
        for scene in &self.scenes {
            if !seen.insert(scene.id) {
                return Err(format!("Duplicate scene id: {}", scene.id));
            }
            scene.validate()?;
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_script() -> AdScript {
        AdScript::new("Launch Day", "Early adopters")
            .with_scene(Scene::new(1, "Cinematic product tease", "Something new is coming.", 10.0))
            .with_scene(Scene::new(2, "Slow reveal under studio lights", "Meet the future.", 12.0))
            .with_scene(Scene::new(3, "Logo on black", "Available now.", 8.0))
    }

    // =========================================================================
    // Scene Tests
    // =========================================================================

    #[test]
    fn test_scene_validate() {
        let scene = Scene::new(1, "Drone view of a coastline", "Breathe.", 10.0);
        assert!(scene.validate().is_ok());
    }

    #[test]
    fn test_scene_validate_empty_prompt() {
        let scene = Scene::new(1, "  ", "Breathe.", 10.0);
        assert!(scene.validate().is_err());
    }

    #[test]
    fn test_scene_validate_negative_duration() {
        let scene = Scene::new(1, "Drone view", "Breathe.", -1.0);
        assert!(scene.validate().is_err());
    }

    #[test]
    fn test_scene_zero_duration_is_legal() {
        let scene = Scene::new(1, "Flash frame", "", 0.0);
        assert!(scene.validate().is_ok());
    }

    #[test]
    fn test_scene_wire_format_is_snake_case() {
        let scene = Scene::new(1, "Studio shot", "Hello.", 10.0);
        let json = serde_json::to_string(&scene).unwrap();
        assert!(json.contains("\"visual_prompt\""));
        assert!(json.contains("\"voiceover_text\""));
        assert!(json.contains("\"estimated_duration\""));
    }

    #[test]
    fn test_scene_deserializes_integer_duration() {
        // Providers return integer durations; the model stores seconds as f64.
        let json = r#"{"id":1,"visual_prompt":"Studio shot","voiceover_text":"Hi","estimated_duration":10}"#;
        let scene: Scene = serde_json::from_str(json).unwrap();
        assert_eq!(scene.estimated_duration, 10.0);
    }

    // =========================================================================
    // AdScript Tests
    // =========================================================================

    #[test]
    fn test_script_total_duration() {
        assert_eq!(sample_script().total_estimated_duration(), 30.0);
    }

    #[test]
    fn test_script_lookup() {
        let script = sample_script();
        assert_eq!(script.scene(2).unwrap().estimated_duration, 12.0);
        assert_eq!(script.scene_index(3), Some(2));
        assert!(script.scene(99).is_none());
    }

    #[test]
    fn test_script_replace_scene() {
        let mut script = sample_script();
        let rewritten = Scene::new(2, "Macro shot of brushed aluminum", "Meet the future.", 11.0);
        assert!(script.replace_scene(rewritten.clone()));
        assert_eq!(script.scene(2), Some(&rewritten));

        let unknown = Scene::new(42, "Nope", "Nope", 5.0);
        assert!(!script.replace_scene(unknown));
    }

    #[test]
    fn test_script_validate() {
        assert!(sample_script().validate().is_ok());

        let empty = AdScript::new("Title", "Audience");
        assert!(empty.validate().is_err());

        let dup = AdScript::new("Title", "Audience")
            .with_scene(Scene::new(1, "A", "a", 5.0))
            .with_scene(Scene::new(1, "B", "b", 5.0));
        assert!(dup.validate().unwrap_err().contains("Duplicate scene id"));
    }

    #[test]
    fn test_script_serialization_round_trip() {
        let script = sample_script();
        let json = serde_json::to_string(&script).unwrap();
        let back: AdScript = serde_json::from_str(&json).unwrap();
        assert_eq!(back, script);
    }
}
