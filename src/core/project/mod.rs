//! Ad Project Container
//!
//! The ownership container the engines borrow from: one commercial in
//! progress, from brief to compiled export. Holds the script, the asset
//! board covering it, the production phase, and the audio/overlay
//! configuration applied at preview and composition time.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::assets::AssetBoard;
use crate::core::script::AdScript;
use crate::core::{CoreError, CoreResult, SceneId, TimeSec};

// =============================================================================
// Project Phase
// =============================================================================

/// Workflow phase of a project
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectPhase {
    /// Fresh project, no script requested yet
    #[default]
    Idle,
    /// A script draft is being generated
    Scripting,
    /// Script attached, awaiting edits or production
    ReviewScript,
    /// Asset production is running
    Producing,
    /// Every scene has playable assets
    Completed,
    /// An unrecoverable workflow error occurred
    Error,
}

// =============================================================================
// Production Configuration
// =============================================================================

/// Audio mix applied during preview and composition
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioMixConfig {
    /// Stock music track id, if any
    pub music_track_id: Option<String>,
    /// Background music gain, 0.0 to 1.0
    pub music_volume: f32,
    /// Voiceover gain, 0.0 to 1.0
    pub voice_volume: f32,
    /// Duck music under active voiceover
    pub ducking_enabled: bool,
}

impl Default for AudioMixConfig {
    fn default() -> Self {
        Self {
            music_track_id: None,
            music_volume: 0.3,
            voice_volume: 1.0,
            ducking_enabled: true,
        }
    }
}

impl AudioMixConfig {
    /// Validates the mix levels
    pub fn validate(&self) -> Result<(), String> {
        if !self.music_volume.is_finite() || !(0.0..=1.0).contains(&self.music_volume) {
            return Err(format!("Invalid music volume: {}", self.music_volume));
        }
        if !self.voice_volume.is_finite() || !(0.0..=1.0).contains(&self.voice_volume) {
            return Err(format!("Invalid voice volume: {}", self.voice_volume));
        }
        Ok(())
    }
}

/// A text overlay pinned to one scene
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextOverlay {
    pub scene_id: SceneId,
    pub text: String,
    /// Key into the preset style table
    pub style_id: String,
}

/// Everything the composition layer needs beyond the raw assets
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionConfig {
    pub audio: AudioMixConfig,
    pub overlays: Vec<TextOverlay>,
}

impl ProductionConfig {
    /// Validates the configuration
    pub fn validate(&self) -> Result<(), String> {
        self.audio.validate()
    }
}

// =============================================================================
// Stock Music
// =============================================================================

/// A background music track from the built-in library
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicTrack {
    pub id: String,
    pub name: String,
    pub genre: String,
    pub mood: String,
    pub url: String,
    pub duration: TimeSec,
}

impl MusicTrack {
    fn stock(id: &str, name: &str, genre: &str, mood: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            genre: genre.to_string(),
            mood: mood.to_string(),
            url: String::new(),
            duration: 120.0,
        }
    }
}

/// Returns the built-in background music library
pub fn stock_music_library() -> Vec<MusicTrack> {
    vec![
        MusicTrack::stock("track_corporate", "Success Driven", "Corporate", "corporate"),
        MusicTrack::stock("track_cinematic", "Epic Horizon", "Orchestral", "cinematic"),
        MusicTrack::stock("track_chill", "LoFi Study", "LoFi", "calm"),
        MusicTrack::stock("track_upbeat", "Sunny Day", "Pop", "playful"),
        MusicTrack::stock("track_rock", "High Energy", "Rock", "energetic"),
        MusicTrack::stock("track_dramatic", "Suspense Builder", "Ambient", "dramatic"),
    ]
}

/// Looks up a stock track by id
pub fn stock_track(id: &str) -> Option<MusicTrack> {
    stock_music_library().into_iter().find(|t| t.id == id)
}

// =============================================================================
// Ad Project
// =============================================================================

/// One commercial in progress
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdProject {
    /// Unique project id (UUID v4)
    pub id: String,
    /// Project name
    pub name: String,
    /// Campaign description used as the scripting brief
    pub description: String,
    /// Approved or in-review script
    pub script: Option<AdScript>,
    /// Per-scene asset state covering the script
    pub assets: AssetBoard,
    /// Workflow phase
    pub phase: ProjectPhase,
    /// Audio mix and overlay configuration
    pub config: ProductionConfig,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
    /// Last modified timestamp (RFC 3339)
    pub modified_at: String,
}

impl AdProject {
    /// Creates a fresh project
    pub fn new(name: impl Into<String>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            description: String::new(),
            script: None,
            assets: AssetBoard::new(),
            phase: ProjectPhase::Idle,
            config: ProductionConfig::default(),
            created_at: now.clone(),
            modified_at: now,
        }
    }

    /// Sets the campaign description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Updates the modified timestamp
    pub fn touch(&mut self) {
        self.modified_at = chrono::Utc::now().to_rfc3339();
    }

    /// Sets the workflow phase
    pub fn set_phase(&mut self, phase: ProjectPhase) {
        self.phase = phase;
        self.touch();
    }

    /// Attaches a script, resetting the asset board to pending coverage
    /// and moving the project into review.
    pub fn attach_script(&mut self, script: AdScript) {
        self.assets = AssetBoard::for_script(&script);
        self.script = Some(script);
        self.phase = ProjectPhase::ReviewScript;
        self.touch();
    }

    /// The attached script, or `ScriptMissing`
    pub fn require_script(&self) -> CoreResult<&AdScript> {
        self.script.as_ref().ok_or(CoreError::ScriptMissing)
    }

    /// Post-load fixup for a freshly deserialized project.
    ///
    /// Generation requests do not survive the session that issued them, so
    /// slots stuck in `Generating` become errors and a stale `Producing`
    /// phase drops back to review. Returns the number of slots sanitized.
    pub fn restore(&mut self) -> usize {
        let sanitized = self.assets.sanitize_interrupted();
        if let Some(script) = &self.script {
            self.assets.align_with(script);
        }
        if self.phase == ProjectPhase::Producing {
            warn!(
                "Project '{}' was saved mid-production, returning to review",
                self.name
            );
            self.phase = ProjectPhase::ReviewScript;
        }
        sanitized
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::assets::TrackKind;
    use crate::core::script::Scene;

    fn script() -> AdScript {
        AdScript::new("Launch Day", "Early adopters")
            .with_scene(Scene::new(1, "Product tease", "Something new.", 10.0))
            .with_scene(Scene::new(2, "Studio reveal", "Meet the future.", 12.0))
    }

    // =========================================================================
    // Project Tests
    // =========================================================================

    #[test]
    fn test_new_project_defaults() {
        let project = AdProject::new("Summer Campaign");

        assert!(uuid::Uuid::parse_str(&project.id).is_ok());
        assert_eq!(project.phase, ProjectPhase::Idle);
        assert!(project.script.is_none());
        assert!(project.assets.is_empty());
        assert_eq!(project.created_at, project.modified_at);

        assert_eq!(project.config.audio.voice_volume, 1.0);
        assert_eq!(project.config.audio.music_volume, 0.3);
        assert!(project.config.audio.ducking_enabled);
        assert!(project.config.audio.music_track_id.is_none());
        assert!(project.config.overlays.is_empty());
    }

    #[test]
    fn test_attach_script_resets_board() {
        let mut project = AdProject::new("Summer Campaign");
        project.attach_script(script());
        project
            .assets
            .status_mut(1)
            .unwrap()
            .mark_completed(TrackKind::Video, "blob:v1");

        // A regenerated script replaces the board wholesale.
        let new_script = AdScript::new("Launch Day v2", "Early adopters")
            .with_scene(Scene::new(1, "New tease", "Something newer.", 10.0));
        project.attach_script(new_script);

        assert_eq!(project.phase, ProjectPhase::ReviewScript);
        assert_eq!(project.assets.len(), 1);
        assert_eq!(project.assets.status(1).unwrap().video_url(), None);
        assert_eq!(project.script.as_ref().unwrap().title, "Launch Day v2");
    }

    #[test]
    fn test_touch_updates_modified() {
        let mut project = AdProject::new("P");
        let old_modified = project.modified_at.clone();
        project.touch();
        assert_ne!(project.modified_at, old_modified);
        assert_eq!(project.created_at, old_modified);
    }

    #[test]
    fn test_require_script() {
        let mut project = AdProject::new("P");
        assert!(matches!(
            project.require_script(),
            Err(CoreError::ScriptMissing)
        ));

        project.attach_script(script());
        assert!(project.require_script().is_ok());
    }

    #[test]
    fn test_restore_sanitizes_and_demotes() {
        let mut project = AdProject::new("P");
        project.attach_script(script());
        project.phase = ProjectPhase::Producing;
        project
            .assets
            .status_mut(1)
            .unwrap()
            .mark_generating(TrackKind::Audio);

        let sanitized = project.restore();

        assert_eq!(sanitized, 1);
        assert_eq!(project.phase, ProjectPhase::ReviewScript);
        assert!(project
            .assets
            .status(1)
            .unwrap()
            .audio
            .error_message()
            .is_some());
    }

    #[test]
    fn test_restore_keeps_terminal_phase() {
        let mut project = AdProject::new("P");
        project.attach_script(script());
        project.phase = ProjectPhase::Completed;

        project.restore();
        assert_eq!(project.phase, ProjectPhase::Completed);
    }

    #[test]
    fn test_project_round_trip() {
        let mut project = AdProject::new("Summer Campaign").with_description("Sell lamps");
        project.attach_script(script());
        project.config.audio.music_track_id = Some("track_chill".to_string());
        project.config.overlays.push(TextOverlay {
            scene_id: 2,
            text: "50% off".to_string(),
            style_id: "bold_center".to_string(),
        });

        let json = serde_json::to_string(&project).unwrap();
        assert!(json.contains("\"phase\":\"review_script\""));
        assert!(json.contains("\"createdAt\""));

        let back: AdProject = serde_json::from_str(&json).unwrap();
        assert_eq!(back, project);
    }

    // =========================================================================
    // Config Tests
    // =========================================================================

    #[test]
    fn test_audio_mix_validate() {
        assert!(AudioMixConfig::default().validate().is_ok());

        let loud = AudioMixConfig {
            voice_volume: 1.5,
            ..Default::default()
        };
        assert!(loud.validate().is_err());

        let broken = AudioMixConfig {
            music_volume: f32::NAN,
            ..Default::default()
        };
        assert!(broken.validate().is_err());
    }

    // =========================================================================
    // Stock Music Tests
    // =========================================================================

    #[test]
    fn test_stock_music_library() {
        let library = stock_music_library();
        assert_eq!(library.len(), 6);

        let mut ids: Vec<_> = library.iter().map(|t| t.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 6);

        let track = stock_track("track_cinematic").unwrap();
        assert_eq!(track.name, "Epic Horizon");
        assert_eq!(track.mood, "cinematic");

        assert!(stock_track("track_unknown").is_none());
    }
}
