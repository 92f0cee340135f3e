//! Generated Asset State
//!
//! Tracks per-scene generation state for the two media tracks (video clip,
//! voiceover audio). A playable URL exists only inside the `Completed`
//! variant, so "URL present iff completed" holds by construction.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::script::AdScript;
use crate::core::SceneId;

// =============================================================================
// Track Kind
// =============================================================================

/// Which generated track of a scene is being referenced
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
    Video,
    Audio,
}

impl std::fmt::Display for TrackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackKind::Video => write!(f, "video"),
            TrackKind::Audio => write!(f, "audio"),
        }
    }
}

// =============================================================================
// Asset Slot
// =============================================================================

/// Generation state of one track of one scene
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AssetSlot {
    /// No generation requested yet
    Pending,
    /// A generation request is in flight
    Generating,
    /// Generation succeeded; `url` is a playable media location
    Completed { url: String },
    /// Generation failed; retriable
    Error { message: String },
}

impl AssetSlot {
    /// Returns true if the slot holds playable media
    pub fn is_completed(&self) -> bool {
        matches!(self, AssetSlot::Completed { .. })
    }

    /// Returns true while a request is in flight
    pub fn is_generating(&self) -> bool {
        matches!(self, AssetSlot::Generating)
    }

    /// Returns true for completed or error states
    pub fn is_terminal(&self) -> bool {
        matches!(self, AssetSlot::Completed { .. } | AssetSlot::Error { .. })
    }

    /// Playable URL, present only when completed
    pub fn url(&self) -> Option<&str> {
        match self {
            AssetSlot::Completed { url } => Some(url),
            _ => None,
        }
    }

    /// Failure message, present only on error
    pub fn error_message(&self) -> Option<&str> {
        match self {
            AssetSlot::Error { message } => Some(message),
            _ => None,
        }
    }
}

// =============================================================================
// Asset Status
// =============================================================================

/// Per-scene generation state, one-to-one with a scene by `scene_id`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetStatus {
    pub scene_id: SceneId,
    pub video: AssetSlot,
    pub audio: AssetSlot,
}

impl AssetStatus {
    /// Creates a status with both tracks pending
    pub fn new(scene_id: SceneId) -> Self {
        Self {
            scene_id,
            video: AssetSlot::Pending,
            audio: AssetSlot::Pending,
        }
    }

    /// Returns the slot for a track
    pub fn slot(&self, kind: TrackKind) -> &AssetSlot {
        match kind {
            TrackKind::Video => &self.video,
            TrackKind::Audio => &self.audio,
        }
    }

    /// Returns the slot for a track, mutably
    pub fn slot_mut(&mut self, kind: TrackKind) -> &mut AssetSlot {
        match kind {
            TrackKind::Video => &mut self.video,
            TrackKind::Audio => &mut self.audio,
        }
    }

    /// Marks a track as in flight, clearing any previous URL or error
    pub fn mark_generating(&mut self, kind: TrackKind) {
        *self.slot_mut(kind) = AssetSlot::Generating;
    }

    /// Marks a track completed with its playable URL
    pub fn mark_completed(&mut self, kind: TrackKind, url: impl Into<String>) {
        *self.slot_mut(kind) = AssetSlot::Completed { url: url.into() };
    }

    /// Marks a track failed with a message
    pub fn mark_error(&mut self, kind: TrackKind, message: impl Into<String>) {
        *self.slot_mut(kind) = AssetSlot::Error {
            message: message.into(),
        };
    }

    /// True when both tracks are completed (the scene is playable)
    pub fn is_ready(&self) -> bool {
        self.video.is_completed() && self.audio.is_completed()
    }

    /// Video URL, present only when the video track is completed
    pub fn video_url(&self) -> Option<&str> {
        self.video.url()
    }

    /// Audio URL, present only when the audio track is completed
    pub fn audio_url(&self) -> Option<&str> {
        self.audio.url()
    }
}

// =============================================================================
// Asset Board
// =============================================================================

/// Ordered collection of per-scene asset statuses covering one script
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetBoard {
    statuses: Vec<AssetStatus>,
}

impl AssetBoard {
    /// Creates an empty board
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a board with one pending status per scene, in script order
    pub fn for_script(script: &AdScript) -> Self {
        Self {
            statuses: script
                .scenes
                .iter()
                .map(|scene| AssetStatus::new(scene.id))
                .collect(),
        }
    }

    /// Looks up a scene's status
    pub fn status(&self, scene_id: SceneId) -> Option<&AssetStatus> {
        self.statuses.iter().find(|s| s.scene_id == scene_id)
    }

    /// Looks up a scene's status, mutably
    pub fn status_mut(&mut self, scene_id: SceneId) -> Option<&mut AssetStatus> {
        self.statuses.iter_mut().find(|s| s.scene_id == scene_id)
    }

    /// Iterates statuses in script order
    pub fn iter(&self) -> impl Iterator<Item = &AssetStatus> {
        self.statuses.iter()
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    /// Number of scenes with both tracks completed
    pub fn ready_count(&self) -> usize {
        self.statuses.iter().filter(|s| s.is_ready()).count()
    }

    /// True when every scene is playable
    pub fn all_ready(&self) -> bool {
        !self.statuses.is_empty() && self.statuses.iter().all(|s| s.is_ready())
    }

    /// Converts slots stuck in `Generating` into errors.
    ///
    /// A generation request cannot survive the session that issued it, so a
    /// freshly loaded project with in-flight slots was interrupted. Returns
    /// the number of slots sanitized.
    pub fn sanitize_interrupted(&mut self) -> usize {
        let mut sanitized = 0;
        for status in &mut self.statuses {
            for kind in [TrackKind::Video, TrackKind::Audio] {
                if status.slot(kind).is_generating() {
                    warn!(
                        "Scene {} {} generation was interrupted, marking as error",
                        status.scene_id, kind
                    );
                    status.mark_error(kind, "Interrupted");
                    sanitized += 1;
                }
            }
        }
        sanitized
    }

    /// Reconciles the board with a changed script: statuses for removed
    /// scenes are dropped, new scenes get pending statuses, and surviving
    /// scenes keep their state. Order follows the script.
    pub fn align_with(&mut self, script: &AdScript) {
        let mut aligned = Vec::with_capacity(script.scenes.len());
        for scene in &script.scenes {
            match self.statuses.iter().find(|s| s.scene_id == scene.id) {
                Some(existing) => aligned.push(existing.clone()),
                None => aligned.push(AssetStatus::new(scene.id)),
            }
        }
        self.statuses = aligned;
    }
}

// =============================================================================
// Tests
// =============================================================================
