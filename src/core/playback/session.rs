//! Player session state machine
//!
//! A [`PlayerSession`] drives one paired video+audio deck across scene
//! boundaries. The session owns no threads and takes no locks: hosts call
//! its operations and feed transport feedback through
//! [`handle_event`](PlayerSession::handle_event), and read state back
//! through accessors. Multiple independent sessions may coexist, each with
//! its own transport.
//!
//! The audio track is the authoritative clock. Scene advancement happens
//! only on [`MediaEvent::AudioEnded`]; the video element loops as visual
//! filler underneath a longer voiceover.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::core::assets::AssetBoard;
use crate::core::playback::{MediaEvent, MediaTransport, PlaybackState};
use crate::core::project::ProductionConfig;
use crate::core::script::Scene;
use crate::core::timeline::{PlayheadPosition, SceneTimeline};
use crate::core::{CoreError, CoreResult, SceneId, TimeSec};

// =============================================================================
// Player Session
// =============================================================================

/// Preview playback session over an ordered scene list and its asset board
pub struct PlayerSession {
    scenes: Vec<Scene>,
    assets: AssetBoard,
    timeline: SceneTimeline,
    transport: Arc<dyn MediaTransport>,

    state: PlaybackState,
    current_scene: usize,
    local_offset: TimeSec,
    voice_volume: f32,
    looping: bool,
    finished: bool,

    /// Scene-local offset to apply once the deck reports readiness.
    /// Newer targets supersede older ones; cleared when applied.
    pending_seek: Option<TimeSec>,
    /// Start playback once the in-flight load completes
    resume_after_load: bool,
    /// Playback was active when the current drag began
    resume_after_scrub: bool,
    /// Scene whose sources were most recently issued to the deck
    loaded_scene: Option<usize>,
    /// A load was issued and `SourceReady` has not arrived yet
    awaiting_ready: bool,
}

impl PlayerSession {
    /// Opens a session positioned at `initial_scene_index` (clamped into
    /// range), in the Stopped state. If the initial scene already has both
    /// assets, its sources are preloaded.
    pub fn open(
        transport: Arc<dyn MediaTransport>,
        scenes: Vec<Scene>,
        assets: AssetBoard,
        config: &ProductionConfig,
        initial_scene_index: usize,
    ) -> CoreResult<Self> {
        if scenes.is_empty() {
            return Err(CoreError::ValidationError(
                "Cannot open a player session without scenes".to_string(),
            ));
        }

        let timeline = SceneTimeline::from_scenes(&scenes);
        let current_scene = initial_scene_index.min(scenes.len() - 1);

        let mut session = Self {
            scenes,
            assets,
            timeline,
            transport,
            state: PlaybackState::Stopped,
            current_scene,
            local_offset: 0.0,
            voice_volume: config.audio.voice_volume.clamp(0.0, 1.0),
            looping: false,
            finished: false,
            pending_seek: None,
            resume_after_load: false,
            resume_after_scrub: false,
            loaded_scene: None,
            awaiting_ready: false,
        };

        if session.scene_ready(session.current_scene) {
            session.load_current();
        }
        Ok(session)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Current play-head as (scene index, local offset)
    pub fn position(&self) -> PlayheadPosition {
        PlayheadPosition::new(self.current_scene, self.local_offset)
    }

    /// Play-head mapped onto the global time axis
    pub fn global_time(&self) -> TimeSec {
        self.timeline.start_offset(self.current_scene).unwrap_or(0.0) + self.local_offset
    }

    /// Progress through the whole ad in [0, 100]
    pub fn progress_percent(&self) -> f64 {
        self.timeline.progress_percent(self.global_time())
    }

    pub fn timeline(&self) -> &SceneTimeline {
        &self.timeline
    }

    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// True after the last scene's audio ended with looping off
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// True when the current scene has both assets completed. Hosts disable
    /// their play control on false; this is a precondition, not an error.
    pub fn can_play(&self) -> bool {
        self.scene_ready(self.current_scene)
    }

    // =========================================================================
    // Transport Control
    // =========================================================================

    /// Starts playback from the current position. A finished session rewinds
    /// to the first scene before starting over.
    ///
    /// Returns `AssetsIncomplete` when the current scene lacks a completed
    /// asset; callers are expected to gate on [`can_play`](Self::can_play).
    pub fn play(&mut self) -> CoreResult<()> {
        match self.state {
            PlaybackState::Playing | PlaybackState::Scrubbing => return Ok(()),
            PlaybackState::Loading => {
                self.resume_after_load = true;
                return Ok(());
            }
            PlaybackState::Stopped => {}
        }

        if self.finished {
            self.finished = false;
            self.current_scene = 0;
            self.local_offset = 0.0;
            if self.loaded_scene == Some(0) && !self.awaiting_ready {
                self.transport.seek(0.0);
            }
        }

        let scene_id = self.current_scene_id().ok_or_else(|| {
            CoreError::Internal("Player scene index out of range".to_string())
        })?;
        if !self.scene_ready(self.current_scene) {
            return Err(CoreError::AssetsIncomplete(scene_id));
        }

        if self.loaded_scene != Some(self.current_scene) {
            self.pending_seek = Some(self.local_offset);
            self.resume_after_load = true;
            self.load_current();
            self.state = PlaybackState::Loading;
            return Ok(());
        }
        if self.awaiting_ready {
            self.resume_after_load = true;
            self.state = PlaybackState::Loading;
            return Ok(());
        }

        self.transport.play();
        self.state = PlaybackState::Playing;
        Ok(())
    }

    /// Pauses playback. Cancels a pending autoplay if a load is in flight.
    pub fn pause(&mut self) {
        match self.state {
            PlaybackState::Playing => {
                self.transport.pause();
                self.state = PlaybackState::Stopped;
            }
            PlaybackState::Loading => {
                self.resume_after_load = false;
                self.state = PlaybackState::Stopped;
            }
            PlaybackState::Stopped | PlaybackState::Scrubbing => {}
        }
    }

    pub fn set_loop(&mut self, looping: bool) {
        self.looping = looping;
    }

    pub fn toggle_loop(&mut self) -> bool {
        self.looping = !self.looping;
        self.looping
    }

    /// Applies a new voiceover gain to the deck immediately
    pub fn set_voice_volume(&mut self, volume: f32) {
        self.voice_volume = volume.clamp(0.0, 1.0);
        self.transport.set_voice_volume(self.voice_volume);
    }

    /// Replaces the asset board, picking up generation results that
    /// completed after the session was opened.
    pub fn update_assets(&mut self, assets: AssetBoard) {
        self.assets = assets;
    }

    // =========================================================================
    // Scrubbing
    // =========================================================================

    /// Enters the Scrubbing state: both elements pause and the pointer owns
    /// the play-head until [`scrub_end`](Self::scrub_end).
    pub fn scrub_begin(&mut self) {
        if self.state == PlaybackState::Scrubbing {
            return;
        }
        self.resume_after_scrub = self.state == PlaybackState::Playing
            || (self.state == PlaybackState::Loading && self.resume_after_load);
        self.resume_after_load = false;
        self.transport.pause();
        self.state = PlaybackState::Scrubbing;
    }

    /// Scrubs to a fraction of the total duration in [0, 1]
    pub fn scrub_to_fraction(&mut self, fraction: f64) {
        let fraction = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.scrub_to(fraction * self.timeline.total_duration());
    }

    /// Scrubs to a global time while a drag is in progress.
    ///
    /// Within the loaded scene the deck seeks immediately for a live
    /// preview. A target in another scene swaps sources and parks the local
    /// offset as the pending seek; a newer target supersedes an older
    /// pending one.
    pub fn scrub_to(&mut self, global_time: TimeSec) {
        if self.state != PlaybackState::Scrubbing {
            debug!("scrub_to outside of a drag, ignoring");
            return;
        }

        let pos = self.timeline.resolve(global_time);
        self.finished = false;
        self.current_scene = pos.scene_index;
        self.local_offset = pos.local_offset;

        if self.loaded_scene == Some(pos.scene_index) && !self.awaiting_ready {
            self.pending_seek = None;
            self.transport.seek(pos.local_offset);
        } else if self.scene_ready(pos.scene_index) {
            self.pending_seek = Some(pos.local_offset);
            if self.loaded_scene != Some(pos.scene_index) {
                self.load_current();
            }
        } else {
            self.pending_seek = None;
            debug!(
                "Scrub landed on scene {} without playable assets",
                pos.scene_index
            );
        }
    }

    /// Leaves the Scrubbing state. Playback resumes only if it was active
    /// when the drag began and the landing scene is playable.
    pub fn scrub_end(&mut self) {
        if self.state != PlaybackState::Scrubbing {
            return;
        }
        let resume = self.resume_after_scrub;
        self.resume_after_scrub = false;

        if self.awaiting_ready {
            self.resume_after_load = resume;
            self.state = PlaybackState::Loading;
            return;
        }
        if resume && self.scene_ready(self.current_scene) {
            self.transport.play();
            self.state = PlaybackState::Playing;
        } else {
            self.state = PlaybackState::Stopped;
        }
    }

    // =========================================================================
    // Scene Navigation
    // =========================================================================

    /// Stops playback and repositions at the start of the given scene
    pub fn jump_to_scene(&mut self, scene_index: usize) -> CoreResult<()> {
        if scene_index >= self.scenes.len() {
            return Err(CoreError::ValidationError(format!(
                "Scene index {} out of range ({} scenes)",
                scene_index,
                self.scenes.len()
            )));
        }

        self.transport.pause();
        self.state = PlaybackState::Stopped;
        self.resume_after_load = false;
        self.resume_after_scrub = false;
        self.finished = false;
        self.current_scene = scene_index;
        self.local_offset = 0.0;

        if self.loaded_scene == Some(scene_index) && !self.awaiting_ready {
            self.pending_seek = None;
            self.transport.seek(0.0);
        } else if self.scene_ready(scene_index) {
            self.pending_seek = Some(0.0);
            self.load_current();
            self.state = PlaybackState::Loading;
        } else {
            self.pending_seek = None;
        }
        Ok(())
    }

    // =========================================================================
    // Event Handling
    // =========================================================================

    /// Processes one piece of transport feedback
    pub fn handle_event(&mut self, event: MediaEvent) {
        match event {
            MediaEvent::SourceReady { duration } => self.on_source_ready(duration),
            MediaEvent::Progress { position } => self.on_progress(position),
            MediaEvent::AudioEnded => self.on_audio_ended(),
            MediaEvent::PlaybackRejected => {
                debug!("Playback rejected by host autoplay policy");
                self.resume_after_load = false;
                if matches!(self.state, PlaybackState::Playing | PlaybackState::Loading) {
                    self.state = PlaybackState::Stopped;
                }
            }
            MediaEvent::Error { message } => {
                warn!("Media error during preview: {}", message);
                self.pending_seek = None;
                self.resume_after_load = false;
                self.resume_after_scrub = false;
                self.awaiting_ready = false;
                self.loaded_scene = None;
                if self.state != PlaybackState::Scrubbing {
                    self.state = PlaybackState::Stopped;
                }
            }
        }
    }

    fn on_source_ready(&mut self, duration: TimeSec) {
        self.awaiting_ready = false;

        if let Some(target) = self.pending_seek.take() {
            let offset = target.clamp(0.0, duration.max(0.0));
            self.transport.seek(offset);
            self.local_offset = offset;
        }

        if self.state == PlaybackState::Loading {
            if self.resume_after_load {
                self.resume_after_load = false;
                self.transport.play();
                self.state = PlaybackState::Playing;
            } else {
                self.state = PlaybackState::Stopped;
            }
        }
        // Scrubbing and Stopped keep their state; a drag resumes on release.
    }

    fn on_progress(&mut self, position: TimeSec) {
        // The pointer owns the play-head during a drag, and a deck being
        // swapped can still flush ticks from its old sources.
        if self.state == PlaybackState::Scrubbing || self.awaiting_ready {
            return;
        }
        if position.is_finite() {
            self.local_offset = position.max(0.0);
        }
    }

    fn on_audio_ended(&mut self) {
        if self.state != PlaybackState::Playing {
            debug!("Audio ended outside of playback, ignoring");
            return;
        }

        if self.looping {
            self.local_offset = 0.0;
            self.transport.seek(0.0);
            self.transport.play();
            return;
        }

        let next = self.current_scene + 1;
        if next < self.scenes.len() {
            self.current_scene = next;
            self.local_offset = 0.0;
            if self.scene_ready(next) {
                self.pending_seek = Some(0.0);
                self.resume_after_load = true;
                self.load_current();
                self.state = PlaybackState::Loading;
            } else {
                warn!("Scene {} assets not ready, stopping playback", next);
                self.state = PlaybackState::Stopped;
            }
        } else {
            self.local_offset = self.timeline.duration(self.current_scene).unwrap_or(0.0);
            self.finished = true;
            self.state = PlaybackState::Stopped;
        }
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    fn current_scene_id(&self) -> Option<SceneId> {
        self.scenes.get(self.current_scene).map(|s| s.id)
    }

    fn scene_ready(&self, scene_index: usize) -> bool {
        self.scenes
            .get(scene_index)
            .and_then(|scene| self.assets.status(scene.id))
            .is_some_and(|status| status.is_ready())
    }

    /// Issues a source swap for the current scene. Voice volume is applied
    /// on every load because a source swap resets element gain.
    fn load_current(&mut self) {
        let urls = self.scenes.get(self.current_scene).and_then(|scene| {
            let status = self.assets.status(scene.id)?;
            Some((status.video_url()?.to_string(), status.audio_url()?.to_string()))
        });
        if let Some((video_url, audio_url)) = urls {
            self.transport.load_sources(&video_url, &audio_url);
            self.transport.set_voice_volume(self.voice_volume);
            self.loaded_scene = Some(self.current_scene);
            self.awaiting_ready = true;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
