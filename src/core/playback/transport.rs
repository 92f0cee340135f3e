//! Media transport abstraction
//!
//! A [`MediaTransport`] is the command surface of one paired video+audio
//! deck. The session issues commands through it and receives feedback as
//! [`MediaEvent`]s fed back through `PlayerSession::handle_event`. Commands
//! are fire-and-forget: failures surface as events, not return values.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::core::TimeSec;

// =============================================================================
// Transport Contract
// =============================================================================

/// Commands the player session issues to its media deck.
///
/// Contract for implementors:
/// - both elements hold exactly one scene's sources at a time,
/// - the audio element is the authoritative clock; the video element loops
///   as visual filler when it is shorter than the audio,
/// - `load_sources` replaces both sources and aborts any load still in
///   flight; a `SourceReady` event is delivered only for the most recent
///   load,
/// - positions are scene-local seconds.
pub trait MediaTransport: Send + Sync {
    /// Replaces both deck sources
    fn load_sources(&self, video_url: &str, audio_url: &str);

    /// Seeks both elements to a scene-local offset
    fn seek(&self, offset: TimeSec);

    /// Starts both elements in lockstep
    fn play(&self);

    /// Pauses both elements
    fn pause(&self);

    /// Sets the voiceover gain in [0, 1]
    fn set_voice_volume(&self, volume: f32);
}

// =============================================================================
// Media Events
// =============================================================================

/// Feedback from the media deck, delivered to `PlayerSession::handle_event`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MediaEvent {
    /// Both sources finished loading; `duration` is the audio duration
    #[serde(rename_all = "camelCase")]
    SourceReady { duration: TimeSec },
    /// The audio clock advanced to a scene-local position
    #[serde(rename_all = "camelCase")]
    Progress { position: TimeSec },
    /// The audio element reached its end
    AudioEnded,
    /// The host refused to start playback (autoplay policy)
    PlaybackRejected,
    /// A source failed to fetch or decode
    Error { message: String },
}

// =============================================================================
// Recording Transport
// =============================================================================

/// Commands captured by [`RecordingTransport`]
#[derive(Clone, Debug, PartialEq)]
pub enum TransportCommand {
    Load {
        video_url: String,
        audio_url: String,
    },
    Seek {
        offset: TimeSec,
    },
    Play,
    Pause,
    SetVoiceVolume {
        volume: f32,
    },
}

/// Headless transport that records every command it receives.
///
/// Stands in for a real deck in tests and in embedders that only need the
/// session's state machine.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    commands: Mutex<Vec<TransportCommand>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// All commands received so far, in order
    pub fn commands(&self) -> Vec<TransportCommand> {
        self.commands.lock().unwrap().clone()
    }

    pub fn last_command(&self) -> Option<TransportCommand> {
        self.commands.lock().unwrap().last().cloned()
    }

    /// Drops the recorded history
    pub fn clear(&self) {
        self.commands.lock().unwrap().clear();
    }

    /// Video URL of the most recent `Load` command, if any
    pub fn loaded_video_url(&self) -> Option<String> {
        self.commands
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find_map(|cmd| match cmd {
                TransportCommand::Load { video_url, .. } => Some(video_url.clone()),
                _ => None,
            })
    }

    fn record(&self, command: TransportCommand) {
        self.commands.lock().unwrap().push(command);
    }
}

impl MediaTransport for RecordingTransport {
    fn load_sources(&self, video_url: &str, audio_url: &str) {
        self.record(TransportCommand::Load {
            video_url: video_url.to_string(),
            audio_url: audio_url.to_string(),
        });
    }

    fn seek(&self, offset: TimeSec) {
        self.record(TransportCommand::Seek { offset });
    }

    fn play(&self) {
        self.record(TransportCommand::Play);
    }

    fn pause(&self) {
        self.record(TransportCommand::Pause);
    }

    fn set_voice_volume(&self, volume: f32) {
        self.record(TransportCommand::SetVoiceVolume { volume });
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_transport_keeps_order() {
        let transport = RecordingTransport::new();
        transport.load_sources("blob:v1", "blob:a1");
        transport.seek(3.5);
        transport.play();

        let commands = transport.commands();
        assert_eq!(commands.len(), 3);
        assert_eq!(
            commands[0],
            TransportCommand::Load {
                video_url: "blob:v1".to_string(),
                audio_url: "blob:a1".to_string(),
            }
        );
        assert_eq!(commands[2], TransportCommand::Play);
        assert_eq!(transport.loaded_video_url(), Some("blob:v1".to_string()));
    }

    #[test]
    fn test_media_event_serialization() {
        let json = serde_json::to_value(MediaEvent::SourceReady { duration: 8.0 }).unwrap();
        assert_eq!(json["type"], "sourceReady");
        assert_eq!(json["duration"], 8.0);

        let json = serde_json::to_value(MediaEvent::AudioEnded).unwrap();
        assert_eq!(json["type"], "audioEnded");

        let event: MediaEvent =
            serde_json::from_str(r#"{"type":"progress","position":2.5}"#).unwrap();
        assert_eq!(event, MediaEvent::Progress { position: 2.5 });
    }
}
