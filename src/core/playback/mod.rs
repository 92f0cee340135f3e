//! Playback Synchronization
//!
//! Preview playback over generated scene assets: a state machine
//! ([`PlayerSession`]) coordinating one paired video+audio deck behind a
//! [`MediaTransport`], with scene advancement driven by the audio clock.

mod session;
mod transport;

pub use session::PlayerSession;
pub use transport::{MediaEvent, MediaTransport, RecordingTransport, TransportCommand};

use serde::{Deserialize, Serialize};

/// Player session states
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    /// Not playing; initial state, also entered on pause and on finishing
    #[default]
    Stopped,
    /// Deck sources are being swapped; a seek may be parked until readiness
    Loading,
    /// Audio clock advancing, video looping underneath
    Playing,
    /// Drag in progress; the pointer owns the play-head
    Scrubbing,
}
