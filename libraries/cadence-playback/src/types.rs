//! Core types for playback management

use cadence_core::{PlaybackSettings, Track};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Playback state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackState {
    /// No resource loaded
    #[default]
    Idle,

    /// Engine load in flight
    Loading,

    /// Resource loaded and playing
    Playing,

    /// Resource loaded, paused mid-track
    Paused,

    /// Resource reached its end, advance not applied yet
    Ended,

    /// Load or playback failure (see `last_error`)
    Error,
}

impl PlaybackState {
    /// Whether an engine resource is attached in this state
    pub fn has_resource(self) -> bool {
        matches!(self, Self::Playing | Self::Paused | Self::Ended)
    }
}

/// Direction of a manual or automatic skip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards the end of the queue
    Next,
    /// Towards the start of the queue
    Previous,
}

/// Transport action relayed from the platform notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteCommand {
    /// Toggle between playing and paused
    PlayPause,
    /// Skip forward
    Next,
    /// Skip backward
    Previous,
}

/// Configuration for the playback controller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Upper bound for the playback rate (default: 4.0)
    pub max_rate: f32,

    /// Buffered events per subscriber before lagging (default: 64)
    pub event_capacity: usize,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_rate: 4.0,
            event_capacity: 64,
        }
    }
}

/// Read-only view of the controller handed to observers
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSnapshot {
    /// Track the controller considers current
    pub current_track: Option<Track>,

    /// State machine state
    pub state: PlaybackState,

    /// Playback position reported by the engine
    pub position_millis: u64,

    /// Duration reported by the engine
    pub duration_millis: u64,

    /// Live queue order
    pub queue: Arc<[Track]>,

    /// Index of the current track in `queue`
    pub current_index: Option<usize>,

    /// Persisted playback settings
    pub settings: PlaybackSettings,

    /// Liked status of the current track for the signed-in user
    pub is_liked: bool,

    /// Message of the most recent load or playback failure
    pub last_error: Option<String>,
}

impl PlayerSnapshot {
    /// Whether audio is audibly playing
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }
}

impl Default for PlayerSnapshot {
    fn default() -> Self {
        Self {
            current_track: None,
            state: PlaybackState::Idle,
            position_millis: 0,
            duration_millis: 0,
            queue: Arc::from(Vec::new()),
            current_index: None,
            settings: PlaybackSettings::default(),
            is_liked: false,
            last_error: None,
        }
    }
}
