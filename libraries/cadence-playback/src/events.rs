//! Playback Events
//!
//! Discrete notifications for observers that care about transitions rather
//! than the latest state. Continuous values (position, queue contents) live
//! in [`PlayerSnapshot`](crate::PlayerSnapshot) instead.

use crate::types::PlaybackState;
use cadence_core::{PlaybackSettings, TrackId};
use serde::{Deserialize, Serialize};

/// Events emitted by the playback controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    /// State machine moved to a new state
    StateChanged {
        /// The new playback state
        state: PlaybackState,
    },

    /// A different track became current
    TrackChanged {
        /// ID of the new (current) track
        track_id: TrackId,
        /// ID of the previous track (if any)
        previous_track_id: Option<TrackId>,
    },

    /// Current resource played to its end
    TrackFinished {
        /// ID of the finished track
        track_id: TrackId,
    },

    /// Tracks added, removed or reordered
    QueueChanged {
        /// New queue length
        length: usize,
    },

    /// Volume, rate, repeat or shuffle changed
    SettingsChanged {
        /// Settings after the change
        settings: PlaybackSettings,
    },

    /// Liked flag of the current track confirmed by the gateway
    LikeChanged {
        /// Track whose flag changed
        track_id: TrackId,
        /// New flag value
        liked: bool,
    },

    /// Load or playback failure, emitted once per failure
    Error {
        /// Error message
        message: String,
    },
}
