//! Error types for playback management

use cadence_core::{CoreError, TrackId};
use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Queue navigation with an index outside the queue
    #[error("Index out of bounds: {0}")]
    InvalidIndex(usize),

    /// The audio engine could not open or buffer a source
    #[error("Failed to load audio: {0}")]
    LoadFailure(String),

    /// The current track is missing from the restored order
    #[error("Track not found in queue: {0}")]
    TrackNotFound(TrackId),

    /// Audio engine command other than load failed
    #[error("Audio engine error: {0}")]
    Engine(String),

    /// Playback rate must be a finite positive number
    #[error("Invalid playback rate: {0}")]
    InvalidRate(f32),

    /// Persistence, like or notification gateway failed
    #[error(transparent)]
    Gateway(#[from] CoreError),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
