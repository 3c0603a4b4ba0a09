//! Cadence - Playback Session Controller
//!
//! Platform-agnostic playback session management for Cadence.
//!
//! This crate provides:
//! - Queue management (replace, append, remove, shuffle with restorable order)
//! - Repeat modes (Off, One, All)
//! - The playback state machine (`Idle`, `Loading`, `Playing`, `Paused`,
//!   `Ended`, `Error`)
//! - "Latest load wins" arbitration between overlapping play intents
//! - Fire-and-forget session persistence
//!
//! # Architecture
//!
//! `cadence-playback` never touches audio hardware, files or the network.
//! Everything platform specific is injected through traits:
//! - [`AudioEngine`] loads resources and reports [`EngineStatus`]
//! - [`cadence_core::PersistenceGateway`] stores the session snapshot
//! - [`cadence_core::LikeGateway`] answers and updates liked status
//! - [`cadence_core::NotificationGateway`] mirrors the current track to the
//!   platform's now-playing surface
//!
//! Observers read [`PlayerSnapshot`]s from a watch channel and discrete
//! [`PlaybackEvent`]s from a broadcast channel.
//!
//! # Example: Queue
//!
//! ```rust
//! use cadence_core::{RepeatMode, Track};
//! use cadence_playback::{Direction, Queue};
//!
//! let tracks = vec![
//!     Track::new("s1", "One", "Band", "file:///s1.mp3"),
//!     Track::new("s2", "Two", "Band", "file:///s2.mp3"),
//! ];
//!
//! let mut queue = Queue::new();
//! queue.replace(tracks, 0, false).unwrap();
//!
//! assert_eq!(queue.advance(Direction::Next, RepeatMode::Off, false), Some(1));
//! assert_eq!(queue.advance(Direction::Previous, RepeatMode::Off, false), Some(0));
//! ```
//!
//! # Example: Controller
//!
//! ```rust,ignore
//! use cadence_playback::{PlaybackController, PlayerConfig, PlayerServices};
//!
//! let controller = PlaybackController::init(services, PlayerConfig::default(), Some(user)).await;
//! controller.spawn_status_pump(engine_statuses);
//!
//! controller.play_list(tracks, 0).await?;
//! controller.pause().await;
//! controller.next().await;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod controller;
pub mod engine;
pub mod error;
pub mod events;
pub mod persistence;
pub mod queue;
mod shuffle;
pub mod types;

pub use controller::{PlaybackController, PlayerServices};
pub use engine::{AudioEngine, EngineHandle, EngineStatus};
pub use error::{PlaybackError, Result};
pub use events::PlaybackEvent;
pub use persistence::SnapshotWriter;
pub use queue::{Queue, Removed};
pub use types::{Direction, PlaybackState, PlayerConfig, PlayerSnapshot, RemoteCommand};
