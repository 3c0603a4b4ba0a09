//! Cadence Core
//!
//! Platform-agnostic types and boundary traits shared by the Cadence crates.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Track`, `TrackId`, `UserId`, `PlaybackSettings`,
//!   `SessionSnapshot`
//! - **Gateway Traits**: `PersistenceGateway`, `LikeGateway`,
//!   `NotificationGateway` (implemented outside the playback controller)
//! - **Error Handling**: `CoreError` and `Result`
//!
//! # Example
//!
//! ```rust
//! use cadence_core::{PlaybackSettings, RepeatMode, Track};
//!
//! let track = Track::new("t1", "Intro", "Some Band", "https://cdn.example.com/t1.mp3");
//! assert_eq!(track.id.as_str(), "t1");
//!
//! let settings = PlaybackSettings::default();
//! assert_eq!(settings.repeat_mode, RepeatMode::Off);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod traits;
pub mod types;

pub use error::{CoreError, Result};
pub use traits::{LikeGateway, NotificationGateway, PersistenceGateway};
pub use types::{PlaybackSettings, RepeatMode, SessionSnapshot, Track, TrackId, UserId};
