/// Boundary traits for collaborators of the playback controller
use crate::error::Result;
use crate::types::{SessionSnapshot, TrackId, UserId};
use async_trait::async_trait;

/// Durable key-value store for the playback session
///
/// The controller is the only writer. Implementations are passive: they
/// store whatever snapshot they are handed and return the last one on load.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Read the last saved snapshot
    ///
    /// Returns `Ok(None)` when nothing has been saved yet.
    async fn load(&self) -> Result<Option<SessionSnapshot>>;

    /// Replace the stored snapshot
    async fn save(&self, snapshot: &SessionSnapshot) -> Result<()>;
}

/// Remote "liked songs" lookup and toggle
#[async_trait]
pub trait LikeGateway: Send + Sync {
    /// Whether `user` has liked `track`
    async fn is_liked(&self, track: &TrackId, user: &UserId) -> Result<bool>;

    /// Set or clear the liked flag
    async fn set_liked(&self, track: &TrackId, user: &UserId, liked: bool) -> Result<()>;
}

/// Platform notification / lock-screen transport controls
///
/// Inbound actions from the notification travel the other way as
/// `RemoteCommand`s handed to the controller.
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    /// Show or refresh the now-playing notification
    async fn publish(&self, title: &str, artist: &str, is_playing: bool) -> Result<()>;

    /// Remove the now-playing notification
    async fn dismiss(&self) -> Result<()>;
}
