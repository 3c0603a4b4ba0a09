//! Local gateway implementations for the terminal host

use async_trait::async_trait;
use cadence_core::{LikeGateway, NotificationGateway, Result, TrackId, UserId};
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};
use tracing::info;

/// Liked songs kept for the lifetime of the process
#[derive(Debug, Default)]
pub struct InMemoryLikes {
    liked: Mutex<HashSet<(UserId, TrackId)>>,
}

impl InMemoryLikes {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LikeGateway for InMemoryLikes {
    async fn is_liked(&self, track_id: &TrackId, user: &UserId) -> Result<bool> {
        let liked = self.liked.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(liked.contains(&(user.clone(), track_id.clone())))
    }

    async fn set_liked(&self, track_id: &TrackId, user: &UserId, liked: bool) -> Result<()> {
        let mut set = self.liked.lock().unwrap_or_else(PoisonError::into_inner);
        let key = (user.clone(), track_id.clone());
        if liked {
            set.insert(key);
        } else {
            set.remove(&key);
        }
        Ok(())
    }
}

/// Now-playing surface that writes to the log
#[derive(Debug, Default)]
pub struct LogNotifications;

#[async_trait]
impl NotificationGateway for LogNotifications {
    async fn publish(&self, title: &str, artist: &str, is_playing: bool) -> Result<()> {
        let status = if is_playing { "playing" } else { "paused" };
        info!(target: "cadence::now_playing", "{status}: {title} - {artist}");
        Ok(())
    }

    async fn dismiss(&self) -> Result<()> {
        info!(target: "cadence::now_playing", "dismissed");
        Ok(())
    }
}
