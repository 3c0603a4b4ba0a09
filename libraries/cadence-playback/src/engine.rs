//! Platform-agnostic audio engine trait
//!
//! The controller never decodes audio itself. Platforms provide an
//! [`AudioEngine`] that owns the output resource and reports progress back as
//! [`EngineStatus`] events tagged with the handle they belong to.

use crate::error::Result;
use async_trait::async_trait;
use std::fmt;

/// Opaque reference to one loaded resource inside the engine
///
/// Engines must never reuse a handle value within a process; the controller
/// relies on handle identity to discard callbacks from detached resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EngineHandle(u64);

impl EngineHandle {
    /// Wrap an engine-specific identifier
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw identifier
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EngineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Progress report emitted by the engine for one handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineStatus {
    /// Resource the report belongs to
    pub handle: EngineHandle,

    /// Current position
    pub position_millis: u64,

    /// Total duration (0 while unknown)
    pub duration_millis: u64,

    /// Whether the resource is still loaded
    pub is_loaded: bool,

    /// Set once, when playback reaches the end
    pub did_finish: bool,
}

impl EngineStatus {
    /// Regular position tick
    pub fn tick(handle: EngineHandle, position_millis: u64, duration_millis: u64) -> Self {
        Self {
            handle,
            position_millis,
            duration_millis,
            is_loaded: true,
            did_finish: false,
        }
    }

    /// End-of-resource report
    pub fn finished(handle: EngineHandle, duration_millis: u64) -> Self {
        Self {
            handle,
            position_millis: duration_millis,
            duration_millis,
            is_loaded: true,
            did_finish: true,
        }
    }
}

/// Load/transport primitives for one audio resource at a time
///
/// Implementations report load problems as
/// [`PlaybackError::LoadFailure`](crate::PlaybackError::LoadFailure) and other
/// command failures as [`PlaybackError::Engine`](crate::PlaybackError::Engine).
#[async_trait]
pub trait AudioEngine: Send + Sync {
    /// Open and buffer `source_uri` without starting playback
    async fn load(&self, source_uri: &str) -> Result<EngineHandle>;

    /// Start or resume output
    async fn play(&self, handle: EngineHandle) -> Result<()>;

    /// Pause output, keeping the position
    async fn pause(&self, handle: EngineHandle) -> Result<()>;

    /// Move the play head
    async fn seek(&self, handle: EngineHandle, position_millis: u64) -> Result<()>;

    /// Set linear output volume (0.0 - 1.0)
    async fn set_volume(&self, handle: EngineHandle, volume: f32) -> Result<()>;

    /// Set playback speed, pitch corrected
    async fn set_rate(&self, handle: EngineHandle, rate: f32) -> Result<()>;

    /// Release the resource; the handle is dead afterwards
    async fn unload(&self, handle: EngineHandle) -> Result<()>;

    /// Restart the loaded resource from the beginning
    ///
    /// Equivalent to `seek(handle, 0)` followed by `play(handle)`
    async fn replay(&self, handle: EngineHandle) -> Result<()> {
        self.seek(handle, 0).await?;
        self.play(handle).await
    }
}
