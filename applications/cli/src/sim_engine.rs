//! Simulated audio engine
//!
//! Stands in for a real output device: every loaded resource gets a ticker
//! task that advances its position while playing and reports progress on the
//! status channel, finishing after a fixed length.

use crate::config::EngineSettings;
use async_trait::async_trait;
use cadence_playback::{AudioEngine, EngineHandle, EngineStatus, PlaybackError, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace};

/// Sources with this scheme fail to load
pub const MISSING_SCHEME: &str = "missing:";

struct Resource {
    position_millis: u64,
    playing: bool,
    rate: f32,
    volume: f32,
    ticker: Option<JoinHandle<()>>,
}

type Resources = Arc<Mutex<HashMap<EngineHandle, Resource>>>;

pub struct SimulatedEngine {
    statuses: mpsc::UnboundedSender<EngineStatus>,
    resources: Resources,
    next_id: AtomicU64,
    tick: Duration,
    track_millis: u64,
}

impl SimulatedEngine {
    /// Create the engine and the receiving end of its status channel
    pub fn new(settings: &EngineSettings) -> (Self, mpsc::UnboundedReceiver<EngineStatus>) {
        let (statuses, receiver) = mpsc::unbounded_channel();
        let engine = Self {
            statuses,
            resources: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(1),
            tick: Duration::from_millis(settings.tick_millis.max(1)),
            track_millis: settings.track_millis,
        };
        (engine, receiver)
    }

    /// Number of resources currently loaded
    pub fn loaded(&self) -> usize {
        lock(&self.resources).len()
    }

    /// Volume applied to `handle`, if loaded
    pub fn volume(&self, handle: EngineHandle) -> Option<f32> {
        lock(&self.resources).get(&handle).map(|r| r.volume)
    }

    fn with_resource<T>(
        &self,
        handle: EngineHandle,
        f: impl FnOnce(&mut Resource) -> T,
    ) -> Result<T> {
        let mut resources = lock(&self.resources);
        let resource = resources
            .get_mut(&handle)
            .ok_or_else(|| PlaybackError::Engine(format!("unknown handle {handle}")))?;
        Ok(f(resource))
    }
}

#[async_trait]
impl AudioEngine for SimulatedEngine {
    async fn load(&self, source_uri: &str) -> Result<EngineHandle> {
        if source_uri.trim().is_empty() {
            return Err(PlaybackError::LoadFailure("empty source".to_string()));
        }
        if source_uri.starts_with(MISSING_SCHEME) {
            return Err(PlaybackError::LoadFailure(format!("not found: {source_uri}")));
        }

        // Buffering
        tokio::time::sleep(self.tick).await;

        let handle = EngineHandle::new(self.next_id.fetch_add(1, Ordering::Relaxed));

        // Registered before the ticker exists so its first tick finds it
        lock(&self.resources).insert(
            handle,
            Resource {
                position_millis: 0,
                playing: false,
                rate: 1.0,
                volume: 1.0,
                ticker: None,
            },
        );

        let ticker = tokio::spawn(run_ticker(
            handle,
            Arc::clone(&self.resources),
            self.statuses.clone(),
            self.tick,
            self.track_millis,
        ));
        match lock(&self.resources).get_mut(&handle) {
            Some(resource) => resource.ticker = Some(ticker),
            None => ticker.abort(),
        }

        debug!(%handle, source_uri, "Loaded resource");
        Ok(handle)
    }

    async fn play(&self, handle: EngineHandle) -> Result<()> {
        self.with_resource(handle, |r| r.playing = true)
    }

    async fn pause(&self, handle: EngineHandle) -> Result<()> {
        self.with_resource(handle, |r| r.playing = false)
    }

    async fn seek(&self, handle: EngineHandle, position_millis: u64) -> Result<()> {
        let track_millis = self.track_millis;
        self.with_resource(handle, |r| {
            r.position_millis = position_millis.min(track_millis);
        })
    }

    async fn set_volume(&self, handle: EngineHandle, volume: f32) -> Result<()> {
        self.with_resource(handle, |r| r.volume = volume)
    }

    async fn set_rate(&self, handle: EngineHandle, rate: f32) -> Result<()> {
        self.with_resource(handle, |r| r.rate = rate)
    }

    async fn unload(&self, handle: EngineHandle) -> Result<()> {
        let removed = lock(&self.resources).remove(&handle);
        match removed {
            Some(resource) => {
                if let Some(ticker) = resource.ticker {
                    ticker.abort();
                }
                debug!(%handle, "Unloaded resource");
                Ok(())
            }
            None => Err(PlaybackError::Engine(format!("unknown handle {handle}"))),
        }
    }
}

async fn run_ticker(
    handle: EngineHandle,
    resources: Resources,
    statuses: mpsc::UnboundedSender<EngineStatus>,
    tick: Duration,
    track_millis: u64,
) {
    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let step = tick.as_millis() as f64;

    loop {
        interval.tick().await;

        let status = {
            let mut resources = lock(&resources);
            let Some(resource) = resources.get_mut(&handle) else {
                return;
            };
            if !resource.playing {
                continue;
            }

            let advanced = (step * f64::from(resource.rate)) as u64;
            resource.position_millis = (resource.position_millis + advanced).min(track_millis);

            if resource.position_millis >= track_millis {
                // Stays loaded so the resource can be replayed
                resource.playing = false;
                EngineStatus::finished(handle, track_millis)
            } else {
                EngineStatus::tick(handle, resource.position_millis, track_millis)
            }
        };

        trace!(%handle, position = status.position_millis, "Tick");
        if statuses.send(status).is_err() {
            return;
        }
    }
}

fn lock(resources: &Resources) -> MutexGuard<'_, HashMap<EngineHandle, Resource>> {
    resources.lock().unwrap_or_else(PoisonError::into_inner)
}
