//! Playback controller - core orchestration
//!
//! Owns the queue, the playback state machine and the single audio engine
//! handle, and mediates between them and any number of observers.
//!
//! All mutable state lives behind one mutex that is never held across an
//! `.await`. The awaits (engine and gateway calls) are where other intents
//! can interleave, so every continuation re-checks the load generation or
//! the attached handle before applying its result.

use crate::{
    engine::{AudioEngine, EngineHandle, EngineStatus},
    error::{PlaybackError, Result},
    events::PlaybackEvent,
    persistence::SnapshotWriter,
    queue::Queue,
    types::{Direction, PlaybackState, PlayerConfig, PlayerSnapshot, RemoteCommand},
};
use cadence_core::{
    LikeGateway, NotificationGateway, PersistenceGateway, PlaybackSettings, RepeatMode,
    SessionSnapshot, Track, TrackId, UserId,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

/// External collaborators injected into the controller
#[derive(Clone)]
pub struct PlayerServices {
    /// Audio output
    pub engine: Arc<dyn AudioEngine>,
    /// Session store
    pub persistence: Arc<dyn PersistenceGateway>,
    /// Liked-songs backend
    pub likes: Arc<dyn LikeGateway>,
    /// Lock-screen / notification controls
    pub notifications: Arc<dyn NotificationGateway>,
}

/// Mutable controller state
struct Inner {
    state: PlaybackState,
    queue: Queue,
    settings: PlaybackSettings,
    current_track: Option<Track>,

    // Engine resource
    attached: Option<EngineHandle>,
    generation: u64,

    // Runtime values
    position_millis: u64,
    duration_millis: u64,
    is_liked: bool,
    last_error: Option<String>,

    user: Option<UserId>,

    // Shared with snapshots until the queue changes
    queue_view: Arc<[Track]>,
}

impl Inner {
    fn refresh_queue_view(&mut self) {
        self.queue_view = Arc::from(self.queue.tracks());
    }

    fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            current_track: self.current_track.clone(),
            state: self.state,
            position_millis: self.position_millis,
            duration_millis: self.duration_millis,
            queue: Arc::clone(&self.queue_view),
            current_index: self.queue.current_index(),
            settings: self.settings,
            is_liked: self.is_liked,
            last_error: self.last_error.clone(),
        }
    }

    fn session(&self) -> SessionSnapshot {
        SessionSnapshot {
            queue: self.queue.tracks().to_vec(),
            current_index: self.queue.current_index(),
            volume: self.settings.volume,
            rate: self.settings.rate,
            repeat_mode: self.settings.repeat_mode,
            shuffle: self.settings.shuffle,
            original_order: self.queue.original_order().map(<[Track]>::to_vec),
        }
    }

    /// Where `track` sits in the queue, preferring `hint` when it still holds it
    fn queued_position(&self, track: &Track, hint: usize) -> Option<usize> {
        match self.queue.get(hint) {
            Some(queued) if queued.same_item(track) => Some(hint),
            _ => self.queue.position_of(track),
        }
    }

    /// Detach the engine resource and cancel any in-flight load
    fn detach(&mut self) -> Option<EngineHandle> {
        self.generation += 1;
        self.position_millis = 0;
        self.duration_millis = 0;
        self.attached.take()
    }
}

/// What a skip resolved to, decided under the lock and executed after it
enum Step {
    Replay(EngineHandle),
    Play(Track, usize),
    Stop,
    Stay,
}

/// Central playback session controller
///
/// Created once per signed-in session with [`PlaybackController::init`] and
/// shared as `Arc<PlaybackController>`; ended with
/// [`PlaybackController::teardown`].
pub struct PlaybackController {
    engine: Arc<dyn AudioEngine>,
    likes: Arc<dyn LikeGateway>,
    notifications: Arc<dyn NotificationGateway>,
    writer: SnapshotWriter,
    config: PlayerConfig,

    inner: Mutex<Inner>,

    snapshot_tx: watch::Sender<PlayerSnapshot>,
    events_tx: broadcast::Sender<PlaybackEvent>,
}

impl PlaybackController {
    /// Start a session
    ///
    /// Loads the saved session once. A missing or unreadable snapshot starts
    /// an empty queue with default settings. Nothing is loaded into the
    /// engine until a play intent arrives.
    pub async fn init(
        services: PlayerServices,
        config: PlayerConfig,
        user: Option<UserId>,
    ) -> Arc<Self> {
        let restored = match services.persistence.load().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "Failed to load saved session, starting fresh");
                None
            }
        };

        let (queue, settings) = match restored {
            Some(snapshot) => {
                let settings = snapshot.settings().sanitized(config.max_rate);
                let queue = Queue::restore(
                    snapshot.queue,
                    snapshot.current_index,
                    snapshot.original_order,
                    settings.shuffle,
                );
                info!(
                    queue_len = queue.len(),
                    current_index = ?queue.current_index(),
                    "Restored playback session"
                );
                (queue, settings)
            }
            None => (Queue::new(), PlaybackSettings::default()),
        };

        let mut inner = Inner {
            state: PlaybackState::Idle,
            current_track: queue.current().cloned(),
            queue,
            settings,
            attached: None,
            generation: 0,
            position_millis: 0,
            duration_millis: 0,
            is_liked: false,
            last_error: None,
            user,
            queue_view: Arc::from(Vec::new()),
        };
        inner.refresh_queue_view();

        let (snapshot_tx, _) = watch::channel(inner.snapshot());
        let (events_tx, _) = broadcast::channel(config.event_capacity.max(1));

        Arc::new(Self {
            engine: services.engine,
            likes: services.likes,
            notifications: services.notifications,
            writer: SnapshotWriter::spawn(services.persistence),
            config,
            inner: Mutex::new(inner),
            snapshot_tx,
            events_tx,
        })
    }

    /// End the session (logout)
    ///
    /// Cancels any load, releases the engine handle, clears the queue and
    /// the signed-in user, dismisses the notification and waits for the
    /// cleared session to be saved.
    pub async fn teardown(&self) {
        let handle = {
            let mut inner = self.lock();
            let handle = inner.detach();
            inner.queue.clear();
            inner.refresh_queue_view();
            inner.current_track = None;
            inner.is_liked = false;
            inner.last_error = None;
            inner.user = None;
            inner.state = PlaybackState::Idle;
            self.persist(&inner);
            self.publish(&inner);
            handle
        };

        self.emit(PlaybackEvent::StateChanged {
            state: PlaybackState::Idle,
        });
        self.emit(PlaybackEvent::QueueChanged { length: 0 });

        if let Some(handle) = handle {
            self.release(handle).await;
        }
        self.dismiss_notification().await;
        self.writer.flush().await;
        info!("Playback session torn down");
    }

    // ===== Observation =====

    /// Current state
    pub fn snapshot(&self) -> PlayerSnapshot {
        self.lock().snapshot()
    }

    /// Receiver that sees every state change
    pub fn subscribe(&self) -> watch::Receiver<PlayerSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Receiver for discrete playback events
    pub fn events(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events_tx.subscribe()
    }

    /// Wait until every queued session save has reached the gateway
    pub async fn flush(&self) {
        self.writer.flush().await;
    }

    // ===== Playback Control =====

    /// Replace the queue with `tracks` and play the one at `start_index`
    ///
    /// An empty list clears the queue and stops playback.
    pub async fn play_list(&self, tracks: Vec<Track>, start_index: usize) -> Result<()> {
        let target = {
            let mut inner = self.lock();
            let shuffle = inner.settings.shuffle;
            inner.queue.replace(tracks, start_index, shuffle)?;
            inner.refresh_queue_view();
            self.persist(&inner);
            self.publish(&inner);

            let length = inner.queue.len();
            self.emit(PlaybackEvent::QueueChanged { length });

            inner
                .queue
                .current_index()
                .and_then(|i| inner.queue.get(i).cloned().map(|t| (t, i)))
        };

        match target {
            Some((track, index)) => self.play(track, index).await,
            None => self.stop_playback(true).await,
        }
        Ok(())
    }

    /// Play the queued track at `index`
    pub async fn play_index(&self, index: usize) -> Result<()> {
        let track = self
            .lock()
            .queue
            .get(index)
            .cloned()
            .ok_or(PlaybackError::InvalidIndex(index))?;
        self.play(track, index).await;
        Ok(())
    }

    /// Load and play the current track again (e.g. after an error)
    ///
    /// Falls back to the first queued track when nothing is current.
    pub async fn play_current(&self) {
        let target = {
            let inner = self.lock();
            match inner.queue.current_index() {
                Some(i) => inner.queue.get(i).cloned().map(|t| (t, i)),
                None => inner.queue.get(0).cloned().map(|t| (t, 0)),
            }
        };

        match target {
            Some((track, index)) => self.play(track, index).await,
            None => debug!("play_current with empty queue ignored"),
        }
    }

    /// Load `track` (queued at `index`) and start it
    ///
    /// This is the single serialization point for engine resources: the
    /// previous handle is detached before the new load starts, and a load
    /// that has been superseded by a later `play` (or a stop) releases its
    /// handle on arrival and changes nothing. The queue's current index moves
    /// to `track` as soon as the load starts, and stays there if it fails.
    async fn play(&self, track: Track, index: usize) {
        let (generation, previous) = {
            let mut inner = self.lock();
            let previous = inner.detach();
            // The pending track becomes current so skips step from it
            if let Some(pending) = inner.queued_position(&track, index) {
                let moved = inner.queue.set_current(Some(pending));
                debug_assert!(moved.is_ok(), "queued position {pending} out of range");
            }
            inner.state = PlaybackState::Loading;
            inner.last_error = None;
            self.publish(&inner);
            (inner.generation, previous)
        };
        self.emit(PlaybackEvent::StateChanged {
            state: PlaybackState::Loading,
        });

        if let Some(handle) = previous {
            self.release(handle).await;
        }

        info!(track_id = %track.id, index, generation, "Loading track");

        let handle = match self.engine.load(&track.source_uri).await {
            Ok(handle) => handle,
            Err(e) => {
                self.fail(generation, &track, &e);
                return;
            }
        };

        let settings = {
            let mut inner = self.lock();
            if inner.generation == generation {
                inner.attached = Some(handle);
                Some(inner.settings)
            } else {
                None
            }
        };
        let Some(settings) = settings else {
            debug!(track_id = %track.id, %handle, "Load superseded, releasing handle");
            self.release(handle).await;
            return;
        };

        if let Err(e) = self.start(handle, settings).await {
            if self.fail(generation, &track, &e) {
                self.release(handle).await;
            }
            return;
        }

        let liked = self.lookup_liked(&track.id).await;

        let outcome = {
            let mut inner = self.lock();
            if inner.generation != generation {
                debug!(track_id = %track.id, "Playback superseded while starting");
                return;
            }

            // Edits during the load move the current index along with the track
            match inner.queued_position(&track, inner.queue.current_index().unwrap_or(index)) {
                Some(index) => {
                    let moved = inner.queue.set_current(Some(index));
                    debug_assert!(moved.is_ok(), "queued position {index} out of range");

                    let previous = inner
                        .current_track
                        .replace(track.clone())
                        .map(|t| t.id);
                    inner.is_liked = liked;
                    inner.state = PlaybackState::Playing;
                    self.persist(&inner);
                    self.publish(&inner);
                    Ok(previous)
                }
                None => {
                    let orphan = inner.detach();
                    inner.state = PlaybackState::Idle;
                    inner.current_track = None;
                    inner.is_liked = false;
                    inner.queue.clear_current();
                    self.persist(&inner);
                    self.publish(&inner);
                    Err(orphan)
                }
            }
        };

        let previous_track_id = match outcome {
            Ok(previous) => previous,
            Err(orphan) => {
                warn!(track_id = %track.id, "Loaded track is no longer queued, dropping it");
                self.emit(PlaybackEvent::StateChanged {
                    state: PlaybackState::Idle,
                });
                if let Some(handle) = orphan {
                    self.release(handle).await;
                }
                return;
            }
        };

        self.emit(PlaybackEvent::TrackChanged {
            track_id: track.id.clone(),
            previous_track_id,
        });
        self.emit(PlaybackEvent::StateChanged {
            state: PlaybackState::Playing,
        });

        self.publish_notification(&track, true).await;
    }

    /// Apply settings to a fresh handle and start output
    async fn start(&self, handle: EngineHandle, settings: PlaybackSettings) -> Result<()> {
        self.engine.set_volume(handle, settings.volume).await?;
        self.engine.set_rate(handle, settings.rate).await?;
        self.engine.play(handle).await
    }

    /// Record a load/playback failure if `generation` is still current
    ///
    /// Returns whether the failure was applied, in which case the caller
    /// owns any handle the load produced.
    fn fail(&self, generation: u64, track: &Track, err: &PlaybackError) -> bool {
        let message = {
            let mut inner = self.lock();
            if inner.generation != generation {
                debug!(track_id = %track.id, error = %err, "Ignoring failure of superseded load");
                return false;
            }
            inner.attached = None;
            inner.state = PlaybackState::Error;
            let message = err.to_string();
            inner.last_error = Some(message.clone());
            self.publish(&inner);
            message
        };

        error!(track_id = %track.id, error = %err, "Playback failed");
        self.emit(PlaybackEvent::StateChanged {
            state: PlaybackState::Error,
        });
        self.emit(PlaybackEvent::Error { message });
        true
    }

    /// Pause playback (no-op unless playing)
    pub async fn pause(&self) {
        let (handle, track) = {
            let mut inner = self.lock();
            let (PlaybackState::Playing, Some(handle)) = (inner.state, inner.attached) else {
                debug!(state = ?inner.state, "Pause ignored");
                return;
            };
            inner.state = PlaybackState::Paused;
            self.publish(&inner);
            (handle, inner.current_track.clone())
        };
        self.emit(PlaybackEvent::StateChanged {
            state: PlaybackState::Paused,
        });

        if let Err(e) = self.engine.pause(handle).await {
            warn!(%handle, error = %e, "Engine pause failed");
        }
        if let Some(track) = track {
            self.publish_notification(&track, false).await;
        }
    }

    /// Resume playback (no-op unless paused)
    pub async fn resume(&self) {
        let (handle, track) = {
            let mut inner = self.lock();
            let (PlaybackState::Paused, Some(handle)) = (inner.state, inner.attached) else {
                debug!(state = ?inner.state, "Resume ignored");
                return;
            };
            inner.state = PlaybackState::Playing;
            self.publish(&inner);
            (handle, inner.current_track.clone())
        };
        self.emit(PlaybackEvent::StateChanged {
            state: PlaybackState::Playing,
        });

        if let Err(e) = self.engine.play(handle).await {
            warn!(%handle, error = %e, "Engine resume failed");
        }
        if let Some(track) = track {
            self.publish_notification(&track, true).await;
        }
    }

    /// Release the engine resource, keeping queue and current track
    pub async fn stop(&self) {
        self.stop_playback(false).await;
    }

    /// Skip to next track
    pub async fn next(&self) {
        self.skip(Direction::Next).await;
    }

    /// Go to previous track
    pub async fn previous(&self) {
        self.skip(Direction::Previous).await;
    }

    /// Shared path of manual skips and auto-advance
    async fn skip(&self, direction: Direction) {
        let step = {
            let inner = self.lock();
            let settings = inner.settings;

            if settings.repeat_mode == RepeatMode::One {
                match (inner.attached, inner.queue.current_index()) {
                    (Some(handle), _) => Step::Replay(handle),
                    (None, Some(i)) => inner
                        .queue
                        .get(i)
                        .cloned()
                        .map_or(Step::Stay, |t| Step::Play(t, i)),
                    (None, None) => Step::Stay,
                }
            } else {
                match inner
                    .queue
                    .advance(direction, settings.repeat_mode, settings.shuffle)
                {
                    Some(i) => inner
                        .queue
                        .get(i)
                        .cloned()
                        .map_or(Step::Stay, |t| Step::Play(t, i)),
                    None if direction == Direction::Next => Step::Stop,
                    None => Step::Stay,
                }
            }
        };

        match step {
            Step::Replay(handle) => self.replay(handle).await,
            Step::Play(track, index) => self.play(track, index).await,
            Step::Stop => {
                info!("Reached end of queue");
                self.stop_playback(true).await;
            }
            Step::Stay => debug!(?direction, "Nothing to skip to"),
        }
    }

    /// Restart the attached resource in place
    async fn replay(&self, handle: EngineHandle) {
        let result = self.engine.replay(handle).await;

        let failure = {
            let mut inner = self.lock();
            if inner.attached != Some(handle) {
                return;
            }
            match result {
                Ok(()) => {
                    inner.position_millis = 0;
                    inner.state = PlaybackState::Playing;
                    self.publish(&inner);
                    None
                }
                Err(e) => {
                    let message = e.to_string();
                    inner.attached = None;
                    inner.state = PlaybackState::Error;
                    inner.last_error = Some(message.clone());
                    self.publish(&inner);
                    Some(message)
                }
            }
        };

        match failure {
            None => {
                debug!(%handle, "Replaying current track");
                self.emit(PlaybackEvent::StateChanged {
                    state: PlaybackState::Playing,
                });
            }
            Some(message) => {
                error!(%handle, error = %message, "Replay failed");
                self.emit(PlaybackEvent::StateChanged {
                    state: PlaybackState::Error,
                });
                self.emit(PlaybackEvent::Error { message });
                self.release(handle).await;
            }
        }
    }

    /// Move to `Idle`, releasing the resource
    ///
    /// With `clear_current` the current track and index are dropped as well
    /// (end of queue, current track removed, queue cleared).
    async fn stop_playback(&self, clear_current: bool) {
        let handle = {
            let mut inner = self.lock();
            let handle = inner.detach();
            inner.state = PlaybackState::Idle;
            if clear_current {
                inner.current_track = None;
                inner.is_liked = false;
                inner.queue.clear_current();
                self.persist(&inner);
            }
            self.publish(&inner);
            handle
        };
        self.emit(PlaybackEvent::StateChanged {
            state: PlaybackState::Idle,
        });

        if let Some(handle) = handle {
            self.release(handle).await;
        }
        self.dismiss_notification().await;
    }

    // ===== Seek =====

    /// Seek within the loaded resource
    ///
    /// Only meaningful while a resource is loaded; the target is clamped to
    /// `[0, duration]`. The state does not change.
    pub async fn seek_to(&self, position_millis: i64) {
        let (handle, target) = {
            let mut inner = self.lock();
            let (true, Some(handle)) = (inner.state.has_resource(), inner.attached) else {
                debug!(state = ?inner.state, "Seek ignored");
                return;
            };
            let target = position_millis.clamp(0, inner.duration_millis as i64) as u64;
            inner.position_millis = target;
            self.publish(&inner);
            (handle, target)
        };

        if let Err(e) = self.engine.seek(handle, target).await {
            warn!(%handle, target, error = %e, "Engine seek failed");
        }
    }

    // ===== Engine callbacks =====

    /// Apply a status report from the engine
    ///
    /// Reports for handles other than the attached one are stale and
    /// dropped. A finish report moves to `Ended` and then either replays
    /// (repeat one) or takes the same path as [`PlaybackController::next`].
    pub async fn handle_engine_status(&self, status: EngineStatus) {
        let finished = {
            let mut inner = self.lock();
            if inner.attached != Some(status.handle) {
                trace!(handle = %status.handle, "Ignoring status for detached handle");
                return;
            }
            if !status.is_loaded {
                return;
            }

            inner.position_millis = status.position_millis;
            inner.duration_millis = status.duration_millis;

            let finished = if status.did_finish {
                inner.state = PlaybackState::Ended;
                inner.current_track.as_ref().map(|t| t.id.clone())
            } else {
                None
            };
            self.publish(&inner);
            finished.map(|id| (id, inner.settings.repeat_mode))
        };

        let Some((track_id, repeat)) = finished else {
            return;
        };

        debug!(%track_id, "Track finished");
        self.emit(PlaybackEvent::StateChanged {
            state: PlaybackState::Ended,
        });
        self.emit(PlaybackEvent::TrackFinished { track_id });

        if repeat == RepeatMode::One {
            self.replay(status.handle).await;
        } else {
            self.skip(Direction::Next).await;
        }
    }

    /// Apply a transport action from the notification layer
    pub async fn handle_remote_command(&self, command: RemoteCommand) {
        debug!(?command, "Remote command");
        match command {
            RemoteCommand::PlayPause => {
                let state = self.lock().state;
                match state {
                    PlaybackState::Playing => self.pause().await,
                    PlaybackState::Paused => self.resume().await,
                    PlaybackState::Loading => {}
                    PlaybackState::Idle | PlaybackState::Ended | PlaybackState::Error => {
                        self.play_current().await;
                    }
                }
            }
            RemoteCommand::Next => self.next().await,
            RemoteCommand::Previous => self.previous().await,
        }
    }

    /// Forward engine status reports into the controller
    pub fn spawn_status_pump(
        self: &Arc<Self>,
        mut statuses: mpsc::UnboundedReceiver<EngineStatus>,
    ) -> JoinHandle<()> {
        let controller = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(status) = statuses.recv().await {
                controller.handle_engine_status(status).await;
            }
            debug!("Engine status channel closed");
        })
    }

    /// Forward notification actions into the controller
    ///
    /// Each command runs as its own task so a slow load does not hold up
    /// the commands behind it.
    pub fn spawn_remote_pump(
        self: &Arc<Self>,
        mut commands: mpsc::UnboundedReceiver<RemoteCommand>,
    ) -> JoinHandle<()> {
        let controller = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(command) = commands.recv().await {
                let controller = Arc::clone(&controller);
                tokio::spawn(async move { controller.handle_remote_command(command).await });
            }
            debug!("Remote command channel closed");
        })
    }

    // ===== Settings =====

    /// Set output volume, clamped to `[0, 1]`
    pub async fn set_volume(&self, volume: f32) {
        let volume = PlaybackSettings::clamp_volume(volume);
        let handle = self.update_settings(|s| s.volume = volume);

        if let Some(handle) = handle {
            if let Err(e) = self.engine.set_volume(handle, volume).await {
                warn!(%handle, error = %e, "Engine set_volume failed");
            }
        }
    }

    /// Set playback speed
    ///
    /// Rates above the configured maximum are clamped; non-positive or
    /// non-finite rates are rejected.
    pub async fn set_rate(&self, rate: f32) -> Result<()> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(PlaybackError::InvalidRate(rate));
        }
        let rate = rate.min(self.config.max_rate);
        let handle = self.update_settings(|s| s.rate = rate);

        if let Some(handle) = handle {
            if let Err(e) = self.engine.set_rate(handle, rate).await {
                warn!(%handle, error = %e, "Engine set_rate failed");
            }
        }
        Ok(())
    }

    /// Set repeat mode
    pub fn set_repeat(&self, mode: RepeatMode) {
        self.update_settings(|s| s.repeat_mode = mode);
    }

    /// Cycle repeat `off -> one -> all -> off`, returning the new mode
    pub fn toggle_repeat(&self) -> RepeatMode {
        let mut mode = RepeatMode::Off;
        self.update_settings(|s| {
            s.repeat_mode = s.repeat_mode.cycle();
            mode = s.repeat_mode;
        });
        mode
    }

    /// Turn shuffle on or off
    ///
    /// Enabling captures the current order; disabling restores it with the
    /// current track still current.
    pub fn set_shuffle(&self, enabled: bool) {
        let settings = {
            let mut inner = self.lock();
            if inner.settings.shuffle == enabled {
                return;
            }

            if enabled {
                inner.queue.enable_shuffle();
            } else {
                let unshuffled = inner.queue.disable_shuffle();
                // Queue edits are mirrored into the original order
                debug_assert!(unshuffled.is_ok(), "current track missing after unshuffle");
                if let Err(e) = unshuffled {
                    error!(error = %e, "Current track missing after unshuffle, falling back to first track");
                    let fallback = inner.queue.current().cloned();
                    if inner.current_track.is_some() {
                        inner.current_track = fallback;
                    }
                }
            }

            inner.settings.shuffle = enabled;
            inner.refresh_queue_view();
            self.persist(&inner);
            self.publish(&inner);
            inner.settings
        };

        info!(shuffle = enabled, "Shuffle changed");
        self.emit(PlaybackEvent::SettingsChanged { settings });
    }

    /// Flip shuffle, returning the new value
    pub fn toggle_shuffle(&self) -> bool {
        let enabled = !self.lock().settings.shuffle;
        self.set_shuffle(enabled);
        enabled
    }

    /// Mutate settings, persist, and return the attached handle
    fn update_settings(&self, change: impl FnOnce(&mut PlaybackSettings)) -> Option<EngineHandle> {
        let (settings, handle) = {
            let mut inner = self.lock();
            change(&mut inner.settings);
            self.persist(&inner);
            self.publish(&inner);
            (inner.settings, inner.attached)
        };
        self.emit(PlaybackEvent::SettingsChanged { settings });
        handle
    }

    // ===== Queue Management =====

    /// Add a track to the end of the queue
    pub fn append(&self, track: Track) {
        let length = {
            let mut inner = self.lock();
            inner.queue.append(track);
            inner.refresh_queue_view();
            self.persist(&inner);
            self.publish(&inner);
            inner.queue.len()
        };
        self.emit(PlaybackEvent::QueueChanged { length });
    }

    /// Remove the track at `index`
    ///
    /// Removing the current track stops playback.
    pub async fn remove_at(&self, index: usize) -> Result<Track> {
        let (removed, length) = {
            let mut inner = self.lock();
            let removed = inner.queue.remove_at(index)?;
            inner.refresh_queue_view();
            self.persist(&inner);
            self.publish(&inner);
            (removed, inner.queue.len())
        };
        self.emit(PlaybackEvent::QueueChanged { length });

        if removed.was_current {
            info!(track_id = %removed.track.id, "Current track removed, stopping");
            self.stop_playback(true).await;
        }
        Ok(removed.track)
    }

    /// Empty the queue and stop playback
    pub async fn clear_queue(&self) {
        {
            let mut inner = self.lock();
            inner.queue.clear();
            inner.refresh_queue_view();
        }
        self.emit(PlaybackEvent::QueueChanged { length: 0 });
        self.stop_playback(true).await;
    }

    // ===== Likes =====

    /// Flip the liked flag of the current track
    ///
    /// The flag changes immediately and is rolled back if the gateway
    /// rejects the change. Without a current track or signed-in user this
    /// does nothing.
    pub async fn toggle_like(&self) {
        let (track_id, user, liked) = {
            let mut inner = self.lock();
            let (Some(track), Some(user)) = (inner.current_track.as_ref(), inner.user.as_ref())
            else {
                debug!("Like toggle ignored, no current track or user");
                return;
            };
            let (track_id, user) = (track.id.clone(), user.clone());
            inner.is_liked = !inner.is_liked;
            self.publish(&inner);
            (track_id, user, inner.is_liked)
        };

        match self.likes.set_liked(&track_id, &user, liked).await {
            Ok(()) => {
                info!(%track_id, liked, "Like updated");
                self.emit(PlaybackEvent::LikeChanged { track_id, liked });
            }
            Err(e) => {
                warn!(%track_id, error = %e, "Failed to update like, rolling back");
                let mut inner = self.lock();
                let still_current = inner
                    .current_track
                    .as_ref()
                    .is_some_and(|t| t.id == track_id);
                if still_current && inner.is_liked == liked {
                    inner.is_liked = !liked;
                    self.publish(&inner);
                }
            }
        }
    }

    /// Ask the like gateway about any track (false on failure or no user)
    pub async fn is_track_liked(&self, track_id: &TrackId) -> bool {
        self.lookup_liked(track_id).await
    }

    async fn lookup_liked(&self, track_id: &TrackId) -> bool {
        let Some(user) = self.lock().user.clone() else {
            return false;
        };
        match self.likes.is_liked(track_id, &user).await {
            Ok(liked) => liked,
            Err(e) => {
                warn!(%track_id, error = %e, "Failed to look up liked status");
                false
            }
        }
    }

    // ===== Internal =====

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, inner: &Inner) {
        self.snapshot_tx.send_replace(inner.snapshot());
    }

    fn persist(&self, inner: &Inner) {
        self.writer.save(inner.session());
    }

    fn emit(&self, event: PlaybackEvent) {
        // No subscribers is fine
        let _ = self.events_tx.send(event);
    }

    async fn release(&self, handle: EngineHandle) {
        debug!(%handle, "Releasing engine handle");
        if let Err(e) = self.engine.unload(handle).await {
            warn!(%handle, error = %e, "Failed to unload engine handle");
        }
    }

    async fn publish_notification(&self, track: &Track, is_playing: bool) {
        if let Err(e) = self
            .notifications
            .publish(&track.title, &track.artist, is_playing)
            .await
        {
            warn!(error = %e, "Failed to update notification");
        }
    }

    async fn dismiss_notification(&self) {
        if let Err(e) = self.notifications.dismiss().await {
            warn!(error = %e, "Failed to dismiss notification");
        }
    }
}
