//! End-to-end tests for the terminal host
//!
//! Runs the controller against the simulated engine and the JSON session
//! file, with tokio's paused clock driving engine ticks.

use cadence_cli::{
    commands::{self, Command, Flow},
    config::{EngineSettings, HostConfig},
    gateways::{InMemoryLikes, LogNotifications},
    sim_engine::SimulatedEngine,
};
use cadence_core::{RepeatMode, UserId};
use cadence_playback::{
    PlaybackController, PlaybackState, PlayerConfig, PlayerServices, RemoteCommand,
};
use cadence_storage::JsonFileStore;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;

/// Short tracks so auto-advance happens within a few ticks
fn short_tracks() -> EngineSettings {
    EngineSettings {
        tick_millis: 100,
        track_millis: 500,
    }
}

/// Tracks that never finish within a test
fn long_tracks() -> EngineSettings {
    EngineSettings {
        tick_millis: 100,
        track_millis: 3_600_000,
    }
}

async fn start(session_file: &Path, engine: &EngineSettings) -> Arc<PlaybackController> {
    let (engine, statuses) = SimulatedEngine::new(engine);
    let services = PlayerServices {
        engine: Arc::new(engine),
        persistence: Arc::new(JsonFileStore::new(session_file)),
        likes: Arc::new(InMemoryLikes::new()),
        notifications: Arc::new(LogNotifications),
    };
    let controller =
        PlaybackController::init(services, PlayerConfig::default(), Some(UserId::new("me"))).await;
    controller.spawn_status_pump(statuses);
    controller
}

async fn run(controller: &PlaybackController, line: &str) -> Flow {
    let (remote, _rx) = mpsc::unbounded_channel();
    let command: Command = line.parse().unwrap();
    commands::execute(controller, &remote, command).await.unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_tracks_auto_advance_to_end_of_queue() {
    let dir = TempDir::new().unwrap();
    let controller = start(&dir.path().join("session.json"), &short_tracks()).await;

    run(&controller, "load file:///a.mp3 file:///b.mp3").await;
    assert_eq!(controller.snapshot().state, PlaybackState::Playing);

    let mut updates = controller.subscribe();
    tokio::time::timeout(
        Duration::from_secs(10),
        updates.wait_for(|s| s.current_track.as_ref().is_some_and(|t| t.title == "b")),
    )
    .await
    .expect("never advanced")
    .unwrap();

    tokio::time::timeout(
        Duration::from_secs(10),
        updates.wait_for(|s| s.state == PlaybackState::Idle),
    )
    .await
    .expect("never stopped")
    .unwrap();
    assert_eq!(controller.snapshot().current_track, None);
}

#[tokio::test(start_paused = true)]
async fn test_missing_source_reports_error() {
    let dir = TempDir::new().unwrap();
    let controller = start(&dir.path().join("session.json"), &long_tracks()).await;

    run(&controller, "load missing:nowhere").await;

    let snap = controller.snapshot();
    assert_eq!(snap.state, PlaybackState::Error);
    assert!(snap.last_error.unwrap().contains("missing:nowhere"));
}

#[tokio::test(start_paused = true)]
async fn test_session_survives_restart() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("nested").join("session.json");

    let first = start(&file, &long_tracks()).await;
    run(&first, "load file:///a.mp3 file:///b.mp3 file:///c.mp3").await;
    run(&first, "next").await;
    run(&first, "repeat all").await;
    run(&first, "vol 0.3").await;
    assert_eq!(run(&first, "quit").await, Flow::Exit);
    first.stop().await;
    first.flush().await;

    let second = start(&file, &long_tracks()).await;
    let snap = second.snapshot();
    assert_eq!(snap.state, PlaybackState::Idle);
    assert_eq!(snap.queue.len(), 3);
    assert_eq!(snap.current_index, Some(1));
    assert_eq!(snap.settings.repeat_mode, RepeatMode::All);
    assert_eq!(snap.settings.volume, 0.3);

    // Resume where the last session left off
    second
        .handle_remote_command(RemoteCommand::PlayPause)
        .await;
    let snap = second.snapshot();
    assert_eq!(snap.state, PlaybackState::Playing);
    assert_eq!(snap.current_track.map(|t| t.title), Some("b".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_logout_clears_saved_queue() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("session.json");

    let first = start(&file, &long_tracks()).await;
    run(&first, "load file:///a.mp3").await;
    run(&first, "logout").await;

    let second = start(&file, &long_tracks()).await;
    assert!(second.snapshot().queue.is_empty());
}

#[test]
fn test_config_file_overrides_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cadence.toml");
    std::fs::write(
        &path,
        "[player]\nmax_rate = 2.0\n\n[engine]\ntick_millis = 50\n\n[session]\nuser_id = \"alice\"\n",
    )
    .unwrap();

    let config = HostConfig::load(Some(path.as_path())).unwrap();

    assert_eq!(config.player.max_rate, 2.0);
    assert_eq!(config.player.event_capacity, 64);
    assert_eq!(config.engine.tick_millis, 50);
    assert_eq!(config.engine.track_millis, 30_000);
    assert_eq!(config.session.user_id.as_deref(), Some("alice"));
    assert!(config.validate().is_ok());
}

#[test]
fn test_missing_explicit_config_file_fails() {
    let dir = TempDir::new().unwrap();
    assert!(HostConfig::load(Some(dir.path().join("absent.toml").as_path())).is_err());
}
