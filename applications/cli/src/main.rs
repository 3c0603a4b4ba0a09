/// Cadence - terminal music player driving the playback controller
use anyhow::Context;
use cadence_cli::{
    commands::{self, Command, Flow},
    config::HostConfig,
    gateways::{InMemoryLikes, LogNotifications},
    sim_engine::SimulatedEngine,
};
use cadence_core::UserId;
use cadence_playback::{PlaybackController, PlaybackEvent, PlayerServices};
use cadence_storage::JsonFileStore;
use clap::Parser;
use std::{path::PathBuf, sync::Arc};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{broadcast, mpsc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Cadence terminal music player", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "CADENCE_CONFIG")]
    config: Option<PathBuf>,

    /// Where the playback session is saved
    #[arg(long)]
    session_file: Option<PathBuf>,

    /// Signed-in user id (enables likes)
    #[arg(short, long)]
    user: Option<String>,

    /// Sources to queue and start playing
    uris: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "cadence=info,cadence_cli=info,cadence_playback=info,cadence_storage=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = HostConfig::load(cli.config.as_deref())?;
    if let Some(path) = cli.session_file {
        config.storage.session_file = path;
    }
    if let Some(user) = cli.user {
        config.session.user_id = Some(user);
    }
    config.validate()?;

    tracing::info!("Starting Cadence");
    tracing::info!("Session file: {}", config.storage.session_file.display());

    let (engine, statuses) = SimulatedEngine::new(&config.engine);
    let services = PlayerServices {
        engine: Arc::new(engine),
        persistence: Arc::new(JsonFileStore::new(config.storage.session_file.clone())),
        likes: Arc::new(InMemoryLikes::new()),
        notifications: Arc::new(LogNotifications),
    };

    let user = config.session.user_id.clone().map(UserId::new);
    let controller = PlaybackController::init(services, config.player.clone(), user).await;

    let status_pump = controller.spawn_status_pump(statuses);
    let (remote_tx, remote_rx) = mpsc::unbounded_channel();
    let remote_pump = controller.spawn_remote_pump(remote_rx);
    let event_log = tokio::spawn(log_events(controller.events()));

    if !cli.uris.is_empty() {
        let tracks = cli.uris.iter().map(|u| commands::track_from_uri(u)).collect();
        controller
            .play_list(tracks, 0)
            .await
            .context("Failed to start playback")?;
    }

    println!("{}", commands::describe(&controller.snapshot()));
    println!("type 'help' for commands");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };

        match commands::execute(&controller, &remote_tx, command).await {
            Ok(Flow::Continue) => {}
            Ok(Flow::Exit) => break,
            Err(e) => eprintln!("{e}"),
        }
    }

    // Keep the queue for the next launch, only release the engine
    controller.stop().await;
    controller.flush().await;

    drop(remote_tx);
    remote_pump.await?;
    status_pump.abort();
    event_log.abort();

    tracing::info!("Cadence stopped");
    Ok(())
}

async fn log_events(mut events: broadcast::Receiver<PlaybackEvent>) {
    loop {
        match events.recv().await {
            Ok(PlaybackEvent::TrackChanged { track_id, .. }) => {
                tracing::info!(%track_id, "Now playing");
            }
            Ok(PlaybackEvent::Error { message }) => {
                tracing::error!("Playback error: {message}");
            }
            Ok(event) => tracing::debug!(?event, "Playback event"),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Event log fell behind");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
