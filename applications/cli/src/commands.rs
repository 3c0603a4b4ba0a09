//! Interactive commands
//!
//! One command per line of input. Parsing is kept separate from execution so
//! it can be tested without a controller.

use crate::error::{CliError, Result};
use cadence_core::{RepeatMode, Track};
use cadence_playback::{PlaybackController, PlayerSnapshot, RemoteCommand};
use std::path::Path;
use std::str::FromStr;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Replace the queue with these sources and start the first
    Load(Vec<String>),
    /// Play the queued track at an index
    Play(usize),
    Pause,
    Resume,
    Stop,
    Next,
    Previous,
    Seek(i64),
    Volume(f32),
    Rate(f32),
    Shuffle,
    Repeat(Option<RepeatMode>),
    Like,
    Append(String),
    Remove(usize),
    Clear,
    /// Inject a transport action as if from the notification
    Remote(RemoteCommand),
    Status,
    Queue,
    Logout,
    Help,
    Quit,
}

/// Whether the input loop keeps running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub const HELP: &str = "\
commands:
  load <uri>...      replace the queue and play
  play <index>       play a queued track
  pause | resume | stop
  next | prev
  seek <ms>          move the play head
  vol <0-1>          set volume
  rate <x>           set playback speed
  shuffle            toggle shuffle
  repeat [off|one|all]
  like               toggle like on the current track
  append <uri>       add to the end of the queue
  remove <index>     remove from the queue
  clear              empty the queue
  remote <play_pause|next|previous>
  status | queue
  logout             end the session and forget the queue
  quit";

impl FromStr for Command {
    type Err = CliError;

    fn from_str(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Err(CliError::InvalidCommand("empty input".to_string()));
        };
        let args: Vec<&str> = words.collect();

        let command = match name.to_ascii_lowercase().as_str() {
            "load" if !args.is_empty() => Self::Load(args.iter().map(|s| (*s).to_string()).collect()),
            "play" => Self::Play(parse_arg(name, &args)?),
            "pause" => Self::Pause,
            "resume" => Self::Resume,
            "stop" => Self::Stop,
            "next" | "n" => Self::Next,
            "prev" | "previous" | "p" => Self::Previous,
            "seek" => Self::Seek(parse_arg(name, &args)?),
            "vol" | "volume" => Self::Volume(parse_arg(name, &args)?),
            "rate" => Self::Rate(parse_arg(name, &args)?),
            "shuffle" => Self::Shuffle,
            "repeat" => match args.first() {
                None => Self::Repeat(None),
                Some(mode) => Self::Repeat(Some(
                    mode.parse().map_err(CliError::InvalidCommand)?,
                )),
            },
            "like" => Self::Like,
            "append" if args.len() == 1 => Self::Append(args[0].to_string()),
            "remove" | "rm" => Self::Remove(parse_arg(name, &args)?),
            "clear" => Self::Clear,
            "remote" => Self::Remote(parse_remote(&args)?),
            "status" | "s" => Self::Status,
            "queue" | "q" => Self::Queue,
            "logout" => Self::Logout,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            _ => return Err(CliError::InvalidCommand(line.trim().to_string())),
        };
        Ok(command)
    }
}

fn parse_arg<T: FromStr>(name: &str, args: &[&str]) -> Result<T> {
    args.first()
        .and_then(|a| a.parse().ok())
        .ok_or_else(|| CliError::InvalidCommand(format!("{name} needs a valid argument")))
}

fn parse_remote(args: &[&str]) -> Result<RemoteCommand> {
    match args.first().copied() {
        Some("play_pause" | "playpause" | "toggle") => Ok(RemoteCommand::PlayPause),
        Some("next") => Ok(RemoteCommand::Next),
        Some("previous" | "prev") => Ok(RemoteCommand::Previous),
        _ => Err(CliError::InvalidCommand(
            "remote needs play_pause, next or previous".to_string(),
        )),
    }
}

/// Build a track for a source locator
///
/// The locator doubles as the id; the title is the file stem.
pub fn track_from_uri(uri: &str) -> Track {
    let title = Path::new(uri)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or(uri);
    Track::new(uri, title, "Unknown Artist", uri)
}

/// Run one command against the controller
pub async fn execute(
    controller: &PlaybackController,
    remote: &mpsc::UnboundedSender<RemoteCommand>,
    command: Command,
) -> Result<Flow> {
    match command {
        Command::Load(uris) => {
            let tracks = uris.iter().map(|u| track_from_uri(u)).collect();
            controller.play_list(tracks, 0).await?;
        }
        Command::Play(index) => controller.play_index(index).await?,
        Command::Pause => controller.pause().await,
        Command::Resume => controller.resume().await,
        Command::Stop => controller.stop().await,
        Command::Next => controller.next().await,
        Command::Previous => controller.previous().await,
        Command::Seek(millis) => controller.seek_to(millis).await,
        Command::Volume(volume) => controller.set_volume(volume).await,
        Command::Rate(rate) => controller.set_rate(rate).await?,
        Command::Shuffle => {
            let enabled = controller.toggle_shuffle();
            println!("shuffle {}", if enabled { "on" } else { "off" });
        }
        Command::Repeat(Some(mode)) => controller.set_repeat(mode),
        Command::Repeat(None) => println!("repeat {}", controller.toggle_repeat()),
        Command::Like => controller.toggle_like().await,
        Command::Append(uri) => controller.append(track_from_uri(&uri)),
        Command::Remove(index) => {
            let track = controller.remove_at(index).await?;
            println!("removed {}", track.title);
        }
        Command::Clear => controller.clear_queue().await,
        Command::Remote(action) => {
            if remote.send(action).is_err() {
                return Err(CliError::InvalidCommand(
                    "remote channel closed".to_string(),
                ));
            }
        }
        Command::Status => println!("{}", describe(&controller.snapshot())),
        Command::Queue => print_queue(&controller.snapshot()),
        Command::Logout => controller.teardown().await,
        Command::Help => println!("{HELP}"),
        Command::Quit => return Ok(Flow::Exit),
    }
    Ok(Flow::Continue)
}

/// One-line summary of the controller state
pub fn describe(snapshot: &PlayerSnapshot) -> String {
    let track = snapshot
        .current_track
        .as_ref()
        .map_or_else(|| "-".to_string(), |t| format!("{} - {}", t.title, t.artist));
    let liked = if snapshot.is_liked { " [liked]" } else { "" };
    let error = snapshot
        .last_error
        .as_ref()
        .map(|e| format!(" error: {e}"))
        .unwrap_or_default();

    format!(
        "{:?} {}{} {}/{}s vol {:.2} rate {:.2} repeat {} shuffle {}{}",
        snapshot.state,
        track,
        liked,
        snapshot.position_millis / 1000,
        snapshot.duration_millis / 1000,
        snapshot.settings.volume,
        snapshot.settings.rate,
        snapshot.settings.repeat_mode,
        if snapshot.settings.shuffle { "on" } else { "off" },
        error,
    )
}

fn print_queue(snapshot: &PlayerSnapshot) {
    if snapshot.queue.is_empty() {
        println!("queue is empty");
        return;
    }
    for (i, track) in snapshot.queue.iter().enumerate() {
        let marker = if snapshot.current_index == Some(i) { ">" } else { " " };
        println!("{marker} {i:>3}  {} - {}", track.title, track.artist);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_arguments() {
        assert_eq!("play 3".parse::<Command>().unwrap(), Command::Play(3));
        assert_eq!("seek -20".parse::<Command>().unwrap(), Command::Seek(-20));
        assert_eq!("vol 0.5".parse::<Command>().unwrap(), Command::Volume(0.5));
        assert_eq!(
            "repeat all".parse::<Command>().unwrap(),
            Command::Repeat(Some(RepeatMode::All))
        );
        assert_eq!("repeat".parse::<Command>().unwrap(), Command::Repeat(None));
        assert_eq!(
            "remote play_pause".parse::<Command>().unwrap(),
            Command::Remote(RemoteCommand::PlayPause)
        );
    }

    #[test]
    fn rejects_bad_input() {
        assert!("".parse::<Command>().is_err());
        assert!("play".parse::<Command>().is_err());
        assert!("play x".parse::<Command>().is_err());
        assert!("load".parse::<Command>().is_err());
        assert!("repeat sometimes".parse::<Command>().is_err());
        assert!("dance".parse::<Command>().is_err());
    }

    #[test]
    fn track_title_from_file_stem() {
        let track = track_from_uri("file:///music/Blue Train.flac");
        assert_eq!(track.title, "Blue Train");
        assert_eq!(track.id.as_str(), "file:///music/Blue Train.flac");
        assert_eq!(track.source_uri, track.id.as_str());
    }
}
