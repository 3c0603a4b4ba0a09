/// Persisted session state
use super::{PlaybackSettings, RepeatMode, Track};
use serde::{Deserialize, Serialize};

/// Everything the persistence gateway stores between sessions
///
/// Runtime values (position, duration, liked flag, errors) are deliberately
/// absent; they are rebuilt once a track is loaded again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionSnapshot {
    /// Live queue order
    pub queue: Vec<Track>,

    /// Index of the current track in `queue`
    pub current_index: Option<usize>,

    /// Output volume (0.0 - 1.0)
    pub volume: f32,

    /// Playback speed multiplier
    pub rate: f32,

    /// Repeat mode
    pub repeat_mode: RepeatMode,

    /// Whether `queue` is a shuffled order
    pub shuffle: bool,

    /// Order captured when shuffle was enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_order: Option<Vec<Track>>,
}

impl SessionSnapshot {
    /// Settings portion of the snapshot
    pub fn settings(&self) -> PlaybackSettings {
        PlaybackSettings {
            volume: self.volume,
            rate: self.rate,
            repeat_mode: self.repeat_mode,
            shuffle: self.shuffle,
        }
    }
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        let settings = PlaybackSettings::default();
        Self {
            queue: Vec::new(),
            current_index: None,
            volume: settings.volume,
            rate: settings.rate,
            repeat_mode: settings.repeat_mode,
            shuffle: settings.shuffle,
            original_order: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let snapshot: SessionSnapshot =
            serde_json::from_str(r#"{"volume":0.4,"repeatMode":"all"}"#).unwrap();

        assert!(snapshot.queue.is_empty());
        assert_eq!(snapshot.current_index, None);
        assert_eq!(snapshot.volume, 0.4);
        assert_eq!(snapshot.rate, 1.0);
        assert_eq!(snapshot.repeat_mode, RepeatMode::All);
        assert!(snapshot.original_order.is_none());
    }

    #[test]
    fn settings_view_matches_fields() {
        let snapshot = SessionSnapshot {
            volume: 0.5,
            rate: 1.5,
            shuffle: true,
            ..SessionSnapshot::default()
        };
        let settings = snapshot.settings();
        assert_eq!(settings.volume, 0.5);
        assert_eq!(settings.rate, 1.5);
        assert!(settings.shuffle);
    }
}
