/// Playback settings that survive across sessions
use serde::{Deserialize, Serialize};

/// Repeat mode for playback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Stop when the queue ends
    #[default]
    Off,
    /// Loop the current track
    One,
    /// Loop the whole queue
    All,
}

impl RepeatMode {
    /// Convert to string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::One => "one",
            Self::All => "all",
        }
    }

    /// Next mode in the `off -> one -> all -> off` cycle
    #[must_use]
    pub fn cycle(self) -> Self {
        match self {
            Self::Off => Self::One,
            Self::One => Self::All,
            Self::All => Self::Off,
        }
    }
}

impl std::fmt::Display for RepeatMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RepeatMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "off" => Ok(Self::Off),
            "one" => Ok(Self::One),
            "all" => Ok(Self::All),
            other => Err(format!("unknown repeat mode: {other}")),
        }
    }
}

/// Volume, rate, repeat and shuffle preferences
///
/// Independent of whichever track is loaded. Volume is linear in `[0, 1]`;
/// rate is a speed multiplier in `(0, max_rate]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSettings {
    /// Output volume (0.0 - 1.0)
    pub volume: f32,

    /// Playback speed multiplier
    pub rate: f32,

    /// Repeat mode
    pub repeat_mode: RepeatMode,

    /// Whether the queue is shuffled
    pub shuffle: bool,
}

impl PlaybackSettings {
    /// Clamp a volume into `[0, 1]`; NaN maps to silence
    pub fn clamp_volume(volume: f32) -> f32 {
        if volume.is_nan() {
            0.0
        } else {
            volume.clamp(0.0, 1.0)
        }
    }

    /// Bring restored values back into their legal ranges
    #[must_use]
    pub fn sanitized(self, max_rate: f32) -> Self {
        let rate = if self.rate.is_finite() && self.rate > 0.0 {
            self.rate.min(max_rate)
        } else {
            1.0
        };

        Self {
            volume: Self::clamp_volume(self.volume),
            rate,
            ..self
        }
    }
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            volume: 1.0,
            rate: 1.0,
            repeat_mode: RepeatMode::Off,
            shuffle: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeat_mode_cycles_off_one_all() {
        assert_eq!(RepeatMode::Off.cycle(), RepeatMode::One);
        assert_eq!(RepeatMode::One.cycle(), RepeatMode::All);
        assert_eq!(RepeatMode::All.cycle(), RepeatMode::Off);
    }

    #[test]
    fn repeat_mode_parses_lowercase() {
        assert_eq!("all".parse::<RepeatMode>(), Ok(RepeatMode::All));
        assert!("ALL".parse::<RepeatMode>().is_err());
    }

    #[test]
    fn default_settings() {
        let settings = PlaybackSettings::default();
        assert_eq!(settings.volume, 1.0);
        assert_eq!(settings.rate, 1.0);
        assert_eq!(settings.repeat_mode, RepeatMode::Off);
        assert!(!settings.shuffle);
    }

    #[test]
    fn sanitized_clamps_out_of_range_values() {
        let settings = PlaybackSettings {
            volume: 3.5,
            rate: 10.0,
            repeat_mode: RepeatMode::All,
            shuffle: true,
        }
        .sanitized(4.0);

        assert_eq!(settings.volume, 1.0);
        assert_eq!(settings.rate, 4.0);
        assert_eq!(settings.repeat_mode, RepeatMode::All);
        assert!(settings.shuffle);

        let broken = PlaybackSettings {
            volume: f32::NAN,
            rate: -1.0,
            ..PlaybackSettings::default()
        }
        .sanitized(4.0);
        assert_eq!(broken.volume, 0.0);
        assert_eq!(broken.rate, 1.0);
    }
}
