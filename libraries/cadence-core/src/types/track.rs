/// Playable track description
use super::TrackId;
use serde::{Deserialize, Serialize};

/// An immutable description of a playable item
///
/// Tracks are cloned into the queue and never mutated afterwards. Two tracks
/// refer to the same logical item when their ids match, regardless of the
/// remaining metadata (see [`Track::same_item`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// Canonical track identifier
    pub id: TrackId,

    /// Track title
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Locator handed to the audio engine (URL or file path)
    pub source_uri: String,

    /// Cover art locator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artwork_uri: Option<String>,
}

impl Track {
    /// Create a track without artwork
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        artist: impl Into<String>,
        source_uri: impl Into<String>,
    ) -> Self {
        Self {
            id: TrackId::new(id),
            title: title.into(),
            artist: artist.into(),
            source_uri: source_uri.into(),
            artwork_uri: None,
        }
    }

    /// Attach an artwork locator
    #[must_use]
    pub fn with_artwork(mut self, artwork_uri: impl Into<String>) -> Self {
        self.artwork_uri = Some(artwork_uri.into());
        self
    }

    /// Whether both tracks describe the same logical item
    pub fn same_item(&self, other: &Track) -> bool {
        self.id == other.id
    }
}
