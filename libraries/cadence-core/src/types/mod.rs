mod ids;
mod settings;
mod snapshot;
mod track;

pub use ids::{TrackId, UserId};
pub use settings::{PlaybackSettings, RepeatMode};
pub use snapshot::SessionSnapshot;
pub use track::Track;
