//! Ordered play queue with shuffle restoration
//!
//! ```text
//! live order:      [S3, S1, S2]   current_index = Some(1)  -> S1
//! original order:  [S1, S2, S3]   (only while shuffled)
//! ```
//!
//! The original order is captured at the instant shuffle is enabled and is
//! put back verbatim when it is disabled.

use crate::error::{PlaybackError, Result};
use crate::shuffle::{permutation, random_index};
use crate::types::Direction;
use cadence_core::{RepeatMode, Track};
use rand::Rng;

/// Outcome of [`Queue::remove_at`]
#[derive(Debug, Clone, PartialEq)]
pub struct Removed {
    /// The removed track
    pub track: Track,

    /// Whether it was the current track (playback must stop)
    pub was_current: bool,
}

/// Play queue
#[derive(Debug, Clone, Default)]
pub struct Queue {
    /// Live order
    tracks: Vec<Track>,

    /// Position of the current track in `tracks`
    current: Option<usize>,

    /// Order before shuffle; `Some` exactly while shuffled
    original: Option<Vec<Track>>,
}

impl Queue {
    /// Create new empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a queue from persisted parts
    ///
    /// An out-of-range index is dropped rather than rejected. A shuffled
    /// queue whose saved original order is missing, or lacks some of the
    /// live tracks, uses its live order instead.
    pub fn restore(
        tracks: Vec<Track>,
        current: Option<usize>,
        original: Option<Vec<Track>>,
        shuffled: bool,
    ) -> Self {
        let current = current.filter(|&i| i < tracks.len());
        let original = shuffled.then(|| {
            original
                .filter(|o| tracks.iter().all(|t| o.iter().any(|x| x.same_item(t))))
                .unwrap_or_else(|| tracks.clone())
        });
        Self {
            tracks,
            current,
            original,
        }
    }

    /// Install a new list, discarding the old queue and original order
    ///
    /// With `shuffle` on, `tracks` becomes the original order and the live
    /// order is shuffled with the start track kept current.
    pub fn replace(&mut self, tracks: Vec<Track>, start: usize, shuffle: bool) -> Result<()> {
        self.replace_with_rng(tracks, start, shuffle, &mut rand::thread_rng())
    }

    /// [`Queue::replace`] with an explicit random source
    pub fn replace_with_rng<R: Rng + ?Sized>(
        &mut self,
        tracks: Vec<Track>,
        start: usize,
        shuffle: bool,
        rng: &mut R,
    ) -> Result<()> {
        if tracks.is_empty() {
            self.clear();
            return Ok(());
        }
        if start >= tracks.len() {
            return Err(PlaybackError::InvalidIndex(start));
        }

        self.tracks = tracks;
        self.current = Some(start);
        self.original = None;

        if shuffle {
            self.enable_shuffle_with_rng(rng);
        }
        Ok(())
    }

    /// Resolve the index a skip in `direction` should move to
    ///
    /// Precedence: repeat-one keeps the current index; shuffle picks any
    /// index uniformly (the current one included); otherwise step by one,
    /// wrapping only under repeat-all. `None` means there is no track to
    /// move to.
    pub fn advance(&self, direction: Direction, repeat: RepeatMode, shuffle: bool) -> Option<usize> {
        self.advance_with_rng(direction, repeat, shuffle, &mut rand::thread_rng())
    }

    /// [`Queue::advance`] with an explicit random source
    pub fn advance_with_rng<R: Rng + ?Sized>(
        &self,
        direction: Direction,
        repeat: RepeatMode,
        shuffle: bool,
        rng: &mut R,
    ) -> Option<usize> {
        let len = self.tracks.len();
        if len == 0 {
            return None;
        }

        if repeat == RepeatMode::One {
            return self.current;
        }

        if shuffle {
            return random_index(len, rng);
        }

        // No current track behaves like position -1
        let from = self.current.map_or(-1, |i| i as isize);
        let target = match direction {
            Direction::Next => from + 1,
            Direction::Previous => from - 1,
        };

        if (0..len as isize).contains(&target) {
            return Some(target as usize);
        }

        match (repeat, direction) {
            (RepeatMode::All, Direction::Next) => Some(0),
            (RepeatMode::All, Direction::Previous) => Some(len - 1),
            _ => None,
        }
    }

    /// Capture the current order and shuffle the live queue
    ///
    /// The current track stays current (its position changes). No-op when
    /// already shuffled.
    pub fn enable_shuffle(&mut self) {
        self.enable_shuffle_with_rng(&mut rand::thread_rng());
    }

    /// [`Queue::enable_shuffle`] with an explicit random source
    pub fn enable_shuffle_with_rng<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if self.original.is_some() {
            return;
        }

        let order = permutation(self.tracks.len(), rng);
        let shuffled: Vec<Track> = order.iter().map(|&i| self.tracks[i].clone()).collect();

        self.current = self
            .current
            .and_then(|cur| order.iter().position(|&old| old == cur));
        self.original = Some(std::mem::replace(&mut self.tracks, shuffled));
    }

    /// Put back the order captured by [`Queue::enable_shuffle`]
    ///
    /// The current index follows the current track's id. If that id is not in
    /// the restored order the index falls back to 0 and `TrackNotFound` is
    /// returned so the caller can report it; the queue is usable either way.
    pub fn disable_shuffle(&mut self) -> Result<()> {
        let Some(original) = self.original.take() else {
            return Ok(());
        };

        let current_track = self.current().cloned();
        self.tracks = original;

        let Some(track) = current_track else {
            self.current = None;
            return Ok(());
        };

        match self.position_of(&track) {
            Some(index) => {
                self.current = Some(index);
                Ok(())
            }
            None => {
                self.current = (!self.tracks.is_empty()).then_some(0);
                Err(PlaybackError::TrackNotFound(track.id))
            }
        }
    }

    /// Add a track at the end
    pub fn append(&mut self, track: Track) {
        if let Some(original) = self.original.as_mut() {
            original.push(track.clone());
        }
        self.tracks.push(track);
    }

    /// Remove the track at `index`
    ///
    /// Removing the current track clears the current index; removing an
    /// earlier track shifts it down so it keeps pointing at the same track.
    pub fn remove_at(&mut self, index: usize) -> Result<Removed> {
        if index >= self.tracks.len() {
            return Err(PlaybackError::InvalidIndex(index));
        }

        let track = self.tracks.remove(index);

        // Keep the original order consistent with the live queue
        if let Some(original) = self.original.as_mut() {
            if let Some(pos) = original.iter().position(|t| t.same_item(&track)) {
                original.remove(pos);
            }
        }

        let was_current = self.current == Some(index);
        self.current = match self.current {
            Some(cur) if cur == index => None,
            Some(cur) if cur > index => Some(cur - 1),
            other => other,
        };

        Ok(Removed { track, was_current })
    }

    /// Empty the queue
    pub fn clear(&mut self) {
        self.tracks.clear();
        self.current = None;
        self.original = None;
    }

    /// Point the current index at `index` (`None` clears it)
    pub fn set_current(&mut self, index: Option<usize>) -> Result<()> {
        match index {
            Some(i) if i >= self.tracks.len() => Err(PlaybackError::InvalidIndex(i)),
            _ => {
                self.current = index;
                Ok(())
            }
        }
    }

    /// Forget the current index
    pub fn clear_current(&mut self) {
        self.current = None;
    }

    /// Current track
    pub fn current(&self) -> Option<&Track> {
        self.current.and_then(|i| self.tracks.get(i))
    }

    /// Current index
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// Track at `index`
    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    /// First position of `track` by id
    pub fn position_of(&self, track: &Track) -> Option<usize> {
        self.tracks.iter().position(|t| t.same_item(track))
    }

    /// Live order
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Order captured when shuffle was enabled
    pub fn original_order(&self) -> Option<&[Track]> {
        self.original.as_deref()
    }

    /// Whether the live order is shuffled
    pub fn is_shuffled(&self) -> bool {
        self.original.is_some()
    }

    /// Total number of tracks in queue
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Check if queue is empty
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn create_test_track(id: &str) -> Track {
        Track::new(
            id,
            format!("Track {id}"),
            "Test Artist",
            format!("https://cdn.example.com/{id}.mp3"),
        )
    }

    fn queue_of(ids: &[&str], current: Option<usize>) -> Queue {
        Queue::restore(
            ids.iter().map(|id| create_test_track(id)).collect(),
            current,
            None,
            false,
        )
    }

    fn ids(queue: &Queue) -> Vec<&str> {
        queue.tracks().iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn create_empty_queue() {
        let queue = Queue::new();
        assert_eq!(queue.len(), 0);
        assert!(queue.is_empty());
        assert_eq!(queue.current_index(), None);
    }

    #[test]
    fn replace_sets_start_index() {
        let mut queue = Queue::new();
        let tracks = vec![
            create_test_track("1"),
            create_test_track("2"),
            create_test_track("3"),
        ];

        queue.replace(tracks, 1, false).unwrap();
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.current().unwrap().id.as_str(), "2");
        assert!(!queue.is_shuffled());
    }

    #[test]
    fn replace_rejects_out_of_range_start() {
        let mut queue = queue_of(&["a"], Some(0));
        let result = queue.replace(vec![create_test_track("1")], 1, false);

        assert!(matches!(result, Err(PlaybackError::InvalidIndex(1))));
        // Failed replace leaves the old queue alone
        assert_eq!(ids(&queue), vec!["a"]);
    }

    #[test]
    fn replace_with_empty_list_clears() {
        let mut queue = queue_of(&["a", "b"], Some(1));
        queue.replace(Vec::new(), 5, false).unwrap();
        assert!(queue.is_empty());
        assert_eq!(queue.current_index(), None);
    }

    #[test]
    fn replace_while_shuffled_keeps_start_track_current() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut queue = Queue::new();
        let tracks: Vec<Track> = ["1", "2", "3", "4", "5"]
            .iter()
            .map(|id| create_test_track(id))
            .collect();

        queue
            .replace_with_rng(tracks, 3, true, &mut rng)
            .unwrap();

        assert!(queue.is_shuffled());
        assert_eq!(queue.current().unwrap().id.as_str(), "4");
        let original: Vec<&str> = queue
            .original_order()
            .unwrap()
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(original, vec!["1", "2", "3", "4", "5"]);
    }

    #[test]
    fn advance_steps_forward_and_back() {
        let queue = queue_of(&["s1", "s2", "s3"], Some(1));
        assert_eq!(queue.advance(Direction::Next, RepeatMode::Off, false), Some(2));
        assert_eq!(queue.advance(Direction::Previous, RepeatMode::Off, false), Some(0));
    }

    #[test]
    fn advance_stops_at_edges_without_repeat() {
        let last = queue_of(&["s1", "s2", "s3"], Some(2));
        assert_eq!(last.advance(Direction::Next, RepeatMode::Off, false), None);

        let first = queue_of(&["s1", "s2", "s3"], Some(0));
        assert_eq!(first.advance(Direction::Previous, RepeatMode::Off, false), None);
    }

    #[test]
    fn advance_wraps_with_repeat_all() {
        let last = queue_of(&["s1", "s2", "s3"], Some(2));
        assert_eq!(last.advance(Direction::Next, RepeatMode::All, false), Some(0));

        let first = queue_of(&["s1", "s2", "s3"], Some(0));
        assert_eq!(first.advance(Direction::Previous, RepeatMode::All, false), Some(2));
    }

    #[test]
    fn advance_repeat_one_keeps_index_even_when_shuffled() {
        let queue = queue_of(&["s1", "s2", "s3"], Some(1));
        assert_eq!(queue.advance(Direction::Next, RepeatMode::One, true), Some(1));
        assert_eq!(queue.advance(Direction::Previous, RepeatMode::One, false), Some(1));
    }

    #[test]
    fn advance_without_current_starts_at_front() {
        let queue = queue_of(&["s1", "s2"], None);
        assert_eq!(queue.advance(Direction::Next, RepeatMode::Off, false), Some(0));
        assert_eq!(queue.advance(Direction::Previous, RepeatMode::Off, false), None);
        assert_eq!(queue.advance(Direction::Previous, RepeatMode::All, false), Some(1));
    }

    #[test]
    fn advance_on_empty_queue_has_no_track() {
        let queue = Queue::new();
        assert_eq!(queue.advance(Direction::Next, RepeatMode::All, true), None);
    }

    #[test]
    fn shuffle_round_trip_restores_order() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut queue = queue_of(&["1", "2", "3", "4", "5", "6"], Some(2));

        queue.enable_shuffle_with_rng(&mut rng);
        assert!(queue.is_shuffled());
        assert_eq!(queue.current().unwrap().id.as_str(), "3");

        queue.disable_shuffle().unwrap();
        assert_eq!(ids(&queue), vec!["1", "2", "3", "4", "5", "6"]);
        assert_eq!(queue.current_index(), Some(2));
        assert!(!queue.is_shuffled());
    }

    #[test]
    fn enable_shuffle_twice_keeps_first_snapshot() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut queue = queue_of(&["1", "2", "3", "4"], None);

        queue.enable_shuffle_with_rng(&mut rng);
        queue.enable_shuffle_with_rng(&mut rng);
        queue.disable_shuffle().unwrap();

        assert_eq!(ids(&queue), vec!["1", "2", "3", "4"]);
        assert_eq!(queue.current_index(), None);
    }

    #[test]
    fn disable_shuffle_falls_back_when_current_missing() {
        // Original order that no longer contains the live current track
        let mut queue = Queue {
            tracks: vec![create_test_track("x"), create_test_track("b")],
            current: Some(0),
            original: Some(vec![create_test_track("a"), create_test_track("b")]),
        };

        let result = queue.disable_shuffle();
        assert!(matches!(result, Err(PlaybackError::TrackNotFound(id)) if id.as_str() == "x"));
        assert_eq!(queue.current_index(), Some(0));
        assert_eq!(ids(&queue), vec!["a", "b"]);
    }

    #[test]
    fn remove_current_clears_index() {
        let mut queue = queue_of(&["a", "b", "c"], Some(1));
        let removed = queue.remove_at(1).unwrap();

        assert_eq!(removed.track.id.as_str(), "b");
        assert!(removed.was_current);
        assert_eq!(queue.current_index(), None);
    }

    #[test]
    fn remove_before_current_shifts_index() {
        let mut queue = queue_of(&["a", "b", "c"], Some(2));
        let removed = queue.remove_at(0).unwrap();

        assert!(!removed.was_current);
        assert_eq!(queue.current().unwrap().id.as_str(), "c");
        assert_eq!(queue.current_index(), Some(1));
    }

    #[test]
    fn remove_out_of_range_fails() {
        let mut queue = queue_of(&["a"], Some(0));
        assert!(matches!(queue.remove_at(3), Err(PlaybackError::InvalidIndex(3))));
    }

    #[test]
    fn edits_while_shuffled_reach_original_order() {
        let mut rng = StdRng::seed_from_u64(21);
        let mut queue = queue_of(&["a", "b", "c"], Some(0));

        queue.enable_shuffle_with_rng(&mut rng);
        queue.append(create_test_track("d"));
        let b_pos = queue.tracks().iter().position(|t| t.id.as_str() == "b").unwrap();
        queue.remove_at(b_pos).unwrap();
        queue.disable_shuffle().unwrap();

        assert_eq!(ids(&queue), vec!["a", "c", "d"]);
        assert_eq!(queue.current().unwrap().id.as_str(), "a");
    }

    #[test]
    fn restore_drops_invalid_index() {
        let queue = queue_of(&["a", "b"], Some(7));
        assert_eq!(queue.current_index(), None);
    }

    #[test]
    fn restore_shuffled_without_original_uses_live_order() {
        let mut queue = Queue::restore(
            vec![create_test_track("b"), create_test_track("a")],
            Some(1),
            None,
            true,
        );
        assert!(queue.is_shuffled());
        queue.disable_shuffle().unwrap();
        assert_eq!(ids(&queue), vec!["b", "a"]);
        assert_eq!(queue.current_index(), Some(1));
    }

    #[test]
    fn restore_shuffled_with_incomplete_original_uses_live_order() {
        let mut queue = Queue::restore(
            vec![create_test_track("c"), create_test_track("a")],
            Some(0),
            Some(vec![create_test_track("a"), create_test_track("b")]),
            true,
        );
        assert_eq!(
            queue.original_order().unwrap().iter().map(|t| t.id.as_str()).collect::<Vec<_>>(),
            vec!["c", "a"]
        );
        queue.disable_shuffle().unwrap();
        assert_eq!(queue.current().unwrap().id.as_str(), "c");
    }

    #[test]
    fn set_current_validates() {
        let mut queue = queue_of(&["a", "b"], None);
        queue.set_current(Some(1)).unwrap();
        assert_eq!(queue.current().unwrap().id.as_str(), "b");
        assert!(queue.set_current(Some(2)).is_err());
        queue.set_current(None).unwrap();
        assert!(queue.current().is_none());

        queue.set_current(Some(0)).unwrap();
        queue.clear_current();
        assert_eq!(queue.current_index(), None);
    }

    #[test]
    fn clear_queue() {
        let mut queue = queue_of(&["a", "b"], Some(0));
        queue.enable_shuffle();
        queue.clear();
        assert!(queue.is_empty());
        assert!(!queue.is_shuffled());
        assert_eq!(queue.current_index(), None);
    }
}
