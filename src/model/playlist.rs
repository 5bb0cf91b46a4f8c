//! Ordered playlist with a cursor and the sequencing rules built on it

use rand::Rng;

use super::track::{Track, TrackKind};

#[derive(Clone, Debug, Default)]
pub struct PlaylistState {
    tracks: Vec<Track>,
    current_index: usize,
    pub shuffle_enabled: bool,
    pub repeat_enabled: bool,
}

impl PlaylistState {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self {
            tracks,
            ..Default::default()
        }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Track> {
        self.tracks.get_mut(index)
    }

    /// Moves the cursor. Returns false when `index` is out of bounds.
    pub fn select(&mut self, index: usize) -> bool {
        if index < self.tracks.len() {
            self.current_index = index;
            true
        } else {
            false
        }
    }

    /// Full replace; the cursor goes back to the first track
    pub fn replace(&mut self, tracks: Vec<Track>) {
        self.tracks = tracks;
        self.current_index = 0;
    }

    pub fn push(&mut self, track: Track) -> usize {
        self.tracks.push(track);
        self.tracks.len() - 1
    }

    /// Removes a track and keeps the cursor pointing at the same entry where possible.
    /// Returns the removed track and whether it was the current one.
    pub fn remove(&mut self, index: usize) -> Option<(Track, bool)> {
        if index >= self.tracks.len() {
            return None;
        }
        let removed = self.tracks.remove(index);
        let was_current = index == self.current_index;

        if was_current {
            self.current_index = self.current_index.min(self.tracks.len().saturating_sub(1));
        } else if index < self.current_index {
            self.current_index -= 1;
        }
        Some((removed, was_current))
    }

    pub fn next_index(&self) -> Option<usize> {
        if self.tracks.is_empty() {
            return None;
        }
        if self.shuffle_enabled {
            return Some(self.random_index());
        }
        Some(if self.current_index + 1 < self.tracks.len() {
            self.current_index + 1
        } else {
            0
        })
    }

    pub fn previous_index(&self) -> Option<usize> {
        if self.tracks.is_empty() {
            return None;
        }
        if self.shuffle_enabled {
            return Some(self.random_index());
        }
        Some(if self.current_index > 0 {
            self.current_index - 1
        } else {
            self.tracks.len() - 1
        })
    }

    // No anti-repeat: the current index may come up again.
    fn random_index(&self) -> usize {
        rand::thread_rng().gen_range(0..self.tracks.len())
    }

    /// Forward circular scan starting one past `from`
    pub fn find_next_playable(&self, from: usize) -> Option<usize> {
        let len = self.tracks.len();
        (1..len)
            .map(|offset| (from + offset) % len)
            .find(|&i| self.tracks[i].can_attempt())
    }

    pub fn total_duration_seconds(&self) -> u64 {
        self.tracks.iter().filter_map(Track::duration_seconds).sum()
    }

    pub fn count_by_kind(&self, kind: TrackKind) -> usize {
        self.tracks.iter().filter(|t| t.kind == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playlist(n: usize) -> PlaylistState {
        PlaylistState::new(
            (0..n)
                .map(|i| Track::new(format!("t{i}"), "a", format!("https://example.com/{i}.mp3")))
                .collect(),
        )
    }

    #[test]
    fn next_wraps_at_the_end() {
        let mut list = playlist(3);
        assert!(list.select(2));
        assert_eq!(list.next_index(), Some(0));
        assert!(list.select(0));
        assert_eq!(list.next_index(), Some(1));
    }

    #[test]
    fn previous_wraps_at_the_start() {
        let list = playlist(3);
        assert_eq!(list.previous_index(), Some(2));
    }

    #[test]
    fn shuffle_stays_in_bounds() {
        let mut list = playlist(4);
        list.shuffle_enabled = true;
        for _ in 0..200 {
            let i = list.next_index().unwrap();
            assert!(i < 4);
            let j = list.previous_index().unwrap();
            assert!(j < 4);
        }
    }

    #[test]
    fn empty_playlist_has_no_neighbours() {
        let list = PlaylistState::default();
        assert_eq!(list.next_index(), None);
        assert_eq!(list.previous_index(), None);
        assert_eq!(list.find_next_playable(0), None);
    }

    #[test]
    fn select_rejects_out_of_bounds() {
        let mut list = playlist(2);
        assert!(!list.select(2));
        assert_eq!(list.current_index(), 0);
    }

    #[test]
    fn unplayable_scan_finds_first_recoverable_track() {
        let list = PlaylistState::new(vec![
            Track::new("u1", "a", "https://youtu.be/one").mark_unplayable("blocked"),
            Track::new("u2", "a", "https://youtu.be/two").mark_unplayable("blocked"),
            Track::new("ok", "a", "https://example.com/ok.mp3"),
        ]);
        assert_eq!(list.find_next_playable(0), Some(2));
        assert_eq!(list.find_next_playable(1), Some(2));
        // Scan never returns the start index itself
        assert_eq!(list.find_next_playable(2), None);
    }

    #[test]
    fn fallback_makes_unplayable_track_eligible() {
        let list = PlaylistState::new(vec![
            Track::new("ok", "a", "https://example.com/ok.mp3"),
            Track::new("u", "a", "https://youtu.be/x")
                .mark_unplayable("blocked")
                .with_fallback("https://example.com/fb.mp3"),
        ]);
        assert_eq!(list.find_next_playable(0), Some(1));
    }

    #[test]
    fn whole_playlist_unplayable_is_none() {
        let list = PlaylistState::new(vec![
            Track::new("u1", "a", "https://youtu.be/one").mark_unplayable("x"),
            Track::new("u2", "a", "https://youtu.be/two").mark_unplayable("x"),
        ]);
        assert_eq!(list.find_next_playable(0), None);
    }

    #[test]
    fn remove_keeps_cursor_consistent() {
        let mut list = playlist(4);
        list.select(2);

        let (_, was_current) = list.remove(0).unwrap();
        assert!(!was_current);
        assert_eq!(list.current_index(), 1);

        assert!(list.remove(3).is_none());
        let (_, was_current) = list.remove(2).unwrap();
        assert!(!was_current);
        assert_eq!(list.current_index(), 1);

        let mut list = playlist(2);
        list.select(1);
        let (_, was_current) = list.remove(1).unwrap();
        assert!(was_current);
        assert_eq!(list.current_index(), 0);

        let (_, was_current) = list.remove(0).unwrap();
        assert!(was_current);
        assert!(list.is_empty());
        assert_eq!(list.current_index(), 0);
    }

    #[test]
    fn totals_skip_unparseable_hints() {
        let list = PlaylistState::new(vec![
            Track::new("a", "a", "a.mp3").with_duration_hint("3:24"),
            Track::new("b", "a", "https://youtu.be/b").with_duration_hint("LIVE"),
            Track::new("c", "a", "c.mp3").with_duration_hint("0:30"),
        ]);
        assert_eq!(list.total_duration_seconds(), 234);
        assert_eq!(list.count_by_kind(TrackKind::Video), 1);
        assert_eq!(list.count_by_kind(TrackKind::Audio), 2);
    }
}
