//! In-memory library: playlists by name, each an ordered list of tracks
//!
//! The library only validates and applies changes, it never talks to the store.
//! The player persists first and applies here once the store accepted the change.

pub mod error;

use crate::domain::track::Track;
use error::ValidationError;

/// Name of the playlist that always exists
pub const DEFAULT_PLAYLIST: &str = "All Tracks";

#[derive(Debug)]
pub struct Playlist {
    name: String,
    tracks: Vec<Track>,
}

impl Playlist {
    fn new(name: String) -> Self {
        Self {
            name,
            tracks: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
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

    pub fn is_default(&self) -> bool {
        self.name == DEFAULT_PLAYLIST
    }

    fn out_of_range(&self, index: usize) -> ValidationError {
        ValidationError::IndexOutOfRange {
            playlist: self.name.clone(),
            index,
        }
    }
}

#[derive(Debug)]
pub struct Library {
    /// default playlist first, then in creation order
    playlists: Vec<Playlist>,
    active: String,
}

impl Default for Library {
    fn default() -> Self {
        Self::new()
    }
}

impl Library {
    pub fn new() -> Self {
        Self {
            playlists: vec![Playlist::new(DEFAULT_PLAYLIST.to_string())],
            active: DEFAULT_PLAYLIST.to_string(),
        }
    }

    pub fn playlists(&self) -> &[Playlist] {
        &self.playlists
    }

    pub fn playlist(&self, name: &str) -> Option<&Playlist> {
        self.playlists.iter().find(|p| p.name == name)
    }

    fn playlist_mut(&mut self, name: &str) -> Result<&mut Playlist, ValidationError> {
        self.playlists
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| ValidationError::UnknownPlaylist(name.to_string()))
    }

    fn existing(&self, name: &str) -> Result<&Playlist, ValidationError> {
        self.playlist(name)
            .ok_or_else(|| ValidationError::UnknownPlaylist(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.playlist(name).is_some()
    }

    pub fn active_name(&self) -> &str {
        &self.active
    }

    pub fn active(&self) -> &Playlist {
        // the default playlist sits at index 0 and is never removed
        self.playlist(&self.active).unwrap_or(&self.playlists[0])
    }

    pub fn set_active(&mut self, name: &str) -> Result<(), ValidationError> {
        self.existing(name)?;
        self.active = name.to_string();
        Ok(())
    }

    /// Names of the user playlists, as written to the structure list
    pub fn structure(&self) -> Vec<String> {
        self.playlists
            .iter()
            .filter(|p| !p.is_default())
            .map(|p| p.name.clone())
            .collect()
    }

    pub fn track_count(&self) -> usize {
        self.playlists.iter().map(Playlist::len).sum()
    }

    /// Validates a name for a new playlist, returns it trimmed
    pub fn check_new_name(&self, name: &str) -> Result<String, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if name == DEFAULT_PLAYLIST {
            return Err(ValidationError::DefaultPlaylist);
        }
        if self.contains(name) {
            return Err(ValidationError::DuplicatePlaylist(name.to_string()));
        }
        Ok(name.to_string())
    }

    pub fn create_playlist(&mut self, name: &str) -> Result<String, ValidationError> {
        let name = self.check_new_name(name)?;
        self.playlists.push(Playlist::new(name.clone()));
        Ok(name)
    }

    /// Adds an empty playlist unless it exists; used while hydrating
    pub fn ensure_playlist(&mut self, name: &str) -> bool {
        if self.contains(name) {
            false
        } else {
            self.playlists.push(Playlist::new(name.to_string()));
            true
        }
    }

    /// Checks that `old` may be renamed to `new`, returns `new` trimmed
    pub fn check_rename(&self, old: &str, new: &str) -> Result<String, ValidationError> {
        if old == DEFAULT_PLAYLIST {
            return Err(ValidationError::DefaultPlaylist);
        }
        self.existing(old)?;
        self.check_new_name(new)
    }

    pub fn rename_playlist(&mut self, old: &str, new: &str) -> Result<String, ValidationError> {
        let new = self.check_rename(old, new)?;
        let playlist = self.playlist_mut(old)?;
        playlist.name = new.clone();
        for track in &mut playlist.tracks {
            track.playlist = new.clone();
        }
        if self.active == old {
            self.active = new.clone();
        }
        Ok(new)
    }

    pub fn check_removable(&self, name: &str) -> Result<&Playlist, ValidationError> {
        if name == DEFAULT_PLAYLIST {
            return Err(ValidationError::DefaultPlaylist);
        }
        self.existing(name)
    }

    /// Removes a playlist with its tracks and makes the default playlist active
    pub fn remove_playlist(&mut self, name: &str) -> Result<Playlist, ValidationError> {
        self.check_removable(name)?;
        let position = self
            .playlists
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| ValidationError::UnknownPlaylist(name.to_string()))?;
        self.active = DEFAULT_PLAYLIST.to_string();
        Ok(self.playlists.remove(position))
    }

    pub fn track(&self, playlist: &str, index: usize) -> Result<&Track, ValidationError> {
        let list = self.existing(playlist)?;
        list.tracks.get(index).ok_or_else(|| list.out_of_range(index))
    }

    pub fn track_mut(&mut self, playlist: &str, index: usize) -> Result<&mut Track, ValidationError> {
        let list = self.playlist_mut(playlist)?;
        if index >= list.tracks.len() {
            return Err(list.out_of_range(index));
        }
        Ok(&mut list.tracks[index])
    }

    /// Appends a track to the playlist named by its `playlist` field, returns its index
    pub fn push_track(&mut self, track: Track) -> Result<usize, ValidationError> {
        let list = self.playlist_mut(&track.playlist)?;
        list.tracks.push(track);
        Ok(list.tracks.len() - 1)
    }

    pub fn remove_track(&mut self, playlist: &str, index: usize) -> Result<Track, ValidationError> {
        let list = self.playlist_mut(playlist)?;
        if index >= list.tracks.len() {
            return Err(list.out_of_range(index));
        }
        Ok(list.tracks.remove(index))
    }

    /// Moves the entry at `from` so that it ends up at `to`
    pub fn reorder(&mut self, playlist: &str, from: usize, to: usize) -> Result<(), ValidationError> {
        let list = self.playlist_mut(playlist)?;
        for index in [from, to] {
            if index >= list.tracks.len() {
                return Err(list.out_of_range(index));
            }
        }
        if from != to {
            let track = list.tracks.remove(from);
            list.tracks.insert(to, track);
        }
        Ok(())
    }

    /// Tracks of the active playlist whose name contains `query`, ignoring case.
    /// Indices are positions in the unfiltered playlist.
    pub fn search(&self, query: &str) -> Vec<(usize, &Track)> {
        matching(self.active(), query)
    }

    /// Same as [`Library::search`] over any playlist
    pub fn search_in(
        &self,
        playlist: &str,
        query: &str,
    ) -> Result<Vec<(usize, &Track)>, ValidationError> {
        Ok(matching(self.existing(playlist)?, query))
    }

    /// every track sits in the playlist its `playlist` field names, and names are unique
    pub fn is_consistent(&self) -> bool {
        let mut names: Vec<&str> = self.playlists.iter().map(|p| p.name.as_str()).collect();
        names.sort_unstable();
        let unique = names.windows(2).all(|w| w[0] != w[1]);

        unique
            && self.playlists.first().is_some_and(Playlist::is_default)
            && self.contains(&self.active)
            && self
                .playlists
                .iter()
                .all(|p| p.tracks.iter().all(|t| t.playlist == p.name))
    }
}

fn matching<'a>(playlist: &'a Playlist, query: &str) -> Vec<(usize, &'a Track)> {
    let query = query.trim().to_lowercase();
    playlist
        .tracks
        .iter()
        .enumerate()
        .filter(|(_, t)| query.is_empty() || t.name.to_lowercase().contains(&query))
        .collect()
}
