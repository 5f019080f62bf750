//! Keeps the library and its durable copies in step
//!
//! Hydration rebuilds the whole library from the store before anything can see it.
//! Write-through calls go to the store first; the player applies a change in memory
//! only after the matching call here succeeded.

use std::sync::Arc;

use super::error::PlayerError;
use crate::{
    config::Config,
    domain::{
        media::Payload,
        track::{NewSong, SongId, Track},
    },
    handles::HandleRegistry,
    library::{DEFAULT_PLAYLIST, Library},
    storage::{
        error::StorageError,
        operations::Storage,
        prefs::{PreferenceStore, Preferences},
    },
};

/// Library as found on startup
#[derive(Debug)]
pub struct Hydrated {
    pub library: Library,
    pub background: Option<Arc<Payload>>,
    /// `(playlist, index)` of the last track played
    pub last_played: Option<(String, usize)>,
}

impl Hydrated {
    fn empty(last_played: Option<(String, usize)>) -> Self {
        Self {
            library: Library::new(),
            background: None,
            last_played,
        }
    }
}

pub struct Synchronizer {
    store: Option<Storage>,
    prefs: PreferenceStore,
}

impl Synchronizer {
    pub fn new(store: Option<Storage>, prefs: PreferenceStore) -> Self {
        Self { store, prefs }
    }

    /// Opens both stores. A blob store that fails to open leaves the session non-persistent.
    pub fn open(config: &Config) -> Self {
        let store = match Storage::new(&config.database) {
            Ok(store) => Some(store),
            Err(e) => {
                log::error!("library store unavailable, running without persistence: {e}");
                None
            }
        };
        let prefs = PreferenceStore::open_or_default(config.preferences.path.as_deref());
        if !prefs.is_persistent() {
            log::info!("no preferences path configured, preferences last for this session only");
        }
        Self::new(store, prefs)
    }

    pub fn is_persistent(&self) -> bool {
        self.store.is_some()
    }

    pub fn prefs(&self) -> &Preferences {
        &self.prefs.values
    }

    pub fn require_store(&self) -> Result<(), PlayerError> {
        if self.store.is_some() {
            Ok(())
        } else {
            Err(PlayerError::StoreUnavailable)
        }
    }

    fn store(&mut self) -> Result<&mut Storage, PlayerError> {
        self.store.as_mut().ok_or(PlayerError::StoreUnavailable)
    }

    /// Builds the library from the store and the structure list.
    ///
    /// Each record's playlist is authoritative: a playlist missing from the structure
    /// list is recreated, a blank one puts the track in the default playlist.
    /// Without a readable store the library is empty, holding the default playlist only.
    /// If the songs cannot be read the store is dropped.
    pub fn hydrate(&mut self, handles: &HandleRegistry) -> Hydrated {
        let last_played = self.last_played();
        let Some(store) = self.store.as_mut() else {
            return Hydrated::empty(last_played);
        };

        let songs = match store.load_songs() {
            Ok(songs) => songs,
            Err(e) => {
                log::error!("failed to load songs, running without persistence: {e}");
                self.store = None;
                return Hydrated::empty(last_played);
            }
        };

        let mut library = Library::new();
        for name in &self.prefs.values.playlist_structure {
            let name = name.trim();
            if !name.is_empty() && name != DEFAULT_PLAYLIST {
                library.ensure_playlist(name);
            }
        }

        let count = songs.len();
        for mut record in songs {
            if record.playlist.trim().is_empty() {
                log::warn!(
                    "song {} has no playlist, placing it in '{DEFAULT_PLAYLIST}'",
                    record.id
                );
                record.playlist = DEFAULT_PLAYLIST.to_string();
            } else if library.ensure_playlist(&record.playlist) {
                log::info!("restored playlist '{}' from its songs", record.playlist);
            }
            let track = Track::from_record(record, handles);
            if let Err(e) = library.push_track(track) {
                log::error!("could not place hydrated song: {e}");
            }
        }

        let background = match store.background() {
            Ok(background) => background.map(Arc::new),
            Err(e) => {
                log::warn!("failed to load background image: {e}");
                None
            }
        };

        log::info!(
            "hydrated {count} songs in {} playlists",
            library.playlists().len()
        );

        if library.structure() != self.prefs.values.playlist_structure {
            self.save_structure(&library);
        }

        Hydrated {
            library,
            background,
            last_played,
        }
    }

    fn last_played(&self) -> Option<(String, usize)> {
        let name = self.prefs.values.active_playlist_name.clone()?;
        let index = self
            .prefs
            .values
            .current_track_index
            .and_then(|i| usize::try_from(i).ok())?;
        Some((name, index))
    }

    pub fn insert_song(&mut self, song: NewSong<'_>) -> Result<SongId, PlayerError> {
        let result = self.store()?.insert_song(song);
        persisted("store song", result)
    }

    pub fn rename_song(&mut self, id: SongId, name: &str) -> Result<(), PlayerError> {
        let result = self.store()?.rename_song(id, name);
        persisted("rename song", result)
    }

    pub fn set_song_cover(&mut self, id: SongId, cover: &Payload) -> Result<(), PlayerError> {
        let result = self.store()?.set_song_cover(id, cover);
        persisted("set cover", result)
    }

    pub fn set_songs_playlist(&mut self, ids: &[SongId], playlist: &str) -> Result<(), PlayerError> {
        let result = self.store()?.set_songs_playlist(ids, playlist);
        persisted("move songs to renamed playlist", result)
    }

    pub fn delete_song(&mut self, id: SongId) -> Result<(), PlayerError> {
        let result = self.store()?.delete_song(id);
        persisted("delete song", result)
    }

    pub fn delete_songs(&mut self, ids: &[SongId]) -> Result<(), PlayerError> {
        let result = self.store()?.delete_songs(ids);
        persisted("delete playlist songs", result).map(|removed| {
            log::debug!("removed {removed} songs from the store");
        })
    }

    pub fn put_background(&mut self, image: &Payload) -> Result<(), PlayerError> {
        let result = self.store()?.put_background(image);
        persisted("store background", result)
    }

    pub fn delete_background(&mut self) -> Result<(), PlayerError> {
        let result = self.store()?.delete_background();
        persisted("delete background", result)
    }

    /// Rewrites the structure list from the library's playlists
    pub fn save_structure(&mut self, library: &Library) {
        let structure = library.structure();
        self.prefs.update(|p| p.playlist_structure = structure);
    }

    /// Last played position; `None` when the playlist was selected without a track
    pub fn save_last_played(&mut self, playlist: &str, index: Option<usize>) {
        self.prefs.update(|p| {
            p.active_playlist_name = Some(playlist.to_string());
            p.current_track_index = index.and_then(|i| i64::try_from(i).ok());
        });
    }

    pub fn save_volume(&mut self, volume: f64) {
        self.prefs.update(|p| p.volume = Some(volume));
    }

    pub fn save_accent_color(&mut self, color: &str) {
        self.prefs.update(|p| p.accent_color = Some(color.to_string()));
    }
}

/// Logs a store failure and turns it into the coarse error callers see
fn persisted<T>(what: &str, result: Result<T, StorageError>) -> Result<T, PlayerError> {
    result.map_err(|e| {
        log::error!("failed to {what}: {e}");
        PlayerError::Persistence(what.to_string())
    })
}
