//! The single controller: owns the library, the playback state, the stores and the transport
//!
//! Every mutation writes to the blob store first and touches memory only once the
//! store accepted it, so a refused or failed operation leaves everything as it was.

pub mod error;
pub mod sync;

use std::sync::Arc;

use rand::{SeedableRng, rngs::StdRng};

use crate::{
    config::Config,
    domain::{
        media::{MediaFile, Payload},
        track::{NewSong, SongId, SongRecord, Track},
    },
    handles::{HandleRegistry, MediaHandle},
    library::{DEFAULT_PLAYLIST, Library, error::ValidationError},
    playback::{self, AfterRemoval, PlaybackState},
    storage::prefs::DEFAULT_ACCENT_COLOR,
    transport::Transport,
};
use error::PlayerError;
use sync::Synchronizer;

/// Background image with the handle the page displays it under
#[derive(Debug)]
pub struct Background {
    image: Arc<Payload>,
    handle: MediaHandle,
}

impl Background {
    fn new(image: Arc<Payload>, handles: &HandleRegistry) -> Self {
        let handle = handles.issue(image.clone());
        Self { image, handle }
    }

    pub fn image(&self) -> &Payload {
        &self.image
    }

    pub fn url(&self) -> &str {
        self.handle.url()
    }
}

pub struct Player {
    library: Library,
    playback: PlaybackState,
    sync: Synchronizer,
    handles: HandleRegistry,
    transport: Box<dyn Transport>,
    background: Option<Background>,
    accent_color: String,
    rng: StdRng,
}

impl Player {
    /// Opens the stores named by `config` and hydrates from them
    pub fn open(config: &Config, transport: Box<dyn Transport>, handles: HandleRegistry) -> Self {
        Self::start(Synchronizer::open(config), transport, handles)
    }

    /// Hydrates the library and restores the last session, without starting playback
    pub fn start(
        mut sync: Synchronizer,
        mut transport: Box<dyn Transport>,
        handles: HandleRegistry,
    ) -> Self {
        let hydrated = sync.hydrate(&handles);
        let prefs = sync.prefs().clone();

        let accent_color = prefs
            .accent_color
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ACCENT_COLOR.to_string());
        let volume = prefs
            .volume
            .filter(|v| v.is_finite())
            .map_or(1.0, |v| v.clamp(0.0, 1.0));
        transport.set_volume(volume);

        let background = hydrated
            .background
            .map(|image| Background::new(image, &handles));

        let mut player = Self {
            library: hydrated.library,
            playback: PlaybackState {
                volume,
                ..Default::default()
            },
            sync,
            handles,
            transport,
            background,
            accent_color,
            rng: StdRng::from_entropy(),
        };
        if let Some((playlist, index)) = hydrated.last_played {
            player.restore(&playlist, index);
        }
        player
    }

    fn restore(&mut self, playlist: &str, index: usize) {
        if let Err(e) = self.library.set_active(playlist) {
            log::warn!("could not restore last playlist: {e}");
            return;
        }
        match self.library.track(playlist, index) {
            Ok(track) => {
                self.transport.load(track.url());
                self.playback.current = Some(index);
                self.playback.loaded = Some(track.id);
                log::info!("restored '{}' from '{playlist}', paused", track.name);
            }
            Err(e) => log::warn!("could not restore last played track: {e}"),
        }
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn playback(&self) -> &PlaybackState {
        &self.playback
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub fn handles(&self) -> &HandleRegistry {
        &self.handles
    }

    pub fn background(&self) -> Option<&Background> {
        self.background.as_ref()
    }

    pub fn accent_color(&self) -> &str {
        &self.accent_color
    }

    pub fn is_persistent(&self) -> bool {
        self.sync.is_persistent()
    }

    pub fn create_playlist(&mut self, name: &str) -> Result<String, PlayerError> {
        self.sync.require_store()?;
        let name = self.library.create_playlist(name)?;
        self.sync.save_structure(&self.library);
        log::info!("created playlist '{name}'");
        Ok(name)
    }

    pub fn rename_playlist(&mut self, old: &str, new: &str) -> Result<String, PlayerError> {
        self.sync.require_store()?;
        let new = self.library.check_rename(old, new)?;
        let ids = self.playlist_ids(old);
        if !ids.is_empty() {
            self.sync.set_songs_playlist(&ids, &new)?;
        }

        self.library.rename_playlist(old, &new)?;
        self.sync.save_structure(&self.library);
        if self.library.active_name() == new {
            self.sync.save_last_played(&new, self.playback.current);
        }
        log::info!("renamed playlist '{old}' to '{new}'");
        Ok(new)
    }

    /// Deletes a playlist with all its tracks and goes back to the default playlist
    pub fn delete_playlist(&mut self, name: &str) -> Result<(), PlayerError> {
        self.sync.require_store()?;
        self.library.check_removable(name)?;
        let ids = self.playlist_ids(name);
        if !ids.is_empty() {
            self.sync.delete_songs(&ids)?;
        }

        let active_changed = self.library.active_name() != DEFAULT_PLAYLIST;
        let removed = self.library.remove_playlist(name)?;
        if active_changed {
            self.playback.current = None;
        }
        if self.playback.loaded.is_some_and(|id| ids.contains(&id)) {
            self.stop();
        }

        self.sync.save_structure(&self.library);
        if active_changed {
            self.sync.save_last_played(DEFAULT_PLAYLIST, None);
        }
        log::info!("deleted playlist '{name}' and its {} tracks", removed.len());
        Ok(())
    }

    /// Makes `name` the active playlist. Whatever is loaded keeps playing.
    pub fn select_playlist(&mut self, name: &str) -> Result<(), PlayerError> {
        self.library.set_active(name)?;
        self.playback.current = None;
        self.sync.save_last_played(name, None);
        Ok(())
    }

    /// Stores an uploaded audio file and appends it to `playlist`, returns its index there
    pub fn add_track(&mut self, file: MediaFile, playlist: &str) -> Result<usize, PlayerError> {
        self.sync.require_store()?;
        if !self.library.contains(playlist) {
            return Err(ValidationError::UnknownPlaylist(playlist.to_string()).into());
        }
        if !file.payload.is_audio() {
            return Err(ValidationError::NotAudio(file.file_name).into());
        }

        let name = file.track_name();
        let audio = Arc::new(file.payload);
        let id = self.sync.insert_song(NewSong {
            name: &name,
            playlist,
            audio: &audio,
            cover: None,
        })?;

        let record = SongRecord {
            id,
            name,
            playlist: playlist.to_string(),
            audio,
            cover: None,
        };
        let track = Track::from_record(record, &self.handles);
        log::info!(
            "added '{}' ({id}, {} bytes) to '{playlist}'",
            track.name,
            track.audio().len()
        );
        log::debug!("{id} audio digest {}", track.audio().digest());
        Ok(self.library.push_track(track)?)
    }

    /// Adds every file it can, returns how many made it
    pub fn add_tracks(
        &mut self,
        files: impl IntoIterator<Item = MediaFile>,
        playlist: &str,
    ) -> Result<usize, PlayerError> {
        self.sync.require_store()?;
        if !self.library.contains(playlist) {
            return Err(ValidationError::UnknownPlaylist(playlist.to_string()).into());
        }

        let mut added = 0;
        for file in files {
            let file_name = file.file_name.clone();
            match self.add_track(file, playlist) {
                Ok(_) => added += 1,
                Err(e) => log::warn!("skipped '{file_name}': {e}"),
            }
        }
        Ok(added)
    }

    pub fn delete_track(&mut self, playlist: &str, index: usize) -> Result<(), PlayerError> {
        self.sync.require_store()?;
        let id = self.library.track(playlist, index)?.id;
        self.sync.delete_song(id)?;

        let track = self.library.remove_track(playlist, index)?;
        if playlist == self.library.active_name() {
            match self.playback.after_removal(index) {
                AfterRemoval::Cleared => {
                    self.stop();
                    self.sync.save_last_played(playlist, None);
                }
                AfterRemoval::Shifted => {
                    self.sync.save_last_played(playlist, self.playback.current);
                }
                AfterRemoval::Unchanged => {}
            }
        }
        if self.playback.loaded == Some(id) {
            self.stop();
        }
        log::info!("deleted '{}' ({id}) from '{playlist}'", track.name);
        Ok(())
    }

    pub fn rename_track(&mut self, playlist: &str, index: usize, name: &str) -> Result<(), PlayerError> {
        self.sync.require_store()?;
        let id = self.library.track(playlist, index)?.id;
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }

        self.sync.rename_song(id, name)?;
        self.library.track_mut(playlist, index)?.name = name.to_string();
        Ok(())
    }

    /// Copies a track into `dest` as a new record; the original stays where it is.
    /// Returns the index of the copy.
    pub fn move_track(&mut self, source: &str, index: usize, dest: &str) -> Result<usize, PlayerError> {
        self.sync.require_store()?;
        if !self.library.contains(dest) {
            return Err(ValidationError::UnknownPlaylist(dest.to_string()).into());
        }

        let track = self.library.track(source, index)?;
        let id = self.sync.insert_song(NewSong {
            playlist: dest,
            ..track.new_song()
        })?;
        let record = SongRecord {
            id,
            name: track.name.clone(),
            playlist: dest.to_string(),
            audio: track.audio().clone(),
            cover: track.cover().cloned(),
        };

        let copy = Track::from_record(record, &self.handles);
        log::info!("copied '{}' from '{source}' to '{dest}' as {id}", copy.name);
        Ok(self.library.push_track(copy)?)
    }

    /// Drag and drop reordering; anything out of range is ignored. Lives in memory only.
    pub fn reorder(&mut self, playlist: &str, from: usize, to: usize) {
        if let Err(e) = self.library.reorder(playlist, from, to) {
            log::debug!("ignored reorder {from} -> {to}: {e}");
            return;
        }
        if playlist == self.library.active_name() {
            let before = self.playback.current;
            self.playback.after_reorder(from, to);
            if self.playback.current != before {
                self.sync.save_last_played(playlist, self.playback.current);
            }
        }
    }

    pub fn set_cover(&mut self, playlist: &str, index: usize, image: MediaFile) -> Result<(), PlayerError> {
        self.sync.require_store()?;
        let id = self.library.track(playlist, index)?.id;
        if !image.payload.is_image() {
            return Err(ValidationError::NotImage(image.file_name).into());
        }

        self.sync.set_song_cover(id, &image.payload)?;
        let cover = Arc::new(image.payload);
        self.library
            .track_mut(playlist, index)?
            .replace_cover(cover, &self.handles);
        Ok(())
    }

    pub fn set_background(&mut self, image: MediaFile) -> Result<(), PlayerError> {
        self.sync.require_store()?;
        if !image.payload.is_image() {
            return Err(ValidationError::NotImage(image.file_name).into());
        }
        self.sync.put_background(&image.payload)?;
        self.background = Some(Background::new(Arc::new(image.payload), &self.handles));
        Ok(())
    }

    pub fn reset_background(&mut self) -> Result<(), PlayerError> {
        self.sync.require_store()?;
        self.sync.delete_background()?;
        self.background = None;
        Ok(())
    }

    pub fn set_accent_color(&mut self, color: &str) -> Result<(), PlayerError> {
        let color = color.trim();
        if color.is_empty() {
            return Err(ValidationError::EmptyColor.into());
        }
        self.accent_color = color.to_string();
        self.sync.save_accent_color(color);
        Ok(())
    }

    /// Loads the track at `index` of the active playlist, starting it when `autoplay` is set
    pub fn play(&mut self, index: usize, autoplay: bool) -> Result<(), PlayerError> {
        let active = self.library.active_name().to_string();
        let track = self.library.track(&active, index)?;
        self.transport.load(track.url());
        self.playback.current = Some(index);
        self.playback.loaded = Some(track.id);
        log::debug!("loaded '{}' ({})", track.name, track.id);

        if autoplay {
            self.start_transport();
        }
        self.sync.save_last_played(&active, Some(index));
        Ok(())
    }

    pub fn next(&mut self) -> Option<usize> {
        let len = self.library.active().len();
        let index = playback::next_index(self.playback.current, len, self.playback.shuffle, &mut self.rng)?;
        self.play(index, true).ok().map(|_| index)
    }

    pub fn previous(&mut self) -> Option<usize> {
        let len = self.library.active().len();
        let index = playback::previous_index(self.playback.current, len)?;
        self.play(index, true).ok().map(|_| index)
    }

    /// Flips play/pause; nothing happens while no track is loaded
    pub fn toggle(&mut self) {
        if self.playback.loaded.is_none() {
            return;
        }
        if self.transport.is_paused() {
            self.start_transport();
        } else {
            self.transport.pause();
        }
    }

    /// `ended` from the transport
    pub fn on_track_ended(&mut self) {
        if self.playback.repeat && self.playback.loaded.is_some() {
            self.transport.seek(0.0);
            self.start_transport();
        } else {
            self.next();
        }
    }

    /// `timeupdate` from the transport
    pub fn on_time_update(&mut self, position: f64) {
        self.transport.observe_position(position);
    }

    /// `loadedmetadata` from the transport
    pub fn on_loaded_metadata(&mut self, duration: f64) {
        self.transport.observe_duration(duration);
    }

    /// Seeks to `percent` of the track; ignored until the duration is known
    pub fn seek(&mut self, percent: f64) {
        if !percent.is_finite() {
            return;
        }
        if let Some(duration) = self.transport.duration() {
            self.transport.seek(playback::seek_position(percent, duration));
        }
    }

    pub fn set_volume(&mut self, slider: f64) {
        if !slider.is_finite() {
            return;
        }
        let volume = playback::slider_to_volume(slider);
        self.playback.volume = volume;
        self.transport.set_volume(volume);
        self.sync.save_volume(volume);
    }

    pub fn volume_slider(&self) -> f64 {
        playback::volume_to_slider(self.playback.volume)
    }

    pub fn toggle_shuffle(&mut self) -> bool {
        self.playback.shuffle = !self.playback.shuffle;
        self.playback.shuffle
    }

    pub fn toggle_repeat(&mut self) -> bool {
        self.playback.repeat = !self.playback.repeat;
        self.playback.repeat
    }

    fn start_transport(&mut self) {
        if let Err(e) = self.transport.play() {
            log::warn!("{e}");
            self.transport.pause();
        }
    }

    fn stop(&mut self) {
        self.transport.pause();
        self.transport.unload();
        self.playback.loaded = None;
    }

    fn playlist_ids(&self, name: &str) -> Vec<SongId> {
        self.library
            .playlist(name)
            .map(|p| p.tracks().iter().map(|t| t.id).collect())
            .unwrap_or_default()
    }
}
