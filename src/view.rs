//! What the page renders: a serializable snapshot of the player

use serde::Serialize;

use crate::{
    domain::track::{SongId, Track},
    library::error::ValidationError,
    playback::{format_time, progress},
    player::Player,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaylistEntry {
    pub name: String,
    pub len: usize,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackEntry {
    /// position in the unfiltered active playlist
    pub index: usize,
    pub id: SongId,
    pub name: String,
    pub url: String,
    pub cover_url: Option<String>,
    pub current: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NowPlaying {
    pub title: String,
    pub url: String,
    pub cover_url: Option<String>,
    pub playing: bool,
    pub position: f64,
    pub duration: Option<f64>,
    /// seek bar value, 0..=100
    pub progress: f64,
    pub elapsed: String,
    pub total: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LibraryView {
    pub playlists: Vec<PlaylistEntry>,
    pub active_playlist: String,
    pub tracks: Vec<TrackEntry>,
    pub now_playing: Option<NowPlaying>,
    pub shuffle: bool,
    pub repeat: bool,
    pub volume_slider: f64,
    pub accent_color: String,
    pub background_url: Option<String>,
    /// false when the library store could not be opened
    pub persistent: bool,
}

impl LibraryView {
    /// Projects the player, listing only tracks of the active playlist matching `query`
    pub fn render(player: &Player, query: Option<&str>) -> Self {
        let library = player.library();
        let tracks = library.search(query.unwrap_or_default());
        Self::build(player, library.active().name(), tracks)
    }

    /// Like [`LibraryView::render`] with `playlist` shown in place of the active one.
    /// The player is only read, nothing is selected or saved.
    pub fn render_playlist(
        player: &Player,
        playlist: &str,
        query: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let tracks = player
            .library()
            .search_in(playlist, query.unwrap_or_default())?;
        Ok(Self::build(player, playlist, tracks))
    }

    fn build(player: &Player, shown: &str, tracks: Vec<(usize, &Track)>) -> Self {
        let library = player.library();
        let playback = player.playback();
        // indices only mean something in the playlist navigation runs on
        let navigating = shown == library.active_name();

        let playlists = library
            .playlists()
            .iter()
            .map(|p| PlaylistEntry {
                name: p.name().to_string(),
                len: p.len(),
                active: p.name() == shown,
            })
            .collect();

        let tracks = tracks
            .into_iter()
            .map(|(index, track)| TrackEntry {
                index,
                id: track.id,
                name: track.name.clone(),
                url: track.url().to_string(),
                cover_url: track.cover_url().map(str::to_string),
                current: navigating && playback.current == Some(index),
            })
            .collect();

        Self {
            playlists,
            active_playlist: shown.to_string(),
            tracks,
            now_playing: now_playing(player),
            shuffle: playback.shuffle,
            repeat: playback.repeat,
            volume_slider: player.volume_slider(),
            accent_color: player.accent_color().to_string(),
            background_url: player.background().map(|b| b.url().to_string()),
            persistent: player.is_persistent(),
        }
    }
}

/// The loaded track, wherever it lives now
fn now_playing(player: &Player) -> Option<NowPlaying> {
    let loaded = player.playback().loaded?;
    let track = player
        .library()
        .playlists()
        .iter()
        .flat_map(|p| p.tracks())
        .find(|t| t.id == loaded)?;

    let transport = player.transport();
    let position = transport.position();
    let duration = transport.duration();
    Some(NowPlaying {
        title: track.name.clone(),
        url: track.url().to_string(),
        cover_url: track.cover_url().map(str::to_string),
        playing: !transport.is_paused(),
        position,
        duration,
        progress: progress(position, duration),
        elapsed: format_time(position),
        total: duration.map(format_time).unwrap_or_else(|| format_time(0.0)),
    })
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use super::*;
    use crate::{
        domain::media::MediaFile,
        handles::HandleRegistry,
        library::DEFAULT_PLAYLIST,
        player::sync::Synchronizer,
        storage::{operations::Storage, prefs::PreferenceStore, schema},
        transport::tests::SharedTransport,
    };

    fn player() -> Player {
        let conn = Connection::open_in_memory().unwrap();
        schema::init(&conn).unwrap();
        let sync = Synchronizer::new(
            Some(Storage::from_existing_conn(conn)),
            PreferenceStore::in_memory(),
        );
        Player::start(
            sync,
            Box::new(SharedTransport::default()),
            HandleRegistry::default(),
        )
    }

    fn mp3(name: &str) -> MediaFile {
        MediaFile::new(format!("{name}.mp3"), "audio/mpeg", name.as_bytes().to_vec())
    }

    #[test]
    fn empty_player_view() {
        let view = LibraryView::render(&player(), None);

        assert_eq!(view.active_playlist, DEFAULT_PLAYLIST);
        assert_eq!(view.playlists.len(), 1);
        assert!(view.playlists[0].active);
        assert!(view.tracks.is_empty());
        assert!(view.now_playing.is_none());
        assert_eq!(view.volume_slider, 100.0);
        assert_eq!(view.accent_color, "rgb(180, 180, 180)");
        assert!(view.persistent);
    }

    #[test]
    fn search_filters_but_keeps_positions() {
        let mut player = player();
        for name in ["Intro", "Song", "Outro"] {
            player.add_track(mp3(name), DEFAULT_PLAYLIST).unwrap();
        }
        player.play(2, true).unwrap();

        let view = LibraryView::render(&player, Some("tro"));
        let listed: Vec<(usize, &str, bool)> = view
            .tracks
            .iter()
            .map(|t| (t.index, t.name.as_str(), t.current))
            .collect();
        assert_eq!(listed, vec![(0, "Intro", false), (2, "Outro", true)]);
    }

    #[test]
    fn now_playing_follows_loaded_track_across_playlists() {
        let mut player = player();
        player.create_playlist("Rock").unwrap();
        player.add_track(mp3("a"), DEFAULT_PLAYLIST).unwrap();
        player.play(0, true).unwrap();
        player.on_loaded_metadata(120.0);
        player.on_time_update(30.0);
        player.select_playlist("Rock").unwrap();

        let view = LibraryView::render(&player, None);
        let now = view.now_playing.unwrap();
        assert_eq!(now.title, "a");
        assert!(now.playing);
        assert_eq!(now.progress, 25.0);
        assert_eq!(now.elapsed, "0:30");
        assert_eq!(now.total, "2:00");
        assert!(view.tracks.is_empty());
        assert_eq!(view.active_playlist, "Rock");
    }

    #[test]
    fn other_playlist_is_shown_without_selecting_it() {
        let mut player = player();
        player.create_playlist("Rock").unwrap();
        player.add_track(mp3("a"), DEFAULT_PLAYLIST).unwrap();
        player.add_track(mp3("b"), "Rock").unwrap();
        player.play(0, false).unwrap();

        let view = LibraryView::render_playlist(&player, "Rock", None).unwrap();

        assert_eq!(view.active_playlist, "Rock");
        assert_eq!(view.tracks.len(), 1);
        assert!(!view.tracks[0].current);
        assert!(view.playlists[1].active);
        assert_eq!(player.library().active_name(), DEFAULT_PLAYLIST);
        assert_eq!(player.playback().current, Some(0));
        assert!(LibraryView::render_playlist(&player, "Jazz", None).is_err());
    }

    #[test]
    fn view_serializes_to_json() -> anyhow::Result<()> {
        let json = serde_json::to_value(LibraryView::render(&player(), None))?;
        assert_eq!(json["active_playlist"], DEFAULT_PLAYLIST);
        assert_eq!(json["playlists"][0]["len"], 0);
        assert!(json["background_url"].is_null());
        Ok(())
    }
}
