use std::{fmt::Display, sync::Arc};

use serde::Serialize;

use crate::{
    domain::media::Payload,
    handles::{HandleRegistry, MediaHandle},
};

/// Store-assigned track id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SongId(pub i64);

impl Display for SongId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A row of the `songs` table
#[derive(Debug, Clone)]
pub struct SongRecord {
    pub id: SongId,
    pub name: String,
    pub playlist: String,
    pub audio: Arc<Payload>,
    pub cover: Option<Arc<Payload>>,
}

/// A song about to be stored, before the store gave it an id
#[derive(Debug, Clone, Copy)]
pub struct NewSong<'a> {
    pub name: &'a str,
    pub playlist: &'a str,
    pub audio: &'a Payload,
    pub cover: Option<&'a Payload>,
}

/// Represent a music track of the library
///
/// Owns the handles derived from its payloads,
/// they are revoked when the track is dropped or the cover replaced.
#[derive(Debug)]
pub struct Track {
    pub id: SongId,
    pub name: String,
    pub playlist: String,
    audio: Arc<Payload>,
    cover: Option<Arc<Payload>>,
    playable: MediaHandle,
    cover_handle: Option<MediaHandle>,
}

impl Track {
    pub fn from_record(record: SongRecord, handles: &HandleRegistry) -> Self {
        let playable = handles.issue(record.audio.clone());
        let cover_handle = record.cover.as_ref().map(|c| handles.issue(c.clone()));
        Self {
            id: record.id,
            name: record.name,
            playlist: record.playlist,
            audio: record.audio,
            cover: record.cover,
            playable,
            cover_handle,
        }
    }

    pub fn audio(&self) -> &Arc<Payload> {
        &self.audio
    }

    pub fn cover(&self) -> Option<&Arc<Payload>> {
        self.cover.as_ref()
    }

    pub fn url(&self) -> &str {
        self.playable.url()
    }

    pub fn cover_url(&self) -> Option<&str> {
        self.cover_handle.as_ref().map(|h| h.url())
    }

    /// Replaces the cover; the previous cover handle is released here.
    pub fn replace_cover(&mut self, cover: Arc<Payload>, handles: &HandleRegistry) {
        self.cover_handle = Some(handles.issue(cover.clone()));
        self.cover = Some(cover);
    }

    pub fn new_song(&self) -> NewSong<'_> {
        NewSong {
            name: &self.name,
            playlist: &self.playlist,
            audio: &self.audio,
            cover: self.cover.as_deref(),
        }
    }
}
