use std::sync::Arc;

use crate::{
    config,
    domain::{
        media::Payload,
        track::{NewSong, SongId, SongRecord},
    },
    storage::{
        db,
        error::StorageError,
        schema::{BACKGROUND_KEY, columns, tables},
    },
};

use columns::*;
use rusqlite::{OptionalExtension, params};
use tables::*;

/// Blob store: song records and the background image
pub struct Storage {
    pub(crate) db: rusqlite::Connection,
}

impl Storage {
    /// when called, opens a data base connection
    pub fn new(db_config: &config::Database) -> Result<Self, StorageError> {
        let db: rusqlite::Connection = db::open(db_config)?;
        Ok(Self::from_existing_conn(db))
    }

    pub fn from_existing_conn(db: rusqlite::Connection) -> Self {
        Self { db }
    }

    /// Stores a new song, the store assigns its id
    pub fn insert_song(&mut self, song: NewSong<'_>) -> Result<SongId, StorageError> {
        self.db.execute(
            &format!(
                "INSERT INTO {SONGS} ({NAME}, {AUDIO}, {AUDIO_TYPE}, {PLAYLIST}, {COVER}, {COVER_TYPE})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
            ),
            params![
                song.name,
                song.audio.bytes(),
                song.audio.media_type(),
                song.playlist,
                song.cover.map(|c| c.bytes()),
                song.cover.map(|c| c.media_type()),
            ],
        )?;
        let id = SongId(self.db.last_insert_rowid());
        log::debug!("stored song {id} '{}' in '{}'", song.name, song.playlist);
        Ok(id)
    }

    pub fn rename_song(&mut self, id: SongId, name: &str) -> Result<(), StorageError> {
        let changed = self.db.execute(
            &format!("UPDATE {SONGS} SET {NAME} = ?1 WHERE {ID} = ?2"),
            params![name, id.0],
        )?;
        Self::expect_one(changed, id)
    }

    pub fn set_song_cover(&mut self, id: SongId, cover: &Payload) -> Result<(), StorageError> {
        let changed = self.db.execute(
            &format!("UPDATE {SONGS} SET {COVER} = ?1, {COVER_TYPE} = ?2 WHERE {ID} = ?3"),
            params![cover.bytes(), cover.media_type(), id.0],
        )?;
        Self::expect_one(changed, id)
    }

    /// Re-files the given songs under another playlist, all or nothing
    pub fn set_songs_playlist(&mut self, ids: &[SongId], playlist: &str) -> Result<(), StorageError> {
        let tx = self.db.transaction()?;
        {
            let mut stmt = tx.prepare(&format!("UPDATE {SONGS} SET {PLAYLIST} = ?1 WHERE {ID} = ?2"))?;
            for id in ids {
                let changed = stmt.execute(params![playlist, id.0])?;
                Self::expect_one(changed, *id)?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Removes a song. Removing a song that is already gone is not an error.
    pub fn delete_song(&mut self, id: SongId) -> Result<(), StorageError> {
        let changed = self
            .db
            .execute(&format!("DELETE FROM {SONGS} WHERE {ID} = ?1"), params![id.0])?;
        if changed == 0 {
            log::warn!("song {id} was already missing from the store");
        }
        Ok(())
    }

    /// Removes several songs in one transaction, returns how many rows went away
    pub fn delete_songs(&mut self, ids: &[SongId]) -> Result<usize, StorageError> {
        let tx = self.db.transaction()?;
        let mut removed = 0;
        {
            let mut stmt = tx.prepare(&format!("DELETE FROM {SONGS} WHERE {ID} = ?1"))?;
            for id in ids {
                removed += stmt.execute(params![id.0])?;
            }
        }
        tx.commit()?;
        Ok(removed)
    }

    /// All songs in insertion order
    pub fn load_songs(&mut self) -> Result<Vec<SongRecord>, StorageError> {
        let mut stmt = self.db.prepare(&format!(
            "SELECT {ID}, {NAME}, {AUDIO}, {AUDIO_TYPE}, {PLAYLIST}, {COVER}, {COVER_TYPE}
             FROM {SONGS} ORDER BY {ID}"
        ))?;
        let songs = stmt
            .query_map([], Self::song_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(songs)
    }

    #[cfg(test)]
    pub fn load_song(&mut self, id: SongId) -> Result<SongRecord, StorageError> {
        self.db
            .query_row(
                &format!(
                    "SELECT {ID}, {NAME}, {AUDIO}, {AUDIO_TYPE}, {PLAYLIST}, {COVER}, {COVER_TYPE}
                 FROM {SONGS} WHERE {ID} = ?1"
                ),
                params![id.0],
                Self::song_from_row,
            )
            .optional()?
            .ok_or(StorageError::SongNotFound(id))
    }

    pub fn background(&self) -> Result<Option<Payload>, StorageError> {
        let background = self
            .db
            .query_row(
                &format!("SELECT {VALUE}, {MEDIA_TYPE} FROM {SETTINGS} WHERE {KEY} = ?1"),
                params![BACKGROUND_KEY],
                |row| {
                    let bytes: Vec<u8> = row.get(0)?;
                    let media_type: String = row.get(1)?;
                    Ok(Payload::new(media_type, bytes))
                },
            )
            .optional()?;
        Ok(background)
    }

    pub fn put_background(&mut self, image: &Payload) -> Result<(), StorageError> {
        self.db.execute(
            &format!(
                "INSERT INTO {SETTINGS} ({KEY}, {VALUE}, {MEDIA_TYPE}) VALUES (?1, ?2, ?3)
             ON CONFLICT({KEY}) DO UPDATE SET {VALUE} = excluded.{VALUE}, {MEDIA_TYPE} = excluded.{MEDIA_TYPE}"
            ),
            params![BACKGROUND_KEY, image.bytes(), image.media_type()],
        )?;
        Ok(())
    }

    pub fn delete_background(&mut self) -> Result<(), StorageError> {
        self.db.execute(
            &format!("DELETE FROM {SETTINGS} WHERE {KEY} = ?1"),
            params![BACKGROUND_KEY],
        )?;
        Ok(())
    }

    fn song_from_row(row: &rusqlite::Row<'_>) -> Result<SongRecord, rusqlite::Error> {
        let audio: Vec<u8> = row.get(2)?;
        let audio_type: String = row.get(3)?;
        let cover: Option<Vec<u8>> = row.get(5)?;
        let cover_type: Option<String> = row.get(6)?;

        Ok(SongRecord {
            id: SongId(row.get(0)?),
            name: row.get(1)?,
            playlist: row.get(4)?,
            audio: Arc::new(Payload::new(audio_type, audio)),
            cover: cover.map(|bytes| {
                Arc::new(Payload::new(
                    cover_type.unwrap_or_else(|| "application/octet-stream".to_string()),
                    bytes,
                ))
            }),
        })
    }

    fn expect_one(changed: usize, id: SongId) -> Result<(), StorageError> {
        if changed == 0 {
            Err(StorageError::SongNotFound(id))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use rusqlite::{Connection, params};

    use crate::{
        domain::{
            media::Payload,
            track::{NewSong, SongId},
        },
        storage::{
            error::StorageError,
            operations::Storage,
            schema::{self, *},
        },
    };

    fn setup_storage() -> anyhow::Result<Storage> {
        let conn = Connection::open_in_memory()?;
        schema::init(&conn)?;
        Ok(Storage::from_existing_conn(conn))
    }

    fn mp3(bytes: &[u8]) -> Payload {
        Payload::new("audio/mpeg", bytes.to_vec())
    }

    fn song<'a>(name: &'a str, playlist: &'a str, audio: &'a Payload) -> NewSong<'a> {
        NewSong {
            name,
            playlist,
            audio,
            cover: None,
        }
    }

    #[test]
    fn test_insert_assigns_increasing_ids() -> anyhow::Result<()> {
        let mut storage = setup_storage()?;
        let audio = mp3(b"a");

        let first = storage.insert_song(song("a", "All Tracks", &audio))?;
        let second = storage.insert_song(song("b", "All Tracks", &audio))?;

        assert!(second > first);
        Ok(())
    }

    #[test]
    fn test_round_trip_preserves_fields_and_bytes() -> anyhow::Result<()> {
        let mut storage = setup_storage()?;
        let audio = mp3(&[0, 255, 1, 254, 7]);
        let cover = Payload::new("image/png", vec![137, 80, 78, 71]);

        let id = storage.insert_song(NewSong {
            name: "Intro",
            playlist: "Rock",
            audio: &audio,
            cover: Some(&cover),
        })?;

        let songs = storage.load_songs()?;
        assert_eq!(songs.len(), 1);
        let record = &songs[0];
        assert_eq!(record.id, id);
        assert_eq!(record.name, "Intro");
        assert_eq!(record.playlist, "Rock");
        assert_eq!(record.audio.digest(), audio.digest());
        assert_eq!(record.audio.media_type(), "audio/mpeg");
        assert_eq!(record.cover.as_deref(), Some(&cover));

        Ok(())
    }

    #[test]
    fn test_rename_and_cover_update_single_row() -> anyhow::Result<()> {
        let mut storage = setup_storage()?;
        let audio = mp3(b"x");
        let id = storage.insert_song(song("old", "All Tracks", &audio))?;
        let other = storage.insert_song(song("other", "All Tracks", &audio))?;

        storage.rename_song(id, "new")?;
        storage.set_song_cover(id, &Payload::new("image/jpeg", vec![1]))?;

        let record = storage.load_song(id)?;
        assert_eq!(record.name, "new");
        assert_eq!(record.cover.unwrap().media_type(), "image/jpeg");
        assert_eq!(storage.load_song(other)?.name, "other");

        Ok(())
    }

    #[test]
    fn test_update_missing_song_fails() -> anyhow::Result<()> {
        let mut storage = setup_storage()?;

        let err = storage.rename_song(SongId(42), "x").unwrap_err();
        assert!(matches!(err, StorageError::SongNotFound(SongId(42))));

        let err = storage.load_song(SongId(42)).unwrap_err();
        assert!(matches!(err, StorageError::SongNotFound(_)));
        Ok(())
    }

    #[test]
    fn test_set_songs_playlist_is_all_or_nothing() -> anyhow::Result<()> {
        let mut storage = setup_storage()?;
        let audio = mp3(b"x");
        let a = storage.insert_song(song("a", "Rock", &audio))?;
        let b = storage.insert_song(song("b", "Rock", &audio))?;

        storage.set_songs_playlist(&[a, b], "Metal")?;
        assert_eq!(storage.load_song(a)?.playlist, "Metal");
        assert_eq!(storage.load_song(b)?.playlist, "Metal");

        // one missing id rolls back the whole batch
        let err = storage.set_songs_playlist(&[a, SongId(999)], "Jazz").unwrap_err();
        assert!(matches!(err, StorageError::SongNotFound(_)));
        assert_eq!(storage.load_song(a)?.playlist, "Metal");

        Ok(())
    }

    #[test]
    fn test_delete_songs() -> anyhow::Result<()> {
        let mut storage = setup_storage()?;
        let audio = mp3(b"x");
        let a = storage.insert_song(song("a", "Rock", &audio))?;
        let b = storage.insert_song(song("b", "Rock", &audio))?;
        let c = storage.insert_song(song("c", "All Tracks", &audio))?;

        storage.delete_song(a)?;
        // deleting twice is fine
        storage.delete_song(a)?;
        assert_eq!(storage.delete_songs(&[b, SongId(1000)])?, 1);

        let remaining: Vec<_> = storage.load_songs()?.into_iter().map(|s| s.id).collect();
        assert_eq!(remaining, vec![c]);
        Ok(())
    }

    #[test]
    fn test_background_slot() -> anyhow::Result<()> {
        let mut storage = setup_storage()?;
        assert!(storage.background()?.is_none());

        storage.put_background(&Payload::new("image/png", vec![1, 2]))?;
        storage.put_background(&Payload::new("image/jpeg", vec![3]))?;

        let background = storage.background()?.unwrap();
        assert_eq!(background.media_type(), "image/jpeg");
        assert_eq!(background.bytes(), &[3]);

        let rows: i64 = storage.db.query_row(
            &format!("SELECT COUNT(*) FROM {SETTINGS} WHERE {KEY} = ?1"),
            params![BACKGROUND_KEY],
            |row| row.get(0),
        )?;
        assert_eq!(rows, 1);

        storage.delete_background()?;
        assert!(storage.background()?.is_none());
        Ok(())
    }

    #[test]
    fn test_missing_cover_type_defaults() -> anyhow::Result<()> {
        let storage = setup_storage()?;
        storage.db.execute(
            &format!(
                "INSERT INTO {SONGS} ({NAME}, {AUDIO}, {AUDIO_TYPE}, {PLAYLIST}, {COVER})
             VALUES ('a', x'00', 'audio/mpeg', 'All Tracks', x'01')"
            ),
            [],
        )?;
        let mut storage = storage;

        let songs = storage.load_songs()?;
        assert_eq!(
            songs[0].cover.as_ref().unwrap().media_type(),
            "application/octet-stream"
        );
        Ok(())
    }
}
