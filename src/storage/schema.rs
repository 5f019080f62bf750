use rusqlite::Connection;

pub mod tables {
    pub const SONGS: &str = "songs";
    pub const SETTINGS: &str = "settings";

    pub const ALL_TABLES: &[&str] = &[SONGS, SETTINGS];
}

pub mod columns {
    pub const ID: &str = "id";
    pub const NAME: &str = "name";
    pub const AUDIO: &str = "audio";
    pub const AUDIO_TYPE: &str = "audio_type";
    pub const PLAYLIST: &str = "playlist";
    pub const COVER: &str = "cover";
    pub const COVER_TYPE: &str = "cover_type";

    pub const KEY: &str = "key";
    pub const VALUE: &str = "value";
    pub const MEDIA_TYPE: &str = "media_type";
}

/// key of the background image in the settings table
pub const BACKGROUND_KEY: &str = "background";

pub use columns::*;
pub use tables::*;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS songs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    audio BLOB NOT NULL,
    audio_type TEXT NOT NULL,
    playlist TEXT NOT NULL,
    cover BLOB,
    cover_type TEXT
);

CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value BLOB NOT NULL,
    media_type TEXT NOT NULL
);
"#;

pub fn init(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA)
}
