//! Small scalar settings, kept as one json document
//!
//! `playlist_structure`, `currentTrackIndex` and `activePlaylistName` keep
//! the names earlier versions of the player wrote. Accent color and volume
//! were stored under other keys there and start from defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::storage::error::StorageError;

pub const DEFAULT_ACCENT_COLOR: &str = "rgb(180, 180, 180)";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    /// playlist names, the default playlist excluded
    #[serde(default)]
    pub playlist_structure: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accent_color: Option<String>,
    /// linear volume, 0..=1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    #[serde(
        rename = "currentTrackIndex",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub current_track_index: Option<i64>,
    #[serde(
        rename = "activePlaylistName",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub active_playlist_name: Option<String>,
}

/// Preference document plus where it lives
#[derive(Debug, Default)]
pub struct PreferenceStore {
    path: Option<PathBuf>,
    pub values: Preferences,
}

impl PreferenceStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Loads the document at `path`. A missing file means defaults.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let values = match std::fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Preferences::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path: Some(path.to_path_buf()),
            values,
        })
    }

    /// Opens `path` if given; an unreadable document is logged and replaced by defaults
    pub fn open_or_default(path: Option<&Path>) -> Self {
        match path {
            None => Self::in_memory(),
            Some(path) => Self::open(path).unwrap_or_else(|e| {
                log::warn!(
                    "ignoring unreadable preferences {}: {e}",
                    path.to_string_lossy()
                );
                Self {
                    path: Some(path.to_path_buf()),
                    values: Preferences::default(),
                }
            }),
        }
    }

    pub fn is_persistent(&self) -> bool {
        self.path.is_some()
    }

    /// Writes the whole document, through a temp file so a crash never leaves half of it
    pub fn save(&self) -> Result<(), StorageError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(&self.values)?)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Applies `change` and saves. Preferences are hints, so a failed save is only logged.
    pub fn update(&mut self, change: impl FnOnce(&mut Preferences)) {
        change(&mut self.values);
        if let Err(e) = self.save() {
            log::error!("failed to save preferences: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_means_defaults() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let store = PreferenceStore::open(&dir.path().join("prefs.json"))?;
        assert_eq!(store.values, Preferences::default());
        assert!(store.is_persistent());
        Ok(())
    }

    #[test]
    fn update_persists_with_legacy_key_names() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("prefs.json");
        let mut store = PreferenceStore::open(&path)?;

        store.update(|p| {
            p.playlist_structure = vec!["Rock".into(), "Jazz".into()];
            p.volume = Some(0.25);
            p.current_track_index = Some(3);
            p.active_playlist_name = Some("Rock".into());
        });

        let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        assert_eq!(raw["currentTrackIndex"], 3);
        assert_eq!(raw["activePlaylistName"], "Rock");
        assert_eq!(raw["playlist_structure"][1], "Jazz");
        assert!(raw.get("accent_color").is_none());

        let reopened = PreferenceStore::open(&path)?;
        assert_eq!(reopened.values, store.values);
        Ok(())
    }

    #[test]
    fn earlier_session_keys_are_read() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("prefs.json");
        std::fs::write(
            &path,
            r#"{"playlist_structure":["Rock"],"currentTrackIndex":2,
                "activePlaylistName":"Rock","grig_accent_color":"red","grig_volume":0.5}"#,
        )?;

        let store = PreferenceStore::open(&path)?;
        assert_eq!(store.values.playlist_structure, ["Rock"]);
        assert_eq!(store.values.current_track_index, Some(2));
        assert_eq!(store.values.active_playlist_name.as_deref(), Some("Rock"));
        assert_eq!(store.values.accent_color, None);
        assert_eq!(store.values.volume, None);
        Ok(())
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "{ not json")?;

        assert!(matches!(
            PreferenceStore::open(&path).unwrap_err(),
            StorageError::Preferences(_)
        ));

        let store = PreferenceStore::open_or_default(Some(&path));
        assert_eq!(store.values, Preferences::default());
        assert!(store.is_persistent());
        Ok(())
    }

    #[test]
    fn in_memory_save_is_a_no_op() {
        let mut store = PreferenceStore::in_memory();
        store.update(|p| p.accent_color = Some("red".into()));
        assert_eq!(store.values.accent_color.as_deref(), Some("red"));
        assert!(!store.is_persistent());
    }
}
