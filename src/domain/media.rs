//! Uploaded media: raw bytes plus the media type they were declared or guessed as

use std::path::Path;

use super::hash::PayloadDigest;

/// Binary payload of a track, a cover or the background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    media_type: String,
    bytes: Vec<u8>,
}

impl Payload {
    pub fn new(media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            media_type: media_type.into(),
            bytes,
        }
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn digest(&self) -> PayloadDigest {
        PayloadDigest::from_bytes(&self.bytes)
    }

    pub fn is_audio(&self) -> bool {
        self.media_type.starts_with("audio/")
    }

    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }
}

/// A file handed to the player, from a file picker, a drop or the command line.
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub file_name: String,
    pub payload: Payload,
}

impl MediaFile {
    pub fn new(file_name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            payload: Payload::new(media_type, bytes),
        }
    }

    /// Reads a file from disk, guessing its media type from the extension.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Ok(Self::new(file_name, media_type_for(path), bytes))
    }

    /// Display name of the track this file becomes
    pub fn track_name(&self) -> String {
        track_name(&self.file_name)
    }
}

/// File name without its last extension.
///
/// Keeps the whole file name when stripping would leave nothing (".mp3").
pub fn track_name(file_name: &str) -> String {
    match file_name.rfind('.') {
        Some(dot) if dot > 0 && !file_name[dot + 1..].is_empty() && !file_name[dot..].contains('/') => {
            file_name[..dot].to_string()
        }
        _ => file_name.to_string(),
    }
}

/// Media type for a path, preferring types browsers play back reliably.
pub fn media_type_for(path: &Path) -> String {
    let ext = path
        .extension()
        .map(|ext| ext.to_string_lossy())
        .map(|s| s.to_lowercase());
    let default = || {
        mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string()
    };
    ext.and_then(|ext| media_type_from_ext(ext.as_str()))
        .unwrap_or_else(default)
}

/// Map file extension (without dot) to the MIME type used for playback.
/// Returns None if the extension is not one of ours.
pub fn media_type_from_ext(ext: &str) -> Option<String> {
    match ext {
        "m4a" => Some("audio/x-m4a".to_string()), // Safari iOS compatible
        "aac" => Some("audio/aac".to_string()),
        "mp3" => Some("audio/mpeg".to_string()),
        "wav" => Some("audio/wav".to_string()),
        "ogg" => Some("audio/ogg".to_string()),
        "flac" => Some("audio/flac".to_string()),
        _ => None,
    }
}
