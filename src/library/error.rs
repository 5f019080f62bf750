use thiserror::Error;

/// Why a library operation was refused. Refused operations leave the library untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("color must not be empty")]
    EmptyColor,

    #[error("the default playlist cannot be changed")]
    DefaultPlaylist,

    #[error("playlist '{0}' already exists")]
    DuplicatePlaylist(String),

    #[error("playlist '{0}' does not exist")]
    UnknownPlaylist(String),

    #[error("playlist '{playlist}' has no track at index {index}")]
    IndexOutOfRange { playlist: String, index: usize },

    #[error("'{0}' is not an audio file")]
    NotAudio(String),

    #[error("'{0}' is not an image")]
    NotImage(String),
}
