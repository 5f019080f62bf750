//! Playback position arithmetic: which track comes next, where "current" goes
//! when the playlist changes under it, and the volume/seek mappings

use rand::Rng;

use crate::domain::track::SongId;

/// Where playback stands within the active playlist
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    /// index into the active playlist
    pub current: Option<usize>,
    /// track whose handle the transport holds
    pub loaded: Option<SongId>,
    pub shuffle: bool,
    pub repeat: bool,
    /// linear volume, 0..=1
    pub volume: f64,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            current: None,
            loaded: None,
            shuffle: false,
            repeat: false,
            volume: 1.0,
        }
    }
}

/// What a removal did to "current"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterRemoval {
    /// the current track itself was removed
    Cleared,
    /// an earlier track was removed, current moved down by one
    Shifted,
    Unchanged,
}

impl PlaybackState {
    /// Keeps `current` on the same track after the entry at `removed` went away
    pub fn after_removal(&mut self, removed: usize) -> AfterRemoval {
        match self.current {
            Some(current) if current == removed => {
                self.current = None;
                AfterRemoval::Cleared
            }
            Some(current) if removed < current => {
                self.current = Some(current - 1);
                AfterRemoval::Shifted
            }
            _ => AfterRemoval::Unchanged,
        }
    }

    /// Keeps `current` on the same track after the entry at `from` moved to `to`
    pub fn after_reorder(&mut self, from: usize, to: usize) {
        let Some(current) = self.current else {
            return;
        };
        self.current = Some(if current == from {
            to
        } else if from < current && current <= to {
            current - 1
        } else if to <= current && current < from {
            current + 1
        } else {
            current
        });
    }
}

/// Index after `current` in a playlist of `len` tracks.
///
/// Shuffle picks any index uniformly, the current one included.
/// Without a current track playback starts from the top.
pub fn next_index<R: Rng + ?Sized>(
    current: Option<usize>,
    len: usize,
    shuffle: bool,
    rng: &mut R,
) -> Option<usize> {
    if len == 0 {
        return None;
    }
    if shuffle {
        return Some(rng.gen_range(0..len));
    }
    Some(match current {
        Some(i) => (i + 1) % len,
        None => 0,
    })
}

/// Index before `current`, wrapping from the first track to the last
pub fn previous_index(current: Option<usize>, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(match current {
        Some(0) | None => len - 1,
        Some(i) => (i - 1).min(len - 1),
    })
}

/// Slider position (0..=100) to linear volume; the square follows perceived loudness
pub fn slider_to_volume(slider: f64) -> f64 {
    let fraction = slider.clamp(0.0, 100.0) / 100.0;
    fraction * fraction
}

pub fn volume_to_slider(volume: f64) -> f64 {
    volume.clamp(0.0, 1.0).sqrt() * 100.0
}

/// Position in seconds for a seek bar value (0..=100)
pub fn seek_position(percent: f64, duration: f64) -> f64 {
    percent.clamp(0.0, 100.0) / 100.0 * duration
}

/// Seek bar value for a position, 0 while the duration is unknown
pub fn progress(position: f64, duration: Option<f64>) -> f64 {
    match duration {
        Some(d) if d > 0.0 && d.is_finite() => (position / d * 100.0).clamp(0.0, 100.0),
        _ => 0.0,
    }
}

/// `m:ss`
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}
