//! The audio engine seen as a capability
//!
//! The player never decodes audio. It tells a [`Transport`] which url to load and
//! when to play, pause or seek, and gets `ended`, `timeupdate` and
//! `loadedmetadata` back as calls on the player.

use thiserror::Error;

/// The engine refused to start playback (autoplay policies do this)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("playback rejected: {0}")]
pub struct TransportRejection(pub String);

pub trait Transport: Send {
    fn load(&mut self, url: &str);

    /// Drops the current source, leaving the transport stopped
    fn unload(&mut self);

    fn play(&mut self) -> Result<(), TransportRejection>;

    fn pause(&mut self);

    fn seek(&mut self, position: f64);

    fn set_volume(&mut self, volume: f64);

    fn is_paused(&self) -> bool;

    /// seconds
    fn position(&self) -> f64;

    /// seconds, known once metadata loaded
    fn duration(&self) -> Option<f64>;

    /// `timeupdate` from the engine
    fn observe_position(&mut self, _position: f64) {}

    /// `loadedmetadata` from the engine
    fn observe_duration(&mut self, _duration: f64) {}
}

/// Mirror of an audio element living elsewhere (the browser page).
///
/// It keeps the last state the player asked for and the last state the
/// element reported, which is all the player needs to drive navigation.
#[derive(Debug, Clone)]
pub struct MirrorTransport {
    source: Option<String>,
    paused: bool,
    position: f64,
    duration: Option<f64>,
    volume: f64,
}

impl Default for MirrorTransport {
    fn default() -> Self {
        Self {
            source: None,
            paused: true,
            position: 0.0,
            duration: None,
            volume: 1.0,
        }
    }
}

#[cfg(test)]
impl MirrorTransport {
    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }
}

impl Transport for MirrorTransport {
    fn load(&mut self, url: &str) {
        self.source = Some(url.to_string());
        self.paused = true;
        self.position = 0.0;
        self.duration = None;
    }

    fn unload(&mut self) {
        self.source = None;
        self.paused = true;
        self.position = 0.0;
        self.duration = None;
    }

    fn play(&mut self) -> Result<(), TransportRejection> {
        if self.source.is_none() {
            return Err(TransportRejection("no source loaded".to_string()));
        }
        self.paused = false;
        Ok(())
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn seek(&mut self, position: f64) {
        self.position = match self.duration {
            Some(d) => position.clamp(0.0, d),
            None => position.max(0.0),
        };
    }

    fn set_volume(&mut self, volume: f64) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn position(&self) -> f64 {
        self.position
    }

    fn duration(&self) -> Option<f64> {
        self.duration
    }

    fn observe_position(&mut self, position: f64) {
        if position.is_finite() {
            self.position = position.max(0.0);
        }
    }

    fn observe_duration(&mut self, duration: f64) {
        if duration.is_finite() && duration > 0.0 {
            self.duration = Some(duration);
        }
    }
}
