//! Event queue owning the player
//!
//! Http threads never touch the player. They post an [`Event`] and block on the reply,
//! so every mutation runs to completion before the next one starts.

use std::{
    sync::mpsc::{self, Receiver, Sender},
    thread::{self, JoinHandle},
};

use serde::Deserialize;
use thiserror::Error;

use crate::{
    domain::media::MediaFile,
    player::{Player, error::PlayerError},
    view::LibraryView,
};

/// A UI action, as posted to `/commands`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    CreatePlaylist { name: String },
    RenamePlaylist { from: String, to: String },
    DeletePlaylist { name: String },
    SelectPlaylist { name: String },
    DeleteTrack { playlist: String, index: usize },
    RenameTrack { playlist: String, index: usize, name: String },
    MoveTrack { playlist: String, index: usize, to: String },
    Reorder { playlist: String, from: usize, to: usize },
    Play { index: usize },
    Toggle,
    Next,
    Previous,
    Seek { percent: f64 },
    Volume { slider: f64 },
    ToggleShuffle,
    ToggleRepeat,
    TrackEnded,
    TimeUpdate { position: f64 },
    LoadedMetadata { duration: f64 },
    AccentColor { color: String },
    ResetBackground,
}

#[derive(Debug, Clone)]
pub enum Event {
    Command(Command),
    Upload { playlist: String, files: Vec<MediaFile> },
    Cover { playlist: String, index: usize, image: MediaFile },
    Background(MediaFile),
    /// no change, just the current view
    View { query: Option<String> },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Player(#[from] PlayerError),

    #[error("the player session has stopped")]
    Closed,
}

struct Envelope {
    event: Event,
    reply: Sender<Result<LibraryView, PlayerError>>,
}

/// Cloneable sender side of the session, one per http worker
#[derive(Clone)]
pub struct SessionHandle {
    events: Sender<Envelope>,
}

impl SessionHandle {
    /// Posts `event` and waits until the player has applied it
    pub fn send(&self, event: Event) -> Result<LibraryView, SessionError> {
        let (reply, response) = mpsc::channel();
        self.events
            .send(Envelope { event, reply })
            .map_err(|_| SessionError::Closed)?;
        let view = response.recv().map_err(|_| SessionError::Closed)?;
        Ok(view?)
    }

    pub fn command(&self, command: Command) -> Result<LibraryView, SessionError> {
        self.send(Event::Command(command))
    }
}

/// Moves `player` onto its own thread. The thread ends once every handle is dropped.
pub fn spawn(player: Player) -> (SessionHandle, JoinHandle<Player>) {
    let (events, inbox) = mpsc::channel();
    let worker = thread::spawn(move || run(player, inbox));
    (SessionHandle { events }, worker)
}

fn run(mut player: Player, inbox: Receiver<Envelope>) -> Player {
    log::info!("player session started");
    for Envelope { event, reply } in inbox {
        let result = apply(&mut player, event);
        if reply.send(result).is_err() {
            log::debug!("caller went away before the reply");
        }
    }
    log::info!("player session stopped");
    player
}

/// Applies one event and renders the player afterwards
pub fn apply(player: &mut Player, event: Event) -> Result<LibraryView, PlayerError> {
    let mut query = None;
    match event {
        Event::Command(command) => execute(player, command)?,
        Event::Upload { playlist, files } => {
            let total = files.len();
            let added = player.add_tracks(files, &playlist)?;
            log::info!("uploaded {added} of {total} files to '{playlist}'");
        }
        Event::Cover {
            playlist,
            index,
            image,
        } => player.set_cover(&playlist, index, image)?,
        Event::Background(image) => player.set_background(image)?,
        Event::View { query: q } => query = q,
    }
    Ok(LibraryView::render(player, query.as_deref()))
}

fn execute(player: &mut Player, command: Command) -> Result<(), PlayerError> {
    match command {
        Command::CreatePlaylist { name } => {
            player.create_playlist(&name)?;
        }
        Command::RenamePlaylist { from, to } => {
            player.rename_playlist(&from, &to)?;
        }
        Command::DeletePlaylist { name } => player.delete_playlist(&name)?,
        Command::SelectPlaylist { name } => player.select_playlist(&name)?,
        Command::DeleteTrack { playlist, index } => player.delete_track(&playlist, index)?,
        Command::RenameTrack {
            playlist,
            index,
            name,
        } => player.rename_track(&playlist, index, &name)?,
        Command::MoveTrack {
            playlist,
            index,
            to,
        } => {
            player.move_track(&playlist, index, &to)?;
        }
        Command::Reorder { playlist, from, to } => player.reorder(&playlist, from, to),
        Command::Play { index } => player.play(index, true)?,
        Command::Toggle => player.toggle(),
        Command::Next => {
            player.next();
        }
        Command::Previous => {
            player.previous();
        }
        Command::Seek { percent } => player.seek(percent),
        Command::Volume { slider } => player.set_volume(slider),
        Command::ToggleShuffle => {
            player.toggle_shuffle();
        }
        Command::ToggleRepeat => {
            player.toggle_repeat();
        }
        Command::TrackEnded => player.on_track_ended(),
        Command::TimeUpdate { position } => player.on_time_update(position),
        Command::LoadedMetadata { duration } => player.on_loaded_metadata(duration),
        Command::AccentColor { color } => player.set_accent_color(&color)?,
        Command::ResetBackground => player.reset_background()?,
    }
    Ok(())
}
