use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::Config;
use crate::domain::media::MediaFile;
use crate::handles::HandleRegistry;
use crate::library::DEFAULT_PLAYLIST;
use crate::player::Player;
use crate::transport::MirrorTransport;
use crate::view::LibraryView;
use crate::{http, session};

#[derive(Parser)]
#[command(name = "playdeck")]
#[command(version = "0.1")]
#[command(about = "Offline music player with a local library store")]
pub struct Cli {
    /// Path to the config TOML file; everything stays in memory without one
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show library status
    Status,
    /// List tracks of a playlist
    List {
        /// Playlist to list, the default one if omitted
        #[arg(short, long)]
        playlist: Option<String>,
        /// Only tracks whose name contains this
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Add audio files; directories are scanned recursively
    Add {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        #[arg(short, long, default_value = DEFAULT_PLAYLIST)]
        playlist: String,
    },
    /// Manage playlists
    Playlist {
        #[command(subcommand)]
        action: PlaylistAction,
    },
    /// Manage the background image
    Background {
        #[command(subcommand)]
        action: BackgroundAction,
    },
    /// Run http server hosting the player
    Serve,
}

#[derive(Subcommand)]
pub enum PlaylistAction {
    Create { name: String },
    Rename { from: String, to: String },
    Delete { name: String },
}

#[derive(Subcommand)]
pub enum BackgroundAction {
    Set { path: PathBuf },
    Reset,
}

/// Entrypoint for CLI
pub fn run() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let cfg = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::ephemeral(),
    };

    let handles = HandleRegistry::default();
    let mut player = Player::open(&cfg, Box::new(MirrorTransport::default()), handles.clone());
    if !player.is_persistent() {
        println!("Warning: the library store is unavailable, changes will not be saved");
    }

    match cli.command {
        Commands::Status => print_status(&player),

        Commands::List { playlist, search } => {
            let view = list(&player, playlist.as_deref(), search.as_deref())?;
            println!("{} ({} tracks):", view.active_playlist, view.tracks.len());
            for track in &view.tracks {
                let cover = if track.cover_url.is_some() { " [cover]" } else { "" };
                println!("  {:>3}. {}{cover}", track.index, track.name);
            }
        }

        Commands::Add { paths, playlist } => {
            let files = collect_audio_files(&paths)?;
            if files.is_empty() {
                bail!("no audio files found");
            }
            let total = files.len();
            let added = player.add_tracks(files, &playlist)?;
            println!("Added {added} of {total} files to '{playlist}'");
        }

        Commands::Playlist { action } => match action {
            PlaylistAction::Create { name } => {
                let name = player.create_playlist(&name)?;
                println!("Created playlist '{name}'");
            }
            PlaylistAction::Rename { from, to } => {
                let to = player.rename_playlist(&from, &to)?;
                println!("Renamed playlist '{from}' to '{to}'");
            }
            PlaylistAction::Delete { name } => {
                player.delete_playlist(&name)?;
                println!("Deleted playlist '{name}'");
            }
        },

        Commands::Background { action } => match action {
            BackgroundAction::Set { path } => {
                let image = MediaFile::from_path(&path)
                    .with_context(|| format!("Failed to read {}", path.to_string_lossy()))?;
                player.set_background(image)?;
                println!("Background set");
            }
            BackgroundAction::Reset => {
                player.reset_background()?;
                println!("Background reset");
            }
        },

        Commands::Serve => {
            println!("Starting HTTP server...");
            let (session, _worker) = session::spawn(player);
            let http_server = http::server::HttpServer::new(session, handles, cfg.http);
            println!(
                "HTTP server running at http://{}:{}",
                http_server.config.bind_addr, http_server.config.port
            );
            http_server.run();
        }
    }
    Ok(())
}

/// Read-only: the saved session is left as it was
fn list(
    player: &Player,
    playlist: Option<&str>,
    search: Option<&str>,
) -> anyhow::Result<LibraryView> {
    Ok(match playlist {
        Some(playlist) => LibraryView::render_playlist(player, playlist, search)?,
        None => LibraryView::render(player, search),
    })
}

fn print_status(player: &Player) {
    let library = player.library();
    println!(
        "Library contains {} tracks in {} playlists",
        library.track_count(),
        library.playlists().len()
    );
    for playlist in library.playlists() {
        let marker = if playlist.name() == library.active_name() { "*" } else { " " };
        if playlist.is_empty() {
            println!("  {marker} {} (empty)", playlist.name());
        } else {
            println!("  {marker} {} ({})", playlist.name(), playlist.len());
        }
    }
    if let Some(current) = player.playback().current {
        if let Ok(track) = library.track(library.active_name(), current) {
            println!("Last played: {}", track.name);
        }
    }
    println!("Accent color: {}", player.accent_color());
    println!(
        "Background: {}",
        if player.background().is_some() { "custom" } else { "none" }
    );
}

/// Files named directly are taken as given; directories contribute the audio files inside them
fn collect_audio_files(paths: &[PathBuf]) -> anyhow::Result<Vec<MediaFile>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            for path in scan_dir(path) {
                files.push(read_file(&path)?);
            }
        } else {
            files.push(read_file(path)?);
        }
    }
    Ok(files)
}

fn scan_dir(root: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| match e {
            Ok(e) => Some(e),
            Err(err) => {
                log::warn!("error while scanning {}, skipping an entry: {err}", root.to_string_lossy());
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().to_path_buf())
        .filter(|p| crate::domain::media::media_type_for(p).starts_with("audio/"))
        .collect();
    paths.sort();
    paths
}

fn read_file(path: &Path) -> anyhow::Result<MediaFile> {
    MediaFile::from_path(path).with_context(|| format!("Failed to read {}", path.to_string_lossy()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn scan_dir_keeps_audio_files_only() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        fs::create_dir(dir.path().join("album"))?;
        fs::write(dir.path().join("album/b.flac"), b"b")?;
        fs::write(dir.path().join("a.mp3"), b"a")?;
        fs::write(dir.path().join("cover.jpg"), b"c")?;

        let files = collect_audio_files(&[dir.path().to_path_buf()])?;
        let names: Vec<&str> = files.iter().map(|f| f.file_name.as_str()).collect();

        assert_eq!(names, ["a.mp3", "b.flac"]);
        assert_eq!(files[1].payload.media_type(), "audio/flac");
        Ok(())
    }

    #[test]
    fn named_files_are_taken_as_given() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("cover.jpg");
        fs::write(&path, b"c")?;

        let files = collect_audio_files(&[path])?;
        assert_eq!(files.len(), 1);
        assert!(files[0].payload.is_image());

        assert!(collect_audio_files(&[dir.path().join("missing.mp3")]).is_err());
        Ok(())
    }

    fn open_player(cfg: &Config) -> Player {
        Player::open(cfg, Box::new(MirrorTransport::default()), HandleRegistry::default())
    }

    #[test]
    fn listing_keeps_the_saved_session() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut cfg = Config::ephemeral();
        cfg.database = crate::config::Database {
            in_memory: false,
            path: Some(dir.path().join("library.db")),
        };
        cfg.preferences.path = Some(dir.path().join("prefs.json"));

        {
            let mut player = open_player(&cfg);
            player.create_playlist("Rock")?;
            for name in ["a", "b"] {
                let file = MediaFile::new(format!("{name}.mp3"), "audio/mpeg", vec![1]);
                player.add_track(file, DEFAULT_PLAYLIST)?;
            }
            player.play(1, false)?;
        }
        {
            let player = open_player(&cfg);
            let view = list(&player, Some(DEFAULT_PLAYLIST), None)?;
            assert_eq!(view.tracks.len(), 2);
            assert!(view.tracks[1].current);
            assert!(list(&player, Some("Rock"), Some("a"))?.tracks.is_empty());
            assert!(list(&player, Some("Jazz"), None).is_err());
        }

        let player = open_player(&cfg);
        assert_eq!(player.library().active_name(), DEFAULT_PLAYLIST);
        assert_eq!(player.playback().current, Some(1));
        Ok(())
    }

    #[test]
    fn cli_parses_nested_commands() {
        let cli = Cli::parse_from(["playdeck", "playlist", "rename", "Rock", "Metal"]);
        assert!(matches!(
            cli.command,
            Commands::Playlist {
                action: PlaylistAction::Rename { .. }
            }
        ));

        let cli = Cli::parse_from(["playdeck", "-c", "deck.toml", "add", "a.mp3", "b.mp3"]);
        assert_eq!(cli.config, Some(PathBuf::from("deck.toml")));
        match cli.command {
            Commands::Add { paths, playlist } => {
                assert_eq!(paths.len(), 2);
                assert_eq!(playlist, DEFAULT_PLAYLIST);
            }
            _ => panic!("expected add"),
        }
    }
}
