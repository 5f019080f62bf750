use crate::cli::run;

pub mod cli;
pub mod config;
pub mod domain;
pub mod handles;
pub mod http;
pub mod library;
pub mod playback;
pub mod player;
pub mod session;
pub mod storage;
pub mod transport;
pub mod view;

fn main() -> anyhow::Result<()> {
    run()
}
