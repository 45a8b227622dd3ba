use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Sender};
use std::thread;

use crate::artwork::AlbumArtCache;
use crate::config::Config;
use crate::http::server::AssetServer;
use crate::media::{MediaEvent, MediaSource};
use crate::presence::sink::DiscordSink;
use crate::presence::sync::{self, Synchronizer};

#[derive(Parser)]
#[command(name = "mediapresence")]
#[command(version = "0.1")]
#[command(about = "Mirrors the host's now-playing track into a rich-presence display")]
pub struct Cli {
    /// Path to the config TOML file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Watch the system media session and publish presence updates
    Run,
}

/// Entrypoint for CLI
pub fn run() {
    env_logger::init();
    let cli = Cli::parse();

    let cfg = if cli.config.exists() {
        Config::load(&cli.config).expect("failed to load config")
    } else {
        log::info!(
            "config {} not found; using defaults",
            cli.config.display()
        );
        Config::default()
    };

    match &cli.command {
        Commands::Run => {
            if let Err(e) = run_bridge(cfg) {
                log::error!("{e:#}");
                std::process::exit(1);
            }
        }
    }
}

fn run_bridge(cfg: Config) -> anyhow::Result<()> {
    let (events_tx, events_rx) = mpsc::channel();
    let mut source = build_source(events_tx)?;

    let cache = Arc::new(AlbumArtCache::new(Some(cfg.artwork.path.clone())));

    let server = AssetServer::new(Arc::clone(&cache), cfg.http.clone());
    thread::spawn(move || server.run());

    let sink = DiscordSink::new(&cfg.presence.client_id())?;
    let mut synchronizer = Synchronizer::new(sink, cache, cfg.presence.art_base_url.clone());

    log::info!("listening for media changes");
    sync::drive(&events_rx, source.as_mut(), &mut synchronizer);
    Ok(())
}

#[cfg(windows)]
fn build_source(events: Sender<MediaEvent>) -> anyhow::Result<Box<dyn MediaSource>> {
    Ok(Box::new(crate::media::gsmtc::GsmtcSource::new(events)?))
}

#[cfg(not(windows))]
fn build_source(_events: Sender<MediaEvent>) -> anyhow::Result<Box<dyn MediaSource>> {
    anyhow::bail!("no media session provider is available on this platform")
}
