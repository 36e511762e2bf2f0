use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod cli;
mod clock;
mod config;
mod constants;
mod error;
mod lister;
mod playback;
mod playlist;
mod presenter;
mod raylib_renderer;
mod renderer;
mod signals;
mod texture_loader;

use crate::cli::Cli;
use crate::clock::{Clock, MonotonicClock};
use crate::config::Config;
use crate::lister::{DirLister, Lister};
use crate::playback::{CommandHost, PlaybackController};
use crate::presenter::Presenter;
use crate::raylib_renderer::RaylibRenderer;
use crate::renderer::Renderer;
use crate::signals::{Control, ControlSignals};

/// Background music plus the directory it is listed from.
struct Music {
    controller: PlaybackController<CommandHost>,
    dir: PathBuf,
    extensions: Vec<String>,
    interval: Duration,
    last_scan: Instant,
}

impl Music {
    fn start(config: &Config, now: Instant) -> Result<Option<Self>> {
        let Some(dir) = config.music.dir.clone() else {
            info!("No music directory configured, audio disabled");
            return Ok(None);
        };
        let host = CommandHost::new(&config.music.decoder)?;
        let mut music = Self {
            controller: PlaybackController::new(config.music.clone(), host),
            dir,
            extensions: config.music.extensions.clone(),
            interval: config.slideshow.scan_time(),
            last_scan: now,
        };
        music.rescan(now);
        music.controller.play_next();
        Ok(Some(music))
    }

    fn rescan(&mut self, now: Instant) {
        let tracks = DirLister.list(&self.dir, &self.extensions);
        info!("Found {} music tracks in {}", tracks.len(), self.dir.display());
        self.controller.load_playlist(tracks);
        self.last_scan = now;
    }

    fn tick(&mut self, now: Instant) {
        self.controller.poll(now);
        if self.controller.take_rescan_request() || now.duration_since(self.last_scan) >= self.interval {
            self.rescan(now);
        }
    }

    fn toggle(&mut self) {
        if self.controller.is_playing() {
            self.controller.stop();
        } else {
            self.controller.play_next();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_directive())),
        )
        .init();

    let config = Config::from_cli(&cli).context("Failed to load configuration")?;
    info!(
        "Showing {} every {}s (fade {}s)",
        config.slideshow.image_dir.display(),
        config.slideshow.display_duration,
        config.slideshow.fade_duration
    );

    let signals = ControlSignals::install().context("Failed to install signal handlers")?;
    let renderer = RaylibRenderer::open(&config.display).context("Failed to open the display")?;

    let clock = MonotonicClock;
    let mut presenter = Presenter::new(
        config.slideshow.clone(),
        config.display.fps,
        renderer,
        DirLister,
        clock.now(),
    );
    presenter.start(clock.now());

    let mut music = Music::start(&config, clock.now()).context("Failed to set up music playback")?;

    'frames: loop {
        let now = clock.now();

        for control in signals.drain() {
            match control {
                Control::Terminate => break 'frames,
                Control::Rescan => {
                    presenter.rescan(now);
                    if let Some(music) = music.as_mut() {
                        music.rescan(now);
                    }
                }
                Control::TogglePause => match music.as_mut() {
                    Some(music) => music.controller.toggle_pause(),
                    None => warn!("Pause requested but audio is disabled"),
                },
                Control::ToggleMusic => match music.as_mut() {
                    Some(music) => music.toggle(),
                    None => warn!("Music toggle requested but audio is disabled"),
                },
            }
        }
        if presenter.renderer().should_close() {
            break;
        }

        presenter.tick(now);
        if let Some(music) = music.as_mut() {
            music.tick(now);
        }
    }

    info!("Shutting down");
    if let Some(mut music) = music {
        music.controller.close();
    }
    drop(presenter);
    Ok(())
}
