use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(name = "kiosk-slideshow")]
#[command(author, version, about = "Unattended photo slideshow with background music")]
pub struct Cli {
    /// Directory of images to cycle through
    pub image_dir: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory of music files (enables background audio)
    #[arg(long)]
    pub music_dir: Option<PathBuf>,

    /// Image shown while no photos are available
    #[arg(long)]
    pub error_image: Option<PathBuf>,

    /// Seconds each image stays on screen
    #[arg(long)]
    pub display_time: Option<f32>,

    /// Crossfade duration in seconds
    #[arg(long)]
    pub fade_time: Option<f32>,

    /// Target frame rate
    #[arg(long)]
    pub fps: Option<u32>,

    /// Run in a window instead of fullscreen
    #[arg(long)]
    pub windowed: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    pub fn log_directive(&self) -> &'static str {
        if self.quiet {
            return "warn";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
