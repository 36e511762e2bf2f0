use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::Cli;
use crate::constants::*;
use crate::error::{KioskError, KioskResult};

/// Runtime settings. Every field can be left out of the TOML file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub display: DisplayConfig,
    pub slideshow: SlideshowConfig,
    pub music: MusicConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub width: i32,
    pub height: i32,
    pub fullscreen: bool,
    pub fps: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: RENDER_WIDTH,
            height: RENDER_HEIGHT,
            fullscreen: true,
            fps: FPS,
        }
    }
}

/// Timings are in seconds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SlideshowConfig {
    pub image_dir: PathBuf,
    pub error_image: PathBuf,
    pub extensions: Vec<String>,
    pub display_duration: f32,
    pub fade_duration: f32,
    pub error_fade_duration: f32,
    pub scan_interval: f32,
    pub error_scan_interval: f32,
    pub error_dim_delay: f32,
    pub load_failure_threshold: u32,
    pub load_retry_delay: f32,
}

impl Default for SlideshowConfig {
    fn default() -> Self {
        Self {
            image_dir: PathBuf::from(IMAGE_DIR),
            error_image: PathBuf::from(ERROR_IMAGE),
            extensions: IMAGE_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            display_duration: DISPLAY_DURATION,
            fade_duration: FADE_DURATION,
            error_fade_duration: ERROR_FADE_DURATION,
            scan_interval: SCAN_INTERVAL,
            error_scan_interval: ERROR_SCAN_INTERVAL,
            error_dim_delay: ERROR_DIM_DELAY,
            load_failure_threshold: LOAD_FAILURE_THRESHOLD,
            load_retry_delay: LOAD_RETRY_DELAY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MusicConfig {
    /// Audio is off while unset.
    pub dir: Option<PathBuf>,
    pub extensions: Vec<String>,
    /// Program and arguments of the remote-controlled decoder.
    pub decoder: Vec<String>,
    pub crash_threshold: u32,
    pub crash_cooldown: f32,
    pub ready_timeout: f32,
    pub close_timeout: f32,
}

impl Default for MusicConfig {
    fn default() -> Self {
        Self {
            dir: None,
            extensions: MUSIC_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            decoder: DECODER_COMMAND.iter().map(|s| s.to_string()).collect(),
            crash_threshold: DECODER_CRASH_THRESHOLD,
            crash_cooldown: DECODER_CRASH_COOLDOWN,
            ready_timeout: DECODER_READY_TIMEOUT,
            close_timeout: DECODER_CLOSE_TIMEOUT,
        }
    }
}

pub fn seconds(value: f32) -> Duration {
    Duration::from_secs_f32(value.max(0.0))
}

impl SlideshowConfig {
    pub fn display_time(&self) -> Duration {
        seconds(self.display_duration)
    }

    pub fn scan_time(&self) -> Duration {
        seconds(self.scan_interval)
    }

    pub fn error_scan_time(&self) -> Duration {
        seconds(self.error_scan_interval)
    }

    pub fn error_dim_time(&self) -> Duration {
        seconds(self.error_dim_delay)
    }

    pub fn retry_time(&self) -> Duration {
        seconds(self.load_retry_delay)
    }
}

impl MusicConfig {
    pub fn cooldown(&self) -> Duration {
        seconds(self.crash_cooldown)
    }

    pub fn ready_wait(&self) -> Duration {
        seconds(self.ready_timeout)
    }

    pub fn close_wait(&self) -> Duration {
        seconds(self.close_timeout)
    }
}

pub fn load_from_path(path: &Path) -> KioskResult<Config> {
    let text = fs::read_to_string(path)
        .map_err(|e| KioskError::config(format!("cannot read {}: {}", path.display(), e)))?;
    toml::from_str(&text)
        .map_err(|e| KioskError::config(format!("cannot parse {}: {}", path.display(), e)))
}

impl Config {
    /// Reads the file named on the command line (if any) and applies the
    /// flag overrides on top.
    pub fn from_cli(cli: &Cli) -> KioskResult<Self> {
        let mut config = match &cli.config {
            Some(path) => load_from_path(path)?,
            None => Config::default(),
        };
        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(dir) = &cli.image_dir {
            self.slideshow.image_dir = dir.clone();
        }
        if let Some(dir) = &cli.music_dir {
            self.music.dir = Some(dir.clone());
        }
        if let Some(image) = &cli.error_image {
            self.slideshow.error_image = image.clone();
        }
        if let Some(value) = cli.display_time {
            self.slideshow.display_duration = value;
        }
        if let Some(value) = cli.fade_time {
            self.slideshow.fade_duration = value;
        }
        if let Some(fps) = cli.fps {
            self.display.fps = fps;
        }
        if cli.windowed {
            self.display.fullscreen = false;
        }
    }

    pub fn validate(&self) -> KioskResult<()> {
        if self.display.fps == 0 {
            return Err(KioskError::config("fps must be non-zero"));
        }
        if self.display.width <= 0 || self.display.height <= 0 {
            return Err(KioskError::config("display width/height must be positive"));
        }

        let s = &self.slideshow;
        for (name, value) in [
            ("display_duration", s.display_duration),
            ("fade_duration", s.fade_duration),
            ("error_fade_duration", s.error_fade_duration),
            ("scan_interval", s.scan_interval),
            ("error_scan_interval", s.error_scan_interval),
        ] {
            if !(value.is_finite() && value > 0.0 && value <= MAX_SECONDS) {
                return Err(KioskError::config(format!(
                    "{name} must be a positive number of seconds, at most {MAX_SECONDS}"
                )));
            }
        }
        for (name, value) in [
            ("error_dim_delay", s.error_dim_delay),
            ("load_retry_delay", s.load_retry_delay),
            ("music.crash_cooldown", self.music.crash_cooldown),
            ("music.ready_timeout", self.music.ready_timeout),
            ("music.close_timeout", self.music.close_timeout),
        ] {
            if !(value.is_finite() && value >= 0.0 && value <= MAX_SECONDS) {
                return Err(KioskError::config(format!("{name} must be between 0 and {MAX_SECONDS} seconds")));
            }
        }
        if s.load_failure_threshold == 0 {
            return Err(KioskError::config("load_failure_threshold must be at least 1"));
        }
        if self.music.crash_threshold == 0 {
            return Err(KioskError::config("music.crash_threshold must be at least 1"));
        }
        if self.music.decoder.is_empty() {
            return Err(KioskError::config("music.decoder needs a program name"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::tempdir;

    #[test]
    fn defaults_match_reference_kiosk() {
        let config = Config::default();
        assert_eq!(config.display.fps, 30);
        assert_eq!(config.slideshow.display_duration, 11.0);
        assert_eq!(config.slideshow.scan_interval, 600.0);
        assert_eq!(config.slideshow.error_scan_interval, 60.0);
        assert_eq!(config.slideshow.load_failure_threshold, 5);
        assert_eq!(config.music.crash_threshold, 5);
        assert_eq!(config.music.decoder, vec!["mpg123", "-R"]);
        assert!(config.music.dir.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("kiosk.toml");
        fs::write(
            &path,
            "[slideshow]\nimage_dir = \"/srv/photos\"\nfade_duration = 2.5\n\n[music]\ndir = \"/srv/music\"\n",
        )
        .unwrap();

        let config = load_from_path(&path).expect("config loads");
        assert_eq!(config.slideshow.image_dir, PathBuf::from("/srv/photos"));
        assert_eq!(config.slideshow.fade_duration, 2.5);
        assert_eq!(config.slideshow.display_duration, DISPLAY_DURATION);
        assert_eq!(config.music.dir, Some(PathBuf::from("/srv/music")));
        assert_eq!(config.display, DisplayConfig::default());
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("kiosk.toml");
        fs::write(&path, "[slideshow\n").unwrap();
        let err = load_from_path(&path).unwrap_err();
        assert!(matches!(err, KioskError::Config(_)));
    }

    #[test]
    fn cli_overrides_file() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("kiosk.toml");
        fs::write(&path, "[display]\nfps = 60\n[slideshow]\ndisplay_duration = 20.0\n").unwrap();

        let cli = Cli::parse_from([
            "kiosk-slideshow",
            "--config",
            path.to_str().unwrap(),
            "--display-time",
            "4",
            "--windowed",
        ]);
        let config = Config::from_cli(&cli).expect("valid");
        assert_eq!(config.display.fps, 60);
        assert_eq!(config.slideshow.display_duration, 4.0);
        assert!(!config.display.fullscreen);
    }

    #[test]
    fn rejects_nonsense() {
        let mut config = Config::default();
        config.display.fps = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.slideshow.fade_duration = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.music.decoder.clear();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.slideshow.load_failure_threshold = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_times_too_large_for_a_duration() {
        let mut config = Config::default();
        config.slideshow.scan_interval = 1e30;
        assert!(matches!(config.validate(), Err(KioskError::Config(_))));

        let mut config = Config::default();
        config.music.crash_cooldown = 1e30;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.slideshow.error_dim_delay = MAX_SECONDS;
        assert!(config.validate().is_ok());
        assert_eq!(config.slideshow.error_dim_time(), Duration::from_secs(31_536_000));
    }
}
