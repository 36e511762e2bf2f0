use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::config::SlideshowConfig;
use crate::lister::Lister;
use crate::playlist::Playlist;
use crate::presenter::slide::Slide;
use crate::presenter::state::TransitionState;
use crate::renderer::{Renderer, SlotId};

// Depth convention: smaller is closer to the viewer
const DEPTH_FRONT: f32 = 0.0;
const DEPTH_BEHIND: f32 = 0.1;
const DEPTH_OVERLAY: f32 = -0.1;

/// Drives the double-buffered crossfade, directory rescans and the error
/// fallback. One instance lives for the whole process.
pub struct Presenter<R: Renderer, L: Lister> {
    config: SlideshowConfig,
    renderer: R,
    lister: L,

    slides: [Slide; 2],
    overlay: Slide,

    // Slot most recently switched to; the other one receives the next load
    shown: Option<usize>,
    current: Option<usize>,
    next: Option<usize>,
    state: TransitionState,

    playlist: Playlist,
    preloaded: bool,
    errored: bool,

    last_switch: Option<Instant>,
    last_scan: Instant,
    last_dim: Instant,
    scan_interval: Duration,

    load_failures: u32,
    retry_at: Option<Instant>,
    dim_fading_in: bool,
}

impl<R: Renderer, L: Lister> Presenter<R, L> {
    pub fn new(config: SlideshowConfig, fps: u32, mut renderer: R, lister: L, now: Instant) -> Self {
        let mut slides = [
            Slide::new(SlotId::Slide(0), fps, config.fade_duration),
            Slide::new(SlotId::Slide(1), fps, config.fade_duration),
        ];
        for slide in slides.iter_mut() {
            slide.hide();
            slide.place(&mut renderer);
        }

        let mut overlay = Slide::new(SlotId::Overlay, fps, config.error_fade_duration);
        overlay.cover_screen(renderer.display_size());
        overlay.hide();
        overlay.set_depth(DEPTH_OVERLAY);
        overlay.place(&mut renderer);

        let scan_interval = config.scan_time();
        Self {
            config,
            renderer,
            lister,
            slides,
            overlay,
            shown: None,
            current: None,
            next: None,
            state: TransitionState::Idle,
            playlist: Playlist::default(),
            preloaded: false,
            errored: false,
            last_switch: None,
            last_scan: now,
            last_dim: now,
            scan_interval,
            load_failures: 0,
            retry_at: None,
            dim_fading_in: true,
        }
    }

    /// First scan and first load. The first tick afterwards fades the image in.
    pub fn start(&mut self, now: Instant) {
        self.rescan(now);
        if !self.errored && !self.preloaded {
            self.preload(now);
        }
    }

    /// Runs one frame: scan check, switch check, dim step, draw, promotion.
    pub fn tick(&mut self, now: Instant) {
        if now.saturating_duration_since(self.last_scan) >= self.scan_interval {
            self.rescan(now);
        }

        if self.switch_due(now) {
            self.switch_image(now);
        }

        if self.errored {
            self.step_dim(now);
        }

        let incoming_done = self.draw_frame();
        self.promote(now, incoming_done);
    }

    /// Re-lists the image directory and re-anchors the playlist.
    pub fn rescan(&mut self, now: Instant) {
        let listing = self.lister.list(&self.config.image_dir, &self.config.extensions);
        self.last_scan = now;
        debug!("Scanned {}: {} images", self.config.image_dir.display(), listing.len());

        if listing.is_empty() {
            self.playlist = Playlist::default();
            self.show_failure_image(now);
            return;
        }

        let shown_path = self.current_path().map(Path::to_path_buf);
        self.playlist.replace_anchored(listing, shown_path.as_deref());
        self.scan_interval = self.config.scan_time();

        if self.errored {
            info!("Images available again in {}", self.config.image_dir.display());
            self.errored = false;
            self.overlay.stop_fade();
            self.overlay.hide();
            self.dim_fading_in = true;
            self.load_failures = 0;
            self.preload(now);
            // Replace the error image on this tick rather than after a full display period
            self.last_switch = None;
        }
    }

    /// Starts the crossfade into the slot holding the preloaded image.
    pub fn switch_image(&mut self, now: Instant) {
        self.finish_transition();

        let incoming = self.incoming_slot();
        if let Some(outgoing) = self.current.filter(|&c| c != incoming) {
            let slide = &mut self.slides[outgoing];
            slide.set_depth(DEPTH_BEHIND);
            slide.show();
            slide.fade_out();
            slide.place(&mut self.renderer);
        }

        let slide = &mut self.slides[incoming];
        slide.hide();
        slide.set_depth(DEPTH_FRONT);
        slide.fade_in();
        slide.place(&mut self.renderer);

        self.shown = Some(incoming);
        self.next = Some(incoming);
        self.state = TransitionState::Switching;
        self.preloaded = false;
        self.last_switch = Some(now);
    }

    /// Loads the next playlist entry, or `override_path`, into the slot that
    /// will be switched to next. The playlist is not advanced for an override.
    pub fn load_next(&mut self, override_path: Option<&Path>) -> bool {
        self.finish_transition();

        let slot = self.incoming_slot();
        let path = match override_path {
            Some(path) => path.to_path_buf(),
            None => match self.playlist.advance() {
                Some(path) => path.to_path_buf(),
                None => return false,
            },
        };

        match self.renderer.display_into(SlotId::Slide(slot), &path) {
            Ok(size) => {
                let display = self.renderer.display_size();
                let slide = &mut self.slides[slot];
                debug!("Loaded {} into slot {}", path.display(), slot);
                slide.set_image(path, size, display);
                slide.place(&mut self.renderer);
                self.preloaded = true;
                true
            }
            Err(e) => {
                warn!("Failed to load image {}: {}", path.display(), e);
                false
            }
        }
    }

    pub fn is_errored(&self) -> bool {
        self.errored
    }

    pub fn state(&self) -> TransitionState {
        self.state
    }

    pub fn scan_interval(&self) -> Duration {
        self.scan_interval
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn load_failures(&self) -> u32 {
        self.load_failures
    }

    pub fn slide(&self, slot: usize) -> &Slide {
        &self.slides[slot]
    }

    pub fn overlay(&self) -> &Slide {
        &self.overlay
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Path of the fully visible (or fading-in) image.
    pub fn current_path(&self) -> Option<&Path> {
        self.next
            .or(self.current)
            .and_then(|i| self.slides[i].path())
    }

    fn incoming_slot(&self) -> usize {
        match self.shown {
            Some(i) => 1 - i,
            None => 0,
        }
    }

    fn switch_due(&self, now: Instant) -> bool {
        if self.errored || self.next.is_some() || !self.preloaded {
            return false;
        }
        match self.last_switch {
            Some(at) => now.saturating_duration_since(at) >= self.config.display_time(),
            None => true,
        }
    }

    fn show_failure_image(&mut self, now: Instant) {
        if self.errored {
            return;
        }

        if self.config.image_dir.is_dir() {
            warn!("No images found in {}", self.config.image_dir.display());
        } else {
            warn!("Image directory {} is unavailable", self.config.image_dir.display());
        }

        let error_image: PathBuf = self.config.error_image.clone();
        if self.load_next(Some(&error_image)) {
            self.switch_image(now);
        } else {
            error!("Error image {} could not be shown", error_image.display());
        }

        self.errored = true;
        self.retry_at = None;
        self.load_failures = 0;
        self.last_dim = now;
        self.scan_interval = self.config.error_scan_time();
        self.overlay.hide();
        self.dim_fading_in = true;
    }

    /// Slowly pulses the black overlay so a static error image cannot burn in.
    fn step_dim(&mut self, now: Instant) {
        if now.saturating_duration_since(self.last_dim) < self.config.error_dim_time() {
            return;
        }
        if self.dim_fading_in {
            self.overlay.fade_in_step();
        } else {
            self.overlay.fade_out_step();
        }
        if self.overlay.alpha() >= 1.0 {
            self.dim_fading_in = false;
        } else if self.overlay.alpha() <= 0.0 {
            self.dim_fading_in = true;
        }
    }

    /// Steps fades and hands the frame to the renderer. Returns true when the
    /// incoming slide (if any) finished fading in.
    fn draw_frame(&mut self) -> bool {
        if let Some(i) = self.current.filter(|&c| Some(c) != self.next) {
            self.slides[i].update();
            self.slides[i].draw(&mut self.renderer);
        }

        let mut incoming_done = false;
        if let Some(i) = self.next {
            incoming_done = self.slides[i].update();
            self.slides[i].draw(&mut self.renderer);
        }

        if self.errored {
            self.overlay.draw(&mut self.renderer);
        }

        self.renderer.present_frame();
        incoming_done
    }

    fn promote(&mut self, now: Instant, incoming_done: bool) {
        if self.next.is_some() {
            if incoming_done {
                self.finish_transition();
                if !self.errored {
                    self.preload(now);
                }
            }
            return;
        }

        if let Some(at) = self.retry_at {
            if !self.errored && now >= at {
                self.preload(now);
            }
        }
    }

    /// Makes the incoming slide current and releases the outgoing slot.
    fn finish_transition(&mut self) {
        let Some(incoming) = self.next.take() else {
            return;
        };

        if let Some(outgoing) = self.current.filter(|&c| c != incoming) {
            let slide = &mut self.slides[outgoing];
            slide.stop_fade();
            slide.hide();
            self.renderer.set_alpha(slide.slot(), 0.0);
        }

        let slide = &mut self.slides[incoming];
        slide.stop_fade();
        slide.show();
        slide.set_depth(DEPTH_FRONT);
        slide.place(&mut self.renderer);

        self.current = Some(incoming);
        self.state = TransitionState::Idle;
        if let Some(path) = self.slides[incoming].path() {
            debug!("Now showing {}", path.display());
        }
    }

    /// Loads the next image, backing off after a failure and rescanning once
    /// too many loads in a row failed.
    fn preload(&mut self, now: Instant) {
        self.retry_at = None;
        let mut rescanned = false;
        loop {
            if self.load_next(None) {
                self.load_failures = 0;
                return;
            }
            if self.errored || self.playlist.is_empty() {
                return;
            }

            self.load_failures += 1;
            if self.load_failures >= self.config.load_failure_threshold && !rescanned {
                warn!(
                    "{} image loads failed in a row, rescanning {}",
                    self.load_failures,
                    self.config.image_dir.display()
                );
                self.load_failures = 0;
                rescanned = true;
                self.rescan(now);
                continue;
            }

            debug!("Retrying image load in {:?}", self.config.retry_time());
            self.retry_at = Some(now + self.config.retry_time());
            return;
        }
    }
}
