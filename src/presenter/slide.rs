use std::path::{Path, PathBuf};

use crate::constants::*;
use crate::renderer::{Geometry, ImageSize, Renderer, SlotId};

// Alpha this close to a bound snaps to it, so a fade lasts exactly fps * seconds frames
const ALPHA_SNAP: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fade {
    None,
    In,
    Out,
}

/// One on-screen image surface. The presenter owns two of these for the
/// crossfade and a third, full-screen one for dimming.
#[derive(Debug)]
pub struct Slide {
    slot: SlotId,
    geometry: Geometry,
    alpha: f32,
    fade: Fade,
    fade_step: f32,
    fill_screen: bool,
    depth: f32,
    path: Option<PathBuf>,
}

impl Slide {
    pub fn new(slot: SlotId, fps: u32, fade_seconds: f32) -> Self {
        Self {
            slot,
            geometry: Geometry::default(),
            alpha: 0.0,
            fade: Fade::None,
            fade_step: fade_step(fps, fade_seconds),
            fill_screen: false,
            depth: 0.0,
            path: None,
        }
    }

    pub fn slot(&self) -> SlotId {
        self.slot
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn fade(&self) -> Fade {
        self.fade
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn set_fill_screen(&mut self, value: bool) {
        self.fill_screen = value;
    }

    /// Records a freshly loaded image and its placement. Visibility is left
    /// to the caller.
    pub fn set_image(&mut self, path: PathBuf, image: ImageSize, display: ImageSize) {
        self.geometry = if self.fill_screen {
            full_screen(display)
        } else {
            fit_centered(image, display)
        };
        self.path = Some(path);
    }

    /// Sizes the slide to the whole display without an image behind it.
    pub fn cover_screen(&mut self, display: ImageSize) {
        self.set_fill_screen(true);
        self.geometry = full_screen(display);
    }

    pub fn hide(&mut self) {
        self.alpha = 0.0;
    }

    pub fn show(&mut self) {
        self.alpha = 1.0;
    }

    pub fn set_depth(&mut self, depth: f32) {
        self.depth = depth;
    }

    pub fn fade_in(&mut self) {
        self.fade = Fade::In;
    }

    pub fn fade_out(&mut self) {
        self.fade = Fade::Out;
    }

    /// Returns true once fully opaque.
    pub fn fade_in_step(&mut self) -> bool {
        self.set_alpha(self.alpha + self.fade_step);
        self.alpha >= 1.0
    }

    /// Returns true once fully transparent.
    pub fn fade_out_step(&mut self) -> bool {
        self.set_alpha(self.alpha - self.fade_step);
        self.alpha <= 0.0
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.alpha = if alpha >= 1.0 - ALPHA_SNAP {
            1.0
        } else if alpha <= ALPHA_SNAP {
            0.0
        } else {
            alpha
        };
    }

    /// Drops any running fade, leaving alpha where it is.
    pub fn stop_fade(&mut self) {
        self.fade = Fade::None;
    }

    /// Advances a pending fade by one frame. Returns true when no fade is
    /// left running.
    pub fn update(&mut self) -> bool {
        let done = match self.fade {
            Fade::In => self.fade_in_step(),
            Fade::Out => self.fade_out_step(),
            Fade::None => true,
        };
        if done {
            self.fade = Fade::None;
        }
        done
    }

    /// Pushes geometry and depth to the renderer.
    pub fn place<R: Renderer>(&self, renderer: &mut R) {
        renderer.set_geometry(self.slot, self.geometry);
        renderer.set_depth(self.slot, self.depth);
    }

    pub fn draw<R: Renderer>(&self, renderer: &mut R) {
        renderer.set_alpha(self.slot, self.alpha);
        renderer.draw(self.slot);
    }
}

pub fn fade_step(fps: u32, fade_seconds: f32) -> f32 {
    1.0 / (fps.max(1) as f32 * fade_seconds.max(f32::EPSILON))
}

fn full_screen(display: ImageSize) -> Geometry {
    Geometry {
        x: 0.0,
        y: 0.0,
        width: display.width as f32,
        height: display.height as f32,
    }
}

/// Letterboxes the image in the display, keeping its aspect ratio.
pub fn fit_centered(image: ImageSize, display: ImageSize) -> Geometry {
    let screen_width = display.width as f32;
    let screen_height = display.height as f32;

    let is_sdtv = display.width as i32 == SDTV_WIDTH && display.height as i32 == SDTV_HEIGHT;
    let (logical_width, pixel_aspect) = if is_sdtv {
        (SDTV_LOGICAL_WIDTH, SDTV_PIXEL_ASPECT)
    } else {
        (screen_width, 1.0)
    };

    let tex_width = image.width.max(1) as f32;
    let tex_height = image.height.max(1) as f32;
    let scale = (logical_width / tex_width).min(screen_height / tex_height);

    let width = tex_width * scale * pixel_aspect;
    let height = tex_height * scale;

    Geometry {
        x: (screen_width - width) * 0.5,
        y: (screen_height - height) * 0.5,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HD: ImageSize = ImageSize { width: 1920, height: 1080 };

    #[test]
    fn wide_image_is_pillarboxed_vertically() {
        let g = fit_centered(ImageSize::new(3840, 1080), HD);
        assert_eq!(g.width, 1920.0);
        assert_eq!(g.height, 540.0);
        assert_eq!(g.x, 0.0);
        assert_eq!(g.y, 270.0);
    }

    #[test]
    fn tall_image_is_centered_horizontally() {
        let g = fit_centered(ImageSize::new(1000, 2000), HD);
        assert!((g.height - 1080.0).abs() < 0.01);
        assert!((g.width - 540.0).abs() < 0.01);
        assert!((g.x - 690.0).abs() < 0.01);
        assert!(g.y.abs() < 0.01);
    }

    #[test]
    fn sdtv_stretches_horizontally() {
        let sdtv = ImageSize::new(720, 480);
        let g = fit_centered(ImageSize::new(640, 480), sdtv);
        assert_eq!(g.height, 480.0);
        assert_eq!(g.width, 720.0);
        assert_eq!(g.x, 0.0);
    }

    #[test]
    fn fill_screen_ignores_aspect() {
        let mut slide = Slide::new(SlotId::Overlay, 30, 1.0);
        slide.set_fill_screen(true);
        slide.set_image(PathBuf::from("black.png"), ImageSize::new(10, 10), HD);
        assert_eq!(slide.geometry(), full_screen(HD));
    }

    #[test]
    fn fade_in_is_monotonic_and_resets_direction() {
        let mut slide = Slide::new(SlotId::Slide(0), 30, 1.0);
        slide.hide();
        slide.fade_in();
        let mut last = slide.alpha();
        let mut ticks = 0;
        while !slide.update() {
            assert!(slide.alpha() >= last);
            last = slide.alpha();
            ticks += 1;
        }
        assert_eq!(ticks + 1, 30);
        assert_eq!(slide.alpha(), 1.0);
        assert_eq!(slide.fade(), Fade::None);
    }

    #[test]
    fn fade_out_is_monotonic_and_clamped() {
        let mut slide = Slide::new(SlotId::Slide(1), 30, 0.5);
        slide.show();
        slide.fade_out();
        let mut last = slide.alpha();
        while !slide.update() {
            assert!(slide.alpha() <= last);
            last = slide.alpha();
        }
        assert_eq!(slide.alpha(), 0.0);
        assert_eq!(slide.fade(), Fade::None);
        // Further steps stay clamped.
        assert!(slide.fade_out_step());
        assert_eq!(slide.alpha(), 0.0);
    }

    #[test]
    fn idle_update_reports_done() {
        let mut slide = Slide::new(SlotId::Slide(0), 30, 1.0);
        assert!(slide.update());
    }
}
