use raylib::prelude::*;
use std::path::Path;
use tracing::{debug, info};

use crate::config::DisplayConfig;
use crate::error::{KioskError, KioskResult};
use crate::renderer::{Geometry, ImageSize, Renderer, SlotId, Surface};
use crate::texture_loader::load_texture_with_exif_rotation;

#[derive(Default)]
struct Layer {
    texture: Option<Texture2D>,
    geometry: Geometry,
    alpha: f32,
    depth: f32,
}

/// Window-backed renderer: two texture slots plus a black overlay.
pub struct RaylibRenderer {
    // Textures must go before the window does.
    layers: [Layer; 3],
    queue: Vec<SlotId>,
    rl: RaylibHandle,
    thread: RaylibThread,
}

impl RaylibRenderer {
    pub fn open(config: &DisplayConfig) -> KioskResult<Self> {
        let mut builder = raylib::init();
        builder.size(config.width, config.height).title("Kiosk Slideshow").vsync();
        if config.fullscreen {
            builder.fullscreen();
        }
        let (mut rl, thread) = builder.build();

        if !rl.is_window_ready() {
            return Err(KioskError::display("window could not be created"));
        }
        rl.set_target_fps(config.fps);
        rl.set_trace_log(TraceLogLevel::LOG_ERROR);
        if config.fullscreen {
            rl.hide_cursor();
        }

        info!(
            "Display ready: {}x{} @ {} fps{}",
            rl.get_screen_width(),
            rl.get_screen_height(),
            config.fps,
            if config.fullscreen { " (fullscreen)" } else { "" }
        );

        Ok(Self {
            layers: Default::default(),
            queue: Vec::with_capacity(3),
            rl,
            thread,
        })
    }
}

impl Surface for RaylibRenderer {
    fn set_geometry(&mut self, slot: SlotId, geometry: Geometry) {
        self.layers[slot.index()].geometry = geometry;
    }

    fn set_alpha(&mut self, slot: SlotId, alpha: f32) {
        self.layers[slot.index()].alpha = alpha.clamp(0.0, 1.0);
    }

    fn set_depth(&mut self, slot: SlotId, depth: f32) {
        self.layers[slot.index()].depth = depth;
    }
}

impl Renderer for RaylibRenderer {
    fn display_size(&self) -> ImageSize {
        ImageSize::new(
            self.rl.get_screen_width().max(0) as u32,
            self.rl.get_screen_height().max(0) as u32,
        )
    }

    fn display_into(&mut self, slot: SlotId, path: &Path) -> KioskResult<ImageSize> {
        if slot == SlotId::Overlay {
            return Err(KioskError::display("the overlay takes no image"));
        }
        let texture = load_texture_with_exif_rotation(&mut self.rl, &self.thread, path)?;
        let size = ImageSize::new(texture.width() as u32, texture.height() as u32);
        debug!("{} -> {:?} ({}x{})", path.display(), slot, size.width, size.height);

        // Replacing drops the previous texture
        self.layers[slot.index()].texture = Some(texture);
        Ok(size)
    }

    fn draw(&mut self, slot: SlotId) {
        self.queue.push(slot);
    }

    fn present_frame(&mut self) {
        let mut queue = std::mem::take(&mut self.queue);
        let depths: Vec<f32> = self.layers.iter().map(|l| l.depth).collect();
        sort_back_to_front(&mut queue, &depths);

        let mut d = self.rl.begin_drawing(&self.thread);
        d.clear_background(Color::BLACK);

        for slot in &queue {
            let layer = &self.layers[slot.index()];
            let g = layer.geometry;
            match slot {
                SlotId::Overlay => d.draw_rectangle(
                    g.x as i32,
                    g.y as i32,
                    g.width.ceil() as i32,
                    g.height.ceil() as i32,
                    tinted(Color::BLACK, layer.alpha),
                ),
                SlotId::Slide(_) => {
                    let Some(texture) = layer.texture.as_ref() else {
                        continue;
                    };
                    d.draw_texture_pro(
                        texture,
                        Rectangle::new(0.0, 0.0, texture.width() as f32, texture.height() as f32),
                        Rectangle::new(g.x, g.y, g.width, g.height),
                        Vector2::new(0.0, 0.0),
                        0.0,
                        tinted(Color::WHITE, layer.alpha),
                    );
                }
            }
        }
        drop(d);

        queue.clear();
        self.queue = queue;
    }

    fn should_close(&self) -> bool {
        self.rl.window_should_close()
    }
}

/// Farther surfaces (larger depth) first. Ties keep submission order.
fn sort_back_to_front(queue: &mut [SlotId], depths: &[f32]) {
    queue.sort_by(|a, b| depths[b.index()].total_cmp(&depths[a.index()]));
}

fn tinted(color: Color, alpha: f32) -> Color {
    Color::new(color.r, color.g, color.b, (alpha.clamp(0.0, 1.0) * 255.0).round() as u8)
}
