use std::path::Path;

use crate::error::KioskResult;

/// One of the surfaces the presenter draws on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotId {
    /// One of the two alternating image buffers (0 or 1).
    Slide(usize),
    /// Full-screen black layer used to dim the error image.
    Overlay,
}

impl SlotId {
    pub fn index(self) -> usize {
        match self {
            SlotId::Slide(i) => i,
            SlotId::Overlay => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Placement of a surface in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Geometry {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Per-surface properties. Depth follows the "smaller is closer" convention:
/// a surface at 0.0 is drawn over one at 0.1.
pub trait Surface {
    fn set_geometry(&mut self, slot: SlotId, geometry: Geometry);
    fn set_alpha(&mut self, slot: SlotId, alpha: f32);
    fn set_depth(&mut self, slot: SlotId, depth: f32);
}

pub trait Renderer: Surface {
    fn display_size(&self) -> ImageSize;

    /// Loads `path` into `slot`. On failure the slot keeps whatever it
    /// showed before.
    fn display_into(&mut self, slot: SlotId, path: &Path) -> KioskResult<ImageSize>;

    /// Queues `slot` for the frame being built.
    fn draw(&mut self, slot: SlotId);

    /// Composites the queued slots and hands the frame to the display.
    fn present_frame(&mut self);

    /// True once the display asked to go away (window closed).
    fn should_close(&self) -> bool {
        false
    }
}
