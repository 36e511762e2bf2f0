use std::fs;
use std::io::Cursor;
use std::path::Path;
use exif::{In, Reader, Tag, Value};
use raylib::prelude::*;
use tracing::{debug, warn};

use crate::error::{KioskError, KioskResult};

/// Clockwise quarter turns needed to display an image upright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Upright,
    Rotate90,
    Rotate180,
    Rotate270,
}

impl Orientation {
    /// Maps the EXIF orientation tag. Mirrored variants (2, 4, 5, 7) are
    /// shown unrotated.
    pub fn from_exif(value: u16) -> Self {
        match value {
            3 => Orientation::Rotate180,
            6 => Orientation::Rotate90,
            8 => Orientation::Rotate270,
            _ => Orientation::Upright,
        }
    }
}

fn is_jpeg(extension: &str) -> bool {
    extension == "jpg" || extension == "jpeg"
}

/// Reads the orientation tag from JPEG bytes; anything unreadable is upright.
pub fn read_orientation(path: &Path, bytes: &[u8]) -> Orientation {
    match Reader::new().read_from_container(&mut Cursor::new(bytes)) {
        Ok(exif) => exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| match &field.value {
                Value::Short(values) => values.first().copied(),
                _ => None,
            })
            .map(Orientation::from_exif)
            .unwrap_or(Orientation::Upright),
        Err(e) => {
            debug!("No EXIF data for {}: {}", path.display(), e);
            Orientation::Upright
        }
    }
}

/// Loads an image file into a GPU texture with EXIF rotation baked in.
pub fn load_texture_with_exif_rotation(
    rl: &mut RaylibHandle,
    thread: &RaylibThread,
    image_path: &Path,
) -> KioskResult<Texture2D> {
    let file_bytes = fs::read(image_path)
        .map_err(|e| KioskError::load(format!("failed to read {}: {}", image_path.display(), e)))?;

    let extension = image_path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase();

    let orientation = if is_jpeg(&extension) {
        read_orientation(image_path, &file_bytes)
    } else {
        Orientation::Upright
    };

    let mut image = Image::load_image_from_mem(&format!(".{}", extension), &file_bytes)
        .map_err(|e| KioskError::load(format!("failed to decode {}: {}", image_path.display(), e)))?;

    if image.width() <= 0 || image.height() <= 0 {
        return Err(KioskError::load(format!("{} has no pixels", image_path.display())));
    }

    match orientation {
        Orientation::Rotate180 => {
            image.rotate_cw();
            image.rotate_cw();
        }
        Orientation::Rotate90 => image.rotate_cw(),
        Orientation::Rotate270 => image.rotate_ccw(),
        Orientation::Upright => {}
    }
    if orientation != Orientation::Upright {
        debug!("Applied {:?} to {}", orientation, image_path.display());
    }

    let texture = rl.load_texture_from_image(thread, &image).map_err(|e| {
        warn!("Texture upload failed for {}: {}", image_path.display(), e);
        KioskError::load(format!("failed to create texture for {}: {}", image_path.display(), e))
    })?;

    Ok(texture)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exif_orientation_mapping() {
        assert_eq!(Orientation::from_exif(1), Orientation::Upright);
        assert_eq!(Orientation::from_exif(3), Orientation::Rotate180);
        assert_eq!(Orientation::from_exif(6), Orientation::Rotate90);
        assert_eq!(Orientation::from_exif(8), Orientation::Rotate270);
        assert_eq!(Orientation::from_exif(5), Orientation::Upright);
    }

    #[test]
    fn garbage_bytes_read_as_upright() {
        let path = Path::new("broken.jpg");
        assert_eq!(read_orientation(path, b"not a jpeg"), Orientation::Upright);
    }

    #[test]
    fn only_jpeg_extensions_carry_exif() {
        assert!(is_jpeg("jpg"));
        assert!(is_jpeg("jpeg"));
        assert!(!is_jpeg("png"));
    }
}
