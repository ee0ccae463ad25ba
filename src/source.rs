// Loads the zone's source image and packs it into 0xAARRGGBB pixels.
// A missing or unreadable source is a configuration error: the caller
// disables the zone instead of retrying.

use std::io::ErrorKind;
use std::path::Path;

use image::{ImageError, RgbaImage};

use crate::error::Error;
use crate::types::{FrameBuffer, pack_argb};

/// Decode an image file (any format `image` understands) into a FrameBuffer.
pub fn load_source(path: &Path) -> Result<FrameBuffer, Error> {
    let img = image::open(path).map_err(|e| match e {
        ImageError::IoError(io) if io.kind() == ErrorKind::NotFound => {
            Error::SourceMissing(format!("{}: {io}", path.display()))
        }
        other => Error::SourceDecode(format!("{}: {other}", path.display())),
    })?;
    from_rgba_image(&img.to_rgba8())
}

pub fn from_rgba_image(img: &RgbaImage) -> Result<FrameBuffer, Error> {
    let (w, h) = img.dimensions();
    from_rgba_bytes(w as usize, h as usize, img.as_raw())
}

/// Pack tightly laid out RGBA8 bytes.
pub fn from_rgba_bytes(width: usize, height: usize, rgba: &[u8]) -> Result<FrameBuffer, Error> {
    if width == 0 || height == 0 {
        return Err(Error::SourceDecode(format!("empty source ({width}x{height})")));
    }
    let expected = width * height * 4;
    if rgba.len() != expected {
        return Err(Error::SourceDecode(format!(
            "expected {expected} RGBA bytes for {width}x{height}, got {}",
            rgba.len()
        )));
    }
    let pixels = rgba
        .chunks_exact(4)
        .map(|p| pack_argb(p[3], p[0], p[1], p[2]))
        .collect();
    Ok(FrameBuffer { width, height, pixels })
}

/// Validate a caller-supplied buffer before a zone adopts it.
pub fn check_source(src: &FrameBuffer) -> Result<(), Error> {
    if src.width == 0 || src.height == 0 {
        return Err(Error::SourceDecode(format!("empty source ({}x{})", src.width, src.height)));
    }
    if src.pixels.len() != src.width * src.height {
        return Err(Error::SourceDecode(format!(
            "{}x{} source carries {} pixels",
            src.width,
            src.height,
            src.pixels.len()
        )));
    }
    Ok(())
}
