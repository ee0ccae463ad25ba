// Core value types shared by the sampler, the worker and the presenter.

/// Stable identity of a zone; handed to the trigger callback when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ZoneId(pub u32);

/// A width×height grid of packed 0xAARRGGBB pixels.
/// Used for the source image, the initial snapshot and presenter-side copies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    pub width: usize,     // pixels per row
    pub height: usize,    // number of rows
    pub pixels: Vec<u32>, // length = width * height, row-major, row 0 on top
}

impl FrameBuffer {
    /// A buffer filled with one colour.
    pub fn filled(width: usize, height: usize, argb: u32) -> Self {
        Self { width, height, pixels: vec![argb; width * height] }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
}

/// One circular rasterization request, queued between sampler and worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrushOperation {
    pub x: i32,      // texel column of the centre
    pub y: i32,      // texel row of the centre
    pub radius: i32, // disc radius in texels
}

/* ---------- packed ARGB helpers ---------- */

#[inline]
pub fn alpha_of(argb: u32) -> u8 {
    (argb >> 24) as u8
}

#[inline]
pub fn pack_argb(a: u8, r: u8, g: u8, b: u8) -> u32 {
    ((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

/// Same colour, alpha forced to zero.
#[inline]
pub fn clear_alpha(argb: u32) -> u32 {
    argb & 0x00_FF_FF_FF
}

/// Opaque pixel of the given RGB colour.
#[inline]
pub fn opaque_rgb(rgb: [u8; 3]) -> u32 {
    pack_argb(0xFF, rgb[0], rgb[1], rgb[2])
}
