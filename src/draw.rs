// Window + software drawing for the demo.
// 1) A window that shows the zone composited over a checkerboard.
// 2) A crosshair that follows the mouse.
// 3) A tiny 5x7 bitmap font for the HUD line.

use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};
use scratch_zone::{DisplaySurface, Error, FrameBuffer};

pub struct Drawer {
    window: Window,
}

impl Drawer {
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self, Error> {
        let mut window = Window::new(title, width, height, WindowOptions::default())
            .map_err(|e| Error::WindowInit(e.to_string()))?;
        window.set_target_fps(60);
        Ok(Self { window })
    }

    /// Push the 0x00RRGGBB screen buffer to the window.
    pub fn present(&mut self, screen: &FrameBuffer) -> Result<(), Error> {
        self.window
            .update_with_buffer(&screen.pixels, screen.width, screen.height)
            .map_err(|e| Error::WindowUpdate(e.to_string()))
    }

    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    pub fn esc_pressed(&self) -> bool {
        self.window.is_key_down(Key::Escape)
    }

    /// Mouse position in window pixels; None while the cursor is outside.
    pub fn mouse_pos(&self) -> Option<(f32, f32)> {
        self.window.get_mouse_pos(MouseMode::Discard)
    }

    pub fn left_mouse_down(&self) -> bool {
        self.window.get_mouse_down(MouseButton::Left)
    }

    pub fn r_pressed_once(&self) -> bool {
        self.window.is_key_pressed(Key::R, KeyRepeat::No)
    }
}

/* ---------- Zone view: ARGB over a checkerboard ---------- */

const CHECKER_CELL: usize = 8;
const CHECKER_LIGHT: u32 = 0x00_C8_C8_C8;
const CHECKER_DARK: u32 = 0x00_8C_8C_8C;

#[inline]
fn checker(x: usize, y: usize) -> u32 {
    if ((x / CHECKER_CELL) + (y / CHECKER_CELL)) % 2 == 0 { CHECKER_LIGHT } else { CHECKER_DARK }
}

#[inline]
fn mix_channel(src: u32, dst: u32, a: u32) -> u32 {
    (src * a + dst * (255 - a) + 127) / 255
}

/// Source-over blend of one ARGB pixel onto an opaque 0x00RRGGBB background.
#[inline]
fn over(argb: u32, bg: u32) -> u32 {
    let a = argb >> 24;
    if a == 0xFF {
        return argb & 0x00_FF_FF_FF;
    }
    if a == 0 {
        return bg;
    }
    let r = mix_channel((argb >> 16) & 0xFF, (bg >> 16) & 0xFF, a);
    let g = mix_channel((argb >> 8) & 0xFF, (bg >> 8) & 0xFF, a);
    let b = mix_channel(argb & 0xFF, bg & 0xFF, a);
    (r << 16) | (g << 8) | b
}

/// What the window shows of the zone. Only recomposited on upload, so a
/// clean frame costs one copy.
pub struct ZoneView {
    pub composited: FrameBuffer,
}

impl ZoneView {
    pub fn new(width: usize, height: usize) -> Self {
        let mut composited = FrameBuffer::filled(width, height, 0);
        for y in 0..height {
            for x in 0..width {
                composited.pixels[y * width + x] = checker(x, y);
            }
        }
        Self { composited }
    }
}

impl DisplaySurface for ZoneView {
    fn upload(&mut self, frame: &FrameBuffer) -> Result<(), Error> {
        if frame.width != self.composited.width || frame.height != self.composited.height {
            return Err(Error::WindowUpdate("zone view: size mismatch".into()));
        }
        let w = frame.width;
        for (i, (&px, out)) in frame.pixels.iter().zip(self.composited.pixels.iter_mut()).enumerate() {
            *out = over(px, checker(i % w, i / w));
        }
        Ok(())
    }
}

/* ---------- pixels, crosshair ---------- */

#[inline]
fn put_pixel(fb: &mut FrameBuffer, x: i32, y: i32, color: u32) {
    if x < 0 || y < 0 || x as usize >= fb.width || y as usize >= fb.height {
        return;
    }
    let idx = y as usize * fb.width + x as usize;
    fb.pixels[idx] = color;
}

fn hline(fb: &mut FrameBuffer, x0: i32, x1: i32, y: i32, color: u32) {
    for x in x0..=x1 {
        put_pixel(fb, x, y, color);
    }
}

fn vline(fb: &mut FrameBuffer, x: i32, y0: i32, y1: i32, color: u32) {
    for y in y0..=y1 {
        put_pixel(fb, x, y, color);
    }
}

/// A "+" with a small gap in the middle, centred on (cx, cy).
pub fn draw_crosshair(fb: &mut FrameBuffer, cx: i32, cy: i32, size: i32, color: u32) {
    hline(fb, cx - size, cx - 2, cy, color);
    hline(fb, cx + 2, cx + size, cy, color);
    vline(fb, cx, cy - size, cy - 2, color);
    vline(fb, cx, cy + 2, cy + size, color);
    put_pixel(fb, cx, cy, color);
}

/* ---------- 5x7 bitmap font ---------- */

// Each row's low 5 bits are pixels, bit 4 leftmost.
const GLYPHS: &[(char, [u8; 7])] = &[
    ('0', [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110]),
    ('1', [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110]),
    ('2', [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111]),
    ('3', [0b11110, 0b00001, 0b00001, 0b01110, 0b00001, 0b00001, 0b11110]),
    ('4', [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010]),
    ('5', [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110]),
    ('6', [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110]),
    ('7', [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000]),
    ('8', [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110]),
    ('9', [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100]),
    ('A', [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001]),
    ('B', [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110]),
    ('C', [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110]),
    ('D', [0b11100, 0b10010, 0b10001, 0b10001, 0b10001, 0b10010, 0b11100]),
    ('E', [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111]),
    ('F', [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000]),
    ('I', [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110]),
    ('L', [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111]),
    ('N', [0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001, 0b10001]),
    ('O', [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110]),
    ('P', [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000]),
    ('R', [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001]),
    ('S', [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110]),
    ('T', [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100]),
    ('U', [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110]),
    ('V', [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100]),
    (' ', [0; 7]),
    ('|', [0b00100; 7]),
    (':', [0b00000, 0b00100, 0b00000, 0b00000, 0b00100, 0b00000, 0b00000]),
    ('.', [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00100, 0b00000]),
    ('%', [0b11001, 0b11010, 0b00010, 0b00100, 0b01000, 0b01011, 0b10011]),
];

fn glyph5x7(ch: char) -> Option<&'static [u8; 7]> {
    GLYPHS.iter().find(|(c, _)| *c == ch).map(|(_, rows)| rows)
}

fn stamp_glyph(fb: &mut FrameBuffer, x: i32, y: i32, rows: &[u8; 7], color: u32) {
    for (ry, bits) in rows.iter().enumerate() {
        for rx in 0..5 {
            if *bits & (1u8 << (4 - rx)) != 0 {
                put_pixel(fb, x + rx, y + ry as i32, color);
            }
        }
    }
}

/// HUD text with a 1px black drop shadow. Unknown characters render as blanks.
pub fn draw_text_5x7(fb: &mut FrameBuffer, mut x: i32, y: i32, text: &str, color: u32) {
    for ch in text.chars() {
        if let Some(rows) = glyph5x7(ch.to_ascii_uppercase()) {
            stamp_glyph(fb, x + 1, y + 1, rows, 0x00_00_00_00);
            stamp_glyph(fb, x, y, rows, color);
        }
        x += 6;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn over_respects_alpha_extremes() {
        assert_eq!(over(0xFF_12_34_56, 0x00_FF_FF_FF), 0x00_12_34_56);
        assert_eq!(over(0x00_12_34_56, 0x00_AB_CD_EF), 0x00_AB_CD_EF);
        assert_eq!(over(0x80_FF_FF_FF, 0x00_00_00_00), 0x00_80_80_80);
    }

    #[test]
    fn view_upload_composites_erased_texels_as_checker() {
        let mut view = ZoneView::new(16, 1);
        let mut frame = FrameBuffer::filled(16, 1, 0xFF_FF_00_00);
        frame.pixels[9] = 0x00_FF_00_00;
        view.upload(&frame).unwrap();
        assert_eq!(view.composited.pixels[0], 0x00_FF_00_00);
        assert_eq!(view.composited.pixels[9], CHECKER_DARK);
        assert!(view.upload(&FrameBuffer::filled(2, 2, 0)).is_err());
    }
}
