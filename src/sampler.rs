// Pointer input → texture-space brush operations.
// Runs on the input thread; never touches the pixels itself.

use log::*;

use crate::types::BrushOperation;

/// Pointer that owns the active stroke (mouse = 0, touches = their id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointerId(pub u32);

/// On-screen rectangle of the zone, in screen pixels (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ScreenRect {
    pub fn contains(&self, sx: f32, sy: f32) -> bool {
        sx >= self.x && sy >= self.y && sx <= self.x + self.width && sy <= self.y + self.height
    }
}

/// Sub-rectangle of the texture shown inside the screen rect, in [0,1]².
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for UvRect {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0, width: 1.0, height: 1.0 }
    }
}

#[derive(Debug, Clone, Copy)]
struct ActiveStroke {
    pointer: PointerId,
    last: (f32, f32), // continuous texel position of the previous sample
}

pub struct StrokeSampler {
    rect: ScreenRect,
    uv: UvRect,
    tex_w: usize,
    tex_h: usize,
    radius: i32,
    stroke: Option<ActiveStroke>,
}

impl StrokeSampler {
    pub fn new(rect: ScreenRect, tex_w: usize, tex_h: usize, radius: i32) -> Self {
        Self { rect, uv: UvRect::default(), tex_w, tex_h, radius: radius.max(1), stroke: None }
    }

    pub fn set_rect(&mut self, rect: ScreenRect) {
        self.rect = rect;
    }

    pub fn set_uv(&mut self, uv: UvRect) {
        self.uv = uv;
    }

    pub fn is_stroking(&self) -> bool {
        self.stroke.is_some()
    }

    /// Screen position → continuous texel position. None if the rect is
    /// degenerate or the position is not a finite number. Points outside the
    /// rect still map (they land off-texture).
    pub fn to_texel(&self, sx: f32, sy: f32) -> Option<(f32, f32)> {
        if !(self.rect.width > 0.0 && self.rect.height > 0.0) {
            return None;
        }
        // screen → local rect → normalized → uv sub-rect → texels
        let nx = (sx - self.rect.x) / self.rect.width;
        let ny = (sy - self.rect.y) / self.rect.height;
        let u = self.uv.x + nx * self.uv.width;
        let v = self.uv.y + ny * self.uv.height;
        let (tx, ty) = (u * self.tex_w as f32, v * self.tex_h as f32);
        (tx.is_finite() && ty.is_finite()).then_some((tx, ty))
    }

    /// Start a stroke. Nothing happens if the pointer is outside the rect or
    /// another pointer already owns a stroke on this zone.
    pub fn begin(&mut self, pointer: PointerId, sx: f32, sy: f32) -> Option<Vec<BrushOperation>> {
        if let Some(active) = self.stroke {
            if active.pointer != pointer {
                warn!(
                    "Second pointer {:?} ignored: pointer {:?} already strokes this zone",
                    pointer, active.pointer
                );
                return None;
            }
        }
        if !self.rect.contains(sx, sy) {
            return None;
        }
        let texel = self.to_texel(sx, sy)?;
        self.stroke = Some(ActiveStroke { pointer, last: texel });
        Some(self.op_at(texel).into_iter().collect())
    }

    /// Continue the stroke. Fills the gap from the previous sample with points
    /// no more than `radius / 2` texels apart, ending at the new sample.
    pub fn drag(&mut self, pointer: PointerId, sx: f32, sy: f32) -> Vec<BrushOperation> {
        let Some(active) = self.stroke else {
            return Vec::new();
        };
        if active.pointer != pointer {
            debug!("Move from foreign pointer {:?} ignored", pointer);
            return Vec::new();
        }
        let Some(to) = self.to_texel(sx, sy) else {
            return Vec::new();
        };

        let from = active.last;
        self.stroke = Some(ActiveStroke { pointer, last: to });

        // Only the part of the segment near the texture can produce texels.
        // f64 keeps a far-away endpoint from eating the precision of the
        // points near the texture.
        let (fx, fy) = (from.0 as f64, from.1 as f64);
        let (dx, dy) = (to.0 as f64 - fx, to.1 as f64 - fy);
        let Some((t0, t1)) = self.clip_to_reach((fx, fy), (dx, dy)) else {
            trace!("Move ({:.1}, {:.1}) -> ({:.1}, {:.1}) misses the texture", from.0, from.1, to.0, to.1);
            return Vec::new();
        };
        let dist = (dx * dx + dy * dy).sqrt() * (t1 - t0);
        let spacing = self.radius as f64 * 0.5;
        let steps = ((dist / spacing).ceil() as usize).max(1);
        // the previous sample was already stamped; an entry point was not
        let first = if t0 > 0.0 { 0 } else { 1 };

        (first..=steps)
            .filter_map(|i| {
                let t = t0 + (t1 - t0) * (i as f64 / steps as f64);
                self.op_at(((fx + dx * t) as f32, (fy + dy * t) as f32))
            })
            .collect()
    }

    /// Finish the stroke. Returns false if `pointer` did not own one.
    pub fn end(&mut self, pointer: PointerId) -> bool {
        match self.stroke {
            Some(active) if active.pointer == pointer => {
                self.stroke = None;
                true
            }
            _ => false,
        }
    }

    /// Parameter range of `from + t * delta` inside the texture grown by the
    /// brush radius (Liang-Barsky). Bounds the step count by the texture size.
    fn clip_to_reach(&self, from: (f64, f64), delta: (f64, f64)) -> Option<(f64, f64)> {
        let r = self.radius as f64;
        let (min_x, min_y) = (-r, -r);
        let (max_x, max_y) = (self.tex_w as f64 + r, self.tex_h as f64 + r);
        let (dx, dy) = delta;

        let (mut t0, mut t1) = (0.0f64, 1.0f64);
        for (p, q) in [(-dx, from.0 - min_x), (dx, max_x - from.0), (-dy, from.1 - min_y), (dy, max_y - from.1)] {
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let t = q / p;
            if p < 0.0 {
                t0 = t0.max(t);
            } else {
                t1 = t1.min(t);
            }
            if t0 > t1 {
                return None;
            }
        }
        Some((t0, t1))
    }

    /// Round to the nearest texel; off-texture samples are dropped.
    fn op_at(&self, (tx, ty): (f32, f32)) -> Option<BrushOperation> {
        let (x, y) = (tx.round(), ty.round());
        if x < 0.0 || y < 0.0 || x >= self.tex_w as f32 || y >= self.tex_h as f32 {
            trace!("Sample ({:.1}, {:.1}) off texture, dropped", tx, ty);
            return None;
        }
        Some(BrushOperation { x: x as i32, y: y as i32, radius: self.radius })
    }
}
