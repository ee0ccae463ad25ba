// Circular brush footprint in texture space.
// Given a centre and a radius, yields every in-bounds texel whose centre lies
// inside the disc. The scan never leaves the clamped bounding box, so callers
// can index the buffer without further bounds checks.

use crate::types::BrushOperation;

/// Inclusive texel rectangle `[min_x, max_x] × [min_y, max_y]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub min_x: usize,
    pub max_x: usize,
    pub min_y: usize,
    pub max_y: usize,
}

/// Bounding box of the disc clamped to a `width × height` buffer.
/// Returns None when the disc misses the buffer entirely.
pub fn disc_span(cx: i32, cy: i32, radius: i32, width: usize, height: usize) -> Option<Span> {
    if width == 0 || height == 0 || radius < 0 {
        return None;
    }
    let (w, h) = (width as i64, height as i64);
    let (cx, cy, r) = (cx as i64, cy as i64, radius as i64);

    let min_x = (cx - r).max(0);
    let max_x = (cx + r).min(w - 1);
    let min_y = (cy - r).max(0);
    let max_y = (cy + r).min(h - 1);
    if min_x > max_x || min_y > max_y {
        return None;
    }
    Some(Span {
        min_x: min_x as usize,
        max_x: max_x as usize,
        min_y: min_y as usize,
        max_y: max_y as usize,
    })
}

/// Stateless rasterizer bound to one buffer size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrushRasterizer {
    width: usize,
    height: usize,
}

impl BrushRasterizer {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Every texel `(x, y)` with `(x-cx)² + (y-cy)² ≤ r²`, clipped to the buffer.
    pub fn disc(&self, op: &BrushOperation) -> DiscPixels {
        let span = disc_span(op.x, op.y, op.radius, self.width, self.height);
        DiscPixels {
            cx: op.x as i64,
            cy: op.y as i64,
            r2: (op.radius as i64) * (op.radius as i64),
            span,
            x: span.map_or(0, |s| s.min_x),
            y: span.map_or(0, |s| s.min_y),
        }
    }
}

/// Iterator over the texels of one disc, row by row.
pub struct DiscPixels {
    cx: i64,
    cy: i64,
    r2: i64,
    span: Option<Span>,
    x: usize,
    y: usize,
}

impl Iterator for DiscPixels {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let span = self.span?;
        while self.y <= span.max_y {
            let dy = self.y as i64 - self.cy;
            while self.x <= span.max_x {
                let x = self.x;
                self.x += 1;
                let dx = x as i64 - self.cx;
                if dx * dx + dy * dy <= self.r2 {
                    return Some((x, self.y));
                }
            }
            self.x = span.min_x;
            self.y += 1;
        }
        self.span = None;
        None
    }
}
