// State shared between the main thread and the pixel worker.
//
// Ownership:
//   pixels  : written by the worker (and by Reset), read by the presenter
//   covered : first-touch flags, one per texel, tagged with the round epoch
//   counter : round epoch (high 32 bits) + covered count (low 32 bits)
//
// Everything is a plain atomic; no locks guard the paint path. Relaxed
// ordering is enough for the pixels because the presenter only promises a
// one-frame-lag view. The counter uses AcqRel so a committed tally is
// visible together with the flags it counts.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use crate::types::FrameBuffer;

const COUNT_MASK: u64 = 0xFFFF_FFFF;

#[inline]
fn pack(epoch: u32, count: u32) -> u64 {
    ((epoch as u64) << 32) | count as u64
}

#[inline]
fn unpack(word: u64) -> (u32, u32) {
    ((word >> 32) as u32, (word & COUNT_MASK) as u32)
}

/// Covered count and round epoch in one atomic word, so a tally from a
/// previous round can never land in the current one.
#[derive(Debug)]
pub struct CoverageCounter {
    word: AtomicU64,
}

impl CoverageCounter {
    fn new() -> Self {
        Self { word: AtomicU64::new(pack(1, 0)) }
    }

    #[inline]
    pub fn epoch(&self) -> u32 {
        unpack(self.word.load(Ordering::Acquire)).0
    }

    #[inline]
    pub fn covered(&self) -> usize {
        unpack(self.word.load(Ordering::Acquire)).1 as usize
    }

    /// Add `n` to the count if the round is still `epoch`. Returns false when
    /// the round has moved on and the tally was dropped.
    pub fn commit(&self, epoch: u32, n: u32) -> bool {
        self.word
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |word| {
                let (e, count) = unpack(word);
                (e == epoch).then(|| pack(e, count.saturating_add(n)))
            })
            .is_ok()
    }

    /// Start a new round: bump the epoch and zero the count in one store.
    fn next_round(&self) -> u32 {
        let prev = self
            .word
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |word| {
                let (e, _) = unpack(word);
                Some(pack(e.wrapping_add(1).max(1), 0))
            })
            .unwrap_or_else(|word| word);
        unpack(prev).0.wrapping_add(1).max(1)
    }
}

#[derive(Debug)]
pub struct SharedCanvas {
    width: usize,
    height: usize,
    pixels: Box<[AtomicU32]>,
    covered: Box<[AtomicU32]>,
    counter: CoverageCounter,
}

impl SharedCanvas {
    pub fn new(initial: &FrameBuffer) -> Self {
        let pixels = initial.pixels.iter().map(|&px| AtomicU32::new(px)).collect();
        let covered = (0..initial.len()).map(|_| AtomicU32::new(0)).collect();
        Self {
            width: initial.width,
            height: initial.height,
            pixels,
            covered,
            counter: CoverageCounter::new(),
        }
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn counter(&self) -> &CoverageCounter {
        &self.counter
    }

    #[inline]
    pub fn epoch(&self) -> u32 {
        self.counter.epoch()
    }

    #[inline]
    pub fn covered(&self) -> usize {
        self.counter.covered()
    }

    #[inline]
    pub fn pixel(&self, idx: usize) -> u32 {
        self.pixels[idx].load(Ordering::Relaxed)
    }

    /// Rewrite one texel. Callers index from a clamped brush span.
    #[inline]
    pub fn write_pixel(&self, idx: usize, f: impl Fn(u32) -> u32) {
        let cell = &self.pixels[idx];
        let old = cell.load(Ordering::Relaxed);
        let new = f(old);
        if new != old {
            cell.store(new, Ordering::Relaxed);
        }
    }

    /// First-touch transition for round `epoch`. True exactly once per texel
    /// per round. A flag only ever moves forward, so an operation from an
    /// older round can't clear a texel covered in the current one.
    #[inline]
    pub fn mark_covered(&self, idx: usize, epoch: u32) -> bool {
        self.covered[idx]
            .fetch_update(Ordering::AcqRel, Ordering::Relaxed, |cur| (cur < epoch).then_some(epoch))
            .is_ok()
    }

    /// Number of texels flagged in the current round.
    pub fn flagged_count(&self) -> usize {
        let epoch = self.epoch();
        self.covered.iter().filter(|f| f.load(Ordering::Acquire) == epoch).count()
    }

    /// Copy the current pixels into `out`, resizing it if needed.
    pub fn snapshot_into(&self, out: &mut FrameBuffer) {
        out.width = self.width;
        out.height = self.height;
        out.pixels.clear();
        out.pixels.extend(self.pixels.iter().map(|px| px.load(Ordering::Relaxed)));
    }

    pub fn snapshot(&self) -> FrameBuffer {
        let mut out = FrameBuffer { width: 0, height: 0, pixels: Vec::with_capacity(self.pixels.len()) };
        self.snapshot_into(&mut out);
        out
    }

    /* ---------- Reset steps (main thread) ---------- */

    /// Invalidate every queued operation and zero the count.
    pub fn begin_round(&self) -> u32 {
        self.counter.next_round()
    }

    pub fn restore(&self, initial: &FrameBuffer) {
        for (cell, &px) in self.pixels.iter().zip(initial.pixels.iter()) {
            cell.store(px, Ordering::Relaxed);
        }
    }

    pub fn clear_flags(&self) {
        for flag in self.covered.iter() {
            flag.store(0, Ordering::Release);
        }
    }
}
