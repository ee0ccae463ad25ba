// Once-per-frame upload of the worker's buffer to whatever shows it.
// Eventually consistent: a worker write that lands right after the dirty flag
// is cleared just causes one more upload on the next frame.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::canvas::SharedCanvas;
use crate::error::Error;
use crate::types::FrameBuffer;

/// "Buffer changed" signal. The worker (and Reset) set it; the presenter
/// reads-and-clears it.
#[derive(Debug, Clone, Default)]
pub struct DirtyFlag(Arc<AtomicBool>);

impl DirtyFlag {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn mark(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Clear the flag, returning whether it was set.
    #[inline]
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }

    #[inline]
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Something that can display a full-size copy of the zone's pixels.
pub trait DisplaySurface {
    fn upload(&mut self, frame: &FrameBuffer) -> Result<(), Error>;
}

/// Plain in-memory surface: keeps the last uploaded frame.
impl DisplaySurface for FrameBuffer {
    fn upload(&mut self, frame: &FrameBuffer) -> Result<(), Error> {
        self.clone_from(frame);
        Ok(())
    }
}

/// Main-thread half of the display path. Owns the scratch copy so a frame
/// never allocates once the first upload has sized it.
pub struct PresentationSync {
    dirty: DirtyFlag,
    scratch: FrameBuffer,
    uploads: u64,
}

impl PresentationSync {
    pub fn new(dirty: DirtyFlag) -> Self {
        Self {
            dirty,
            scratch: FrameBuffer { width: 0, height: 0, pixels: Vec::new() },
            uploads: 0,
        }
    }

    /// Upload if the buffer changed since the last call. Returns whether an
    /// upload happened.
    pub fn sync(&mut self, canvas: &SharedCanvas, surface: &mut dyn DisplaySurface) -> Result<bool, Error> {
        if !self.dirty.take() {
            return Ok(false);
        }
        canvas.snapshot_into(&mut self.scratch);
        surface.upload(&self.scratch)?;
        self.uploads += 1;
        log::trace!("presented frame #{}", self.uploads);
        Ok(true)
    }

    pub fn uploads(&self) -> u64 {
        self.uploads
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn uploads_only_when_dirty() {
        let initial = FrameBuffer::filled(2, 2, 0xFF_FF_FF_FF);
        let canvas = SharedCanvas::new(&initial);
        let dirty = DirtyFlag::new();
        let mut sync = PresentationSync::new(dirty.clone());
        let mut surface = FrameBuffer::filled(0, 0, 0);

        assert!(!sync.sync(&canvas, &mut surface).unwrap());
        assert!(surface.is_empty());

        dirty.mark();
        assert!(sync.sync(&canvas, &mut surface).unwrap());
        assert_eq!(surface, initial);
        assert!(!dirty.is_set());

        // clean frame: no second upload
        assert!(!sync.sync(&canvas, &mut surface).unwrap());
        assert_eq!(sync.uploads(), 1);
    }

    #[test]
    fn upload_reflects_latest_pixels() {
        let canvas = SharedCanvas::new(&FrameBuffer::filled(2, 1, 0xFF_00_00_00));
        let dirty = DirtyFlag::new();
        let mut sync = PresentationSync::new(dirty.clone());
        let mut surface = FrameBuffer::filled(0, 0, 0);

        canvas.write_pixel(1, |px| px & 0x00_FF_FF_FF);
        dirty.mark();
        sync.sync(&canvas, &mut surface).unwrap();
        assert_eq!(surface.pixels, vec![0xFF_00_00_00, 0x00_00_00_00]);
    }
}
