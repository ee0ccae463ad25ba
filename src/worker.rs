// Operation queue and the pixel worker that drains it.
//
// Threading model:
// - The sampling thread owns the `OperationQueue` (single producer).
// - The worker thread owns the receiving end (single consumer) and is the
//   only writer of the shared pixels outside of Reset.
// - Enqueue never blocks. The worker sleeps in `recv()` until a job arrives,
//   the zone asks for a barrier, or the queue is closed at deactivation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use log::*;

use crate::brush::BrushRasterizer;
use crate::canvas::SharedCanvas;
use crate::error::Error;
use crate::mask::{EligibilityMask, EligibilityPolicy};
use crate::present::DirtyFlag;
use crate::types::{BrushOperation, clear_alpha, opaque_rgb};

/// Work item sent to the worker.
#[derive(Debug)]
pub enum Job {
    /// Rasterize `op` on behalf of round `epoch`; dropped if the round is over.
    Brush { op: BrushOperation, epoch: u32 },
    /// Acknowledged once every job queued before it has been handled.
    Barrier(Sender<()>),
}

/// What the brush does to an eligible texel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrushEffect {
    /// Replace the texel with this opaque colour.
    Paint(u32),
    /// Zero the alpha channel, keep the colour.
    Erase,
}

impl BrushEffect {
    pub fn for_policy(policy: EligibilityPolicy, color: [u8; 3]) -> Self {
        match policy {
            EligibilityPolicy::PaintWhereTransparent => BrushEffect::Paint(opaque_rgb(color)),
            EligibilityPolicy::EraseWhereOpaque => BrushEffect::Erase,
        }
    }

    #[inline]
    fn apply(self, px: u32) -> u32 {
        match self {
            BrushEffect::Paint(color) => color,
            BrushEffect::Erase => clear_alpha(px),
        }
    }
}

/// Producer end of the queue. FIFO, unbounded, never blocks.
pub struct OperationQueue {
    tx: Option<Sender<Job>>,
}

impl OperationQueue {
    pub fn new() -> (Self, Receiver<Job>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// Queue one brush operation for `epoch`. Returns false if the worker is gone.
    pub fn enqueue(&self, op: BrushOperation, epoch: u32) -> bool {
        self.send(Job::Brush { op, epoch })
    }

    /// Block until every job queued so far has been handled by the worker.
    pub fn barrier(&self) -> bool {
        let (ack_tx, ack_rx) = mpsc::channel();
        if !self.send(Job::Barrier(ack_tx)) {
            return false;
        }
        ack_rx.recv().is_ok()
    }

    /// Drop the sender so a worker blocked in `recv()` wakes and exits.
    pub fn close(&mut self) {
        self.tx = None;
    }

    fn send(&self, job: Job) -> bool {
        match &self.tx {
            Some(tx) => tx.send(job).is_ok(),
            None => false,
        }
    }
}

/// Worker-side state; moved onto the worker thread.
struct PixelLoop {
    canvas: Arc<SharedCanvas>,
    mask: Arc<EligibilityMask>,
    raster: BrushRasterizer,
    effect: BrushEffect,
    dirty: DirtyFlag,
    running: Arc<AtomicBool>,
}

impl PixelLoop {
    fn run(self, rx: Receiver<Job>) {
        debug!("PixelWorker: started");
        let mut stale = 0u64;

        while self.running.load(Ordering::Acquire) {
            let job = match rx.recv() {
                Ok(job) => job,
                Err(_) => break, // queue closed
            };
            match job {
                Job::Brush { op, epoch } => {
                    if epoch != self.canvas.epoch() {
                        stale += 1;
                        trace!("PixelWorker: dropped stale op {:?} (epoch {})", op, epoch);
                        continue;
                    }
                    self.apply(op, epoch);
                }
                Job::Barrier(ack) => {
                    let _ = ack.send(());
                }
            }
        }
        debug!("PixelWorker: exiting ({} stale ops dropped)", stale);
    }

    /// Rasterize one operation. Returns how many texels were covered for the
    /// first time.
    fn apply(&self, op: BrushOperation, epoch: u32) -> u32 {
        let (width, _) = self.canvas.dimensions();
        let mut newly_covered = 0u32;

        for (x, y) in self.raster.disc(&op) {
            let idx = y * width + x;
            if !self.mask.is_eligible(idx) {
                continue;
            }
            self.canvas.write_pixel(idx, |px| self.effect.apply(px));
            if self.canvas.mark_covered(idx, epoch) {
                newly_covered += 1;
            }
        }

        if newly_covered > 0 {
            if !self.canvas.counter().commit(epoch, newly_covered) {
                debug!("PixelWorker: round ended mid-op, dropped tally of {}", newly_covered);
            }
            self.dirty.mark();
        }
        trace!("PixelWorker: {:?} covered {} new texels", op, newly_covered);
        newly_covered
    }
}

/// Handle to the worker thread. Stopping is cooperative and joins the thread,
/// so the shared buffers outlive every write.
pub struct PixelWorker {
    running: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
}

impl PixelWorker {
    pub fn spawn(
        canvas: Arc<SharedCanvas>,
        mask: Arc<EligibilityMask>,
        effect: BrushEffect,
        dirty: DirtyFlag,
        rx: Receiver<Job>,
    ) -> Result<Self, Error> {
        let (width, height) = canvas.dimensions();
        let running = Arc::new(AtomicBool::new(true));
        let state = PixelLoop {
            canvas,
            mask,
            raster: BrushRasterizer::new(width, height),
            effect,
            dirty,
            running: Arc::clone(&running),
        };

        let thread_handle = thread::Builder::new()
            .name("pixel-worker".to_string())
            .spawn(move || state.run(rx))
            .map_err(|e| Error::WorkerSpawn(e.to_string()))?;

        Ok(Self { running, thread_handle: Some(thread_handle) })
    }

    /// Clear the run flag and wait for the thread. The caller must close the
    /// queue first, or the worker may stay parked in `recv()`.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.thread_handle.take() {
            if let Err(e) = handle.join() {
                error!("PixelWorker thread panicked: {:?}", e);
            }
        }
    }
}

impl Drop for PixelWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FrameBuffer, alpha_of};
    use test_log::test;

    struct Rig {
        queue: OperationQueue,
        worker: PixelWorker,
        canvas: Arc<SharedCanvas>,
        dirty: DirtyFlag,
    }

    impl Rig {
        fn new(initial: FrameBuffer, policy: EligibilityPolicy) -> Self {
            let mask = Arc::new(EligibilityMask::build(&initial, policy, 0.5));
            let canvas = Arc::new(SharedCanvas::new(&initial));
            let dirty = DirtyFlag::new();
            let (queue, rx) = OperationQueue::new();
            let effect = BrushEffect::for_policy(policy, [0xFF, 0x00, 0x00]);
            let worker =
                PixelWorker::spawn(Arc::clone(&canvas), mask, effect, dirty.clone(), rx).unwrap();
            Self { queue, worker, canvas, dirty }
        }

        fn brush(&self, x: i32, y: i32, radius: i32) {
            assert!(self.queue.enqueue(BrushOperation { x, y, radius }, self.canvas.epoch()));
        }

        fn shutdown(mut self) {
            self.queue.close();
            self.worker.stop();
        }
    }

    #[test]
    fn erase_clears_alpha_of_touched_texels() {
        let rig = Rig::new(FrameBuffer::filled(4, 4, 0xFF_12_34_56), EligibilityPolicy::EraseWhereOpaque);
        rig.brush(0, 0, 1);
        assert!(rig.queue.barrier());

        assert_eq!(rig.canvas.covered(), 3);
        assert!(rig.dirty.is_set());
        assert_eq!(rig.canvas.pixel(0), 0x00_12_34_56);
        assert_eq!(alpha_of(rig.canvas.pixel(5)), 0xFF);
        rig.shutdown();
    }

    #[test]
    fn paint_only_touches_transparent_texels() {
        let mut initial = FrameBuffer::filled(3, 1, 0x00_00_00_00);
        initial.pixels[1] = 0xFF_00_FF_00; // opaque, ineligible
        let rig = Rig::new(initial, EligibilityPolicy::PaintWhereTransparent);
        rig.brush(1, 0, 2);
        assert!(rig.queue.barrier());

        assert_eq!(rig.canvas.covered(), 2);
        assert_eq!(rig.canvas.pixel(0), 0xFF_FF_00_00);
        assert_eq!(rig.canvas.pixel(1), 0xFF_00_FF_00);
        assert_eq!(rig.canvas.pixel(2), 0xFF_FF_00_00);
        rig.shutdown();
    }

    #[test]
    fn repeated_operation_adds_nothing() {
        let rig = Rig::new(FrameBuffer::filled(8, 8, 0xFF_00_00_00), EligibilityPolicy::EraseWhereOpaque);
        rig.brush(4, 4, 2);
        assert!(rig.queue.barrier());
        let once = rig.canvas.covered();
        assert!(rig.dirty.take());

        rig.brush(4, 4, 2);
        assert!(rig.queue.barrier());
        assert_eq!(rig.canvas.covered(), once);
        assert!(!rig.dirty.is_set());
        rig.shutdown();
    }

    #[test]
    fn stale_jobs_are_dropped() {
        let rig = Rig::new(FrameBuffer::filled(4, 4, 0xFF_00_00_00), EligibilityPolicy::EraseWhereOpaque);
        let old = rig.canvas.epoch();
        rig.canvas.begin_round();
        assert!(rig.queue.enqueue(BrushOperation { x: 1, y: 1, radius: 3 }, old));
        assert!(rig.queue.barrier());
        assert_eq!(rig.canvas.covered(), 0);
        assert_eq!(alpha_of(rig.canvas.pixel(5)), 0xFF);
        rig.shutdown();
    }

    #[test]
    fn closed_queue_rejects_work() {
        let rig = Rig::new(FrameBuffer::filled(2, 2, 0xFF_00_00_00), EligibilityPolicy::EraseWhereOpaque);
        let Rig { mut queue, mut worker, .. } = rig;
        queue.close();
        worker.stop();
        assert!(!queue.enqueue(BrushOperation { x: 0, y: 0, radius: 2 }, 1));
        assert!(!queue.barrier());
    }
}
