// A coverage-triggered paint/erase zone.
//
// `Zone` ties the pieces together for one on-screen image:
//
// - input events go through the `StrokeSampler` and become brush operations
//   on the `OperationQueue`;
// - the `PixelWorker` thread rasterizes them into the shared canvas;
// - `frame()` uploads the canvas when it changed and checks the trigger;
// - `reset()` starts a new round from the initial snapshot.
//
// All methods are called from the main (input/render) thread. Only one
// pointer may stroke a zone at a time; a second pointer is ignored.

use std::sync::Arc;

use log::*;

use crate::canvas::SharedCanvas;
use crate::config::{ResetMode, ZoneConfig};
use crate::error::Error;
use crate::mask::EligibilityMask;
use crate::present::{DirtyFlag, DisplaySurface, PresentationSync};
use crate::sampler::{PointerId, ScreenRect, StrokeSampler, UvRect};
use crate::source::check_source;
use crate::trigger::{CoverageTrigger, coverage_ratio};
use crate::types::{BrushOperation, FrameBuffer, ZoneId};
use crate::worker::{BrushEffect, OperationQueue, PixelWorker};

pub struct Zone {
    id: ZoneId,
    state: ZoneState,
}

enum ZoneState {
    Active(Box<ActiveZone>),
    Disabled(Error),
}

struct ActiveZone {
    queue: OperationQueue,
    worker: PixelWorker,
    config: ZoneConfig,
    initial: FrameBuffer,
    mask: Arc<EligibilityMask>,
    canvas: Arc<SharedCanvas>,
    dirty: DirtyFlag,
    sampler: StrokeSampler,
    trigger: CoverageTrigger,
    present: PresentationSync,
}

impl Zone {
    /// Activate a zone, or keep it disabled if the source could not be
    /// obtained. The failure is logged here, once; the zone never retries.
    pub fn activate(id: ZoneId, source: Result<FrameBuffer, Error>, config: &ZoneConfig) -> Self {
        match source.and_then(|src| Self::try_activate(id, src, config)) {
            Ok(zone) => zone,
            Err(e) => {
                error!("Zone {}: {}; zone disabled", id.0, e);
                Self { id, state: ZoneState::Disabled(e) }
            }
        }
    }

    /// Capture the initial snapshot and mask, and start the worker.
    pub fn try_activate(id: ZoneId, source: FrameBuffer, config: &ZoneConfig) -> Result<Self, Error> {
        check_source(&source)?;
        let config = config.sanitized();
        let (width, height) = (source.width, source.height);

        let mask = Arc::new(EligibilityMask::build(&source, config.policy, config.alpha_threshold));
        let canvas = Arc::new(SharedCanvas::new(&source));
        let dirty = DirtyFlag::new();
        let (queue, rx) = OperationQueue::new();
        let effect = BrushEffect::for_policy(config.policy, config.brush_color);
        let worker = PixelWorker::spawn(Arc::clone(&canvas), Arc::clone(&mask), effect, dirty.clone(), rx)?;

        let rect = ScreenRect { x: 0.0, y: 0.0, width: width as f32, height: height as f32 };
        let sampler = StrokeSampler::new(rect, width, height, config.brush_radius as i32);

        // first frame uploads the untouched image
        dirty.mark();

        info!(
            "Zone {}: active {}x{}, {:?}, {} eligible texels, trigger at {:.0}%",
            id.0,
            width,
            height,
            config.policy,
            mask.eligible_total(),
            config.trigger_threshold * 100.0
        );

        let active = ActiveZone {
            queue,
            worker,
            trigger: CoverageTrigger::new(config.trigger_threshold),
            present: PresentationSync::new(dirty.clone()),
            config,
            initial: source,
            mask,
            canvas,
            dirty,
            sampler,
        };
        Ok(Self { id, state: ZoneState::Active(Box::new(active)) })
    }

    pub fn id(&self) -> ZoneId {
        self.id
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self.state, ZoneState::Active(_))
    }

    /// Why the zone is disabled, if it is.
    pub fn error(&self) -> Option<&Error> {
        match &self.state {
            ZoneState::Disabled(e) => Some(e),
            ZoneState::Active(_) => None,
        }
    }

    fn active(&self) -> Option<&ActiveZone> {
        match &self.state {
            ZoneState::Active(z) => Some(&**z),
            ZoneState::Disabled(_) => None,
        }
    }

    fn active_mut(&mut self) -> Option<&mut ActiveZone> {
        match &mut self.state {
            ZoneState::Active(z) => Some(&mut **z),
            ZoneState::Disabled(_) => None,
        }
    }

    /// Effective (sanitized) configuration.
    pub fn config(&self) -> Option<&ZoneConfig> {
        self.active().map(|z| &z.config)
    }

    /// Register the threshold callback, replacing any previous one.
    pub fn on_threshold(&mut self, callback: impl FnMut(ZoneId) + Send + 'static) {
        if let Some(z) = self.active_mut() {
            z.trigger.set_callback(Box::new(callback));
        }
    }

    /// Where the zone sits on screen. Defaults to the texture size at the origin.
    pub fn set_screen_rect(&mut self, rect: ScreenRect) {
        if let Some(z) = self.active_mut() {
            z.sampler.set_rect(rect);
        }
    }

    pub fn set_uv_rect(&mut self, uv: UvRect) {
        if let Some(z) = self.active_mut() {
            z.sampler.set_uv(uv);
        }
    }

    /* ---------- input ---------- */

    /// Returns whether the stroke started.
    pub fn stroke_begin(&mut self, pointer: PointerId, sx: f32, sy: f32) -> bool {
        let Some(z) = self.active_mut() else { return false };
        match z.sampler.begin(pointer, sx, sy) {
            Some(ops) => {
                z.enqueue_all(&ops);
                true
            }
            None => false,
        }
    }

    /// Returns how many brush operations were queued.
    pub fn stroke_move(&mut self, pointer: PointerId, sx: f32, sy: f32) -> usize {
        let id = self.id;
        let Some(z) = self.active_mut() else { return 0 };
        let ops = z.sampler.drag(pointer, sx, sy);
        z.enqueue_all(&ops);
        z.evaluate_trigger(id);
        ops.len()
    }

    pub fn stroke_end(&mut self, pointer: PointerId) {
        let id = self.id;
        let Some(z) = self.active_mut() else { return };
        if z.sampler.end(pointer) {
            z.evaluate_trigger(id);
        }
    }

    /// Queue a texture-space operation directly. Dropped if the centre is off
    /// the texture.
    pub fn enqueue(&mut self, op: BrushOperation) -> bool {
        let Some(z) = self.active_mut() else { return false };
        let (w, h) = z.canvas.dimensions();
        if op.x < 0 || op.y < 0 || op.x as usize >= w || op.y as usize >= h {
            trace!("Zone: op {:?} off texture, dropped", op);
            return false;
        }
        z.queue.enqueue(op, z.canvas.epoch())
    }

    /* ---------- per frame ---------- */

    /// Upload the buffer if it changed and check the trigger. Call once per
    /// rendered frame. Returns whether an upload happened.
    pub fn frame(&mut self, surface: &mut dyn DisplaySurface) -> Result<bool, Error> {
        let id = self.id;
        let Some(z) = self.active_mut() else { return Ok(false) };
        let uploaded = z.present.sync(&z.canvas, surface)?;
        z.evaluate_trigger(id);
        Ok(uploaded)
    }

    /// Start a new round: drop queued operations, restore the initial image,
    /// clear coverage and re-arm the trigger.
    pub fn reset(&mut self) {
        let id = self.id;
        if let Some(z) = self.active_mut() {
            z.reset(id);
        }
    }

    /// Block until the worker has handled everything queued so far.
    pub fn wait_idle(&self) {
        if let Some(z) = self.active() {
            z.queue.barrier();
        }
    }

    /* ---------- queries ---------- */

    pub fn covered_count(&self) -> usize {
        self.active().map_or(0, |z| z.canvas.covered())
    }

    pub fn eligible_total(&self) -> usize {
        self.active().map_or(0, |z| z.mask.eligible_total())
    }

    /// Covered fraction of the eligible area, in [0,1].
    pub fn coverage(&self) -> f32 {
        coverage_ratio(self.covered_count(), self.eligible_total())
    }

    pub fn has_fired(&self) -> bool {
        self.active().is_some_and(|z| z.trigger.has_fired())
    }

    /// Texels whose first-touch flag is set this round.
    pub fn flagged_count(&self) -> usize {
        self.active().map_or(0, |z| z.canvas.flagged_count())
    }

    /// Copy of the current pixels.
    pub fn snapshot(&self) -> Option<FrameBuffer> {
        self.active().map(|z| z.canvas.snapshot())
    }

    /// The image the zone was activated with.
    pub fn initial(&self) -> Option<&FrameBuffer> {
        self.active().map(|z| &z.initial)
    }

    /// Stop the worker and release the buffers.
    pub fn deactivate(self) {}
}

impl ActiveZone {
    fn enqueue_all(&self, ops: &[BrushOperation]) {
        let epoch = self.canvas.epoch();
        for op in ops {
            self.queue.enqueue(*op, epoch);
        }
    }

    fn evaluate_trigger(&mut self, id: ZoneId) {
        self.trigger.evaluate(id, self.canvas.covered(), self.mask.eligible_total());
    }

    fn reset(&mut self, id: ZoneId) {
        // New epoch: every queued op is now stale and the count is zero.
        self.canvas.begin_round();
        if self.config.reset_mode == ResetMode::Quiescent && !self.queue.barrier() {
            warn!("Zone {}: worker gone during reset", id.0);
        }
        self.canvas.restore(&self.initial);
        self.canvas.clear_flags();
        self.trigger.rearm();
        self.dirty.mark();
        info!("Zone {}: reset ({:?})", id.0, self.config.reset_mode);
    }
}

impl Drop for ActiveZone {
    fn drop(&mut self) {
        // close first so the worker wakes from recv()
        self.queue.close();
        self.worker.stop();
        debug!("Zone deactivated");
    }
}
