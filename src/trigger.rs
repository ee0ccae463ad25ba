// One-shot "coverage threshold crossed" notification.

use log::*;

use crate::types::ZoneId;

/// Invoked at most once per round with the id of the zone that fired.
pub type TriggerCallback = Box<dyn FnMut(ZoneId) + Send>;

/// Covered / eligible as a fraction; 0 when nothing is eligible.
pub fn coverage_ratio(covered: usize, eligible: usize) -> f32 {
    if eligible == 0 {
        return 0.0;
    }
    covered as f32 / eligible as f32
}

pub struct CoverageTrigger {
    threshold: f32,
    fired: bool,
    callback: Option<TriggerCallback>,
}

impl CoverageTrigger {
    /// `threshold` must already be clamped into [0.05, 1].
    pub fn new(threshold: f32) -> Self {
        Self { threshold, fired: false, callback: None }
    }

    /// Register the callback, replacing any previous one.
    pub fn set_callback(&mut self, callback: TriggerCallback) {
        self.callback = Some(callback);
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }

    /// Fire if the ratio reached the threshold for the first time this round.
    /// Returns true only on the call that fired.
    pub fn evaluate(&mut self, zone: ZoneId, covered: usize, eligible: usize) -> bool {
        if self.fired || eligible == 0 {
            return false;
        }
        let ratio = coverage_ratio(covered, eligible);
        if ratio < self.threshold {
            return false;
        }
        self.fired = true;
        info!(
            "Zone {}: coverage {:.1}% crossed {:.1}%",
            zone.0,
            ratio * 100.0,
            self.threshold * 100.0
        );
        if let Some(cb) = self.callback.as_mut() {
            cb(zone);
        }
        true
    }

    /// Allow the trigger to fire again (new round).
    pub fn rearm(&mut self) {
        self.fired = false;
    }
}
