// Eligibility mask: which texels a brush is allowed to touch.
// Built once from the initial alpha channel; Reset reuses it untouched.

use serde::{Deserialize, Serialize};

use crate::types::{FrameBuffer, alpha_of};

/// Which texels count toward coverage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EligibilityPolicy {
    /// Texels with `alpha < threshold` are painted with the brush colour.
    PaintWhereTransparent,
    /// Texels with `alpha ≥ threshold` have their alpha cleared.
    EraseWhereOpaque,
}

impl EligibilityPolicy {
    #[inline]
    pub fn accepts(self, alpha: u8, threshold: u8) -> bool {
        match self {
            EligibilityPolicy::PaintWhereTransparent => alpha < threshold,
            EligibilityPolicy::EraseWhereOpaque => alpha >= threshold,
        }
    }
}

/// Fractional threshold in [0,1] → byte threshold, as used by the mask.
pub fn threshold_byte(threshold: f32) -> u8 {
    let t = if threshold.is_nan() { 0.0 } else { threshold };
    (t * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Immutable per-texel classification plus the eligible total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibilityMask {
    eligible: Vec<bool>,
    total: usize,
}

impl EligibilityMask {
    pub fn build(src: &FrameBuffer, policy: EligibilityPolicy, threshold: f32) -> Self {
        let thr = threshold_byte(threshold);
        let eligible: Vec<bool> = src
            .pixels
            .iter()
            .map(|&px| policy.accepts(alpha_of(px), thr))
            .collect();
        let total = eligible.iter().filter(|&&e| e).count();
        Self { eligible, total }
    }

    #[inline]
    pub fn is_eligible(&self, idx: usize) -> bool {
        self.eligible.get(idx).copied().unwrap_or(false)
    }

    /// Number of eligible texels; the coverage denominator.
    #[inline]
    pub fn eligible_total(&self) -> usize {
        self.total
    }
}
