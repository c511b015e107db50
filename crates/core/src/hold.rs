//! Hold timer for static exercises.
//!
//! A plank has no repetitions; instead hold time accrues while the body-line
//! angle stays inside its band, and a checkpoint fires at every
//! [`HOLD_CHECKPOINT_SECS`] of accumulated hold. Checkpoints play the role a
//! rep boundary plays for dynamic exercises.

use crate::angle::is_observed;
use crate::feedback::AngleBand;
use crate::types::Degrees;

/// Seconds of accumulated hold between checkpoints.
pub const HOLD_CHECKPOINT_SECS: f64 = 10.0;

/// Gaps between frames longer than this do not count as held time.
pub const MAX_FRAME_GAP_MS: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoldCheckpoint {
    /// 1-based checkpoint number.
    pub checkpoint: u32,
    pub held_secs: f64,
}

#[derive(Debug, Clone)]
pub struct HoldTimer {
    band: AngleBand,
    held_ms: f64,
    /// Timestamp of the previous in-band frame, if the hold is unbroken.
    last_in_band: Option<f64>,
    checkpoints: u32,
}

impl HoldTimer {
    pub fn new(band: AngleBand) -> Self {
        Self {
            band,
            held_ms: 0.0,
            last_in_band: None,
            checkpoints: 0,
        }
    }

    /// Feed one frame's body-line angle at `time_ms`.
    pub fn update(&mut self, angle: Degrees, time_ms: f64) -> Option<HoldCheckpoint> {
        if !is_observed(angle) || !self.band.contains(angle) {
            self.last_in_band = None;
            return None;
        }

        if let Some(previous) = self.last_in_band {
            let gap = time_ms - previous;
            if gap > 0.0 && gap <= MAX_FRAME_GAP_MS {
                self.held_ms += gap;
            }
        }
        self.last_in_band = Some(time_ms);

        let reached = (self.held_ms / (HOLD_CHECKPOINT_SECS * 1000.0)).floor() as u32;
        if reached > self.checkpoints {
            self.checkpoints = reached;
            return Some(HoldCheckpoint {
                checkpoint: reached,
                held_secs: self.held_secs(),
            });
        }
        None
    }

    pub fn held_secs(&self) -> f64 {
        self.held_ms / 1000.0
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.band);
    }
}
