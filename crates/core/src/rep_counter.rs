//! Two-threshold hysteresis repetition counter.
//!
//! The counter is generic over the snapshot type it captures at the lowest
//! point of each rep, so the same machine serves live sessions (full frame
//! snapshots) and plain angle replays in tests.

use serde::{Deserialize, Serialize};

use crate::angle::{is_observed, STRAIGHT_ANGLE};
use crate::error::CoreError;
use crate::threshold_validation::validate_degrees;
use crate::types::Degrees;

// ---------------------------------------------------------------------------
// RepThresholds
// ---------------------------------------------------------------------------

/// Injected per-exercise configuration of the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RepThresholds {
    /// Crossing below this enters the down state.
    pub down_threshold: Degrees,
    /// Crossing above this while down closes a rep.
    pub up_threshold: Degrees,
    /// Cycles shorter than this are not analysed.
    pub minimum_cycle_frames: usize,
}

impl RepThresholds {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_degrees(self.down_threshold, "down_threshold")?;
        validate_degrees(self.up_threshold, "up_threshold")?;
        if self.down_threshold >= self.up_threshold {
            return Err(CoreError::Validation(format!(
                "down_threshold ({}) must be below up_threshold ({})",
                self.down_threshold, self.up_threshold
            )));
        }
        if self.minimum_cycle_frames == 0 {
            return Err(CoreError::Validation(
                "minimum_cycle_frames must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RepState / RepEvent
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct RepState<S> {
    pub is_down: bool,
    /// Running minimum since entering the down state. 180 while up.
    pub min_angle_seen: Degrees,
    pub rep_count: u32,
    /// Captured at each new minimum, taken when the rep closes.
    pub lowest_frame_snapshot: Option<S>,
}

impl<S> Default for RepState<S> {
    fn default() -> Self {
        Self {
            is_down: false,
            min_angle_seen: STRAIGHT_ANGLE,
            rep_count: 0,
            lowest_frame_snapshot: None,
        }
    }
}

/// Emitted once per completed repetition.
#[derive(Debug, Clone, PartialEq)]
pub struct RepEvent<S> {
    /// 1-based count including this rep.
    pub rep_number: u32,
    pub lowest_angle: Degrees,
    pub snapshot: S,
    /// `true` when no lowest-point snapshot existed and the closing frame
    /// was used instead.
    pub used_fallback: bool,
}

// ---------------------------------------------------------------------------
// RepCounter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RepCounter<S> {
    thresholds: RepThresholds,
    state: RepState<S>,
}

impl<S: Clone> RepCounter<S> {
    pub fn new(thresholds: RepThresholds) -> Self {
        Self {
            thresholds,
            state: RepState::default(),
        }
    }

    pub fn thresholds(&self) -> &RepThresholds {
        &self.thresholds
    }

    pub fn state(&self) -> &RepState<S> {
        &self.state
    }

    pub fn rep_count(&self) -> u32 {
        self.state.rep_count
    }

    pub fn is_down(&self) -> bool {
        self.state.is_down
    }

    /// Feed one frame's primary angle.
    ///
    /// An unobserved angle is "no observation this frame" and leaves the
    /// state untouched. Otherwise:
    /// 1. not down and below `down_threshold` enters the down state;
    /// 2. while down, every new minimum captures `frame` as the snapshot;
    /// 3. down and above `up_threshold` closes the rep and returns the event.
    pub fn update(&mut self, angle: Degrees, frame: &S) -> Option<RepEvent<S>> {
        if !is_observed(angle) {
            return None;
        }

        let state = &mut self.state;

        if !state.is_down && angle < self.thresholds.down_threshold {
            state.is_down = true;
        }

        if state.is_down && angle < state.min_angle_seen {
            state.min_angle_seen = angle;
            state.lowest_frame_snapshot = Some(frame.clone());
        }

        if state.is_down && angle > self.thresholds.up_threshold {
            state.rep_count += 1;
            state.is_down = false;
            let lowest_angle = std::mem::replace(&mut state.min_angle_seen, STRAIGHT_ANGLE);
            let (snapshot, used_fallback) = match state.lowest_frame_snapshot.take() {
                Some(snapshot) => (snapshot, false),
                None => (frame.clone(), true),
            };
            return Some(RepEvent {
                rep_number: state.rep_count,
                lowest_angle,
                snapshot,
                used_fallback,
            });
        }

        None
    }

    /// Back to the initial state, keeping the thresholds.
    pub fn reset(&mut self) {
        self.state = RepState::default();
    }
}
