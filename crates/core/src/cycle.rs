//! Cycle analysis: aggregate statistics over one completed repetition.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::angle::{is_observed, NO_ANGLE};
use crate::types::Degrees;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Fewer frames than this and a cycle is too noisy to analyse.
pub const MIN_CYCLE_FRAMES: usize = 5;

/// Upper bound on frames buffered for one cycle (a minute at 30 fps).
pub const MAX_CYCLE_FRAMES: usize = 1800;

// ---------------------------------------------------------------------------
// CycleSample
// ---------------------------------------------------------------------------

/// One frame of a cycle. `knee` is the angle the rep counter follows and
/// `torso` the secondary posture angle; `time` is in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CycleSample {
    pub knee: Degrees,
    pub torso: Degrees,
    pub time: f64,
}

impl CycleSample {
    pub const fn new(knee: Degrees, torso: Degrees, time: f64) -> Self {
        Self { knee, torso, time }
    }
}

// ---------------------------------------------------------------------------
// CycleDigest
// ---------------------------------------------------------------------------

/// Returned instead of a digest when a cycle is too short.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("insufficient data: {frames} frames, at least {required} required")]
pub struct InsufficientData {
    pub frames: usize,
    pub required: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CycleDigest {
    pub frame_count: usize,
    pub duration_sec: f64,
    pub knee_min: Degrees,
    pub knee_max: Degrees,
    pub knee_range: Degrees,
    pub torso_min: Degrees,
    pub torso_max: Degrees,
    pub torso_avg: Degrees,
    pub torso_range: Degrees,
    /// Frames from the start through the knee minimum, inclusive.
    pub descent_frames: usize,
    /// Frames from the knee minimum through the end, inclusive.
    pub ascent_frames: usize,
}

impl CycleDigest {
    /// Descent-to-ascent frame ratio, undefined when either segment is empty.
    pub fn tempo_ratio(&self) -> Option<f64> {
        if self.descent_frames == 0 || self.ascent_frames == 0 {
            return None;
        }
        Some(self.descent_frames as f64 / self.ascent_frames as f64)
    }
}

/// Analyse one cycle with the default [`MIN_CYCLE_FRAMES`] floor.
pub fn analyze_cycle(samples: &[CycleSample]) -> Result<CycleDigest, InsufficientData> {
    analyze_cycle_with_floor(samples, MIN_CYCLE_FRAMES)
}

/// Analyse one cycle, declining when fewer than `min_frames` usable samples
/// exist.
///
/// Samples whose knee angle is the no-data sentinel are dropped before
/// anything else; sentinel torso values are left out of the torso
/// statistics, which stay at the sentinel when no torso was seen at all.
///
/// The knee minimum splits the cycle and belongs to both segments. A minimum
/// on the first frame leaves the descent empty; one on the last frame leaves
/// the ascent empty. Ties resolve to the earliest frame.
pub fn analyze_cycle_with_floor(
    samples: &[CycleSample],
    min_frames: usize,
) -> Result<CycleDigest, InsufficientData> {
    let required = min_frames.max(1);
    let frames: Vec<&CycleSample> = samples.iter().filter(|s| is_observed(s.knee)).collect();
    let n = frames.len();
    if n < required {
        return Err(InsufficientData {
            frames: n,
            required,
        });
    }

    let mut min_index = 0;
    let mut knee_min = f64::INFINITY;
    let mut knee_max = f64::NEG_INFINITY;
    for (i, sample) in frames.iter().enumerate() {
        if sample.knee < knee_min {
            knee_min = sample.knee;
            min_index = i;
        }
        knee_max = knee_max.max(sample.knee);
    }

    let torso: Vec<Degrees> = frames
        .iter()
        .map(|s| s.torso)
        .filter(|&t| is_observed(t))
        .collect();
    let (torso_min, torso_max, torso_avg) = if torso.is_empty() {
        (NO_ANGLE, NO_ANGLE, NO_ANGLE)
    } else {
        (
            torso.iter().copied().fold(f64::INFINITY, f64::min),
            torso.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            torso.iter().sum::<f64>() / torso.len() as f64,
        )
    };

    let descent_frames = if min_index == 0 { 0 } else { min_index + 1 };
    let ascent_frames = if min_index == n - 1 { 0 } else { n - min_index };
    let duration_ms = (frames[n - 1].time - frames[0].time).max(0.0);

    Ok(CycleDigest {
        frame_count: n,
        duration_sec: duration_ms / 1000.0,
        knee_min,
        knee_max,
        knee_range: knee_max - knee_min,
        torso_min,
        torso_max,
        torso_avg,
        torso_range: torso_max - torso_min,
        descent_frames,
        ascent_frames,
    })
}

// ---------------------------------------------------------------------------
// CycleRecorder
// ---------------------------------------------------------------------------

/// Delimits cycles inside a live stream of samples.
///
/// While the subject stands fully extended the buffer keeps only the latest
/// frame, so a cycle starts at the last standing frame before the descent
/// and ends at the frame that closes the rep.
#[derive(Debug, Clone)]
pub struct CycleRecorder {
    up_threshold: Degrees,
    buffer: VecDeque<CycleSample>,
}

impl CycleRecorder {
    pub fn new(up_threshold: Degrees) -> Self {
        Self {
            up_threshold,
            buffer: VecDeque::new(),
        }
    }

    /// Record a frame. `is_down` is the counter state before this frame.
    /// Frames missing either angle are ignored.
    pub fn record(&mut self, sample: CycleSample, is_down: bool) {
        if !is_observed(sample.knee) || !is_observed(sample.torso) {
            return;
        }
        if !is_down && sample.knee > self.up_threshold {
            self.buffer.clear();
        }
        if self.buffer.len() == MAX_CYCLE_FRAMES {
            self.buffer.pop_front();
        }
        self.buffer.push_back(sample);
    }

    /// Hand over the buffered cycle. The closing frame stays buffered as the
    /// start of the next cycle.
    pub fn complete(&mut self) -> Vec<CycleSample> {
        let cycle: Vec<CycleSample> = self.buffer.drain(..).collect();
        if let Some(&last) = cycle.last() {
            self.buffer.push_back(last);
        }
        cycle
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
