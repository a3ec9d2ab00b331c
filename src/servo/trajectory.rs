//! Trajectory shaping: easing curves and move timing

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Velocity profile of an interpolated move.
///
/// Every variant maps `[0, 1]` monotonically onto `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    #[default]
    Linear,
    Smoothstep,
    QuadInOut,
}

impl Easing {
    /// Evaluate the easing function at t in [0, 1].
    pub fn ease(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::Smoothstep => t * t * (3.0 - 2.0 * t),
            Self::QuadInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
        }
    }
}

/// Duration and granularity of one move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveProfile {
    pub duration: Duration,
    pub steps: u32,
}

impl MoveProfile {
    /// `steps` of zero is treated as a single step
    pub fn new(duration: Duration, steps: u32) -> Self {
        Self {
            duration,
            steps: steps.max(1),
        }
    }

    /// Pause after each step; also the worst-case cancellation latency
    pub fn interval(&self) -> Duration {
        self.duration / self.steps
    }

    /// Eased fraction of the move completed after step `i` (1-based)
    pub fn fraction(&self, i: u32, easing: Easing) -> f64 {
        easing.ease(f64::from(i) / f64::from(self.steps))
    }
}

/// Linear blend between `start` and `target`
pub fn lerp(start: f64, target: f64, t: f64) -> f64 {
    start + t * (target - start)
}
