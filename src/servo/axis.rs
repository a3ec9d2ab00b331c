//! Single servo axis: clamp, command, remember

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::config::AxisRange;

/// Sink for the angle commands of one physical or simulated servo.
///
/// Pulse-width mapping and any hardware fault handling live behind this
/// trait; the motion core only ever hands it an in-range angle in degrees.
pub trait ServoOutput: Send {
    fn write_angle(&mut self, degrees: f64);
}

/// One actuated degree of freedom (pan or tilt).
///
/// The last commanded angle is readable from any thread without taking the
/// output lock.
pub struct Axis {
    name: &'static str,
    range: AxisRange,
    current: AtomicU64,
    output: Mutex<Box<dyn ServoOutput>>,
}

impl Axis {
    /// Create an axis assumed to rest at `initial` (clamped). Nothing is
    /// written to the output until the first `set_angle`.
    pub fn new(
        name: &'static str,
        range: AxisRange,
        initial: f64,
        output: Box<dyn ServoOutput>,
    ) -> Self {
        let initial = clamp(initial, range);
        Self {
            name,
            range,
            current: AtomicU64::new(initial.to_bits()),
            output: Mutex::new(output),
        }
    }

    /// Clamp `degrees` into range, command it and return what was applied.
    ///
    /// NaN is ignored and the current angle is returned unchanged.
    pub fn set_angle(&self, degrees: f64) -> f64 {
        let mut output = self.output.lock().unwrap_or_else(PoisonError::into_inner);
        if degrees.is_nan() {
            tracing::warn!("{} axis ignored NaN angle command", self.name);
            return self.angle();
        }

        let applied = clamp(degrees, self.range);
        output.write_angle(applied);
        self.current.store(applied.to_bits(), Ordering::Release);
        applied
    }

    /// Last commanded angle
    pub fn angle(&self) -> f64 {
        f64::from_bits(self.current.load(Ordering::Acquire))
    }

    /// Clamp without commanding anything
    pub fn clamp(&self, degrees: f64) -> f64 {
        clamp(degrees, self.range)
    }

    pub fn range(&self) -> AxisRange {
        self.range
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl std::fmt::Debug for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Axis")
            .field("name", &self.name)
            .field("range", &self.range)
            .field("angle", &self.angle())
            .finish()
    }
}

fn clamp(degrees: f64, range: AxisRange) -> f64 {
    degrees.max(range.min).min(range.max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::servo::SimulatedServo;

    fn test_axis() -> (Axis, crate::servo::ServoLog) {
        let (servo, log) = SimulatedServo::recording("pan");
        let axis = Axis::new("pan", AxisRange { min: 0.0, max: 180.0 }, 45.0, Box::new(servo));
        (axis, log)
    }

    #[test]
    fn test_in_range_passes_through() {
        let (axis, log) = test_axis();
        assert_eq!(axis.set_angle(90.0), 90.0);
        assert_eq!(axis.angle(), 90.0);
        assert_eq!(log.angles(), vec![90.0]);
    }

    #[test]
    fn test_out_of_range_saturates() {
        let (axis, log) = test_axis();
        for (requested, expected) in [(-10.0, 0.0), (200.0, 180.0), (f64::INFINITY, 180.0)] {
            let applied = axis.set_angle(requested);
            assert_eq!(applied, expected);
            assert_ne!(applied, requested);
            assert_eq!(axis.angle(), expected);
        }
        assert_eq!(log.angles(), vec![0.0, 180.0, 180.0]);
    }

    #[test]
    fn test_nan_holds_position() {
        let (axis, log) = test_axis();
        assert_eq!(axis.set_angle(f64::NAN), 45.0);
        assert!(log.angles().is_empty());
    }

    #[test]
    fn test_initial_angle_clamped_without_write() {
        let (servo, log) = SimulatedServo::recording("tilt");
        let axis = Axis::new("tilt", AxisRange { min: 10.0, max: 20.0 }, 45.0, Box::new(servo));
        assert_eq!(axis.angle(), 20.0);
        assert!(log.angles().is_empty());
    }
}
