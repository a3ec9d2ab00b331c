//! One-step velocity extrapolation of the tracked target

use super::observation::Point;

/// Extrapolates the next target position from the last two observations
#[derive(Debug, Clone)]
pub struct VelocityPredictor {
    previous: Option<Point>,
    scale: f64,
}

impl VelocityPredictor {
    /// `scale` is the number of frame intervals to look ahead
    pub fn new(scale: f64) -> Self {
        Self {
            previous: None,
            scale,
        }
    }

    /// Record `current` and return `current + (current - previous) * scale`.
    ///
    /// With no previous observation the current point is returned as is.
    pub fn update(&mut self, current: Point) -> Point {
        let predicted = match self.previous {
            Some(previous) => {
                let velocity = current - previous;
                Point::new(
                    current.x + velocity.x * self.scale,
                    current.y + velocity.y * self.scale,
                )
            }
            None => current,
        };
        self.previous = Some(current);
        predicted
    }

    /// Forget history, e.g. when the target is lost
    pub fn reset(&mut self) {
        self.previous = None;
    }
}
