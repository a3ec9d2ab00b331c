//! Two-axis gimbal: paired pan/tilt axes with interpolated moves

use std::thread;
use std::time::Duration;

use serde::Serialize;

use super::axis::{Axis, ServoOutput};
use super::cancel::CancelToken;
use super::trajectory::{lerp, Easing, MoveProfile};
use crate::config::GimbalConfig;

/// Snapshot of both commanded angles, in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GimbalPosition {
    pub pan: f64,
    pub tilt: f64,
}

/// Pan/tilt servo pair
#[derive(Debug)]
pub struct Gimbal {
    pan: Axis,
    tilt: Axis,
    home: GimbalPosition,
    easing: Easing,
    steps: u32,
}

impl Gimbal {
    /// Build a gimbal resting at its home position
    pub fn new(
        config: &GimbalConfig,
        pan_output: Box<dyn ServoOutput>,
        tilt_output: Box<dyn ServoOutput>,
    ) -> Self {
        Self {
            pan: Axis::new("pan", config.pan, config.home_pan, pan_output),
            tilt: Axis::new("tilt", config.tilt, config.home_tilt, tilt_output),
            home: GimbalPosition {
                pan: config.home_pan,
                tilt: config.home_tilt,
            },
            easing: config.easing,
            steps: config.steps,
        }
    }

    pub fn position(&self) -> GimbalPosition {
        GimbalPosition {
            pan: self.pan.angle(),
            tilt: self.tilt.angle(),
        }
    }

    pub fn pan(&self) -> &Axis {
        &self.pan
    }

    pub fn tilt(&self) -> &Axis {
        &self.tilt
    }

    pub fn home(&self) -> GimbalPosition {
        self.home
    }

    /// Profile for `duration` at the configured step count
    pub fn profile(&self, duration: Duration) -> MoveProfile {
        MoveProfile::new(duration, self.steps)
    }

    /// Move both axes to the target over `duration` in `steps` increments.
    ///
    /// Returns `false` as soon as `cancel` is observed at a step boundary; the
    /// axes then hold the last applied intermediate position.
    pub fn move_to(
        &self,
        target_pan: f64,
        target_tilt: f64,
        duration: Duration,
        steps: u32,
        cancel: &CancelToken,
    ) -> bool {
        self.move_with(
            GimbalPosition {
                pan: target_pan,
                tilt: target_tilt,
            },
            MoveProfile::new(duration, steps),
            cancel,
        )
    }

    /// Like `move_to`, with the configured default step count
    pub fn move_for(
        &self,
        target_pan: f64,
        target_tilt: f64,
        duration: Duration,
        cancel: &CancelToken,
    ) -> bool {
        self.move_with(
            GimbalPosition {
                pan: target_pan,
                tilt: target_tilt,
            },
            self.profile(duration),
            cancel,
        )
    }

    /// A non-finite target component leaves that axis where it is.
    pub fn move_with(&self, target: GimbalPosition, profile: MoveProfile, cancel: &CancelToken) -> bool {
        let start = self.position();
        let target = GimbalPosition {
            pan: resolve_target(&self.pan, start.pan, target.pan),
            tilt: resolve_target(&self.tilt, start.tilt, target.tilt),
        };
        let interval = profile.interval();

        for i in 1..=profile.steps {
            if cancel.is_cancelled() {
                tracing::debug!(
                    "Move to ({:.1}, {:.1}) interrupted at step {}/{}",
                    target.pan,
                    target.tilt,
                    i - 1,
                    profile.steps
                );
                return false;
            }

            let t = profile.fraction(i, self.easing);
            self.pan.set_angle(lerp(start.pan, target.pan, t));
            self.tilt.set_angle(lerp(start.tilt, target.tilt, t));
            thread::sleep(interval);
        }

        true
    }

    /// Move both servos to the home (centre) position
    pub fn go_home(&self, duration: Duration, cancel: &CancelToken) -> bool {
        self.move_for(self.home.pan, self.home.tilt, duration, cancel)
    }
}

fn resolve_target(axis: &Axis, current: f64, target: f64) -> f64 {
    if target.is_finite() {
        axis.clamp(target)
    } else {
        tracing::warn!("{} axis ignored non-finite target {}", axis.name(), target);
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::AxisRange;
    use crate::servo::simulated::simulated_gimbal;

    fn test_gimbal(config: &GimbalConfig) -> (Gimbal, crate::servo::ServoLog, crate::servo::ServoLog) {
        let (gimbal, pan_log, tilt_log) = simulated_gimbal(config);
        let gimbal = Arc::try_unwrap(gimbal).expect("sole owner");
        (gimbal, pan_log, tilt_log)
    }

    #[test]
    fn test_starts_at_home() {
        let (gimbal, pan_log, _) = test_gimbal(&GimbalConfig::default());
        assert_eq!(gimbal.position(), GimbalPosition { pan: 45.0, tilt: 45.0 });
        assert!(pan_log.is_empty());
    }

    #[test]
    fn test_move_applies_every_step() {
        let (gimbal, pan_log, tilt_log) = test_gimbal(&GimbalConfig::default());
        let token = CancelToken::new();

        assert!(gimbal.move_to(145.0, 95.0, Duration::ZERO, 10, &token));
        assert_eq!(pan_log.len(), 10);
        assert_eq!(tilt_log.len(), 10);
        assert_eq!(gimbal.position(), GimbalPosition { pan: 145.0, tilt: 95.0 });

        let pans = pan_log.angles();
        assert!((pans[0] - 55.0).abs() < 1e-9);
        assert!((pans[4] - 95.0).abs() < 1e-9);
    }

    #[test]
    fn test_move_clamps_targets() {
        let config = GimbalConfig {
            tilt: AxisRange { min: 0.0, max: 135.0 },
            ..GimbalConfig::default()
        };
        let (gimbal, _, tilt_log) = test_gimbal(&config);

        assert!(gimbal.move_to(-40.0, 400.0, Duration::ZERO, 5, &CancelToken::new()));
        assert_eq!(gimbal.position(), GimbalPosition { pan: 0.0, tilt: 135.0 });
        assert!(tilt_log.angles().iter().all(|a| *a <= 135.0));
    }

    #[test]
    fn test_non_finite_target_holds_axis() {
        let (gimbal, pan_log, _) = test_gimbal(&GimbalConfig::default());
        let token = CancelToken::new();
        gimbal.move_to(120.0, 100.0, Duration::ZERO, 1, &token);
        pan_log.clear();

        assert!(gimbal.move_to(f64::NAN, 60.0, Duration::ZERO, 3, &token));
        assert_eq!(gimbal.position(), GimbalPosition { pan: 120.0, tilt: 60.0 });
        assert!(pan_log.angles().iter().all(|p| *p == 120.0));

        assert!(gimbal.move_to(30.0, f64::INFINITY, Duration::ZERO, 3, &token));
        assert_eq!(gimbal.position(), GimbalPosition { pan: 30.0, tilt: 60.0 });
    }

    #[test]
    fn test_precancelled_move_does_nothing() {
        let (gimbal, pan_log, tilt_log) = test_gimbal(&GimbalConfig::default());
        let token = CancelToken::new();
        token.cancel();

        assert!(!gimbal.move_to(180.0, 180.0, Duration::from_secs(5), 50, &token));
        assert_eq!(gimbal.position(), GimbalPosition { pan: 45.0, tilt: 45.0 });
        assert!(pan_log.is_empty());
        assert!(tilt_log.is_empty());
    }

    #[test]
    fn test_cancel_mid_move_holds_partial_position() {
        let (gimbal, pan_log, _) = simulated_gimbal(&GimbalConfig::default());
        let token = CancelToken::new();

        let mover = {
            let gimbal = Arc::clone(&gimbal);
            let token = token.clone();
            thread::spawn(move || gimbal.move_to(145.0, 45.0, Duration::from_millis(500), 50, &token))
        };
        thread::sleep(Duration::from_millis(60));
        token.cancel();

        assert!(!mover.join().unwrap());
        let steps = pan_log.len();
        assert!(steps > 0 && steps < 50, "applied {} steps", steps);
        let pan = gimbal.position().pan;
        assert!(pan > 45.0 && pan < 145.0);
        assert_eq!(pan, *pan_log.angles().last().unwrap());
    }

    #[test]
    fn test_smoothstep_reaches_target() {
        let config = GimbalConfig {
            easing: Easing::Smoothstep,
            ..GimbalConfig::default()
        };
        let (gimbal, pan_log, _) = test_gimbal(&config);

        assert!(gimbal.move_to(145.0, 45.0, Duration::ZERO, 4, &CancelToken::new()));
        let pans = pan_log.angles();
        assert!(pans[0] - 45.0 < 100.0 * 0.25);
        assert_eq!(*pans.last().unwrap(), 145.0);
    }

    #[test]
    fn test_go_home() {
        let (gimbal, _, _) = test_gimbal(&GimbalConfig::default());
        let token = CancelToken::new();
        gimbal.move_to(120.0, 10.0, Duration::ZERO, 3, &token);
        assert!(gimbal.go_home(Duration::ZERO, &token));
        assert_eq!(gimbal.position(), gimbal.home());
    }
}
