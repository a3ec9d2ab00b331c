//! Per-frame target centering controller

use std::sync::Arc;

use serde::Serialize;

use super::observation::{BoundingBox, Point};
use super::prediction::VelocityPredictor;
use crate::config::TrackingConfig;
use crate::gesture::{GestureEngine, GestureHandle};
use crate::servo::{CancelToken, GimbalPosition};

/// What the controller did with one observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ControlAction {
    /// Target lost and no gesture was active: search launched
    SearchStarted,
    /// Target lost while a gesture is already running
    GestureRunning,
    /// Observation was not a finite point; ignored
    Discarded,
    /// Target inside the deadzone; nothing commanded
    Centered { error: Point },
    /// Corrective move issued towards `target`
    Corrected {
        error: Point,
        target: GimbalPosition,
        completed: bool,
    },
}

/// Keeps a detected target centred, searching when it disappears.
///
/// Driven by one caller thread, one observation per detector frame.
#[derive(Debug)]
pub struct TrackingController {
    engine: Arc<GestureEngine>,
    config: TrackingConfig,
    predictor: VelocityPredictor,
    correction: CancelToken,
    search: Option<GestureHandle>,
}

impl TrackingController {
    pub fn new(engine: Arc<GestureEngine>, config: TrackingConfig) -> Self {
        let predictor = VelocityPredictor::new(config.prediction_scale);
        Self {
            engine,
            config,
            predictor,
            correction: CancelToken::new(),
            search: None,
        }
    }

    pub fn engine(&self) -> &Arc<GestureEngine> {
        &self.engine
    }

    /// Token polled by corrective moves, independent of the gesture token.
    /// Cancelling it from another thread aborts the correction in flight;
    /// the next correction clears it.
    pub fn correction_token(&self) -> CancelToken {
        self.correction.clone()
    }

    pub fn frame_center(&self) -> Point {
        Point::new(
            f64::from(self.config.frame_width) / 2.0,
            f64::from(self.config.frame_height) / 2.0,
        )
    }

    /// Feed a bounding-box detection; its centre is tracked
    pub fn on_bounding_box(&mut self, detection: Option<BoundingBox>) -> ControlAction {
        self.on_observation(detection.map(|b| b.center()))
    }

    /// Handle one detector frame.
    ///
    /// Blocks only for a corrective move, or for a running gesture to unwind
    /// after it is interrupted.
    pub fn on_observation(&mut self, target: Option<Point>) -> ControlAction {
        let Some(observed) = target else {
            return self.on_target_lost();
        };
        if !observed.is_finite() {
            tracing::warn!("Discarding non-finite observation {:?}", observed);
            return ControlAction::Discarded;
        }

        if self.engine.is_running() {
            tracing::debug!("Target acquired, interrupting gesture");
            self.engine.cancel_and_wait();
            self.reap_search();
        }

        let predicted = self.predictor.update(observed);
        let aim = if self.config.prediction {
            predicted
        } else {
            observed
        };
        let error = aim - self.frame_center();
        if !error.is_finite() {
            tracing::warn!("Discarding non-finite tracking error {:?}", error);
            return ControlAction::Discarded;
        }

        if error.x.abs() <= self.config.deadzone && error.y.abs() <= self.config.deadzone {
            return ControlAction::Centered { error };
        }

        let (pan_gain, tilt_gain) = self.config.correction.gains();
        let gimbal = self.engine.gimbal();
        let position = gimbal.position();
        let target = GimbalPosition {
            pan: position.pan + pan_gain * error.x,
            tilt: position.tilt + tilt_gain * error.y,
        };

        tracing::debug!(
            "Correcting error ({:.0}, {:.0}) px: ({:.2}, {:.2}) -> ({:.2}, {:.2})",
            error.x,
            error.y,
            position.pan,
            position.tilt,
            target.pan,
            target.tilt
        );

        self.correction.reset();
        let completed = gimbal.move_for(
            target.pan,
            target.tilt,
            self.config.correction_duration(),
            &self.correction,
        );

        ControlAction::Corrected {
            error,
            target,
            completed,
        }
    }

    fn on_target_lost(&mut self) -> ControlAction {
        self.predictor.reset();

        if self.engine.is_running() {
            return ControlAction::GestureRunning;
        }

        self.reap_search();
        tracing::info!("Target lost, starting search");
        self.search = Some(self.engine.start(self.engine.search()));
        ControlAction::SearchStarted
    }

    /// Join a finished or cancelled search worker
    fn reap_search(&mut self) {
        if let Some(handle) = self.search.take() {
            handle.join();
        }
    }

    /// Stop any gesture and join the search worker
    pub fn shutdown(&mut self) {
        self.engine.cancel_and_wait();
        self.reap_search();
    }
}

impl Drop for TrackingController {
    fn drop(&mut self) {
        if self.search.is_some() {
            self.shutdown();
        }
    }
}
