//! Tracking module
//!
//! Closed-loop centering of a detected target in the camera frame:
//! - Detector observations (points, bounding boxes, recorded streams)
//! - One-step velocity prediction
//! - The per-frame controller that corrects, interrupts, or searches

pub mod controller;
pub mod observation;
pub mod prediction;

pub use controller::{ControlAction, TrackingController};
pub use observation::{BoundingBox, Detection, Point};
pub use prediction::VelocityPredictor;
