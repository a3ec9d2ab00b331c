//! Servo module
//!
//! Actuation primitives for a two-axis pan/tilt gimbal:
//! - Clamped per-axis angle output
//! - Eased, stepped, cancellable trajectories across both axes
//! - A simulated output for running without hardware

pub mod axis;
pub mod cancel;
pub mod gimbal;
pub mod simulated;
pub mod trajectory;

pub use axis::{Axis, ServoOutput};
pub use cancel::CancelToken;
pub use gimbal::{Gimbal, GimbalPosition};
pub use simulated::{simulated_gimbal, ServoCommand, ServoLog, SimulatedServo};
pub use trajectory::{Easing, MoveProfile};
