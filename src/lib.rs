//! pantilt - Gesture and Tracking Control for a Pan/Tilt Servo Gimbal
//!
//! Keeps a visually tracked target centred in the camera frame:
//! - Clamped, eased, cancellable servo trajectories
//! - Mutually exclusive background gestures (home, nod, scan, search)
//! - A per-frame controller with deadzone, proportional correction and
//!   one-step velocity prediction

pub mod config;
pub mod error;
pub mod gesture;
pub mod servo;
pub mod tracking;

pub use config::Config;
pub use error::{PantiltError, Result};
pub use gesture::{Gesture, GestureEngine, GestureHandle};
pub use servo::{CancelToken, Gimbal, GimbalPosition, ServoOutput};
pub use tracking::{ControlAction, Detection, TrackingController};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
