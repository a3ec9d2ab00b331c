//! Gesture module
//!
//! Canned multi-step servo motions (home, nod, scan, search) and the engine
//! that runs at most one of them at a time, synchronously or on a worker
//! thread, with cooperative cancellation.

pub mod engine;
pub mod kind;

pub use engine::{GestureEngine, GestureHandle};
pub use kind::Gesture;
