//! Simulated servo output

use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, ThreadId};

use super::axis::ServoOutput;

/// One recorded angle command
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServoCommand {
    pub degrees: f64,
    /// Thread that issued the command
    pub thread: ThreadId,
}

/// Shared, cloneable record of the commands written to a `SimulatedServo`
#[derive(Debug, Clone, Default)]
pub struct ServoLog {
    commands: Arc<Mutex<Vec<ServoCommand>>>,
}

impl ServoLog {
    fn push(&self, command: ServoCommand) {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(command);
    }

    pub fn commands(&self) -> Vec<ServoCommand> {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn angles(&self) -> Vec<f64> {
        self.commands().iter().map(|c| c.degrees).collect()
    }

    pub fn len(&self) -> usize {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// Servo stand-in that traces every command, optionally recording it
#[derive(Debug)]
pub struct SimulatedServo {
    name: String,
    log: Option<ServoLog>,
}

impl SimulatedServo {
    /// Trace-only servo; keeps no history
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            log: None,
        }
    }

    /// Servo that records every command into the returned log. The log
    /// grows without bound, so this is meant for short runs.
    pub fn recording(name: impl Into<String>) -> (Self, ServoLog) {
        let log = ServoLog::default();
        let servo = Self {
            name: name.into(),
            log: Some(log.clone()),
        };
        (servo, log)
    }
}

impl ServoOutput for SimulatedServo {
    fn write_angle(&mut self, degrees: f64) {
        tracing::trace!("{} servo -> {:.2} deg", self.name, degrees);
        if let Some(log) = &self.log {
            log.push(ServoCommand {
                degrees,
                thread: thread::current().id(),
            });
        }
    }
}

/// Gimbal on two recording servos, with handles to both command logs
pub fn simulated_gimbal(
    config: &crate::config::GimbalConfig,
) -> (Arc<crate::servo::Gimbal>, ServoLog, ServoLog) {
    let (pan, pan_log) = SimulatedServo::recording("pan");
    let (tilt, tilt_log) = SimulatedServo::recording("tilt");
    let gimbal = crate::servo::Gimbal::new(config, Box::new(pan), Box::new(tilt));
    (Arc::new(gimbal), pan_log, tilt_log)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_servo_keeps_no_history() {
        let mut servo = SimulatedServo::new("pan");
        servo.write_angle(30.0);
        assert!(servo.log.is_none());
    }

    #[test]
    fn test_recording_servo() {
        let (mut servo, log) = SimulatedServo::recording("tilt");
        servo.write_angle(30.0);
        servo.write_angle(60.0);
        assert_eq!(log.angles(), vec![30.0, 60.0]);
        assert_eq!(log.commands()[0].thread, thread::current().id());

        log.clear();
        assert!(log.is_empty());
    }
}
