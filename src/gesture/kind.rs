//! Gesture definitions and their motion sequences

use std::time::Duration;

use crate::config::{NodConfig, ScanConfig, SearchConfig};
use crate::servo::{CancelToken, Gimbal};

/// A predefined motion sequence not driven by live tracking error
#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    /// Single move to the home position
    Home,
    /// Tilt up and down at a fixed pan
    Nod(NodConfig),
    /// Pan sweeps at a fixed tilt
    Scan(ScanConfig),
    /// Pan sweeps over a ladder of tilt stations, repeated
    Search(SearchConfig),
}

impl Gesture {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Nod(_) => "nod",
            Self::Scan(_) => "scan",
            Self::Search(_) => "search",
        }
    }

    /// Run the motion sequence on the calling thread.
    ///
    /// Any leg that reports cancellation aborts every remaining leg,
    /// including the trailing return home.
    pub fn perform(&self, gimbal: &Gimbal, cancel: &CancelToken, home: Duration) -> bool {
        match self {
            Self::Home => gimbal.go_home(home, cancel),
            Self::Nod(nod) => perform_nod(nod, gimbal, cancel) && gimbal.go_home(home, cancel),
            Self::Scan(scan) => perform_scan(scan, gimbal, cancel) && gimbal.go_home(home, cancel),
            Self::Search(search) => {
                perform_search(search, gimbal, cancel) && gimbal.go_home(home, cancel)
            }
        }
    }
}

impl std::fmt::Display for Gesture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn perform_nod(nod: &NodConfig, gimbal: &Gimbal, cancel: &CancelToken) -> bool {
    let hold_pan = gimbal.position().pan;
    let speed = Duration::from_millis(nod.speed_ms);

    for _ in 0..nod.repeats {
        if !gimbal.move_for(hold_pan, nod.tilt_up, speed, cancel) {
            return false;
        }
        if !gimbal.move_for(hold_pan, nod.tilt_down, speed, cancel) {
            return false;
        }
    }
    true
}

fn perform_scan(scan: &ScanConfig, gimbal: &Gimbal, cancel: &CancelToken) -> bool {
    let range = gimbal.pan().range();
    let pan_start = scan.pan_start.unwrap_or(range.min);
    let pan_end = scan.pan_end.unwrap_or(range.max);
    let hold_tilt = scan.tilt.unwrap_or_else(|| gimbal.position().tilt);
    let sweep = Duration::from_millis(scan.sweep_ms);

    if !gimbal.move_for(pan_start, hold_tilt, Duration::from_millis(scan.approach_ms), cancel) {
        return false;
    }

    for _ in 0..scan.sweeps {
        if !gimbal.move_for(pan_end, hold_tilt, sweep, cancel) {
            return false;
        }
        if !gimbal.move_for(pan_start, hold_tilt, sweep, cancel) {
            return false;
        }
    }
    true
}

fn perform_search(search: &SearchConfig, gimbal: &Gimbal, cancel: &CancelToken) -> bool {
    let range = gimbal.pan().range();
    let tilt_time = Duration::from_millis(search.tilt_ms);
    let rewind_time = Duration::from_millis(search.rewind_ms);
    let sweep_time = Duration::from_millis(search.sweep_ms);

    for attempt in 1..=search.max_attempts {
        for &station in &search.tilt_stations {
            if cancel.is_cancelled() {
                return false;
            }

            let pan = gimbal.position().pan;
            if !gimbal.move_for(pan, station, tilt_time, cancel) {
                return false;
            }
            if !gimbal.move_for(range.min, station, rewind_time, cancel) {
                return false;
            }
            if !gimbal.move_for(range.max, station, sweep_time, cancel) {
                return false;
            }
        }

        tracing::info!(
            "Search attempt {} of {} complete, no target detected",
            attempt,
            search.max_attempts
        );
    }

    tracing::info!("No target detected after all search attempts");
    true
}
