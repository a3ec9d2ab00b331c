//! Gesture engine: one gesture at a time, sync or on a worker thread

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use super::kind::Gesture;
use crate::config::GestureConfig;
use crate::servo::{CancelToken, Gimbal};

/// Ownership and cancellation state shared by every gesture request
#[derive(Debug, Default)]
struct RunState {
    busy: bool,
    /// Bumped by every cancel; requests made before a bump never start
    epoch: u64,
    /// Bumped by every acquisition, identifies the current holder
    runs: u64,
}

/// Single-owner lock around gesture bodies.
///
/// Unlike a plain `Mutex<()>`, ownership can be taken on one thread and the
/// guard handed to another, and holders can be observed without blocking.
/// The cancel token is only set or cleared under the state lock, so a worker
/// that wins the lock can never clear a cancel aimed at it.
#[derive(Debug, Default)]
struct RunLock {
    state: Mutex<RunState>,
    released: Condvar,
    token: CancelToken,
}

impl RunLock {
    fn state(&self) -> MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Epoch to tag a new request with
    fn ticket(&self) -> u64 {
        self.state().epoch
    }

    fn claim(self: &Arc<Self>, state: &mut RunState) -> RunGuard {
        state.busy = true;
        state.runs += 1;
        self.token.reset();
        RunGuard {
            lock: Arc::clone(self),
        }
    }

    /// Block until the lock is free. `None` if a cancel arrived after
    /// `ticket` was issued.
    fn acquire(self: &Arc<Self>, ticket: u64) -> Option<RunGuard> {
        let mut state = self.state();
        loop {
            if state.epoch != ticket {
                return None;
            }
            if !state.busy {
                return Some(self.claim(&mut state));
            }
            state = self
                .released
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn try_acquire(self: &Arc<Self>) -> Option<RunGuard> {
        let mut state = self.state();
        if state.busy {
            return None;
        }
        Some(self.claim(&mut state))
    }

    /// Cancel the holder and every request still waiting for the lock
    fn cancel(&self) {
        let mut state = self.state();
        state.epoch += 1;
        self.token.cancel();
        drop(state);
        self.released.notify_all();
    }

    fn is_held(&self) -> bool {
        self.state().busy
    }

    /// Cancel, then wait for the holder at the time of the cancel to let go.
    /// Later holders are not waited for.
    fn cancel_and_wait(&self) {
        let mut state = self.state();
        state.epoch += 1;
        self.token.cancel();
        self.released.notify_all();

        let holder = state.runs;
        while state.busy && state.runs == holder {
            state = self
                .released
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

struct RunGuard {
    lock: Arc<RunLock>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.lock.state().busy = false;
        self.lock.released.notify_all();
    }
}

/// Handle to a gesture running on a worker thread
#[derive(Debug)]
pub struct GestureHandle {
    gesture: &'static str,
    thread: Option<thread::JoinHandle<bool>>,
    run_lock: Arc<RunLock>,
}

impl GestureHandle {
    /// Name of the gesture this handle runs
    pub fn gesture(&self) -> &'static str {
        self.gesture
    }

    /// Request cancellation; observed at the next step boundary.
    ///
    /// The engine shares one token across gestures, so this stops whichever
    /// gesture currently holds the engine, along with any still queued.
    pub fn cancel(&self) {
        self.run_lock.cancel();
    }

    /// Wait for the gesture to end. `true` only if it ran to completion.
    pub fn join(mut self) -> bool {
        match self.thread.take() {
            Some(thread) => thread.join().unwrap_or_else(|_| {
                tracing::error!("{} gesture worker panicked", self.gesture);
                false
            }),
            None => false,
        }
    }
}

/// Runs gesture bodies against a shared gimbal, never two at once
#[derive(Debug)]
pub struct GestureEngine {
    gimbal: Arc<Gimbal>,
    config: GestureConfig,
    run_lock: Arc<RunLock>,
}

impl GestureEngine {
    pub fn new(gimbal: Arc<Gimbal>, config: GestureConfig) -> Self {
        Self {
            gimbal,
            config,
            run_lock: Arc::new(RunLock::default()),
        }
    }

    pub fn gimbal(&self) -> &Arc<Gimbal> {
        &self.gimbal
    }

    pub fn nod(&self) -> Gesture {
        Gesture::Nod(self.config.nod.clone())
    }

    pub fn scan(&self) -> Gesture {
        Gesture::Scan(self.config.scan.clone())
    }

    pub fn search(&self) -> Gesture {
        Gesture::Search(self.config.search.clone())
    }

    /// Run a gesture on the calling thread, first waiting for any active
    /// gesture to finish. Returns `false` if it was cancelled, including
    /// while it waited.
    pub fn run(&self, gesture: Gesture) -> bool {
        let ticket = self.run_lock.ticket();
        let Some(_guard) = self.run_lock.acquire(ticket) else {
            tracing::debug!("{} gesture cancelled before it started", gesture);
            return false;
        };
        execute(&gesture, &self.gimbal, &self.run_lock.token, self.config.home_duration())
    }

    /// Run a gesture on a worker thread without blocking.
    ///
    /// If the engine is idle it is claimed before this returns, so
    /// `is_running()` is immediately `true`. Otherwise the worker waits for
    /// the active gesture to release it, and gives up if `cancel()` is called
    /// meanwhile.
    pub fn start(&self, gesture: Gesture) -> GestureHandle {
        let name = gesture.name();
        let ticket = self.run_lock.ticket();
        let reserved = self.run_lock.try_acquire();

        let gimbal = Arc::clone(&self.gimbal);
        let run_lock = Arc::clone(&self.run_lock);
        let home = self.config.home_duration();

        let spawned = thread::Builder::new()
            .name(format!("gesture-{}", name))
            .spawn(move || {
                let Some(_guard) = reserved.or_else(|| run_lock.acquire(ticket)) else {
                    tracing::debug!("{} gesture cancelled before it started", gesture);
                    return false;
                };
                execute(&gesture, &gimbal, &run_lock.token, home)
            });

        let thread = match spawned {
            Ok(thread) => Some(thread),
            Err(e) => {
                tracing::error!("Failed to spawn {} gesture worker: {}", name, e);
                None
            }
        };

        GestureHandle {
            gesture: name,
            thread,
            run_lock: Arc::clone(&self.run_lock),
        }
    }

    /// Interrupt the running gesture and drop any queued behind it; servos
    /// hold where they are
    pub fn cancel(&self) {
        self.run_lock.cancel();
    }

    pub fn is_running(&self) -> bool {
        self.run_lock.is_held()
    }

    /// Cancel the running gesture and wait for it to unwind.
    ///
    /// Bounded by one interpolation interval of the interrupted move. Queued
    /// gestures are dropped, not waited for.
    pub fn cancel_and_wait(&self) {
        self.run_lock.cancel_and_wait();
    }
}

fn execute(gesture: &Gesture, gimbal: &Gimbal, cancel: &CancelToken, home: Duration) -> bool {
    tracing::info!("Starting {} gesture", gesture);
    let completed = gesture.perform(gimbal, cancel, home);
    if completed {
        tracing::info!("{} gesture complete", gesture);
    } else {
        tracing::debug!("{} gesture cancelled", gesture);
    }
    completed
}
