//! Single-flight audit coordinator
//!
//! The engine lives in a slot behind one mutex. Submitting claims the
//! engine for a new run and spawns a fresh worker thread, which moves the
//! engine out of the slot and puts it back when playback ends. Holding the
//! engine is the right to speak, so no second run can start while one is
//! in flight.
//!
//! `RunFinished` is posted while the slot lock is held. A submission that
//! observes `Idle` therefore always posts its `RunStarted` after the
//! previous run's `RunFinished`.

use super::events::{AuditEvent, Dispatch, RunId};
use super::request::AuditRequest;
use crate::error::SpeakError;
use crate::sanitize;
use crate::speech::Engine;
use crate::{KairosError, Result};
use log::{debug, error, info, warn};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

/// Externally visible coordinator state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    Idle,
    Running,
}

enum Slot {
    Idle(Engine),
    /// Accepted, engine not yet picked up by the worker
    Claimed(RunId, Engine),
    Running(RunId),
}

struct Shared {
    slot: Mutex<Slot>,
    dispatcher: Box<dyn Dispatch>,
}

impl Shared {
    fn slot(&self) -> MutexGuard<'_, Slot> {
        // The lock is never held across backend calls, so a poisoned slot
        // still holds a consistent value
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Orchestrates audit runs against the one speech engine
pub struct Coordinator {
    shared: Arc<Shared>,
    next_run: u64,
    worker: Option<JoinHandle<()>>,
}

impl Coordinator {
    pub fn new(engine: Engine, dispatcher: impl Dispatch) -> Self {
        Self {
            shared: Arc::new(Shared {
                slot: Mutex::new(Slot::Idle(engine)),
                dispatcher: Box::new(dispatcher),
            }),
            next_run: 1,
            worker: None,
        }
    }

    pub fn state(&self) -> CoordinatorState {
        match *self.shared.slot() {
            Slot::Idle(_) => CoordinatorState::Idle,
            Slot::Claimed(..) | Slot::Running(_) => CoordinatorState::Running,
        }
    }

    /// Start an audit of `raw_text` at `wpm` words per minute
    ///
    /// Returns as soon as the worker is spawned. Blank text, an
    /// out-of-range rate, or a run already in flight are rejected without
    /// any state change. `RunStarted` is posted before this returns;
    /// `RunFinished` follows from the worker once playback ends.
    pub fn submit(&mut self, raw_text: &str, wpm: i64) -> Result<RunId> {
        let request = AuditRequest::new(raw_text, wpm)?;
        let run = RunId(self.next_run);

        {
            let mut slot = self.shared.slot();
            match std::mem::replace(&mut *slot, Slot::Running(run)) {
                Slot::Idle(engine) => *slot = Slot::Claimed(run, engine),
                busy => {
                    *slot = busy;
                    warn!("Rejected submission, an audit is already running");
                    return Err(KairosError::Busy);
                }
            }
        }
        self.next_run += 1;

        info!(
            "Audit {} started: {} chars at {}",
            run,
            request.raw_text().len(),
            request.rate()
        );
        self.shared.dispatcher.post(AuditEvent::RunStarted { run });

        // Reap the previous worker; it has already released the engine
        if let Some(previous) = self.worker.take() {
            let _ = previous.join();
        }

        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name(format!("kairos-audit-{}", run.0))
            .spawn(move || run_audit(shared, run, request));

        match spawned {
            Ok(handle) => {
                self.worker = Some(handle);
                Ok(run)
            }
            Err(e) => {
                error!("Failed to spawn audit worker: {}", e);
                let mut slot = self.shared.slot();
                if let Slot::Claimed(_, engine) = std::mem::replace(&mut *slot, Slot::Running(run)) {
                    *slot = Slot::Idle(engine);
                }

                let error = SpeakError::Backend(format!("could not start audit worker: {}", e));
                self.shared.dispatcher.post(AuditEvent::RunFinished {
                    run,
                    error: Some(error),
                });
                Err(KairosError::Io(e))
            }
        }
    }

    /// Block until the current (or most recent) run has finished
    ///
    /// The interface never calls this; it exists for orderly shutdown.
    pub fn wait_idle(&mut self) {
        if let Some(worker) = self.worker.take() {
            debug!("Waiting for audit worker to finish");
            let _ = worker.join();
        }
    }
}

/// Worker body: sanitize, configure, speak, then hand the engine back
fn run_audit(shared: Arc<Shared>, run: RunId, request: AuditRequest) {
    let mut engine = {
        let mut slot = shared.slot();
        match std::mem::replace(&mut *slot, Slot::Running(run)) {
            Slot::Claimed(claimed, engine) if claimed == run => engine,
            other => {
                *slot = other;
                error!("Audit {} started without a claimed engine", run);
                return;
            }
        }
    };

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let clean = sanitize::clean(request.raw_text());
        debug!(
            "Audit {}: {} of {} chars survived sanitization",
            run,
            clean.len(),
            request.raw_text().len()
        );

        engine.configure(request.rate())?;
        engine.speak(&clean)
    }))
    .unwrap_or_else(|payload| Err(SpeakError::Panicked(panic_message(payload))));

    let error = match outcome {
        Ok(()) => {
            info!("Audit {} finished", run);
            None
        }
        Err(e) => {
            error!("Audit {} failed: {}", run, e);
            Some(e)
        }
    };

    // Back to Idle before notifying, so a retry triggered by the
    // notification is accepted
    let mut slot = shared.slot();
    *slot = Slot::Idle(engine);
    shared.dispatcher.post(AuditEvent::RunFinished { run, error });
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
