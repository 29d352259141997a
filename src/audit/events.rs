//! Notifications from the coordinator to the interface
//!
//! The coordinator never touches interface state itself. It posts
//! `AuditEvent`s through a `Dispatch` implementation, which hands them to
//! the interface's own thread (a channel drained by its event loop).

use crate::error::SpeakError;
use std::fmt;
use std::sync::mpsc::Sender;

/// Identifier of one audit run, increasing per submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunId(pub u64);

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// State change notification for the interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditEvent {
    /// Disable the trigger and show the in-progress indicator
    RunStarted { run: RunId },
    /// Re-enable the trigger; `error` is set when synthesis failed
    RunFinished {
        run: RunId,
        error: Option<SpeakError>,
    },
}

impl AuditEvent {
    pub fn run(&self) -> RunId {
        match self {
            AuditEvent::RunStarted { run } | AuditEvent::RunFinished { run, .. } => *run,
        }
    }
}

/// Thread-safe hand-off onto the interface's execution context
///
/// Called from both the submitting thread and worker threads; events
/// must be delivered in the order they are posted. `post` may run while
/// coordinator locks are held, so it must only enqueue: no blocking and no
/// calls back into the coordinator.
pub trait Dispatch: Send + Sync + 'static {
    fn post(&self, event: AuditEvent);
}

impl Dispatch for Sender<AuditEvent> {
    fn post(&self, event: AuditEvent) {
        // A closed receiver means the interface is gone; nothing to notify
        let _ = self.send(event);
    }
}

impl<F> Dispatch for F
where
    F: Fn(AuditEvent) + Send + Sync + 'static,
{
    fn post(&self, event: AuditEvent) {
        self(event)
    }
}
