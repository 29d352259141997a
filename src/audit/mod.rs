//! Audit coordination: requests, notifications and the single-flight runner

pub mod coordinator;
pub mod events;
pub mod request;

pub use coordinator::{Coordinator, CoordinatorState};
pub use events::{AuditEvent, Dispatch, RunId};
pub use request::{AuditRequest, Rate, DEFAULT_RATE, MAX_RATE, MIN_RATE};
