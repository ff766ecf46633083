//! Job identity, lifecycle and cancellation.
//!
//! The [`JobRegistry`] owns every job's state behind one reader/writer lock.
//! Callers only ever see [`Job`] snapshots; the cancellation token and the
//! handle of the running external process stay inside the registry and are
//! reachable by the executing task through its [`JobControl`].

mod control;
mod registry;
mod types;

pub use control::JobControl;
pub use registry::JobRegistry;
pub use types::{Job, JobError, JobEvent, JobKind, JobStatus};
