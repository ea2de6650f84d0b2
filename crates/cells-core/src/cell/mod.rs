//! Mailbox + behavior host + subscriber registry per cell identity (spec §4.4).
//!
//! # Mental model
//!
//! A [`Cell`] is one Tokio task owning one [`Behavior`]. Everything that can
//! change about a cell — its subscriber set, its lifecycle state, the events
//! it has queued — is owned by that single task; handles only ever talk to
//! it through channels, mirroring the actor split used by every other
//! service in this crate ([`crate::scene`], [`crate::environment`]).
//!
//! # Invariants
//!
//! - A cell processes at most one event at a time; `process_event` always
//!   completes (or fails) before the next one starts.
//! - The subscriber set is read and mutated only on the cell's own task.
//! - `Behavior::process_event` failures (errors or panics) are routed
//!   through a crash-window policy: fewer than `max_failures` incidents in
//!   the trailing window call `Behavior::recover`; reaching the budget
//!   terminates the cell with `UnrecoverableCrash` without calling it.

mod behavior;
mod commands;
mod handle;
mod mailbox;
mod service;
mod supervisor;

pub use behavior::{Behavior, Context, FailureInfo};
pub use handle::CellHandle;
pub use mailbox::{BackpressurePolicy, Mailbox};
pub use service::{Cell, CellConfig};
pub use supervisor::{CrashWindow, Verdict};

use crate::error::CellsError;

/// Lifecycle state of a [`Cell`] (spec §3, §4.4).
#[derive(Debug, Clone)]
pub enum CellState {
	/// `init` has not yet completed.
	Starting,
	/// Accepting and processing events normally.
	Running,
	/// A stop was requested; draining the mailbox before `terminate`.
	Stopping,
	/// Terminated normally, or by a `recover` failure carrying that error.
	Stopped(Option<CellsError>),
	/// Terminated because the crash-window policy exhausted its budget.
	Crashed(CellsError),
}
