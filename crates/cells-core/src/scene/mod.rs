//! Correlated, timeout-bounded key/value store with wait/signal semantics.
//!
//! # Mental model
//!
//! A [`Scene`] is its own actor: one Tokio task owns all of its state
//! (`props`, flags, waiters) and every operation from spec §4.2 is a command
//! sent over a channel and answered on a paired `oneshot`, exactly the
//! handle/commands/service split used by every other actor in this crate.
//! Serializing everything through one task is what gives `flag`/`wait`
//! total ordering without a lock.
//!
//! # Invariants
//!
//! - Operations only succeed while the scene is `Active`; once it ends
//!   (`stop`, `abort`, or either timer firing) every subsequent operation
//!   fails with [`crate::error::CellsError::SceneEnded`].
//! - `flag(t)` wakes *all* waiters registered on `t` and clears the waiter
//!   list; `unflag(t)` clears the flag but never touches waiters.
//! - Cleanup functions registered via `store_clean`/`store_and_flag` all run
//!   on scene end, in insertion order, even if an earlier one errors; the
//!   first error becomes `CleanupFailed`.

mod commands;
mod handle;
mod service;

pub use commands::{CleanupFn, SceneCmd};
pub use handle::SceneHandle;
pub use service::{Scene, SceneConfig};
