//! Error kinds for the cells runtime.

use std::sync::Arc;

use thiserror::Error;

use crate::id::CellId;

/// Errors produced by the cells runtime (spec §7).
#[derive(Debug, Error, Clone)]
pub enum CellsError {
	/// `startCell` was called with an id already registered in the environment.
	#[error("cell {0:?} already exists")]
	DuplicateCell(CellId),

	/// An operation named a cell id the environment has no record of.
	#[error("cell {0:?} is unknown")]
	UnknownCell(CellId),

	/// `stopCell`/`Environment::stop` was called on an environment already torn down.
	#[error("environment already stopped")]
	AlreadyStopped,

	/// A non-blocking emit found the target mailbox full.
	#[error("mailbox for {0:?} is full")]
	MailboxFull(CellId),

	/// `Environment::request` did not receive a response within its timeout.
	#[error("request to {0:?} timed out")]
	RequestTimeout(CellId),

	/// The operation was aborted by a forced shutdown.
	#[error("operation canceled")]
	Canceled,

	/// A response sink was dropped without ever being resolved.
	#[error("no response was ever sent for this request")]
	NoResponse,

	/// `Event::respond` was called a second time on the same event.
	#[error("response already sent for this event")]
	AlreadyResponded,

	/// `Behavior::init` returned an error.
	#[error("behavior init failed for {0:?}: {1}")]
	BehaviorInitFailed(CellId, String),

	/// `Behavior::process_event` returned an error.
	#[error("behavior process_event failed for {0:?}: {1}")]
	BehaviorProcessFailed(CellId, String),

	/// The cell's crash-window policy exhausted its recovery budget.
	#[error("cell {0:?} crashed past its recovery budget and was terminated")]
	UnrecoverableCrash(CellId),

	/// A scene operation was attempted outside the `Active` state.
	#[error("scene ended: {0}")]
	SceneEnded(#[from] SceneEndReason),

	/// `fetch`/`dispose` named a prop key that is not present.
	#[error("prop {0:?} not found")]
	PropNotFound(String),

	/// `store`/`storeClean` named a prop key that already exists.
	#[error("prop {0:?} already exists")]
	PropAlreadyExists(String),

	/// A prop's cleanup function returned an error during `dispose`/`stop`/`abort`.
	#[error("cleanup for {0:?} failed: {1}")]
	CleanupFailed(String, String),

	/// `waitFlagLimited` exceeded its deadline before the flag was set.
	#[error("wait for flag {0:?} exceeded its deadline")]
	WaitedTooLong(String),

	/// `Event::new`/`Topic::try_from` was given an empty topic.
	#[error("topic must be non-empty")]
	InvalidTopic,

	/// `CellId::new` was given an empty string.
	#[error("cell id must be non-empty")]
	InvalidCellId,

	/// A payload failed to validate (e.g. a required conversion was ambiguous).
	#[error("invalid payload: {0}")]
	InvalidPayload(String),
}

/// Why a scene is no longer `Active` (spec §3, §4.2).
#[derive(Debug, Error, Clone)]
pub enum SceneEndReason {
	/// `Scene::stop` was called explicitly.
	#[error("scene was stopped")]
	Stopped,
	/// `Scene::abort` was called with the wrapped error.
	#[error("scene was aborted: {0}")]
	Aborted(Arc<CellsError>),
	/// An inactivity or absolute timer fired.
	#[error("scene timed out ({0})")]
	Timeout(TimeoutKind),
}

/// Which scene timer fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutKind {
	/// No operation was accepted for the configured inactivity duration.
	Inactivity,
	/// The absolute deadline (measured from scene start) elapsed.
	Absolute,
}

impl std::fmt::Display for TimeoutKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Inactivity => write!(f, "inactivity"),
			Self::Absolute => write!(f, "absolute"),
		}
	}
}

/// Convenience alias used throughout the runtime.
pub type Result<T> = std::result::Result<T, CellsError>;
