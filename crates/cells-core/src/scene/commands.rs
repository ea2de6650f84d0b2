use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;

use crate::error::Result;
use crate::payload::Value;

/// A prop's cleanup function, invoked with its key and value on disposal.
pub type CleanupFn = Arc<dyn Fn(&str, &Value) -> Result<()> + Send + Sync>;

/// Commands accepted by the scene actor.
pub enum SceneCmd {
	/// Insert `key -> value`; errors if `key` already exists.
	Store {
		key: String,
		value: Value,
		cleanup: Option<CleanupFn>,
		reply: oneshot::Sender<Result<()>>,
	},
	/// `store` followed by `flag(key)`.
	StoreAndFlag {
		key: String,
		value: Value,
		cleanup: Option<CleanupFn>,
		reply: oneshot::Sender<Result<()>>,
	},
	/// Read a stored value; errors if absent.
	Fetch {
		key: String,
		reply: oneshot::Sender<Result<Value>>,
	},
	/// Remove a stored value, running its cleanup; errors if absent.
	Dispose {
		key: String,
		reply: oneshot::Sender<Result<Value>>,
	},
	/// Mark a tag set, waking all current waiters on it.
	Flag {
		tag: String,
		reply: oneshot::Sender<Result<()>>,
	},
	/// Clear a tag; existing waiters are left registered.
	Unflag {
		tag: String,
		reply: oneshot::Sender<Result<()>>,
	},
	/// Register interest in a tag, or resolve immediately if already flagged.
	WaitFlag {
		tag: String,
		reply: oneshot::Sender<Result<()>>,
	},
	/// As `WaitFlag`, but bounded by a deadline enforced by the caller.
	WaitFlagLimited {
		tag: String,
		deadline: Duration,
		reply: oneshot::Sender<Result<()>>,
	},
	/// End the scene normally, running all cleanups.
	Stop { reply: oneshot::Sender<Result<()>> },
	/// End the scene with an error, running all cleanups.
	Abort {
		err: crate::error::CellsError,
		reply: oneshot::Sender<Result<()>>,
	},
}
