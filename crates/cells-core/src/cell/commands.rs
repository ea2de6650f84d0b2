use tokio::sync::oneshot;

use crate::error::Result;
use crate::id::CellId;

/// Control-plane commands accepted by a cell's loop, separate from the
/// event mailbox so topology changes and event processing interleave
/// through the same `select!` without either starving the other.
pub enum CellCtl {
	/// Add subscriber ids; errors if any id is unknown to the caller's view
	/// (the environment validates that before forwarding here).
	Subscribe {
		ids: Vec<CellId>,
		reply: oneshot::Sender<Result<()>>,
	},
	/// Remove subscriber ids; unknown ids are ignored.
	Unsubscribe {
		ids: Vec<CellId>,
		reply: oneshot::Sender<Result<()>>,
	},
	/// Snapshot of the current subscriber set, in insertion order.
	Subscribers { reply: oneshot::Sender<Vec<CellId>> },
	/// Request a graceful stop: drain the mailbox, then terminate.
	/// `force` skips draining and fails pending requests with `Canceled`.
	Stop {
		force: bool,
		reply: oneshot::Sender<Result<()>>,
	},
}
