use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};

use crate::error::{CellsError, Result};
use crate::event::Event;
use crate::id::CellId;

use super::commands::CellCtl;
use super::mailbox::{BackpressurePolicy, Mailbox};
use super::CellState;

/// Handle for addressing a running cell.
///
/// Cheap to clone: everything it holds is reference-counted.
#[derive(Clone)]
pub struct CellHandle {
	id: CellId,
	mailbox: Arc<Mailbox>,
	ctl: mpsc::UnboundedSender<CellCtl>,
	policy: BackpressurePolicy,
	state: Arc<Mutex<CellState>>,
}

impl CellHandle {
	pub(crate) fn new(
		id: CellId,
		mailbox: Arc<Mailbox>,
		ctl: mpsc::UnboundedSender<CellCtl>,
		policy: BackpressurePolicy,
		state: Arc<Mutex<CellState>>,
	) -> Self {
		Self {
			id,
			mailbox,
			ctl,
			policy,
			state,
		}
	}

	#[must_use]
	pub fn id(&self) -> &CellId {
		&self.id
	}

	/// Enqueues `event` onto this cell's mailbox.
	///
	/// # Errors
	///
	/// Fails per the cell's configured [`BackpressurePolicy`] when the
	/// mailbox is full, or with [`CellsError::UnknownCell`] if the cell has
	/// already stopped.
	pub async fn emit(&self, event: Event) -> Result<()> {
		self.mailbox.push(&self.id, event, self.policy).await
	}

	/// Atomically adds subscriber ids to this cell's subscriber set.
	///
	/// # Errors
	///
	/// Fails if the cell has already stopped.
	pub async fn subscribe(&self, ids: Vec<CellId>) -> Result<()> {
		self.call(|reply| CellCtl::Subscribe { ids, reply }).await
	}

	/// Removes subscriber ids from this cell's subscriber set.
	///
	/// # Errors
	///
	/// Fails if the cell has already stopped.
	pub async fn unsubscribe(&self, ids: Vec<CellId>) -> Result<()> {
		self.call(|reply| CellCtl::Unsubscribe { ids, reply }).await
	}

	/// Snapshot of the current subscriber set, in insertion order.
	///
	/// # Errors
	///
	/// Fails if the cell has already stopped.
	pub async fn subscribers(&self) -> Result<Vec<CellId>> {
		let (reply, rx) = oneshot::channel();
		self.ctl
			.send(CellCtl::Subscribers { reply })
			.map_err(|_| CellsError::UnknownCell(self.id.clone()))?;
		rx.await.map_err(|_| CellsError::UnknownCell(self.id.clone()))
	}

	/// Current lifecycle state.
	///
	/// Reads a value the cell's own task publishes outside the command
	/// channel, the same way [`crate::loop_::Loop::status`] does — no round
	/// trip needed, and a reply is still available after the cell's task
	/// (and its control channel) has already exited.
	#[must_use]
	pub fn state(&self) -> CellState {
		self.state.lock().clone()
	}

	/// Requests a graceful stop: drains the mailbox, then terminates.
	///
	/// # Errors
	///
	/// Fails if the cell has already stopped.
	pub async fn stop(&self) -> Result<()> {
		self.call(|reply| CellCtl::Stop { force: false, reply }).await
	}

	/// Requests a forced stop: discards the mailbox and fails outstanding
	/// response sinks with `Canceled`.
	///
	/// # Errors
	///
	/// Fails if the cell has already stopped.
	pub async fn kill(&self) -> Result<()> {
		self.call(|reply| CellCtl::Stop { force: true, reply }).await
	}

	async fn call(&self, build: impl FnOnce(oneshot::Sender<Result<()>>) -> CellCtl) -> Result<()> {
		let (reply, rx) = oneshot::channel();
		self.ctl
			.send(build(reply))
			.map_err(|_| CellsError::UnknownCell(self.id.clone()))?;
		rx.await.map_err(|_| CellsError::UnknownCell(self.id.clone()))?
	}
}
