//! Bounded, policy-governed FIFO queue a cell's loop drains.

use std::collections::VecDeque;

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::error::{CellsError, Result};
use crate::event::Event;
use crate::id::CellId;

/// What happens when [`Mailbox::push`] finds the queue at capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackpressurePolicy {
	/// Wait for space to free up (the default).
	Block,
	/// Drop the event being pushed; the queue is unchanged.
	DropNewest,
	/// Evict the oldest queued event to make room for the new one.
	DropOldest,
	/// Fail the push immediately with [`CellsError::MailboxFull`].
	Error,
}

struct Inner {
	queue: VecDeque<Event>,
	capacity: usize,
	closed: bool,
}

/// A cell's bounded event queue.
///
/// Pushed to by any number of emitters concurrently, drained only by the
/// owning cell's own loop task — that asymmetry is what lets `pop` be a
/// plain `&self` method despite mutating the queue.
pub struct Mailbox {
	id: CellId,
	inner: Mutex<Inner>,
	readable: Notify,
	writable: Notify,
}

impl Mailbox {
	/// Creates an empty mailbox with the given capacity.
	#[must_use]
	pub fn new(id: CellId, capacity: usize) -> Self {
		Self {
			id,
			inner: Mutex::new(Inner {
				queue: VecDeque::with_capacity(capacity.min(256)),
				capacity,
				closed: false,
			}),
			readable: Notify::new(),
			writable: Notify::new(),
		}
	}

	/// Pushes `event`, applying `policy` if the mailbox is at capacity.
	///
	/// # Errors
	///
	/// Returns [`CellsError::UnknownCell`] if the mailbox has been closed, or
	/// [`CellsError::MailboxFull`] under [`BackpressurePolicy::Error`].
	pub async fn push(&self, id: &CellId, event: Event, policy: BackpressurePolicy) -> Result<()> {
		loop {
			let mut guard = self.inner.lock();
			if guard.closed {
				return Err(CellsError::UnknownCell(id.clone()));
			}
			if guard.queue.len() < guard.capacity {
				guard.queue.push_back(event);
				drop(guard);
				self.readable.notify_one();
				return Ok(());
			}
			match policy {
				BackpressurePolicy::DropNewest => return Ok(()),
				BackpressurePolicy::DropOldest => {
					guard.queue.pop_front();
					guard.queue.push_back(event);
					drop(guard);
					self.readable.notify_one();
					return Ok(());
				}
				BackpressurePolicy::Error => return Err(CellsError::MailboxFull(id.clone())),
				BackpressurePolicy::Block => {
					drop(guard);
					self.writable.notified().await;
				}
			}
		}
	}

	/// Waits for and removes the next event, or returns `None` once closed
	/// and drained.
	pub async fn pop(&self) -> Option<Event> {
		loop {
			let mut guard = self.inner.lock();
			if let Some(event) = guard.queue.pop_front() {
				drop(guard);
				self.writable.notify_one();
				return Some(event);
			}
			if guard.closed {
				return None;
			}
			drop(guard);
			self.readable.notified().await;
		}
	}

	/// Marks the mailbox closed; further pushes fail, `pop` drains what
	/// remains then returns `None`.
	pub fn close(&self) {
		self.inner.lock().closed = true;
		self.readable.notify_waiters();
		self.writable.notify_waiters();
	}

	/// Removes and returns every event still queued, without closing.
	///
	/// Used by forced shutdown to fail the drained events' response sinks
	/// with `Canceled` rather than silently discarding them.
	pub fn drain(&self) -> Vec<Event> {
		let mut guard = self.inner.lock();
		guard.queue.drain(..).collect()
	}

	#[must_use]
	pub fn id(&self) -> &CellId {
		&self.id
	}
}
