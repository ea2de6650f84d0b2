//! The event envelope cells exchange, and its single-shot response sink.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::error::{CellsError, Result};
use crate::payload::{Payload, Topic, Value};
use crate::scene::SceneHandle;

/// Single-shot channel a request's caller uses to receive its answer.
///
/// Cheap to clone: every clone shares the same underlying `oneshot::Sender`,
/// so whichever clone calls [`ResponseSink::respond`] first wins and every
/// later call — from that clone or any other — returns
/// [`CellsError::AlreadyResponded`] instead of silently discarding the value.
#[derive(Debug, Clone)]
pub struct ResponseSink {
	tx: Arc<Mutex<Option<oneshot::Sender<Result<Value>>>>>,
	resolved: Arc<AtomicBool>,
}

impl ResponseSink {
	/// Creates a linked sink/receiver pair, as `Environment::request` does.
	#[must_use]
	pub fn channel() -> (Self, oneshot::Receiver<Result<Value>>) {
		let (tx, rx) = oneshot::channel();
		(
			Self {
				tx: Arc::new(Mutex::new(Some(tx))),
				resolved: Arc::new(AtomicBool::new(false)),
			},
			rx,
		)
	}

	/// Resolves the paired receiver with a value or error.
	///
	/// # Errors
	///
	/// Returns [`CellsError::AlreadyResponded`] if this sink (or a clone of
	/// it) already resolved.
	pub fn respond(&self, value: Result<Value>) -> Result<()> {
		if self.resolved.swap(true, Ordering::AcqRel) {
			return Err(CellsError::AlreadyResponded);
		}
		// The receiver may already be gone (caller timed out); that's not our error.
		if let Some(tx) = self.tx.lock().take() {
			let _ = tx.send(value);
		}
		Ok(())
	}
}

/// An immutable envelope carrying a topic, payload, optional scene, and
/// optional response sink (spec §3).
///
/// `Event` is cheap to pass by value: `Topic` and `Payload` are both
/// `Arc`-backed, and `scene` is a cloneable handle.
#[derive(Debug)]
pub struct Event {
	topic: Topic,
	payload: Payload,
	scene: Option<SceneHandle>,
	responder: Option<ResponseSink>,
}

impl Clone for Event {
	/// Clones the envelope for fan-out to multiple subscribers.
	///
	/// The responder is intentionally *not* duplicated: at most one
	/// subscriber may resolve a given request, so only the first clone in
	/// program order keeps it and the rest see `None`. Behaviors that need
	/// to respond should do so from the cell a request was addressed to,
	/// not from a forwarded copy.
	fn clone(&self) -> Self {
		Self {
			topic: self.topic.clone(),
			payload: self.payload.clone(),
			scene: self.scene.clone(),
			responder: None,
		}
	}
}

impl Event {
	/// Constructs a new event, validating that `topic` is non-empty.
	///
	/// # Errors
	///
	/// Returns [`CellsError::InvalidTopic`] if `topic` is empty.
	pub fn new(topic: impl AsRef<str>, payload: Payload, scene: Option<SceneHandle>) -> Result<Self> {
		Ok(Self {
			topic: Topic::new(topic)?,
			payload,
			scene,
			responder: None,
		})
	}

	/// Attaches a response sink, turning this event into a request.
	#[must_use]
	pub fn with_responder(mut self, responder: ResponseSink) -> Self {
		self.responder = Some(responder);
		self
	}

	/// The event's topic.
	#[must_use]
	pub fn topic(&self) -> &Topic {
		&self.topic
	}

	/// The event's payload.
	#[must_use]
	pub fn payload(&self) -> &Payload {
		&self.payload
	}

	/// The scene this event carries, if any.
	#[must_use]
	pub fn scene(&self) -> Option<&SceneHandle> {
		self.scene.as_ref()
	}

	/// Completes the pending request carried by this event, if any.
	///
	/// A no-op returning `Ok(())` if this event carries no responder — check
	/// [`Event::is_request`] first if the distinction matters to the caller.
	///
	/// # Errors
	///
	/// Returns [`CellsError::AlreadyResponded`] if called twice.
	pub fn respond(&mut self, value: Result<Value>) -> Result<()> {
		match self.responder.take() {
			Some(sink) => sink.respond(value),
			None => Ok(()),
		}
	}

	/// Whether this event carries a pending response sink.
	#[must_use]
	pub fn is_request(&self) -> bool {
		self.responder.is_some()
	}
}
