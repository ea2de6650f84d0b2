//! The `Behavior` contract a cell hosts, and the `Context` it runs with.

use async_trait::async_trait;

use crate::environment::EnvironmentHandle;
use crate::error::{CellsError, Result};
use crate::event::Event;
use crate::id::CellId;
use crate::payload::Payload;
use crate::scene::SceneHandle;

/// Human-readable description of what failed, passed to [`Behavior::recover`].
///
/// Carries an error's `Display` text or a captured panic message; the core
/// never needs more structure than that to decide whether to keep running.
pub type FailureInfo = String;

/// User-supplied logic hosted by a cell (spec §4.4).
///
/// The core calls these; a behavior never calls itself. `init` runs once
/// before any event, `process_event` once per dequeued event, `recover`
/// after a `process_event` failure that the crash-window policy allows to
/// continue, and `terminate` once before the cell is destroyed.
#[async_trait]
pub trait Behavior: Send {
	/// Runs once before the cell starts accepting events.
	///
	/// # Errors
	///
	/// An error here stops the cell before it ever reaches `Running`.
	async fn init(&mut self, ctx: &Context) -> Result<()> {
		let _ = ctx;
		Ok(())
	}

	/// Runs once per dequeued event.
	///
	/// # Errors
	///
	/// An error or panic here is reported to the crash-window supervisor,
	/// which decides between calling [`Behavior::recover`] and terminating
	/// the cell with [`crate::error::CellsError::UnrecoverableCrash`].
	async fn process_event(&mut self, ctx: &Context, event: Event) -> Result<()>;

	/// Runs once, before destruction, regardless of how the cell got there.
	async fn terminate(&mut self, ctx: &Context) -> Result<()> {
		let _ = ctx;
		Ok(())
	}

	/// Runs after a `process_event` failure the supervisor decided to
	/// tolerate. Returning `Ok` resumes normal processing; returning `Err`
	/// stops the cell with that error.
	///
	/// Refuses to recover by default — a behavior that wants to survive a
	/// tolerated crash must override this and say so explicitly.
	async fn recover(&mut self, ctx: &Context, info: FailureInfo) -> Result<()> {
		let _ = info;
		Err(CellsError::UnrecoverableCrash(ctx.id().clone()))
	}
}

/// Capability handle a behavior uses to address its environment and its own
/// subscribers (spec §4.4).
///
/// `subscribers` is a snapshot taken when the context was built for the
/// current call — "iteration sees a consistent snapshot" holds because a
/// cell processes at most one event at a time and its subscriber list is
/// mutated only by that same loop, between calls.
pub struct Context {
	id: CellId,
	subscribers: Vec<CellId>,
	environment: EnvironmentHandle,
}

impl Context {
	#[must_use]
	pub(crate) fn new(id: CellId, subscribers: Vec<CellId>, environment: EnvironmentHandle) -> Self {
		Self {
			id,
			subscribers,
			environment,
		}
	}

	/// This cell's own identity.
	#[must_use]
	pub fn id(&self) -> &CellId {
		&self.id
	}

	/// Enqueues `event` to every current subscriber of this cell.
	///
	/// Non-blocking unless a subscriber's mailbox is full, in which case the
	/// environment's configured backpressure policy applies.
	///
	/// # Errors
	///
	/// Propagates the first subscriber delivery failure; later subscribers
	/// are still attempted.
	pub async fn emit(&self, event: Event) -> Result<()> {
		let mut first_err = None;
		for sub in &self.subscribers {
			if let Err(e) = self.environment.emit(sub.clone(), event.clone()).await {
				if first_err.is_none() {
					first_err = Some(e);
				}
			}
		}
		match first_err {
			Some(e) => Err(e),
			None => Ok(()),
		}
	}

	/// Builds and emits a fresh event to this cell's subscribers.
	///
	/// # Errors
	///
	/// Propagates [`crate::error::CellsError::InvalidTopic`] or the first
	/// subscriber delivery failure.
	pub async fn emit_new(
		&self,
		topic: impl AsRef<str>,
		payload: Payload,
		scene: Option<SceneHandle>,
	) -> Result<()> {
		self.emit(Event::new(topic, payload, scene)?).await
	}

	/// Iterates the current subscriber identities in insertion order.
	pub fn subscribers_do(&self, mut f: impl FnMut(&CellId)) {
		for sub in &self.subscribers {
			f(sub);
		}
	}

	/// The full environment, for addressing other cells by id.
	#[must_use]
	pub fn environment(&self) -> &EnvironmentHandle {
		&self.environment
	}
}
