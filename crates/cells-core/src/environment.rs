//! Process-wide registry of cells; emit/subscribe/request routing, shutdown
//! (spec §4.5).
//!
//! # Mental model
//!
//! Unlike [`crate::cell::Cell`] and [`crate::scene::Scene`], the environment
//! is not its own actor: the only process-wide mutable state is the cell
//! registry, and it is guarded by a single lock rather than routed through a
//! channel, per the resource model's "protected by a single synchronisation
//! barrier". Everything else — subscriber sets, mailboxes — is still owned
//! and mutated exclusively by each cell's own task.
//!
//! # Invariants
//!
//! - `start_cell` either registers a running cell or registers nothing.
//! - Topology changes (`subscribe`/`unsubscribe`) are forwarded to the
//!   target cell's own loop, so they never race with that cell's own event
//!   processing.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::cell::{Behavior, Cell, CellConfig, CellHandle};
use crate::config::EnvironmentConfig;
use crate::error::{CellsError, Result};
use crate::event::{Event, ResponseSink};
use crate::id::CellId;
use crate::payload::{Payload, Value};
use crate::scene::SceneHandle;

struct Inner {
	cells: Mutex<HashMap<CellId, CellHandle>>,
	config: EnvironmentConfig,
}

/// Cheap-to-clone capability for addressing an [`Environment`]'s cells.
///
/// This is what a [`crate::cell::Context`] carries so a behavior can reach
/// any other cell by id, not just its own subscribers.
#[derive(Clone)]
pub struct EnvironmentHandle(Arc<Inner>);

impl EnvironmentHandle {
	/// Starts a cell running `behavior` under `id`.
	///
	/// Blocks until `Behavior::init` has completed; returns only once the
	/// cell is `Running` or has failed to start.
	///
	/// # Errors
	///
	/// Returns [`CellsError::DuplicateCell`] if `id` is already registered,
	/// or propagates `init`'s failure.
	pub async fn start_cell(&self, id: CellId, behavior: Box<dyn Behavior>) -> Result<()> {
		if self.0.cells.lock().contains_key(&id) {
			return Err(CellsError::DuplicateCell(id));
		}

		let config = CellConfig {
			mailbox_capacity: self.0.config.mailbox_capacity,
			backpressure: self.0.config.backpressure,
			max_failures: self.0.config.max_failures,
			crash_window: self.0.config.crash_window,
			monitor: self.0.config.monitor.clone(),
		};

		let (handle, init_result) = Cell::start(id.clone(), behavior, self.clone(), config).await;
		init_result?;

		let mut cells = self.0.cells.lock();
		if cells.contains_key(&id) {
			drop(cells);
			let _ = handle.kill().await;
			return Err(CellsError::DuplicateCell(id));
		}
		cells.insert(id, handle);
		Ok(())
	}

	/// Requests a graceful stop of `id`: drains its mailbox, runs
	/// `terminate`, then removes it from the registry. Idempotent in the
	/// sense that stopping an already-unknown id simply errors.
	///
	/// # Errors
	///
	/// Returns [`CellsError::UnknownCell`] if `id` is not registered.
	pub async fn stop_cell(&self, id: &CellId) -> Result<()> {
		let handle = self
			.0
			.cells
			.lock()
			.remove(id)
			.ok_or_else(|| CellsError::UnknownCell(id.clone()))?;
		handle.stop().await
	}

	/// Atomically adds `subscribers` to `emitter`'s subscriber set.
	///
	/// # Errors
	///
	/// Returns [`CellsError::UnknownCell`] if `emitter` or any of
	/// `subscribers` is not registered.
	pub async fn subscribe(&self, emitter: &CellId, subscribers: Vec<CellId>) -> Result<()> {
		let emitter_handle = {
			let cells = self.0.cells.lock();
			for sub in &subscribers {
				if !cells.contains_key(sub) {
					return Err(CellsError::UnknownCell(sub.clone()));
				}
			}
			cells.get(emitter).cloned().ok_or_else(|| CellsError::UnknownCell(emitter.clone()))?
		};
		emitter_handle.subscribe(subscribers).await
	}

	/// Removes `subscribers` from `emitter`'s subscriber set; unknown ids
	/// among `subscribers` are ignored.
	///
	/// # Errors
	///
	/// Returns [`CellsError::UnknownCell`] if `emitter` is not registered.
	pub async fn unsubscribe(&self, emitter: &CellId, subscribers: Vec<CellId>) -> Result<()> {
		self.cell_handle(emitter)?.unsubscribe(subscribers).await
	}

	/// Enqueues `event` onto `id`'s mailbox.
	///
	/// # Errors
	///
	/// Returns [`CellsError::UnknownCell`] if `id` is not registered, or the
	/// cell's configured backpressure error if its mailbox is full.
	pub async fn emit(&self, id: CellId, event: Event) -> Result<()> {
		self.cell_handle(&id)?.emit(event).await
	}

	/// Builds and enqueues a fresh event onto `id`'s mailbox.
	///
	/// # Errors
	///
	/// Propagates [`CellsError::InvalidTopic`] or [`EnvironmentHandle::emit`]'s errors.
	pub async fn emit_new(
		&self,
		id: CellId,
		topic: impl AsRef<str>,
		payload: Payload,
		scene: Option<SceneHandle>,
	) -> Result<()> {
		self.emit(id, Event::new(topic, payload, scene)?).await
	}

	/// Synthesizes a single-shot response sink, emits a request event to
	/// `id`, and blocks until it resolves or `timeout` elapses.
	///
	/// # Errors
	///
	/// Returns [`CellsError::RequestTimeout`] if `timeout` elapses first,
	/// [`CellsError::NoResponse`] if the cell terminates without
	/// responding, or whatever error the responding behavior sent.
	pub async fn request(
		&self,
		id: CellId,
		topic: impl AsRef<str>,
		payload: Payload,
		scene: Option<SceneHandle>,
		timeout: Duration,
	) -> Result<Value> {
		let (sink, rx) = ResponseSink::channel();
		let event = Event::new(topic, payload, scene)?.with_responder(sink);
		self.emit(id.clone(), event).await?;

		match tokio::time::timeout(timeout, rx).await {
			Ok(Ok(result)) => result,
			Ok(Err(_)) => Err(CellsError::NoResponse),
			Err(_) => Err(CellsError::RequestTimeout(id)),
		}
	}

	/// Stops every registered cell. Ordering is unspecified; every
	/// `terminate` runs exactly once. Forced, not graceful: any in-flight
	/// request against a stopped cell fails with `Canceled` rather than
	/// waiting on a mailbox drain that's about to be discarded anyway.
	///
	/// # Errors
	///
	/// Never returns an error itself; individual cell stop failures are
	/// logged and otherwise ignored, matching "every terminate runs exactly
	/// once" regardless of any one cell's own shutdown outcome.
	pub async fn stop(&self) -> Result<()> {
		let handles: Vec<CellHandle> = self.0.cells.lock().drain().map(|(_, h)| h).collect();
		for handle in handles {
			if let Err(err) = handle.kill().await {
				tracing::warn!(cell_id = %handle.id(), %err, "cell stop failed during environment shutdown");
			}
		}
		Ok(())
	}

	/// The configuration this environment was started with.
	#[must_use]
	pub fn config(&self) -> &EnvironmentConfig {
		&self.0.config
	}

	/// Mints a fresh cell id via the configured [`crate::id::IdGenerator`].
	#[must_use]
	pub fn next_cell_id(&self) -> CellId {
		self.0.config.id_generator.next_cell_id()
	}

	fn cell_handle(&self, id: &CellId) -> Result<CellHandle> {
		self.0
			.cells
			.lock()
			.get(id)
			.cloned()
			.ok_or_else(|| CellsError::UnknownCell(id.clone()))
	}
}

/// Owning handle to a running cell mesh (spec §4.5).
///
/// Holds the same reference-counted state as the [`EnvironmentHandle`]s it
/// hands out; dropping it does not stop the environment — call
/// [`Environment::stop`] explicitly.
pub struct Environment(EnvironmentHandle);

impl Environment {
	/// Starts an empty environment.
	#[must_use]
	pub fn start(config: EnvironmentConfig) -> Self {
		Self(EnvironmentHandle(Arc::new(Inner {
			cells: Mutex::new(HashMap::new()),
			config,
		})))
	}

	/// Returns a cheap-to-clone handle for addressing this environment's cells.
	#[must_use]
	pub fn handle(&self) -> EnvironmentHandle {
		self.0.clone()
	}
}

impl std::ops::Deref for Environment {
	type Target = EnvironmentHandle;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

#[cfg(test)]
mod tests {
	use async_trait::async_trait;

	use super::*;
	use crate::cell::Context;

	struct Noop;

	#[async_trait]
	impl Behavior for Noop {
		async fn process_event(&mut self, _ctx: &Context, _event: Event) -> Result<()> {
			Ok(())
		}
	}

	#[tokio::test]
	async fn starting_a_duplicate_id_errors() {
		let env = Environment::start(EnvironmentConfig::default());
		env.start_cell(CellId::new("a").unwrap(), Box::new(Noop)).await.unwrap();
		let err = env.start_cell(CellId::new("a").unwrap(), Box::new(Noop)).await.unwrap_err();
		assert!(matches!(err, CellsError::DuplicateCell(_)));
	}

	#[tokio::test]
	async fn subscribing_an_unknown_id_errors() {
		let env = Environment::start(EnvironmentConfig::default());
		env.start_cell(CellId::new("a").unwrap(), Box::new(Noop)).await.unwrap();
		let err = env
			.subscribe(&CellId::new("a").unwrap(), vec![CellId::new("missing").unwrap()])
			.await
			.unwrap_err();
		assert!(matches!(err, CellsError::UnknownCell(_)));
	}

	#[tokio::test]
	async fn emit_to_unknown_cell_errors() {
		let env = Environment::start(EnvironmentConfig::default());
		let err = env
			.emit_new(CellId::new("ghost").unwrap(), "t", Payload::empty(), None)
			.await
			.unwrap_err();
		assert!(matches!(err, CellsError::UnknownCell(_)));
	}

	#[tokio::test]
	async fn stop_removes_every_cell() {
		let env = Environment::start(EnvironmentConfig::default());
		env.start_cell(CellId::new("a").unwrap(), Box::new(Noop)).await.unwrap();
		env.start_cell(CellId::new("b").unwrap(), Box::new(Noop)).await.unwrap();
		env.stop().await.unwrap();
		assert!((env.0).0.cells.lock().is_empty());
	}
}
