use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use super::commands::{CleanupFn, SceneCmd};
use crate::error::{CellsError, Result};
use crate::payload::Value;

/// Handle for communicating with a [`super::Scene`] actor.
///
/// Cheap to clone; every `Event` that carries a scene holds one of these.
#[derive(Clone, Debug)]
pub struct SceneHandle {
	tx: mpsc::Sender<SceneCmd>,
}

impl SceneHandle {
	/// Wraps a command sender in a typed handle.
	#[must_use]
	pub fn new(tx: mpsc::Sender<SceneCmd>) -> Self {
		Self { tx }
	}

	async fn call<T>(
		&self,
		build: impl FnOnce(oneshot::Sender<Result<T>>) -> SceneCmd,
	) -> Result<T> {
		let (reply, rx) = oneshot::channel();
		self.tx
			.send(build(reply))
			.await
			.map_err(|_| CellsError::SceneEnded(crate::error::SceneEndReason::Stopped))?;
		rx.await
			.map_err(|_| CellsError::SceneEnded(crate::error::SceneEndReason::Stopped))?
	}

	/// Inserts `key -> value`; errors if `key` already exists.
	pub async fn store(&self, key: impl Into<String>, value: Value) -> Result<()> {
		self.call(|reply| SceneCmd::Store {
			key: key.into(),
			value,
			cleanup: None,
			reply,
		})
		.await
	}

	/// As [`SceneHandle::store`], additionally registering a cleanup function.
	pub async fn store_clean(
		&self,
		key: impl Into<String>,
		value: Value,
		cleanup: CleanupFn,
	) -> Result<()> {
		self.call(|reply| SceneCmd::Store {
			key: key.into(),
			value,
			cleanup: Some(cleanup),
			reply,
		})
		.await
	}

	/// `store` followed by `flag(key)`.
	pub async fn store_and_flag(&self, key: impl Into<String>, value: Value) -> Result<()> {
		let key = key.into();
		self.call(|reply| SceneCmd::StoreAndFlag {
			key,
			value,
			cleanup: None,
			reply,
		})
		.await
	}

	/// Reads a stored value; errors if `key` is absent.
	pub async fn fetch(&self, key: impl Into<String>) -> Result<Value> {
		let key = key.into();
		self.call(|reply| SceneCmd::Fetch { key, reply }).await
	}

	/// Removes a stored value, running its cleanup; errors if `key` is absent.
	pub async fn dispose(&self, key: impl Into<String>) -> Result<Value> {
		let key = key.into();
		self.call(|reply| SceneCmd::Dispose { key, reply }).await
	}

	/// Marks `tag` set, waking all current waiters on it.
	pub async fn flag(&self, tag: impl Into<String>) -> Result<()> {
		let tag = tag.into();
		self.call(|reply| SceneCmd::Flag { tag, reply }).await
	}

	/// Clears `tag`; existing waiters are left registered.
	pub async fn unflag(&self, tag: impl Into<String>) -> Result<()> {
		let tag = tag.into();
		self.call(|reply| SceneCmd::Unflag { tag, reply }).await
	}

	/// Returns immediately if `tag` is already flagged; otherwise blocks
	/// until `flag(tag)` is called or the scene ends.
	pub async fn wait_flag(&self, tag: impl Into<String>) -> Result<()> {
		let tag = tag.into();
		self.call(|reply| SceneCmd::WaitFlag { tag, reply }).await
	}

	/// As [`SceneHandle::wait_flag`], additionally failing with
	/// `WaitedTooLong` if `tag` is not flagged within `deadline`.
	pub async fn wait_flag_limited(&self, tag: impl Into<String>, deadline: Duration) -> Result<()> {
		let tag = tag.into();
		self.call(|reply| SceneCmd::WaitFlagLimited {
			tag,
			deadline,
			reply,
		})
		.await
	}

	/// Composite: wait for `tag`, then fetch it as a prop key.
	pub async fn wait_flag_and_fetch(&self, tag: impl Into<String>) -> Result<Value> {
		let tag = tag.into();
		self.wait_flag(tag.clone()).await?;
		self.fetch(tag).await
	}

	/// Ends the scene normally, running all registered cleanups.
	pub async fn stop(&self) -> Result<()> {
		self.call(|reply| SceneCmd::Stop { reply }).await
	}

	/// Ends the scene with an error, running all registered cleanups.
	pub async fn abort(&self, err: CellsError) -> Result<()> {
		self.call(|reply| SceneCmd::Abort { err, reply }).await
	}
}
