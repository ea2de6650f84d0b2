//! Supervised cooperative task loop (spec §4.1).
//!
//! # Mental model
//!
//! A [`Loop`] owns exactly one Tokio task running a caller-supplied worker.
//! The worker is handed a [`LoopHandle`] it polls or `select!`s on at its own
//! suspension points to notice a stop request. If the worker panics, the
//! panic is captured here rather than allowed to unwind across the task
//! boundary and take the runtime down with it; `stop()` surfaces it as
//! [`LoopError::Recovered`]. The loop itself never restarts a crashed
//! worker — that policy belongs to the caller (see `cell::CellSupervisor`).

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use futures::FutureExt;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Status of a [`Loop`] as observed from outside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopStatus {
	/// The worker is running normally.
	Running,
	/// A stop has been requested but the worker has not yet returned.
	Stopping,
	/// The worker has returned (successfully, with an error, or via panic capture).
	Stopped,
}

/// The terminal error of a stopped [`Loop`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum LoopError {
	/// The worker itself returned an error.
	#[error("worker failed: {0}")]
	Worker(String),
	/// `Loop::kill` recorded this error before requesting shutdown.
	#[error("killed: {0}")]
	Killed(String),
	/// The worker panicked; the payload is its formatted panic message.
	#[error("worker panicked: {0}")]
	Recovered(String),
}

/// Read-only signal a worker uses to notice a stop request.
///
/// Cloning is cheap; all clones observe the same underlying signal.
#[derive(Clone)]
pub struct ShallStop {
	notify: Arc<Notify>,
	status: Arc<AtomicU8>,
}

const STATUS_RUNNING: u8 = 0;
const STATUS_STOPPING: u8 = 1;
const STATUS_STOPPED: u8 = 2;

impl ShallStop {
	/// Returns immediately if stop was already requested; otherwise waits for it.
	pub async fn wait(&self) {
		if self.is_set() {
			return;
		}
		self.notify.notified().await;
	}

	/// Non-blocking check of whether a stop has been requested.
	#[must_use]
	pub fn is_set(&self) -> bool {
		self.status.load(Ordering::Acquire) != STATUS_RUNNING
	}
}

/// The handle passed to a running worker.
#[derive(Clone)]
pub struct LoopHandle {
	shall_stop: ShallStop,
}

impl LoopHandle {
	/// Returns the stop signal the worker should poll at suspension points.
	#[must_use]
	pub fn shall_stop(&self) -> ShallStop {
		self.shall_stop.clone()
	}
}

struct Shared {
	notify: Arc<Notify>,
	status: Arc<AtomicU8>,
}

/// A supervised task wrapper around a long-running worker.
pub struct Loop {
	shared: Shared,
	join: JoinHandle<std::result::Result<(), LoopError>>,
	killed: Option<LoopError>,
}

impl Loop {
	/// Spawns `worker` on its own task, catching panics as [`LoopError::Recovered`].
	pub fn go<F, Fut>(worker: F) -> Self
	where
		F: FnOnce(LoopHandle) -> Fut + Send + 'static,
		Fut: Future<Output = std::result::Result<(), LoopError>> + Send + 'static,
	{
		let notify = Arc::new(Notify::new());
		let status = Arc::new(AtomicU8::new(STATUS_RUNNING));
		let handle = LoopHandle {
			shall_stop: ShallStop {
				notify: notify.clone(),
				status: status.clone(),
			},
		};

		let join = tokio::spawn(async move {
			match AssertUnwindSafe(worker(handle)).catch_unwind().await {
				Ok(result) => result,
				Err(panic) => Err(LoopError::Recovered(panic_message(&panic))),
			}
		});

		Self {
			shared: Shared { notify, status },
			join,
			killed: None,
		}
	}

	/// Requests shutdown and blocks until the worker returns.
	///
	/// Propagates the worker's terminal error, or a prior [`Loop::kill`]'s
	/// error if one was recorded.
	///
	/// # Errors
	///
	/// Returns the worker's or the killer's terminal [`LoopError`], if any.
	pub async fn stop(mut self) -> std::result::Result<(), LoopError> {
		self.request_stop();
		let result = (&mut self.join).await;
		let outcome = match result {
			Ok(worker_result) => worker_result,
			Err(join_err) if join_err.is_panic() => {
				Err(LoopError::Recovered(join_err.to_string()))
			}
			Err(join_err) => Err(LoopError::Recovered(join_err.to_string())),
		};
		match self.killed.take() {
			Some(killed) => Err(killed),
			None => outcome,
		}
	}

	/// Records `err` as the loop's terminal error and requests shutdown
	/// without waiting for the worker to return.
	pub fn kill(&mut self, err: LoopError) {
		self.killed = Some(err);
		self.request_stop();
	}

	/// Current status of the loop.
	#[must_use]
	pub fn status(&self) -> LoopStatus {
		if self.join.is_finished() {
			return LoopStatus::Stopped;
		}
		match self.shared.status.load(Ordering::Acquire) {
			STATUS_RUNNING => LoopStatus::Running,
			_ => LoopStatus::Stopping,
		}
	}

	fn request_stop(&self) {
		self.shared.status.store(STATUS_STOPPING, Ordering::Release);
		self.shared.notify.notify_waiters();
	}
}

pub(crate) fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
	if let Some(s) = panic.downcast_ref::<&str>() {
		(*s).to_string()
	} else if let Some(s) = panic.downcast_ref::<String>() {
		s.clone()
	} else {
		"non-string panic payload".to_string()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn stop_waits_for_worker_and_propagates_its_result() {
		let l = Loop::go(|handle| async move {
			handle.shall_stop().wait().await;
			Ok(())
		});
		assert!(l.stop().await.is_ok());
	}

	#[tokio::test]
	async fn worker_error_surfaces_from_stop() {
		let l = Loop::go(|_handle| async move { Err(LoopError::Worker("boom".into())) });
		let err = l.stop().await.unwrap_err();
		assert!(matches!(err, LoopError::Worker(msg) if msg == "boom"));
	}

	#[tokio::test]
	async fn panicking_worker_is_captured_not_propagated() {
		let l = Loop::go(|_handle| async move {
			panic!("kaboom");
			#[allow(unreachable_code)]
			Ok(())
		});
		let err = l.stop().await.unwrap_err();
		assert!(matches!(err, LoopError::Recovered(_)));
	}

	#[tokio::test]
	async fn kill_records_error_before_worker_returns() {
		let mut l = Loop::go(|handle| async move {
			handle.shall_stop().wait().await;
			Ok(())
		});
		l.kill(LoopError::Killed("operator requested".into()));
		let err = l.stop().await.unwrap_err();
		assert!(matches!(err, LoopError::Killed(msg) if msg == "operator requested"));
	}
}
