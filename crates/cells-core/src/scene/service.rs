use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use super::commands::{CleanupFn, SceneCmd};
use super::handle::SceneHandle;
use crate::error::{CellsError, Result, SceneEndReason, TimeoutKind};
use crate::id::SceneId;
use crate::payload::Value;

/// Tuning knobs for a single scene.
#[derive(Debug, Clone, Default)]
pub struct SceneConfig {
	/// Scene ends if no operation is accepted for this long. `None` disables it.
	pub inactivity: Option<Duration>,
	/// Scene ends this long after creation regardless of activity. `None` disables it.
	pub absolute: Option<Duration>,
}

struct PropEntry {
	value: Value,
	cleanup: Option<CleanupFn>,
}

struct Waiter {
	id: u64,
	reply: oneshot::Sender<Result<()>>,
}

/// Internal self-addressed message used to expire a timed-out waiter.
///
/// Not part of the public [`SceneCmd`] surface: a limited wait registers a
/// waiter the same way an unlimited one does, then arms a `tokio::time::sleep`
/// task that reports back on this channel if the wait is still pending when
/// the deadline elapses.
enum Internal {
	ExpireWaiter { tag: String, id: u64 },
}

/// Actor implementing the correlated key/value store described in spec §4.2.
pub struct Scene {
	id: SceneId,
	rx: mpsc::Receiver<SceneCmd>,
	internal_tx: mpsc::UnboundedSender<Internal>,
	internal_rx: mpsc::UnboundedReceiver<Internal>,
	props: HashMap<String, PropEntry>,
	flags: std::collections::HashSet<String>,
	waiters: HashMap<String, Vec<Waiter>>,
	next_waiter_id: u64,
	config: SceneConfig,
	ended: Option<SceneEndReason>,
	stop_reply: Option<oneshot::Sender<Result<()>>>,
}

impl Scene {
	/// Spawns the scene actor and returns a handle to it.
	#[must_use]
	pub fn start(id: SceneId, config: SceneConfig) -> SceneHandle {
		let (tx, rx) = mpsc::channel(64);
		let (internal_tx, internal_rx) = mpsc::unbounded_channel();

		let scene = Self {
			id,
			rx,
			internal_tx,
			internal_rx,
			props: HashMap::new(),
			flags: std::collections::HashSet::new(),
			waiters: HashMap::new(),
			next_waiter_id: 0,
			config,
			ended: None,
			stop_reply: None,
		};

		tokio::spawn(scene.run());
		SceneHandle::new(tx)
	}

	async fn run(mut self) {
		let started_at = Instant::now();
		let mut inactivity_deadline = self.config.inactivity.map(|d| started_at + d);
		let absolute_deadline = self.config.absolute.map(|d| started_at + d);

		loop {
			let inactivity_sleep = sleep_until_or_pending(inactivity_deadline);
			let absolute_sleep = sleep_until_or_pending(absolute_deadline);

			tokio::select! {
				cmd = self.rx.recv() => {
					let Some(cmd) = cmd else { break };
					if let Some(d) = self.config.inactivity {
						inactivity_deadline = Some(Instant::now() + d);
					}
					self.handle_cmd(cmd);
				}
				Some(internal) = self.internal_rx.recv() => {
					self.handle_internal(internal);
				}
				() = inactivity_sleep => {
					self.end(SceneEndReason::Timeout(TimeoutKind::Inactivity));
				}
				() = absolute_sleep => {
					self.end(SceneEndReason::Timeout(TimeoutKind::Absolute));
				}
			}

			if self.ended.is_some() {
				let cleanup_err = self.drain_remaining();
				if let Some(reply) = self.stop_reply.take() {
					let _ = reply.send(match cleanup_err {
						Some(e) => Err(e),
						None => Ok(()),
					});
				}
				break;
			}
		}

		tracing::debug!(scene_id = %self.id, "scene task exited");
	}

	fn handle_cmd(&mut self, cmd: SceneCmd) {
		if let Some(reason) = self.ended.clone() {
			reply_ended(cmd, reason);
			return;
		}

		match cmd {
			SceneCmd::Store {
				key,
				value,
				cleanup,
				reply,
			} => {
				let _ = reply.send(self.do_store(key, value, cleanup));
			}
			SceneCmd::StoreAndFlag {
				key,
				value,
				cleanup,
				reply,
			} => {
				let result = self.do_store(key.clone(), value, cleanup).map(|()| {
					self.do_flag(&key);
				});
				let _ = reply.send(result);
			}
			SceneCmd::Fetch { key, reply } => {
				let _ = reply.send(self.do_fetch(&key));
			}
			SceneCmd::Dispose { key, reply } => {
				let _ = reply.send(self.do_dispose(&key));
			}
			SceneCmd::Flag { tag, reply } => {
				self.do_flag(&tag);
				let _ = reply.send(Ok(()));
			}
			SceneCmd::Unflag { tag, reply } => {
				self.flags.remove(&tag);
				let _ = reply.send(Ok(()));
			}
			SceneCmd::WaitFlag { tag, reply } => {
				self.do_wait(tag, None, reply);
			}
			SceneCmd::WaitFlagLimited {
				tag,
				deadline,
				reply,
			} => {
				self.do_wait(tag, Some(deadline), reply);
			}
			SceneCmd::Stop { reply } => {
				self.end(SceneEndReason::Stopped);
				self.stop_reply = Some(reply);
			}
			SceneCmd::Abort { err, reply } => {
				self.end(SceneEndReason::Aborted(Arc::new(err)));
				self.stop_reply = Some(reply);
			}
		}
	}

	fn handle_internal(&mut self, internal: Internal) {
		let Internal::ExpireWaiter { tag, id } = internal;
		let Some(list) = self.waiters.get_mut(&tag) else {
			return;
		};
		if let Some(pos) = list.iter().position(|w| w.id == id) {
			let waiter = list.remove(pos);
			let _ = waiter.reply.send(Err(CellsError::WaitedTooLong(tag.clone())));
		}
		if list.is_empty() {
			self.waiters.remove(&tag);
		}
	}

	fn do_store(&mut self, key: String, value: Value, cleanup: Option<CleanupFn>) -> Result<()> {
		if self.props.contains_key(&key) {
			return Err(CellsError::PropAlreadyExists(key));
		}
		self.props.insert(key, PropEntry { value, cleanup });
		Ok(())
	}

	fn do_fetch(&self, key: &str) -> Result<Value> {
		self
			.props
			.get(key)
			.map(|p| p.value.clone())
			.ok_or_else(|| CellsError::PropNotFound(key.to_string()))
	}

	fn do_dispose(&mut self, key: &str) -> Result<Value> {
		let entry = self
			.props
			.remove(key)
			.ok_or_else(|| CellsError::PropNotFound(key.to_string()))?;
		if let Some(cleanup) = &entry.cleanup {
			cleanup(key, &entry.value).map_err(|e| {
				CellsError::CleanupFailed(key.to_string(), e.to_string())
			})?;
		}
		Ok(entry.value)
	}

	fn do_flag(&mut self, tag: &str) {
		self.flags.insert(tag.to_string());
		if let Some(list) = self.waiters.remove(tag) {
			for waiter in list {
				let _ = waiter.reply.send(Ok(()));
			}
		}
	}

	fn do_wait(&mut self, tag: String, deadline: Option<Duration>, reply: oneshot::Sender<Result<()>>) {
		if self.flags.contains(&tag) {
			let _ = reply.send(Ok(()));
			return;
		}

		let id = self.next_waiter_id;
		self.next_waiter_id += 1;
		self.waiters.entry(tag.clone()).or_default().push(Waiter { id, reply });

		if let Some(deadline) = deadline {
			let internal_tx = self.internal_tx.clone();
			tokio::spawn(async move {
				tokio::time::sleep(deadline).await;
				let _ = internal_tx.send(Internal::ExpireWaiter { tag, id });
			});
		}
	}

	fn end(&mut self, reason: SceneEndReason) {
		if self.ended.is_some() {
			return;
		}
		self.ended = Some(reason);
	}

	/// Wakes remaining waiters and runs remaining cleanups once the scene
	/// ends. Returns the first cleanup failure, if any — `stop`/`abort`
	/// surface it to their caller as `CleanupFailed`.
	fn drain_remaining(&mut self) -> Option<CellsError> {
		let reason = self.ended.clone().unwrap_or(SceneEndReason::Stopped);

		for (_, waiters) in self.waiters.drain() {
			for waiter in waiters {
				let _ = waiter.reply.send(Err(CellsError::SceneEnded(reason.clone())));
			}
		}

		let mut first_err = None;
		for (key, entry) in self.props.drain() {
			if let Some(cleanup) = &entry.cleanup {
				if let Err(e) = cleanup(&key, &entry.value) {
					tracing::warn!(scene_id = %self.id, key, error = %e, "cleanup failed during scene teardown");
					if first_err.is_none() {
						first_err = Some(CellsError::CleanupFailed(key.clone(), e.to_string()));
					}
				}
			}
		}
		first_err
	}
}

fn reply_ended(cmd: SceneCmd, reason: SceneEndReason) {
	let err = || CellsError::SceneEnded(reason.clone());
	match cmd {
		SceneCmd::Store { reply, .. } | SceneCmd::StoreAndFlag { reply, .. } => {
			let _ = reply.send(Err(err()));
		}
		SceneCmd::Fetch { reply, .. } | SceneCmd::Dispose { reply, .. } => {
			let _ = reply.send(Err(err()));
		}
		SceneCmd::Flag { reply, .. } | SceneCmd::Unflag { reply, .. } => {
			let _ = reply.send(Err(err()));
		}
		SceneCmd::WaitFlag { reply, .. } | SceneCmd::WaitFlagLimited { reply, .. } => {
			let _ = reply.send(Err(err()));
		}
		SceneCmd::Stop { reply } | SceneCmd::Abort { reply, .. } => {
			let _ = reply.send(Err(err()));
		}
	}
}

fn sleep_until_or_pending(
	deadline: Option<Instant>,
) -> std::pin::Pin<Box<dyn Future<Output = ()> + Send>> {
	match deadline {
		Some(deadline) => Box::pin(tokio::time::sleep_until(deadline)),
		None => Box::pin(std::future::pending()),
	}
}
