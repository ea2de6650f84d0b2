use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use crate::environment::EnvironmentHandle;
use crate::error::{CellsError, Result};
use crate::event::Event;
use crate::id::CellId;
use crate::loop_::panic_message;
use crate::monitor::{Monitor, NullMonitor};

use super::behavior::{Behavior, Context};
use super::commands::CellCtl;
use super::handle::CellHandle;
use super::mailbox::{BackpressurePolicy, Mailbox};
use super::supervisor::{CrashWindow, Verdict};
use super::CellState;

/// Tuning knobs passed to [`Cell::start`].
#[derive(Clone)]
pub struct CellConfig {
	/// Mailbox capacity.
	pub mailbox_capacity: usize,
	/// Policy applied when the mailbox is full.
	pub backpressure: BackpressurePolicy,
	/// Failures tolerated (recovered from) within `crash_window`.
	pub max_failures: u32,
	/// Trailing window over which `max_failures` is counted.
	pub crash_window: Duration,
	/// Measurement hook invoked around each `process_event`.
	pub monitor: Arc<dyn Monitor>,
}

impl Default for CellConfig {
	fn default() -> Self {
		Self {
			mailbox_capacity: 64,
			backpressure: BackpressurePolicy::Block,
			max_failures: 3,
			crash_window: Duration::from_secs(10),
			monitor: Arc::new(NullMonitor),
		}
	}
}

enum Outcome {
	Stopped(Option<CellsError>),
	Crashed(CellsError),
}

/// Actor hosting one [`Behavior`] (spec §4.4).
pub struct Cell {
	id: CellId,
	behavior: Box<dyn Behavior>,
	environment: EnvironmentHandle,
	mailbox: Arc<Mailbox>,
	ctl_rx: mpsc::UnboundedReceiver<CellCtl>,
	crash_window: CrashWindow,
	state: Arc<Mutex<CellState>>,
	monitor: Arc<dyn Monitor>,
}

impl Cell {
	/// Spawns the cell's task and returns its handle once `Behavior::init`
	/// has completed (successfully or not) — the same synchronous-from-the-
	/// caller's-viewpoint contract `Environment::start_cell` exposes.
	pub async fn start(
		id: CellId,
		behavior: Box<dyn Behavior>,
		environment: EnvironmentHandle,
		config: CellConfig,
	) -> (CellHandle, Result<()>) {
		let mailbox = Arc::new(Mailbox::new(id.clone(), config.mailbox_capacity));
		let (ctl_tx, ctl_rx) = mpsc::unbounded_channel();
		let state = Arc::new(Mutex::new(CellState::Starting));
		let cell_handle = CellHandle::new(id.clone(), mailbox.clone(), ctl_tx, config.backpressure, state.clone());

		let cell = Self {
			id,
			behavior,
			environment,
			mailbox,
			ctl_rx,
			crash_window: CrashWindow::new(config.max_failures, config.crash_window),
			state,
			monitor: config.monitor,
		};

		let (init_ack_tx, init_ack_rx) = oneshot::channel();
		tokio::spawn(cell.run(init_ack_tx));
		let init_result = init_ack_rx.await.unwrap_or(Err(CellsError::Canceled));
		(cell_handle, init_result)
	}

	async fn run(mut self, init_ack: oneshot::Sender<Result<()>>) {
		let mut subscribers: Vec<CellId> = Vec::new();

		let init_ctx = Context::new(self.id.clone(), subscribers.clone(), self.environment.clone());
		match catch(self.behavior.init(&init_ctx)).await {
			Ok(Ok(())) => {
				*self.state.lock() = CellState::Running;
				let _ = init_ack.send(Ok(()));
			}
			Ok(Err(e)) => {
				let err = CellsError::BehaviorInitFailed(self.id.clone(), e.to_string());
				let _ = init_ack.send(Err(err));
				return;
			}
			Err(panic) => {
				let err = CellsError::BehaviorInitFailed(self.id.clone(), panic_message(&panic));
				let _ = init_ack.send(Err(err));
				return;
			}
		}

		let mut outcome = None;
		let mut stop_reply = None;

		'main: loop {
			tokio::select! {
				maybe_event = self.mailbox.pop() => {
					let Some(event) = maybe_event else { break 'main };
					outcome = self.handle_event(&mut subscribers, event).await;
					if outcome.is_some() { break 'main; }
				}
				Some(cmd) = self.ctl_rx.recv() => {
					match cmd {
						CellCtl::Subscribe { ids, reply } => {
							for id in ids {
								if !subscribers.contains(&id) {
									subscribers.push(id);
								}
							}
							let _ = reply.send(Ok(()));
						}
						CellCtl::Unsubscribe { ids, reply } => {
							subscribers.retain(|s| !ids.contains(s));
							let _ = reply.send(Ok(()));
						}
						CellCtl::Subscribers { reply } => {
							let _ = reply.send(subscribers.clone());
						}
						CellCtl::Stop { force, reply } => {
							*self.state.lock() = CellState::Stopping;
							self.mailbox.close();
							if force {
								for mut event in self.mailbox.drain() {
									let _ = event.respond(Err(CellsError::Canceled));
								}
							} else {
								while let Some(event) = self.mailbox.pop().await {
									if let Some(o) = self.handle_event(&mut subscribers, event).await {
										outcome = Some(o);
										break;
									}
								}
							}
							stop_reply = Some(reply);
							break 'main;
						}
					}
				}
			}
		}

		let term_ctx = Context::new(self.id.clone(), subscribers, self.environment.clone());
		let term_result = catch(self.behavior.terminate(&term_ctx)).await;

		let crashed = matches!(outcome, Some(Outcome::Crashed(_)));
		let final_err = match (&outcome, term_result) {
			(Some(Outcome::Crashed(e)), _) => Some(e.clone()),
			(Some(Outcome::Stopped(e)), _) => e.clone(),
			(None, Ok(Ok(()))) => None,
			(None, Ok(Err(e))) => Some(e),
			(None, Err(panic)) => Some(CellsError::BehaviorProcessFailed(self.id.clone(), panic_message(&panic))),
		};

		*self.state.lock() = if crashed {
			CellState::Crashed(final_err.clone().unwrap_or(CellsError::UnrecoverableCrash(self.id.clone())))
		} else {
			CellState::Stopped(final_err.clone())
		};

		if let Some(reply) = stop_reply {
			let _ = reply.send(Ok(()));
		}

		tracing::debug!(cell_id = %self.id, error = ?final_err, "cell task exited");
	}

	/// Processes one event, routing any failure through the crash-window
	/// policy. Returns `Some` when the cell should stop.
	async fn handle_event(&mut self, subscribers: &mut Vec<CellId>, event: Event) -> Option<Outcome> {
		let ctx = Context::new(self.id.clone(), subscribers.clone(), self.environment.clone());
		let token = self.monitor.begin_measure(event.topic().as_str());
		let result = catch(self.behavior.process_event(&ctx, event)).await;
		token.end();
		match result {
			Ok(Ok(())) => None,
			Ok(Err(err)) => self.on_failure(&ctx, err.to_string()).await,
			Err(panic) => self.on_failure(&ctx, panic_message(&panic)).await,
		}
	}

	async fn on_failure(&mut self, ctx: &Context, info: String) -> Option<Outcome> {
		match self.crash_window.record(Instant::now()) {
			Verdict::Recover => match catch(self.behavior.recover(ctx, info)).await {
				Ok(Ok(())) => None,
				Ok(Err(err)) => Some(Outcome::Stopped(Some(err))),
				Err(panic) => Some(Outcome::Stopped(Some(CellsError::BehaviorProcessFailed(
					self.id.clone(),
					panic_message(&panic),
				)))),
			},
			Verdict::Terminate => Some(Outcome::Crashed(CellsError::UnrecoverableCrash(self.id.clone()))),
		}
	}
}

async fn catch<F: std::future::Future>(fut: F) -> std::result::Result<F::Output, Box<dyn std::any::Any + Send>> {
	AssertUnwindSafe(fut).catch_unwind().await
}
