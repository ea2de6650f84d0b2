//! Emits a `tick!` event on a fixed interval via a background timer task.

use std::time::Duration;

use async_trait::async_trait;
use cells_core::cell::{Behavior, Context};
use cells_core::error::Result;
use cells_core::event::Event;
use cells_core::payload::{Payload, Value};

use crate::reserved;

/// Periodic-emission behavior (spec §4.6).
///
/// `init` spawns a task that emits `tick!` to this cell's own mailbox every
/// `interval`; `process_event` forwards each one it sees to subscribers.
/// The task is aborted in `terminate`.
pub struct Ticker {
	interval: Duration,
	task: Option<tokio::task::JoinHandle<()>>,
}

impl Ticker {
	#[must_use]
	pub fn new(interval: Duration) -> Self {
		Self { interval, task: None }
	}
}

#[async_trait]
impl Behavior for Ticker {
	async fn init(&mut self, ctx: &Context) -> Result<()> {
		let env = ctx.environment().clone();
		let id = ctx.id().clone();
		let interval = self.interval;
		self.task = Some(tokio::spawn(async move {
			let mut timer = tokio::time::interval(interval);
			timer.tick().await;
			loop {
				timer.tick().await;
				let payload = Payload::new([
					(reserved::TICKER_ID.to_string(), Value::Str(id.as_str().to_string())),
					(reserved::TICKER_TIME.to_string(), Value::Time(std::time::SystemTime::now())),
				]);
				if env.emit_new(id.clone(), reserved::TICK, payload, None).await.is_err() {
					break;
				}
			}
		}));
		Ok(())
	}

	async fn process_event(&mut self, ctx: &Context, event: Event) -> Result<()> {
		if event.topic().as_str() == reserved::TICK {
			ctx.emit(event).await
		} else {
			Ok(())
		}
	}

	async fn terminate(&mut self, _ctx: &Context) -> Result<()> {
		if let Some(task) = self.task.take() {
			task.abort();
		}
		Ok(())
	}
}
