//! A finite-state machine driven entirely by boxed closures-as-states
//! (spec §9): each state consumes one event and returns the next.

use std::sync::Arc;

use async_trait::async_trait;
use cells_core::cell::{Behavior, Context};
use cells_core::error::{CellsError, Result};
use cells_core::event::Event;
use cells_core::payload::{Payload, Value};

use crate::reserved;

/// One state: given the current event, decides the next state (`None` ends
/// the machine successfully) or fails it outright.
///
/// Takes `&mut Event` rather than `&Event` so a state can answer a request
/// (e.g. a status query specific to the machine it implements) via
/// [`Event::respond`] directly — that call is synchronous, so no async
/// capability needs to thread through the closure.
pub struct NextState(pub Box<dyn FnMut(&Context, &mut Event) -> (Option<NextState>, Result<()>) + Send>);

impl NextState {
	/// Wraps a plain closure as a state.
	pub fn new(f: impl FnMut(&Context, &mut Event) -> (Option<NextState>, Result<()>) + Send + 'static) -> Self {
		Self(Box::new(f))
	}
}

/// Closures-as-states behavior (spec §4.6, §9).
///
/// Once a state returns `None` or an error the machine is done; every
/// subsequent event is dropped. [`reserved::STATUS_QUERY`] answers with
/// `{done, error}` regardless of whether the machine has finished.
pub struct Fsm {
	state: Option<NextState>,
	done: bool,
	error: Option<CellsError>,
}

impl Fsm {
	#[must_use]
	pub fn new(initial: NextState) -> Self {
		Self {
			state: Some(initial),
			done: false,
			error: None,
		}
	}
}

#[async_trait]
impl Behavior for Fsm {
	async fn process_event(&mut self, ctx: &Context, mut event: Event) -> Result<()> {
		if event.topic().as_str() == reserved::STATUS_QUERY {
			let payload = Payload::new([
				("done".to_string(), Value::Bool(self.done)),
				(
					"error".to_string(),
					match &self.error {
						Some(e) => Value::Str(e.to_string()),
						None => Value::Bool(false),
					},
				),
			]);
			return event.respond(Ok(Value::Any(Arc::new(payload))));
		}

		if self.done {
			return Ok(());
		}

		let Some(mut current) = self.state.take() else {
			self.done = true;
			return Ok(());
		};

		let (next, result) = (current.0)(ctx, &mut event);
		match result {
			Ok(()) => {
				match next {
					Some(n) => self.state = Some(n),
					None => self.done = true,
				}
				Ok(())
			}
			Err(e) => {
				self.done = true;
				self.error = Some(e);
				Ok(())
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use cells_core::config::EnvironmentConfig;
	use cells_core::environment::Environment;
	use cells_core::id::CellId;

	use super::*;

	/// Coin-operated lock: `locked` accepts `coin!` (unlocks) or
	/// `button-press!` (stays locked); `unlocked` accepts `button-press!`
	/// (re-locks) or `coin!` (stays unlocked, "thank you").
	fn locked() -> NextState {
		NextState::new(|_ctx, event: &mut Event| match event.topic().as_str() {
			"coin!" => (Some(unlocked()), Ok(())),
			"button-press!" => (Some(locked()), Ok(())),
			other => (None, Err(CellsError::InvalidPayload(format!("illegal topic in state 'locked': {other}")))),
		})
	}

	fn unlocked() -> NextState {
		NextState::new(|_ctx, event: &mut Event| match event.topic().as_str() {
			"button-press!" => (Some(locked()), Ok(())),
			"coin!" => (Some(unlocked()), Ok(())),
			other => (None, Err(CellsError::InvalidPayload(format!("illegal topic in state 'unlocked': {other}")))),
		})
	}

	#[tokio::test]
	async fn unknown_topic_terminates_with_an_error_status() {
		let env = Environment::start(EnvironmentConfig::default());
		env.start_cell(CellId::new("lock").unwrap(), Box::new(Fsm::new(locked()))).await.unwrap();

		env.emit_new(CellId::new("lock").unwrap(), "screwdriver!", Payload::empty(), None).await.unwrap();

		let reply = env
			.request(CellId::new("lock").unwrap(), reserved::STATUS_QUERY, Payload::empty(), None, std::time::Duration::from_secs(1))
			.await
			.unwrap();
		let Value::Any(boxed) = reply else { panic!("expected Any") };
		let status = boxed.downcast_ref::<Payload>().unwrap();
		assert_eq!(status.get_bool("done"), Some(true));
		assert!(status.get_string("error").unwrap().contains("screwdriver!"));
	}

	#[tokio::test]
	async fn coin_then_button_cycles_back_to_locked() {
		let env = Environment::start(EnvironmentConfig::default());
		env.start_cell(CellId::new("lock").unwrap(), Box::new(Fsm::new(locked()))).await.unwrap();

		env.emit_new(CellId::new("lock").unwrap(), "coin!", Payload::empty(), None).await.unwrap();
		env.emit_new(CellId::new("lock").unwrap(), "button-press!", Payload::empty(), None).await.unwrap();
		env.emit_new(CellId::new("lock").unwrap(), "button-press!", Payload::empty(), None).await.unwrap();

		let reply = env
			.request(CellId::new("lock").unwrap(), reserved::STATUS_QUERY, Payload::empty(), None, std::time::Duration::from_secs(1))
			.await
			.unwrap();
		let Value::Any(boxed) = reply else { panic!("expected Any") };
		let status = boxed.downcast_ref::<Payload>().unwrap();
		assert_eq!(status.get_bool("done"), Some(false));
	}
}
