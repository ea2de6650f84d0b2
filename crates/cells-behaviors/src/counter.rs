//! Tallies named counters derived from each event and forwards a
//! `counter:<name>` event per increment.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use cells_core::cell::{Behavior, Context};
use cells_core::error::Result;
use cells_core::event::Event;
use cells_core::id::CellId;
use cells_core::payload::{Payload, Value};

use crate::reserved;

/// Returns the names of the counters `event` should increment.
pub type CounterFn = Box<dyn Fn(&CellId, &Event) -> Vec<String> + Send + Sync>;

/// Current tallies, returned in answer to [`reserved::COUNTERS_QUERY`].
///
/// Wrapped in [`Value::Any`] since `Payload`'s value set has no map variant;
/// a caller downcasts the response with `.downcast_ref::<Counters>()`.
#[derive(Debug, Clone, Default)]
pub struct Counters(pub HashMap<String, i64>);

/// Derived-tally behavior (spec §4.6).
pub struct Counter {
	counter_fn: CounterFn,
	counts: HashMap<String, i64>,
}

impl Counter {
	#[must_use]
	pub fn new(counter_fn: CounterFn) -> Self {
		Self {
			counter_fn,
			counts: HashMap::new(),
		}
	}
}

#[async_trait]
impl Behavior for Counter {
	async fn process_event(&mut self, ctx: &Context, mut event: Event) -> Result<()> {
		match event.topic().as_str() {
			reserved::COUNTERS_QUERY => {
				let snapshot = Counters(self.counts.clone());
				event.respond(Ok(Value::Any(Arc::new(snapshot))))
			}
			reserved::RESET => {
				self.counts.clear();
				Ok(())
			}
			_ => {
				for name in (self.counter_fn)(ctx.id(), &event) {
					let value = self.counts.entry(name.clone()).or_insert(0);
					*value += 1;
					ctx.emit_new(format!("counter:{name}"), Payload::new([("value".to_string(), Value::Int(*value))]), event.scene().cloned())
						.await?;
				}
				Ok(())
			}
		}
	}
}
