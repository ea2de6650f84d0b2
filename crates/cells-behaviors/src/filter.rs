//! Re-emits an event only if a caller-supplied predicate accepts it.

use async_trait::async_trait;
use cells_core::cell::{Behavior, Context};
use cells_core::error::Result;
use cells_core::event::Event;
use cells_core::id::CellId;

/// `true` forwards the event to subscribers; `false` drops it silently.
pub type Predicate = Box<dyn Fn(&CellId, &Event) -> bool + Send + Sync>;

/// Gatekeeper behavior: forward iff `predicate` accepts (spec §4.6).
pub struct Filter {
	predicate: Predicate,
}

impl Filter {
	#[must_use]
	pub fn new(predicate: Predicate) -> Self {
		Self { predicate }
	}
}

#[async_trait]
impl Behavior for Filter {
	async fn process_event(&mut self, ctx: &Context, event: Event) -> Result<()> {
		if (self.predicate)(ctx.id(), &event) {
			ctx.emit(event).await
		} else {
			Ok(())
		}
	}
}

#[cfg(test)]
mod tests {
	use cells_core::config::EnvironmentConfig;
	use cells_core::environment::Environment;
	use cells_core::payload::{Payload, Value};
	use rstest::rstest;

	use super::*;

	struct Sink(tokio::sync::mpsc::UnboundedSender<Event>);

	#[async_trait]
	impl Behavior for Sink {
		async fn process_event(&mut self, _ctx: &Context, event: Event) -> Result<()> {
			let _ = self.0.send(event);
			Ok(())
		}
	}

	#[tokio::test]
	async fn drops_events_the_predicate_rejects() {
		let env = Environment::start(EnvironmentConfig::default());
		let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
		env.start_cell(CellId::new("sink").unwrap(), Box::new(Sink(tx))).await.unwrap();

		let predicate: Predicate = Box::new(|_id, event| event.topic().as_str() == event.payload().get_string("d").unwrap_or(""));
		env.start_cell(CellId::new("filter").unwrap(), Box::new(Filter::new(predicate))).await.unwrap();
		env.subscribe(&CellId::new("filter").unwrap(), vec![CellId::new("sink").unwrap()]).await.unwrap();

		env.emit_new(CellId::new("filter").unwrap(), "keep", Payload::new([("d".into(), Value::from("keep"))]), None)
			.await
			.unwrap();
		env.emit_new(CellId::new("filter").unwrap(), "drop", Payload::new([("d".into(), Value::from("other"))]), None)
			.await
			.unwrap();
		env.emit_new(CellId::new("filter").unwrap(), "keep-again", Payload::new([("d".into(), Value::from("keep-again"))]), None)
			.await
			.unwrap();

		let first = rx.recv().await.unwrap();
		let second = rx.recv().await.unwrap();
		assert_eq!(first.topic().as_str(), "keep");
		assert_eq!(second.topic().as_str(), "keep-again");
	}

	#[rstest]
	#[case("door", "door", true)]
	#[case("door", "window", false)]
	#[case("", "", true)]
	#[case("lock!", "key", false)]
	fn predicate_matches_topic_against_payload_field(#[case] topic: &str, #[case] wanted: &str, #[case] expected: bool) {
		let event = Event::new(topic, Payload::new([("d".into(), Value::from(wanted))]), None).unwrap();
		let predicate: Predicate = Box::new(|_id, event| event.topic().as_str() == event.payload().get_string("d").unwrap_or(""));
		assert_eq!(predicate(&CellId::new("filter").unwrap(), &event), expected);
	}
}
