//! Fans every event out to the hosting cell's subscribers, unchanged.

use async_trait::async_trait;
use cells_core::cell::{Behavior, Context};
use cells_core::error::Result;
use cells_core::event::Event;

/// Forwards each event to every current subscriber (spec §4.6).
#[derive(Debug, Default, Clone, Copy)]
pub struct Broadcaster;

#[async_trait]
impl Behavior for Broadcaster {
	async fn process_event(&mut self, ctx: &Context, event: Event) -> Result<()> {
		ctx.emit(event).await
	}
}

#[cfg(test)]
mod tests {
	use cells_core::config::EnvironmentConfig;
	use cells_core::environment::Environment;
	use cells_core::id::CellId;
	use cells_core::payload::{Payload, Value};

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
	async fn forwards_to_every_subscriber() {
		let env = Environment::start(EnvironmentConfig::default());
		let (tx_a, mut rx_a) = tokio::sync::mpsc::unbounded_channel();
		let (tx_b, mut rx_b) = tokio::sync::mpsc::unbounded_channel();
		env.start_cell(CellId::new("a").unwrap(), Box::new(Sink(tx_a))).await.unwrap();
		env.start_cell(CellId::new("b").unwrap(), Box::new(Sink(tx_b))).await.unwrap();
		env.start_cell(CellId::new("src").unwrap(), Box::new(Broadcaster)).await.unwrap();
		env.subscribe(&CellId::new("src").unwrap(), vec![CellId::new("a").unwrap(), CellId::new("b").unwrap()])
			.await
			.unwrap();

		env.emit_new(CellId::new("src").unwrap(), "ping", Payload::new([("n".into(), Value::Int(1))]), None)
			.await
			.unwrap();

		let got_a = rx_a.recv().await.unwrap();
		let got_b = rx_b.recv().await.unwrap();
		assert_eq!(got_a.topic().as_str(), "ping");
		assert_eq!(got_b.topic().as_str(), "ping");
	}
}
