//! Mirrors each event's payload into its carried scene, keyed by topic, and
//! flags it for any concurrent waiter.

use std::sync::Arc;

use async_trait::async_trait;
use cells_core::cell::{Behavior, Context};
use cells_core::error::Result;
use cells_core::event::Event;
use cells_core::payload::Value;

/// Scene-bridging behavior (spec §4.6). Events with no attached scene are
/// ignored, since there is nowhere to record them.
#[derive(Debug, Default, Clone, Copy)]
pub struct SceneStore;

#[async_trait]
impl Behavior for SceneStore {
	async fn process_event(&mut self, _ctx: &Context, event: Event) -> Result<()> {
		let Some(scene) = event.scene() else { return Ok(()) };
		scene
			.store_and_flag(event.topic().as_str(), Value::Any(Arc::new(event.payload().clone())))
			.await
	}
}

#[cfg(test)]
mod tests {
	use cells_core::config::EnvironmentConfig;
	use cells_core::environment::Environment;
	use cells_core::id::CellId;
	use cells_core::payload::Payload;
	use cells_core::scene::{Scene, SceneConfig};

	use super::*;

	#[tokio::test]
	async fn stores_the_payload_under_the_topic_and_flags_it() {
		let env = Environment::start(EnvironmentConfig::default());
		env.start_cell(CellId::new("store").unwrap(), Box::new(SceneStore)).await.unwrap();
		let scene = Scene::start(cells_core::id::SceneId::from_uuid(uuid::Uuid::nil()), SceneConfig::default());

		env.emit_new(
			CellId::new("store").unwrap(),
			"greeting",
			Payload::new([("text".to_string(), cells_core::payload::Value::from("hi"))]),
			Some(scene.clone()),
		)
		.await
		.unwrap();

		scene.wait_flag("greeting").await.unwrap();
		let stored = scene.fetch("greeting").await.unwrap();
		let Value::Any(boxed) = stored else { panic!("expected Any") };
		let payload = boxed.downcast_ref::<Payload>().unwrap();
		assert_eq!(payload.get_string("text"), Some("hi"));
	}
}
