//! Property-based checks for the invariants spec §8 calls out as testable.

use std::collections::HashMap;
use std::time::Duration;

use cells_behaviors::{Broadcaster, Collected, Collector, Counter, Counters};
use cells_core::config::EnvironmentConfig;
use cells_core::environment::Environment;
use cells_core::error::CellsError;
use cells_core::event::ResponseSink;
use cells_core::id::{CellId, SceneId};
use cells_core::payload::{Payload, Value};
use cells_core::scene::{Scene, SceneConfig};
use proptest::prelude::*;

fn rt() -> tokio::runtime::Runtime {
	tokio::runtime::Builder::new_multi_thread().enable_all().build().unwrap()
}

async fn collected(env: &cells_core::environment::EnvironmentHandle, id: &str) -> Vec<Collected> {
	let reply = env
		.request(CellId::new(id).unwrap(), cells_behaviors::reserved::COLLECTED_QUERY, Payload::empty(), None, Duration::from_secs(1))
		.await
		.unwrap();
	let Value::Any(boxed) = reply else { panic!("expected Any") };
	boxed.downcast_ref::<Vec<Collected>>().unwrap().clone()
}

proptest! {
	/// Fan-out through a `Broadcaster` preserves each subscriber's view of the
	/// producer's emission order (and count) exactly.
	#[test]
	fn broadcaster_fanout_preserves_order_and_multiset(tags in prop::collection::vec("[a-z]{1,8}", 0..20)) {
		rt().block_on(async {
			let env = Environment::start(EnvironmentConfig::default());
			env.start_cell(CellId::new("bcast").unwrap(), Box::new(Broadcaster)).await.unwrap();
			env.start_cell(CellId::new("c1").unwrap(), Box::new(Collector::new(64))).await.unwrap();
			env.start_cell(CellId::new("c2").unwrap(), Box::new(Collector::new(64))).await.unwrap();
			env.subscribe(&CellId::new("bcast").unwrap(), vec![CellId::new("c1").unwrap(), CellId::new("c2").unwrap()]).await.unwrap();

			for tag in &tags {
				env.emit_new(CellId::new("bcast").unwrap(), "t", Payload::new([("tag".to_string(), Value::from(tag.as_str()))]), None)
					.await
					.unwrap();
			}

			for id in ["c1", "c2"] {
				let seen: Vec<String> = collected(&env, id).await.iter().map(|c| c.payload.get_string("tag").unwrap().to_string()).collect();
				prop_assert_eq!(&seen, &tags);
			}
			Ok(())
		})?;
	}

	/// Subscribe/unsubscribe changes are visible to the very next emitted
	/// event — no event is delivered to a subscriber that was removed before
	/// it was sent, nor dropped for one added before it was sent.
	#[test]
	fn subscription_changes_apply_atomically_to_the_next_emit(subscribed_at_step in prop::collection::vec(any::<bool>(), 0..16)) {
		rt().block_on(async {
			let env = Environment::start(EnvironmentConfig::default());
			env.start_cell(CellId::new("src").unwrap(), Box::new(Broadcaster)).await.unwrap();
			env.start_cell(CellId::new("watcher").unwrap(), Box::new(Collector::new(64))).await.unwrap();

			let mut currently_subscribed = false;
			let mut expected = 0usize;
			for want_subscribed in &subscribed_at_step {
				if *want_subscribed != currently_subscribed {
					if *want_subscribed {
						env.subscribe(&CellId::new("src").unwrap(), vec![CellId::new("watcher").unwrap()]).await.unwrap();
					} else {
						env.unsubscribe(&CellId::new("src").unwrap(), vec![CellId::new("watcher").unwrap()]).await.unwrap();
					}
					currently_subscribed = *want_subscribed;
				}
				env.emit_new(CellId::new("src").unwrap(), "t", Payload::empty(), None).await.unwrap();
				if currently_subscribed {
					expected += 1;
				}
			}

			prop_assert_eq!(collected(&env, "watcher").await.len(), expected);
			Ok(())
		})?;
	}

	/// A `ResponseSink` resolves at most once: whichever clone calls
	/// `respond` first wins the value, and every later call on any clone
	/// errors instead of silently overwriting it.
	#[test]
	fn response_sink_resolves_at_most_once(first in any::<i64>(), second in any::<i64>(), extra_attempts in 0usize..4) {
		let (sink, rx) = ResponseSink::channel();
		let clones: Vec<ResponseSink> = (0..extra_attempts).map(|_| sink.clone()).collect();

		sink.respond(Ok(Value::Int(first))).unwrap();
		let second_result = sink.clone().respond(Ok(Value::Int(second)));
		prop_assert!(matches!(second_result, Err(CellsError::AlreadyResponded)));

		for clone in &clones {
			prop_assert!(matches!(clone.respond(Ok(Value::Int(second))), Err(CellsError::AlreadyResponded)));
		}

		prop_assert!(matches!(rx.try_recv(), Ok(Ok(Value::Int(n))) if n == first));
	}

	/// A scene's props behave like a last-writer map with tombstoning on
	/// dispose: `fetch(k)` yields the value of the most recent successful
	/// `store`/`storeAndFlag` on `k` unless a `dispose(k)` happened since.
	#[test]
	fn scene_prop_identity_matches_store_dispose_history(
		ops in prop::collection::vec(
			prop_oneof![
				("[abc]", any::<i64>()).prop_map(|(k, v)| Op::Store(k, v)),
				"[abc]".prop_map(Op::Dispose),
			],
			0..24,
		),
	) {
		rt().block_on(async {
			let scene = Scene::start(SceneId::from_uuid(uuid::Uuid::nil()), SceneConfig::default());
			let mut model: HashMap<String, i64> = HashMap::new();

			for op in &ops {
				match op {
					Op::Store(k, v) => {
						let result = scene.store(k.clone(), Value::Int(*v)).await;
						if model.contains_key(k) {
							prop_assert!(matches!(result, Err(CellsError::PropAlreadyExists(_))));
						} else {
							prop_assert!(result.is_ok());
							model.insert(k.clone(), *v);
						}
					}
					Op::Dispose(k) => {
						let result = scene.dispose(k.clone()).await;
						if model.remove(k).is_some() {
							prop_assert!(result.is_ok());
						} else {
							prop_assert!(matches!(result, Err(CellsError::PropNotFound(_))));
						}
					}
				}
			}

			for key in ["a", "b", "c"] {
				let fetched = scene.fetch(key).await;
				match model.get(key) {
					Some(v) => prop_assert!(matches!(fetched, Ok(Value::Int(n)) if n == *v)),
					None => prop_assert!(matches!(fetched, Err(CellsError::PropNotFound(_)))),
				}
			}
			Ok(())
		})?;
	}

	/// `waitFlag(t)` resolves successfully iff `flag(t)` happened before the
	/// scene ended; otherwise it resolves with `SceneEnded` once `stop`
	/// tears the scene down.
	#[test]
	fn wait_flag_outcome_tracks_flag_before_stop_ordering(flag_before_stop in any::<bool>()) {
		rt().block_on(async {
			let scene = Scene::start(SceneId::from_uuid(uuid::Uuid::nil()), SceneConfig::default());
			let waiter_scene = scene.clone();
			let waiter = tokio::spawn(async move { waiter_scene.wait_flag("t").await });

			tokio::time::sleep(Duration::from_millis(10)).await;

			if flag_before_stop {
				scene.flag("t").await.unwrap();
			}
			scene.stop().await.unwrap();

			let outcome = waiter.await.unwrap();
			if flag_before_stop {
				prop_assert!(outcome.is_ok());
			} else {
				prop_assert!(matches!(outcome, Err(CellsError::SceneEnded(_))));
			}
			Ok(())
		})?;
	}

	/// `Counter`'s `counters?` reply reflects the exact bag of names produced
	/// across every processed event: tally per name equals how many times
	/// that name was returned by the counter function, summed over events.
	#[test]
	fn counter_tallies_match_the_multiset_of_returned_names(
		batches in prop::collection::vec(prop::collection::vec("[xyz]", 0..4), 0..16),
	) {
		rt().block_on(async {
			let env = Environment::start(EnvironmentConfig::default());
			let counter_fn: cells_behaviors::CounterFn = Box::new(|_id: &CellId, event: &cells_core::event::Event| {
				event
					.payload()
					.get("names")
					.and_then(|v| if let Value::Any(a) = v { a.downcast_ref::<Vec<String>>().cloned() } else { None })
					.unwrap_or_default()
			});
			env.start_cell(CellId::new("counter").unwrap(), Box::new(Counter::new(counter_fn))).await.unwrap();

			let mut model: HashMap<String, i64> = HashMap::new();
			for batch in &batches {
				for name in batch {
					*model.entry(name.clone()).or_insert(0) += 1;
				}
				let names: std::sync::Arc<dyn std::any::Any + Send + Sync> = std::sync::Arc::new(batch.clone());
				env.emit_new(CellId::new("counter").unwrap(), "ev", Payload::new([("names".to_string(), Value::Any(names))]), None)
					.await
					.unwrap();
			}

			let reply = env
				.request(CellId::new("counter").unwrap(), cells_behaviors::reserved::COUNTERS_QUERY, Payload::empty(), None, Duration::from_secs(1))
				.await
				.unwrap();
			let Value::Any(boxed) = reply else { panic!("expected Any") };
			let Counters(actual) = boxed.downcast_ref::<Counters>().unwrap().clone();

			prop_assert_eq!(actual.len(), model.len());
			for (name, count) in &model {
				prop_assert_eq!(actual.get(name).copied(), Some(*count));
			}
			Ok(())
		})?;
	}
}

#[derive(Debug, Clone)]
enum Op {
	Store(String, i64),
	Dispose(String),
}
