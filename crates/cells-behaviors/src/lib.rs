//! Standard library of [`cells_core::cell::Behavior`] implementations:
//! broadcaster, filter, mapper, router, round-robin, counter, collector,
//! finite-state machine, ticker, callback, scene store, simple processor,
//! and configurator (spec §4.6).

pub mod broadcaster;
pub mod callback;
pub mod collector;
pub mod configurator;
pub mod counter;
pub mod filter;
pub mod fsm;
pub mod mapper;
pub mod reserved;
pub mod round_robin;
pub mod router;
pub mod scene_store;
pub mod simple_processor;
pub mod ticker;

pub use broadcaster::Broadcaster;
pub use callback::{Callback, CallbackFn};
pub use collector::{Collected, Collector};
pub use configurator::{Config, Configurator, LoadConfigFn, Validator};
pub use counter::{Counter, CounterFn, Counters};
pub use filter::{Filter, Predicate};
pub use fsm::{Fsm, NextState};
pub use mapper::{MapFn, Mapper};
pub use round_robin::RoundRobin;
pub use router::{Router, RouteFn};
pub use scene_store::SceneStore;
pub use simple_processor::{ProcessFn, SimpleProcessor};
pub use ticker::Ticker;
