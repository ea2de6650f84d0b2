//! Common imports for crates building on top of this one.

pub use crate::cell::{BackpressurePolicy, Behavior, Cell, CellConfig, CellHandle, CellState, Context, FailureInfo};
pub use crate::config::EnvironmentConfig;
pub use crate::environment::{Environment, EnvironmentHandle};
pub use crate::error::{CellsError, Result, SceneEndReason, TimeoutKind};
pub use crate::event::{Event, ResponseSink};
pub use crate::id::{CellId, IdGenerator, SceneId, UuidV4Generator};
pub use crate::loop_::{Loop, LoopError, LoopHandle, LoopStatus, ShallStop};
pub use crate::monitor::{MeasureToken, Monitor, NullMonitor};
pub use crate::payload::{Payload, Topic, Value};
pub use crate::scene::{Scene, SceneConfig, SceneHandle};
