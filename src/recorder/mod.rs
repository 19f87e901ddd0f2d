pub mod events;
pub mod recorder;
pub mod store;

pub use events::{ConsoleSink, EventSink, NullSink, RecorderEvent};
pub use recorder::CycleRecorder;
pub use store::{Row, RowStore};
