pub mod identity;
pub mod sink;

pub use identity::{CounterFile, MemoryCounter};
pub use sink::{CsvFileSink, JsonLinesSink, MemorySink};
