//! Engine-wide building blocks: containers, background work dispatch and
//! instrumentation.

pub mod container;
pub mod metrics;
pub mod observer;
pub mod thread;
pub mod timer;

pub use metrics::{InMemoryMetrics, Metrics};
pub use timer::{ScopedTimer, Timer};
