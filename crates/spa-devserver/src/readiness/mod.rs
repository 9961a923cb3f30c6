//! Deciding when the development server is ready.
//!
//! A startup attempt moves from `Pending` to either `Ready` or `Failed`
//! exactly once. The [`ReadinessDetector`] runs one of two strategies that
//! write to a shared [`ReadinessSignal`]: parsing the child's output for a
//! marker line, or polling the listening port.

mod detector;
mod signal;

pub use detector::{Detection, ReadinessDetector, OUTPUT_TARGET};
pub use signal::{Readiness, ReadinessSignal};
