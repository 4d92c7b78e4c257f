//! Runtime scaffolding for exercising the shared buffer.
//!
//! - `workload`: fixed population of one-shot producer and consumer threads.

pub mod workload;
