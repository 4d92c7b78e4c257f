//! Synchronization primitives for coordinating threads within one process.

pub mod semaphore;
