//! Fixed-population producer/consumer workload over a shared bounded buffer.
//!
//! # Architecture
//!
//! [`Workload::spawn`] launches one thread per worker, producers first:
//! - **Producer threads**: wait for a free slot, append one item, report it.
//! - **Consumer threads**: wait for a ready item, remove it, report it.
//!
//! Every worker performs its operation exactly once and exits; there is no
//! service loop and no cancellation path. [`Workload::join`] waits for the
//! whole population. With equal producer and consumer counts the run always
//! terminates: every append is matched by exactly one removal.
//!
//! Each worker writes one line to stdout from inside the buffer's critical
//! section, so lines never tear even though their relative order is up to
//! the scheduler.
//!
//! # Example
//!
//! ```no_run
//! use silo::runtime::workload::{Workload, WorkloadConfig};
//!
//! let workload = Workload::spawn(WorkloadConfig::default())?;
//! workload.join();
//! # Ok::<(), silo::runtime::workload::WorkloadError>(())
//! ```

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::buffer::BoundedBuffer;
use crate::trace::{debug, info};

/// Configuration for a workload run.
#[derive(Debug, Clone)]
pub struct WorkloadConfig {
    /// Shared buffer capacity.
    pub capacity: usize,
    /// Number of producer threads; each appends exactly one item.
    pub producers: usize,
    /// Number of consumer threads; each removes exactly one item.
    pub consumers: usize,
    /// Time each worker holds the buffer lock to simulate work.
    pub work_delay: Duration,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            capacity: 10,
            producers: 10,
            consumers: 10,
            work_delay: Duration::from_millis(100),
        }
    }
}

/// Error spawning the workload.
#[derive(Debug, thiserror::Error)]
pub enum WorkloadError {
    /// Failed to spawn a worker thread.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Handle to a running workload.
///
/// Workers start running as soon as [`Workload::spawn`] returns; the handle
/// only carries the join side and a view of the shared buffer.
pub struct Workload {
    buffer: Arc<BoundedBuffer<usize>>,
    handles: Vec<JoinHandle<()>>,
}

impl Workload {
    /// Spawns all producer threads, then all consumer threads.
    ///
    /// Worker ids are 1-based within each role; a producer appends its own
    /// id as the item payload.
    ///
    /// With `producers != consumers` the surplus side blocks forever and
    /// [`Workload::join`] never returns.
    ///
    /// # Errors
    ///
    /// Returns an error if a worker thread cannot be spawned.
    pub fn spawn(config: WorkloadConfig) -> Result<Self, WorkloadError> {
        info!(
            capacity = config.capacity,
            producers = config.producers,
            consumers = config.consumers,
            work_delay_ms = config.work_delay.as_millis() as u64,
            "workload starting"
        );

        let buffer = Arc::new(BoundedBuffer::new(config.capacity));
        let mut handles = Vec::with_capacity(config.producers + config.consumers);

        for id in 1..=config.producers {
            let buffer = Arc::clone(&buffer);
            let work_delay = config.work_delay;
            let handle = thread::Builder::new()
                .name(format!("silo-producer-{id}"))
                .spawn(move || produce_once(&buffer, id, work_delay))?;
            handles.push(handle);
        }

        for id in 1..=config.consumers {
            let buffer = Arc::clone(&buffer);
            let work_delay = config.work_delay;
            let handle = thread::Builder::new()
                .name(format!("silo-consumer-{id}"))
                .spawn(move || consume_once(&buffer, id, work_delay))?;
            handles.push(handle);
        }

        Ok(Self { buffer, handles })
    }

    /// Shared buffer the workers operate on.
    #[must_use]
    pub fn buffer(&self) -> &Arc<BoundedBuffer<usize>> {
        &self.buffer
    }

    /// Waits for every worker thread to exit.
    ///
    /// # Panics
    ///
    /// Panics if a worker thread panicked. The only panic path in a worker
    /// is a broken counting protocol.
    pub fn join(self) {
        for handle in self.handles {
            handle.join().expect("worker thread panicked");
        }
        info!("workload complete");
    }
}

/// Runs a single production: wait for a free slot, append, report, signal.
fn produce_once(buffer: &BoundedBuffer<usize>, id: usize, work_delay: Duration) {
    debug!(id, "producer waiting for a free slot");
    buffer.produce_with(id, || {
        println!("Producer {id} is producing...");
        thread::sleep(work_delay);
    });
    debug!(id, "producer done");
}

/// Runs a single consumption: wait for an item, remove it, report, signal.
fn consume_once(buffer: &BoundedBuffer<usize>, id: usize, work_delay: Duration) {
    debug!(id, "consumer waiting for an item");
    buffer.consume_with(|_| {
        println!("Consumer {id} is consuming...");
        thread::sleep(work_delay);
    });
    debug!(id, "consumer done");
}
