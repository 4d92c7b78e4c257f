//! Bounded buffer throughput and handoff latency benchmark.
//!
//! Usage:
//!     cargo run --release --bin buffer_bench
//!
//! Environment variables:
//!     PRODUCER_CPU=0  Pin producer to CPU 0 (default: 0)
//!     CONSUMER_CPU=2  Pin consumer to CPU 2 (default: 2)

use std::env;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use silo::buffer::BoundedBuffer;

const BUFFER_CAPACITY: usize = 1024;
const ITERATIONS: usize = 1 << 20;
const RTT_ITERATIONS: usize = 1 << 14;

type Payload = i32;

fn get_cpu_affinity() -> (Option<usize>, Option<usize>) {
    let producer_cpu = env::var("PRODUCER_CPU")
        .ok()
        .and_then(|s| s.parse().ok())
        .or(Some(0));
    let consumer_cpu = env::var("CONSUMER_CPU")
        .ok()
        .and_then(|s| s.parse().ok())
        .or(Some(2));
    (producer_cpu, consumer_cpu)
}

fn pin_to_cpu(cpu: Option<usize>) {
    if let Some(id) = cpu {
        core_affinity::set_for_current(core_affinity::CoreId { id });
    }
}

fn bench_throughput(producer_cpu: Option<usize>, consumer_cpu: Option<usize>) {
    let buffer = Arc::new(BoundedBuffer::<Payload>::new(BUFFER_CAPACITY));

    let consumer_buffer = Arc::clone(&buffer);
    let consumer_thread = thread::spawn(move || {
        pin_to_cpu(consumer_cpu);

        for expected in 0..ITERATIONS as Payload {
            let value = consumer_buffer.consume();
            if value != expected {
                panic!("Data corruption: expected {expected}, got {value}");
            }
        }
    });

    pin_to_cpu(producer_cpu);

    let start = Instant::now();

    for i in 0..ITERATIONS as Payload {
        buffer.produce(i);
    }

    consumer_thread.join().unwrap();
    let elapsed = start.elapsed();

    let ops_per_ms = ITERATIONS as u128 * 1_000_000 / elapsed.as_nanos();
    println!("{ops_per_ms} ops/ms");
}

fn bench_rtt(producer_cpu: Option<usize>, consumer_cpu: Option<usize>) {
    let forward = Arc::new(BoundedBuffer::<Payload>::new(1));
    let backward = Arc::new(BoundedBuffer::<Payload>::new(1));

    let responder_forward = Arc::clone(&forward);
    let responder_backward = Arc::clone(&backward);
    let responder = thread::spawn(move || {
        pin_to_cpu(consumer_cpu);

        for _ in 0..RTT_ITERATIONS {
            let value = responder_forward.consume();
            responder_backward.produce(value);
        }
    });

    pin_to_cpu(producer_cpu);

    let start = Instant::now();

    for i in 0..RTT_ITERATIONS as Payload {
        forward.produce(i);
        let _ = backward.consume();
    }

    let elapsed = start.elapsed();
    responder.join().unwrap();

    let rtt_ns = elapsed.as_nanos() / RTT_ITERATIONS as u128;
    println!("{rtt_ns} ns RTT");
}

fn main() {
    let (producer_cpu, consumer_cpu) = get_cpu_affinity();

    println!(
        "silo bounded buffer (capacity={BUFFER_CAPACITY}, iters={ITERATIONS}, rtt_iters={RTT_ITERATIONS}):"
    );
    bench_throughput(producer_cpu, consumer_cpu);
    bench_rtt(producer_cpu, consumer_cpu);
}
