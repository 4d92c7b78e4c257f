//! Bounded-buffer worker demonstration.
//!
//! Launches the reference population (ten producers and ten consumers over a
//! ten-slot buffer, each holding the buffer for 100ms of simulated work) and
//! waits for every worker to finish. Prints one line per production and one
//! per consumption.
//!
//! # Usage
//!
//! ```sh
//! demo [--capacity N] [--producers N] [--consumers N] [--delay-ms N]
//! ```
//!
//! With the `tracing` feature enabled, worker lifecycle diagnostics go to
//! stderr:
//!
//! ```sh
//! RUST_LOG=silo=debug cargo run --features tracing --bin demo
//! ```

use std::time::Duration;

use silo::runtime::workload::{Workload, WorkloadConfig, WorkloadError};

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let config = match parse_args(&args) {
        Ok(config) => config,
        Err(msg) => {
            eprintln!("demo: {msg}");
            std::process::exit(2);
        }
    };

    if let Err(e) = run(config) {
        eprintln!("demo: {e}");
        std::process::exit(1);
    }
}

fn run(config: WorkloadConfig) -> Result<(), WorkloadError> {
    silo::init_tracing();

    let workload = Workload::spawn(config)?;
    workload.join();

    Ok(())
}

/// Parses command line flags into a `WorkloadConfig`.
fn parse_args(args: &[String]) -> Result<WorkloadConfig, String> {
    let mut config = WorkloadConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--capacity" => {
                config.capacity = parse_value(args, &mut i)?;
                if config.capacity == 0 {
                    return Err("capacity must be greater than 0".into());
                }
            }
            "--producers" => {
                config.producers = parse_value(args, &mut i)?;
            }
            "--consumers" => {
                config.consumers = parse_value(args, &mut i)?;
            }
            "--delay-ms" => {
                config.work_delay = Duration::from_millis(parse_value(args, &mut i)?);
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            arg => {
                return Err(format!("unknown argument: {arg}"));
            }
        }
        i += 1;
    }

    // A surplus on either side would wait on a permit that never arrives.
    if config.producers != config.consumers {
        return Err(format!(
            "producer and consumer counts must match ({} vs {})",
            config.producers, config.consumers
        ));
    }

    Ok(config)
}

/// Reads and parses the value following a flag, advancing the cursor.
fn parse_value<T: std::str::FromStr>(args: &[String], i: &mut usize) -> Result<T, String> {
    let flag = &args[*i];
    *i += 1;
    let Some(value) = args.get(*i) else {
        return Err(format!("missing value for {flag}"));
    };
    value
        .parse()
        .map_err(|_| format!("invalid value for {flag}: {value}"))
}

fn print_usage() {
    eprintln!(
        r#"demo - bounded-buffer worker demonstration

USAGE:
    demo [OPTIONS]

OPTIONS:
    --capacity <N>     Shared buffer capacity (default: 10)
    --producers <N>    Producer thread count (default: 10)
    --consumers <N>    Consumer thread count (default: 10)
    --delay-ms <N>     Simulated work delay per operation in ms (default: 100)
    -h, --help         Print this help message

Producer and consumer counts must match; each worker runs exactly once.
"#
    );
}
