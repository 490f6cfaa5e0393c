//! Demonstration caller for the SPSC FIFO.
//!
//! `sequential` fills a queue until it overflows, then drains it until it
//! underflows. `threaded` streams records from a producer thread to a
//! consumer that sleeps on a semaphore between records.

use clap::{Arg, Command, value_parser};
use spsc_fifo::{DEFAULT_CAPACITY, Error, Fifo, Semaphore};
use std::any::Any;
use std::sync::Arc;
use std::thread;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Records streamed in threaded mode unless `--count` says otherwise.
const DEFAULT_COUNT: u32 = 100_000;

/// Fixed-size record moved through the queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Record {
    value: u32,
}

fn cli() -> Command {
    Command::new("fifo-demo")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Exercises the bounded SPSC FIFO.")
        .arg(
            Arg::new("capacity")
                .short('c')
                .long("capacity")
                .value_name("SLOTS")
                .value_parser(value_parser!(usize))
                .default_value(DEFAULT_CAPACITY.to_string())
                .help("Slots in the ring, one of which stays empty"),
        )
        .arg(
            Arg::new("mode")
                .short('m')
                .long("mode")
                .value_name("MODE")
                .value_parser(["sequential", "threaded"])
                .default_value("sequential")
                .help("Fill-then-drain on one thread, or stream across two"),
        )
        .arg(
            Arg::new("count")
                .short('n')
                .long("count")
                .value_name("N")
                .value_parser(value_parser!(u32))
                .default_value(DEFAULT_COUNT.to_string())
                .help("Records to stream in threaded mode"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level (trace, debug, info, warn, error)"),
        )
}

fn main() {
    let matches = cli().get_matches();

    let filter = match matches.get_one::<String>("log-level") {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let capacity = *matches.get_one::<usize>("capacity").expect("defaulted by clap");
    let count = *matches.get_one::<u32>("count").expect("defaulted by clap");
    let result = match matches.get_one::<String>("mode").map(String::as_str) {
        Some("threaded") => run_threaded(capacity, count),
        _ => run_sequential(capacity),
    };

    if let Err(e) = result {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run_sequential(capacity: usize) -> Result<(), Error> {
    let (mut tx, mut rx) = Fifo::split::<Record>(capacity)?;

    let mut record = Record::default();
    loop {
        record.value += 1;
        match tx.push(record) {
            Ok(()) => info!("Write: {}", record.value),
            Err(e) => {
                info!("Write failed: {e}");
                break;
            }
        }
    }

    loop {
        match rx.pop() {
            Ok(record) => info!("Read: {}", record.value),
            Err(e) => {
                info!("Read failed: {e}");
                break;
            }
        }
    }
    Ok(())
}

fn run_threaded(capacity: usize, count: u32) -> Result<(), Error> {
    let ready = Arc::new(Semaphore::new(0));
    let (mut tx, mut rx) = Fifo::builder(capacity)
        .notifier(ready.clone())
        .split::<Record>()?;

    let producer = thread::spawn(move || {
        let mut overflows = 0u64;
        for value in 1..=count {
            let mut record = Record { value };
            while let Err(rejected) = tx.push(record) {
                overflows += 1;
                record = rejected.into_inner();
                std::hint::spin_loop();
            }
        }
        overflows
    });

    let mut checksum = 0u64;
    let mut in_order = true;
    for expected in 1..=count {
        // One permit per successful push, so the pop below cannot underflow.
        ready.wait();
        let record = rx.pop()?;
        if record.value != expected {
            error!(expected, got = record.value, "records arrived out of order");
            in_order = false;
        }
        checksum += u64::from(record.value);
    }

    let overflows = match producer.join() {
        Ok(overflows) => overflows,
        Err(payload) => {
            error!(reason = panic_reason(payload.as_ref()), "producer thread panicked");
            return Ok(());
        }
    };
    let want = u64::from(count) * (u64::from(count) + 1) / 2;
    if in_order && checksum == want {
        info!(count, checksum, overflows, "stream finished");
    } else {
        error!(count, checksum, want, overflows, "stream corrupted");
    }
    Ok(())
}

/// Message carried by a thread's panic payload.
fn panic_reason(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic payload")
}
