use std::io;
use std::thread;
use std::time::Duration;

use crossbeam::channel::bounded;
use stream_batcher::{console, stage, PipelineBuilder};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Number of integers the batch ring holds before new arrivals are dropped.
const RING_CAPACITY: usize = 10;
/// Fixed period of the batch stage's flush timer.
const FLUSH_INTERVAL: Duration = Duration::from_secs(5);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    info!("starting stream batcher");
    println!("Enter integers, one per line. Type '{}' to finish.", console::EXIT_TOKEN);

    let (source_tx, source_rx) = bounded(0);
    let source = thread::spawn(move || {
        let stdin = io::stdin();
        console::read_integers(stdin.lock(), io::stdout(), source_tx)
    });

    let pipeline = PipelineBuilder::new()
        .filter("non_negative", stage::non_negative)
        .filter("multiple_of_three", stage::nonzero_multiple_of_three)
        .batch(RING_CAPACITY, FLUSH_INTERVAL)
        .build()?;

    let running = pipeline.start(source_rx);
    let output = running.output();
    console::write_received(&output, io::stdout())?;

    running.wait()?;
    source
        .join()
        .map_err(|_| "source thread panicked")??;

    info!("stream batcher finished");
    Ok(())
}
