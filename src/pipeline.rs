// src/pipeline.rs
//! Two-thread pipeline driver.
//!
//! The producer decodes events and pushes them through the SPSC ring; the
//! consumer (the calling thread) pops, routes each event to its book,
//! samples decode-to-apply latency, and drives the publish cadence. The
//! ring is the only shared mutable state; books, publisher, and tracker
//! are owned by the consumer.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use anyhow::{Context, Result};
use hashbrown::HashMap;
use tracing::{debug, info};

use crate::book::OrderBook;
use crate::clock;
use crate::decoder::Decoder;
use crate::metrics::LatencyTracker;
use crate::publish::TopOfBookPublisher;
use crate::ring::SpscRing;
use crate::wire::{Event, EventKind, Symbol};

pub const DEFAULT_RING_CAPACITY: usize = 1 << 20;

#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Minimum microseconds between top-of-book snapshot rounds.
    pub publish_interval_us: u64,
    /// Ring capacity; must be a power of two.
    pub ring_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            publish_interval_us: 1_000,
            ring_capacity: DEFAULT_RING_CAPACITY,
        }
    }
}

pub struct PipelineReport {
    /// Valid events that reached the consumer, including any drained on
    /// shutdown without being applied.
    pub messages_processed: u64,
    /// Events the books accepted.
    pub messages_applied: u64,
    pub elapsed_us: u64,
    pub latency: LatencyTracker,
}

impl PipelineReport {
    pub fn throughput_msgs_per_sec(&self) -> u64 {
        if self.elapsed_us == 0 {
            return 0;
        }
        (self.messages_processed as f64 / (self.elapsed_us as f64 / 1e6)) as u64
    }

    pub fn write_summary(&self, w: &mut impl Write) -> io::Result<()> {
        writeln!(w)?;
        writeln!(w, "Final Statistics:")?;
        writeln!(w, "Total messages processed: {}", self.messages_processed)?;
        writeln!(w, "Total time: {:.3} ms", self.elapsed_us as f64 / 1000.0)?;
        writeln!(w, "Throughput: {} msgs/s", self.throughput_msgs_per_sec())?;
        self.latency.write_report(w)
    }
}

/// Run the pipeline to decoder exhaustion or until `shutdown` is raised.
///
/// Events for symbols outside `symbols` count as processed but are never
/// applied. On shutdown, events still in the ring are drained and counted
/// without being applied. A final snapshot round for every configured
/// book is published before returning, so each run emits at least one row
/// per symbol.
pub fn run<W: Write>(
    decoder: &mut Decoder,
    symbols: &[Symbol],
    config: &PipelineConfig,
    shutdown: &AtomicBool,
    sink: W,
) -> Result<PipelineReport> {
    let ring: SpscRing<Event> = SpscRing::with_capacity(config.ring_capacity);
    // Stops the producer if the consumer bails on a sink error; without it
    // the scope would never join.
    let halt = AtomicBool::new(false);
    let producer_done = AtomicBool::new(false);

    let mut books: HashMap<Symbol, OrderBook> =
        symbols.iter().map(|&s| (s, OrderBook::new())).collect();
    let mut publisher = TopOfBookPublisher::new(sink);
    // Smallest record is 17 bytes, so this bounds the sample count.
    let mut latency = LatencyTracker::with_capacity(decoder.size() / 17 + 1);

    let mut processed: u64 = 0;
    let mut applied: u64 = 0;
    let start_us = clock::now_us();
    let mut last_publish_us = start_us;

    info!(
        symbols = symbols.len(),
        ring_capacity = config.ring_capacity,
        publish_interval_us = config.publish_interval_us,
        "pipeline starting"
    );

    thread::scope(|s| -> Result<()> {
        s.spawn(|| {
            produce(decoder, &ring, shutdown, &halt);
            producer_done.store(true, Ordering::Release);
        });

        let result = (|| -> Result<()> {
            loop {
                if shutdown.load(Ordering::Relaxed) {
                    break;
                }
                let Some(event) = ring.try_pop() else {
                    if producer_done.load(Ordering::Acquire) && ring.is_empty() {
                        break;
                    }
                    thread::yield_now();
                    continue;
                };

                processed += 1;
                if apply(&mut books, &event) {
                    applied += 1;
                    latency.record(clock::now_us().saturating_sub(event.decode_ts_us));
                }

                let now = clock::now_us();
                if now - last_publish_us >= config.publish_interval_us {
                    publish_all(&mut publisher, &books, now).context("write snapshot")?;
                    last_publish_us = now;
                }
            }
            Ok(())
        })();

        if result.is_err() {
            halt.store(true, Ordering::Relaxed);
        }
        result
    })?;

    // Anything the producer had in flight when we stopped: counted, not
    // applied.
    let mut drained: u64 = 0;
    while ring.try_pop().is_some() {
        drained += 1;
    }
    if drained > 0 {
        debug!(drained, "discarded in-flight events on shutdown");
        processed += drained;
    }

    let end_us = clock::now_us();
    publish_all(&mut publisher, &books, end_us).context("write final snapshot")?;

    Ok(PipelineReport {
        messages_processed: processed,
        messages_applied: applied,
        elapsed_us: end_us - start_us,
        latency,
    })
}

fn produce(decoder: &mut Decoder, ring: &SpscRing<Event>, shutdown: &AtomicBool, halt: &AtomicBool) {
    while !shutdown.load(Ordering::Relaxed) && !halt.load(Ordering::Relaxed) && decoder.has_next() {
        let event = decoder.next();
        if event.is_invalid() {
            continue;
        }
        let mut event = event;
        loop {
            match ring.try_push(event) {
                Ok(()) => break,
                Err(back) => {
                    if shutdown.load(Ordering::Relaxed) || halt.load(Ordering::Relaxed) {
                        return;
                    }
                    event = back;
                    thread::yield_now();
                }
            }
        }
    }
}

/// Route an event to its book and apply it. Only Add carries the symbol;
/// the rest are dispatched to the first configured book that accepts the
/// order id.
fn apply(books: &mut HashMap<Symbol, OrderBook>, event: &Event) -> bool {
    match event.kind {
        EventKind::Add {
            order_id,
            symbol,
            side,
            px_nano,
            qty,
            ..
        } => books
            .get_mut(&symbol)
            .map_or(false, |b| b.on_add(order_id, side, px_nano, qty)),
        EventKind::Modify {
            order_id,
            new_px_nano,
            new_qty,
            ..
        } => books
            .values_mut()
            .any(|b| b.on_modify(order_id, new_px_nano, new_qty)),
        EventKind::Execute {
            order_id, exec_qty, ..
        } => books.values_mut().any(|b| b.on_execute(order_id, exec_qty)),
        EventKind::Delete { order_id, .. } => {
            books.values_mut().any(|b| b.on_delete(order_id))
        }
        EventKind::Invalid => false,
    }
}

fn publish_all<W: Write>(
    publisher: &mut TopOfBookPublisher<W>,
    books: &HashMap<Symbol, OrderBook>,
    ts_us: u64,
) -> io::Result<()> {
    for (&symbol, book) in books.iter() {
        publisher.publish(ts_us, symbol, &book.top_of_book())?;
    }
    Ok(())
}
