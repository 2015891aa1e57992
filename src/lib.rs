//! # Feedbook - Binary Market-Data Feed Handler
//!
//! This crate ingests a binary stream of equity market-data messages,
//! reconstructs per-symbol limit order books in real time, and emits
//! periodic top-of-book snapshots as CSV.
//!
//! ## Architecture
//!
//! The engine is a two-thread pipeline with a single lock-free handoff
//! point:
//!
//! - **Decoder**: memory-maps the feed file and yields a lazy sequence of
//!   validated events without per-event allocation
//! - **Ring**: a bounded wait-free SPSC queue carrying events from the
//!   decoder thread to the applier thread
//! - **OrderBook**: per-symbol book maintaining sorted price levels with
//!   aggregate quantities; crossing orders are rejected, not matched
//! - **Publisher**: periodic top-of-book CSV snapshots
//! - **LatencyTracker**: decode-to-apply deltas, reported as p50/p95/p99
//!
//! Data flow: `file -> Decoder -> Event -> SpscRing -> OrderBook ->
//! Publisher`. The ring is the only shared mutable state; everything else
//! is owned by exactly one thread.
//!
//! ## Example
//!
//! ```rust
//! use feedbook::book::OrderBook;
//! use feedbook::wire::Side;
//!
//! let mut book = OrderBook::new();
//! book.reserve_orders(1000);
//!
//! assert!(book.on_add(1, Side::Buy, 100_000_000_000, 100)); // $100.00
//! assert!(book.on_add(2, Side::Sell, 101_000_000_000, 200));
//!
//! let tob = book.top_of_book();
//! assert_eq!(tob.best_bid_px, 100_000_000_000);
//! assert_eq!(tob.bid_sz, 100);
//! assert_eq!(tob.best_ask_px, 101_000_000_000);
//! assert_eq!(tob.ask_sz, 200);
//! ```
pub mod book;
pub mod clock;
pub mod decoder;
pub mod metrics;
pub mod pipeline;
pub mod publish;
pub mod ring;
pub mod wire;
