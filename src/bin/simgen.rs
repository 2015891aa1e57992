// src/bin/simgen.rs
//! Feed simulator: writes a binary feed whose modify/execute/delete
//! messages always reference a live order on the same symbol, tracked in
//! a shadow book.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use feedbook::clock;
use feedbook::wire::{self, Side, Symbol};

#[derive(Parser, Debug)]
#[command(name = "simgen", version, about = "Generate a simulated binary market-data feed")]
struct Cli {
    /// Number of messages to generate.
    #[arg(long, default_value_t = 1_000_000)]
    messages: u64,

    /// Comma-separated list of symbols.
    #[arg(long, default_value = "AAPL,MSFT")]
    symbols: String,

    /// Output file path.
    #[arg(long, default_value = "data/sim.bin")]
    output: PathBuf,

    /// RNG seed for reproducible feeds.
    #[arg(long)]
    seed: Option<u64>,
}

struct ShadowOrder {
    order_id: u64,
    price: i64,
    qty: u32,
}

struct FeedGenerator {
    symbols: Vec<Symbol>,
    rng: StdRng,
    next_order_id: u64,
    base_px_nano: i64,
    // Live orders per symbol, indexed in step with `symbols`.
    active: Vec<Vec<ShadowOrder>>,
    scratch: Vec<u8>,
}

impl FeedGenerator {
    fn new(symbols: Vec<Symbol>, rng: StdRng) -> Self {
        let active = symbols.iter().map(|_| Vec::new()).collect();
        FeedGenerator {
            symbols,
            rng,
            next_order_id: 1,
            base_px_nano: 100_000_000_000, // $100.00
            active,
            scratch: Vec::with_capacity(wire::ADD_LEN),
        }
    }

    fn generate(&mut self, out: &mut impl Write, messages: u64) -> Result<()> {
        let mut ts_us = clock::now_us();
        for _ in 0..messages {
            ts_us += self.rng.gen_range(0..10);
            let sym = self.rng.gen_range(0..self.symbols.len());

            // ~40% add, ~20% each modify/execute/delete; forced add while
            // the symbol has no live orders.
            let roll: f64 = self.rng.gen();
            self.scratch.clear();
            if self.active[sym].is_empty() || roll < 0.4 {
                self.gen_add(ts_us, sym);
            } else if roll < 0.6 {
                self.gen_modify(ts_us, sym);
            } else if roll < 0.8 {
                self.gen_execute(ts_us, sym);
            } else {
                self.gen_delete(ts_us, sym);
            }
            out.write_all(&self.scratch)?;
        }
        Ok(())
    }

    fn gen_add(&mut self, ts_us: u64, sym: usize) {
        let order_id = self.next_order_id;
        self.next_order_id += 1;

        let side = if self.rng.gen_bool(0.5) {
            Side::Buy
        } else {
            Side::Sell
        };
        // Within +-5% of the base price.
        let factor = 0.95 + self.rng.gen::<f64>() * 0.1;
        let px_nano = (self.base_px_nano as f64 * factor) as i64;
        let qty = 100 + self.rng.gen_range(0..9900u32);

        wire::encode_add(
            &mut self.scratch,
            ts_us,
            order_id,
            self.symbols[sym],
            side,
            px_nano,
            qty,
        );
        self.active[sym].push(ShadowOrder {
            order_id,
            price: px_nano,
            qty,
        });
    }

    fn gen_modify(&mut self, ts_us: u64, sym: usize) {
        let idx = self.rng.gen_range(0..self.active[sym].len());
        let factor = 0.99 + self.rng.gen::<f64>() * 0.02;
        let qty_factor = 0.5 + self.rng.gen::<f64>();

        let order = &mut self.active[sym][idx];
        let new_px = (order.price as f64 * factor) as i64;
        let new_qty = ((order.qty as f64 * qty_factor) as u32).max(1);

        wire::encode_modify(&mut self.scratch, ts_us, order.order_id, new_px, new_qty);
        order.price = new_px;
        order.qty = new_qty;
    }

    fn gen_execute(&mut self, ts_us: u64, sym: usize) {
        let idx = self.rng.gen_range(0..self.active[sym].len());
        let fraction = 0.1 + self.rng.gen::<f64>() * 0.9;

        let order = &mut self.active[sym][idx];
        let exec_qty = ((order.qty as f64 * fraction) as u32).clamp(1, order.qty);

        wire::encode_execute(&mut self.scratch, ts_us, order.order_id, exec_qty);
        order.qty -= exec_qty;
        if order.qty == 0 {
            self.active[sym].swap_remove(idx);
        }
    }

    fn gen_delete(&mut self, ts_us: u64, sym: usize) {
        let idx = self.rng.gen_range(0..self.active[sym].len());
        let order_id = self.active[sym][idx].order_id;

        wire::encode_delete(&mut self.scratch, ts_us, order_id);
        self.active[sym].swap_remove(idx);
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let symbols: Vec<Symbol> = cli
        .symbols
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Symbol::new)
        .collect();
    anyhow::ensure!(!symbols.is_empty(), "--symbols must name at least one symbol");

    println!(
        "Generating {} messages for symbols: {}",
        cli.messages, cli.symbols
    );
    println!("Output file: {}", cli.output.display());

    if let Some(dir) = cli.output.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("create output directory {}", dir.display()))?;
        }
    }
    let file = File::create(&cli.output)
        .with_context(|| format!("create output file {}", cli.output.display()))?;
    let mut out = BufWriter::new(file);

    let rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let start = Instant::now();
    let mut generator = FeedGenerator::new(symbols, rng);
    generator.generate(&mut out, cli.messages)?;
    out.flush()?;
    let elapsed_ms = start.elapsed().as_millis().max(1);

    let bytes = std::fs::metadata(&cli.output)?.len();
    println!("Generated {} messages in {} ms", cli.messages, elapsed_ms);
    println!("File size: {bytes} bytes");
    println!(
        "Generation rate: {} msgs/s",
        cli.messages as u128 * 1000 / elapsed_ms
    );
    Ok(())
}
