// src/bin/inspect.rs
use std::collections::HashSet;

use anyhow::Result;

use feedbook::decoder::Decoder;
use feedbook::wire::{EventKind, Symbol};

fn main() -> Result<()> {
    let path = std::env::args().nth(1).unwrap_or_else(|| "data/sim.bin".into());
    let mut dec = Decoder::open(&path)?;

    let mut symbols = HashSet::<Symbol>::new();
    let mut adds = 0u64;
    let mut modifies = 0u64;
    let mut executes = 0u64;
    let mut deletes = 0u64;
    let mut invalid = 0u64;

    while dec.has_next() {
        match dec.next().kind {
            EventKind::Add { symbol, .. } => {
                symbols.insert(symbol);
                adds += 1;
            }
            EventKind::Modify { .. } => modifies += 1,
            EventKind::Execute { .. } => executes += 1,
            EventKind::Delete { .. } => deletes += 1,
            EventKind::Invalid => invalid += 1,
        }
    }

    println!("bytes={}", dec.size());
    println!("unique_symbols={}", symbols.len());
    println!("add={adds}");
    println!("modify={modifies}");
    println!("execute={executes}");
    println!("delete={deletes}");
    println!("invalid={invalid}");
    Ok(())
}
