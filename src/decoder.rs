// src/decoder.rs
//! Memory-mapped binary feed decoder.
//!
//! Records are read in place from the mapping; nothing is heap-allocated
//! per event. Resynchronization after an unknown tag byte is byte-wise
//! (the format has no framing markers), so the cursor advances by one and
//! the caller sees an `Invalid` event.

use std::fs::File;
use std::path::Path;

use anyhow::{bail, Context, Result};
use memmap2::Mmap;

use crate::clock;
use crate::wire::{self, Event, EventKind, Side, Symbol};

#[derive(Debug)]
pub struct Decoder {
    map: Mmap,
    pos: usize,
}

impl Decoder {
    /// Map the feed file read-only. Fails if the file is missing,
    /// unreadable, or empty.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Decoder> {
        let path = path.as_ref();
        let file =
            File::open(path).with_context(|| format!("open feed file {}", path.display()))?;
        let len = file
            .metadata()
            .with_context(|| format!("stat feed file {}", path.display()))?
            .len();
        if len == 0 {
            bail!("feed file {} is empty", path.display());
        }
        let map = unsafe { Mmap::map(&file) }
            .with_context(|| format!("mmap feed file {}", path.display()))?;
        Ok(Decoder { map, pos: 0 })
    }

    /// Total bytes in the feed file.
    #[inline]
    pub fn size(&self) -> usize {
        self.map.len()
    }

    /// Current cursor offset in bytes.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn has_next(&self) -> bool {
        self.pos < self.map.len()
    }

    /// Return the cursor to the start of the file for replay.
    pub fn reset(&mut self) {
        self.pos = 0;
    }

    /// Decode the next record, stamping it with a fresh decode timestamp.
    ///
    /// Cursor rules: a complete record advances by its declared size even
    /// when a field fails validation; a partial record at EOF advances to
    /// EOF; an unknown tag advances by a single byte.
    pub fn next(&mut self) -> Event {
        let decode_ts_us = clock::now_us();
        if self.pos >= self.map.len() {
            return Event {
                kind: EventKind::Invalid,
                decode_ts_us,
            };
        }

        let kind = match self.map[self.pos] {
            wire::TAG_ADD => self.decode_add(),
            wire::TAG_MODIFY => self.decode_modify(),
            wire::TAG_EXECUTE => self.decode_execute(),
            wire::TAG_DELETE => self.decode_delete(),
            _ => {
                self.pos += 1;
                EventKind::Invalid
            }
        };

        Event {
            kind,
            decode_ts_us,
        }
    }

    fn take(&mut self, len: usize) -> Option<&[u8]> {
        if self.pos + len > self.map.len() {
            // Truncated tail: nothing after this record can be framed.
            self.pos = self.map.len();
            return None;
        }
        let rec = &self.map[self.pos..self.pos + len];
        self.pos += len;
        Some(rec)
    }

    fn decode_add(&mut self) -> EventKind {
        let Some(rec) = self.take(wire::ADD_LEN) else {
            return EventKind::Invalid;
        };
        let ts_us = read_u64(&rec[1..9]);
        let order_id = read_u64(&rec[9..17]);
        let symbol = Symbol::from_wire(rec[17..23].try_into().unwrap());
        let side = Side::from_wire(rec[23]);
        let px_nano = read_i64(&rec[24..32]);
        let qty = read_u32(&rec[32..36]);

        let Some(side) = side else {
            return EventKind::Invalid;
        };
        if qty == 0 {
            return EventKind::Invalid;
        }
        EventKind::Add {
            ts_us,
            order_id,
            symbol,
            side,
            px_nano,
            qty,
        }
    }

    fn decode_modify(&mut self) -> EventKind {
        let Some(rec) = self.take(wire::MODIFY_LEN) else {
            return EventKind::Invalid;
        };
        let ts_us = read_u64(&rec[1..9]);
        let order_id = read_u64(&rec[9..17]);
        let new_px_nano = read_i64(&rec[17..25]);
        let new_qty = read_u32(&rec[25..29]);

        if new_qty == 0 {
            return EventKind::Invalid;
        }
        EventKind::Modify {
            ts_us,
            order_id,
            new_px_nano,
            new_qty,
        }
    }

    fn decode_execute(&mut self) -> EventKind {
        let Some(rec) = self.take(wire::EXECUTE_LEN) else {
            return EventKind::Invalid;
        };
        let ts_us = read_u64(&rec[1..9]);
        let order_id = read_u64(&rec[9..17]);
        let exec_qty = read_u32(&rec[17..21]);

        if exec_qty == 0 {
            return EventKind::Invalid;
        }
        EventKind::Execute {
            ts_us,
            order_id,
            exec_qty,
        }
    }

    fn decode_delete(&mut self) -> EventKind {
        let Some(rec) = self.take(wire::DELETE_LEN) else {
            return EventKind::Invalid;
        };
        EventKind::Delete {
            ts_us: read_u64(&rec[1..9]),
            order_id: read_u64(&rec[9..17]),
        }
    }
}

#[inline(always)]
fn read_u64(b: &[u8]) -> u64 {
    u64::from_le_bytes(b.try_into().unwrap())
}

#[inline(always)]
fn read_i64(b: &[u8]) -> i64 {
    i64::from_le_bytes(b.try_into().unwrap())
}

#[inline(always)]
fn read_u32(b: &[u8]) -> u32 {
    u32::from_le_bytes(b.try_into().unwrap())
}
