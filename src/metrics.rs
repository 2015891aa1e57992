// src/metrics.rs
//! Decode-to-apply latency accounting.

use std::io::{self, Write};

/// Accumulates per-event latency samples in microseconds.
///
/// Samples are never dropped; the backing vector is pre-reserved to the
/// expected volume so the hot path does not allocate.
pub struct LatencyTracker {
    samples: Vec<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LatencySummary {
    pub p50: u64,
    pub p95: u64,
    pub p99: u64,
    pub samples: usize,
}

impl LatencyTracker {
    pub fn with_capacity(expected: usize) -> Self {
        LatencyTracker {
            samples: Vec::with_capacity(expected),
        }
    }

    #[inline]
    pub fn record(&mut self, latency_us: u64) {
        self.samples.push(latency_us);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Percentiles over a sorted copy, picked by index `n * pct / 100`.
    pub fn summary(&self) -> Option<LatencySummary> {
        if self.samples.is_empty() {
            return None;
        }
        let mut sorted = self.samples.clone();
        sorted.sort_unstable();
        let n = sorted.len();
        Some(LatencySummary {
            p50: sorted[n * 50 / 100],
            p95: sorted[n * 95 / 100],
            p99: sorted[n * 99 / 100],
            samples: n,
        })
    }

    pub fn write_report(&self, w: &mut impl Write) -> io::Result<()> {
        match self.summary() {
            None => writeln!(w, "No latency measurements"),
            Some(s) => {
                writeln!(w, "Latency Stats (decode->apply):")?;
                writeln!(w, "  p50: {} µs", s.p50)?;
                writeln!(w, "  p95: {} µs", s.p95)?;
                writeln!(w, "  p99: {} µs", s.p99)?;
                writeln!(w, "  samples: {}", s.samples)
            }
        }
    }
}
