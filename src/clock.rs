// src/clock.rs
use std::sync::OnceLock;
use std::time::Instant;

/// Monotonic microseconds since the process first asked for the time.
///
/// All pipeline timestamps (decode stamps, apply stamps, publish cadence)
/// come from this one source, so deltas between them are meaningful.
#[inline]
pub fn now_us() -> u64 {
    static ANCHOR: OnceLock<Instant> = OnceLock::new();
    ANCHOR.get_or_init(Instant::now).elapsed().as_micros() as u64
}
