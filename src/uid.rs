//! Process-unique identifiers for compiled record types.
//!
//! A [Uid] combines a process-wide counter (wrapping at 65536) with the
//! Unix-epoch millisecond timestamp of its creation. Uids are never
//! persisted, so collisions across processes are irrelevant.

use std::{
    fmt,
    sync::atomic::{AtomicU32, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};

static COUNTER: AtomicU32 = AtomicU32::new(0);

/// Identity tag of a compiled record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Uid {
    counter: u16,
    timestamp_ms: u64,
}

impl Uid {
    /// Allocates the next uid.
    pub fn next() -> Self {
        let counter = (COUNTER.fetch_add(1, Ordering::Relaxed) % 65536) as u16;
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis() as u64);

        Uid {
            counter,
            timestamp_ms,
        }
    }

    pub fn counter(&self) -> u16 {
        self.counter
    }

    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:05}{}", self.counter, to_base36(self.timestamp_ms))
    }
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    if value == 0 {
        return "0".to_string();
    }

    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();

    String::from_utf8(out).unwrap_or_default()
}
