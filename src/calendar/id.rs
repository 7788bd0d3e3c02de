//! Event identifier generation.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};

/// Produces identifiers of the form `20251008T093000Z:<counter>`.
///
/// The counter is seeded from the clock's nanoseconds when the generator is
/// built and only ever increases, so IDs from one generator never collide even
/// within the same second.
#[derive(Debug)]
pub struct IdGenerator {
    counter: AtomicI64,
}

impl IdGenerator {
    pub fn new() -> Self {
        let seed = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        Self::with_seed(seed)
    }

    pub fn with_seed(seed: i64) -> Self {
        Self {
            counter: AtomicI64::new(seed),
        }
    }

    /// Next identifier, stamped with the current time.
    pub fn next_id(&self) -> String {
        self.next_id_at(Utc::now())
    }

    /// Next identifier, stamped with `now`.
    pub fn next_id_at(&self, now: DateTime<Utc>) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        format!("{}:{}", now.format("%Y%m%dT%H%M%SZ"), n)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
