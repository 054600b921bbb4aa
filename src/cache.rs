//! In-memory TTL cache for directory reads.
//!
//! The directory's backing sheet API is slow and rate-limited, so list reads
//! go through named cache slots with a short TTL. Staleness is observed on
//! read (no background eviction) and every directory write path invalidates
//! its slot explicitly. The clock comes in from the caller, so tests age
//! entries without sleeping.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use crate::clock::Clock;

pub const DEFAULT_TTL_SECS: i64 = 300;

struct Entry<V> {
    value: V,
    stored_at: DateTime<Utc>,
}

/// Slot-keyed value cache. Values are cloned out on hit.
pub struct TtlCache<V> {
    slots: DashMap<String, Entry<V>>,
    ttl: Duration,
    clock: Clock,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl_secs: i64, clock: Clock) -> Self {
        TtlCache {
            slots: DashMap::new(),
            ttl: Duration::seconds(ttl_secs.max(0)),
            clock,
        }
    }

    /// Fresh value for the slot, or `None` on miss. An entry that has
    /// reached the TTL counts as a miss and is dropped.
    pub fn get(&self, slot: &str) -> Option<V> {
        let now = self.clock.now_utc();
        let expired = match self.slots.get(slot) {
            Some(entry) => {
                if now - entry.stored_at < self.ttl {
                    return Some(entry.value.clone());
                }
                true
            }
            None => false,
        };
        if expired {
            self.slots.remove(slot);
        }
        None
    }

    pub fn put(&self, slot: &str, value: V) {
        self.slots.insert(
            slot.to_string(),
            Entry {
                value,
                stored_at: self.clock.now_utc(),
            },
        );
    }

    pub fn invalidate(&self, slot: &str) {
        self.slots.remove(slot);
    }

    pub fn invalidate_all(&self) {
        self.slots.clear();
    }

    #[cfg(test)]
    pub(crate) fn set_clock(&mut self, clock: Clock) {
        self.clock = clock;
    }
}
