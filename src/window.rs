//! Rolling hit counts over the raw hit log.
//!
//! The counter answers "how many images were served in the last 5, 10
//! and 15 seconds" from the raw timestamps in the hits collection, and
//! compacts that collection down to the widest window as a side effect
//! of every measurement. There is no background sweeper; measurement is
//! the only thing that bounds the hit log's growth.

use crate::collection::CollectionKind;
use crate::error::Result;
use crate::store::AnalyticsStore;
use crate::types::{Config, EntryRecord};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// One rolling-window bucket as shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowCount {
    pub title: String,
    pub count: u64,
}

/// Derives rolling hit counts from the hits collection.
#[derive(Debug, Clone)]
pub struct WindowedHitCounter {
    windows: [Duration; 3],
}

impl WindowedHitCounter {
    pub fn new(config: &Config) -> Self {
        Self {
            windows: config.windows(),
        }
    }

    /// Count hits in each configured window, then prune the hits
    /// collection to the widest window.
    ///
    /// A single `now` is captured up front and anchors all three bucket
    /// boundaries as well as the pruning cutoff; re-reading the clock
    /// per bucket would let hits drift between buckets. The snapshot and
    /// the compaction happen as one serialized mutation, so hits
    /// recorded concurrently are either in the snapshot or survive the
    /// compaction untouched.
    pub fn measure(&self, store: &AnalyticsStore) -> Result<Vec<WindowCount>> {
        let now = SystemTime::now();
        let widest = self.windows[2];

        let snapshot = store.replace_with(CollectionKind::Hits, |records| {
            retained_within(records, now, widest)
        })?;

        Ok(self
            .windows
            .iter()
            .map(|&window| WindowCount {
                title: format!("{}s", window.as_secs()),
                count: count_within(&snapshot, now, window),
            })
            .collect())
    }
}

/// Hits with `timestamp` in `(now - window, now]`.
fn count_within(records: &[EntryRecord], now: SystemTime, window: Duration) -> u64 {
    let cutoff = cutoff_for(now, window);
    records
        .iter()
        .filter(|r| r.timestamp > cutoff && r.timestamp <= now)
        .count() as u64
}

/// Records young enough to survive compaction. Timestamps ahead of
/// `now` (clock adjustments) are kept rather than discarded as stale.
fn retained_within(records: &[EntryRecord], now: SystemTime, window: Duration) -> Vec<EntryRecord> {
    let cutoff = cutoff_for(now, window);
    records
        .iter()
        .filter(|r| r.timestamp > cutoff)
        .cloned()
        .collect()
}

fn cutoff_for(now: SystemTime, window: Duration) -> SystemTime {
    now.checked_sub(window).unwrap_or(UNIX_EPOCH)
}
