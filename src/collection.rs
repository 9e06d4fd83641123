//! Bounded record collections with merge and eviction policies.
//!
//! Every stat the dashboard shows is derived from one of six fixed
//! collections. A collection is a flat list of [`EntryRecord`]s; its
//! behavior is fully determined by its [`CollectionKind`]: whether equal
//! values merge into one record, and which record is evicted when the
//! collection outgrows its capacity.

use crate::types::{EntryRecord, EntryValue};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::SystemTime;

/// Total ordering applied when a collection exceeds its capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvictionOrder {
    /// Drop the record with the oldest last-touch timestamp.
    Recency,
    /// Drop the record with the lowest count; ties go to the oldest
    /// record among the tied group.
    Frequency,
}

impl EvictionOrder {
    /// Index of the record this order removes first, if any.
    pub fn victim(&self, records: &[EntryRecord]) -> Option<usize> {
        match self {
            Self::Recency => records
                .iter()
                .enumerate()
                .min_by_key(|(_, r)| r.timestamp)
                .map(|(i, _)| i),
            Self::Frequency => records
                .iter()
                .enumerate()
                .min_by_key(|(_, r)| (r.count, r.timestamp))
                .map(|(i, _)| i),
        }
    }
}

/// The six fixed collections owned by the analytics store.
///
/// The kind carries the full per-collection policy from the stats table:
/// durable slot name, merge behavior, eviction order, and whether the
/// capacity cap applies. Policies are fixed at construction; callers
/// never pass them per operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollectionKind {
    /// Raw hit log: one record per served image, never merged, pruned
    /// to the widest rolling window instead of capacity-evicted.
    Hits,
    /// Recently requested URL paths.
    Paths,
    /// Recently rendered overlay texts.
    Texts,
    /// Recently requested sizes, recency-evicted.
    Sizes,
    /// All-time popular sizes, frequency-evicted.
    SizesAll,
    /// Referring pages, frequency-evicted.
    References,
}

impl CollectionKind {
    /// Every collection, in clearing/iteration order.
    pub const ALL: [CollectionKind; 6] = [
        Self::Hits,
        Self::Paths,
        Self::Texts,
        Self::Sizes,
        Self::SizesAll,
        Self::References,
    ];

    /// Durable slot name (also the file stem in the file backend).
    pub fn slot(&self) -> &'static str {
        match self {
            Self::Hits => "hits",
            Self::Paths => "paths",
            Self::Texts => "texts",
            Self::Sizes => "sizes",
            Self::SizesAll => "sizes-all",
            Self::References => "references",
        }
    }

    /// Whether structurally-equal values merge into one record.
    pub fn merges(&self) -> bool {
        !matches!(self, Self::Hits)
    }

    /// Whether the capacity cap applies. The hit log is unbounded and
    /// time-pruned by the windowed counter instead.
    pub fn bounded(&self) -> bool {
        !matches!(self, Self::Hits)
    }

    /// Which record goes first when over capacity.
    pub fn eviction(&self) -> EvictionOrder {
        match self {
            Self::SizesAll | Self::References => EvictionOrder::Frequency,
            _ => EvictionOrder::Recency,
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slot())
    }
}

/// A named, bounded, mutable list of entry records.
#[derive(Debug, Clone)]
pub struct Collection {
    kind: CollectionKind,
    capacity: Option<usize>,
    records: Vec<EntryRecord>,
}

impl Collection {
    /// Empty collection. `capacity` is ignored for unbounded kinds.
    pub fn new(kind: CollectionKind, capacity: usize) -> Self {
        Self::from_records(kind, capacity, Vec::new())
    }

    /// Rehydrate a collection from previously stored records.
    pub fn from_records(kind: CollectionKind, capacity: usize, records: Vec<EntryRecord>) -> Self {
        Self {
            kind,
            capacity: kind.bounded().then_some(capacity),
            records,
        }
    }

    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record one occurrence of `value` at `now`.
    ///
    /// Empty values are silently dropped. With merging enabled, an
    /// existing structurally-equal record absorbs the occurrence (count
    /// bumped, timestamp refreshed); otherwise a fresh record is
    /// appended. The capacity cap is re-established before returning, so
    /// it only ever holds transiently within this call.
    ///
    /// Returns `false` when the value was dropped.
    pub fn insert(&mut self, value: EntryValue, now: SystemTime) -> bool {
        if value.is_empty() {
            return false;
        }

        if self.kind.merges()
            && let Some(existing) = self.records.iter_mut().find(|r| r.entry == value)
        {
            existing.touch(now);
            return true;
        }

        self.records.push(EntryRecord::new(value, now));
        self.enforce_capacity();
        true
    }

    fn enforce_capacity(&mut self) {
        let Some(capacity) = self.capacity else {
            return;
        };
        while self.records.len() > capacity {
            match self.kind.eviction().victim(&self.records) {
                Some(victim) => {
                    self.records.remove(victim);
                }
                None => break,
            }
        }
    }

    /// Read view over the records, in insertion order.
    pub fn records(&self) -> &[EntryRecord] {
        &self.records
    }

    /// Drop every record.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Atomically swap in a full record set (hit-window compaction).
    pub fn replace(&mut self, records: Vec<EntryRecord>) {
        self.records = records;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[test]
    fn test_kind_table() {
        assert!(!CollectionKind::Hits.merges());
        assert!(!CollectionKind::Hits.bounded());
        for kind in [
            CollectionKind::Paths,
            CollectionKind::Texts,
            CollectionKind::Sizes,
        ] {
            assert!(kind.merges());
            assert_eq!(kind.eviction(), EvictionOrder::Recency);
        }
        for kind in [CollectionKind::SizesAll, CollectionKind::References] {
            assert!(kind.merges());
            assert_eq!(kind.eviction(), EvictionOrder::Frequency);
        }
    }

    #[test]
    fn test_merge_counts_occurrences() {
        let mut coll = Collection::new(CollectionKind::Paths, 10);

        coll.insert(EntryValue::text("/img/100/100"), at(1));
        coll.insert(EntryValue::text("/img/100/100"), at(2));
        coll.insert(EntryValue::text("/img/200/200"), at(3));
        coll.insert(EntryValue::text("/img/100/100"), at(4));

        assert_eq!(coll.len(), 2);
        let merged = &coll.records()[0];
        assert_eq!(merged.entry, EntryValue::text("/img/100/100"));
        assert_eq!(merged.count, 3);
        assert_eq!(merged.timestamp, at(4));
        assert_eq!(coll.records()[1].count, 1);
    }

    #[test]
    fn test_no_merge_keeps_duplicates() {
        let mut coll = Collection::new(CollectionKind::Hits, 10);

        coll.insert(EntryValue::text("/img/1/1"), at(1));
        coll.insert(EntryValue::text("/img/1/1"), at(2));

        assert_eq!(coll.len(), 2);
        assert!(coll.records().iter().all(|r| r.count == 1));
    }

    #[test]
    fn test_empty_value_is_dropped() {
        let mut coll = Collection::new(CollectionKind::Texts, 10);
        assert!(!coll.insert(EntryValue::text(""), at(1)));
        assert!(coll.is_empty());
    }

    #[test]
    fn test_capacity_never_exceeded() {
        let mut coll = Collection::new(CollectionKind::Paths, 3);
        for i in 0..20 {
            coll.insert(EntryValue::text(format!("/p/{i}")), at(i));
            assert!(coll.len() <= 3);
        }
    }

    #[test]
    fn test_recency_eviction_drops_oldest() {
        let mut coll = Collection::new(CollectionKind::Sizes, 3);
        for i in 0..4 {
            coll.insert(EntryValue::size(i, i), at(u64::from(i) + 1));
        }

        let entries: Vec<_> = coll.records().iter().map(|r| r.entry.clone()).collect();
        assert_eq!(entries.len(), 3);
        assert!(!entries.contains(&EntryValue::size(0, 0)));
        for i in 1..4 {
            assert!(entries.contains(&EntryValue::size(i, i)));
        }
    }

    #[test]
    fn test_recency_eviction_follows_refresh() {
        let mut coll = Collection::new(CollectionKind::Paths, 2);
        coll.insert(EntryValue::text("a"), at(1));
        coll.insert(EntryValue::text("b"), at(2));
        // "a" becomes the most recently touched, so "b" is now oldest.
        coll.insert(EntryValue::text("a"), at(3));
        coll.insert(EntryValue::text("c"), at(4));

        let entries: Vec<_> = coll.records().iter().map(|r| r.entry.clone()).collect();
        assert!(entries.contains(&EntryValue::text("a")));
        assert!(entries.contains(&EntryValue::text("c")));
        assert!(!entries.contains(&EntryValue::text("b")));
    }

    #[test]
    fn test_frequency_eviction_spares_popular() {
        let mut coll = Collection::new(CollectionKind::SizesAll, 2);

        // "hot" is recorded five times, the others once each.
        for i in 0..5 {
            coll.insert(EntryValue::size(9, 9), at(10 + i));
        }
        coll.insert(EntryValue::size(1, 1), at(20));
        coll.insert(EntryValue::size(2, 2), at(21));

        let entries: Vec<_> = coll.records().iter().map(|r| r.entry.clone()).collect();
        assert_eq!(entries.len(), 2);
        assert!(entries.contains(&EntryValue::size(9, 9)));
        // Of the two count-1 entries, the older one was evicted.
        assert!(entries.contains(&EntryValue::size(2, 2)));
        assert!(!entries.contains(&EntryValue::size(1, 1)));
    }

    #[test]
    fn test_frequency_tie_breaks_on_oldest() {
        let order = EvictionOrder::Frequency;
        let records = vec![
            EntryRecord::new(EntryValue::text("young"), at(30)),
            EntryRecord::new(EntryValue::text("old"), at(10)),
            EntryRecord {
                entry: EntryValue::text("popular"),
                timestamp: at(5),
                count: 5,
            },
        ];

        let victim = order.victim(&records).unwrap();
        assert_eq!(records[victim].entry, EntryValue::text("old"));
    }

    #[test]
    fn test_victim_of_empty_is_none() {
        assert!(EvictionOrder::Recency.victim(&[]).is_none());
        assert!(EvictionOrder::Frequency.victim(&[]).is_none());
    }

    #[test]
    fn test_replace_and_clear() {
        let mut coll = Collection::new(CollectionKind::Hits, 10);
        coll.insert(EntryValue::text("x"), at(1));

        coll.replace(vec![EntryRecord::new(EntryValue::text("y"), at(2))]);
        assert_eq!(coll.len(), 1);
        assert_eq!(coll.records()[0].entry, EntryValue::text("y"));

        coll.clear();
        assert!(coll.is_empty());
    }
}
