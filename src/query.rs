//! Read facade consumed by the HTTP layer.
//!
//! Each method maps one dashboard endpoint onto the store: recent lists
//! are sorted most-recent-first and projected to bare values, top lists
//! are sorted by occurrence count, and the windowed hit counts come from
//! the rolling counter (including its pruning side effect). All output
//! types serialize to exactly the JSON shapes the dashboard expects.

use crate::collection::CollectionKind;
use crate::error::Result;
use crate::store::AnalyticsStore;
use crate::types::{Dimensions, EntryRecord, EntryValue};
use crate::window::{WindowCount, WindowedHitCounter};
use serde::{Deserialize, Serialize};

/// A popular size with its occurrence count, `{"n":..,"w":..,"h":..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeCount {
    pub n: u64,
    pub w: u32,
    pub h: u32,
}

/// A referrer with its occurrence count, `{"ref":..,"n":..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceCount {
    #[serde(rename = "ref")]
    pub reference: String,
    pub n: u64,
}

/// Read-only stats API over a store handle.
///
/// # Examples
///
/// ```rust
/// use placehold_stats::{AnalyticsStore, CollectionKind, StatsQueryService};
///
/// let store = AnalyticsStore::memory()?;
/// store.record(CollectionKind::Paths, "/img/100/100")?;
///
/// let stats = StatsQueryService::new(store);
/// assert_eq!(stats.recent_paths()?, vec!["/img/100/100".to_string()]);
/// # Ok::<(), placehold_stats::StatsError>(())
/// ```
#[derive(Clone)]
pub struct StatsQueryService {
    store: AnalyticsStore,
    counter: WindowedHitCounter,
}

impl StatsQueryService {
    pub fn new(store: AnalyticsStore) -> Self {
        let counter = WindowedHitCounter::new(&store.config());
        Self { store, counter }
    }

    /// Recently rendered overlay texts, most recent first.
    pub fn recent_texts(&self) -> Result<Vec<String>> {
        Ok(project_texts(self.recent(CollectionKind::Texts)?))
    }

    /// Recently requested paths, most recent first.
    pub fn recent_paths(&self) -> Result<Vec<String>> {
        Ok(project_texts(self.recent(CollectionKind::Paths)?))
    }

    /// Recently requested sizes, most recent first.
    pub fn recent_sizes(&self) -> Result<Vec<Dimensions>> {
        Ok(self
            .recent(CollectionKind::Sizes)?
            .into_iter()
            .filter_map(|r| r.entry.as_size())
            .collect())
    }

    /// Most frequently requested sizes, descending by count.
    pub fn top_sizes(&self) -> Result<Vec<SizeCount>> {
        let records = by_count_descending(self.store.query(CollectionKind::SizesAll)?);
        Ok(records
            .into_iter()
            .filter_map(|r| {
                r.entry.as_size().map(|Dimensions { w, h }| SizeCount {
                    n: r.count,
                    w,
                    h,
                })
            })
            .collect())
    }

    /// Most frequent referrers, descending by count.
    pub fn top_references(&self) -> Result<Vec<ReferenceCount>> {
        let records = by_count_descending(self.store.query(CollectionKind::References)?);
        Ok(records
            .into_iter()
            .filter_map(|r| {
                r.entry.as_text().map(|reference| ReferenceCount {
                    reference: reference.to_string(),
                    n: r.count,
                })
            })
            .collect())
    }

    /// Rolling hit counts, one bucket per configured window. Prunes the
    /// hit log to the widest window as a side effect.
    pub fn second_hits(&self) -> Result<Vec<WindowCount>> {
        self.counter.measure(&self.store)
    }

    /// Wipe every collection.
    pub fn clear(&self) -> Result<()> {
        self.store.clear_all()
    }

    fn recent(&self, kind: CollectionKind) -> Result<Vec<EntryRecord>> {
        let mut records = self.store.query(kind)?;
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(records)
    }
}

fn project_texts(records: Vec<EntryRecord>) -> Vec<String> {
    records
        .into_iter()
        .filter_map(|r| match r.entry {
            EntryValue::Text(text) => Some(text),
            EntryValue::Size(_) => None,
        })
        .collect()
}

fn by_count_descending(mut records: Vec<EntryRecord>) -> Vec<EntryRecord> {
    records.sort_by(|a, b| b.count.cmp(&a.count));
    records
}
