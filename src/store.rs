//! The analytics store: six fixed collections behind one handle.
//!
//! The store owns every collection exclusively; callers interact only
//! through the handle, which serializes all mutations behind a single
//! write lock. With a durable backend attached, each mutation writes the
//! affected collection through to its slot before returning and each
//! query re-reads the slot, so a restarted process sees exactly the last
//! successful write. Without a backend, state lives in an in-process map
//! and dies with it (deliberately, for deterministic tests).

use crate::builder::StoreBuilder;
use crate::collection::{Collection, CollectionKind};
use crate::error::{Result, StatsError};
use crate::storage::DurableBackend;
use crate::types::{Config, EntryRecord, EntryValue, ServedRequest};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

/// Cheaply clonable handle to the analytics engine.
///
/// # Examples
///
/// ```rust
/// use placehold_stats::{AnalyticsStore, CollectionKind};
///
/// let store = AnalyticsStore::memory()?;
/// store.record(CollectionKind::Paths, "/img/100/100")?;
/// store.record(CollectionKind::Paths, "/img/100/100")?;
///
/// let paths = store.query(CollectionKind::Paths)?;
/// assert_eq!(paths.len(), 1);
/// assert_eq!(paths[0].count, 2);
/// # Ok::<(), placehold_stats::StatsError>(())
/// ```
#[derive(Clone)]
pub struct AnalyticsStore {
    inner: Arc<RwLock<StoreInner>>,
}

struct StoreInner {
    /// Source of truth in memory-only mode; unused when a backend is
    /// attached (durable mode re-reads the slot on every access).
    cache: FxHashMap<CollectionKind, Collection>,
    backend: Option<Box<dyn DurableBackend>>,
    config: Config,
    closed: bool,
}

impl AnalyticsStore {
    /// Memory-only store; all state is lost when the process exits.
    pub fn memory() -> Result<Self> {
        Self::builder().build()
    }

    /// Durable store backed by one file per collection under `dir`.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        Self::builder().data_dir(dir.as_ref()).build()
    }

    /// Builder for custom configuration or an injected backend.
    pub fn builder() -> StoreBuilder {
        StoreBuilder::new()
    }

    pub(crate) fn from_parts(backend: Option<Box<dyn DurableBackend>>, config: Config) -> Self {
        log::debug!(
            "analytics store created ({} mode)",
            if backend.is_some() { "durable" } else { "memory" }
        );
        Self {
            inner: Arc::new(RwLock::new(StoreInner {
                cache: FxHashMap::default(),
                backend,
                config,
                closed: false,
            })),
        }
    }

    /// The configuration this store was built with.
    pub fn config(&self) -> Config {
        self.inner.read().config.clone()
    }

    /// Whether writes go through a durable backend.
    pub fn is_durable(&self) -> bool {
        self.inner.read().backend.is_some()
    }

    /// Record one occurrence of `value` in the named collection.
    ///
    /// Empty values are silently dropped and `Ok(false)` is returned;
    /// everything else lands as a merge or a fresh record per the
    /// collection's policy, with eviction re-establishing the capacity
    /// cap before the call returns.
    pub fn record(
        &self,
        kind: CollectionKind,
        value: impl Into<EntryValue>,
    ) -> Result<bool> {
        let now = SystemTime::now();
        let mut inner = self.inner.write();
        inner.check_open()?;
        inner.record_one(kind, value.into(), now)
    }

    /// Record everything one served image implies: the raw hit, the
    /// path, the size (recent and all-time), and the optional text and
    /// referrer. Called by the request pipeline after validation, before
    /// the renderer takes over.
    pub fn record_served(&self, request: &ServedRequest) -> Result<()> {
        let now = SystemTime::now();
        let mut inner = self.inner.write();
        inner.check_open()?;

        inner.record_one(CollectionKind::Hits, EntryValue::text(request.path.as_str()), now)?;
        inner.record_one(CollectionKind::Paths, EntryValue::text(request.path.as_str()), now)?;

        if let Some(text) = &request.text {
            inner.record_one(CollectionKind::Texts, EntryValue::text(text.as_str()), now)?;
        }

        let size = EntryValue::Size(request.dimensions());
        inner.record_one(CollectionKind::Sizes, size.clone(), now)?;
        inner.record_one(CollectionKind::SizesAll, size, now)?;

        if let Some(referrer) = &request.referrer {
            inner.record_one(
                CollectionKind::References,
                EntryValue::text(referrer.as_str()),
                now,
            )?;
        }

        Ok(())
    }

    /// Full record sequence of a collection, in insertion order. An
    /// absent collection reads as empty.
    pub fn query(&self, kind: CollectionKind) -> Result<Vec<EntryRecord>> {
        let inner = self.inner.read();
        inner.check_open()?;
        inner.snapshot(kind)
    }

    /// Replace a collection's full record set.
    pub fn overwrite(&self, kind: CollectionKind, records: Vec<EntryRecord>) -> Result<()> {
        let mut inner = self.inner.write();
        inner.check_open()?;
        inner.mutate(kind, |coll| coll.replace(records))
    }

    /// Snapshot a collection and swap in `f`'s replacement as one
    /// serialized mutation. Returns the pre-replacement snapshot; used
    /// by the windowed hit counter so no hit can slip between the read
    /// and the compaction.
    pub(crate) fn replace_with<F>(&self, kind: CollectionKind, f: F) -> Result<Vec<EntryRecord>>
    where
        F: FnOnce(&[EntryRecord]) -> Vec<EntryRecord>,
    {
        let mut inner = self.inner.write();
        inner.check_open()?;
        inner.mutate(kind, |coll| {
            let snapshot = coll.records().to_vec();
            coll.replace(f(&snapshot));
            snapshot
        })
    }

    /// Empty every collection, durably when a backend is attached.
    pub fn clear_all(&self) -> Result<()> {
        let mut inner = self.inner.write();
        inner.check_open()?;
        for kind in CollectionKind::ALL {
            inner.mutate(kind, |coll| coll.clear())?;
        }
        log::debug!("all collections cleared");
        Ok(())
    }

    /// Close the store. Every subsequent operation on any clone of this
    /// handle fails with [`StatsError::StoreClosed`].
    pub fn close(&self) -> Result<()> {
        let mut inner = self.inner.write();
        if inner.closed {
            return Err(StatsError::StoreClosed);
        }
        inner.closed = true;
        Ok(())
    }
}

impl StoreInner {
    fn check_open(&self) -> Result<()> {
        if self.closed {
            return Err(StatsError::StoreClosed);
        }
        Ok(())
    }

    fn record_one(
        &mut self,
        kind: CollectionKind,
        value: EntryValue,
        now: SystemTime,
    ) -> Result<bool> {
        if value.is_empty() {
            log::debug!("dropping empty value for collection '{kind}'");
            return Ok(false);
        }
        self.mutate(kind, |coll| coll.insert(value, now))
    }

    /// Run `f` against the collection, committing the result durably
    /// before returning when a backend is attached.
    fn mutate<R>(&mut self, kind: CollectionKind, f: impl FnOnce(&mut Collection) -> R) -> Result<R> {
        let capacity = self.config.recent_capacity;
        match &mut self.backend {
            Some(backend) => {
                let records = backend.read(kind.slot())?.unwrap_or_default();
                let mut coll = Collection::from_records(kind, capacity, records);
                let out = f(&mut coll);
                backend.write(kind.slot(), coll.records())?;
                Ok(out)
            }
            None => {
                let coll = self
                    .cache
                    .entry(kind)
                    .or_insert_with(|| Collection::new(kind, capacity));
                Ok(f(coll))
            }
        }
    }

    fn snapshot(&self, kind: CollectionKind) -> Result<Vec<EntryRecord>> {
        match &self.backend {
            Some(backend) => Ok(backend.read(kind.slot())?.unwrap_or_default()),
            None => Ok(self
                .cache
                .get(&kind)
                .map(|coll| coll.records().to_vec())
                .unwrap_or_default()),
        }
    }
}
