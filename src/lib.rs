//! Bounded, optionally-persisted request analytics for a
//! placeholder-image service.
//!
//! Every served image is recorded into six fixed collections (raw hits,
//! recent paths/texts/sizes, all-time sizes, referrers), each with its
//! own merge and eviction policy, and a read facade answers the
//! dashboard queries: recent-unique lists, top-N lists and rolling
//! 5s/10s/15s hit counts.
//!
//! ```rust
//! use placehold_stats::{AnalyticsStore, CollectionKind, StatsQueryService};
//!
//! let store = AnalyticsStore::memory()?;
//! store.record(CollectionKind::Paths, "/img/100/100")?;
//! store.record(CollectionKind::Paths, "/img/100/100")?;
//!
//! let stats = StatsQueryService::new(store);
//! assert_eq!(stats.recent_paths()?, vec!["/img/100/100".to_string()]);
//! # Ok::<(), placehold_stats::StatsError>(())
//! ```
//!
//! Stores are memory-only by default; pointing the builder at a data
//! directory turns on write-through persistence with one file per
//! collection, so the stats survive a restart.

pub mod builder;
pub mod collection;
pub mod error;
pub mod query;
pub mod storage;
pub mod store;
pub mod types;
pub mod window;

pub use builder::StoreBuilder;
pub use error::{Result, StatsError};
pub use store::AnalyticsStore;

pub use collection::{Collection, CollectionKind, EvictionOrder};

pub use query::{ReferenceCount, SizeCount, StatsQueryService};

pub use types::{Config, Dimensions, EntryRecord, EntryValue, ServedRequest};

pub use window::{WindowCount, WindowedHitCounter};

pub use storage::{DurableBackend, FileBackend, MemoryBackend};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{AnalyticsStore, Result, StatsError, StoreBuilder};

    pub use crate::{CollectionKind, EntryValue, ServedRequest};

    pub use crate::{StatsQueryService, WindowedHitCounter};

    pub use crate::{Config, DurableBackend, FileBackend, MemoryBackend};

    pub use std::time::Duration;
}
