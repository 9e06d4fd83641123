//! Core value types and configuration for the analytics engine.
//!
//! Entry values are restricted to a closed set of shapes so that the
//! merge policy can rely on plain structural equality instead of
//! comparing serialized representations.

use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};

/// A width/height pair as recorded for a served image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub w: u32,
    pub h: u32,
}

impl Dimensions {
    pub fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }
}

/// The value tracked by a collection: a plain string (path, text,
/// referrer) or a size object.
///
/// Untagged serialization keeps the dashboard payloads flat: strings
/// serialize as JSON strings, sizes as `{"w":..,"h":..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryValue {
    Text(String),
    Size(Dimensions),
}

impl EntryValue {
    /// String-shaped entry value.
    pub fn text<S: Into<String>>(text: S) -> Self {
        Self::Text(text.into())
    }

    /// Size-shaped entry value.
    pub fn size(w: u32, h: u32) -> Self {
        Self::Size(Dimensions::new(w, h))
    }

    /// True for values the store silently drops on insert.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.is_empty(),
            Self::Size(_) => false,
        }
    }

    /// Borrow the text content, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Size(_) => None,
        }
    }

    /// Copy out the dimensions, if this is a size value.
    pub fn as_size(&self) -> Option<Dimensions> {
        match self {
            Self::Text(_) => None,
            Self::Size(dims) => Some(*dims),
        }
    }
}

impl From<&str> for EntryValue {
    fn from(text: &str) -> Self {
        Self::text(text)
    }
}

impl From<String> for EntryValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Dimensions> for EntryValue {
    fn from(dims: Dimensions) -> Self {
        Self::Size(dims)
    }
}

/// One tracked entry: the value, its last-touch time, and how often it
/// has been recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryRecord {
    pub entry: EntryValue,
    pub timestamp: SystemTime,
    pub count: u64,
}

impl EntryRecord {
    /// Fresh record with a count of one.
    pub fn new(entry: EntryValue, timestamp: SystemTime) -> Self {
        Self {
            entry,
            timestamp,
            count: 1,
        }
    }

    /// Merge another occurrence into this record. The timestamp never
    /// moves backwards, even if the caller's clock does.
    pub(crate) fn touch(&mut self, now: SystemTime) {
        self.count += 1;
        if now > self.timestamp {
            self.timestamp = now;
        }
    }
}

/// One successfully served placeholder image, as delivered by the
/// validation layer. Bounds (width/height in `[1, 2000]`, `square >= 1`)
/// are enforced upstream; the analytics engine does not re-check them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServedRequest {
    pub path: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub square: Option<u32>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub referrer: Option<String>,
}

impl ServedRequest {
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }
}

/// Analytics engine configuration.
///
/// Designed to be easily serializable and loadable from JSON or TOML
/// while keeping complexity minimal.
///
/// # Example
///
/// ```rust
/// use placehold_stats::Config;
///
/// let config = Config::default();
///
/// let json = r#"{ "recent_capacity": 25 }"#;
/// let config: Config = serde_json::from_str(json).unwrap();
/// assert_eq!(config.recent_capacity, 25);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Capacity of each bounded collection (the raw hit log is
    /// time-pruned instead and ignores this).
    #[serde(default = "Config::default_recent_capacity")]
    pub recent_capacity: usize,

    /// Rolling hit-count windows in seconds, strictly ascending. The
    /// widest window doubles as the hit log retention horizon.
    #[serde(default = "Config::default_windows_secs")]
    pub windows_secs: [u64; 3],
}

impl Config {
    const fn default_recent_capacity() -> usize {
        10
    }

    const fn default_windows_secs() -> [u64; 3] {
        [5, 10, 15]
    }

    pub fn with_recent_capacity(mut self, capacity: usize) -> Self {
        self.recent_capacity = capacity;
        self
    }

    pub fn with_windows_secs(mut self, windows: [u64; 3]) -> Self {
        self.windows_secs = windows;
        self
    }

    /// The rolling windows as durations, narrowest first.
    pub fn windows(&self) -> [Duration; 3] {
        self.windows_secs.map(Duration::from_secs)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.recent_capacity == 0 {
            return Err("Recent capacity must be greater than zero".to_string());
        }

        if self.windows_secs.windows(2).any(|w| w[0] >= w[1]) {
            return Err("Hit windows must be strictly ascending".to_string());
        }

        if self.windows_secs[0] == 0 {
            return Err("Hit windows must be non-zero".to_string());
        }

        Ok(())
    }

    /// Load configuration from JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        use serde::de::Error;

        let config: Config = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(serde_json::Error::custom(e));
        }
        Ok(config)
    }

    /// Save configuration as JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load configuration from TOML string (requires toml feature).
    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        use serde::de::Error;

        let config: Config = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    /// Save configuration as TOML string (requires toml feature).
    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            recent_capacity: Self::default_recent_capacity(),
            windows_secs: Self::default_windows_secs(),
        }
    }
}
